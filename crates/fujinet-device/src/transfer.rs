//! Copying response payloads into host buffers.

use fujinet_core::ErrorCode;

/// Copy `payload` into the front of `buffer`.
///
/// The copy is all-or-nothing: a payload longer than the buffer leaves the
/// buffer untouched and fails with `IoError`. On success the payload length is
/// returned.
///
/// ```
/// use fujinet_core::ErrorCode;
/// use fujinet_device::transfer::fill;
///
/// let mut buffer = [0u8; 4];
/// assert_eq!(fill(b"abc", &mut buffer), Ok(3));
/// assert_eq!(&buffer, b"abc\0");
/// assert_eq!(fill(b"too long", &mut buffer), Err(ErrorCode::IoError));
/// assert_eq!(&buffer, b"abc\0");
/// ```
pub fn fill(payload: &[u8], buffer: &mut [u8]) -> Result<usize, ErrorCode> {
    if payload.len() > buffer.len() {
        return Err(ErrorCode::IoError);
    }
    buffer[..payload.len()].copy_from_slice(payload);
    Ok(payload.len())
}

/// Usable length of a host buffer.
///
/// The host's stated capacity never exceeds the memory it handed over or the
/// configured transfer ceiling.
pub fn effective_capacity(capacity: usize, buffer_len: usize, max_transfer: usize) -> usize {
    capacity.min(buffer_len).min(max_transfer)
}
