//! Collaborator outcomes to device status codes.
//!
//! | Outcome | Code |
//! |---|---|
//! | connection refused | `OFFLINE` |
//! | timeout, transport, bad URL, unreadable body | `IO_ERROR` |
//! | HTTP status 100-399 | `OK` |
//! | HTTP status 400 and above | `IO_ERROR` |
//! | anything else | `UNKNOWN` |
//!
//! `BAD_COMMAND` and `NO_DEVICE` never come from here.

use fujinet_core::ErrorCode;
use fujinet_network::ClientError;

pub fn client_error(error: &ClientError) -> ErrorCode {
    match error {
        ClientError::ConnectionRefused(_) => ErrorCode::Offline,
        ClientError::Timeout(_)
        | ClientError::Transport(_)
        | ClientError::InvalidUrl(_)
        | ClientError::Body(_) => ErrorCode::IoError,
        ClientError::Unsupported(_) => ErrorCode::Unknown,
    }
}

/// # Errors
/// Returns the code for a status that is not a success.
pub fn http_status(status: u16) -> Result<(), ErrorCode> {
    match status {
        100..=399 => Ok(()),
        400.. => Err(ErrorCode::IoError),
        _ => Err(ErrorCode::Unknown),
    }
}

/// Whether a failure means the remote end is gone and the unit should close.
pub fn drops_connection(code: ErrorCode) -> bool {
    code == ErrorCode::Offline
}
