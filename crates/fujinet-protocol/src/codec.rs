//! Tokio codecs for SIO-style host framing.
//!
//! Two codecs cover the two ends of the bus:
//! - [`SioCodec`] is the device side. It decodes [`CommandFrame`]s and encodes
//!   [`ResponseFrame`]s.
//! - [`HostCodec`] is the host side. It encodes [`CommandFrame`]s and decodes
//!   [`ResponseFrame`]s. Drivers and tests use it to talk to a bridge.
//!
//! # Framing
//!
//! Command frames are length-prefixed, so the decoder never scans for
//! delimiters. It waits until the six-byte header is buffered, reads the
//! payload length, and then waits for the payload and checksum.
//!
//! Checksums are not verified here. A command frame with a bad checksum is
//! still a complete frame and is handed to the translator, which rejects it.
//! Response frames are verified by [`HostCodec`] because nothing sits
//! behind it to do so.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use fujinet_core::UnitNumber;
//! use fujinet_protocol::{HostCodec, HostCommand};
//!
//! # async fn example() -> Result<(), fujinet_protocol::ProtocolError> {
//! let stream = TcpStream::connect("127.0.0.1:6502").await?;
//! let mut framed = Framed::new(stream, HostCodec::new());
//!
//! let unit = UnitNumber::new(1).unwrap();
//! let command = HostCommand::Status { specifier: "N1:http://example.com/".into() };
//! framed.send(command.to_frame(unit)).await?;
//!
//! if let Some(Ok(response)) = framed.next().await {
//!     println!("{response}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Oversized Frames
//!
//! A declared payload length above the configured maximum cannot be skipped
//! reliably, so the decoder discards everything buffered and returns
//! [`ProtocolError::FrameTooLarge`].

use bytes::{Buf, BytesMut};
use fujinet_core::{
    ErrorCode,
    constants::{COMMAND_HEADER_LENGTH, MAX_FRAME_PAYLOAD, RESPONSE_HEADER_LENGTH},
};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::{
    error::{ProtocolError, Result},
    frame::{CommandFrame, ResponseFrame, ResponseMarker},
};

fn read_length(src: &BytesMut, offset: usize) -> usize {
    usize::from(u16::from_le_bytes([src[offset], src[offset + 1]]))
}

fn check_size(size: usize, max_size: usize) -> Result<()> {
    if size > max_size {
        return Err(ProtocolError::FrameTooLarge { size, max_size });
    }
    Ok(())
}

/// Device-side codec: decodes commands, encodes responses.
#[derive(Debug, Clone)]
pub struct SioCodec {
    max_payload: usize,
}

impl SioCodec {
    pub fn new() -> Self {
        Self {
            max_payload: MAX_FRAME_PAYLOAD,
        }
    }

    /// Create a codec that rejects payloads above `max_payload` bytes.
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            max_payload: max_payload.min(MAX_FRAME_PAYLOAD),
        }
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }
}

impl Default for SioCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for SioCodec {
    type Item = CommandFrame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < COMMAND_HEADER_LENGTH {
            return Ok(None);
        }

        let length = read_length(src, 4);
        if let Err(err) = check_size(length, self.max_payload) {
            src.clear();
            return Err(err);
        }

        let total = COMMAND_HEADER_LENGTH + length + 1;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let header = [src[0], src[1], src[2], src[3]];
        src.advance(COMMAND_HEADER_LENGTH);
        let payload = src.split_to(length).freeze();
        let checksum = src.get_u8();

        let frame = CommandFrame::from_parts(header, payload, checksum);
        trace!(%frame, "Decoded command frame");
        Ok(Some(frame))
    }
}

impl Encoder<ResponseFrame> for SioCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: ResponseFrame, dst: &mut BytesMut) -> Result<()> {
        check_size(item.payload.len(), self.max_payload)?;
        trace!(frame = %item, "Encoding response frame");
        item.encode_into(dst);
        Ok(())
    }
}

/// Host-side codec: encodes commands, decodes responses.
#[derive(Debug, Clone)]
pub struct HostCodec {
    max_payload: usize,
}

impl HostCodec {
    pub fn new() -> Self {
        Self {
            max_payload: MAX_FRAME_PAYLOAD,
        }
    }

    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            max_payload: max_payload.min(MAX_FRAME_PAYLOAD),
        }
    }
}

impl Default for HostCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for HostCodec {
    type Item = ResponseFrame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let Some(&first) = src.first() else {
            return Ok(None);
        };

        let marker = match ResponseMarker::from_byte(first) {
            Some(ResponseMarker::Nak) => {
                src.advance(1);
                return Ok(Some(ResponseFrame::nak()));
            }
            Some(marker) => marker,
            None => {
                src.advance(1);
                return Err(ProtocolError::InvalidMarker { byte: first });
            }
        };

        if src.len() < RESPONSE_HEADER_LENGTH {
            return Ok(None);
        }

        let length = read_length(src, 2);
        if let Err(err) = check_size(length, self.max_payload) {
            src.clear();
            return Err(err);
        }

        let total = RESPONSE_HEADER_LENGTH + length + 1;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let status_byte = src[1];
        src.advance(RESPONSE_HEADER_LENGTH);
        let payload = src.split_to(length).freeze();
        let checksum = src.get_u8();

        let status = ErrorCode::try_from(status_byte)
            .map_err(|_| ProtocolError::UnknownStatus { byte: status_byte })?;

        let frame = ResponseFrame {
            marker,
            status,
            payload,
        };
        let expected = frame.expected_checksum();
        if checksum != expected {
            return Err(ProtocolError::ChecksumMismatch {
                expected,
                actual: checksum,
            });
        }

        Ok(Some(frame))
    }
}

impl Encoder<CommandFrame> for HostCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: CommandFrame, dst: &mut BytesMut) -> Result<()> {
        check_size(item.payload.len(), self.max_payload)?;
        item.encode_into(dst);
        Ok(())
    }
}
