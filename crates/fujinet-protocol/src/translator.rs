//! Host data translation.
//!
//! A [`HostTranslator`] sits between the raw frames of a host bus and the
//! network device. Inbound, it validates a [`CommandFrame`] and turns it into
//! a [`HostRequest`]. Outbound, it wraps an operation outcome in a
//! [`ResponseFrame`].
//!
//! Rejections come in two kinds:
//! - [`TranslatorError::NotSupported`] for a command byte outside the network
//!   device command set
//! - [`TranslatorError::InvalidParameter`] for a bad checksum, a non-network
//!   device byte, an oversized or non-UTF-8 specifier, a missing NUL separator,
//!   or an unknown header sub-command

use bytes::Bytes;
use fujinet_core::{
    ErrorCode, TransactionFlag,
    constants::{HEADERS_ADD, HEADERS_END, HEADERS_START, MAX_SPECIFIER_LENGTH},
};
use tracing::{debug, warn};

use crate::{
    command::{CommandCode, HostCommand, HostRequest},
    error::TranslatorError,
    frame::{CommandFrame, ResponseFrame},
};

/// Converts between host frames and device requests.
pub trait HostTranslator {
    /// Name of the host bus this translator speaks.
    fn name(&self) -> &str;

    /// Validate a frame and decode the command it carries.
    ///
    /// # Errors
    /// Returns `NotSupported` for unknown commands and `InvalidParameter`
    /// for malformed frames.
    fn translate_command(&self, frame: &CommandFrame) -> Result<HostRequest, TranslatorError>;

    /// Wrap an operation outcome for the host.
    fn translate_response(&self, status: ErrorCode, payload: Bytes) -> ResponseFrame;
}

/// Translator for Atari SIO-style command frames.
#[derive(Debug, Clone, Default)]
pub struct SioHostTranslator;

impl SioHostTranslator {
    pub fn new() -> Self {
        Self
    }
}

fn utf8(bytes: &[u8], what: &str) -> Result<String, TranslatorError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| TranslatorError::invalid(format!("{what} is not valid UTF-8")))
}

fn specifier(bytes: &[u8]) -> Result<String, TranslatorError> {
    if bytes.len() > MAX_SPECIFIER_LENGTH {
        return Err(TranslatorError::invalid(format!(
            "specifier is {} bytes (max: {MAX_SPECIFIER_LENGTH})",
            bytes.len()
        )));
    }
    utf8(bytes, "specifier")
}

/// Split a `specifier\0data` payload.
fn split_data(payload: &Bytes) -> Result<(String, Bytes), TranslatorError> {
    let nul = payload
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| TranslatorError::invalid("missing NUL separator"))?;
    let spec = specifier(&payload[..nul])?;
    Ok((spec, payload.slice(nul + 1..)))
}

impl HostTranslator for SioHostTranslator {
    fn name(&self) -> &str {
        "sio"
    }

    fn translate_command(&self, frame: &CommandFrame) -> Result<HostRequest, TranslatorError> {
        if !frame.is_checksum_valid() {
            warn!(
                expected = frame.expected_checksum(),
                actual = frame.checksum,
                "Rejecting frame with bad checksum"
            );
            return Err(TranslatorError::invalid("checksum mismatch"));
        }

        let unit = frame.unit().ok_or_else(|| {
            TranslatorError::invalid(format!("device {:#04x} is not a network unit", frame.device))
        })?;

        let code = CommandCode::from_byte(frame.command).ok_or(TranslatorError::NotSupported {
            command: frame.command,
        })?;

        let command = match code {
            CommandCode::Open => HostCommand::Open {
                specifier: specifier(&frame.payload)?,
                mode: frame.aux1,
                flag: TransactionFlag(frame.aux2),
            },
            CommandCode::Read => HostCommand::Get {
                specifier: specifier(&frame.payload)?,
                capacity: frame.aux(),
            },
            CommandCode::Write => {
                let (specifier, data) = split_data(&frame.payload)?;
                HostCommand::PostBin { specifier, data }
            }
            CommandCode::Post => {
                let (specifier, data) = split_data(&frame.payload)?;
                HostCommand::Post {
                    specifier,
                    data: utf8(&data, "post body")?,
                }
            }
            CommandCode::Delete => HostCommand::Delete {
                specifier: specifier(&frame.payload)?,
                flag: TransactionFlag(frame.aux2),
            },
            CommandCode::SetChannelMode => HostCommand::SetChannelMode {
                specifier: specifier(&frame.payload)?,
                mode: frame.aux1,
            },
            CommandCode::Headers => match frame.aux1 {
                HEADERS_START => HostCommand::StartHeaders {
                    specifier: specifier(&frame.payload)?,
                },
                HEADERS_ADD => {
                    let (specifier, line) = split_data(&frame.payload)?;
                    HostCommand::AddHeader {
                        specifier,
                        line: utf8(&line, "header line")?,
                    }
                }
                HEADERS_END => HostCommand::EndHeaders {
                    specifier: specifier(&frame.payload)?,
                },
                other => {
                    return Err(TranslatorError::invalid(format!(
                        "unknown header sub-command {other}"
                    )));
                }
            },
            CommandCode::Close => HostCommand::Close {
                specifier: specifier(&frame.payload)?,
            },
            CommandCode::Status => HostCommand::Status {
                specifier: specifier(&frame.payload)?,
            },
        };

        debug!(%unit, command = %code, "Translated host command");
        Ok(HostRequest { unit, command })
    }

    fn translate_response(&self, status: ErrorCode, payload: Bytes) -> ResponseFrame {
        ResponseFrame::from_code(status, payload)
    }
}
