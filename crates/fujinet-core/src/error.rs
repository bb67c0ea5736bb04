//! Error types shared by every FujiNet HAL crate.
//!
//! Two kinds of error live here:
//!
//! - [`ErrorCode`]: the closed, single-byte status vocabulary the 8-bit host
//!   understands. Every device operation ends in exactly one of these values.
//! - [`Error`]: the rich Rust-side error used for configuration, parsing and I/O
//!   failures that never cross the host boundary as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Device status codes as seen by the host.
///
/// The discriminants are the wire values. Operations that return a byte count
/// on success report failure as the negated code (see [`ErrorCode::negated`]),
/// so the sign alone tells success from failure.
///
/// # Examples
///
/// ```
/// use fujinet_core::ErrorCode;
///
/// assert_eq!(ErrorCode::IoError.as_byte(), 1);
/// assert_eq!(ErrorCode::IoError.negated(), -1);
/// assert_eq!(ErrorCode::try_from(3).unwrap(), ErrorCode::Offline);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ErrorCode {
    /// No error.
    #[default]
    Ok = 0x00,

    /// Transport failure or transfer exceeding the host buffer.
    IoError = 0x01,

    /// Malformed request or illegal state transition.
    BadCommand = 0x02,

    /// The operation needs an active connection and there is none.
    Offline = 0x03,

    /// Unit number out of range or unaddressable.
    NoDevice = 0x05,

    /// Collaborator failure outside the translation table.
    Unknown = 0xFF,
}

impl ErrorCode {
    /// Wire byte for this code.
    #[inline]
    #[must_use]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Negated wire value, used where success returns a non-negative count.
    #[inline]
    #[must_use]
    pub fn negated(self) -> i16 {
        -i16::from(self.as_byte())
    }

    /// Returns `true` for [`ErrorCode::Ok`].
    #[inline]
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, ErrorCode::Ok)
    }

    /// Collapse a unit result into a status code.
    #[must_use]
    pub fn from_result(result: std::result::Result<(), ErrorCode>) -> Self {
        result.err().unwrap_or(ErrorCode::Ok)
    }

    /// Encode a tagged count result into the signed wire form.
    ///
    /// Counts above `i16::MAX` cannot be represented and are reported as
    /// [`ErrorCode::IoError`]; callers cap transfers well below that.
    #[must_use]
    pub fn encode_count(result: std::result::Result<usize, ErrorCode>) -> i16 {
        match result {
            Ok(count) => i16::try_from(count).unwrap_or(ErrorCode::IoError.negated()),
            Err(code) => code.negated(),
        }
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(ErrorCode::Ok),
            0x01 => Ok(ErrorCode::IoError),
            0x02 => Ok(ErrorCode::BadCommand),
            0x03 => Ok(ErrorCode::Offline),
            0x05 => Ok(ErrorCode::NoDevice),
            0xFF => Ok(ErrorCode::Unknown),
            other => Err(Error::InvalidErrorCode { code: other }),
        }
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code.as_byte()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Ok => "OK",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::BadCommand => "BAD_COMMAND",
            ErrorCode::Offline => "OFFLINE",
            ErrorCode::NoDevice => "NO_DEVICE",
            ErrorCode::Unknown => "UNKNOWN",
        };
        write!(f, "{name}")
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid error code: 0x{code:02X}")]
    InvalidErrorCode { code: u8 },

    #[error("Invalid unit number: {unit}")]
    InvalidUnit { unit: u8 },

    #[error("Invalid open mode: {code}")]
    InvalidOpenMode { code: u8 },

    #[error("Invalid channel mode: {code}")]
    InvalidChannelMode { code: u8 },

    #[error("Invalid header line: {0}")]
    InvalidHeader(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl Error {
    /// Status code reported to the host when this error ends an operation.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidUnit { .. } => ErrorCode::NoDevice,
            Error::InvalidErrorCode { .. }
            | Error::InvalidOpenMode { .. }
            | Error::InvalidChannelMode { .. }
            | Error::InvalidHeader(_) => ErrorCode::BadCommand,
            Error::Io(_) => ErrorCode::IoError,
            Error::Config(_) | Error::Figment(_) => ErrorCode::Unknown,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
