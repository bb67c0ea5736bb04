use crate::{
    Result,
    constants::{MAX_UNIT, MIN_UNIT},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network unit number (1-8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitNumber(u8);

impl UnitNumber {
    /// Create a new unit number with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidUnit` if the number is outside 1-8.
    pub fn new(unit: u8) -> Result<Self> {
        if !(MIN_UNIT..=MAX_UNIT).contains(&unit) {
            return Err(Error::InvalidUnit { unit });
        }
        Ok(UnitNumber(unit))
    }

    /// Get the raw unit number.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Zero-based slot index in the registry.
    #[must_use]
    pub fn index(&self) -> usize {
        usize::from(self.0 - MIN_UNIT)
    }

    /// All addressable units in ascending order.
    pub fn all() -> impl Iterator<Item = UnitNumber> {
        (MIN_UNIT..=MAX_UNIT).map(UnitNumber)
    }
}

impl fmt::Display for UnitNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

impl TryFrom<u8> for UnitNumber {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        UnitNumber::new(value)
    }
}

/// URL scheme accepted by the network device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// URL prefix including the `://` separator.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Scheme::Http => "http://",
            Scheme::Https => "https://",
        }
    }

    /// Match the exact, case-sensitive scheme prefix of a URL.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with(Scheme::Https.prefix()) {
            Some(Scheme::Https)
        } else if url.starts_with(Scheme::Http.prefix()) {
            Some(Scheme::Http)
        } else {
            None
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// Open mode, using the CIO aux1 encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpenMode {
    /// Read (HTTP GET).
    #[default]
    Get = 4,
    /// Write (HTTP PUT/POST).
    Put = 8,
    /// Append.
    Append = 9,
}

impl OpenMode {
    /// Decode an aux1 byte.
    ///
    /// # Errors
    /// Returns `Error::InvalidOpenMode` for any value other than 4, 8 or 9.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            4 => Ok(OpenMode::Get),
            8 => Ok(OpenMode::Put),
            9 => Ok(OpenMode::Append),
            _ => Err(Error::InvalidOpenMode { code: value }),
        }
    }

    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OpenMode::Get => write!(f, "GET"),
            OpenMode::Put => write!(f, "PUT"),
            OpenMode::Append => write!(f, "APPEND"),
        }
    }
}

/// Transfer representation negotiated for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ChannelMode {
    #[default]
    Text = 0,
    Binary = 1,
    Json = 2,
}

impl ChannelMode {
    /// Decode a mode byte.
    ///
    /// # Errors
    /// Returns `Error::InvalidChannelMode` for values above 2.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ChannelMode::Text),
            1 => Ok(ChannelMode::Binary),
            2 => Ok(ChannelMode::Json),
            _ => Err(Error::InvalidChannelMode { code: value }),
        }
    }

    #[inline]
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Default `Content-Type` for request bodies sent in this mode.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            ChannelMode::Text => "text/plain",
            ChannelMode::Binary => "application/octet-stream",
            ChannelMode::Json => "application/json",
        }
    }

    /// Default `Accept` header for this mode.
    #[must_use]
    pub fn accept(self) -> &'static str {
        match self {
            ChannelMode::Text => "text/*, */*",
            ChannelMode::Binary => "*/*",
            ChannelMode::Json => "application/json",
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelMode::Text => write!(f, "text"),
            ChannelMode::Binary => write!(f, "binary"),
            ChannelMode::Json => write!(f, "json"),
        }
    }
}

/// Caller-supplied transaction flag (aux2 of OPEN and DELETE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionFlag(pub u8);

impl TransactionFlag {
    /// No transaction semantics requested.
    pub const NONE: TransactionFlag = TransactionFlag(0);

    #[must_use]
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

/// A single `Name: value` request header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderLine {
    pub name: String,
    pub value: String,
}

impl HeaderLine {
    /// Parse a raw `Name: value` line as sent by the host.
    ///
    /// Whitespace around the name and value is trimmed; the value itself is
    /// otherwise kept verbatim.
    ///
    /// # Errors
    /// Returns `Error::InvalidHeader` if the line has no colon or an empty name.
    pub fn parse(line: &str) -> Result<Self> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::InvalidHeader(line.to_string()))?;

        let name = name.trim();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(Error::InvalidHeader(line.to_string()));
        }

        Ok(HeaderLine {
            name: name.to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl fmt::Display for HeaderLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}
