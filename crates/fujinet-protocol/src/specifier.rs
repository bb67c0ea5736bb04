//! Device specifier parser.
//!
//! A device specifier names a network unit and the URL it should talk to:
//!
//! ```text
//! N<unit>:<scheme>://<authority>[/<path>][?<query>]
//! ```
//!
//! Where:
//! - `N`: device class marker (case-insensitive)
//! - `<unit>`: a single digit 1-8
//! - `<scheme>`: `http` or `https` (case-sensitive)
//!
//! # Validation Order
//!
//! Checks run in a fixed order and the first failure wins, so every malformed
//! input maps to exactly one cause:
//!
//! 1. At least three characters
//! 2. Device class marker `N`/`n`
//! 3. Unit digit (a digit outside 1-8 is [`SpecifierError::UnitOutOfRange`])
//! 4. `:` separator
//! 5. `http://` or `https://` prefix
//!
//! Nothing beyond the prefix is validated here. Host, port and path syntax are
//! left to the HTTP client, which reports malformed URLs when the request is made.
//!
//! # Examples
//!
//! ```
//! use fujinet_protocol::specifier::DeviceSpecifier;
//! use fujinet_core::{ErrorCode, Scheme};
//!
//! let spec = DeviceSpecifier::parse("N1:https://example.com/api?x=1").unwrap();
//! assert_eq!(spec.unit().as_u8(), 1);
//! assert_eq!(spec.scheme(), Scheme::Https);
//! assert_eq!(spec.url(), "https://example.com/api?x=1");
//!
//! let err = DeviceSpecifier::parse("X1:http://example.com/").unwrap_err();
//! assert_eq!(err.code(), ErrorCode::BadCommand);
//!
//! let err = DeviceSpecifier::parse("N9:http://example.com/").unwrap_err();
//! assert_eq!(err.code(), ErrorCode::NoDevice);
//! ```

use std::fmt;
use std::str::FromStr;

use fujinet_core::{
    ErrorCode, Scheme, UnitNumber,
    constants::{DEVICE_CLASS_MARKER, MIN_SPECIFIER_LENGTH, SPECIFIER_SEPARATOR},
};
use thiserror::Error;

/// Reasons a device specifier is rejected.
///
/// Each variant is one validation rule, listed in the order the rules are
/// checked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecifierError {
    /// Shorter than `N<d>:`.
    #[error("Specifier too short: {length} characters")]
    TooShort { length: usize },

    /// First character is not the `N` device class marker.
    #[error("Invalid device class marker: {found:?}")]
    InvalidClass { found: char },

    /// Second character is not a digit.
    #[error("Invalid unit character: {found:?}")]
    InvalidUnit { found: char },

    /// Second character is a digit outside 1-8.
    #[error("Unit number out of range: {unit}")]
    UnitOutOfRange { unit: u8 },

    /// Third character is not `:`.
    #[error("Missing ':' separator, found {found:?}")]
    MissingSeparator { found: char },

    /// URL does not start with `http://` or `https://`.
    #[error("Unsupported scheme in URL: {url}")]
    UnsupportedScheme { url: String },
}

impl SpecifierError {
    /// Status code reported to the host for this failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            SpecifierError::UnitOutOfRange { .. } => ErrorCode::NoDevice,
            _ => ErrorCode::BadCommand,
        }
    }
}

impl From<SpecifierError> for ErrorCode {
    fn from(err: SpecifierError) -> Self {
        err.code()
    }
}

/// A validated device specifier.
///
/// Only [`DeviceSpecifier::parse`] constructs this type, so holding one means
/// every rule above has passed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceSpecifier {
    unit: UnitNumber,
    scheme: Scheme,
    url: String,
}

impl DeviceSpecifier {
    /// Parse and validate a specifier string.
    ///
    /// # Errors
    ///
    /// Returns the [`SpecifierError`] for the first rule the input breaks.
    pub fn parse(input: &str) -> Result<Self, SpecifierError> {
        let mut chars = input.chars();

        let (Some(marker), Some(digit), Some(separator)) =
            (chars.next(), chars.next(), chars.next())
        else {
            return Err(SpecifierError::TooShort {
                length: input.chars().count(),
            });
        };
        debug_assert!(input.chars().count() >= MIN_SPECIFIER_LENGTH);

        if !marker.eq_ignore_ascii_case(&DEVICE_CLASS_MARKER) {
            return Err(SpecifierError::InvalidClass { found: marker });
        }

        let unit = digit
            .to_digit(10)
            .ok_or(SpecifierError::InvalidUnit { found: digit })?;
        // to_digit(10) yields 0-9, so the cast is lossless
        let unit = UnitNumber::new(unit as u8)
            .map_err(|_| SpecifierError::UnitOutOfRange { unit: unit as u8 })?;

        if separator != SPECIFIER_SEPARATOR {
            return Err(SpecifierError::MissingSeparator { found: separator });
        }

        let url = chars.as_str();
        let scheme = Scheme::from_url(url).ok_or_else(|| SpecifierError::UnsupportedScheme {
            url: url.to_string(),
        })?;

        Ok(Self {
            unit,
            scheme,
            url: url.to_string(),
        })
    }

    /// Unit addressed by this specifier.
    pub fn unit(&self) -> UnitNumber {
        self.unit
    }

    /// URL scheme.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Target URL with the `N<d>:` prefix removed.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FromStr for DeviceSpecifier {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceSpecifier::parse(s)
    }
}

impl fmt::Display for DeviceSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}:{}", self.unit.as_u8(), self.url)
    }
}
