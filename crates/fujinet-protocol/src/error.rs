use thiserror::Error;

/// Framing errors raised by the SIO codecs.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Frame payload too large: {size} bytes (max: {max_size})")]
    FrameTooLarge { size: usize, max_size: usize },

    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Invalid response marker: {byte:#04x}")]
    InvalidMarker { byte: u8 },

    #[error("Unknown status byte: {byte:#04x}")]
    UnknownStatus { byte: u8 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons the host translator rejects a decoded command frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslatorError {
    /// The command byte is not part of the network device command set.
    #[error("Command not supported: {command:#04x}")]
    NotSupported { command: u8 },

    /// The frame is well formed but its contents are not.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl TranslatorError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        TranslatorError::InvalidParameter(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::ChecksumMismatch {
            expected: 0x10,
            actual: 0x20,
        };
        assert_eq!(err.to_string(), "Checksum mismatch: expected 0x10, got 0x20");

        let err = TranslatorError::NotSupported { command: 0x21 };
        assert_eq!(err.to_string(), "Command not supported: 0x21");
    }

    #[test]
    fn test_invalid_helper() {
        let err = TranslatorError::invalid("missing NUL separator");
        assert_eq!(
            err,
            TranslatorError::InvalidParameter("missing NUL separator".to_string())
        );
    }
}
