//! Error types for byte channel operations.
//!
//! These errors cover the ways a host bus transport can fail: the peer going
//! away, reads timing out, the channel being used before it is opened, and
//! plain I/O failures from the underlying socket or port.

/// Result type alias for channel operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during byte channel operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Peer is not connected or has gone away.
    #[error("Channel disconnected: {channel}")]
    Disconnected { channel: String },

    /// No data arrived within the read timeout.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Channel used before `open` or after `close`.
    #[error("Channel not open: {channel}")]
    NotOpen { channel: String },

    /// Transport-level communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Platform initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Transport configuration error.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(channel: impl Into<String>) -> Self {
        Self::Disconnected {
            channel: channel.into(),
        }
    }

    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    pub fn not_open(channel: impl Into<String>) -> Self {
        Self::NotOpen {
            channel: channel.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Whether the error only means "nothing to read yet".
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
