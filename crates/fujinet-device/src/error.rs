use fujinet_hardware::HardwareError;
use fujinet_network::ClientError;
use fujinet_protocol::ProtocolError;
use thiserror::Error;

/// Failures that stop the device from starting or keep the bus bridge from
/// running.
///
/// Individual device operations never return this; they end in an
/// [`ErrorCode`](fujinet_core::ErrorCode).
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Configuration error: {0}")]
    Config(#[from] fujinet_core::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] ClientError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
