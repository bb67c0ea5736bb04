use thiserror::Error;

/// Outcomes of a failed HTTP exchange.
///
/// An HTTP response with an error status is not a `ClientError`; it comes
/// back as an [`HttpResponse`](crate::HttpResponse) and the caller decides
/// what the status means.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The remote host actively refused the connection.
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// Connect or request timeout elapsed.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Socket, TLS or protocol failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// URL could not be parsed or is not usable for a request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response body could not be read.
    #[error("Body error: {0}")]
    Body(String),

    /// Request uses a feature the client does not support.
    #[error("Unsupported request: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
