use shared::ProtocolError;

/// Reasons a connection handler stops. None of them reach the server loop.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("outbound channel closed")]
    Closed,
    #[error("outbound queue full")]
    Full,
}

/// Startup failures; the only errors that end the process.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind: {0}")]
    Bind(#[source] std::io::Error),
    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),
}
