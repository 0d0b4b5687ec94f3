//! Error types for the terminal client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The server rejected the access token
    #[error("Unauthorized: the server rejected the access token")]
    Unauthorized,

    /// Could not open the WebSocket connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An established connection was lost
    #[error("Connection lost")]
    ConnectionLost,

    /// No usable token could be obtained from the arguments
    #[error("Token error: {0}")]
    TokenError(String),
}
