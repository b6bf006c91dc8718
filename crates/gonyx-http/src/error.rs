use thiserror::Error;

/// Error types for HTTP server operations
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP method not supported by server configuration: {0}")]
    MethodNotSupported(String),

    #[error("No route registered under name: {0}")]
    RouteNotFound(String),

    #[error("No HTTP server named: {0}")]
    UnknownServer(String),

    #[error("Creating server '{name}' failed: {reason}")]
    CreateServer { name: String, reason: String },

    #[error("Starting server on {addr} failed: {source}")]
    StartServer {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server is not running")]
    NotRunning,

    #[error("Shutting down server failed: {0}")]
    ShutdownServer(String),

    #[error("Updating server configuration failed: {0}")]
    UpdateServerConfig(String),
}

/// Result type for HTTP server operations
pub type Result<T> = std::result::Result<T, HttpError>;
