use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Exchange responded but the payload was unusable.
    #[error("Market data error: {0}")]
    Exchange(String),

    #[error("Commentary provider error: {0}")]
    Commentary(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport failure: connect, timeout or non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
