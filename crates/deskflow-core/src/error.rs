use thiserror::Error;

/// Top-level error type for Deskflow's shared foundation.
///
/// Subsystem crates define their own error types and convert into or wrap
/// `CoreError` where they cross this crate's boundary, so that the `?`
/// operator works seamlessly.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Deskflow core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
