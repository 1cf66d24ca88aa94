use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Completion engine not ready: no candidate set has been built")]
    NotReady,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Statement cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T = ()> = std::result::Result<T, Error>;

/// Failure to introspect the connected database.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("connection is closed")]
    Closed,

    #[error("introspection query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("metadata fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}
