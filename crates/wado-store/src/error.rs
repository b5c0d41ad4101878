use wado_types::TypeError;

/// Errors from store write paths, checked loads and configuration.
///
/// Soft-miss read paths do not use this type: they degrade to a default
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization of a document failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Gzip encoding failed or the compression task was lost.
    #[error("compression error: {0}")]
    Compression(String),

    /// A document exists but could not be decompressed or parsed.
    #[error("corrupt document at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// An identifier failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] TypeError),

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
