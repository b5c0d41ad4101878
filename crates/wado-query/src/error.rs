use wado_types::{Level, TypeError};

/// Errors raised while validating index records.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The record is not a JSON object.
    #[error("index record is not a JSON object")]
    NotAnObject,

    /// The record has no value for its level's identifying attribute.
    #[error("{level} record has no {attribute}")]
    MissingIdentifier {
        level: Level,
        attribute: &'static str,
    },

    /// The identifying attribute holds an invalid UID.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] TypeError),
}

/// Convenience alias for query results.
pub type QueryResult<T> = Result<T, QueryError>;
