use std::io;

use thiserror::Error;
use wado_types::Level;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("store error: {0}")]
    Store(#[from] wado_store::StoreError),

    #[error("query error: {0}")]
    Query(#[from] wado_query::QueryError),

    #[error("invalid value: {0}")]
    Type(#[from] wado_types::TypeError),

    #[error("couldn't remove {level} {uid}: {source}")]
    EntityRemoval {
        level: Level,
        uid: String,
        #[source]
        source: io::Error,
    },

    #[error("index document at {0} is not a list")]
    MalformedIndex(String),
}

pub type SdkResult<T> = Result<T, SdkError>;
