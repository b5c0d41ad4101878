use thiserror::Error;

/// Errors produced when constructing validated identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid UID {uid:?}: {reason}")]
    InvalidUid { uid: String, reason: String },

    #[error("invalid content hash {hash:?}: {reason}")]
    InvalidContentHash { hash: String, reason: String },
}
