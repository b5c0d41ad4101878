//! Foundation types for the static DICOMweb store.
//!
//! Every other `wado-*` crate depends on this one. It defines the identity
//! types that appear in paths and index documents, plus the small attribute
//! dictionary used to alias DICOM keywords with their tags.
//!
//! # Key Types
//!
//! - [`Uid`] -- Validated DICOM unique identifier (≤ 64 chars, safe as a path component)
//! - [`Level`] -- Hierarchy level (study, series, instance) and its identifying attribute
//! - [`ContentHash`] -- Hex content hash naming an immutable bulk-data blob
//! - [`tags`] -- Keyword/tag dictionary for the query-relevant attributes

pub mod error;
pub mod hash;
pub mod level;
pub mod tags;
pub mod uid;

pub use error::TypeError;
pub use hash::ContentHash;
pub use level::Level;
pub use uid::Uid;
