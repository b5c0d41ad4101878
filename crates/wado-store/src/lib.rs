//! File-backed storage for the static DICOMweb store.
//!
//! The filesystem is the only durability substrate. Two stores sit on it:
//!
//! - [`IndexStore`] -- whole-document JSON index files (studies, series
//!   within a study, instances within a series), gzip-compressed when the
//!   file name carries `.gz`
//! - [`BlobStore`] -- immutable bulk-data payloads keyed by content hash
//!   under `bulkdata/{h[0:3]}/{h[3:5]}/{h[5:]}{ext}`
//!
//! # Failure Rules
//!
//! 1. Reads never fail: a missing, unreadable or malformed file is a soft
//!    miss that is logged and answered with the caller's default.
//! 2. Writes always propagate I/O and serialization errors.
//! 3. Index writes replace the whole file atomically (temp file + rename);
//!    there is no in-place patching.
//! 4. The stores do not serialize concurrent read-modify-write sequences;
//!    callers that need that hold a per-container lock.

pub mod blob;
pub mod codec;
pub mod config;
pub mod error;
pub mod fs;
pub mod index;
pub mod layout;
pub mod multipart;

pub use blob::{BlobStore, GcReport};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use index::{IndexStore, WriteOptions, WriteOutcome};
pub use layout::{IndexLocation, StoreLayout};
