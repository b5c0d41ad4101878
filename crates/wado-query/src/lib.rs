//! Query layer for the static DICOMweb store.
//!
//! Answers attribute-based lookups over index documents without re-reading
//! disk on every request.
//!
//! # Key Types
//!
//! - [`IndexRecord`] -- A validated index entry: identifier plus open attribute map
//! - [`MatchSpec`] / [`QueryConstraints`] -- Per-request match specifiers
//! - [`qido_filter`] -- Pure, order-preserving filter over records
//! - [`QueryCache`] -- Per-container cache with a staleness lifetime
//! - [`sort_studies`] -- Date/time/UID ordering for study lists

pub mod cache;
pub mod error;
pub mod filter;
pub mod record;
pub mod sort;

pub use cache::{DocumentSource, QueryCache};
pub use error::{QueryError, QueryResult};
pub use filter::{qido_filter, MatchSpec, QueryConstraints};
pub use record::{first_value_of, identifier_of, AttributeValue, IndexRecord};
pub use sort::{compare_values, sort_studies, sort_study_values};
