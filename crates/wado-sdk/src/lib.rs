//! High-level API for the static DICOMweb store.
//!
//! [`StaticStore`] ties the layers together: file-backed index documents,
//! the content-addressed bulk-data store, the query cache and the mutation
//! coordinator that keeps parent indexes consistent when entities are
//! removed.

pub mod error;
pub mod locks;
pub mod mutation;
pub mod store;

pub use error::{SdkError, SdkResult};
pub use locks::{ContainerGuard, ContainerLocks};
pub use mutation::{DeletableEntity, DeletionReport, MutationCoordinator, StudyDirectory};
pub use store::StaticStore;

// Re-export key types
pub use wado_query::{IndexRecord, MatchSpec, QueryConstraints};
pub use wado_stats::{StatsHierarchy, StatsRegistry};
pub use wado_store::{BlobStore, IndexLocation, StoreConfig, StoreLayout, WriteOutcome};
pub use wado_types::{ContentHash, Level, Uid};
