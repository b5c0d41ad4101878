//! Deterministic directory sharding.
//!
//! Two layouts live here:
//!
//! - [`shard_of`] maps an entity identifier (a UID) to a two-level
//!   `primary/secondary` directory pair derived from a 32-bit hash of the
//!   identifier, bounding directory fan-out for very large stores.
//! - [`BlobShard`] splits a content hash itself into `3/2/rest` path
//!   segments for the bulk-data store.
//!
//! Both are pure functions of their input. The identifier hash is pinned by
//! [`SHARD_HASH_VERSION`]; changing it relocates every sharded directory on
//! disk and therefore needs a migration, never a silent upgrade.

pub mod blob;
pub mod sharder;

pub use blob::{BlobShard, DEFAULT_BLOB_EXTENSION};
pub use sharder::{shard_of, ShardPath, SHARD_HASH_VERSION};
