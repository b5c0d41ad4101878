//! Hierarchical activity counters.
//!
//! A [`StatsRegistry`] is a named set of counters, optionally chained to a
//! parent registry that accumulates everything its children record. Counters
//! are pure observability: recording never fails and never changes control
//! flow. Registries are explicit objects handed to the components that use
//! them; there is no process-wide registry.

pub mod registry;

pub use registry::{StatsHierarchy, StatsRegistry};
