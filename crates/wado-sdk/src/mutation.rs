//! Entity removal with a consistent parent index rewrite.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use wado_query::{identifier_of, QueryCache};
use wado_stats::StatsRegistry;
use wado_store::{IndexLocation, IndexStore, StoreLayout};
use wado_types::{Level, Uid};

use crate::error::{SdkError, SdkResult};
use crate::locks::ContainerLocks;

/// Something that can remove its own persisted data.
#[async_trait]
pub trait DeletableEntity: Send + Sync {
    async fn delete(&self) -> io::Result<()>;
}

/// The on-disk directory of one study, removed recursively.
#[derive(Clone, Debug)]
pub struct StudyDirectory {
    path: PathBuf,
}

impl StudyDirectory {
    pub fn new(layout: &StoreLayout, study: &Uid) -> Self {
        Self {
            path: layout.study_dir(study),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DeletableEntity for StudyDirectory {
    async fn delete(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed study directory");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "study directory already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Outcome of [`MutationCoordinator::delete_entity`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletionReport {
    pub uid: Uid,
    pub records_before: usize,
    pub records_after: usize,
    /// The parent index did not exist, so nothing was rewritten.
    pub index_missing: bool,
}

impl DeletionReport {
    /// Whether a record for the entity was dropped from the index.
    pub fn removed(&self) -> bool {
        self.records_after < self.records_before
    }
}

/// Removes entities and rewrites their parent index.
///
/// The sequence for one deletion is:
///
/// 1. remove the entity's own data;
/// 2. read the parent index from disk, bypassing the cache;
/// 3. drop every record whose identifier equals the entity's;
/// 4. write the remaining records back wholesale and invalidate the cache.
///
/// All four steps hold the container's write lock. If step 1 fails the
/// index is left as it was and the failure is returned.
pub struct MutationCoordinator {
    index: Arc<IndexStore>,
    cache: Arc<QueryCache>,
    locks: Arc<ContainerLocks>,
    stats: Arc<StatsRegistry>,
}

impl MutationCoordinator {
    pub fn new(
        index: Arc<IndexStore>,
        cache: Arc<QueryCache>,
        locks: Arc<ContainerLocks>,
        stats: Arc<StatsRegistry>,
    ) -> Self {
        Self {
            index,
            cache,
            locks,
            stats,
        }
    }

    pub async fn delete_entity(
        &self,
        container: &IndexLocation,
        level: Level,
        uid: &Uid,
        entity: &dyn DeletableEntity,
    ) -> SdkResult<DeletionReport> {
        let _guard = self.locks.lock(container).await;

        if let Err(source) = entity.delete().await {
            warn!(%level, uid = %uid, error = %source, "entity removal failed, index left unchanged");
            return Err(SdkError::EntityRemoval {
                level,
                uid: uid.to_string(),
                source,
            });
        }

        let loaded = self
            .index
            .load::<Value>(&container.dir, &container.name)
            .await
            .inspect_err(|e| {
                warn!(container = %container, error = %e, "parent index unreadable, not rewriting");
            })?;
        let Some(document) = loaded else {
            debug!(container = %container, "parent index missing, nothing to rewrite");
            return Ok(DeletionReport {
                uid: uid.clone(),
                records_before: 0,
                records_after: 0,
                index_missing: true,
            });
        };
        let Value::Array(records) = document else {
            warn!(container = %container, "parent index is not a list");
            return Err(SdkError::MalformedIndex(container.to_string()));
        };

        let records_before = records.len();
        let kept: Vec<Value> = records
            .into_iter()
            .filter(|record| identifier_of(level, record).as_deref() != Some(uid.as_str()))
            .collect();
        let records_after = kept.len();

        self.index.write(&container.dir, &container.name, &kept).await?;
        self.cache.invalidate(container).await;

        self.stats.add("Delete", &format!("Deleted {level}"), 0);
        info!(
            %level,
            uid = %uid,
            before = records_before,
            after = records_after,
            "deleted entity and rewrote parent index"
        );

        Ok(DeletionReport {
            uid: uid.clone(),
            records_before,
            records_after,
            index_missing: false,
        })
    }
}

impl std::fmt::Debug for MutationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("locks", &self.locks)
            .finish()
    }
}
