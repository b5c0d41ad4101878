//! Time-bounded cache of parsed index documents.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};
use wado_stats::StatsRegistry;
use wado_store::{IndexLocation, IndexStore};
use wado_types::Level;

use crate::filter::{qido_filter, QueryConstraints};
use crate::record::IndexRecord;

/// Where the cache loads documents from on a miss.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// The raw document at `location`, or `None` if there is none.
    async fn load(&self, location: &IndexLocation) -> Option<Value>;
}

#[async_trait]
impl DocumentSource for IndexStore {
    async fn load(&self, location: &IndexLocation) -> Option<Value> {
        self.read(&location.dir, &location.name).await
    }
}

struct CachedDocument {
    records: Arc<Vec<IndexRecord>>,
    fetched_at: Instant,
}

type Slot = tokio::sync::Mutex<Option<CachedDocument>>;

/// Map size below which no eviction sweep runs.
const MIN_SWEEP_AT: usize = 64;

struct Slots {
    map: HashMap<IndexLocation, Arc<Slot>>,
    /// The next new container triggers a sweep once the map reaches this size.
    sweep_at: usize,
}

/// Per-container cache of parsed index documents.
///
/// Each container is Empty, Fresh or Stale. Staleness is evaluated lazily:
/// an entry whose age has reached the lifetime is discarded at the next
/// access and reloaded before anything is served. Each container has its
/// own async mutex, so concurrent queries arriving at expiry share a single
/// reload instead of each reading the file.
///
/// A container whose document does not exist is never cached: the next
/// query tries the read again.
///
/// Containers nobody is using whose document is stale or missing are
/// evicted from the map. A sweep runs when a new container arrives and the
/// map has doubled since the last sweep, so the map stays proportional to
/// the number of live documents.
pub struct QueryCache {
    source: Arc<dyn DocumentSource>,
    lifetime: Duration,
    stats: Arc<StatsRegistry>,
    slots: Mutex<Slots>,
}

impl QueryCache {
    pub fn new(source: Arc<dyn DocumentSource>, lifetime: Duration, stats: Arc<StatsRegistry>) -> Self {
        Self {
            source,
            lifetime,
            stats,
            slots: Mutex::new(Slots {
                map: HashMap::new(),
                sweep_at: MIN_SWEEP_AT,
            }),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Number of containers currently tracked.
    pub fn container_count(&self) -> usize {
        self.slots_map().map.len()
    }

    /// The parsed document for `location`, reloading it if stale or absent.
    ///
    /// `None` means the backing document does not exist (or could not be
    /// read); `Some` with an empty list is a confirmed empty document.
    pub async fn records(&self, location: &IndexLocation, level: Level) -> Option<Arc<Vec<IndexRecord>>> {
        let slot = self.slot(location);
        let mut guard = slot.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.fetched_at.elapsed() < self.lifetime {
                self.stats.add("Index Cache Hit", "Index cache hit", 0);
                return Some(Arc::clone(&cached.records));
            }
            debug!(location = %location, "cached index document is stale");
        }
        *guard = None;

        let value = self.source.load(location).await?;
        let records = Arc::new(self.parse_document(location, level, value)?);
        self.stats.add("Index Cache Load", "Index cache load", 0);
        *guard = Some(CachedDocument {
            records: Arc::clone(&records),
            fetched_at: Instant::now(),
        });
        Some(records)
    }

    /// Filter the cached document for `location`.
    pub async fn query(
        &self,
        location: &IndexLocation,
        level: Level,
        constraints: &QueryConstraints,
    ) -> Option<Vec<IndexRecord>> {
        let Some(records) = self.records(location, level).await else {
            debug!(location = %location, "no index data to query");
            return None;
        };
        let filtered = qido_filter(&records, constraints);
        debug!(
            location = %location,
            found = filtered.len(),
            total = records.len(),
            "filtered index document"
        );
        Some(filtered)
    }

    /// Drop the cached document for `location`; the next access reloads it.
    pub async fn invalidate(&self, location: &IndexLocation) {
        let slot = self.slots_map().map.get(location).cloned();
        if let Some(slot) = slot {
            *slot.lock().await = None;
        }
    }

    /// Drop every cached document.
    pub async fn clear(&self) {
        let slots: Vec<Arc<Slot>> = self.slots_map().map.values().cloned().collect();
        for slot in &slots {
            *slot.lock().await = None;
        }
        drop(slots);
        self.evict_stale();
    }

    /// Remove idle containers whose document is stale or missing. Returns
    /// how many were removed.
    pub fn evict_stale(&self) -> usize {
        let mut slots = self.slots_map();
        let removed = sweep(&mut slots.map, self.lifetime);
        slots.sweep_at = (slots.map.len() * 2).max(MIN_SWEEP_AT);
        removed
    }

    fn slot(&self, location: &IndexLocation) -> Arc<Slot> {
        let mut slots = self.slots_map();
        if let Some(slot) = slots.map.get(location) {
            return Arc::clone(slot);
        }

        if slots.map.len() >= slots.sweep_at {
            let removed = sweep(&mut slots.map, self.lifetime);
            slots.sweep_at = (slots.map.len() * 2).max(MIN_SWEEP_AT);
            debug!(removed, remaining = slots.map.len(), "evicted idle index documents");
        }

        let slot = Arc::new(tokio::sync::Mutex::new(None));
        slots.map.insert(location.clone(), Arc::clone(&slot));
        slot
    }

    // The map only holds `Arc`s; a panic mid-insert cannot corrupt it.
    fn slots_map(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn parse_document(&self, location: &IndexLocation, level: Level, value: Value) -> Option<Vec<IndexRecord>> {
        let Value::Array(items) = value else {
            warn!(location = %location, "index document is not a list");
            return None;
        };

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(items.len());
        for (position, item) in items.into_iter().enumerate() {
            match IndexRecord::from_value(level, item) {
                Ok(record) if seen.insert(record.uid().clone()) => records.push(record),
                Ok(record) => {
                    warn!(location = %location, uid = %record.uid(), "duplicate index record ignored");
                }
                Err(e) => {
                    warn!(location = %location, position, error = %e, "invalid index record skipped");
                    self.stats.add("Invalid Record", "Invalid index record", 0);
                }
            }
        }
        Some(records)
    }
}

/// Every `Arc` handed out by `slot` is cloned under the map lock, so a
/// strong count of one means no task holds or waits on the slot.
fn sweep(map: &mut HashMap<IndexLocation, Arc<Slot>>, lifetime: Duration) -> usize {
    let before = map.len();
    map.retain(|_, slot| Arc::strong_count(slot) > 1 || !is_idle_and_expired(slot, lifetime));
    before - map.len()
}

fn is_idle_and_expired(slot: &Slot, lifetime: Duration) -> bool {
    match slot.try_lock() {
        Ok(entry) => entry
            .as_ref()
            .map_or(true, |cached| cached.fetched_at.elapsed() >= lifetime),
        Err(_) => false,
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("lifetime", &self.lifetime)
            .field("containers", &self.container_count())
            .finish()
    }
}
