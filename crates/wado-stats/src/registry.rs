use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

/// A named counter set, optionally chained to a parent.
pub struct StatsRegistry {
    name: String,
    description: String,
    parent: Option<Arc<StatsRegistry>>,
    counters: Mutex<BTreeMap<String, u64>>,
}

impl StatsRegistry {
    /// Create a root registry.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parent: None,
            counters: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a registry whose increments also accumulate in `parent`.
    pub fn with_parent(
        name: impl Into<String>,
        description: impl Into<String>,
        parent: Arc<StatsRegistry>,
    ) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(name, description)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parent(&self) -> Option<&Arc<StatsRegistry>> {
        self.parent.as_ref()
    }

    /// Increment `item`.
    ///
    /// Every `message_count` increments a progress line is logged; `0`
    /// disables the periodic line. The parent receives the same increment
    /// with periodic logging disabled.
    pub fn add(&self, item: &str, description: &str, message_count: u64) {
        let count = {
            let mut counters = self.lock();
            let counter = counters.entry(item.to_string()).or_insert(0);
            *counter += 1;
            *counter
        };

        if message_count > 0 && count % message_count == 0 {
            info!(registry = %self.name, item, count, "{description}");
        }

        if let Some(parent) = &self.parent {
            parent.add(item, description, 0);
        }
    }

    /// Current value of `item` (0 if never recorded).
    pub fn get(&self, item: &str) -> u64 {
        self.lock().get(item).copied().unwrap_or(0)
    }

    /// Copy of all counters, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.lock().clone()
    }

    /// Log the description and every counter, then reset this registry.
    ///
    /// Parents and children are left untouched.
    pub fn summarize(&self, msg: &str) {
        let counters = std::mem::take(&mut *self.lock());
        info!(registry = %self.name, "{msg}");
        info!(registry = %self.name, "{}", self.description);
        for (item, count) in &counters {
            info!(registry = %self.name, item = %item, count, "summary");
        }
    }

    pub fn reset(&self) {
        self.lock().clear();
    }

    // Counters are plain integers, so a panic while holding the lock cannot
    // leave them in a torn state.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, u64>> {
        self.counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for StatsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsRegistry")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
            .field("counters", &self.lock().len())
            .finish()
    }
}

/// The standard three-level registry chain: overall ← study ← buffer.
#[derive(Clone, Debug)]
pub struct StatsHierarchy {
    pub overall: Arc<StatsRegistry>,
    pub study: Arc<StatsRegistry>,
    pub buffer: Arc<StatsRegistry>,
}

impl StatsHierarchy {
    pub fn new() -> Self {
        let overall = Arc::new(StatsRegistry::new("OverallStats", "Overall statistics"));
        let study = Arc::new(StatsRegistry::with_parent(
            "StudyStats",
            "Study Generation",
            Arc::clone(&overall),
        ));
        let buffer = Arc::new(StatsRegistry::with_parent(
            "BufferStats",
            "Buffer Statistics",
            Arc::clone(&study),
        ));
        Self {
            overall,
            study,
            buffer,
        }
    }
}

impl Default for StatsHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Counting
    // -----------------------------------------------------------------------

    #[test]
    fn add_increments_counter() {
        let stats = StatsRegistry::new("test", "Test stats");
        stats.add("Read JSON", "read", 1000);
        stats.add("Read JSON", "read", 1000);
        stats.add("Write JSON", "write", 1000);
        assert_eq!(stats.get("Read JSON"), 2);
        assert_eq!(stats.get("Write JSON"), 1);
        assert_eq!(stats.get("never"), 0);
    }

    #[test]
    fn zero_message_count_still_counts() {
        let stats = StatsRegistry::new("test", "Test stats");
        for _ in 0..5 {
            stats.add("item", "desc", 0);
        }
        assert_eq!(stats.get("item"), 5);
    }

    #[test]
    fn snapshot_is_ordered_copy() {
        let stats = StatsRegistry::new("test", "Test stats");
        stats.add("b", "", 0);
        stats.add("a", "", 0);
        let snap = stats.snapshot();
        let keys: Vec<_> = snap.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        stats.add("a", "", 0);
        assert_eq!(snap["a"], 1);
    }

    // -----------------------------------------------------------------------
    // Hierarchy
    // -----------------------------------------------------------------------

    #[test]
    fn increments_propagate_to_all_ancestors() {
        let h = StatsHierarchy::new();
        h.buffer.add("Buffer Read", "read", 10);
        h.study.add("Read JSON", "read", 10);

        assert_eq!(h.buffer.get("Buffer Read"), 1);
        assert_eq!(h.study.get("Buffer Read"), 1);
        assert_eq!(h.overall.get("Buffer Read"), 1);

        assert_eq!(h.buffer.get("Read JSON"), 0);
        assert_eq!(h.study.get("Read JSON"), 1);
        assert_eq!(h.overall.get("Read JSON"), 1);
    }

    #[test]
    fn summarize_resets_only_self() {
        let h = StatsHierarchy::new();
        h.study.add("Read JSON", "read", 0);
        h.study.summarize("done");
        assert_eq!(h.study.get("Read JSON"), 0);
        assert_eq!(h.overall.get("Read JSON"), 1);
    }

    #[test]
    fn reset_clears() {
        let stats = StatsRegistry::new("test", "");
        stats.add("x", "", 0);
        stats.reset();
        assert!(stats.snapshot().is_empty());
    }

    #[test]
    fn names_and_parent() {
        let h = StatsHierarchy::new();
        assert_eq!(h.study.name(), "StudyStats");
        assert_eq!(h.study.description(), "Study Generation");
        assert_eq!(h.study.parent().map(|p| p.name()), Some("OverallStats"));
        assert!(h.overall.parent().is_none());
    }

    #[test]
    fn concurrent_adds_are_counted() {
        use std::thread;

        let stats = Arc::new(StatsRegistry::new("test", ""));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        stats.add("hit", "", 0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(stats.get("hit"), 800);
    }

    #[test]
    fn debug_format() {
        let stats = StatsRegistry::new("dbg", "");
        let debug = format!("{stats:?}");
        assert!(debug.contains("StatsRegistry"));
        assert!(debug.contains("dbg"));
    }
}
