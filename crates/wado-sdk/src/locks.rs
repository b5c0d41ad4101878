use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::OwnedMutexGuard;
use wado_store::IndexLocation;

type LockMap = HashMap<IndexLocation, Arc<tokio::sync::Mutex<()>>>;

/// One async write lock per index container.
///
/// Every read-modify-write of an index document goes through the lock for
/// its location, so two mutations of the same container never interleave.
/// Different containers proceed independently. A container's entry is
/// removed when the last holder releases it with nobody waiting.
#[derive(Default)]
pub struct ContainerLocks {
    locks: Mutex<LockMap>,
}

/// Exclusive access to one container; released on drop.
#[must_use = "the container is unlocked as soon as the guard is dropped"]
pub struct ContainerGuard<'a> {
    locks: &'a ContainerLocks,
    location: IndexLocation,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ContainerGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters clone the `Arc` under the map lock, so a count of one
        // here means the map holds the only reference.
        let mut map = self.locks.map();
        if map
            .get(&self.location)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.location);
        }
    }
}

impl ContainerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `location`.
    pub async fn lock(&self, location: &IndexLocation) -> ContainerGuard<'_> {
        let lock = Arc::clone(
            self.map()
                .entry(location.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        );
        let guard = lock.lock_owned().await;
        ContainerGuard {
            locks: self,
            location: location.clone(),
            guard: Some(guard),
        }
    }

    /// Number of containers currently locked or waited on.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    fn map(&self) -> MutexGuard<'_, LockMap> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ContainerLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerLocks")
            .field("containers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loc(name: &str) -> IndexLocation {
        IndexLocation::new("/data", name)
    }

    #[tokio::test]
    async fn same_container_is_exclusive() {
        let locks = ContainerLocks::new();
        let guard = locks.lock(&loc("a")).await;

        let blocked = tokio::time::timeout(Duration::from_millis(20), locks.lock(&loc("a"))).await;
        assert!(blocked.is_err());

        drop(guard);
        let reacquired = tokio::time::timeout(Duration::from_millis(20), locks.lock(&loc("a"))).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn different_containers_are_independent() {
        let locks = ContainerLocks::new();
        let _a = locks.lock(&loc("a")).await;
        let b = tokio::time::timeout(Duration::from_millis(20), locks.lock(&loc("b"))).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn serializes_concurrent_increments() {
        let locks = Arc::new(ContainerLocks::new());
        let counter = Arc::new(Mutex::new(0u32));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let counter = Arc::clone(&counter);
                tokio::spawn(async move {
                    let _guard = locks.lock(&loc("shared")).await;
                    let current = *counter.lock().unwrap();
                    tokio::task::yield_now().await;
                    *counter.lock().unwrap() = current + 1;
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }
        assert_eq!(*counter.lock().unwrap(), 16);
    }

    #[tokio::test]
    async fn released_containers_are_forgotten() {
        let locks = ContainerLocks::new();
        for i in 0..100 {
            let _guard = locks.lock(&loc(&format!("c{i}"))).await;
        }
        assert!(locks.is_empty());

        let held = locks.lock(&loc("a")).await;
        assert_eq!(locks.len(), 1);
        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn entry_survives_while_a_waiter_is_queued() {
        let locks = Arc::new(ContainerLocks::new());
        let first = locks.lock(&loc("a")).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(&loc("a")).await;
            })
        };
        // Let the waiter queue up behind the held lock.
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.len(), 1);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
