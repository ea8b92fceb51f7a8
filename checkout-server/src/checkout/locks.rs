//! Per-key mutual exclusion
//!
//! The stock counters of one product are a contended resource: reservation,
//! settlement and expiration all read-then-write them. `LockRegistry` hands
//! out one async mutex per key so each read-validate-write runs as a single
//! critical section, while operations on disjoint keys proceed in parallel.
//!
//! Multi-key acquisition always happens in ascending key order, which rules
//! out deadlock between operations contending on overlapping key sets.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of async mutexes keyed by resource id
///
/// Entries are created on first use and never removed; the registry grows
/// with the number of distinct resources, not with traffic.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl LockRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the lock for a single key, waiting if it is held
    pub async fn acquire(&self, key: i64) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(key).or_default().value().clone();
        lock.lock_owned().await
    }

    /// Acquire locks for a set of keys in ascending order (deduplicated)
    ///
    /// All guards are returned together; dropping the vector releases every
    /// lock.
    pub async fn acquire_many(&self, keys: &[i64]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<i64> = keys.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            guards.push(self.acquire(key).await);
        }
        guards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn held_lock_blocks_second_acquirer() {
        let registry = Arc::new(LockRegistry::new());

        let guard = registry.acquire(1).await;

        let registry2 = registry.clone();
        let second = tokio::spawn(async move { registry2.acquire(1).await });

        // The second acquirer must not get the lock while the first holds it
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        drop(guard);
        let _ = tokio::time::timeout(Duration::from_secs(1), second)
            .await
            .expect("second acquirer should proceed after release")
            .unwrap();
    }

    #[tokio::test]
    async fn disjoint_keys_do_not_contend() {
        let registry = LockRegistry::new();
        let _a = registry.acquire(1).await;
        // Must complete immediately even though key 1 is held
        let _b = tokio::time::timeout(Duration::from_millis(100), registry.acquire(2))
            .await
            .expect("disjoint key should be free");
    }

    #[tokio::test]
    async fn acquire_many_deduplicates_keys() {
        let registry = LockRegistry::new();
        // Duplicate keys would self-deadlock without dedup
        let guards = tokio::time::timeout(
            Duration::from_secs(1),
            registry.acquire_many(&[7, 3, 7, 3]),
        )
        .await
        .expect("duplicate keys must not deadlock");
        assert_eq!(guards.len(), 2);
    }

    #[tokio::test]
    async fn overlapping_sets_resolve_without_deadlock() {
        let registry = Arc::new(LockRegistry::new());

        // Two tasks locking overlapping sets, given in opposite order; the
        // registry sorts internally so they cannot deadlock.
        let r1 = registry.clone();
        let t1 = tokio::spawn(async move {
            for _ in 0..50 {
                let _g = r1.acquire_many(&[1, 2, 3]).await;
            }
        });
        let r2 = registry.clone();
        let t2 = tokio::spawn(async move {
            for _ in 0..50 {
                let _g = r2.acquire_many(&[3, 2, 1]).await;
            }
        });

        let joined = tokio::time::timeout(Duration::from_secs(5), async {
            t1.await.unwrap();
            t2.await.unwrap();
        })
        .await;
        assert!(joined.is_ok(), "lock ordering should prevent deadlock");
    }
}
