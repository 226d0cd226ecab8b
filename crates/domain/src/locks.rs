//! Per-instance mutual exclusion.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Slots are pruned once the table grows past this many entries.
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per aggregate instance.
///
/// Load-mutate-save of an instance happens while its guard is held, so
/// commands against the same instance are serialized while commands against
/// different instances run in parallel.
pub struct InstanceLocks<K> {
    slots: Arc<Mutex<HashMap<K, Arc<AsyncMutex<()>>>>>,
}

impl<K> Clone for InstanceLocks<K> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K> Default for InstanceLocks<K> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Guard over one or two instances, released on drop.
pub struct PairGuard {
    _low: OwnedMutexGuard<()>,
    _high: Option<OwnedMutexGuard<()>>,
}

impl<K: Clone + Eq + Hash + Ord> InstanceLocks<K> {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for one instance.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        self.slot(key).lock_owned().await
    }

    /// Acquires the locks for two instances, lower key first.
    ///
    /// Every caller uses the same global order, so two operations on the
    /// same pair in opposite directions cannot deadlock. The same key twice
    /// locks it once.
    pub async fn lock_pair(&self, a: &K, b: &K) -> PairGuard {
        if a == b {
            return PairGuard {
                _low: self.lock(a).await,
                _high: None,
            };
        }

        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let low = self.lock(low).await;
        let high = self.lock(high).await;
        PairGuard {
            _low: low,
            _high: Some(high),
        }
    }

    /// Acquires the locks for any number of instances, in ascending key
    /// order. Duplicate keys are locked once.
    pub async fn lock_all(&self, keys: &[K]) -> Vec<OwnedMutexGuard<()>> {
        let mut ordered: Vec<&K> = keys.iter().collect();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            guards.push(self.lock(key).await);
        }
        guards
    }

    /// Returns the number of tracked slots.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no slot is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);

        if slots.len() >= PRUNE_THRESHOLD {
            // A slot only referenced by the table has no holder and no waiter
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        }

        Arc::clone(slots.entry(key.clone()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = InstanceLocks::new();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                tokio::spawn(async move {
                    let _guard = locks.lock(&1u32).await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = InstanceLocks::new();
        let _first = locks.lock(&1u32).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.lock(&2u32)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn reverse_pairs_do_not_deadlock() {
        let locks = InstanceLocks::new();

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let locks = locks.clone();
                tokio::spawn(async move {
                    let (a, b) = if i % 2 == 0 { (1u32, 2u32) } else { (2, 1) };
                    let _guard = locks.lock_pair(&a, &b).await;
                    tokio::task::yield_now().await;
                })
            })
            .collect();

        let all = async {
            for task in tasks {
                task.await.unwrap();
            }
        };
        assert!(
            tokio::time::timeout(Duration::from_secs(5), all)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn pair_of_same_key_locks_once() {
        let locks = InstanceLocks::new();
        let guard = tokio::time::timeout(Duration::from_millis(100), locks.lock_pair(&3u32, &3u32)).await;
        assert!(guard.is_ok());
    }

    #[tokio::test]
    async fn lock_all_and_lock_pair_do_not_deadlock() {
        let locks = InstanceLocks::new();

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let locks = locks.clone();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        let _guards = locks.lock_all(&[3u32, 1, 2, 1]).await;
                        tokio::task::yield_now().await;
                    } else {
                        let _guard = locks.lock_pair(&3u32, &1u32).await;
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        let all = async {
            for task in tasks {
                task.await.unwrap();
            }
        };
        assert!(
            tokio::time::timeout(Duration::from_secs(5), all)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn lock_all_dedups_keys() {
        let locks = InstanceLocks::new();
        let guards = locks.lock_all(&[2u32, 2, 5]).await;
        assert_eq!(guards.len(), 2);
    }

    #[tokio::test]
    async fn idle_slots_are_pruned() {
        let locks = InstanceLocks::new();
        for key in 0..PRUNE_THRESHOLD as u32 {
            drop(locks.lock(&key).await);
        }
        assert_eq!(locks.len(), PRUNE_THRESHOLD);

        let _held = locks.lock(&u32::MAX).await;
        assert_eq!(locks.len(), 1);
    }
}
