use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-key async mutual exclusion. Entries exist only while someone holds or
/// waits on the key, so the map does not grow with every key ever seen.
pub struct KeyLocks<K: Eq + Hash> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

/// Held lock on one key. Released on every exit path of the holder,
/// including early `?` returns.
pub struct KeyGuard<'a, K: Eq + Hash> {
    key: K,
    locks: &'a DashMap<K, Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K> KeyLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    pub async fn acquire(&self, key: K) -> KeyGuard<'_, K> {
        // Clone the Arc out so the shard guard is dropped before awaiting.
        let lock = self.locks.entry(key.clone()).or_default().clone();
        let guard = lock.lock_owned().await;
        KeyGuard {
            key,
            locks: &self.locks,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.len()
    }
}

impl<K> Default for KeyLocks<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        // Unlock first: the owned guard holds its own Arc clone.
        drop(self.guard.take());
        // Waiters clone the Arc under the shard lock, so a count of one means
        // nobody else holds or waits on this key.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
