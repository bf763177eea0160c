use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::{Mutex, MutexGuard};

/// spec.md §4.3: "per-cache-key mutual exclusion prevents duplicate
/// work under concurrent callers." A fixed-size array of shard mutexes,
/// selected by hashing the key, so concurrent callers racing to
/// assemble the *same* file's fingerprint serialize on it while
/// unrelated files proceed in parallel.
pub struct KeyedLock {
    shards: Vec<Mutex<()>>,
}

impl KeyedLock {
    #[must_use]
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            shards: (0..shard_count).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn lock<K: Hash>(&self, key: &K) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let shard = (hasher.finish() as usize) % self.shards.len();
        self.shards[shard].lock()
    }
}

impl Default for KeyedLock {
    fn default() -> Self {
        Self::new(32)
    }
}
