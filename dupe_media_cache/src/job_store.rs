use std::hash::Hash;
use std::path::{Path, PathBuf};

use dupe_media_core::JobStore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::base_store::BaseStore;
use crate::errors::CacheResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct JobKey {
    content_hash: String,
    job_config_hash: u64,
}

/// spec.md §4/§9: a namespace in the persistent cache, keyed by
/// `(content_hash, job_config_hash)`, paired with a `_config` sibling
/// file recording the last config hash this namespace was built with.
/// If the current run's hash differs, the whole namespace is stale
/// (every entry was computed under a different resolution/frame-bound
/// policy) and is cleared rather than left to accumulate dead entries
/// keyed under abandoned config hashes.
pub struct JobResultStore<V> {
    store: BaseStore<JobKey, V>,
    config_marker: BaseStore<(), u64>,
}

impl<V> JobResultStore<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    pub fn open(path: PathBuf, save_threshold: u32, current_config_hash: u64) -> CacheResult<Self> {
        let store: BaseStore<JobKey, V> = BaseStore::open(path.clone(), save_threshold)?;
        let config_marker: BaseStore<(), u64> = BaseStore::open(config_sibling_path(&path), 1)?;

        let stale = config_marker.get(&()) != Some(current_config_hash);
        if stale {
            store.clear();
            config_marker.insert((), current_config_hash)?;
            store.save()?;
        }

        Ok(Self {
            store,
            config_marker,
        })
    }

    pub fn save(&self) -> CacheResult<()> {
        self.store.save()?;
        self.config_marker.save()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl<V> JobStore<V> for JobResultStore<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    fn get(&self, content_hash: &str, job_config_hash: u64) -> Option<V> {
        self.store.get(&JobKey {
            content_hash: content_hash.to_string(),
            job_config_hash,
        })
    }

    fn put(&self, content_hash: &str, job_config_hash: u64, value: V) {
        // The in-memory insert already happened inside `BaseStore::insert`
        // by the time a threshold-triggered save can fail, so the value
        // is still served for the rest of this run; only the on-disk
        // persistence diagnostic would otherwise be lost (spec.md §7:
        // "Cache write failures are logged; the value is simply not
        // cached for that key and recomputed next run.").
        if let Err(e) = self.store.insert(
            JobKey {
                content_hash: content_hash.to_string(),
                job_config_hash,
            },
            value,
        ) {
            log::warn!(target: "cache", "failed to persist job result: {e}");
        }
    }
}

fn config_sibling_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let filename = match path.extension() {
        Some(ext) => format!("{stem}_config.{}", ext.to_string_lossy()),
        None => format!("{stem}_config"),
    };
    path.with_file_name(filename)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_a_value() {
        let dir = tempfile::tempdir().unwrap();
        let store: JobResultStore<u32> =
            JobResultStore::open(dir.path().join("frames.bin"), 1000, 42).unwrap();
        assert_eq!(store.get("hash1", 42), None);
        store.put("hash1", 42, 7);
        assert_eq!(store.get("hash1", 42), Some(7));
    }

    #[test]
    fn reopening_with_the_same_config_hash_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.bin");
        {
            let store: JobResultStore<u32> = JobResultStore::open(path.clone(), 1000, 42).unwrap();
            store.put("hash1", 42, 7);
            store.save().unwrap();
        }
        let reopened: JobResultStore<u32> = JobResultStore::open(path, 1000, 42).unwrap();
        assert_eq!(reopened.get("hash1", 42), Some(7));
    }

    #[test]
    fn reopening_with_a_different_config_hash_clears_the_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.bin");
        {
            let store: JobResultStore<u32> = JobResultStore::open(path.clone(), 1000, 42).unwrap();
            store.put("hash1", 42, 7);
            store.save().unwrap();
        }
        let reopened: JobResultStore<u32> = JobResultStore::open(path, 1000, 99).unwrap();
        assert_eq!(reopened.get("hash1", 42), None);
        assert!(reopened.is_empty());
    }
}
