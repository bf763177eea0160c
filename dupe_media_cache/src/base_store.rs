use std::collections::HashMap;
use std::hash::Hash;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering::Relaxed};

use log::{info, trace};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::{CacheError, CacheResult};

/// A namespaced, persistent key-value store: an in-memory `RwLock`-guarded
/// map backed by a single bincode file on disk, written via a
/// temp-file-then-rename so a crash mid-save cannot corrupt the store
/// (spec.md §9: "atomic rename-based disk writes"). Grounded on the
/// teacher's `BaseFsCache`, generalized from `PathBuf` keys to any
/// serializable key type since this store backs both the path index and
/// the content-hash-keyed job stores.
#[derive(Debug)]
pub struct BaseStore<K, V> {
    path: PathBuf,
    save_threshold: u32,
    modified_count: AtomicU32,
    map: RwLock<HashMap<K, V>>,
}

impl<K, V> BaseStore<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Loads an existing store from `path`, or starts empty if none
    /// exists yet. `save_threshold` is the number of mutations
    /// accumulated before an automatic save is triggered.
    pub fn open(path: PathBuf, save_threshold: u32) -> CacheResult<Self> {
        let map = if path.exists() {
            Self::load(&path)?
        } else {
            info!(target: "cache_store_startup", "creating new cache store at {}", path.display());
            HashMap::new()
        };

        Ok(Self {
            path,
            save_threshold,
            modified_count: AtomicU32::new(0),
            map: RwLock::new(map),
        })
    }

    fn load(path: &Path) -> CacheResult<HashMap<K, V>> {
        let file = std::fs::File::open(path).map_err(|e| CacheError::StoreFileIo {
            src: e,
            path: path.to_path_buf(),
        })?;
        let reader = std::io::BufReader::new(file);
        let map = bincode::deserialize_from(reader).map_err(|e| CacheError::Deserialization {
            src: e.to_string(),
            path: path.to_path_buf(),
        })?;
        trace!(target: "cache_store_startup", "loaded cache store from {}", path.display());
        Ok(map)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }

    pub fn insert(&self, key: K, value: V) -> CacheResult<()> {
        {
            self.map.write().insert(key, value);
        }
        let prev = self.modified_count.fetch_add(1, Relaxed);
        self.save_if_due(prev)
    }

    pub fn remove(&self, key: &K) -> CacheResult<()> {
        {
            self.map.write().remove(key);
        }
        let prev = self.modified_count.fetch_add(1, Relaxed);
        self.save_if_due(prev)
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Drops every entry in the in-memory map, without touching the
    /// on-disk file until the next save (spec.md §9: whole-namespace
    /// invalidation when a job's config hash changes).
    pub fn clear(&self) {
        self.map.write().clear();
    }

    fn save_if_due(&self, prev_count: u32) -> CacheResult<()> {
        if prev_count + 1 >= self.save_threshold {
            self.modified_count.store(0, Relaxed);
            self.save()
        } else {
            Ok(())
        }
    }

    pub fn save(&self) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| CacheError::StoreFileIo {
                    src: e,
                    path: self.path.clone(),
                })?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let temp_file = std::fs::File::create(&temp_path).map_err(|e| CacheError::StoreFileIo {
            src: e,
            path: self.path.clone(),
        })?;
        let mut writer = BufWriter::new(temp_file);

        {
            let map = self.map.read();
            bincode::serialize_into(&mut writer, &*map).map_err(|e| CacheError::Serialization {
                src: e.to_string(),
                path: self.path.clone(),
            })?;
        }

        let temp_file = writer.into_inner().map_err(|e| CacheError::StoreFileIo {
            src: e.into_error(),
            path: self.path.clone(),
        })?;
        temp_file.sync_all().map_err(|e| CacheError::StoreFileIo {
            src: e,
            path: self.path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| CacheError::StoreFileIo {
            src: e,
            path: self.path.clone(),
        })?;

        info!(target: "cache_store_transactions", "saved cache store {} ({} entries)", self.path.display(), self.len());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store: BaseStore<String, u32> = BaseStore::open(dir.path().join("store.bin"), 1000).unwrap();
        store.insert("a".to_string(), 1).unwrap();
        assert_eq!(store.get(&"a".to_string()), Some(1));
        assert_eq!(store.get(&"b".to_string()), None);
    }

    #[test]
    fn save_and_reload_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.bin");
        {
            let store: BaseStore<String, u32> = BaseStore::open(path.clone(), 1000).unwrap();
            store.insert("a".to_string(), 1).unwrap();
            store.insert("b".to_string(), 2).unwrap();
            store.save().unwrap();
        }
        let reloaded: BaseStore<String, u32> = BaseStore::open(path, 1000).unwrap();
        assert_eq!(reloaded.get(&"a".to_string()), Some(1));
        assert_eq!(reloaded.get(&"b".to_string()), Some(2));
    }

    #[test]
    fn auto_saves_once_threshold_is_reached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.bin");
        let store: BaseStore<String, u32> = BaseStore::open(path.clone(), 2).unwrap();
        store.insert("a".to_string(), 1).unwrap();
        assert!(!path.exists(), "should not save before threshold");
        store.insert("b".to_string(), 2).unwrap();
        assert!(path.exists(), "should save once threshold is reached");
    }

    #[test]
    fn clear_empties_the_in_memory_map_without_deleting_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.bin");
        let store: BaseStore<String, u32> = BaseStore::open(path, 1000).unwrap();
        store.insert("a".to_string(), 1).unwrap();
        store.clear();
        assert!(store.is_empty());
    }
}
