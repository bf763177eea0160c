use std::path::{Path, PathBuf};

use dupe_media_core::{FileStats, PathIndex};

use crate::base_store::BaseStore;
use crate::errors::CacheResult;

/// spec.md §3/§4: the secondary `path -> content_hash` index, carrying
/// the full cached `FileStats` so staleness (size/mtime) can be checked
/// without re-touching the content hash.
pub struct PathStatsStore {
    store: BaseStore<PathBuf, FileStats>,
}

impl PathStatsStore {
    pub fn open(path: PathBuf, save_threshold: u32) -> CacheResult<Self> {
        Ok(Self {
            store: BaseStore::open(path, save_threshold)?,
        })
    }

    pub fn save(&self) -> CacheResult<()> {
        self.store.save()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl PathIndex for PathStatsStore {
    fn lookup(&self, path: &Path) -> Option<FileStats> {
        self.store.get(&path.to_path_buf())
    }

    fn store(&self, path: &Path, stats: FileStats) {
        // A failed save here is not fatal to the lookup that triggered
        // it; the assembler already has the value it needs, and the
        // next successful save will persist this entry.
        let _ = self.store.insert(path.to_path_buf(), stats);
    }
}
