#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]

pub mod base_store;
pub mod errors;
pub mod job_store;
pub mod keyed_lock;
pub mod path_store;

pub use base_store::BaseStore;
pub use errors::{CacheError, CacheResult};
pub use job_store::JobResultStore;
pub use keyed_lock::KeyedLock;
pub use path_store::PathStatsStore;

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use dupe_media_core::{Config, MediaInfo, Metadata};

/// spec.md §4 "Persistent Cache": the three job namespaces (path index,
/// frame/media extraction, metadata) bundled together, each opened
/// under its own file within `cache_dir`. Wiring this up is the app
/// crate's job; this struct is the one-stop constructor for it.
pub struct MediaCache {
    pub path_index: PathStatsStore,
    pub media: JobResultStore<MediaInfo>,
    pub metadata: JobResultStore<Metadata>,
    pub key_lock: KeyedLock,
}

impl MediaCache {
    pub fn open(cache_dir: &Path, cfg: &Config, save_threshold: u32) -> CacheResult<Self> {
        let path_index = PathStatsStore::open(cache_dir.join("file_stats.bin"), save_threshold)?;

        // The media store holds both image- and video-extracted entries,
        // keyed per-entry by whichever config hash produced them; the
        // namespace as a whole is invalidated if *either* axis changes,
        // since both live under the same `_config` marker.
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        cfg.image_extractor_config_hash().hash(&mut hasher);
        cfg.video_extractor_config_hash().hash(&mut hasher);
        let media_config_hash = hasher.finish();
        let media = JobResultStore::open(
            cache_dir.join("media.bin"),
            save_threshold,
            media_config_hash,
        )?;
        let metadata = JobResultStore::open(cache_dir.join("metadata.bin"), save_threshold, 0)?;

        Ok(Self {
            path_index,
            media,
            metadata,
            key_lock: KeyedLock::default(),
        })
    }

    pub fn save(&self) -> CacheResult<()> {
        self.path_index.save()?;
        self.media.save()?;
        self.metadata.save()
    }

    #[must_use]
    pub fn cache_dir_default(root: &Path) -> PathBuf {
        root.join(".dupe_media_cache")
    }
}
