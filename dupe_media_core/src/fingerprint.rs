use std::path::Path;
use std::time::SystemTime;

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::extractor::{FrameExtractor, MediaProbe, RawFrameSource};
use crate::fileinfo::FileInfo;
use crate::frame::MediaInfo;
use crate::metadata::{Metadata, MetadataSource};
use crate::stats::{FileStats, StatsSource};

/// A cache keyed by `(content_hash, job_config_hash)` (spec.md §4.3
/// step 2, §4 "Persistent Cache"). The assembler only needs this seam;
/// the persistent, namespaced implementation lives in the cache crate.
pub trait JobStore<V> {
    fn get(&self, content_hash: &str, job_config_hash: u64) -> Option<V>;
    fn put(&self, content_hash: &str, job_config_hash: u64, value: V);
}

/// The secondary `path -> content_hash` index (spec.md §4.3 step 1,
/// §3's "refreshed when size/mtime changes").
pub trait PathIndex {
    fn lookup(&self, path: &Path) -> Option<FileStats>;
    fn store(&self, path: &Path, stats: FileStats);
}

/// spec.md §4.3: File Fingerprint Assembler. Drives cache lookups for
/// frame extraction and metadata, computing on miss and persisting on
/// write.
pub struct FingerprintAssembler<'a, RFS, MDS, SS> {
    extractor: FrameExtractor<'a, RFS>,
    metadata_source: &'a MDS,
    stats_source: &'a SS,
}

impl<'a, RFS, MDS, SS> FingerprintAssembler<'a, RFS, MDS, SS>
where
    RFS: RawFrameSource,
    MDS: MetadataSource,
    SS: StatsSource,
{
    #[must_use]
    pub fn new(
        extractor: FrameExtractor<'a, RFS>,
        metadata_source: &'a MDS,
        stats_source: &'a SS,
    ) -> Self {
        Self {
            extractor,
            metadata_source,
            stats_source,
        }
    }

    /// `getFileInfo(path, config)` (spec.md §4.3).
    pub fn get_file_info(
        &self,
        path: &Path,
        path_index: &impl PathIndex,
        frame_cache: &impl JobStore<MediaInfo>,
        metadata_cache: &impl JobStore<Metadata>,
        cfg: &Config,
    ) -> CoreResult<FileInfo> {
        let file_stats = self.resolve_file_stats(path, path_index)?;

        let job_config_hash = match self.extractor.probe(path)? {
            MediaProbe::Image => cfg.image_extractor_config_hash(),
            MediaProbe::Video { .. } => cfg.video_extractor_config_hash(),
        };

        let media = match frame_cache.get(&file_stats.content_hash, job_config_hash) {
            Some(cached) => cached,
            None => {
                let fresh = self.extractor.extract(path, cfg)?;
                frame_cache.put(&file_stats.content_hash, job_config_hash, fresh.clone());
                fresh
            }
        };

        // Metadata extraction has no tunable config, so its job-config
        // hash is a constant.
        let metadata = match metadata_cache.get(&file_stats.content_hash, 0) {
            Some(cached) => cached,
            None => {
                let fresh = self
                    .metadata_source
                    .extract(path)
                    .map_err(|e| metadata_error(path, &e))?;
                metadata_cache.put(&file_stats.content_hash, 0, fresh.clone());
                fresh
            }
        };

        Ok(FileInfo::new(media, metadata, file_stats))
    }

    /// spec.md §4.3 step 1: reuse cached `FileStats` when the file's
    /// size and mtime are unchanged; otherwise recompute via the
    /// (expensive, content-hashing) `StatsSource` and refresh the index.
    fn resolve_file_stats(
        &self,
        path: &Path,
        path_index: &impl PathIndex,
    ) -> CoreResult<FileStats> {
        let fs_meta = std::fs::metadata(path).map_err(|e| CoreError::InvalidInput {
            path: path.to_path_buf(),
            reason: format!("stat failed: {e}"),
        })?;
        let size = fs_meta.len();
        let modified_at = fs_meta
            .modified()
            .map(system_time_to_unix)
            .unwrap_or_default();

        if let Some(cached) = path_index.lookup(path) {
            if cached.size == size && cached.modified_at == modified_at {
                return Ok(cached);
            }
        }

        let fresh = self
            .stats_source
            .stat(path)
            .map_err(|e| metadata_error(path, &e))?;
        path_index.store(path, fresh.clone());
        Ok(fresh)
    }
}

fn system_time_to_unix(time: SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn metadata_error<E: std::error::Error>(path: &Path, e: &E) -> CoreError {
    CoreError::InvalidInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hasher::PerceptualHasher;
    use dupe_media_common::SquareGrayBuffer;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Write;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("fake error: {0}")]
    struct FakeError(String);

    struct FakeFrameSource;
    impl RawFrameSource for FakeFrameSource {
        type Error = FakeError;
        fn probe(&self, _path: &Path) -> Result<MediaProbe, Self::Error> {
            Ok(MediaProbe::Image)
        }
        fn frame_at(
            &self,
            _path: &Path,
            _timestamp: f64,
            resolution: u32,
        ) -> Result<SquareGrayBuffer, Self::Error> {
            Ok(SquareGrayBuffer::from_pixels(
                resolution,
                vec![100; (resolution * resolution) as usize],
            )
            .unwrap())
        }
    }

    struct FakeMetadataSource {
        calls: RefCell<usize>,
    }
    impl MetadataSource for FakeMetadataSource {
        type Error = FakeError;
        fn extract(&self, _path: &Path) -> Result<Metadata, Self::Error> {
            *self.calls.borrow_mut() += 1;
            Ok(Metadata {
                width: 800,
                height: 600,
                ..Metadata::default()
            })
        }
    }

    struct FakeStatsSource {
        calls: RefCell<usize>,
    }
    impl StatsSource for FakeStatsSource {
        type Error = FakeError;
        fn stat(&self, path: &Path) -> Result<FileStats, Self::Error> {
            *self.calls.borrow_mut() += 1;
            let meta = std::fs::metadata(path).map_err(|e| FakeError(e.to_string()))?;
            let modified_at = meta.modified().map(system_time_to_unix).unwrap_or(0);
            Ok(FileStats {
                content_hash: "deadbeef".to_string(),
                size: meta.len(),
                created_at: 0,
                modified_at,
            })
        }
    }

    #[derive(Default)]
    struct InMemoryPathIndex {
        map: RefCell<HashMap<std::path::PathBuf, FileStats>>,
    }
    impl PathIndex for InMemoryPathIndex {
        fn lookup(&self, path: &Path) -> Option<FileStats> {
            self.map.borrow().get(path).cloned()
        }
        fn store(&self, path: &Path, stats: FileStats) {
            self.map.borrow_mut().insert(path.to_path_buf(), stats);
        }
    }

    #[derive(Default)]
    struct InMemoryJobStore<V: Clone> {
        map: RefCell<HashMap<(String, u64), V>>,
    }
    impl<V: Clone> JobStore<V> for InMemoryJobStore<V> {
        fn get(&self, content_hash: &str, job_config_hash: u64) -> Option<V> {
            self.map
                .borrow()
                .get(&(content_hash.to_string(), job_config_hash))
                .cloned()
        }
        fn put(&self, content_hash: &str, job_config_hash: u64, value: V) {
            self.map
                .borrow_mut()
                .insert((content_hash.to_string(), job_config_hash), value);
        }
    }

    fn temp_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn assembles_file_info_from_scratch() {
        let file = temp_file(b"hello world");
        let frame_source = FakeFrameSource;
        let metadata_source = FakeMetadataSource {
            calls: RefCell::new(0),
        };
        let stats_source = FakeStatsSource {
            calls: RefCell::new(0),
        };
        let extractor = FrameExtractor::new(&frame_source, PerceptualHasher::new(64).unwrap());
        let assembler = FingerprintAssembler::new(extractor, &metadata_source, &stats_source);

        let path_index = InMemoryPathIndex::default();
        let frame_cache = InMemoryJobStore::default();
        let metadata_cache = InMemoryJobStore::default();
        let cfg = Config::default();

        let info = assembler
            .get_file_info(file.path(), &path_index, &frame_cache, &metadata_cache, &cfg)
            .unwrap();

        assert!(info.is_image());
        assert_eq!(info.metadata.width, 800);
        assert_eq!(*metadata_source.calls.borrow(), 1);
        assert_eq!(*stats_source.calls.borrow(), 1);
    }

    #[test]
    fn unchanged_stat_skips_stats_recompute_on_second_call() {
        let file = temp_file(b"stable content");
        let frame_source = FakeFrameSource;
        let metadata_source = FakeMetadataSource {
            calls: RefCell::new(0),
        };
        let stats_source = FakeStatsSource {
            calls: RefCell::new(0),
        };
        let extractor = FrameExtractor::new(&frame_source, PerceptualHasher::new(64).unwrap());
        let assembler = FingerprintAssembler::new(extractor, &metadata_source, &stats_source);

        let path_index = InMemoryPathIndex::default();
        let frame_cache = InMemoryJobStore::default();
        let metadata_cache = InMemoryJobStore::default();
        let cfg = Config::default();

        assembler
            .get_file_info(file.path(), &path_index, &frame_cache, &metadata_cache, &cfg)
            .unwrap();
        assembler
            .get_file_info(file.path(), &path_index, &frame_cache, &metadata_cache, &cfg)
            .unwrap();

        assert_eq!(*stats_source.calls.borrow(), 1);
        assert_eq!(*metadata_source.calls.borrow(), 1);
    }
}
