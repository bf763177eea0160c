use crate::frame::MediaInfo;
use crate::metadata::Metadata;
use crate::stats::FileStats;

/// spec.md §3: the assembled per-file record the rest of the pipeline
/// operates on. Ephemeral per run — it is reconstructed from the three
/// caches rather than itself being cached directly.
#[derive(Clone, Debug, PartialEq)]
pub struct FileInfo {
    pub media: MediaInfo,
    pub metadata: Metadata,
    pub file_stats: FileStats,
}

impl FileInfo {
    #[must_use]
    pub fn new(media: MediaInfo, metadata: Metadata, file_stats: FileStats) -> Self {
        Self {
            media,
            metadata,
            file_stats,
        }
    }

    #[must_use]
    pub fn is_video(&self) -> bool {
        self.media.is_video()
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.media.is_image()
    }
}
