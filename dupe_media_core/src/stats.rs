use serde::{Deserialize, Serialize};

/// spec.md §3/§6: file stat plus a partial-content fingerprint. The
/// fingerprint algorithm (MD5 over first+last windows, or the whole
/// file if small) is specified exactly in spec.md §6, but *computing*
/// it is an external collaborator's job — the core only defines the
/// shape and the cache key it produces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    /// Hex-encoded content hash; used verbatim as a cache key.
    pub content_hash: String,
    pub size: u64,
    pub created_at: i64,
    pub modified_at: i64,
}

/// The external `StatsProducer` collaborator (spec.md §6).
pub trait StatsSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn stat(&self, path: &std::path::Path) -> Result<FileStats, Self::Error>;
}
