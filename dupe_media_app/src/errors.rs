use std::path::PathBuf;

use thiserror::Error;

/// Grounded on the teacher's `app::errors::AppError`: the orchestration
/// layer's own failure modes, plus transparent pass-through of the two
/// library crates' error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("candidate directory does not exist: {0}")]
    DirNotFound(PathBuf),

    #[error("{0} is listed as both a candidate and a reference directory")]
    DirOverlap(PathBuf),

    #[error("no candidate directories given")]
    NoCandidates,

    #[error("failed to read config file {path}: {src}")]
    ConfigFileIo {
        path: PathBuf,
        src: std::io::Error,
    },

    #[error("failed to parse config file {path}: {src}")]
    ConfigFileParse { path: PathBuf, src: toml::de::Error },

    #[error("failed to write report to {path}: {src}")]
    ReportIo {
        path: PathBuf,
        src: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    ReportSerialize(#[from] serde_json::Error),

    #[error("failed to move {from} to {to}: {src}")]
    TransferIo {
        from: PathBuf,
        to: PathBuf,
        src: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] dupe_media_core::CoreError),

    #[error(transparent)]
    Cache(#[from] dupe_media_cache::CacheError),
}

pub type AppResult<T> = Result<T, AppError>;
