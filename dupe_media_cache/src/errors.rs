use std::path::PathBuf;

use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Grounded on the teacher's `FsCacheErrorKind`: I/O and (de)serialization
/// failures around the on-disk store, distinguished by which phase
/// produced them.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("error accessing cache store file {path}: {src}")]
    StoreFileIo { src: std::io::Error, path: PathBuf },

    #[error("failed to serialize cache store {path}: {src}")]
    Serialization { src: String, path: PathBuf },

    #[error("failed to deserialize cache store {path}: {src}")]
    Deserialization { src: String, path: PathBuf },
}
