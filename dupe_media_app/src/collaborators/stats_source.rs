use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::SystemTime;

use dupe_media_core::{FileStats, StatsSource};
use md5::{Digest, Md5};
use thiserror::Error;

/// The concrete `StatsProducer` (spec.md §6): size/mtime via
/// `std::fs::metadata`, content hash via MD5 over the first and last
/// `maxChunkSize/2` bytes (or the whole file if it is no larger than
/// `maxChunkSize`). `StatsSource::stat` takes no config parameter, so
/// the chunk size is captured here at construction time.
#[derive(Debug, Clone, Copy)]
pub struct ChunkedMd5StatsSource {
    max_chunk_size_bytes: u64,
}

impl ChunkedMd5StatsSource {
    #[must_use]
    pub fn new(max_chunk_size_bytes: u64) -> Self {
        Self {
            max_chunk_size_bytes,
        }
    }
}

#[derive(Debug, Error)]
pub enum StatsSourceError {
    #[error("failed to stat {path}: {src}")]
    Io {
        path: std::path::PathBuf,
        src: std::io::Error,
    },
}

impl StatsSource for ChunkedMd5StatsSource {
    type Error = StatsSourceError;

    fn stat(&self, path: &Path) -> Result<FileStats, Self::Error> {
        let io_err = |src: std::io::Error| StatsSourceError::Io {
            path: path.to_path_buf(),
            src,
        };

        let meta = std::fs::metadata(path).map_err(io_err)?;
        let size = meta.len();
        let created_at = meta.created().ok().map(system_time_to_unix).unwrap_or(0);
        let modified_at = meta.modified().ok().map(system_time_to_unix).unwrap_or(0);

        let mut file = std::fs::File::open(path).map_err(io_err)?;
        let content_hash = content_hash(&mut file, size, self.max_chunk_size_bytes).map_err(io_err)?;

        Ok(FileStats {
            content_hash,
            size,
            created_at,
            modified_at,
        })
    }
}

/// spec.md §6: "MD5 over the first `chunk` bytes and the last `chunk`
/// bytes (where `chunk = maxChunkSize/2`) for files larger than
/// `maxChunkSize`; otherwise over the entire file."
fn content_hash(
    file: &mut std::fs::File,
    size: u64,
    max_chunk_size_bytes: u64,
) -> std::io::Result<String> {
    let mut hasher = Md5::new();

    if size <= max_chunk_size_bytes {
        std::io::copy(file, &mut HashWriter(&mut hasher))?;
    } else {
        let chunk = max_chunk_size_bytes / 2;

        let mut head = vec![0u8; chunk as usize];
        file.read_exact(&mut head)?;
        hasher.update(&head);

        file.seek(SeekFrom::End(-(chunk as i64)))?;
        let mut tail = vec![0u8; chunk as usize];
        file.read_exact(&mut tail)?;
        hasher.update(&tail);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Adapts `Md5` to `std::io::Write` so the whole-file path can stream
/// through `std::io::copy` instead of buffering the file in memory.
struct HashWriter<'a>(&'a mut Md5);

impl std::io::Write for HashWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn system_time_to_unix(time: SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn small_file_hashes_whole_contents() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        f.flush().unwrap();

        let source = ChunkedMd5StatsSource::new(1024 * 1024);
        let stats = source.stat(f.path()).unwrap();
        assert_eq!(stats.content_hash, format!("{:x}", Md5::digest(b"hello world")));
        assert_eq!(stats.size, 11);
    }

    #[test]
    fn large_file_hashes_head_and_tail_windows() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        let head = vec![b'a'; 10];
        let middle = vec![b'b'; 1000];
        let tail = vec![b'c'; 10];
        f.write_all(&head).unwrap();
        f.write_all(&middle).unwrap();
        f.write_all(&tail).unwrap();
        f.flush().unwrap();

        let source = ChunkedMd5StatsSource::new(20);
        let stats = source.stat(f.path()).unwrap();

        let mut expected = Md5::new();
        expected.update(&head);
        expected.update(&tail);
        assert_eq!(stats.content_hash, format!("{:x}", expected.finalize()));
    }

    #[test]
    fn unchanged_content_produces_the_same_hash_across_reopens() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"stable content").unwrap();
        f.flush().unwrap();

        let source = ChunkedMd5StatsSource::new(1024 * 1024);
        let a = source.stat(f.path()).unwrap();
        let b = source.stat(f.path()).unwrap();
        assert_eq!(a.content_hash, b.content_hash);
    }
}
