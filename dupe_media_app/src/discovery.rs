use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Inclusion-list counterpart to the teacher's `excl_exts` (`arg_parse.rs`):
/// the teacher walks everything and excludes known-irrelevant extensions,
/// but this deduplicator only ever classifies images and videos, so it is
/// simpler to recognize the extensions it handles than to enumerate
/// everything it doesn't.
const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];
const VIDEO_EXTS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "flv", "wmv", "m4v", "mpg", "mpeg",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

#[must_use]
pub fn classify(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if IMAGE_EXTS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Walks every directory in `roots`, returning every file recognized by
/// [`classify`]. Grounded on the teacher's `FileProjection::project_using_fs`,
/// minus the exclude-path machinery this tool has no use for.
pub fn discover(roots: &[PathBuf]) -> Vec<PathBuf> {
    roots
        .iter()
        .flat_map(|root| {
            WalkDir::new(root)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| classify(path).is_some())
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classifies_by_extension_case_insensitively() {
        assert_eq!(classify(Path::new("a.JPG")), Some(MediaKind::Image));
        assert_eq!(classify(Path::new("a.Mp4")), Some(MediaKind::Video));
        assert_eq!(classify(Path::new("a.txt")), None);
        assert_eq!(classify(Path::new("a")), None);
    }

    #[test]
    fn discover_walks_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("nested/b.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("c.txt"), b"x").unwrap();

        let mut found = discover(&[dir.path().to_path_buf()]);
        found.sort();
        assert_eq!(found.len(), 2);
    }
}
