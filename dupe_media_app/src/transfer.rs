use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use dupe_media_core::Metadata;

use crate::config::TransferSettings;
use crate::errors::{AppError, AppResult};

/// The three routing buckets spec.md §1 names: "route files to
/// target/duplicate/error destinations." Kept as a thin, intentionally
/// simple stage per spec.md's explicit scoping of "target path
/// templating, file move/copy" outside the similarity pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Target,
    Duplicate,
    Error,
}

impl Bucket {
    fn dirname(self) -> &'static str {
        match self {
            Bucket::Target => "target",
            Bucket::Duplicate => "duplicates",
            Bucket::Error => "errors",
        }
    }
}

/// Expands `{year}`, `{month}`, `{day}`, `{camera}`, `{filename}` in
/// `template` against a file's capture date (falling back to mtime
/// when EXIF/ffprobe supplied none) and metadata, then joins the
/// result under `settings.dir/<bucket>/`.
pub fn dest_path(
    settings: &TransferSettings,
    bucket: Bucket,
    original_path: &Path,
    metadata: Option<&Metadata>,
    fallback_mtime: i64,
) -> PathBuf {
    let timestamp = metadata.and_then(|m| m.image_date).unwrap_or(fallback_mtime);
    let dt = Utc
        .timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().expect("epoch is a valid timestamp"));

    let filename = original_path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    let camera = metadata
        .and_then(|m| m.camera_model.as_deref())
        .unwrap_or("unknown-camera");

    let relative = settings
        .template
        .replace("{year}", &dt.format("%Y").to_string())
        .replace("{month}", &dt.format("%m").to_string())
        .replace("{day}", &dt.format("%d").to_string())
        .replace("{camera}", &sanitize(camera))
        .replace("{filename}", &filename);

    settings.dir.join(bucket.dirname()).join(relative)
}

/// Moves (or copies) `src` to `dest`, creating parent directories as
/// needed. A dry run only reports what would happen, per the
/// `--dry-run` flag in `cli.rs`.
pub fn transfer_file(src: &Path, dest: &Path, copy: bool, dry_run: bool) -> AppResult<()> {
    if dry_run {
        log::info!(target: "transfer", "[dry-run] {} -> {}", src.display(), dest.display());
        return Ok(());
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AppError::TransferIo {
            from: src.to_path_buf(),
            to: dest.to_path_buf(),
            src: e,
        })?;
    }

    let io_result = if copy {
        std::fs::copy(src, dest).map(|_| ())
    } else {
        // rename fails across filesystem boundaries; fall back to a
        // copy-then-remove in that case rather than erroring out.
        std::fs::rename(src, dest).or_else(|_| {
            std::fs::copy(src, dest)?;
            std::fs::remove_file(src)
        })
    };

    io_result.map_err(|e| AppError::TransferIo {
        from: src.to_path_buf(),
        to: dest.to_path_buf(),
        src: e,
    })
}

/// Characters that are awkward or invalid in path components across
/// the platforms this tool is likely to run on.
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn settings(template: &str) -> TransferSettings {
        TransferSettings {
            dir: PathBuf::from("/out"),
            template: template.to_string(),
            copy: false,
            dry_run: false,
        }
    }

    #[test]
    fn expands_date_and_filename_tokens() {
        let settings = settings("{year}/{month}/{filename}");
        let meta = Metadata {
            image_date: Some(1_700_000_000), // 2023-11-14T22:13:20Z
            ..Metadata::default()
        };
        let path = dest_path(
            &settings,
            Bucket::Target,
            Path::new("/src/photo.jpg"),
            Some(&meta),
            0,
        );
        assert_eq!(path, PathBuf::from("/out/target/2023/11/photo.jpg"));
    }

    #[test]
    fn falls_back_to_mtime_when_no_capture_date() {
        let settings = settings("{year}/{filename}");
        let path = dest_path(&settings, Bucket::Duplicate, Path::new("/src/a.jpg"), None, 1_700_000_000);
        assert_eq!(path, PathBuf::from("/out/duplicates/2023/a.jpg"));
    }

    #[test]
    fn sanitizes_camera_model_path_separators() {
        let settings = settings("{camera}/{filename}");
        let meta = Metadata {
            camera_model: Some("Acme/Model:2".to_string()),
            ..Metadata::default()
        };
        let path = dest_path(&settings, Bucket::Target, Path::new("a.jpg"), Some(&meta), 0);
        assert_eq!(path, PathBuf::from("/out/target/Acme_Model_2/a.jpg"));
    }
}
