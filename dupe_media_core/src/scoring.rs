use crate::fileinfo::FileInfo;

/// spec.md §4.8: deterministic score, larger is better. Used only to
/// rank within a cluster; the absolute value has no meaning on its own.
#[must_use]
pub fn score(info: &FileInfo) -> f64 {
    let mut total = 0.0;

    let duration = info.media.duration();
    if duration > 0.0 {
        total += 10_000.0;
    }
    total += (duration + 1.0).ln() * 100.0;

    if info.metadata.image_date.is_some() {
        total += 2000.0;
    }
    if info.metadata.has_gps() {
        total += 300.0;
    }
    if info.metadata.camera_model.is_some() {
        total += 200.0;
    }

    let pixels = info.metadata.pixel_count();
    if pixels > 0 {
        total += (pixels as f64).sqrt();
    }

    if info.file_stats.size > 0 {
        total += (info.file_stats.size as f64).ln() * 5.0;
    }

    total
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::{FrameInfo, MediaInfo};
    use crate::metadata::Metadata;
    use crate::stats::FileStats;
    use dupe_media_common::HashBits;

    fn file_info(duration: f64, metadata: Metadata, size: u64) -> FileInfo {
        let frames = if duration > 0.0 {
            vec![
                FrameInfo::new(HashBits::zeroed(64), 0.0),
                FrameInfo::new(HashBits::zeroed(64), duration),
            ]
        } else {
            vec![FrameInfo::new(HashBits::zeroed(64), 0.0)]
        };
        FileInfo::new(
            MediaInfo::new(frames, duration).unwrap(),
            metadata,
            FileStats {
                content_hash: "abc".to_string(),
                size,
                created_at: 0,
                modified_at: 0,
            },
        )
    }

    #[test]
    fn video_outscores_otherwise_identical_image() {
        let meta = Metadata::default();
        let video = file_info(10.0, meta.clone(), 1000);
        let image = file_info(0.0, meta, 1000);
        assert!(score(&video) > score(&image));
    }

    #[test]
    fn metadata_bonuses_are_additive() {
        let bare = Metadata::default();
        let rich = Metadata {
            image_date: Some(1_700_000_000),
            gps_latitude: Some(1.0),
            gps_longitude: Some(2.0),
            camera_model: Some("Pixel".to_string()),
            ..Metadata::default()
        };
        let a = file_info(0.0, bare, 1000);
        let b = file_info(0.0, rich, 1000);
        assert!((score(&b) - score(&a) - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn larger_resolution_scores_higher() {
        let small = Metadata {
            width: 100,
            height: 100,
            ..Metadata::default()
        };
        let large = Metadata {
            width: 4000,
            height: 3000,
            ..Metadata::default()
        };
        let a = file_info(0.0, small, 1000);
        let b = file_info(0.0, large, 1000);
        assert!(score(&b) > score(&a));
    }
}
