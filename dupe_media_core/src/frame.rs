use dupe_media_common::HashBits;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// spec.md §3: a single hashed frame, ordered within its `MediaInfo` by
/// non-decreasing timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub hash: HashBits,
    pub timestamp: f64,
}

impl FrameInfo {
    #[must_use]
    pub fn new(hash: HashBits, timestamp: f64) -> Self {
        Self { hash, timestamp }
    }
}

/// spec.md §3: the hashed representation of one media file. `duration
/// == 0` marks an image (exactly one frame, timestamp 0); `duration >
/// 0` marks a video with at least `min_frames` ordered frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    frames: Vec<FrameInfo>,
    duration: f64,
}

impl MediaInfo {
    /// Construct a `MediaInfo`, checking the invariants from spec.md §3:
    /// frames non-empty, timestamps non-decreasing, and the
    /// image/video duration convention.
    pub fn new(frames: Vec<FrameInfo>, duration: f64) -> CoreResult<Self> {
        if frames.is_empty() {
            return Err(CoreError::InvalidInput {
                path: Default::default(),
                reason: "MediaInfo requires at least one frame".to_string(),
            });
        }
        if !frames.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
            return Err(CoreError::InvalidInput {
                path: Default::default(),
                reason: "frames must be ordered by non-decreasing timestamp".to_string(),
            });
        }
        if duration == 0.0 {
            if frames.len() != 1 || frames[0].timestamp != 0.0 {
                return Err(CoreError::InvalidInput {
                    path: Default::default(),
                    reason: "an image (duration == 0) must have exactly one frame at t=0"
                        .to_string(),
                });
            }
        }
        Ok(Self { frames, duration })
    }

    #[must_use]
    pub fn frames(&self) -> &[FrameInfo] {
        &self.frames
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.duration == 0.0
    }

    #[must_use]
    pub fn is_video(&self) -> bool {
        !self.is_image()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn hash(seed: u64) -> HashBits {
        HashBits::from_bits((0..64).map(move |i| (seed >> (i % 64)) & 1 == 1))
    }

    #[test]
    fn rejects_empty_frames() {
        assert!(MediaInfo::new(vec![], 0.0).is_err());
    }

    #[test]
    fn rejects_out_of_order_timestamps() {
        let frames = vec![
            FrameInfo::new(hash(1), 2.0),
            FrameInfo::new(hash(2), 1.0),
        ];
        assert!(MediaInfo::new(frames, 10.0).is_err());
    }

    #[test]
    fn image_must_be_single_frame_at_zero() {
        let ok = MediaInfo::new(vec![FrameInfo::new(hash(1), 0.0)], 0.0);
        assert!(ok.is_ok());
        assert!(ok.unwrap().is_image());

        let bad = MediaInfo::new(
            vec![FrameInfo::new(hash(1), 0.0), FrameInfo::new(hash(2), 1.0)],
            0.0,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn video_accepts_multiple_ordered_frames() {
        let frames = vec![
            FrameInfo::new(hash(1), 0.0),
            FrameInfo::new(hash(2), 1.0),
            FrameInfo::new(hash(3), 1.0),
        ];
        let media = MediaInfo::new(frames, 5.0).unwrap();
        assert!(media.is_video());
        assert_eq!(media.frames().len(), 3);
    }
}
