use std::path::Path;

use dupe_media_common::SquareGrayBuffer;

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::frame::{FrameInfo, MediaInfo};
use crate::hasher::PerceptualHasher;

/// The external `FrameProducer` collaborator (spec.md §1, §6): "raw
/// frame extraction from image/video containers... provides grayscale
/// pixel buffers at a chosen resolution, with timestamps for video."
/// This is the seam between container parsing (out of scope) and the
/// adaptive extraction policy (in scope, below).
pub trait RawFrameSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Determine whether `path` is a single-frame container (image) or
    /// has a duration (video). Spec.md §4.2: "if duration cannot be
    /// determined, fail with extraction-error."
    fn probe(&self, path: &Path) -> Result<MediaProbe, Self::Error>;

    /// A grayscale, `resolution`x`resolution` pixel buffer sampled at
    /// `timestamp` seconds into the container (ignored for images).
    fn frame_at(
        &self,
        path: &Path,
        timestamp: f64,
        resolution: u32,
    ) -> Result<SquareGrayBuffer, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaProbe {
    Image,
    Video { duration: f64 },
}

/// spec.md §4.2: composes a `RawFrameSource` with the in-scope
/// `PerceptualHasher` to realize the `extract(path) -> MediaInfo`
/// contract.
pub struct FrameExtractor<'a, S> {
    source: &'a S,
    hasher: PerceptualHasher,
}

impl<'a, S: RawFrameSource> FrameExtractor<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, hasher: PerceptualHasher) -> Self {
        Self { source, hasher }
    }

    pub fn probe(&self, path: &Path) -> CoreResult<MediaProbe> {
        self.source.probe(path).map_err(|e| extraction_error(path, &e))
    }

    pub fn extract(&self, path: &Path, cfg: &Config) -> CoreResult<MediaInfo> {
        match self.probe(path)? {
            MediaProbe::Image => self.extract_image(path, cfg),
            MediaProbe::Video { duration } => self.extract_video(path, duration, cfg),
        }
    }

    fn hash_at(&self, path: &Path, timestamp: f64, cfg: &Config) -> CoreResult<FrameInfo> {
        let buffer = self
            .source
            .frame_at(path, timestamp, cfg.resolution)
            .map_err(|e| extraction_error(path, &e))?;
        let hash = self.hasher.hash(&buffer)?;
        Ok(FrameInfo::new(hash, timestamp))
    }

    fn extract_image(&self, path: &Path, cfg: &Config) -> CoreResult<MediaInfo> {
        let frame = self.hash_at(path, 0.0, cfg)?;
        MediaInfo::new(vec![frame], 0.0)
    }

    fn extract_video(&self, path: &Path, duration: f64, cfg: &Config) -> CoreResult<MediaInfo> {
        let timestamps = if duration <= cfg.short_video_threshold_secs {
            evenly_spaced(duration, cfg.min_frames)
        } else {
            self.scene_change_timestamps(path, duration, cfg)?
        };

        let frames = timestamps
            .iter()
            .map(|&t| self.hash_at(path, t, cfg))
            .collect::<CoreResult<Vec<_>>>()?;

        MediaInfo::new(frames, duration)
    }

    /// spec.md §4.2: scene-change detection over a `1/targetFps`
    /// sampling grid, supplemented with evenly spaced frames if too
    /// few changes fire, and uniformly subsampled if too many do.
    fn scene_change_timestamps(
        &self,
        path: &Path,
        duration: f64,
        cfg: &Config,
    ) -> CoreResult<Vec<f64>> {
        let step = 1.0 / cfg.target_fps.max(f64::EPSILON);
        let mut timestamps = Vec::new();
        let mut prev_luma: Option<f64> = None;

        let mut t = 0.0;
        while t <= duration {
            let buffer = self
                .source
                .frame_at(path, t, cfg.resolution)
                .map_err(|e| extraction_error(path, &e))?;
            let luma = mean_luminance(&buffer);

            if let Some(prev) = prev_luma {
                let delta = (luma - prev).abs() / 255.0;
                if delta > cfg.scene_change_threshold {
                    timestamps.push(t);
                }
            }
            prev_luma = Some(luma);
            t += step;
        }

        if timestamps.len() < cfg.min_frames {
            timestamps.extend(evenly_spaced(duration, cfg.min_frames));
        }
        dedup_sorted(&mut timestamps);

        let cap = ((cfg.target_fps * duration).ceil() as usize).max(cfg.max_scene_frames);
        if timestamps.len() > cap {
            timestamps = uniform_subsample(timestamps, cap);
        }

        Ok(timestamps)
    }
}

fn extraction_error<E: std::error::Error>(path: &Path, e: &E) -> CoreError {
    CoreError::InvalidInput {
        path: path.to_path_buf(),
        reason: format!("frame extraction failed: {e}"),
    }
}

fn mean_luminance(buffer: &SquareGrayBuffer) -> f64 {
    let pixels = buffer.pixels();
    if pixels.is_empty() {
        return 0.0;
    }
    pixels.iter().map(|&p| f64::from(p)).sum::<f64>() / pixels.len() as f64
}

fn evenly_spaced(duration: f64, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 || duration <= 0.0 {
        return vec![0.0];
    }
    (0..n)
        .map(|i| duration * i as f64 / (n - 1) as f64)
        .collect()
}

fn dedup_sorted(timestamps: &mut Vec<f64>) {
    timestamps.sort_by(|a, b| a.partial_cmp(b).expect("timestamps are finite"));
    timestamps.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
}

/// Pick `n` timestamps evenly spaced through the sorted, deduplicated
/// input (spec.md §4.2: "subsample uniformly down to that count").
fn uniform_subsample(mut timestamps: Vec<f64>, n: usize) -> Vec<f64> {
    dedup_sorted(&mut timestamps);
    if n == 0 || timestamps.is_empty() {
        return Vec::new();
    }
    if timestamps.len() <= n {
        return timestamps;
    }
    if n == 1 {
        return vec![timestamps[0]];
    }
    (0..n)
        .map(|i| timestamps[i * (timestamps.len() - 1) / (n - 1)])
        .collect()
}
