use serde::{Deserialize, Serialize};

/// Every option named in spec.md §6's configuration table. Defaults
/// match the values the spec names explicitly; generalized from the
/// teacher's compile-time `definitions.rs` constants into a runtime
/// struct since the spec makes all of these user-configurable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// R: side length of the square buffer fed to the perceptual hasher.
    pub resolution: u32,
    /// H: hash length in bits. Must be a perfect square (sub-block side
    /// = sqrt(hash_bits) must not exceed `resolution`).
    pub hash_bits: usize,

    pub min_frames: usize,
    pub max_scene_frames: usize,
    pub target_fps: f64,
    pub scene_change_threshold: f64,
    pub short_video_threshold_secs: f64,

    pub image_similarity_threshold: f64,
    pub image_video_similarity_threshold: f64,
    pub video_similarity_threshold: f64,

    pub window_size_secs: f64,
    pub step_size_secs: f64,

    pub max_chunk_size_bytes: u64,

    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution: 64,
            hash_bits: 64,
            min_frames: 5,
            max_scene_frames: 32,
            target_fps: 0.5,
            scene_change_threshold: 0.15,
            short_video_threshold_secs: 15.0,
            image_similarity_threshold: 0.98,
            image_video_similarity_threshold: 0.93,
            video_similarity_threshold: 0.93,
            window_size_secs: 5.0,
            step_size_secs: 1.0,
            max_chunk_size_bytes: 1024 * 1024,
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl Config {
    /// `minThreshold` from spec.md §4.4: governs the VP-tree range
    /// query radius (`ε = 1 - minThreshold`).
    #[must_use]
    pub fn min_similarity_threshold(&self) -> f64 {
        self.image_similarity_threshold
            .min(self.image_video_similarity_threshold)
            .min(self.video_similarity_threshold)
    }

    #[must_use]
    pub fn dbscan_epsilon(&self) -> f64 {
        1.0 - self.min_similarity_threshold()
    }

    /// Acceptance threshold for a specific pair-type, per spec.md §4.4/4.6.
    #[must_use]
    pub fn adaptive_threshold(&self, a_is_video: bool, b_is_video: bool) -> f64 {
        match (a_is_video, b_is_video) {
            (false, false) => self.image_similarity_threshold,
            (true, true) => self.video_similarity_threshold,
            _ => self.image_video_similarity_threshold,
        }
    }

    /// A hash of this config, used as the job-config key in the
    /// persistent cache (spec.md §4.3: "Image-only extractor config
    /// checks only `resolution` for equivalence (video config adds fps
    /// and frame-count bounds)").
    #[must_use]
    pub fn image_extractor_config_hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.resolution.hash(&mut hasher);
        self.hash_bits.hash(&mut hasher);
        hasher.finish()
    }

    #[must_use]
    pub fn video_extractor_config_hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.resolution.hash(&mut hasher);
        self.hash_bits.hash(&mut hasher);
        self.min_frames.hash(&mut hasher);
        self.max_scene_frames.hash(&mut hasher);
        self.target_fps.to_bits().hash(&mut hasher);
        self.scene_change_threshold.to_bits().hash(&mut hasher);
        self.short_video_threshold_secs.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}
