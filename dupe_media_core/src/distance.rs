use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::frame::{FrameInfo, MediaInfo};

/// spec.md §4.4: `d(a, b) = 1 - sim(a, b)`, dispatched over the three
/// regimes by tagging on `MediaInfo::is_video()` — a single branch
/// point rather than a class hierarchy (spec.md §9's polymorphism
/// note).
pub fn distance(a: &MediaInfo, b: &MediaInfo, cfg: &Config) -> CoreResult<f64> {
    if a.frames().is_empty() || b.frames().is_empty() {
        return Err(CoreError::DistancePrecondition(
            "MediaInfo with an empty frame list".to_string(),
        ));
    }

    let sim = match (a.is_video(), b.is_video()) {
        (false, false) => image_image_similarity(&a.frames()[0], &b.frames()[0]),
        (false, true) => image_video_similarity(&a.frames()[0], b, cfg.image_video_similarity_threshold),
        (true, false) => image_video_similarity(&b.frames()[0], a, cfg.image_video_similarity_threshold),
        (true, true) => video_video_similarity(a, b, cfg),
    };

    Ok(1.0 - sim)
}

fn image_image_similarity(a: &FrameInfo, b: &FrameInfo) -> f64 {
    let bits = a.hash.len().max(1) as f64;
    1.0 - f64::from(a.hash.hamming_distance(&b.hash)) / bits
}

/// Sliding single-frame match (spec.md §4.4): best similarity between
/// the image and any single frame of the video, short-circuiting once
/// the acceptance threshold is reached.
fn image_video_similarity(image: &FrameInfo, video: &MediaInfo, threshold: f64) -> f64 {
    let mut best = 0.0f64;
    for frame in video.frames() {
        let sim = image_image_similarity(image, frame);
        if sim > best {
            best = sim;
        }
        if best >= threshold {
            break;
        }
    }
    best
}

/// Video/video similarity: slide a window the length of the shorter
/// video's duration across the longer video, scoring each window with
/// DTW-based sequence similarity and keeping the best (spec.md §4.4).
fn video_video_similarity(a: &MediaInfo, b: &MediaInfo, cfg: &Config) -> f64 {
    let (shorter, longer) = if a.duration() <= b.duration() {
        (a, b)
    } else {
        (b, a)
    };

    // spec.md §6: `windowSize` bounds how much of the shorter video a
    // single DTW window covers; `shorter.duration()` is only a ceiling
    // on that (a window can never need to be longer than the shorter
    // video itself).
    let window_len = shorter.duration().min(cfg.window_size_secs);
    let span = (longer.duration() - window_len).max(0.0);
    let threshold = cfg.video_similarity_threshold;

    let mut best = 0.0f64;
    let mut window_start = 0.0f64;
    loop {
        let window_end = window_start + window_len;
        let windowed_frames: Vec<&FrameInfo> = longer
            .frames()
            .iter()
            .filter(|f| f.timestamp >= window_start && f.timestamp <= window_end)
            .collect();

        if !windowed_frames.is_empty() {
            let sim = sequence_similarity(shorter.frames(), &windowed_frames);
            if sim > best {
                best = sim;
            }
            if best >= threshold {
                break;
            }
        }

        if window_start >= span {
            break;
        }
        window_start = (window_start + cfg.step_size_secs).min(span);
    }

    best
}

/// DTW-based sequence similarity: `1 - DTW(m, n) / max(m, n)`, using a
/// rolling row of length `n + 1` (spec.md §4.4, §9 perf note).
fn sequence_similarity(a: &[FrameInfo], b: &[&FrameInfo]) -> f64 {
    let m = a.len();
    let n = b.len();
    if m == 0 || n == 0 {
        return 0.0;
    }

    let cost = |i: usize, j: usize| -> f64 { 1.0 - image_image_similarity(&a[i], b[j]) };

    let mut prev_row = vec![0.0f64; n];
    prev_row[0] = cost(0, 0);
    for j in 1..n {
        prev_row[j] = prev_row[j - 1] + cost(0, j);
    }

    let mut cur_row = vec![0.0f64; n];
    for i in 1..m {
        cur_row[0] = prev_row[0] + cost(i, 0);
        for j in 1..n {
            let predecessor = prev_row[j].min(cur_row[j - 1]).min(prev_row[j - 1]);
            cur_row[j] = cost(i, j) + predecessor;
        }
        std::mem::swap(&mut prev_row, &mut cur_row);
    }

    let dtw = prev_row[n - 1];
    1.0 - dtw / (m.max(n) as f64)
}

#[cfg(test)]
mod test {
    use super::*;
    use dupe_media_common::HashBits;

    fn image(bits: &[bool]) -> MediaInfo {
        MediaInfo::new(vec![FrameInfo::new(HashBits::from_bits(bits.to_vec()), 0.0)], 0.0).unwrap()
    }

    fn video(frames: &[(&[bool], f64)], duration: f64) -> MediaInfo {
        MediaInfo::new(
            frames
                .iter()
                .map(|(bits, t)| FrameInfo::new(HashBits::from_bits(bits.to_vec()), *t))
                .collect(),
            duration,
        )
        .unwrap()
    }

    const ALL_ONES: [bool; 8] = [true; 8];
    const ALL_ZEROS: [bool; 8] = [false; 8];

    #[test]
    fn identity_distance_is_zero() {
        let cfg = Config::default();
        let img = image(&ALL_ONES);
        assert_eq!(distance(&img, &img, &cfg).unwrap(), 0.0);
    }

    #[test]
    fn image_image_distance_is_symmetric() {
        let cfg = Config::default();
        let a = image(&ALL_ONES);
        let b = image(&ALL_ZEROS);
        assert_eq!(distance(&a, &b, &cfg).unwrap(), distance(&b, &a, &cfg).unwrap());
    }

    #[test]
    fn empty_frames_is_a_precondition_error() {
        // MediaInfo::new rejects empty frames, but a deserialized value
        // bypasses the constructor, so the distance function must guard
        // against it too (spec.md §7: distance-precondition).
        let cfg = Config::default();
        let malformed: MediaInfo = serde_json::from_value(serde_json::json!({
            "frames": [],
            "duration": 0.0
        }))
        .unwrap();
        let img = image(&ALL_ONES);
        assert!(matches!(
            distance(&malformed, &img, &cfg),
            Err(CoreError::DistancePrecondition(_))
        ));
    }

    #[test]
    fn image_matches_frame_within_video() {
        let cfg = Config::default();
        let img = image(&ALL_ONES);
        let vid = video(
            &[(&ALL_ZEROS, 0.0), (&ALL_ONES, 1.0), (&ALL_ZEROS, 2.0)],
            5.0,
        );
        let dist = distance(&img, &vid, &cfg).unwrap();
        assert_eq!(dist, 0.0);
    }

    #[test]
    fn video_video_identical_sequences_have_zero_distance() {
        let cfg = Config::default();
        let frames: Vec<(&[bool], f64)> = vec![
            (&ALL_ONES, 0.0),
            (&ALL_ZEROS, 1.0),
            (&ALL_ONES, 2.0),
        ];
        let v1 = video(&frames, 3.0);
        let v2 = video(&frames, 3.0);
        assert_eq!(distance(&v1, &v2, &cfg).unwrap(), 0.0);
    }

    #[test]
    fn video_video_distance_is_symmetric() {
        let cfg = Config::default();
        let v1 = video(&[(&ALL_ONES, 0.0), (&ALL_ZEROS, 1.0)], 2.0);
        let v2 = video(
            &[(&ALL_ZEROS, 0.0), (&ALL_ONES, 1.0), (&ALL_ZEROS, 2.0)],
            3.0,
        );
        let d1 = distance(&v1, &v2, &cfg).unwrap();
        let d2 = distance(&v2, &v1, &cfg).unwrap();
        assert!((d1 - d2).abs() < 1e-9);
    }
}
