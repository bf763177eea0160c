use std::path::{Path, PathBuf};

use dupe_media_cache::MediaCache;
use dupe_media_core::Config as CoreConfig;
use serde::Deserialize;

use crate::cli::{Cli, OutputFormat};
use crate::errors::{AppError, AppResult};

/// Mirrors every tunable in [`CoreConfig`] plus the app-only knobs,
/// all optional so an on-disk file only has to mention what it wants
/// to change (spec.md §6's configuration table, generalized to a
/// layered CLI > file > default precedence per the teacher's
/// `--args-file` convention).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct FileConfig {
    cache_dir: Option<PathBuf>,
    format: Option<OutputFormat>,
    transfer_dir: Option<PathBuf>,
    transfer_template: Option<String>,

    resolution: Option<u32>,
    hash_bits: Option<usize>,
    min_frames: Option<usize>,
    max_scene_frames: Option<usize>,
    target_fps: Option<f64>,
    scene_change_threshold: Option<f64>,
    short_video_threshold: Option<f64>,
    image_similarity_threshold: Option<f64>,
    image_video_similarity_threshold: Option<f64>,
    video_similarity_threshold: Option<f64>,
    window_size: Option<f64>,
    step_size: Option<f64>,
    max_chunk_size: Option<u64>,
    concurrency: Option<usize>,
}

impl FileConfig {
    fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::ConfigFileIo {
            path: path.to_path_buf(),
            src: e,
        })?;
        toml::from_str(&text).map_err(|e| AppError::ConfigFileParse {
            path: path.to_path_buf(),
            src: e,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TransferSettings {
    pub dir: PathBuf,
    pub template: String,
    pub copy: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub candidate_dirs: Vec<PathBuf>,
    pub reference_dirs: Vec<PathBuf>,
    pub cache_dir: PathBuf,
    pub use_cache: bool,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub transfer: Option<TransferSettings>,
    pub verbose: u8,
    pub core: CoreConfig,
}

/// CLI > file > `CoreConfig::default()`, the precedence the teacher's
/// `--args-file` mechanism applies implicitly (command-line flags are
/// parsed after the args-file is spliced in, so they win).
pub fn build(cli: Cli) -> AppResult<Settings> {
    if cli.candidate_dirs.is_empty() {
        return Err(AppError::NoCandidates);
    }
    for dir in cli.candidate_dirs.iter().chain(cli.reference_dirs.iter()) {
        if !dir.is_dir() {
            return Err(AppError::DirNotFound(dir.clone()));
        }
    }
    for cand in &cli.candidate_dirs {
        if cli.reference_dirs.contains(cand) {
            return Err(AppError::DirOverlap(cand.clone()));
        }
    }

    let file_cfg = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    macro_rules! pick {
        ($field:ident) => {
            cli.$field.or(file_cfg.$field)
        };
    }

    let default = CoreConfig::default();
    let core = CoreConfig {
        resolution: pick!(resolution).unwrap_or(default.resolution),
        hash_bits: pick!(hash_bits).unwrap_or(default.hash_bits),
        min_frames: pick!(min_frames).unwrap_or(default.min_frames),
        max_scene_frames: pick!(max_scene_frames).unwrap_or(default.max_scene_frames),
        target_fps: pick!(target_fps).unwrap_or(default.target_fps),
        scene_change_threshold: pick!(scene_change_threshold)
            .unwrap_or(default.scene_change_threshold),
        short_video_threshold_secs: pick!(short_video_threshold)
            .unwrap_or(default.short_video_threshold_secs),
        image_similarity_threshold: pick!(image_similarity_threshold)
            .unwrap_or(default.image_similarity_threshold),
        image_video_similarity_threshold: pick!(image_video_similarity_threshold)
            .unwrap_or(default.image_video_similarity_threshold),
        video_similarity_threshold: pick!(video_similarity_threshold)
            .unwrap_or(default.video_similarity_threshold),
        window_size_secs: pick!(window_size).unwrap_or(default.window_size_secs),
        step_size_secs: pick!(step_size).unwrap_or(default.step_size_secs),
        max_chunk_size_bytes: pick!(max_chunk_size).unwrap_or(default.max_chunk_size_bytes),
        concurrency: pick!(concurrency).unwrap_or(default.concurrency),
    };

    let cache_dir = cli
        .cache_dir
        .or(file_cfg.cache_dir)
        .unwrap_or_else(|| MediaCache::cache_dir_default(&cli.candidate_dirs[0]));

    let format = cli.format.or(file_cfg.format).unwrap_or(OutputFormat::Text);

    let transfer_dir = cli.transfer_dir.or(file_cfg.transfer_dir);
    let transfer_template = cli
        .transfer_template
        .or(file_cfg.transfer_template)
        .unwrap_or_else(|| "{year}/{month}/{filename}".to_string());
    let transfer = transfer_dir.map(|dir| TransferSettings {
        dir,
        template: transfer_template,
        copy: cli.copy,
        dry_run: cli.dry_run,
    });

    Ok(Settings {
        candidate_dirs: cli.candidate_dirs,
        reference_dirs: cli.reference_dirs,
        cache_dir,
        use_cache: !cli.no_cache,
        format,
        output: cli.output,
        transfer,
        verbose: cli.verbose,
        core,
    })
}
