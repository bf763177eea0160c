use std::path::PathBuf;

use clap::Parser;

/// Find and act on visually duplicate images and videos.
///
/// Grounded on the teacher's `arg_parse.rs`, rebuilt against `clap`'s
/// derive API (the teacher uses the builder API directly) since the
/// flag set here is a fixed, known shape rather than one assembled
/// dynamically.
#[derive(Parser, Debug)]
#[command(name = "dupe-media", version, about)]
pub struct Cli {
    /// Directory to search for duplicates. Repeat to scan several.
    #[arg(long = "dir", required = true)]
    pub candidate_dirs: Vec<PathBuf>,

    /// Directory of "known good" files: candidates matching something
    /// in here are reported against it, but files here are never
    /// themselves flagged as duplicates of one another.
    #[arg(long = "reference")]
    pub reference_dirs: Vec<PathBuf>,

    /// Optional TOML file of defaults, overridden by any flag given
    /// explicitly on the command line.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where the persistent cache lives. Defaults to
    /// `<first candidate dir>/.dupe_media_cache`.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Skip loading/saving the persistent cache entirely.
    #[arg(long)]
    pub no_cache: bool,

    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write the report here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Move duplicates (never representatives) into this directory,
    /// expanding the template tokens in `--transfer-template`.
    #[arg(long)]
    pub transfer_dir: Option<PathBuf>,

    /// Destination path template relative to `--transfer-dir`. Tokens:
    /// `{year}`, `{month}`, `{day}`, `{camera}`, `{filename}`. Defaults
    /// to `{year}/{month}/{filename}`.
    #[arg(long)]
    pub transfer_template: Option<String>,

    /// Copy instead of move.
    #[arg(long)]
    pub copy: bool,

    /// Report what the transfer stage would do without touching disk.
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub resolution: Option<u32>,
    #[arg(long)]
    pub hash_bits: Option<usize>,
    #[arg(long)]
    pub min_frames: Option<usize>,
    #[arg(long)]
    pub max_scene_frames: Option<usize>,
    #[arg(long)]
    pub target_fps: Option<f64>,
    #[arg(long)]
    pub scene_change_threshold: Option<f64>,
    #[arg(long)]
    pub short_video_threshold: Option<f64>,
    #[arg(long)]
    pub image_similarity_threshold: Option<f64>,
    #[arg(long)]
    pub image_video_similarity_threshold: Option<f64>,
    #[arg(long)]
    pub video_similarity_threshold: Option<f64>,
    #[arg(long)]
    pub window_size: Option<f64>,
    #[arg(long)]
    pub step_size: Option<f64>,
    #[arg(long)]
    pub max_chunk_size: Option<u64>,
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Repeat for more log output: `-v` = debug, `-vv` = trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}
