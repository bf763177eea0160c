#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]

pub mod cancel;
pub mod config;
pub mod dbscan;
pub mod disjoint_set;
pub mod distance;
pub mod error;
pub mod extractor;
pub mod fileinfo;
pub mod fingerprint;
pub mod frame;
pub mod hasher;
pub mod metadata;
pub mod pipeline;
pub mod result;
pub mod scoring;
pub mod selector;
pub mod stats;
pub mod vptree;

pub use cancel::CancellationToken;
pub use config::Config;
pub use dbscan::cluster as dbscan_cluster;
pub use distance::distance;
pub use error::{CoreError, CoreResult};
pub use extractor::{FrameExtractor, MediaProbe, RawFrameSource};
pub use fileinfo::FileInfo;
pub use fingerprint::{FingerprintAssembler, JobStore, PathIndex};
pub use frame::{FrameInfo, MediaInfo};
pub use hasher::PerceptualHasher;
pub use metadata::{Metadata, MetadataSource};
pub use pipeline::run as run_pipeline;
pub use result::{DeduplicationResult, DuplicateSet};
pub use scoring::score;
pub use selector::{duplicates_of, select_representatives};
pub use stats::{FileStats, StatsSource};
pub use vptree::VpTree;
