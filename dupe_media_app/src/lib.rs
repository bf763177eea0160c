#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]

//! Library half of the `dupe-media` binary: split out from `main.rs` so
//! `dupe_media_app/tests/` can exercise discovery, the concrete
//! collaborators and the orchestration path directly, the way the
//! teacher's own crates expose a library surface behind a thin binary.

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod logging;
pub mod report;
pub mod run;
pub mod transfer;

pub use run::run_app;
