//! Concrete implementations of the `FrameProducer`, `MetadataProducer`
//! and `StatsProducer` collaborators spec.md §1/§6 declare out of
//! scope for the core crate.

pub mod frame_source;
pub mod metadata_source;
pub mod stats_source;
