use serde::{Deserialize, Serialize};

/// spec.md §3: EXIF-like metadata. Missing optional fields mean
/// "unknown," never zero — callers must not coerce `None` to `0.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Metadata {
    pub width: u32,
    pub height: u32,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub camera_model: Option<String>,
    /// Seconds since the Unix epoch; `None` means no capture date is known.
    pub image_date: Option<i64>,
}

impl Metadata {
    #[must_use]
    pub fn has_gps(&self) -> bool {
        self.gps_latitude.is_some() && self.gps_longitude.is_some()
    }

    #[must_use]
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// The external `MetadataProducer` collaborator (spec.md §6): EXIF-like
/// extraction is explicitly out of scope for the core; this trait is
/// the boundary a real implementation (in the app crate) must satisfy.
pub trait MetadataSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn extract(&self, path: &std::path::Path) -> Result<Metadata, Self::Error>;
}
