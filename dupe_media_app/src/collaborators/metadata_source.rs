use std::path::Path;
use std::process::Command;

use dupe_media_core::{Metadata, MetadataSource};
use exif::{In, Tag, Value};
use thiserror::Error;

use crate::discovery::{classify, MediaKind};

/// The concrete `MetadataProducer` (spec.md §6): EXIF for images via
/// `kamadak-exif`, `ffprobe`'s stream/format tags for video. No example
/// repo in the retrieval pack does EXIF parsing, so this concern has no
/// pack grounding; `kamadak-exif` is the standard ecosystem crate for it.
#[derive(Debug, Default)]
pub struct FileMetadataSource;

#[derive(Debug, Error)]
pub enum MetadataSourceError {
    #[error("unrecognized media extension: {0}")]
    UnknownExtension(std::path::PathBuf),

    #[error("failed to open {path}: {src}")]
    Io {
        path: std::path::PathBuf,
        src: std::io::Error,
    },

    #[error("failed to run ffprobe: {0}")]
    FfprobeSpawn(std::io::Error),

    #[error("ffprobe produced unparsable JSON: {0}")]
    FfprobeJson(serde_json::Error),
}

impl MetadataSource for FileMetadataSource {
    type Error = MetadataSourceError;

    fn extract(&self, path: &Path) -> Result<Metadata, Self::Error> {
        match classify(path) {
            Some(MediaKind::Image) => extract_image_metadata(path),
            Some(MediaKind::Video) => extract_video_metadata(path),
            None => Err(MetadataSourceError::UnknownExtension(path.to_path_buf())),
        }
    }
}

fn extract_image_metadata(path: &Path) -> Result<Metadata, MetadataSourceError> {
    let file = std::fs::File::open(path).map_err(|src| MetadataSourceError::Io {
        path: path.to_path_buf(),
        src,
    })?;
    let mut reader = std::io::BufReader::new(&file);

    // Malformed/absent EXIF is common (screenshots, re-encoded images)
    // and is not an error for this collaborator: the caller just gets
    // a `Metadata` with fewer known fields.
    let exif = exif::Reader::new()
        .read_from_container(&mut reader)
        .ok();

    let (mut width, mut height) = (0, 0);
    if let Ok((w, h)) = image::image_dimensions(path) {
        width = w;
        height = h;
    }

    let mut metadata = Metadata {
        width,
        height,
        ..Metadata::default()
    };

    let Some(exif) = exif else {
        return Ok(metadata);
    };

    if let Some(field) = exif.get_field(Tag::PixelXDimension, In::PRIMARY) {
        if let Some(v) = field.value.get_uint(0) {
            metadata.width = v;
        }
    }
    if let Some(field) = exif.get_field(Tag::PixelYDimension, In::PRIMARY) {
        if let Some(v) = field.value.get_uint(0) {
            metadata.height = v;
        }
    }

    metadata.camera_model = exif
        .get_field(Tag::Model, In::PRIMARY)
        .map(|f| f.display_value().to_string());

    metadata.gps_latitude = gps_decimal_degrees(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, "S");
    metadata.gps_longitude =
        gps_decimal_degrees(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, "W");

    metadata.image_date = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Ascii(v) => v.first().map(|b| String::from_utf8_lossy(b).into_owned()),
            _ => None,
        })
        .and_then(|s| parse_exif_datetime(&s));

    Ok(metadata)
}

fn gps_decimal_degrees(
    exif: &exif::Exif,
    coord_tag: Tag,
    ref_tag: Tag,
    negative_ref: &str,
) -> Option<f64> {
    let field = exif.get_field(coord_tag, In::PRIMARY)?;
    let Value::Rational(rationals) = &field.value else {
        return None;
    };
    if rationals.len() != 3 {
        return None;
    }
    let degrees = rationals[0].to_f64() + rationals[1].to_f64() / 60.0 + rationals[2].to_f64() / 3600.0;

    let sign = exif
        .get_field(ref_tag, In::PRIMARY)
        .map(|f| f.display_value().to_string().trim() == negative_ref)
        .unwrap_or(false);

    Some(if sign { -degrees } else { degrees })
}

fn parse_exif_datetime(s: &str) -> Option<i64> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

fn extract_video_metadata(path: &Path) -> Result<Metadata, MetadataSourceError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height:format_tags=creation_time",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(MetadataSourceError::FfprobeSpawn)?;

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).map_err(MetadataSourceError::FfprobeJson)?;

    let width = parsed["streams"][0]["width"].as_u64().unwrap_or(0) as u32;
    let height = parsed["streams"][0]["height"].as_u64().unwrap_or(0) as u32;
    let image_date = parsed["format"]["tags"]["creation_time"]
        .as_str()
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp());

    Ok(Metadata {
        width,
        height,
        image_date,
        ..Metadata::default()
    })
}
