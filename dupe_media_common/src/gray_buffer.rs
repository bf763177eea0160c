use std::num::NonZeroU32;

use image::{imageops::FilterType, GrayImage};

/// A square grayscale pixel buffer, the unit the perceptual hasher consumes.
///
/// Square-ness is enforced at construction so downstream code never has to
/// branch on width vs height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SquareGrayBuffer {
    side: u32,
    pixels: Vec<u8>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer length {actual} does not match side*side = {expected} for side {side}")]
    WrongLength {
        side: u32,
        expected: usize,
        actual: usize,
    },
}

impl SquareGrayBuffer {
    pub fn from_pixels(side: u32, pixels: Vec<u8>) -> Result<Self, BufferError> {
        let expected = (side as usize) * (side as usize);
        if pixels.len() != expected {
            return Err(BufferError::WrongLength {
                side,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { side, pixels })
    }

    #[must_use]
    pub fn side(&self) -> u32 {
        self.side
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.pixels[(y * self.side + x) as usize]
    }

    /// Resize an arbitrary-sized grayscale image down (or up) to `side x side`.
    ///
    /// Mirrors the teacher's `crop_resize_buf`/`resize_frame` pair, minus the
    /// crop-rectangle machinery this deduplicator has no use for.
    #[must_use]
    pub fn from_gray_image(image: &GrayImage, side: NonZeroU32) -> Self {
        let side = side.get();
        let resized = image::imageops::resize(image, side, side, FilterType::Triangle);
        Self {
            side,
            pixels: resized.into_raw(),
        }
    }
}
