#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]

//! Shared primitives used by both `dupe_media_core` and `dupe_media_app`:
//! a square grayscale pixel buffer and a runtime-length bit-vector with
//! Hamming distance and hex (de)serialization.

mod bitset;
mod gray_buffer;

pub use bitset::{HashBits, HashBitsParseError};
pub use gray_buffer::{BufferError, SquareGrayBuffer};
