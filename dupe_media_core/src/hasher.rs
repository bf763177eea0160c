use dupe_media_common::{HashBits, SquareGrayBuffer};
use ndarray::{s, Array2};
use rustdct::DctPlanner;

use crate::error::CoreError;

/// Perceptual Hasher (spec.md §4.1): a 2-D Type-II DCT over an R×R
/// grayscale buffer, keeping the top-left `sub_block x sub_block`
/// low-frequency coefficients and thresholding each against the median
/// of the AC coefficients.
///
/// Grounded on the teacher's `raw_dct_ops::dct_2d` (separable row/column
/// DCT via `rustdct`, with an explicit transpose between passes because
/// `rustdct` requires row-major contiguous data), generalized from a
/// fixed compile-time size to the runtime `hash_bits` the config
/// specifies.
#[derive(Debug, Clone, Copy)]
pub struct PerceptualHasher {
    hash_bits: usize,
    sub_block: usize,
}

impl PerceptualHasher {
    pub fn new(hash_bits: usize) -> Result<Self, CoreError> {
        let sub_block = (hash_bits as f64).sqrt().round() as usize;
        if sub_block * sub_block != hash_bits {
            return Err(CoreError::InvalidConfig(format!(
                "hash_bits must be a perfect square, got {hash_bits}"
            )));
        }
        Ok(Self {
            hash_bits,
            sub_block,
        })
    }

    #[must_use]
    pub fn hash_bits(&self) -> usize {
        self.hash_bits
    }

    pub fn hash(&self, buffer: &SquareGrayBuffer) -> Result<HashBits, CoreError> {
        let side = buffer.side() as usize;
        if self.sub_block > side {
            return Err(CoreError::InvalidConfig(format!(
                "hash sub-block {} exceeds buffer side {side}",
                self.sub_block
            )));
        }

        let mut matrix = Array2::<f64>::zeros((side, side));
        for y in 0..side as u32 {
            for x in 0..side as u32 {
                let centered = f64::from(buffer.get(x, y)) - 128.0;
                matrix[[y as usize, x as usize]] = centered;
            }
        }

        let dct = dct_2d_orthonormal(&matrix);

        let block = dct.slice(s![..self.sub_block, ..self.sub_block]);
        let mut ac_abs: Vec<f64> = block.iter().skip(1).map(|v| v.abs()).collect();
        let median = median_of(&mut ac_abs);

        let bits = block.iter().map(|v| *v > median);
        Ok(HashBits::from_bits(bits))
    }
}

/// Separable 2-D DCT-II with the standard orthonormal scaling
/// (`sqrt(2/N)`, DC term scaled by an additional `1/sqrt(2)`), applied
/// independently along rows and columns since the transform is
/// separable.
fn dct_2d_orthonormal(matrix: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = matrix.dim();
    assert_eq!(rows, cols, "perceptual hasher operates on square buffers");
    let n = rows;

    let mut planner = DctPlanner::new();
    let dct = planner.plan_dct2(n);

    let mut m = matrix.clone();

    // Round 1: DCT along rows.
    m.rows_mut().into_iter().for_each(|mut row| {
        dct.process_dct2(row.as_slice_mut().expect("row is contiguous"));
    });

    m = transpose(&m);

    // Round 2: DCT along the other axis.
    m.rows_mut().into_iter().for_each(|mut row| {
        dct.process_dct2(row.as_slice_mut().expect("row is contiguous"));
    });

    m = transpose(&m);

    // rustdct's DCT-II is unnormalized; apply the orthonormal scale
    // factors along each axis since the transform is separable.
    let scale = |i: usize| -> f64 {
        if i == 0 {
            (1.0 / n as f64).sqrt()
        } else {
            (2.0 / n as f64).sqrt()
        }
    };

    for ((i, j), v) in m.indexed_iter_mut() {
        *v *= scale(i) * scale(j);
    }

    m
}

fn transpose(matrix: &Array2<f64>) -> Array2<f64> {
    ndarray::Array::from_shape_vec(
        matrix.raw_dim(),
        matrix.t().iter().copied().collect::<Vec<_>>(),
    )
    .expect("transpose preserves element count")
}

fn median_of(values: &mut [f64]) -> f64 {
    assert!(!values.is_empty(), "AC coefficient list must be non-empty");
    values.sort_by(|a, b| a.partial_cmp(b).expect("no NaNs in DCT output"));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn flat_buffer(side: u32, value: u8) -> SquareGrayBuffer {
        SquareGrayBuffer::from_pixels(side, vec![value; (side * side) as usize]).unwrap()
    }

    #[test]
    fn rejects_non_square_hash_bits() {
        assert!(PerceptualHasher::new(50).is_err());
        assert!(PerceptualHasher::new(64).is_ok());
    }

    #[test]
    fn rejects_sub_block_larger_than_buffer() {
        let hasher = PerceptualHasher::new(64).unwrap(); // sub_block = 8
        let tiny = flat_buffer(4, 10);
        assert!(hasher.hash(&tiny).is_err());
    }

    #[test]
    fn identical_buffers_hash_identically() {
        let hasher = PerceptualHasher::new(64).unwrap();
        let a = flat_buffer(64, 120);
        let b = flat_buffer(64, 120);
        assert_eq!(hasher.hash(&a).unwrap(), hasher.hash(&b).unwrap());
    }

    #[test]
    fn uniform_buffer_has_zero_ac_energy() {
        // A perfectly flat image has zero AC energy, so every AC
        // coefficient sits exactly at the median (0.0) and is not `>` it:
        // only the DC bit (index 0, driven by the average pixel value)
        // can be set.
        let hasher = PerceptualHasher::new(64).unwrap();
        let flat = flat_buffer(64, 200);
        let hash = hasher.hash(&flat).unwrap();
        for i in 1..64 {
            assert!(!hash.get(i), "AC bit {i} should be unset for a flat image");
        }
    }

    #[test]
    fn distinguishes_different_patterns() {
        let hasher = PerceptualHasher::new(64).unwrap();
        let mut checker = vec![0u8; 64 * 64];
        for y in 0..64usize {
            for x in 0..64usize {
                checker[y * 64 + x] = if (x / 8 + y / 8) % 2 == 0 { 255 } else { 0 };
            }
        }
        let checker_buf = SquareGrayBuffer::from_pixels(64, checker).unwrap();
        let flat_buf = flat_buffer(64, 128);
        let h1 = hasher.hash(&checker_buf).unwrap();
        let h2 = hasher.hash(&flat_buf).unwrap();
        assert!(h1.hamming_distance(&h2) > 0);
    }
}
