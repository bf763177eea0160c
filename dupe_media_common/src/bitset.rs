use bitvec::prelude::*;
use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

/// A fixed-length bit-vector used for perceptual hashes.
///
/// The teacher packs a compile-time-sized hash into `[usize; HASH_WORDS]`;
/// here the hash length is a runtime config value (spec.md §6's
/// `resolution` option governs it indirectly), so storage is a `BitVec`
/// instead of a const-generic array.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct HashBits(BitVec<u64, Lsb0>);

impl HashBits {
    #[must_use]
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        Self(bits.into_iter().collect())
    }

    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self(BitVec::repeat(false, len))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> bool {
        self.0[idx]
    }

    /// Hamming distance: popcount of the XOR, a single word-wise operation
    /// per the teacher's `hamming_distance` helper (per-word XOR + count_ones).
    #[must_use]
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        debug_assert_eq!(self.len(), other.len());
        self.0
            .as_raw_slice()
            .iter()
            .zip(other.0.as_raw_slice().iter())
            .fold(0u32, |acc, (a, b)| acc + (a ^ b).count_ones())
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.0.len().div_ceil(4));
        for nibble in self.0.chunks(4) {
            let mut val: u8 = 0;
            for (i, bit) in nibble.iter().enumerate() {
                if *bit {
                    val |= 1 << i;
                }
            }
            out.push(std::char::from_digit(u32::from(val), 16).expect("nibble fits in one digit"));
        }
        out
    }

    pub fn from_hex(s: &str, len: usize) -> Result<Self, HashBitsParseError> {
        let mut bits = BitVec::<u64, Lsb0>::with_capacity(len);
        for c in s.chars() {
            let val = c
                .to_digit(16)
                .ok_or(HashBitsParseError::InvalidHexDigit(c))?;
            for i in 0..4 {
                bits.push(val & (1 << i) != 0);
            }
        }
        bits.truncate(len);
        if bits.len() != len {
            return Err(HashBitsParseError::WrongLength {
                expected: len,
                actual: bits.len(),
            });
        }
        Ok(Self(bits))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HashBitsParseError {
    #[error("invalid hex digit: {0}")]
    InvalidHexDigit(char),
    #[error("hex string decodes to {actual} bits, expected {expected}")]
    WrongLength { expected: usize, actual: usize },
}

// Serialize as hex per spec.md §6: "bit-vectors serialize as hex."
impl Serialize for HashBits {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (self.0.len(), self.to_hex()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HashBits {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (len, hex): (usize, String) = Deserialize::deserialize(deserializer)?;
        Self::from_hex(&hex, len).map_err(DeError::custom)
    }
}
