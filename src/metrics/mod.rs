//! # Bit-vector metrics
//!
//! Stateless scalar measurements over response vectors:
//!
//! | Function | Result | Meaning |
//! |----------|--------|---------|
//! | [`weight`] | `u64` | set bits |
//! | [`weight_fraction`] | `f32` | set bits / total bits |
//! | [`distance`] | `u64` | Hamming distance |
//! | [`distance_fraction`] | `f32` | Hamming distance / total bits |
//! | [`entropy`] | `f32` | binary entropy of the weight fraction |
//!
//! Everything here borrows its input read-only and may be called from any
//! number of threads.

pub mod entropy;

pub use entropy::{binary_entropy, entropy};

use crate::model::bit_width;
use crate::{Error, Result};

/// Population count. Empty input weighs 0.
#[inline]
pub fn weight(v: &[u8]) -> u64 {
    sum_counts(v.iter().map(|b| b.count_ones()))
}

/// `weight(v) / (8 * len(v))`. Zero-length input is `EmptyVector`.
pub fn weight_fraction(v: &[u8]) -> Result<f32> {
    if v.is_empty() {
        return Err(Error::EmptyVector);
    }
    Ok(weight(v) as f32 / bit_width(v.len()) as f32)
}

/// Hamming distance, byte-wise XOR popcount. Lengths must agree.
pub fn distance(a: &[u8], b: &[u8]) -> Result<u64> {
    check_lengths(a, b)?;
    Ok(sum_counts(a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones())))
}

/// `distance(a, b) / (8 * len(a))`.
pub fn distance_fraction(a: &[u8], b: &[u8]) -> Result<f32> {
    let dist = distance(a, b)?;
    if a.is_empty() {
        return Err(Error::EmptyVector);
    }
    Ok(dist as f32 / bit_width(a.len()) as f32)
}

/// Widen per-byte popcounts before summing; a `u32` total overflows at 2^29 full bytes.
#[inline]
fn sum_counts<I>(counts: I) -> u64
where
    I: IntoIterator<Item = u32>,
{
    counts.into_iter().map(u64::from).sum()
}

#[inline]
fn check_lengths(a: &[u8], b: &[u8]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::LengthMismatch { expected: a.len(), got: b.len() });
    }
    Ok(())
}
