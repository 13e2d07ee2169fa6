//! Aggregate Shannon entropy estimate.
//!
//! Models a vector by its overall bit balance `p = weight_fraction(v)` and
//! evaluates the binary entropy function at `p`:
//!
//! ```text
//! H(p) = -(p·log2 p + (1-p)·log2 (1-p))      0 < p < 1
//! H(p) = 0                                    otherwise
//! ```
//!
//! This is not the per-symbol entropy of the byte values: `0x0F` and `0x55`
//! both score 1.0.

use super::weight_fraction;
use crate::Result;

/// Entropy estimate of `v` in `[0, 1]`. Zero-length input is `EmptyVector`.
pub fn entropy(v: &[u8]) -> Result<f32> {
    let p = weight_fraction(v)?;
    Ok(binary_entropy(p as f64) as f32)
}

/// Binary entropy function. Returns 0.0 at and beyond both bounds.
#[inline]
pub fn binary_entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -(xlog2x(p) + xlog2x(1.0 - p))
}

#[inline(always)]
fn xlog2x(x: f64) -> f64 {
    x * x.log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn balanced_vector_has_unit_entropy() {
        assert_eq!(entropy(&[0x0F]).unwrap(), 1.0);
        assert_eq!(entropy(&[0x55, 0xAA]).unwrap(), 1.0);
    }

    #[test]
    fn uniform_vectors_have_zero_entropy() {
        assert_eq!(entropy(&[0x00; 16]).unwrap(), 0.0);
        assert_eq!(entropy(&[0xFF; 16]).unwrap(), 0.0);
    }

    #[test]
    fn quarter_weight() {
        // H(0.25) = 0.811278...
        let h = entropy(&[0x03]).unwrap();
        assert!((h - 0.811_278).abs() < 1e-5, "got {h}");
    }

    #[test]
    fn symmetric_around_half() {
        let low = entropy(&[0x01]).unwrap();
        let high = entropy(&[0xFE]).unwrap();
        assert!((low - high).abs() < 1e-6);
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(entropy(&[]), Err(Error::EmptyVector));
    }

    #[test]
    fn binary_entropy_bounds() {
        assert_eq!(binary_entropy(-0.1), 0.0);
        assert_eq!(binary_entropy(1.5), 0.0);
        assert_eq!(binary_entropy(0.5), 1.0);
    }
}
