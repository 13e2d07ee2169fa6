//! Per-bit summary produced by an aggregation session.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Bytes per encoded position in the host blob format.
pub const BLOB_STRIDE: usize = std::mem::size_of::<f64>();

/// Per-bit-position probabilities in `[0, 1]`, index-aligned with flat bit
/// positions. Owned by the caller once a session finalizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryVector {
    values: Vec<f64>,
}

impl SummaryVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Number of bit positions.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<f64> {
        self.values.get(pos).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Average over all positions. For aliasing this is the overall
    /// uniformity, for reliability the average reliability.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Host blob encoding: one little-endian f64 per position, flat bit order.
    pub fn to_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(self.values.len() * BLOB_STRIDE);
        for v in &self.values {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        blob
    }

    /// Decode a blob produced by [`SummaryVector::to_blob`].
    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        if blob.len() % BLOB_STRIDE != 0 {
            return Err(Error::TypeError {
                expected: format!("blob of {BLOB_STRIDE}-byte doubles"),
                got: format!("{} bytes", blob.len()),
            });
        }
        let values = blob
            .chunks_exact(BLOB_STRIDE)
            .map(|chunk| {
                let mut raw = [0u8; BLOB_STRIDE];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect();
        Ok(Self { values })
    }
}

impl From<SummaryVector> for Vec<f64> {
    fn from(s: SummaryVector) -> Self {
        s.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_layout_is_little_endian_doubles() {
        let s = SummaryVector::new(vec![0.5, 1.0]);
        let blob = s.to_blob();
        assert_eq!(blob.len(), 16);
        assert_eq!(&blob[..8], &0.5f64.to_le_bytes());
        assert_eq!(&blob[8..], &1.0f64.to_le_bytes());
        assert_eq!(SummaryVector::from_blob(&blob).unwrap(), s);
    }

    #[test]
    fn ragged_blob_is_rejected() {
        let err = SummaryVector::from_blob(&[0u8; 12]).unwrap_err();
        assert!(matches!(err, Error::TypeError { .. }));
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(SummaryVector::default().mean(), None);
        assert_eq!(SummaryVector::new(vec![0.25, 0.75]).mean(), Some(0.5));
    }
}
