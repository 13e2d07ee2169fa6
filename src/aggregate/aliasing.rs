//! Bit-aliasing: per-position "on" probability across a sequence of vectors.
//!
//! An ideal PUF bit is unbiased across devices, so every position of the
//! summary should sit near 0.5. Values near 0 or 1 flag positions that
//! alias to a fixed value.

use crate::config::EngineConfig;
use crate::model::{SummaryVector, Value};
use crate::Result;

use super::{summary_to_value, vector_arg, Aggregate, SessionCore, SessionStatus};

/// Registered name of the aliasing aggregate.
pub const NAME: &str = "bitaliasing";

/// In-progress aliasing aggregation.
pub struct AliasingSession {
    core: SessionCore,
}

impl AliasingSession {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self { core: SessionCore::new(NAME, config) }
    }

    /// Fold one vector. `None` is skipped. The first vector fixes the width;
    /// a later vector of a different width fails the session and the error is
    /// returned from this call. On a failed session this is a no-op.
    pub fn accept(&mut self, vector: Option<&[u8]>) -> Result<()> {
        if self.core.is_failed() {
            return Ok(());
        }
        let Some(vector) = vector else {
            tracing::trace!(session = NAME, "skipped missing vector");
            return Ok(());
        };

        self.core.ensure_sized(vector.len())?;
        self.core.check_width(vector.len())?;
        if let Some(counts) = self.core.counts_mut() {
            counts.record(vector.iter().copied());
        }
        Ok(())
    }

    /// Per-position mean of the accepted vectors, `None` if nothing was accepted.
    pub fn finalize(self) -> Result<Option<SummaryVector>> {
        self.core.finalize()
    }

    /// Discard the session without producing a result.
    pub fn abandon(self) {
        self.core.abandon();
    }

    /// Width in bits, once fixed.
    pub fn bit_width(&self) -> Option<usize> {
        self.core.bit_width()
    }

    pub fn sample_count(&self) -> u64 {
        self.core.sample_count()
    }

    pub fn status(&self) -> SessionStatus {
        self.core.status()
    }
}

impl Default for AliasingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregate for AliasingSession {
    fn name(&self) -> &'static str {
        NAME
    }

    fn step(&mut self, args: &[Value]) -> Result<()> {
        if self.core.is_failed() {
            return Ok(());
        }
        let vector = vector_arg(args, 0).map_err(|e| self.core.fail(e))?;
        self.accept(vector)
    }

    fn finish(self: Box<Self>) -> Result<Value> {
        self.finalize().map(summary_to_value)
    }
}
