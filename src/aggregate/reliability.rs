//! Reliability: per-position match rate between samples and their references.
//!
//! Each item is a `(reference, sample)` pair, typically a golden response and
//! a re-measurement of the same device. A position's counter increments when
//! both bits are equal, so an ideal PUF scores 1.0 everywhere.
//!
//! Width rules:
//! - the first pair's *reference* fixes the session width
//! - every pair must satisfy `len(reference) == len(sample)`
//! - under [`LengthCheck::Strict`] the reference must also match the session
//!   width; under [`LengthCheck::PairOnly`] it need not, and positions outside
//!   the session width are dropped

use crate::config::{EngineConfig, LengthCheck};
use crate::model::{SummaryVector, Value};
use crate::{Error, Result};

use super::{summary_to_value, vector_arg, Aggregate, SessionCore, SessionStatus};

/// Registered name of the reliability aggregate.
pub const NAME: &str = "reliability";

/// In-progress reliability aggregation.
pub struct ReliabilitySession {
    core: SessionCore,
    length_check: LengthCheck,
}

impl ReliabilitySession {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            core: SessionCore::new(NAME, config),
            length_check: config.length_check,
        }
    }

    /// Fold one pair. If either side is `None` the pair is skipped.
    pub fn accept(&mut self, reference: Option<&[u8]>, sample: Option<&[u8]>) -> Result<()> {
        if self.core.is_failed() {
            return Ok(());
        }
        let (Some(reference), Some(sample)) = (reference, sample) else {
            tracing::trace!(session = NAME, "skipped pair with missing operand");
            return Ok(());
        };

        self.core.ensure_sized(reference.len())?;
        if reference.len() != sample.len() {
            return Err(self.core.fail(Error::LengthMismatch {
                expected: reference.len(),
                got: sample.len(),
            }));
        }
        if self.length_check == LengthCheck::Strict {
            self.core.check_width(reference.len())?;
        }

        if let Some(counts) = self.core.counts_mut() {
            counts.record(reference.iter().zip(sample).map(|(r, s)| !(r ^ s)));
        }
        Ok(())
    }

    /// Per-position match rate over accepted pairs, `None` if nothing was accepted.
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

    pub fn length_check(&self) -> LengthCheck {
        self.length_check
    }
}

impl Default for ReliabilitySession {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregate for ReliabilitySession {
    fn name(&self) -> &'static str {
        NAME
    }

    fn step(&mut self, args: &[Value]) -> Result<()> {
        if self.core.is_failed() {
            return Ok(());
        }
        let reference = vector_arg(args, 0).map_err(|e| self.core.fail(e))?;
        let sample = vector_arg(args, 1).map_err(|e| self.core.fail(e))?;
        self.accept(reference, sample)
    }

    fn finish(self: Box<Self>) -> Result<Value> {
        self.finalize().map(summary_to_value)
    }
}
