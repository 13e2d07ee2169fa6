//! # Streaming aggregation sessions
//!
//! A session folds an unbounded sequence of equal-width bit vectors into one
//! per-bit probability vector.
//!
//! ```text
//!            first vector              compatible vector
//!   Empty ─────────────────▶ Accumulating ◀──────────┐
//!     │                           │  └───────────────┘
//!     │ alloc fails / empty       │ width mismatch / bad operand
//!     └──────────────┬────────────┘
//!                    ▼
//!                 Failed  (accept = no-op, finalize re-surfaces the error)
//! ```
//!
//! | Session | Item | Counter increments when |
//! |---------|------|-------------------------|
//! | [`AliasingSession`] | vector | bit is set |
//! | [`ReliabilitySession`] | (reference, sample) | bits are equal |
//!
//! Sessions are single consumers: `accept` takes `&mut self`, `finalize`
//! takes `self`. Independent sessions can live on independent threads.

pub mod aliasing;
pub mod reliability;

pub use aliasing::AliasingSession;
pub use reliability::ReliabilitySession;

use crate::config::EngineConfig;
use crate::model::{bit_width, SummaryVector, Value};
use crate::{Error, Result};

// ============================================================================
// Host-facing trait
// ============================================================================

/// A session driven with host values, one row at a time.
///
/// `finish` consumes the session: it yields `Value::Blob` (little-endian f64
/// per bit position) or `Value::Null` when no row was accepted.
pub trait Aggregate: Send {
    /// Registered function name.
    fn name(&self) -> &'static str;

    /// Fold one row. `Null` operands skip the row. Any error fails the
    /// session: later rows are ignored and `finish` returns that error.
    fn step(&mut self, args: &[Value]) -> Result<()>;

    /// Finalize and hand the summary to the host.
    fn finish(self: Box<Self>) -> Result<Value>;
}

/// Observable lifecycle position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Empty,
    Accumulating,
    Failed,
}

/// Extract an optional bit-vector operand: `Null` is absent, numbers are a type error.
pub(crate) fn vector_arg<'a>(args: &'a [Value], idx: usize) -> Result<Option<&'a [u8]>> {
    match args.get(idx) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_bytes().map(Some).ok_or_else(|| Error::TypeError {
            expected: "BLOB".into(),
            got: v.type_name().into(),
        }),
    }
}

pub(crate) fn summary_to_value(summary: Option<SummaryVector>) -> Value {
    match summary {
        Some(s) => Value::Blob(s.to_blob()),
        None => Value::Null,
    }
}

// ============================================================================
// Counters
// ============================================================================

/// Per-bit counters plus the number of items folded in.
#[derive(Debug)]
pub(crate) struct BitCounts {
    counts: Vec<u64>,
    samples: u64,
}

impl BitCounts {
    /// Allocate `bits` zeroed counters, reporting failure instead of aborting.
    fn allocate(bits: usize, limit: Option<usize>) -> Result<Self> {
        if limit.is_some_and(|max| bits > max) {
            return Err(Error::OutOfMemory { bits });
        }
        let mut counts = Vec::new();
        counts
            .try_reserve_exact(bits)
            .map_err(|_| Error::OutOfMemory { bits })?;
        counts.resize(bits, 0);
        Ok(Self { counts, samples: 0 })
    }

    pub(crate) fn width(&self) -> usize {
        self.counts.len()
    }

    pub(crate) fn samples(&self) -> u64 {
        self.samples
    }

    /// Add one item: every set bit of `mask` bumps its flat position.
    /// Bytes beyond the counter width are ignored.
    pub(crate) fn record<I>(&mut self, mask: I)
    where
        I: IntoIterator<Item = u8>,
    {
        for (slots, byte) in self.counts.chunks_exact_mut(8).zip(mask) {
            for bit in crate::model::set_bits(byte) {
                slots[bit as usize] += 1;
            }
        }
        self.samples += 1;
    }

    /// `counts[j] / samples` for every position.
    fn into_summary(self) -> Result<SummaryVector> {
        let mut values = Vec::new();
        values
            .try_reserve_exact(self.counts.len())
            .map_err(|_| Error::OutOfMemory { bits: self.counts.len() })?;
        let n = self.samples as f64;
        values.extend(self.counts.iter().map(|&c| c as f64 / n));
        Ok(SummaryVector::new(values))
    }
}

// ============================================================================
// Shared session core
// ============================================================================

enum SessionState {
    Empty,
    Accumulating(BitCounts),
    Failed {
        error: Error,
        /// Counters held only until the session is finalized or dropped.
        retained: Option<BitCounts>,
    },
}

/// State machine shared by both session kinds.
pub(crate) struct SessionCore {
    kind: &'static str,
    state: SessionState,
    max_bit_width: Option<usize>,
}

impl SessionCore {
    pub(crate) fn new(kind: &'static str, config: &EngineConfig) -> Self {
        Self { kind, state: SessionState::Empty, max_bit_width: config.max_bit_width }
    }

    pub(crate) fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Empty => SessionStatus::Empty,
            SessionState::Accumulating(_) => SessionStatus::Accumulating,
            SessionState::Failed { .. } => SessionStatus::Failed,
        }
    }

    pub(crate) fn is_failed(&self) -> bool {
        matches!(self.state, SessionState::Failed { .. })
    }

    pub(crate) fn bit_width(&self) -> Option<usize> {
        match &self.state {
            SessionState::Accumulating(c) => Some(c.width()),
            SessionState::Failed { retained: Some(c), .. } => Some(c.width()),
            _ => None,
        }
    }

    pub(crate) fn sample_count(&self) -> u64 {
        match &self.state {
            SessionState::Accumulating(c) => c.samples(),
            SessionState::Failed { retained: Some(c), .. } => c.samples(),
            _ => 0,
        }
    }

    /// Size the accumulator from the first observed vector. No-op once sized.
    /// An empty vector or a failed allocation fails the session.
    pub(crate) fn ensure_sized(&mut self, byte_len: usize) -> Result<()> {
        if !matches!(self.state, SessionState::Empty) {
            return Ok(());
        }
        if byte_len == 0 {
            return Err(self.fail(Error::EmptyVector));
        }
        match BitCounts::allocate(bit_width(byte_len), self.max_bit_width) {
            Ok(counts) => {
                tracing::debug!(
                    session = self.kind,
                    bit_width = counts.width(),
                    "session sized from first vector"
                );
                self.state = SessionState::Accumulating(counts);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Require `byte_len` to match the fixed width, failing the session otherwise.
    pub(crate) fn check_width(&mut self, byte_len: usize) -> Result<()> {
        match self.bit_width() {
            Some(width) if width != bit_width(byte_len) => {
                Err(self.fail(Error::LengthMismatch { expected: width / 8, got: byte_len }))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn counts_mut(&mut self) -> Option<&mut BitCounts> {
        match &mut self.state {
            SessionState::Accumulating(c) => Some(c),
            _ => None,
        }
    }

    /// Transition to `Failed`, keeping the counters until disposal.
    /// Returns the error for the failing call to report.
    pub(crate) fn fail(&mut self, error: Error) -> Error {
        tracing::warn!(session = self.kind, %error, "aggregation session failed");
        let retained = match std::mem::replace(&mut self.state, SessionState::Empty) {
            SessionState::Accumulating(c) => Some(c),
            SessionState::Failed { retained, .. } => retained,
            SessionState::Empty => None,
        };
        self.state = SessionState::Failed { error: error.clone(), retained };
        error
    }

    /// `Ok(None)` when nothing was accepted; the stored error when failed.
    pub(crate) fn finalize(self) -> Result<Option<SummaryVector>> {
        match self.state {
            SessionState::Empty => {
                tracing::debug!(session = self.kind, "finalized without data");
                Ok(None)
            }
            SessionState::Failed { error, .. } => Err(error),
            SessionState::Accumulating(counts) => {
                tracing::debug!(
                    session = self.kind,
                    bit_width = counts.width(),
                    samples = counts.samples(),
                    "session finalized"
                );
                counts.into_summary().map(Some)
            }
        }
    }

    pub(crate) fn abandon(self) {
        tracing::trace!(session = self.kind, status = ?self.status(), "session abandoned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> SessionCore {
        SessionCore::new("test", &EngineConfig::default())
    }

    #[test]
    fn record_counts_set_bits_per_position() {
        let mut counts = BitCounts::allocate(16, None).unwrap();
        counts.record([0b0000_0101, 0x80]);
        counts.record([0b0000_0001, 0x00]);
        assert_eq!(counts.samples(), 2);
        assert_eq!(counts.counts[0], 2);
        assert_eq!(counts.counts[2], 1);
        assert_eq!(counts.counts[15], 1);
        assert_eq!(counts.counts.iter().sum::<u64>(), 4);
    }

    #[test]
    fn record_ignores_bytes_past_width() {
        let mut counts = BitCounts::allocate(8, None).unwrap();
        counts.record([0x01, 0xFF, 0xFF]);
        assert_eq!(counts.counts.iter().sum::<u64>(), 1);
    }

    #[test]
    fn allocation_cap_reports_out_of_memory() {
        let err = BitCounts::allocate(64, Some(32)).unwrap_err();
        assert_eq!(err, Error::OutOfMemory { bits: 64 });
    }

    #[test]
    fn width_is_fixed_by_first_vector() {
        let mut c = core();
        assert_eq!(c.status(), SessionStatus::Empty);
        c.ensure_sized(4).unwrap();
        assert_eq!(c.bit_width(), Some(32));
        c.ensure_sized(8).unwrap();
        assert_eq!(c.bit_width(), Some(32));
        assert_eq!(c.status(), SessionStatus::Accumulating);
    }

    #[test]
    fn mismatch_retains_counters_and_reports() {
        let mut c = core();
        c.ensure_sized(4).unwrap();
        let err = c.check_width(5).unwrap_err();
        assert_eq!(err, Error::LengthMismatch { expected: 4, got: 5 });
        assert!(c.is_failed());
        assert_eq!(c.bit_width(), Some(32));
        assert_eq!(c.finalize(), Err(Error::LengthMismatch { expected: 4, got: 5 }));
    }

    #[test]
    fn empty_first_vector_fails() {
        let mut c = core();
        assert_eq!(c.ensure_sized(0), Err(Error::EmptyVector));
        assert_eq!(c.status(), SessionStatus::Failed);
        assert_eq!(c.bit_width(), None);
    }

    #[test]
    fn finalize_empty_is_no_data() {
        assert_eq!(core().finalize(), Ok(None));
    }

    #[test]
    fn vector_arg_classifies_operands() {
        let args = [Value::Blob(vec![1]), Value::Null, Value::Int(3)];
        assert_eq!(vector_arg(&args, 0).unwrap(), Some(&[1u8][..]));
        assert_eq!(vector_arg(&args, 1).unwrap(), None);
        assert_eq!(vector_arg(&args, 5).unwrap(), None);
        assert!(matches!(vector_arg(&args, 2), Err(Error::TypeError { .. })));
    }
}
