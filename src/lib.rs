//! # puf-rs — Bit-vector quality metrics for PUF responses
//!
//! Measures the responses of Physically Unclonable Functions: how many bits
//! are set, how far apart two responses are, and, across many responses,
//! which bit positions are biased (aliasing) or unstable (reliability).
//!
//! ## Design Principles
//!
//! 1. **Borrow, never copy**: metrics read caller-owned `&[u8]` buffers
//! 2. **Sessions are values**: an aggregation is an object the caller
//!    constructs, feeds, and consumes with `finalize`
//! 3. **Failures are values**: nothing in this crate aborts the caller
//! 4. **Host-agnostic**: the registry speaks `Value`, not any runtime's ABI
//!
//! ## Quick Start
//!
//! ```rust
//! use puf_rs::{metrics, AliasingSession};
//!
//! # fn example() -> puf_rs::Result<()> {
//! assert_eq!(metrics::weight(&[0x0F]), 4);
//! assert_eq!(metrics::distance(&[0x0F], &[0xF0])?, 8);
//!
//! let mut session = AliasingSession::new();
//! session.accept(Some(&[0xFF]))?;
//! session.accept(Some(&[0x00]))?;
//! let summary = session.finalize()?.expect("two rows accepted");
//! assert_eq!(summary.as_slice(), &[0.5; 8]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Functions
//!
//! | Name | Kind | Arguments | Result |
//! |------|------|-----------|--------|
//! | `hw` | scalar | vector | INTEGER |
//! | `fhw` | scalar | vector | FLOAT |
//! | `hd` | scalar | vector, vector | INTEGER |
//! | `fhd` | scalar | vector, vector | FLOAT |
//! | `entropy` | scalar | vector | FLOAT |
//! | `bitaliasing` | aggregate | vector | BLOB of f64 |
//! | `reliability` | aggregate | reference, sample | BLOB of f64 |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod metrics;
pub mod aggregate;
pub mod config;
pub mod functions;

use std::hash::Hash;

use smallvec::SmallVec;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{SummaryVector, Value};
pub use aggregate::{Aggregate, AliasingSession, ReliabilitySession, SessionStatus};
pub use config::{EngineConfig, LengthCheck};
pub use functions::{FunctionRegistry, FUNCTION_NAMES};

/// One row of aggregate arguments.
pub type Row = SmallVec<[Value; 2]>;

// ============================================================================
// Top-level Engine handle
// ============================================================================

/// The primary entry point. An `Engine` pairs a configuration with the
/// function registry and drives scalar calls and aggregate sessions.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    registry: FunctionRegistry,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, registry: FunctionRegistry::builtin() }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Evaluate a scalar function for one row.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.registry.call(name, args)
    }

    /// Open a session for an aggregate function.
    pub fn aggregate(&self, name: &str) -> Result<Box<dyn Aggregate>> {
        self.registry.aggregate(name, &self.config)
    }

    /// Run one aggregate over a whole row sequence.
    ///
    /// Returns `Value::Null` when no row contributed. The first failing row
    /// ends the run and its error is returned; the session is discarded.
    pub fn aggregate_rows<I>(&self, name: &str, rows: I) -> Result<Value>
    where
        I: IntoIterator<Item = Row>,
    {
        let (function, arity) = self.registry.arity(name)?;
        let mut session = self.aggregate(name)?;
        for row in rows {
            functions::check_arity_of(function, arity, row.len())?;
            session.step(&row)?;
        }
        session.finish()
    }

    /// Run one independent session per group key.
    ///
    /// Every group reports its own outcome: a failure in one group leaves the
    /// others untouched. Only an unknown function fails the whole call.
    pub fn aggregate_groups<K, I>(&self, name: &str, rows: I) -> Result<hashbrown::HashMap<K, Result<Value>>>
    where
        K: Hash + Eq,
        I: IntoIterator<Item = (K, Row)>,
    {
        enum Group {
            Open(Box<dyn Aggregate>),
            Failed(Error),
        }

        let (function, arity) = self.registry.arity(name)?;
        // Reject scalars before any row is read.
        drop(self.aggregate(name)?);

        let mut groups: hashbrown::HashMap<K, Group> = hashbrown::HashMap::new();
        for (key, row) in rows {
            let group = match groups.entry(key) {
                hashbrown::hash_map::Entry::Occupied(e) => e.into_mut(),
                hashbrown::hash_map::Entry::Vacant(e) => e.insert(Group::Open(self.aggregate(name)?)),
            };
            let Group::Open(session) = group else {
                continue;
            };
            let stepped = functions::check_arity_of(function, arity, row.len())
                .and_then(|()| session.step(&row));
            if let Err(e) = stepped {
                *group = Group::Failed(e);
            }
        }

        tracing::debug!(function, groups = groups.len(), "grouped aggregation complete");
        Ok(groups
            .into_iter()
            .map(|(key, group)| {
                let outcome = match group {
                    Group::Open(session) => session.finish(),
                    Group::Failed(e) => Err(e),
                };
                (key, outcome)
            })
            .collect())
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Length mismatch: expected {expected} bytes, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Empty vector: at least one byte is required")]
    EmptyVector,

    #[error("Out of memory: cannot allocate {bits} bit counters")]
    OutOfMemory { bits: usize },

    #[error("Aggregation failed: {0}")]
    AggregationFailed(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} arguments, got {got}")]
    ArgumentCount { function: String, expected: usize, got: usize },

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
