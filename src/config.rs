//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How a reliability session validates each `(reference, sample)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthCheck {
    /// Reference and sample must match each other AND the session bit width.
    #[default]
    Strict,
    /// Compatibility mode: only `len(reference) == len(sample)` is checked.
    /// Positions past the session width are dropped; positions a short pair
    /// does not cover receive no match for that pair.
    PairOnly,
}

/// Settings shared by every session an [`Engine`](crate::Engine) creates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Pair validation for reliability sessions.
    pub length_check: LengthCheck,
    /// Largest accumulator (in bits) a session may allocate. `None` = no cap.
    pub max_bit_width: Option<usize>,
}

impl EngineConfig {
    /// Parse from JSON, e.g. `{"length_check": "pair_only", "max_bit_width": 65536}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn with_length_check(mut self, check: LengthCheck) -> Self {
        self.length_check = check;
        self
    }

    pub fn with_max_bit_width(mut self, bits: usize) -> Self {
        self.max_bit_width = Some(bits);
        self
    }
}
