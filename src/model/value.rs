//! Host value type — what a calling runtime hands to the engine per argument.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A single argument or result exchanged with the host.
///
/// Mirrors the storage classes of a typical SQL host:
/// - `Null`: the "missing value" sentinel
/// - `Int`, `Float`: numeric results (weight, fractions, entropy)
/// - `Text`, `Blob`: byte carriers, both usable as bit vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

// ============================================================================
// Type checking
// ============================================================================

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
        }
    }

    /// Raw bytes of a bit-vector carrier. Text contributes its UTF-8 bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<f32> for Value { fn from(v: f32) -> Self { Value::Float(v as f64) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::Text(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::Text(v.to_owned()) } }
impl From<Vec<u8>> for Value { fn from(v: Vec<u8>) -> Self { Value::Blob(v) } }
impl From<&[u8]> for Value { fn from(v: &[u8]) -> Self { Value::Blob(v.to_vec()) } }
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Value::Null) }
}

/// Bit counts are unsigned; the host integer is signed.
impl TryFrom<u64> for Value {
    type Error = Error;

    fn try_from(v: u64) -> Result<Self, Error> {
        i64::try_from(v).map(Value::Int).map_err(|_| Error::TypeError {
            expected: "INTEGER".into(),
            got: format!("count {v} beyond i64 range"),
        })
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::Blob(b) => {
                write!(f, "x'")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                write!(f, "'")
            }
        }
    }
}
