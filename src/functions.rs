//! Host function registry.
//!
//! Names and arities under which a host runtime exposes the engine.
//! Lookup is case-insensitive, matching SQL function-name rules.

use hashbrown::HashMap;

use crate::aggregate::{self, Aggregate, AliasingSession, ReliabilitySession};
use crate::config::EngineConfig;
use crate::metrics;
use crate::model::Value;
use crate::{Error, Result};

/// Every registered function, scalars first.
pub static FUNCTION_NAMES: &[&str] = &[
    "hw",          // Hamming weight
    "fhw",         // Fractional Hamming weight
    "hd",          // Hamming distance
    "fhd",         // Fractional Hamming distance
    "entropy",     // Binary entropy of the weight fraction
    "bitaliasing", // Aggregate: per-bit "on" probability
    "reliability", // Aggregate: per-bit match rate against a reference
];

type ScalarFn = fn(&[Value]) -> Result<Value>;

/// What a registered name resolves to.
#[derive(Clone, Copy)]
pub enum FunctionKind {
    /// Evaluated once per row.
    Scalar(ScalarFn),
    /// Folded across rows by a session.
    Aggregate(AggregateKind),
}

impl std::fmt::Debug for FunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionKind::Scalar(_) => write!(f, "Scalar"),
            FunctionKind::Aggregate(k) => write!(f, "Aggregate({k:?})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Aliasing,
    Reliability,
}

/// A registered function.
#[derive(Debug, Clone, Copy)]
pub struct FunctionDef {
    pub name: &'static str,
    pub arity: usize,
    pub kind: FunctionKind,
}

/// Name → definition table.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    defs: HashMap<&'static str, FunctionDef>,
}

impl FunctionRegistry {
    /// Registry holding all built-in functions.
    pub fn builtin() -> Self {
        let defs = [
            FunctionDef { name: "hw", arity: 1, kind: FunctionKind::Scalar(call_hw) },
            FunctionDef { name: "fhw", arity: 1, kind: FunctionKind::Scalar(call_fhw) },
            FunctionDef { name: "hd", arity: 2, kind: FunctionKind::Scalar(call_hd) },
            FunctionDef { name: "fhd", arity: 2, kind: FunctionKind::Scalar(call_fhd) },
            FunctionDef { name: "entropy", arity: 1, kind: FunctionKind::Scalar(call_entropy) },
            FunctionDef {
                name: aggregate::aliasing::NAME,
                arity: 1,
                kind: FunctionKind::Aggregate(AggregateKind::Aliasing),
            },
            FunctionDef {
                name: aggregate::reliability::NAME,
                arity: 2,
                kind: FunctionKind::Aggregate(AggregateKind::Reliability),
            },
        ];
        Self { defs: defs.into_iter().map(|d| (d.name, d)).collect() }
    }

    pub fn lookup(&self, name: &str) -> Result<&FunctionDef> {
        self.defs
            .get(name.to_ascii_lowercase().as_str())
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Invoke a scalar function.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let def = self.lookup(name)?;
        check_arity(def, args)?;
        match def.kind {
            FunctionKind::Scalar(f) => f(args),
            FunctionKind::Aggregate(_) => Err(Error::AggregationFailed(format!(
                "{} is an aggregate and must be driven through a session",
                def.name
            ))),
        }
    }

    /// Open a fresh session for an aggregate function.
    pub fn aggregate(&self, name: &str, config: &EngineConfig) -> Result<Box<dyn Aggregate>> {
        let def = self.lookup(name)?;
        match def.kind {
            FunctionKind::Aggregate(AggregateKind::Aliasing) => {
                Ok(Box::new(AliasingSession::with_config(config)))
            }
            FunctionKind::Aggregate(AggregateKind::Reliability) => {
                Ok(Box::new(ReliabilitySession::with_config(config)))
            }
            FunctionKind::Scalar(_) => Err(Error::TypeError {
                expected: "aggregate function".into(),
                got: format!("scalar function {}", def.name),
            }),
        }
    }

    /// Arity of an aggregate, checked against each row by the driver.
    pub(crate) fn arity(&self, name: &str) -> Result<(&'static str, usize)> {
        self.lookup(name).map(|d| (d.name, d.arity))
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

pub(crate) fn check_arity_of(function: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::ArgumentCount { function: function.to_string(), expected, got });
    }
    Ok(())
}

fn check_arity(def: &FunctionDef, args: &[Value]) -> Result<()> {
    check_arity_of(def.name, def.arity, args.len())
}

// ============================================================================
// Scalar handlers
// ============================================================================

/// Borrow operand `idx` as a bit vector; `Ok(None)` for `Null`.
fn operand(args: &[Value], idx: usize) -> Result<Option<&[u8]>> {
    match &args[idx] {
        Value::Null => Ok(None),
        v => v.as_bytes().map(Some).ok_or_else(|| Error::TypeError {
            expected: "BLOB".into(),
            got: v.type_name().into(),
        }),
    }
}

fn call_hw(args: &[Value]) -> Result<Value> {
    match operand(args, 0)? {
        Some(v) => Value::try_from(metrics::weight(v)),
        None => Ok(Value::Null),
    }
}

fn call_fhw(args: &[Value]) -> Result<Value> {
    match operand(args, 0)? {
        Some(v) => metrics::weight_fraction(v).map(Value::from),
        None => Ok(Value::Null),
    }
}

fn call_entropy(args: &[Value]) -> Result<Value> {
    match operand(args, 0)? {
        Some(v) => metrics::entropy(v).map(Value::from),
        None => Ok(Value::Null),
    }
}

fn call_hd(args: &[Value]) -> Result<Value> {
    match (operand(args, 0)?, operand(args, 1)?) {
        (Some(a), Some(b)) => metrics::distance(a, b).and_then(Value::try_from),
        _ => Ok(Value::Null),
    }
}

fn call_fhd(args: &[Value]) -> Result<Value> {
    match (operand(args, 0)?, operand(args, 1)?) {
        (Some(a), Some(b)) => metrics::distance_fraction(a, b).map(Value::from),
        _ => Ok(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(bytes: &[u8]) -> Value {
        Value::Blob(bytes.to_vec())
    }

    #[test]
    fn registry_covers_all_names() {
        let reg = FunctionRegistry::builtin();
        assert_eq!(reg.len(), FUNCTION_NAMES.len());
        for name in FUNCTION_NAMES {
            assert!(reg.lookup(name).is_ok(), "{name} not registered");
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let reg = FunctionRegistry::builtin();
        assert_eq!(reg.lookup("HW").unwrap().name, "hw");
        assert_eq!(reg.lookup("BitAliasing").unwrap().arity, 1);
    }

    #[test]
    fn unknown_function() {
        let reg = FunctionRegistry::builtin();
        assert_eq!(
            reg.call("popcount", &[blob(&[1])]),
            Err(Error::UnknownFunction("popcount".into()))
        );
    }

    #[test]
    fn scalar_results_have_host_types() {
        let reg = FunctionRegistry::builtin();
        assert_eq!(reg.call("hw", &[blob(&[0x0F])]).unwrap(), Value::Int(4));
        assert_eq!(reg.call("fhw", &[blob(&[0x0F])]).unwrap(), Value::Float(0.5));
        assert_eq!(reg.call("hd", &[blob(&[0x0F]), blob(&[0xF0])]).unwrap(), Value::Int(8));
        assert_eq!(reg.call("fhd", &[blob(&[0x0F]), blob(&[0xF0])]).unwrap(), Value::Float(1.0));
        assert_eq!(reg.call("entropy", &[blob(&[0x0F])]).unwrap(), Value::Float(1.0));
    }

    #[test]
    fn null_passes_through() {
        let reg = FunctionRegistry::builtin();
        for name in ["hw", "fhw", "entropy"] {
            assert_eq!(reg.call(name, &[Value::Null]).unwrap(), Value::Null, "{name}");
        }
        assert_eq!(reg.call("hd", &[Value::Null, blob(&[1])]).unwrap(), Value::Null);
        assert_eq!(reg.call("fhd", &[blob(&[1]), Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn distance_mismatch_is_recoverable() {
        let reg = FunctionRegistry::builtin();
        assert_eq!(
            reg.call("hd", &[blob(&[0; 4]), blob(&[0; 5])]),
            Err(Error::LengthMismatch { expected: 4, got: 5 })
        );
    }

    #[test]
    fn wrong_arity() {
        let reg = FunctionRegistry::builtin();
        assert_eq!(
            reg.call("hd", &[blob(&[0])]),
            Err(Error::ArgumentCount { function: "hd".into(), expected: 2, got: 1 })
        );
    }

    #[test]
    fn numbers_are_not_vectors() {
        let reg = FunctionRegistry::builtin();
        assert!(matches!(reg.call("hw", &[Value::Int(3)]), Err(Error::TypeError { .. })));
    }

    #[test]
    fn aggregates_are_not_scalars() {
        let reg = FunctionRegistry::builtin();
        assert!(matches!(
            reg.call("bitaliasing", &[blob(&[0])]),
            Err(Error::AggregationFailed(_))
        ));
        assert!(matches!(
            reg.aggregate("hw", &EngineConfig::default()),
            Err(Error::TypeError { .. })
        ));
        let agg = reg.aggregate("RELIABILITY", &EngineConfig::default()).unwrap();
        assert_eq!(agg.name(), "reliability");
    }
}
