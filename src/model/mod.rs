//! # Data Model
//!
//! Plain types that cross every boundary: host ↔ registry ↔ metrics ↔ sessions.
//!
//! Design rule: this module is pure data — no I/O, no session state.

pub mod bits;
pub mod summary;
pub mod value;

pub use bits::{BITS_PER_BYTE, bit_at, bit_width, set_bits};
pub use summary::{SummaryVector, BLOB_STRIDE};
pub use value::Value;
