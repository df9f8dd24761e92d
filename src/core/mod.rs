//! Core value primitives.
//!
//! Board geometry and state fingerprints. Pure values, no I/O, no clocks.

pub mod coords;
pub mod hash;

// Re-export core types
pub use coords::{ByLength, Coordinates, DoubledHex, Vector};
pub use hash::{short_hex, StateHash, StateHasher};
