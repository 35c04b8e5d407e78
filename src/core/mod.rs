//! Core primitives.
//!
//! The outcome generator and the wheel layout. Everything above this
//! module treats a pocket as a plain `u8` in `0..=36`.

pub mod rng;
pub mod wheel;

// Re-export core types
pub use rng::{OutcomeError, OutcomeSource, ScriptedWheel, SecureWheel};
pub use wheel::PocketColor;
