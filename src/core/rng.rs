//! Outcome Generator
//!
//! Draws the winning pocket for a round. Production tables use
//! [`SecureWheel`], which reads the operating system's entropy source.
//! [`ScriptedWheel`] replays a fixed sequence for replays and tests.
//!
//! An entropy failure is reported as an [`OutcomeError`]; callers must
//! abort settlement rather than fall back to a fixed pocket.

use std::collections::VecDeque;

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Number of pockets on a single-zero wheel (0..=36).
pub const POCKET_COUNT: u32 = 37;

/// Highest pocket number.
pub const MAX_POCKET: u8 = 36;

/// Largest multiple of [`POCKET_COUNT`] that fits in a `u32`.
///
/// Draws at or above this value are rejected so every pocket is
/// equally likely.
const ACCEPT_ZONE: u32 = u32::MAX - (u32::MAX % POCKET_COUNT);

/// Maximum rejected draws before giving up on the entropy source.
const MAX_REJECTIONS: usize = 64;

/// Outcome generation errors.
#[derive(Debug, Error)]
pub enum OutcomeError {
    /// The OS entropy source failed.
    #[error("Entropy source failed: {0}")]
    Entropy(String),

    /// A scripted wheel ran out of outcomes.
    #[error("Scripted wheel has no outcomes left")]
    Exhausted,
}

/// A source of winning pockets.
pub trait OutcomeSource: Send {
    /// Draw one pocket in `0..=36`.
    fn spin(&mut self) -> Result<u8, OutcomeError>;
}

/// Uniform wheel backed by the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureWheel;

impl SecureWheel {
    /// Create a new secure wheel.
    pub fn new() -> Self {
        Self
    }

    fn next_u32() -> Result<u32, OutcomeError> {
        let mut buf = [0u8; 4];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| OutcomeError::Entropy(e.to_string()))?;
        Ok(u32::from_le_bytes(buf))
    }
}

impl OutcomeSource for SecureWheel {
    fn spin(&mut self) -> Result<u8, OutcomeError> {
        for _ in 0..MAX_REJECTIONS {
            let value = Self::next_u32()?;
            if value < ACCEPT_ZONE {
                return Ok((value % POCKET_COUNT) as u8);
            }
        }
        // 64 consecutive draws in the top 4 values of u32 means the
        // source is not random.
        Err(OutcomeError::Entropy("rejection sampling did not converge".to_string()))
    }
}

/// Deterministic wheel that replays a fixed list of pockets.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWheel {
    outcomes: VecDeque<u8>,
}

impl ScriptedWheel {
    /// Create a wheel that yields `outcomes` in order.
    ///
    /// Pockets above 36 are reduced modulo 37.
    pub fn new(outcomes: impl IntoIterator<Item = u8>) -> Self {
        Self {
            outcomes: outcomes
                .into_iter()
                .map(|n| n % POCKET_COUNT as u8)
                .collect(),
        }
    }

    /// Queue another outcome.
    pub fn push(&mut self, outcome: u8) {
        self.outcomes.push_back(outcome % POCKET_COUNT as u8);
    }

    /// Outcomes not yet drawn.
    pub fn remaining(&self) -> usize {
        self.outcomes.len()
    }
}

impl OutcomeSource for ScriptedWheel {
    fn spin(&mut self) -> Result<u8, OutcomeError> {
        self.outcomes.pop_front().ok_or(OutcomeError::Exhausted)
    }
}

impl<T: OutcomeSource + ?Sized> OutcomeSource for Box<T> {
    fn spin(&mut self) -> Result<u8, OutcomeError> {
        (**self).spin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_wheel_range() {
        let mut wheel = SecureWheel::new();
        for _ in 0..1000 {
            let n = wheel.spin().unwrap();
            assert!(n <= MAX_POCKET);
        }
    }

    #[test]
    fn test_secure_wheel_covers_every_pocket() {
        let mut wheel = SecureWheel::new();
        let mut seen = [false; POCKET_COUNT as usize];
        // P(missing a pocket in 20k draws) is negligible.
        for _ in 0..20_000 {
            seen[wheel.spin().unwrap() as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_accept_zone_is_multiple_of_pockets() {
        assert_eq!(ACCEPT_ZONE % POCKET_COUNT, 0);
    }

    #[test]
    fn test_scripted_wheel_order_and_exhaustion() {
        let mut wheel = ScriptedWheel::new([17, 0, 36]);
        assert_eq!(wheel.spin().unwrap(), 17);
        assert_eq!(wheel.spin().unwrap(), 0);
        wheel.push(5);
        assert_eq!(wheel.spin().unwrap(), 36);
        assert_eq!(wheel.remaining(), 1);
        assert_eq!(wheel.spin().unwrap(), 5);
        assert!(matches!(wheel.spin(), Err(OutcomeError::Exhausted)));
    }

    #[test]
    fn test_boxed_source() {
        let mut wheel: Box<dyn OutcomeSource> = Box::new(ScriptedWheel::new([9]));
        assert_eq!(wheel.spin().unwrap(), 9);
    }
}
