//! Wheel Layout
//!
//! Single-zero (European) wheel: pocket colors, physical pocket order,
//! and the number sets covered by the standard table positions.

use serde::{Serialize, Deserialize};

use super::rng::MAX_POCKET;

/// Red pockets.
pub const RED_NUMBERS: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

/// Black pockets.
pub const BLACK_NUMBERS: [u8; 18] = [2, 4, 6, 8, 10, 11, 13, 15, 17, 20, 22, 24, 26, 28, 29, 31, 33, 35];

/// Pockets in clockwise order around the wheel, starting at zero.
pub const WHEEL_ORDER: [u8; 37] = [
    0, 32, 15, 19, 4, 21, 2, 25, 17, 34, 6, 27, 13, 36,
    11, 30, 8, 23, 10, 5, 24, 16, 33, 1, 20, 14, 31, 9,
    22, 18, 29, 7, 28, 12, 35, 3, 26,
];

/// Pocket color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PocketColor {
    /// Zero.
    Green,
    /// Red pocket.
    Red,
    /// Black pocket.
    Black,
}

/// Color of a pocket. Out-of-range numbers are reported as green.
pub fn color(n: u8) -> PocketColor {
    if n == 0 || n > MAX_POCKET {
        PocketColor::Green
    } else if RED_NUMBERS.contains(&n) {
        PocketColor::Red
    } else {
        PocketColor::Black
    }
}

/// Whether `n` is a red pocket.
#[inline]
pub fn is_red(n: u8) -> bool {
    color(n) == PocketColor::Red
}

/// Whether `n` is a black pocket.
#[inline]
pub fn is_black(n: u8) -> bool {
    color(n) == PocketColor::Black
}

/// The `2 * count + 1` pockets centered on `n` in wheel order.
///
/// Returns just `[n]` when `n` is not a pocket.
pub fn neighbours(n: u8, count: usize) -> Vec<u8> {
    let Some(idx) = WHEEL_ORDER.iter().position(|&p| p == n) else {
        return vec![n];
    };
    let len = WHEEL_ORDER.len();
    // Clamp so the window never laps the wheel.
    let count = count.min(len / 2);
    (0..=2 * count)
        .map(|i| WHEEL_ORDER[(idx + len - count + i) % len])
        .collect()
}

/// The street (row of three) containing `n`. Zero has no street.
pub fn street_of(n: u8) -> Option<[u8; 3]> {
    if n == 0 || n > MAX_POCKET {
        return None;
    }
    let base = (n - 1) / 3 * 3 + 1;
    Some([base, base + 1, base + 2])
}

/// Numbers in dozen `k` (1, 2 or 3).
pub fn dozen(k: u8) -> Option<Vec<u8>> {
    if !(1..=3).contains(&k) {
        return None;
    }
    let start = (k - 1) * 12 + 1;
    Some((start..start + 12).collect())
}

/// Numbers in column `k` (1, 2 or 3). Column 1 starts at 1.
pub fn column(k: u8) -> Option<Vec<u8>> {
    if !(1..=3).contains(&k) {
        return None;
    }
    Some((0..12).map(|row| row * 3 + k).collect())
}

/// Numbers 1 to 18.
pub fn low() -> Vec<u8> {
    (1..=18).collect()
}

/// Numbers 19 to 36.
pub fn high() -> Vec<u8> {
    (19..=36).collect()
}

/// Odd numbers 1 to 35.
pub fn odd() -> Vec<u8> {
    (1..=MAX_POCKET).filter(|n| n % 2 == 1).collect()
}

/// Even numbers 2 to 36. Zero is not even for betting purposes.
pub fn even() -> Vec<u8> {
    (1..=MAX_POCKET).filter(|n| n % 2 == 0).collect()
}
