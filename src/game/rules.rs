//! Bet Rules Engine
//!
//! Stateless structural validation and payout math for every bet type.
//! Balance sufficiency is the ledger's concern, not checked here.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::rng::MAX_POCKET;
use crate::core::wheel;

// =============================================================================
// BET TYPE CATALOG
// =============================================================================

/// Every bet type the table accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    /// One number.
    Straight,
    /// Two adjacent numbers.
    Split,
    /// Row of three.
    Street,
    /// Block of four.
    Corner,
    /// Two adjacent streets.
    Sixline,
    /// 1-12, 13-24 or 25-36.
    Dozen,
    /// One of the three table columns.
    Column,
    /// Red pockets.
    Red,
    /// Black pockets.
    Black,
    /// Odd numbers.
    Odd,
    /// Even numbers.
    Even,
    /// 1 to 18.
    Low,
    /// 19 to 36.
    High,
}

impl BetType {
    /// All bet types, inside bets first.
    pub const ALL: [BetType; 13] = [
        BetType::Straight,
        BetType::Split,
        BetType::Street,
        BetType::Corner,
        BetType::Sixline,
        BetType::Dozen,
        BetType::Column,
        BetType::Red,
        BetType::Black,
        BetType::Odd,
        BetType::Even,
        BetType::Low,
        BetType::High,
    ];

    /// How many numbers a position of this type covers.
    pub const fn expected_count(self) -> usize {
        match self {
            BetType::Straight => 1,
            BetType::Split => 2,
            BetType::Street => 3,
            BetType::Corner => 4,
            BetType::Sixline => 6,
            BetType::Dozen | BetType::Column => 12,
            BetType::Red
            | BetType::Black
            | BetType::Odd
            | BetType::Even
            | BetType::Low
            | BetType::High => 18,
        }
    }

    /// Winnings per chip staked (the stake itself is returned on top).
    pub const fn multiplier(self) -> u64 {
        match self {
            BetType::Straight => 35,
            BetType::Split => 17,
            BetType::Street => 11,
            BetType::Corner => 8,
            BetType::Sixline => 5,
            BetType::Dozen | BetType::Column => 2,
            BetType::Red
            | BetType::Black
            | BetType::Odd
            | BetType::Even
            | BetType::Low
            | BetType::High => 1,
        }
    }

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            BetType::Straight => "straight",
            BetType::Split => "split",
            BetType::Street => "street",
            BetType::Corner => "corner",
            BetType::Sixline => "sixline",
            BetType::Dozen => "dozen",
            BetType::Column => "column",
            BetType::Red => "red",
            BetType::Black => "black",
            BetType::Odd => "odd",
            BetType::Even => "even",
            BetType::Low => "low",
            BetType::High => "high",
        }
    }

    /// Covered numbers for the even-money types; `None` for the others,
    /// whose numbers depend on the chosen position.
    pub fn even_money_numbers(self) -> Option<Vec<u8>> {
        match self {
            BetType::Red => Some(wheel::RED_NUMBERS.to_vec()),
            BetType::Black => Some(wheel::BLACK_NUMBERS.to_vec()),
            BetType::Odd => Some(wheel::odd()),
            BetType::Even => Some(wheel::even()),
            BetType::Low => Some(wheel::low()),
            BetType::High => Some(wheel::high()),
            _ => None,
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BetType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownBetType(s.to_string()))
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Per-position stake bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLimits {
    /// Smallest accepted stake.
    pub min: u64,
    /// Largest accepted stake on one position.
    pub max: u64,
}

impl Default for BetLimits {
    fn default() -> Self {
        Self { min: 1, max: 500 }
    }
}

fn chip_noun(n: &u64) -> &'static str {
    if *n == 1 { "chip" } else { "chips" }
}

/// Structural validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Stake below the table minimum.
    #[error("Minimum bet is {min} {}", chip_noun(.min))]
    AmountTooSmall {
        /// Table minimum.
        min: u64,
    },

    /// Stake above the per-position cap.
    #[error("Maximum bet is {max} chips per position")]
    AmountTooLarge {
        /// Per-position cap.
        max: u64,
    },

    /// A covered number is not a pocket.
    #[error("Invalid number: {0}")]
    InvalidNumber(i64),

    /// Bet type not in the catalog.
    #[error("Invalid bet type: {0}")]
    UnknownBetType(String),

    /// Wrong number of covered numbers for the type.
    #[error("{bet_type} bet requires exactly {expected} numbers, got {got}")]
    WrongNumberCount {
        /// Requested type.
        bet_type: BetType,
        /// Count the type requires.
        expected: usize,
        /// Count supplied.
        got: usize,
    },
}

/// A bet that passed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBet {
    /// Bet type.
    pub bet_type: BetType,
    /// Covered pockets, in the order given.
    pub numbers: Vec<u8>,
    /// Stake.
    pub amount: u64,
}

/// Validate a proposed bet's shape and stake.
///
/// Checks run in a fixed order: stake bounds, number range, bet type,
/// number count. The first failure is returned.
pub fn validate(
    bet_type: &str,
    numbers: &[i64],
    amount: i64,
    limits: &BetLimits,
) -> Result<ValidBet, ValidationError> {
    if amount < 1 || (amount as u64) < limits.min {
        return Err(ValidationError::AmountTooSmall { min: limits.min.max(1) });
    }
    let amount = amount as u64;
    if amount > limits.max {
        return Err(ValidationError::AmountTooLarge { max: limits.max });
    }

    let numbers = numbers
        .iter()
        .map(|&n| {
            u8::try_from(n)
                .ok()
                .filter(|&p| p <= MAX_POCKET)
                .ok_or(ValidationError::InvalidNumber(n))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let bet_type: BetType = bet_type.parse()?;

    let expected = bet_type.expected_count();
    if numbers.len() != expected {
        return Err(ValidationError::WrongNumberCount {
            bet_type,
            expected,
            got: numbers.len(),
        });
    }

    Ok(ValidBet { bet_type, numbers, amount })
}

/// Whether a bet covering `numbers` wins on `winning_number`.
///
/// The type only governs the multiplier; coverage decides the win.
#[inline]
pub fn wins(numbers: &[u8], winning_number: u8) -> bool {
    numbers.contains(&winning_number)
}

/// Total returned on a winning bet: winnings plus the original stake.
#[inline]
pub fn payout(bet_type: BetType, amount: u64) -> u64 {
    amount * bet_type.multiplier() + amount
}

// =============================================================================
// ANNOUNCED BETS
// =============================================================================

/// Call bets placed as a group of ordinary positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnouncedBet {
    /// Voisins du zéro: 17 numbers around zero, 9 units.
    Voisins,
    /// Tiers du cylindre: 12 numbers opposite zero, 6 splits.
    Tiers,
    /// Orphelins: the 8 remaining numbers, 5 units.
    Orphelins,
    /// One straight on `number` and each of `count` neighbours per side.
    Neighbours {
        /// Center pocket.
        number: u8,
        /// Pockets on each side.
        count: u8,
    },
}

/// One position of an announced bet and its stake in units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncedComponent {
    /// Position type.
    pub bet_type: BetType,
    /// Covered pockets.
    pub numbers: Vec<u8>,
    /// Stake in units.
    pub units: u64,
}

const VOISINS: &[(BetType, &[u8], u64)] = &[
    (BetType::Split, &[4, 7], 1),
    (BetType::Split, &[12, 15], 1),
    (BetType::Split, &[18, 21], 1),
    (BetType::Split, &[19, 22], 1),
    (BetType::Split, &[32, 35], 1),
    (BetType::Corner, &[25, 26, 28, 29], 2),
    (BetType::Street, &[0, 2, 3], 2),
];

const TIERS: &[(BetType, &[u8], u64)] = &[
    (BetType::Split, &[5, 8], 1),
    (BetType::Split, &[10, 11], 1),
    (BetType::Split, &[13, 16], 1),
    (BetType::Split, &[23, 24], 1),
    (BetType::Split, &[27, 30], 1),
    (BetType::Split, &[33, 36], 1),
];

const ORPHELINS: &[(BetType, &[u8], u64)] = &[
    (BetType::Straight, &[1], 1),
    (BetType::Split, &[6, 9], 1),
    (BetType::Split, &[14, 17], 1),
    (BetType::Split, &[17, 20], 1),
    (BetType::Split, &[31, 34], 1),
];

impl AnnouncedBet {
    /// Expand into ordinary positions.
    pub fn components(self) -> Vec<AnnouncedComponent> {
        let table = match self {
            AnnouncedBet::Voisins => VOISINS,
            AnnouncedBet::Tiers => TIERS,
            AnnouncedBet::Orphelins => ORPHELINS,
            AnnouncedBet::Neighbours { number, count } => {
                return wheel::neighbours(number, count as usize)
                    .into_iter()
                    .map(|n| AnnouncedComponent {
                        bet_type: BetType::Straight,
                        numbers: vec![n],
                        units: 1,
                    })
                    .collect();
            }
        };

        table
            .iter()
            .map(|&(bet_type, numbers, units)| AnnouncedComponent {
                bet_type,
                numbers: numbers.to_vec(),
                units,
            })
            .collect()
    }

    /// Total units across all positions.
    pub fn total_units(self) -> u64 {
        self.components().iter().map(|c| c.units).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> BetLimits {
        BetLimits::default()
    }

    fn numbers_for(bet_type: BetType) -> Vec<i64> {
        (1..=bet_type.expected_count() as i64).collect()
    }

    #[test]
    fn test_catalog_counts_and_multipliers() {
        assert_eq!(BetType::ALL.len(), 13);
        assert_eq!(BetType::Straight.multiplier(), 35);
        assert_eq!(BetType::Sixline.expected_count(), 6);
        assert_eq!(BetType::Column.multiplier(), 2);
        assert_eq!(BetType::High.expected_count(), 18);
    }

    #[test]
    fn test_wrong_count_rejected_for_every_type() {
        for bet_type in BetType::ALL {
            let expected = bet_type.expected_count();
            for len in [0, expected - 1, expected + 1] {
                let numbers: Vec<i64> = (0..len as i64).map(|n| n % 37).collect();
                let err = validate(bet_type.as_str(), &numbers, 10, &limits()).unwrap_err();
                assert_eq!(
                    err,
                    ValidationError::WrongNumberCount { bet_type, expected, got: len },
                    "{bet_type} with {len} numbers"
                );
            }
            assert!(validate(bet_type.as_str(), &numbers_for(bet_type), 10, &limits()).is_ok());
        }
    }

    #[test]
    fn test_amount_bounds() {
        assert_eq!(
            validate("straight", &[5], 0, &limits()),
            Err(ValidationError::AmountTooSmall { min: 1 })
        );
        assert_eq!(
            validate("straight", &[5], -10, &limits()),
            Err(ValidationError::AmountTooSmall { min: 1 })
        );
        assert_eq!(
            validate("straight", &[5], 501, &limits()),
            Err(ValidationError::AmountTooLarge { max: 500 })
        );
        assert!(validate("straight", &[5], 500, &limits()).is_ok());
        assert!(validate("straight", &[5], 1, &limits()).is_ok());
    }

    #[test]
    fn test_amount_messages() {
        assert_eq!(
            ValidationError::AmountTooSmall { min: 1 }.to_string(),
            "Minimum bet is 1 chip"
        );
        assert_eq!(
            ValidationError::AmountTooSmall { min: 5 }.to_string(),
            "Minimum bet is 5 chips"
        );
        assert_eq!(
            ValidationError::AmountTooLarge { max: 500 }.to_string(),
            "Maximum bet is 500 chips per position"
        );
    }

    #[test]
    fn test_number_range() {
        assert_eq!(
            validate("straight", &[37], 5, &limits()),
            Err(ValidationError::InvalidNumber(37))
        );
        assert_eq!(
            validate("split", &[-1, 2], 5, &limits()),
            Err(ValidationError::InvalidNumber(-1))
        );
        assert!(validate("straight", &[0], 5, &limits()).is_ok());
        assert!(validate("straight", &[36], 5, &limits()).is_ok());
    }

    #[test]
    fn test_unknown_type() {
        let err = validate("basket", &[0, 1, 2], 5, &limits()).unwrap_err();
        assert_eq!(err, ValidationError::UnknownBetType("basket".to_string()));
        assert_eq!(err.to_string(), "Invalid bet type: basket");
    }

    #[test]
    fn test_amount_checked_before_shape() {
        // Bad stake wins over bad numbers and bad type.
        let err = validate("nope", &[99], 0, &limits()).unwrap_err();
        assert!(matches!(err, ValidationError::AmountTooSmall { .. }));
        let err = validate("nope", &[99], 5, &limits()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidNumber(99)));
    }

    #[test]
    fn test_custom_limits() {
        let tight = BetLimits { min: 5, max: 50 };
        assert!(matches!(
            validate("straight", &[1], 4, &tight),
            Err(ValidationError::AmountTooSmall { min: 5 })
        ));
        assert!(matches!(
            validate("straight", &[1], 51, &tight),
            Err(ValidationError::AmountTooLarge { max: 50 })
        ));
    }

    #[test]
    fn test_wins_and_payout() {
        assert!(wins(&[17], 17));
        assert!(!wins(&[16, 17], 18));
        assert!(wins(&wheel::RED_NUMBERS, 3));
        assert_eq!(payout(BetType::Straight, 10), 360);
        assert_eq!(payout(BetType::Red, 10), 20);
        assert_eq!(payout(BetType::Dozen, 10), 30);
        assert_eq!(payout(BetType::Corner, 5), 45);
    }

    #[test]
    fn test_parse_round_trips_names() {
        for bet_type in BetType::ALL {
            assert_eq!(bet_type.as_str().parse::<BetType>().unwrap(), bet_type);
            let json = serde_json::to_string(&bet_type).unwrap();
            assert_eq!(json, format!("\"{}\"", bet_type.as_str()));
        }
    }

    #[test]
    fn test_even_money_numbers_validate() {
        for bet_type in BetType::ALL {
            if let Some(numbers) = bet_type.even_money_numbers() {
                let numbers: Vec<i64> = numbers.into_iter().map(i64::from).collect();
                assert!(validate(bet_type.as_str(), &numbers, 1, &limits()).is_ok());
            }
        }
        assert!(BetType::Straight.even_money_numbers().is_none());
    }

    #[test]
    fn test_announced_components_are_valid() {
        for announced in [
            AnnouncedBet::Voisins,
            AnnouncedBet::Tiers,
            AnnouncedBet::Orphelins,
            AnnouncedBet::Neighbours { number: 0, count: 2 },
        ] {
            for c in announced.components() {
                let numbers: Vec<i64> = c.numbers.iter().map(|&n| n as i64).collect();
                assert!(validate(c.bet_type.as_str(), &numbers, c.units as i64, &limits()).is_ok());
            }
        }
        assert_eq!(AnnouncedBet::Voisins.total_units(), 9);
        assert_eq!(AnnouncedBet::Tiers.total_units(), 6);
        assert_eq!(AnnouncedBet::Orphelins.total_units(), 5);
        assert_eq!(AnnouncedBet::Neighbours { number: 17, count: 2 }.total_units(), 5);
    }
}
