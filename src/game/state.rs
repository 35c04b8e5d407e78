//! Table State Definitions
//!
//! Players, bets, the round phase, and the broadcast snapshot.
//! Uses BTreeMap wherever iteration order reaches a client.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::game::rules::BetType;

// =============================================================================
// IDS
// =============================================================================

/// Unique player identifier, derived from the connection.
///
/// Serialized as a UUID string so it can key JSON maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Fresh random id for a new connection.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// First 4 bytes hex-encoded, for logs.
    pub fn short(&self) -> String {
        hex::encode(&self.as_bytes()[..4])
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Unique bet identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetId(pub Uuid);

impl BetId {
    /// Fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// =============================================================================
// PHASE
// =============================================================================

/// Table-wide stage of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Phase {
    /// Bets may be placed and removed.
    #[default]
    Betting,
    /// Outcome drawn, wheel animating.
    Spinning,
    /// Outcome shown, winning bets highlighted.
    Result,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Betting => "betting",
            Phase::Spinning => "spinning",
            Phase::Result => "result",
        })
    }
}

// =============================================================================
// BET
// =============================================================================

/// An active bet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    /// Bet identifier.
    pub id: BetId,
    /// Owning player.
    pub player_id: PlayerId,
    /// Bet type.
    pub bet_type: BetType,
    /// Covered pockets, in the order given.
    pub numbers: Vec<u8>,
    /// Stake, already debited from the owner's balance.
    pub amount: u64,
}

// =============================================================================
// PLAYER
// =============================================================================

/// A seated player and their ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Chip color (CSS hex).
    pub chip_color: String,
    /// Chips not currently staked.
    pub balance: u64,
    /// Active bets in placement order.
    pub bets: Vec<Bet>,
    /// Join order, used to keep the roster stable.
    #[serde(skip)]
    pub(crate) seat: u64,
}

impl Player {
    /// Create a player with no bets.
    pub fn new(id: PlayerId, chip_color: impl Into<String>, balance: u64) -> Self {
        let uuid = id.0.simple().to_string();
        Self {
            id,
            name: format!("Player_{}", &uuid[..4]),
            chip_color: chip_color.into(),
            balance,
            bets: Vec::new(),
            seat: 0,
        }
    }

    /// Sum of active stakes.
    pub fn staked(&self) -> u64 {
        self.bets.iter().map(|b| b.amount).sum()
    }

    /// Balance plus active stakes. Unchanged by placing or removing bets.
    pub fn total_chips(&self) -> u64 {
        self.balance + self.staked()
    }

    /// Find an active bet.
    pub fn bet(&self, bet_id: &BetId) -> Option<&Bet> {
        self.bets.iter().find(|b| b.id == *bet_id)
    }

    /// Debit and record a bet. Caller checks the balance first.
    pub(crate) fn stake(&mut self, bet: Bet) {
        debug_assert!(self.balance >= bet.amount);
        self.balance -= bet.amount;
        self.bets.push(bet);
    }

    /// Remove one bet and credit its stake back.
    pub(crate) fn unstake(&mut self, bet_id: &BetId) -> Option<Bet> {
        let idx = self.bets.iter().position(|b| b.id == *bet_id)?;
        let bet = self.bets.remove(idx);
        self.balance += bet.amount;
        Some(bet)
    }

    /// Remove every bet and credit all stakes back.
    pub(crate) fn unstake_all(&mut self) -> Vec<Bet> {
        let cleared = std::mem::take(&mut self.bets);
        self.balance += cleared.iter().map(|b| b.amount).sum::<u64>();
        cleared
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Authoritative table state sent to every client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Ticks left in the phase.
    pub countdown: u32,
    /// Round number, starting at 1.
    pub round: u64,
    /// Seated players in join order.
    pub players: Vec<Player>,
    /// Winning pocket of this round, once drawn.
    pub result: Option<u8>,
    /// Recent winning pockets, most recent first.
    pub history: Vec<u8>,
}

/// Outcome of a settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinResult {
    /// Winning pocket.
    pub winning_number: u8,
    /// Total credited per player. Players who won nothing are absent.
    pub payouts: BTreeMap<PlayerId, u64>,
}

impl SpinResult {
    /// Sum of all payouts.
    pub fn total_paid(&self) -> u64 {
        self.payouts.values().sum()
    }
}
