//! Room State Machine
//!
//! One authoritative table: phase, countdown, roster, history, and the
//! per-player ledger. Every mutation goes through `&mut Room`, so the
//! owner serializes all operations simply by owning the value.
//!
//! Phase transitions and settlement live in [`crate::game::tick`].

use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;
use tracing::{debug, info};

use crate::game::events::{EventQueue, RoomEvent};
use crate::game::rules::{self, AnnouncedBet, BetLimits, ValidationError};
use crate::game::state::{Bet, BetId, Phase, Player, PlayerId, TableSnapshot};

/// Chip colors handed out to joining players, in rotation.
pub const CHIP_COLORS: [&str; 8] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f39c12",
    "#9b59b6", "#1abc9c", "#e67e22", "#e91e63",
];

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Table configuration.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Betting phase length (ticks).
    pub betting_ticks: u32,
    /// Spinning phase length (ticks).
    pub spinning_ticks: u32,
    /// Result phase length (ticks).
    pub result_ticks: u32,
    /// Chips given on join and on rebuy.
    pub starting_balance: u64,
    /// Per-position stake bounds.
    pub limits: BetLimits,
    /// Winning numbers kept in history.
    pub history_len: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            betting_ticks: 20,
            spinning_ticks: 5,
            result_ticks: 5,
            starting_balance: 1000,
            limits: BetLimits::default(),
            history_len: 10,
        }
    }
}

impl TableConfig {
    /// Create config from environment variables, keeping defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        fn var<T: std::str::FromStr>(name: &str) -> Option<T> {
            std::env::var(name).ok().and_then(|v| v.parse().ok())
        }

        let defaults = Self::default();
        Self {
            betting_ticks: var("ROULETTE_BETTING_TICKS").unwrap_or(defaults.betting_ticks),
            spinning_ticks: var("ROULETTE_SPINNING_TICKS").unwrap_or(defaults.spinning_ticks),
            result_ticks: var("ROULETTE_RESULT_TICKS").unwrap_or(defaults.result_ticks),
            starting_balance: var("ROULETTE_STARTING_BALANCE")
                .unwrap_or(defaults.starting_balance),
            limits: BetLimits {
                max: var("ROULETTE_MAX_BET").unwrap_or(defaults.limits.max),
                ..defaults.limits
            },
            history_len: defaults.history_len,
        }
    }

    /// Ticks in a full betting, spinning and result cycle.
    pub fn round_ticks(&self) -> u32 {
        self.betting_ticks + self.spinning_ticks + self.result_ticks
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Ledger operation errors. Reported to the requesting connection only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetError {
    /// Operation attempted outside the betting phase.
    #[error("Betting is closed")]
    BettingClosed,

    /// No such player at the table.
    #[error("Player not found")]
    PlayerNotFound,

    /// No such active bet.
    #[error("Bet not found")]
    BetNotFound,

    /// Bad shape, bounds, or type.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Balance below the stake.
    #[error("Insufficient chips")]
    InsufficientChips,
}

/// A bet as proposed by a client, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetProposal {
    /// Bet type name.
    pub bet_type: String,
    /// Covered numbers.
    pub numbers: Vec<i64>,
    /// Stake.
    pub amount: i64,
}

impl BetProposal {
    /// Build a proposal from typed parts.
    pub fn new(bet_type: rules::BetType, numbers: &[u8], amount: u64) -> Self {
        Self {
            bet_type: bet_type.as_str().to_string(),
            numbers: numbers.iter().map(|&n| i64::from(n)).collect(),
            amount: i64::try_from(amount).unwrap_or(i64::MAX),
        }
    }
}

// =============================================================================
// ROOM
// =============================================================================

/// The table.
#[derive(Debug)]
pub struct Room {
    /// Table configuration.
    pub(crate) config: TableConfig,
    /// Current phase.
    pub(crate) phase: Phase,
    /// Ticks left in the phase.
    pub(crate) countdown: u32,
    /// Round number.
    pub(crate) round: u64,
    /// Winning pocket, once drawn this round.
    pub(crate) result: Option<u8>,
    /// Recent winning pockets, most recent first.
    pub(crate) history: VecDeque<u8>,
    /// Seated players.
    pub(crate) players: BTreeMap<PlayerId, Player>,
    /// Next join order value.
    next_seat: u64,
    /// Next palette slot.
    color_index: usize,
    /// Outbound notifications.
    pub(crate) events: EventQueue,
}

impl Room {
    /// Create a room in the betting phase with a full countdown.
    pub fn new(config: TableConfig) -> Self {
        let countdown = config.betting_ticks;
        Self {
            config,
            phase: Phase::Betting,
            countdown,
            round: 1,
            result: None,
            history: VecDeque::new(),
            players: BTreeMap::new(),
            next_seat: 0,
            color_index: 0,
            events: EventQueue::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Table configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Ticks left in the current phase.
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Current round number.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// This round's winning pocket, once drawn.
    pub fn result(&self) -> Option<u8> {
        self.result
    }

    /// Recent winning pockets, most recent first.
    pub fn history(&self) -> Vec<u8> {
        self.history.iter().copied().collect()
    }

    /// Look up a player.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Number of seated players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Chips held by everyone at the table, staked or not.
    pub fn chips_in_play(&self) -> u64 {
        self.players.values().map(Player::total_chips).sum()
    }

    /// Authoritative state for broadcasting.
    pub fn snapshot(&self) -> TableSnapshot {
        let mut players: Vec<Player> = self.players.values().cloned().collect();
        players.sort_by_key(|p| p.seat);

        TableSnapshot {
            phase: self.phase,
            countdown: self.countdown,
            round: self.round,
            players,
            result: self.result,
            history: self.history(),
        }
    }

    /// Take all pending notifications.
    pub fn drain_events(&mut self) -> Vec<RoomEvent> {
        self.events.drain()
    }

    pub(crate) fn emit(&mut self, event: RoomEvent) {
        self.events.push(event);
    }

    pub(crate) fn emit_state(&mut self) {
        let snapshot = self.snapshot();
        self.events.push(RoomEvent::State(snapshot));
    }

    fn ensure_betting(&self) -> Result<(), BetError> {
        if self.phase == Phase::Betting {
            Ok(())
        } else {
            Err(BetError::BettingClosed)
        }
    }

    // -------------------------------------------------------------------------
    // Roster
    // -------------------------------------------------------------------------

    /// Seat a player with the starting balance and the next chip color.
    ///
    /// Works in any phase. Joining again with a seated id returns the
    /// existing record unchanged.
    pub fn add_player(&mut self, id: PlayerId) -> Player {
        if let Some(existing) = self.players.get(&id) {
            return existing.clone();
        }

        let color = CHIP_COLORS[self.color_index % CHIP_COLORS.len()];
        self.color_index += 1;

        let mut player = Player::new(id, color, self.config.starting_balance);
        player.seat = self.next_seat;
        self.next_seat += 1;

        self.players.insert(id, player.clone());
        info!(player = %id.short(), name = %player.name, "Player joined");

        self.emit(RoomEvent::PlayerJoined(player.clone()));
        self.emit_state();
        player
    }

    /// Remove a player.
    ///
    /// During betting their stakes are refunded first, so the round's
    /// void bets never leave the ledger. After the spin the bets are
    /// already settled and leave with the player. Returns the removed
    /// record.
    pub fn remove_player(&mut self, id: &PlayerId) -> Option<Player> {
        let mut player = self.players.remove(id)?;

        if self.phase == Phase::Betting {
            let refunded = player.unstake_all();
            if !refunded.is_empty() {
                debug!(
                    player = %id.short(),
                    bets = refunded.len(),
                    balance = player.balance,
                    "Refunded open bets on leave"
                );
            }
        }

        info!(player = %id.short(), phase = %self.phase, "Player left");
        self.emit(RoomEvent::PlayerLeft { player_id: *id });
        self.emit_state();
        Some(player)
    }

    // -------------------------------------------------------------------------
    // Ledger
    // -------------------------------------------------------------------------

    /// Validate and place a bet, debiting the stake.
    pub fn place_bet(&mut self, id: &PlayerId, proposal: &BetProposal) -> Result<Bet, BetError> {
        self.ensure_betting()?;
        let limits = self.config.limits;
        let player = self.players.get_mut(id).ok_or(BetError::PlayerNotFound)?;

        let valid = rules::validate(&proposal.bet_type, &proposal.numbers, proposal.amount, &limits)?;
        if player.balance < valid.amount {
            return Err(BetError::InsufficientChips);
        }

        let bet = Bet {
            id: BetId::random(),
            player_id: *id,
            bet_type: valid.bet_type,
            numbers: valid.numbers,
            amount: valid.amount,
        };
        player.stake(bet.clone());

        debug!(
            player = %id.short(),
            bet_type = %bet.bet_type,
            amount = bet.amount,
            balance = player.balance,
            "Bet placed"
        );
        self.emit(RoomEvent::BetPlaced(bet.clone()));
        self.emit_state();
        Ok(bet)
    }

    /// Place every position of an announced bet at `unit` chips per unit.
    ///
    /// All or nothing: every position is validated and the total cost
    /// checked before any chip moves.
    pub fn place_announced(
        &mut self,
        id: &PlayerId,
        announced: AnnouncedBet,
        unit: i64,
    ) -> Result<Vec<Bet>, BetError> {
        self.ensure_betting()?;
        let limits = self.config.limits;
        let player = self.players.get_mut(id).ok_or(BetError::PlayerNotFound)?;

        let mut valid = Vec::new();
        for component in announced.components() {
            let numbers: Vec<i64> = component.numbers.iter().map(|&n| i64::from(n)).collect();
            let amount = i64::try_from(component.units)
                .ok()
                .and_then(|units| units.checked_mul(unit))
                .unwrap_or(i64::MAX);
            valid.push(rules::validate(
                component.bet_type.as_str(),
                &numbers,
                amount,
                &limits,
            )?);
        }

        let total: u64 = valid.iter().map(|v| v.amount).sum();
        if player.balance < total {
            return Err(BetError::InsufficientChips);
        }

        let bets: Vec<Bet> = valid
            .into_iter()
            .map(|v| Bet {
                id: BetId::random(),
                player_id: *id,
                bet_type: v.bet_type,
                numbers: v.numbers,
                amount: v.amount,
            })
            .collect();
        for bet in &bets {
            player.stake(bet.clone());
        }

        debug!(
            player = %id.short(),
            announced = ?announced,
            positions = bets.len(),
            total,
            "Announced bet placed"
        );
        for bet in &bets {
            self.emit(RoomEvent::BetPlaced(bet.clone()));
        }
        self.emit_state();
        Ok(bets)
    }

    /// Take back one bet, crediting its stake.
    pub fn remove_bet(&mut self, id: &PlayerId, bet_id: &BetId) -> Result<Bet, BetError> {
        self.ensure_betting()?;
        let player = self.players.get_mut(id).ok_or(BetError::PlayerNotFound)?;
        let bet = player.unstake(bet_id).ok_or(BetError::BetNotFound)?;

        debug!(player = %id.short(), bet = %bet_id, amount = bet.amount, "Bet removed");
        self.emit(RoomEvent::BetRemoved { bet_id: *bet_id, player_id: *id });
        self.emit_state();
        Ok(bet)
    }

    /// Take back every bet, crediting all stakes.
    ///
    /// Outside betting, or for an unknown player, nothing happens and the
    /// result is empty.
    pub fn clear_bets(&mut self, id: &PlayerId) -> Vec<Bet> {
        if self.phase != Phase::Betting {
            return Vec::new();
        }
        let Some(player) = self.players.get_mut(id) else {
            return Vec::new();
        };

        let cleared = player.unstake_all();
        if cleared.is_empty() {
            return cleared;
        }

        debug!(player = %id.short(), bets = cleared.len(), "Bets cleared");
        for bet in &cleared {
            self.emit(RoomEvent::BetRemoved { bet_id: bet.id, player_id: *id });
        }
        self.emit_state();
        cleared
    }

    /// Refill a broke player to the starting balance. Any phase.
    ///
    /// Returns false if the player is unknown or still has chips.
    pub fn rebuy(&mut self, id: &PlayerId) -> bool {
        let starting_balance = self.config.starting_balance;
        let Some(player) = self.players.get_mut(id) else {
            return false;
        };
        if player.balance > 0 {
            return false;
        }

        player.balance = starting_balance;
        info!(player = %id.short(), balance = starting_balance, "Player rebought");
        self.emit_state();
        true
    }

    // -------------------------------------------------------------------------
    // Administration
    // -------------------------------------------------------------------------

    /// Wipe the table back to its initial state.
    ///
    /// Pending notifications are discarded; the queue then holds a
    /// reset signal followed by the empty snapshot.
    pub fn reset(&mut self) {
        let seated = self.players.len();

        self.players.clear();
        self.phase = Phase::Betting;
        self.countdown = self.config.betting_ticks;
        self.round = 1;
        self.result = None;
        self.history.clear();
        self.next_seat = 0;
        self.color_index = 0;
        self.events.clear();

        info!(seated, "Table reset");
        self.emit(RoomEvent::Reset);
        self.emit_state();
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}
