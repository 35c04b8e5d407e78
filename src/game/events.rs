//! Room Events
//!
//! Typed notifications the room publishes after mutations and phase
//! transitions. The network layer fans them out to every connection.

use serde::{Serialize, Deserialize};

use crate::game::state::{Bet, BetId, Player, PlayerId, SpinResult, TableSnapshot};

/// An outbound table notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Full authoritative state.
    State(TableSnapshot),

    /// Betting countdown.
    Countdown {
        /// Ticks left before the spin.
        seconds: u32,
    },

    /// Settlement finished.
    Spin(SpinResult),

    /// Bets cleared, a new betting phase opened.
    NewRound,

    /// Table wiped; every connection must rejoin.
    Reset,

    /// Someone sat down.
    PlayerJoined(Player),

    /// Someone left.
    PlayerLeft {
        /// Departed player.
        player_id: PlayerId,
    },

    /// A bet was placed.
    BetPlaced(Bet),

    /// A bet was taken back.
    BetRemoved {
        /// Removed bet.
        bet_id: BetId,
        /// Its owner.
        player_id: PlayerId,
    },
}

impl RoomEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RoomEvent::State(_) => "state",
            RoomEvent::Countdown { .. } => "countdown",
            RoomEvent::Spin(_) => "spin",
            RoomEvent::NewRound => "new_round",
            RoomEvent::Reset => "reset",
            RoomEvent::PlayerJoined(_) => "player_joined",
            RoomEvent::PlayerLeft { .. } => "player_left",
            RoomEvent::BetPlaced(_) => "bet_placed",
            RoomEvent::BetRemoved { .. } => "bet_removed",
        }
    }
}

/// Events queued by the room until the owner drains them.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<RoomEvent>,
}

impl EventQueue {
    /// Queue an event.
    pub fn push(&mut self, event: RoomEvent) {
        self.pending.push(event);
    }

    /// Take every queued event in emission order.
    pub fn drain(&mut self) -> Vec<RoomEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything queued.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
