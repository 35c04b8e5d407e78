//! Game Logic Module
//!
//! The round engine. No I/O and no clocks: time enters only through
//! [`Room::advance`], randomness only through an
//! [`OutcomeSource`](crate::core::rng::OutcomeSource).
//!
//! ## Module Structure
//!
//! - `rules`: Bet catalog, structural validation, payouts
//! - `state`: Players, bets, phase, snapshots
//! - `room`: Table storage and player ledger
//! - `tick`: Phase transitions and settlement
//! - `command`: Closed command set and dispatch
//! - `events`: Outbound notifications

pub mod rules;
pub mod state;
pub mod room;
pub mod tick;
pub mod command;
pub mod events;

// Re-export key types
pub use rules::{AnnouncedBet, BetLimits, BetType, ValidationError};
pub use state::{Bet, BetId, Phase, Player, PlayerId, SpinResult, TableSnapshot};
pub use room::{BetError, BetProposal, Room, TableConfig};
pub use tick::TickResult;
pub use command::{CommandReply, RoomCommand};
pub use events::RoomEvent;
