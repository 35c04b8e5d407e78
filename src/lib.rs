//! # Roulette Table Server
//!
//! Real-time multiplayer European roulette: one shared table, a
//! betting/spinning/result round clock, and a WebSocket gateway.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ROULETTE TABLE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── rng.rs      - Outcome sources (OS CSPRNG, scripted)     │
//! │  └── wheel.rs    - Pocket colors and wheel order             │
//! │                                                              │
//! │  game/           - Round engine (no I/O, no clocks)          │
//! │  ├── rules.rs    - Bet catalog, validation, payouts          │
//! │  ├── state.rs    - Players, bets, snapshots                  │
//! │  ├── room.rs     - Table storage and chip ledger             │
//! │  ├── tick.rs     - Phase machine and settlement              │
//! │  ├── command.rs  - Command set and dispatch                  │
//! │  └── events.rs   - Outbound notifications                    │
//! │                                                              │
//! │  network/        - Transport                                 │
//! │  ├── table.rs    - Actor owning the room and its ticker      │
//! │  ├── server.rs   - WebSocket session gateway                 │
//! │  └── protocol.rs - Message types                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Chip Conservation
//!
//! Between settlements, a player's balance plus the stakes of their open
//! bets never changes. Placing, removing or clearing bets only moves
//! chips between the two; only settlement and rebuy create chips.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::rng::{OutcomeError, OutcomeSource, ScriptedWheel, SecureWheel};
pub use game::command::{CommandReply, RoomCommand};
pub use game::events::RoomEvent;
pub use game::room::{BetError, BetProposal, Room, TableConfig};
pub use game::rules::{AnnouncedBet, BetType, ValidationError};
pub use game::state::{Bet, BetId, Phase, Player, PlayerId, SpinResult, TableSnapshot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
