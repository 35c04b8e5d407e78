//! Room Commands
//!
//! The closed set of operations a gateway may request, and the single
//! entry point that applies them to a [`Room`].

use crate::game::room::{BetError, BetProposal, Room};
use crate::game::rules::AnnouncedBet;
use crate::game::state::{Bet, BetId, Player, PlayerId};

/// An inbound operation, keyed by the requesting player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCommand {
    /// Sit down.
    Join {
        /// Connection-derived id.
        player_id: PlayerId,
    },
    /// Stand up.
    Leave {
        /// Departing player.
        player_id: PlayerId,
    },
    /// Place one bet.
    PlaceBet {
        /// Bettor.
        player_id: PlayerId,
        /// Unvalidated bet.
        proposal: BetProposal,
    },
    /// Place an announced bet.
    PlaceAnnounced {
        /// Bettor.
        player_id: PlayerId,
        /// Which call bet.
        announced: AnnouncedBet,
        /// Chips per unit.
        unit: i64,
    },
    /// Take back one bet.
    RemoveBet {
        /// Owner.
        player_id: PlayerId,
        /// Bet to remove.
        bet_id: BetId,
    },
    /// Take back all bets.
    ClearBets {
        /// Owner.
        player_id: PlayerId,
    },
    /// Refill a broke player.
    Rebuy {
        /// Player.
        player_id: PlayerId,
    },
    /// Wipe the table.
    ResetTable,
}

impl RoomCommand {
    /// Requesting player, if the command has one.
    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            RoomCommand::Join { player_id }
            | RoomCommand::Leave { player_id }
            | RoomCommand::PlaceBet { player_id, .. }
            | RoomCommand::PlaceAnnounced { player_id, .. }
            | RoomCommand::RemoveBet { player_id, .. }
            | RoomCommand::ClearBets { player_id }
            | RoomCommand::Rebuy { player_id } => Some(*player_id),
            RoomCommand::ResetTable => None,
        }
    }
}

/// Direct answer to the requester. Broadcast effects go through the
/// room's event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    /// The player's own record.
    Joined(Player),
    /// The removed record, with any open stakes refunded; `None` if the
    /// player was not seated.
    Left(Option<Player>),
    /// Bet accepted.
    BetPlaced(Bet),
    /// Announced bet accepted, one bet per position.
    BetsPlaced(Vec<Bet>),
    /// Bet removed.
    BetRemoved(Bet),
    /// Bets removed, possibly none.
    BetsCleared(Vec<Bet>),
    /// Whether the rebuy happened.
    Rebuy(bool),
    /// Table wiped.
    Reset,
    /// Operation refused.
    Rejected(BetError),
}

impl CommandReply {
    /// The refusal, if any.
    pub fn error(&self) -> Option<&BetError> {
        match self {
            CommandReply::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

impl Room {
    /// Apply one command.
    pub fn dispatch(&mut self, command: RoomCommand) -> CommandReply {
        match command {
            RoomCommand::Join { player_id } => CommandReply::Joined(self.add_player(player_id)),
            RoomCommand::Leave { player_id } => CommandReply::Left(self.remove_player(&player_id)),
            RoomCommand::PlaceBet { player_id, proposal } => {
                reply(self.place_bet(&player_id, &proposal), CommandReply::BetPlaced)
            }
            RoomCommand::PlaceAnnounced { player_id, announced, unit } => reply(
                self.place_announced(&player_id, announced, unit),
                CommandReply::BetsPlaced,
            ),
            RoomCommand::RemoveBet { player_id, bet_id } => {
                reply(self.remove_bet(&player_id, &bet_id), CommandReply::BetRemoved)
            }
            RoomCommand::ClearBets { player_id } => {
                CommandReply::BetsCleared(self.clear_bets(&player_id))
            }
            RoomCommand::Rebuy { player_id } => CommandReply::Rebuy(self.rebuy(&player_id)),
            RoomCommand::ResetTable => {
                self.reset();
                CommandReply::Reset
            }
        }
    }
}

fn reply<T>(result: Result<T, BetError>, ok: impl FnOnce(T) -> CommandReply) -> CommandReply {
    match result {
        Ok(value) => ok(value),
        Err(e) => CommandReply::Rejected(e),
    }
}
