//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are JSON, tagged by `type`.

use serde::{Serialize, Deserialize};

use crate::game::command::RoomCommand;
use crate::game::events::RoomEvent;
use crate::game::room::BetProposal;
use crate::game::rules::AnnouncedBet;
use crate::game::state::{Bet, BetId, Player, PlayerId, SpinResult, TableSnapshot};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Place one bet.
    PlaceBet(PlaceBetRequest),

    /// Place an announced (call) bet.
    PlaceAnnounced(PlaceAnnouncedRequest),

    /// Take back one bet.
    RemoveBet {
        /// Bet to remove.
        bet_id: BetId,
    },

    /// Take back every bet.
    ClearBets,

    /// Refill an empty balance.
    Rebuy,

    /// Wipe the table (administrative).
    ResetTable,

    /// Ping for latency measurement.
    Ping {
        /// Client clock, echoed back.
        timestamp: u64,
    },
}

/// Bet placement request. Validated by the room, not by the decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBetRequest {
    /// Bet type name.
    pub bet_type: String,
    /// Covered numbers.
    pub numbers: Vec<i64>,
    /// Stake.
    pub amount: i64,
}

impl PlaceBetRequest {
    /// Convert to a room proposal.
    pub fn to_proposal(&self) -> BetProposal {
        BetProposal {
            bet_type: self.bet_type.clone(),
            numbers: self.numbers.clone(),
            amount: self.amount,
        }
    }
}

/// Announced bet request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceAnnouncedRequest {
    /// Which call bet.
    pub announced: AnnouncedBet,
    /// Chips per unit.
    pub unit: i64,
}

impl ClientMessage {
    /// Map to a room command on behalf of `player_id`.
    ///
    /// Returns `None` for messages the gateway answers itself.
    pub fn to_command(&self, player_id: PlayerId) -> Option<RoomCommand> {
        match self {
            ClientMessage::PlaceBet(req) => Some(RoomCommand::PlaceBet {
                player_id,
                proposal: req.to_proposal(),
            }),
            ClientMessage::PlaceAnnounced(req) => Some(RoomCommand::PlaceAnnounced {
                player_id,
                announced: req.announced,
                unit: req.unit,
            }),
            ClientMessage::RemoveBet { bet_id } => Some(RoomCommand::RemoveBet {
                player_id,
                bet_id: *bet_id,
            }),
            ClientMessage::ClearBets => Some(RoomCommand::ClearBets { player_id }),
            ClientMessage::Rebuy => Some(RoomCommand::Rebuy { player_id }),
            ClientMessage::ResetTable => Some(RoomCommand::ResetTable),
            ClientMessage::Ping { .. } => None,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The receiving connection's own player record.
    Identity(Player),

    /// Full table state.
    State(TableSnapshot),

    /// Betting countdown.
    Countdown {
        /// Seconds left to bet.
        seconds: u32,
    },

    /// Winning number and payouts.
    Spin(SpinResult),

    /// New betting round.
    NewRound,

    /// Table wiped. The server re-seats this connection right after.
    Reset,

    /// Someone joined.
    PlayerJoined(Player),

    /// Someone left.
    PlayerLeft {
        /// Departed player.
        player_id: PlayerId,
    },

    /// A bet was placed.
    BetPlaced(Bet),

    /// A bet was removed.
    BetRemoved {
        /// Removed bet.
        bet_id: BetId,
        /// Its owner.
        player_id: PlayerId,
    },

    /// The last request from this connection was refused.
    BetError {
        /// Why the request was refused.
        message: String,
    },

    /// Pong response.
    Pong {
        /// Echoed client timestamp.
        timestamp: u64,
        /// Server wall clock, ms since the epoch.
        server_time: i64,
    },

    /// Error message.
    Error(ServerError),

    /// Server is shutting down.
    Shutdown {
        /// Human-readable reason.
        reason: String,
    },
}

impl From<RoomEvent> for ServerMessage {
    fn from(event: RoomEvent) -> Self {
        match event {
            RoomEvent::State(snapshot) => ServerMessage::State(snapshot),
            RoomEvent::Countdown { seconds } => ServerMessage::Countdown { seconds },
            RoomEvent::Spin(result) => ServerMessage::Spin(result),
            RoomEvent::NewRound => ServerMessage::NewRound,
            RoomEvent::Reset => ServerMessage::Reset,
            RoomEvent::PlayerJoined(player) => ServerMessage::PlayerJoined(player),
            RoomEvent::PlayerLeft { player_id } => ServerMessage::PlayerLeft { player_id },
            RoomEvent::BetPlaced(bet) => ServerMessage::BetPlaced(bet),
            RoomEvent::BetRemoved { bet_id, player_id } => {
                ServerMessage::BetRemoved { bet_id, player_id }
            }
        }
    }
}

/// Server error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed message.
    InvalidInput,
    /// Connection limit reached.
    ServerOverloaded,
    /// Table unavailable.
    InternalError,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules::BetType;
    use crate::game::state::Phase;

    #[test]
    fn test_place_bet_json() {
        let json = r#"{"type":"place_bet","bet_type":"split","numbers":[17,20],"amount":25}"#;
        let msg = ClientMessage::from_json(json).unwrap();

        let player_id = PlayerId::new([1; 16]);
        match msg.to_command(player_id) {
            Some(RoomCommand::PlaceBet { player_id: pid, proposal }) => {
                assert_eq!(pid, player_id);
                assert_eq!(proposal, BetProposal::new(BetType::Split, &[17, 20], 25));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_bet_type_still_decodes() {
        // Type names are checked by the rules engine so the client gets a
        // descriptive bet error rather than a decode failure.
        let json = r#"{"type":"place_bet","bet_type":"basket","numbers":[0,1,2],"amount":5}"#;
        assert!(ClientMessage::from_json(json).is_ok());
    }

    #[test]
    fn test_non_integer_number_rejected_by_decoder() {
        let json = r#"{"type":"place_bet","bet_type":"straight","numbers":[1.5],"amount":5}"#;
        assert!(ClientMessage::from_json(json).is_err());
    }

    #[test]
    fn test_announced_json() {
        let json = r#"{"type":"place_announced","announced":{"kind":"neighbours","number":17,"count":2},"unit":5}"#;
        let msg = ClientMessage::from_json(json).unwrap();
        match msg {
            ClientMessage::PlaceAnnounced(req) => {
                assert_eq!(req.announced, AnnouncedBet::Neighbours { number: 17, count: 2 });
                assert_eq!(req.unit, 5);
            }
            other => panic!("unexpected message {:?}", other),
        }

        let json = r#"{"type":"place_announced","announced":{"kind":"voisins"},"unit":1}"#;
        assert!(ClientMessage::from_json(json).is_ok());
    }

    #[test]
    fn test_unit_messages() {
        for (json, expected) in [
            (r#"{"type":"clear_bets"}"#, "ClearBets"),
            (r#"{"type":"rebuy"}"#, "Rebuy"),
            (r#"{"type":"reset_table"}"#, "ResetTable"),
        ] {
            let msg = ClientMessage::from_json(json).unwrap();
            assert_eq!(format!("{:?}", msg), expected);
        }
        let ping = ClientMessage::from_json(r#"{"type":"ping","timestamp":12}"#).unwrap();
        assert!(ping.to_command(PlayerId::new([0; 16])).is_none());
    }

    #[test]
    fn test_server_message_json_roundtrip() {
        let snapshot = TableSnapshot {
            phase: Phase::Result,
            countdown: 3,
            round: 7,
            players: Vec::new(),
            result: Some(17),
            history: vec![17, 4],
        };
        let json = ServerMessage::State(snapshot.clone()).to_json().unwrap();
        assert!(json.starts_with(r#"{"type":"state","phase":"result""#));

        match ServerMessage::from_json(&json).unwrap() {
            ServerMessage::State(parsed) => assert_eq!(parsed, snapshot),
            other => panic!("wrong message type {:?}", other),
        }
    }

    #[test]
    fn test_room_events_convert() {
        let msg: ServerMessage = RoomEvent::Countdown { seconds: 4 }.into();
        assert_eq!(msg.to_json().unwrap(), r#"{"type":"countdown","seconds":4}"#);

        let msg: ServerMessage = RoomEvent::NewRound.into();
        assert_eq!(msg.to_json().unwrap(), r#"{"type":"new_round"}"#);

        let msg: ServerMessage = RoomEvent::Reset.into();
        assert_eq!(msg.to_json().unwrap(), r#"{"type":"reset"}"#);
    }

    #[test]
    fn test_bet_error_message() {
        let msg = ServerMessage::BetError { message: "Insufficient chips".to_string() };
        let json = msg.to_json().unwrap();
        assert_eq!(json, r#"{"type":"bet_error","message":"Insufficient chips"}"#);
    }

    #[test]
    fn test_error_codes() {
        let error = ServerError {
            code: ErrorCode::InvalidInput,
            message: "Invalid message format".to_string(),
        };

        let json = ServerMessage::Error(error).to_json().unwrap();
        assert!(json.contains("invalid_input"));
    }
}
