//! Network Layer
//!
//! WebSocket gateway and the table actor that serializes access to the
//! room. All round logic lives in `game/`; this layer only moves
//! commands in and events out.

pub mod protocol;
pub mod table;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, ServerError, ErrorCode};
pub use table::{spawn_table, TableError, TableHandle, TableSettings};
pub use server::{GameServer, ServerConfig, GameServerError};
