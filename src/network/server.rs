//! WebSocket Game Server
//!
//! Session gateway for the table. Each connection gets a player id,
//! is seated on connect and unseated on disconnect. Client messages are
//! relayed to the table actor; table events are fanned out to every
//! connection, while identity and bet errors go only to the requester.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::core::rng::SecureWheel;
use crate::game::command::{CommandReply, RoomCommand};
use crate::game::events::RoomEvent;
use crate::game::room::TableConfig;
use crate::game::state::{Player, PlayerId};
use crate::network::protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage};
use crate::network::table::{spawn_table, TableError, TableHandle, TableSettings};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Wall-clock length of one table tick.
    pub tick_interval: Duration,
    /// Per-connection outbound queue length.
    pub outbound_capacity: usize,
    /// Table event buffer per connection.
    pub event_capacity: usize,
    /// Table rules and timings.
    pub table: TableConfig,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            max_connections: 1000,
            tick_interval: Duration::from_secs(1),
            outbound_capacity: 64,
            event_capacity: 256,
            table: TableConfig::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// Reads `HOST`, `PORT`, `ROULETTE_MAX_CONNECTIONS`, `ROULETTE_TICK_MS`
    /// and the table variables of [`TableConfig::from_env`].
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .and_then(|h| h.parse::<std::net::IpAddr>().ok())
            .unwrap_or(defaults.bind_addr.ip());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(defaults.bind_addr.port());

        Self {
            bind_addr: SocketAddr::new(host, port),
            max_connections: std::env::var("ROULETTE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_connections),
            tick_interval: std::env::var("ROULETTE_TICK_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&ms: &u64| ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            table: TableConfig::from_env(),
            ..defaults
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// Table actor error.
    #[error("Table error: {0}")]
    Table(#[from] TableError),
}

/// Connected client state.
struct ConnectedClient {
    /// Seated player.
    player_id: PlayerId,
    /// Connection time.
    connected_at: Instant,
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Connected clients.
    clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Run the server until [`shutdown`](Self::shutdown) is called.
    #[instrument(skip(self), fields(addr = %self.config.bind_addr))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Roulette server listening on {}", self.config.bind_addr);

        let settings = TableSettings {
            table: self.config.table.clone(),
            tick_interval: self.config.tick_interval,
            event_capacity: self.config.event_capacity,
            ..Default::default()
        };
        let (table, table_task) = spawn_table(settings, SecureWheel::new(), self.shutdown_tx.subscribe());

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                tokio::spawn(Self::reject_connection(stream, addr));
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr, table.clone());
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(table);
        if let Err(e) = table_task.await {
            error!("Table task failed: {}", e);
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr, table: TableHandle) {
        let clients = self.clients.clone();
        let outbound_capacity = self.config.outbound_capacity;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(outbound_capacity);
            let player_id = PlayerId::random();

            // Subscribe before joining so our own join is not missed.
            let mut events = table.subscribe();

            if !Self::seat(&table, player_id, &msg_tx).await {
                return;
            }

            {
                let mut clients = clients.write().await;
                clients.insert(addr, ConnectedClient {
                    player_id,
                    connected_at: Instant::now(),
                });
            }

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                Self::handle_client_text(player_id, &text, &table, &msg_tx).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    event = events.recv() => {
                        if !Self::handle_room_event(player_id, event, &table, &msg_tx).await {
                            break;
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Cleanup
            Self::unseat(&table, player_id).await;
            drop(msg_tx);
            if tokio::time::timeout(Duration::from_secs(1), sender_task).await.is_err() {
                debug!("Sender for {} did not drain in time", addr);
            }

            let mut clients = clients.write().await;
            if let Some(client) = clients.remove(&addr) {
                info!(
                    "Client {} ({}) cleaned up after {:?}",
                    addr,
                    client.player_id.short(),
                    client.connected_at.elapsed()
                );
            }
        });
    }

    /// Tell a connection over the limit why it is being closed.
    async fn reject_connection(stream: TcpStream, addr: SocketAddr) {
        let mut ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                debug!("Handshake with rejected client {} failed: {}", addr, e);
                return;
            }
        };

        let msg = ServerMessage::Error(ServerError {
            code: ErrorCode::ServerOverloaded,
            message: "Connection limit reached".to_string(),
        });
        if let Ok(text) = msg.to_json() {
            let _ = ws_stream.send(Message::Text(text)).await;
        }
        let _ = ws_stream.close(None).await;
    }

    /// Forward one table event to the connection.
    ///
    /// Returns `false` when the connection should close.
    async fn handle_room_event(
        player_id: PlayerId,
        event: Result<RoomEvent, broadcast::error::RecvError>,
        table: &TableHandle,
        sender: &mpsc::Sender<ServerMessage>,
    ) -> bool {
        match event {
            Ok(RoomEvent::Reset) => {
                let _ = sender.send(ServerMessage::Reset).await;
                // Everyone was unseated; sit this connection down again.
                Self::seat(table, player_id, sender).await
            }
            Ok(event) => sender.send(event.into()).await.is_ok(),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Player {} lagged, skipped {} events", player_id.short(), skipped);
                // A skipped reset would leave us unseated. Joining is a no-op
                // for a seated player, then a snapshot resyncs the client.
                if !Self::seat(table, player_id, sender).await {
                    return false;
                }
                match table.snapshot().await {
                    Ok(snapshot) => sender.send(ServerMessage::State(snapshot)).await.is_ok(),
                    Err(e) => {
                        error!("Snapshot for {} failed: {}", player_id.short(), e);
                        false
                    }
                }
            }
            Err(broadcast::error::RecvError::Closed) => {
                let _ = sender.send(ServerMessage::Shutdown {
                    reason: "Table closed".to_string(),
                }).await;
                false
            }
        }
    }

    /// Leave the table on disconnect, returning the final record.
    async fn unseat(table: &TableHandle, player_id: PlayerId) -> Option<Player> {
        match table.send(RoomCommand::Leave { player_id }).await {
            Ok(CommandReply::Left(player)) => {
                if let Some(player) = &player {
                    debug!(player = %player_id.short(), balance = player.balance, "Unseated");
                }
                player
            }
            Ok(other) => {
                error!("Unexpected leave reply: {:?}", other);
                None
            }
            Err(e) => {
                debug!("Leave for {} not applied: {}", player_id.short(), e);
                None
            }
        }
    }

    /// Join the table and send the player their identity.
    async fn seat(
        table: &TableHandle,
        player_id: PlayerId,
        sender: &mpsc::Sender<ServerMessage>,
    ) -> bool {
        match table.send(RoomCommand::Join { player_id }).await {
            Ok(CommandReply::Joined(player)) => {
                let _ = sender.send(ServerMessage::Identity(player)).await;
                true
            }
            Ok(other) => {
                error!("Unexpected join reply: {:?}", other);
                false
            }
            Err(e) => {
                error!("Failed to seat {}: {}", player_id.short(), e);
                false
            }
        }
    }

    /// Decode and handle one text frame.
    async fn handle_client_text(
        player_id: PlayerId,
        text: &str,
        table: &TableHandle,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        let msg = match ClientMessage::from_json(text) {
            Ok(m) => m,
            Err(e) => {
                debug!("Invalid message from {}: {}", player_id.short(), e);
                // A malformed bet still deserves a bet error so the client can undo it.
                let reply = if Self::is_bet_frame(text) {
                    ServerMessage::BetError { message: format!("Invalid bet: {}", e) }
                } else {
                    ServerMessage::Error(ServerError {
                        code: ErrorCode::InvalidInput,
                        message: "Invalid message format".to_string(),
                    })
                };
                let _ = sender.send(reply).await;
                return;
            }
        };

        Self::handle_client_message(player_id, msg, table, sender).await;
    }

    /// Whether a frame is tagged as a bet placement.
    fn is_bet_frame(text: &str) -> bool {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
            return false;
        };
        matches!(
            value.get("type").and_then(serde_json::Value::as_str),
            Some("place_bet" | "place_announced")
        )
    }

    /// Handle a client message.
    async fn handle_client_message(
        player_id: PlayerId,
        msg: ClientMessage,
        table: &TableHandle,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        if let ClientMessage::Ping { timestamp } = msg {
            let _ = sender.send(ServerMessage::Pong {
                timestamp,
                server_time: chrono::Utc::now().timestamp_millis(),
            }).await;
            return;
        }

        let Some(command) = msg.to_command(player_id) else {
            return;
        };
        if matches!(command, RoomCommand::ResetTable) {
            info!("Table reset requested by {}", player_id.short());
        }

        match table.send(command).await {
            Ok(CommandReply::Rejected(e)) => {
                debug!("Rejected request from {}: {}", player_id.short(), e);
                let _ = sender.send(ServerMessage::BetError { message: e.to_string() }).await;
            }
            Ok(_) => {}
            Err(e) => {
                let _ = sender.send(ServerMessage::Error(ServerError {
                    code: ErrorCode::InternalError,
                    message: e.to_string(),
                })).await;
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
