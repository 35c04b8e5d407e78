//! Table Actor
//!
//! One task owns the [`Room`]. Connection handlers submit commands over
//! an mpsc channel and wait on a oneshot reply; the same task runs the
//! interval ticker, so commands and ticks never interleave. Every event
//! the room emits is published on a broadcast channel.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::core::rng::OutcomeSource;
use crate::game::command::{CommandReply, RoomCommand};
use crate::game::events::RoomEvent;
use crate::game::room::{Room, TableConfig};
use crate::game::state::TableSnapshot;

/// Table actor configuration.
#[derive(Debug, Clone)]
pub struct TableSettings {
    /// Room configuration.
    pub table: TableConfig,
    /// Wall-clock length of one tick.
    pub tick_interval: Duration,
    /// Pending command capacity.
    pub command_capacity: usize,
    /// Broadcast buffer per subscriber.
    pub event_capacity: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            table: TableConfig::default(),
            tick_interval: Duration::from_secs(1),
            command_capacity: 256,
            event_capacity: 256,
        }
    }
}

/// Table handle errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TableError {
    /// The actor has stopped.
    #[error("Table is closed")]
    Closed,
}

enum TableRequest {
    Command {
        command: RoomCommand,
        reply: oneshot::Sender<CommandReply>,
    },
    Snapshot {
        reply: oneshot::Sender<TableSnapshot>,
    },
}

/// Cloneable handle to a running table.
#[derive(Clone)]
pub struct TableHandle {
    requests: mpsc::Sender<TableRequest>,
    events: broadcast::Sender<RoomEvent>,
}

impl TableHandle {
    /// Apply a command and wait for its reply.
    pub async fn send(&self, command: RoomCommand) -> Result<CommandReply, TableError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(TableRequest::Command { command, reply })
            .await
            .map_err(|_| TableError::Closed)?;
        rx.await.map_err(|_| TableError::Closed)
    }

    /// Current table state.
    pub async fn snapshot(&self) -> Result<TableSnapshot, TableError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(TableRequest::Snapshot { reply })
            .await
            .map_err(|_| TableError::Closed)?;
        rx.await.map_err(|_| TableError::Closed)
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.events.subscribe()
    }

    /// Whether the actor is still running.
    pub fn is_open(&self) -> bool {
        !self.requests.is_closed()
    }
}

/// Start a table on the current runtime.
///
/// The actor stops when every handle is dropped or `shutdown` fires; the
/// returned task handle resolves once its ticker is released.
pub fn spawn_table<W>(
    settings: TableSettings,
    wheel: W,
    shutdown: broadcast::Receiver<()>,
) -> (TableHandle, JoinHandle<()>)
where
    W: OutcomeSource + 'static,
{
    let (requests_tx, requests_rx) = mpsc::channel(settings.command_capacity);
    let (events_tx, _) = broadcast::channel(settings.event_capacity);

    let handle = TableHandle {
        requests: requests_tx,
        events: events_tx.clone(),
    };

    let actor = TableActor {
        room: Room::new(settings.table.clone()),
        wheel,
        events: events_tx,
        tick_interval: settings.tick_interval,
    };
    let task = tokio::spawn(actor.run(requests_rx, shutdown));

    (handle, task)
}

struct TableActor<W> {
    room: Room,
    wheel: W,
    events: broadcast::Sender<RoomEvent>,
    tick_interval: Duration,
}

impl<W: OutcomeSource> TableActor<W> {
    fn ticker(&self) -> Interval {
        // First tick one full period from now, not immediately.
        let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    async fn run(
        mut self,
        mut requests: mpsc::Receiver<TableRequest>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!(
            tick_ms = self.tick_interval.as_millis() as u64,
            betting_ticks = self.room.config().betting_ticks,
            "Table started"
        );
        let mut ticker = self.ticker();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.room.advance(&mut self.wheel) {
                        warn!(error = %e, "Tick failed, retrying settlement next tick");
                    }
                    self.publish();
                }
                request = requests.recv() => {
                    let Some(request) = request else {
                        debug!("All table handles dropped");
                        break;
                    };
                    match request {
                        TableRequest::Command { command, reply } => {
                            let reset = matches!(command, RoomCommand::ResetTable);
                            let outcome = self.room.dispatch(command);
                            if reset {
                                // Restart the clock so the new round gets its full countdown.
                                ticker = self.ticker();
                            }
                            self.publish();
                            let _ = reply.send(outcome);
                        }
                        TableRequest::Snapshot { reply } => {
                            let _ = reply.send(self.room.snapshot());
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Table shutting down");
                    break;
                }
            }
        }

        drop(ticker);
        info!(round = self.room.round(), players = self.room.player_count(), "Table stopped");
    }

    fn publish(&mut self) {
        for event in self.room.drain_events() {
            // No subscribers is fine; the next snapshot resyncs late joiners.
            let _ = self.events.send(event);
        }
    }
}
