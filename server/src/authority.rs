//! Single-writer simulation loop
//!
//! The [`Authority`] owns the game state, the session registry and the
//! write handles of every connection. Nothing else touches them: connection
//! tasks talk to it only through the event queue, and it talks back only by
//! pushing encoded frames into per-connection outbound queues.

use crate::events::{ConnectionHandle, ConnectionId, EventReceiver, GameEvent};
use crate::game::GameState;
use crate::session::{SessionRegistry, Slot, MAX_SLOTS};
use log::{debug, info, warn};
use shared::{encode_state, ClientInput, GameConfig};
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

/// Default tick period, roughly 64 Hz.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(15);

/// How often tick statistics are logged.
const STATS_EVERY_TICKS: u64 = 64;

struct Peer {
    handle: ConnectionHandle,
    /// A Leave has already been queued for this peer after a failed write.
    leaving: bool,
}

pub struct Authority {
    game: GameState,
    sessions: SessionRegistry,
    peers: HashMap<ConnectionId, Peer>,
    tick_period: Duration,
    // Weak so the queue still closes once every connection task is gone
    events: mpsc::WeakSender<GameEvent>,
}

/// Decides whose paddle an input moves
///
/// With both slots taken the sender's own slot is used and the claimed
/// player is ignored, so nobody can steer the opponent. With fewer players
/// the claim is trusted, which lets a single client drive both paddles.
/// Connections without a slot never move anything.
pub fn resolve_slot(sessions: &SessionRegistry, conn: ConnectionId, claimed: u8) -> Option<Slot> {
    let owned = sessions.slot_of(conn)?;
    if sessions.is_full() {
        Some(owned)
    } else {
        Slot::try_from(claimed).ok()
    }
}

impl Authority {
    pub fn new(
        config: GameConfig,
        tick_period: Duration,
        events: mpsc::WeakSender<GameEvent>,
    ) -> Self {
        Self {
            game: GameState::new(config),
            sessions: SessionRegistry::new(),
            peers: HashMap::new(),
            tick_period,
            events,
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Number of connections that currently receive broadcasts.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Runs until the event queue closes
    ///
    /// Each wake-up either applies one queued event or runs one tick. A tick
    /// first applies whatever was already queued when it fired, so the step
    /// never runs ahead of input that arrived before it.
    pub async fn run(mut self, mut events: EventReceiver) {
        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Simulation running at {:.1}Hz",
            1.0 / self.tick_period.as_secs_f32()
        );

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            info!("Event queue closed, stopping simulation");
                            break;
                        }
                    }
                },
                _ = ticker.tick() => {
                    self.drain_queued(&mut events);
                    self.tick();
                }
            }
        }
    }

    /// Applies the events queued so far, leaving later arrivals for the next wake-up.
    fn drain_queued(&mut self, events: &mut EventReceiver) {
        for _ in 0..events.len() {
            match events.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(_) => break,
            }
        }
    }

    pub fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Join { conn, handle } => self.handle_join(conn, handle),
            GameEvent::Leave { conn } => self.handle_leave(conn),
            GameEvent::Input { conn, input } => self.handle_input(conn, input),
        }
    }

    fn handle_join(&mut self, conn: ConnectionId, handle: ConnectionHandle) {
        info!("Connection {} joined from {}", conn, handle.addr);
        self.peers.insert(
            conn,
            Peer {
                handle,
                leaving: false,
            },
        );

        if self.sessions.assign(conn).is_none() {
            warn!(
                "Both slots taken, connection {} will only receive state",
                conn
            );
        }
    }

    fn handle_leave(&mut self, conn: ConnectionId) {
        let peer = self.peers.remove(&conn);
        let released = self.sessions.release(conn);

        let Some(peer) = peer else {
            debug!("Ignoring leave for unknown connection {}", conn);
            return;
        };

        // Stops the reader; dropping the outbound sender stops the writer
        let _ = peer.handle.shutdown.send(());
        drop(peer.handle.outbound);

        if released.is_some() {
            self.sessions.promote_waiting();
        }

        info!(
            "Connection {} left ({}/{} slots held, {} waiting)",
            conn,
            self.sessions.count(),
            MAX_SLOTS,
            self.sessions.waiting_len()
        );
    }

    fn handle_input(&mut self, conn: ConnectionId, input: ClientInput) {
        if !self.peers.contains_key(&conn) {
            debug!("Dropping input from departed connection {}", conn);
            return;
        }

        match resolve_slot(&self.sessions, conn, input.player) {
            Some(slot) => self.game.apply_command(slot, input.command),
            None => debug!(
                "Dropping {} from connection {} (claimed player {})",
                input.command, conn, input.player
            ),
        }
    }

    /// Advances physics by one tick and broadcasts the result.
    pub fn tick(&mut self) {
        self.game.update_physics();
        self.broadcast();

        if self.game.tick % STATS_EVERY_TICKS == 0 && !self.peers.is_empty() {
            debug!(
                "Tick {}: {} connections, {} slots held, {} waiting",
                self.game.tick,
                self.peers.len(),
                self.sessions.count(),
                self.sessions.waiting_len()
            );
        }
    }

    /// Encodes the world once and queues it for every connection
    ///
    /// Never waits on a connection. A full outbound queue drops this frame
    /// for that connection only; a closed one means its writer failed and
    /// the connection is scheduled to leave.
    fn broadcast(&mut self) {
        if self.peers.is_empty() {
            return;
        }

        let payload = match encode_state(&self.game.world) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Skipping broadcast for tick {}: {}", self.game.tick, e);
                return;
            }
        };

        let mut failed = Vec::new();
        for (conn, peer) in self.peers.iter_mut() {
            match peer.handle.outbound.try_send(Message::Binary(payload.clone())) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    debug!("Connection {} is slow, skipping tick {}", conn, self.game.tick);
                }
                Err(TrySendError::Closed(_)) => {
                    if !peer.leaving {
                        peer.leaving = true;
                        failed.push(*conn);
                    }
                }
            }
        }

        for conn in failed {
            warn!("Write path to connection {} is gone, scheduling leave", conn);
            self.schedule_leave(conn);
        }
    }

    fn schedule_leave(&mut self, conn: ConnectionId) {
        match self.events.upgrade() {
            Some(events) => {
                // The authority is the queue's consumer, so it must not wait on it here
                tokio::spawn(async move {
                    let _ = events.send(GameEvent::Leave { conn }).await;
                });
            }
            None => self.handle_leave(conn),
        }
    }
}
