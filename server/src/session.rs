//! Player slot bookkeeping for the two-player server
//!
//! This module decides which connection controls which paddle:
//! - Slots are handed out lowest-first, so arrivals fill slot 1 then slot 2
//! - Connections beyond two wait in line and never alias an existing slot
//! - A freed slot goes to the longest-waiting connection, if any
//!
//! The registry is keyed by connection identity, never by position, so a
//! disconnect cannot shift another player into a different slot.

use crate::events::ConnectionId;
use log::info;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Number of authoritative player slots.
pub const MAX_SLOTS: usize = 2;

/// One of the two paddles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    pub const ALL: [Slot; MAX_SLOTS] = [Slot::One, Slot::Two];

    /// Player number as used on the wire (1 or 2).
    pub fn number(&self) -> u8 {
        match self {
            Slot::One => 1,
            Slot::Two => 2,
        }
    }
}

impl TryFrom<u8> for Slot {
    type Error = u8;

    fn try_from(player: u8) -> Result<Self, Self::Error> {
        match player {
            1 => Ok(Slot::One),
            2 => Ok(Slot::Two),
            other => Err(other),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.number())
    }
}

/// Maps live connections to player slots
///
/// Connections that arrive while both slots are held are kept in a FIFO
/// waiting line. They stay registered (and keep receiving broadcasts) but
/// own no paddle until [`SessionRegistry::promote_waiting`] hands them one.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ConnectionId, Slot>,
    waiting: VecDeque<ConnectionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection
    ///
    /// Returns the slot it now owns, or `None` if both slots are taken and
    /// the connection was queued. Assigning an already known connection
    /// returns its current state without changing anything.
    pub fn assign(&mut self, conn: ConnectionId) -> Option<Slot> {
        if let Some(slot) = self.sessions.get(&conn) {
            return Some(*slot);
        }
        if self.waiting.contains(&conn) {
            return None;
        }

        // Someone already waiting has priority over this arrival
        match self.free_slot().filter(|_| self.waiting.is_empty()) {
            Some(slot) => {
                self.sessions.insert(conn, slot);
                info!("Connection {} assigned {}", conn, slot);
                Some(slot)
            }
            None => {
                self.waiting.push_back(conn);
                info!(
                    "Connection {} waiting for a slot ({} in line)",
                    conn,
                    self.waiting.len()
                );
                None
            }
        }
    }

    /// Removes a connection, returning the slot it held
    ///
    /// Unknown connections are ignored. A waiting connection is simply
    /// taken out of line.
    pub fn release(&mut self, conn: ConnectionId) -> Option<Slot> {
        if let Some(slot) = self.sessions.remove(&conn) {
            info!("Connection {} released {}", conn, slot);
            return Some(slot);
        }
        self.waiting.retain(|waiting| *waiting != conn);
        None
    }

    /// Moves the longest-waiting connection into a free slot, if both exist.
    pub fn promote_waiting(&mut self) -> Option<(ConnectionId, Slot)> {
        let slot = self.free_slot()?;
        let conn = self.waiting.pop_front()?;
        self.sessions.insert(conn, slot);
        info!("Connection {} promoted to {}", conn, slot);
        Some((conn, slot))
    }

    pub fn slot_of(&self, conn: ConnectionId) -> Option<Slot> {
        self.sessions.get(&conn).copied()
    }

    /// Number of occupied slots
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_full(&self) -> bool {
        self.sessions.len() >= MAX_SLOTS
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    fn free_slot(&self) -> Option<Slot> {
        Slot::ALL
            .into_iter()
            .find(|slot| !self.sessions.values().any(|taken| taken == slot))
    }
}
