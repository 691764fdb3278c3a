//! Events flowing from connection tasks into the simulation authority
//!
//! Every change to world state or to the session table starts life as a
//! [`GameEvent`] pushed onto one bounded FIFO. The authority is the only
//! consumer, so events are applied strictly in the order they were enqueued.

use shared::ClientInput;
use std::fmt;
use std::net::SocketAddr;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

/// Queue capacity used when none is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Server-assigned identity of one accepted connection
///
/// Identities are never reused during a process lifetime, so a late event
/// from a connection that already left can never be mistaken for a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handles the authority keeps for a joined connection
///
/// Dropping this value tears the connection down: the writer task sees its
/// queue close and sends a close frame, the reader task sees `shutdown`
/// resolve and stops reading.
#[derive(Debug)]
pub struct ConnectionHandle {
    pub addr: SocketAddr,
    pub outbound: mpsc::Sender<Message>,
    pub shutdown: oneshot::Sender<()>,
}

#[derive(Debug)]
pub enum GameEvent {
    Join {
        conn: ConnectionId,
        handle: ConnectionHandle,
    },
    Leave {
        conn: ConnectionId,
    },
    Input {
        conn: ConnectionId,
        input: ClientInput,
    },
}

pub type EventSender = mpsc::Sender<GameEvent>;
pub type EventReceiver = mpsc::Receiver<GameEvent>;

/// Creates the event queue. Producers wait when it is full.
pub fn channel(capacity: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(capacity.max(1))
}
