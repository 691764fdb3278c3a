//! Per-connection reader and writer tasks
//!
//! Each accepted socket gets two tasks. The reader decodes client frames
//! into events and never touches game state. The writer drains the
//! connection's own outbound queue, so a slow client only ever delays itself.

use crate::events::{ConnectionHandle, ConnectionId, EventSender, GameEvent};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::decode_input;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsStream = SplitStream<WebSocketStream<TcpStream>>;

/// Why a reader stopped.
#[derive(Debug, PartialEq, Eq)]
enum ReadEnd {
    /// The transport failed or the peer closed; a Leave must be sent.
    Disconnected(String),
    /// The authority already dropped this connection.
    Shutdown,
    /// The event queue is gone, the server is stopping.
    QueueClosed,
}

/// Upgrades a socket and runs its reader until the connection ends
///
/// Emits `Join` before the first read and exactly one `Leave` if reading
/// fails. Malformed frames are logged and skipped.
pub async fn serve(
    stream: TcpStream,
    addr: SocketAddr,
    conn: ConnectionId,
    path: Arc<str>,
    events: EventSender,
    outbound_capacity: usize,
) {
    let check_path = move |request: &Request, response: Response| {
        if request.uri().path() == &*path {
            Ok(response)
        } else {
            let mut rejection = ErrorResponse::new(Some(format!(
                "no websocket endpoint at {}",
                request.uri().path()
            )));
            *rejection.status_mut() = StatusCode::NOT_FOUND;
            Err(rejection)
        }
    };

    let ws = match accept_hdr_async(stream, check_path).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let (sink, mut stream) = ws.split();
    let (outbound, outbound_rx) = mpsc::channel(outbound_capacity.max(1));
    let (shutdown, mut shutdown_rx) = oneshot::channel();

    tokio::spawn(write_loop(conn, sink, outbound_rx));

    let handle = ConnectionHandle {
        addr,
        outbound,
        shutdown,
    };
    if events.send(GameEvent::Join { conn, handle }).await.is_err() {
        return;
    }

    match read_loop(conn, &mut stream, &events, &mut shutdown_rx).await {
        ReadEnd::Disconnected(reason) => {
            info!("Connection {} from {} disconnected: {}", conn, addr, reason);
            let _ = events.send(GameEvent::Leave { conn }).await;
        }
        ReadEnd::Shutdown => debug!("Reader for connection {} stopped by server", conn),
        ReadEnd::QueueClosed => debug!("Event queue closed, reader {} exiting", conn),
    }
}

async fn read_loop(
    conn: ConnectionId,
    stream: &mut WsStream,
    events: &EventSender,
    shutdown: &mut oneshot::Receiver<()>,
) -> ReadEnd {
    loop {
        let frame = tokio::select! {
            _ = &mut *shutdown => return ReadEnd::Shutdown,
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Binary(bytes))) => match decode_input(&bytes) {
                Ok(input) => {
                    if events.send(GameEvent::Input { conn, input }).await.is_err() {
                        return ReadEnd::QueueClosed;
                    }
                }
                Err(e) => warn!("Dropping malformed frame from connection {}: {}", conn, e),
            },
            Some(Ok(Message::Close(_))) => return ReadEnd::Disconnected("closed by peer".into()),
            Some(Ok(other)) => debug!("Ignoring non-binary frame from {}: {:?}", conn, other),
            Some(Err(e)) => return ReadEnd::Disconnected(e.to_string()),
            None => return ReadEnd::Disconnected("stream ended".into()),
        }
    }
}

/// Sends queued frames until the authority drops the queue or a write fails
///
/// Returning drops the receiver, which the authority reads as a dead
/// write path on its next broadcast.
async fn write_loop(conn: ConnectionId, mut sink: WsSink, mut outbound: mpsc::Receiver<Message>) {
    while let Some(message) = outbound.recv().await {
        if let Err(e) = sink.send(message).await {
            warn!("Write to connection {} failed: {}", conn, e);
            return;
        }
    }

    if let Err(e) = sink.close().await {
        debug!("Closing connection {} failed: {}", conn, e);
    }
}
