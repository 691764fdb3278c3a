//! Server network layer: listener, accept loop and task wiring

use crate::authority::{Authority, DEFAULT_TICK_PERIOD};
use crate::connection;
use crate::error::ServerError;
use crate::events::{self, ConnectionId, DEFAULT_QUEUE_CAPACITY};
use log::{debug, info, warn};
use shared::GameConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Network and scheduling settings for one server instance
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request path accepted for the WebSocket upgrade.
    pub path: String,
    pub tick_period: Duration,
    pub queue_capacity: usize,
    /// Frames buffered per connection before broadcasts to it are skipped.
    pub outbound_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            path: "/ws".to_string(),
            tick_period: DEFAULT_TICK_PERIOD,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            outbound_capacity: 16,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accepts connections and feeds them to the simulation authority
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    game: GameConfig,
}

impl Server {
    /// Binds the listener. This is the only failure that is fatal to the server.
    pub async fn new(config: ServerConfig, game: GameConfig) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        info!(
            "Server listening on ws://{}{}",
            listener.local_addr()?,
            config.path
        );

        Ok(Server {
            listener,
            config,
            game,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Starts the simulation and accepts connections forever
    ///
    /// Every connection gets its own reader and writer task. Accept errors
    /// are logged and retried.
    pub async fn run(self) -> Result<(), ServerError> {
        let (event_tx, event_rx) = events::channel(self.config.queue_capacity);

        let authority = Authority::new(self.game, self.config.tick_period, event_tx.downgrade());
        tokio::spawn(authority.run(event_rx));

        let path: Arc<str> = Arc::from(self.config.path.as_str());
        let mut next_id: u64 = 1;

        info!("Server started successfully");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let conn = ConnectionId(next_id);
                    next_id += 1;

                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("Could not disable Nagle for {}: {}", addr, e);
                    }

                    debug!("Accepted {} as connection {}", addr, conn);
                    tokio::spawn(connection::serve(
                        stream,
                        addr,
                        conn,
                        Arc::clone(&path),
                        event_tx.clone(),
                        self.config.outbound_capacity,
                    ));
                }
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}
