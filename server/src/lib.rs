//! # Pong Server Library
//!
//! This library provides the authoritative server for a two-player paddle
//! game played over WebSockets. It owns the one true world state, applies
//! player commands, runs the ball physics on a fixed clock and broadcasts
//! the result to every connected client.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the definitive ball physics. Clients only send paddle
//! commands and draw whatever state the server sends back.
//!
//! ### Slot Management
//! Connections are anonymous. The first two to arrive become player 1 and
//! player 2; later arrivals wait in line and take over a slot when a player
//! leaves.
//!
//! ### State Broadcasting
//! After every tick the world is encoded once and queued for every
//! connection.
//!
//! ## Architecture Design
//!
//! ### Single Writer
//! All mutations go through one bounded event queue drained by a single
//! task, the authority. World state and the session table have exactly one
//! owner, so no locks guard them.
//!
//! ```text
//!  reader task (per connection) ──Join/Input/Leave──▶ event queue
//!                                                         │
//!                                   ticker ──────────▶ authority ──▶ physics
//!                                                         │
//!  writer task (per connection) ◀──── encoded state ──────┘
//! ```
//!
//! ### Trust Boundary
//! Clients claim a player number in every input. Once both slots are
//! taken the claim is ignored and the sender's own slot is used; before
//! that the claim is trusted so one client can drive both paddles.
//!
//! ### Backpressure
//! A full event queue makes readers wait, throttling only the connection
//! that is flooding. A full outbound queue makes the authority skip that
//! connection's frame for the tick instead of waiting on it.
//!
//! ## Module Organization
//!
//! - `session`: slot assignment, release and the waiting line
//! - `events`: the event type and queue
//! - `physics`: ball integration, bounces, paddle hits and scoring
//! - `game`: owned state and paddle movement
//! - `authority`: the single-writer loop, dispatch and broadcast
//! - `connection`: per-connection reader and writer tasks
//! - `network`: listener, accept loop and configuration
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//! use shared::GameConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new(ServerConfig::default(), GameConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod authority;
pub mod connection;
pub mod error;
pub mod events;
pub mod game;
pub mod network;
pub mod physics;
pub mod session;
