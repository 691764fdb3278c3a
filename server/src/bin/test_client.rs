//! Headless client for poking at a running server.
//!
//! Connects, sends a burst of paddle commands for one player and logs every
//! world state the server broadcasts.

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use shared::{decode_state, encode_input, ClientInput, Command};
use std::time::Duration;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Request path for the WebSocket upgrade
    #[arg(long, default_value = "/ws")]
    path: String,

    /// Player number to claim in every input
    #[arg(long, default_value = "1")]
    player: u8,

    /// Number of commands to send before disconnecting
    #[arg(short = 'n', long, default_value = "40")]
    commands: u32,

    /// Milliseconds between commands
    #[arg(short = 'i', long, default_value = "50")]
    interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let url = format!("ws://{}{}", args.server, args.path);

    info!("Connecting to {}", url);
    let (ws, _) = connect_async(url.as_str()).await?;
    let (mut sink, mut stream) = ws.split();

    let reader = tokio::spawn(async move {
        let mut received: u64 = 0;
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Binary(bytes)) => match decode_state(&bytes) {
                    Ok(state) => {
                        received += 1;
                        if received % 16 == 0 {
                            info!(
                                "paddles ({:.0}, {:.0}) ball ({:.1}, {:.1})",
                                state.paddle1_y, state.paddle2_y, state.ball_x, state.ball_y
                            );
                        }
                    }
                    Err(e) => warn!("Undecodable state: {}", e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Read failed: {}", e);
                    break;
                }
            }
        }
        received
    });

    // Sweep up then down so the paddle visibly travels
    for i in 0..args.commands {
        let command = if (i / 10) % 2 == 0 {
            Command::Up
        } else {
            Command::Down
        };
        let frame = encode_input(&ClientInput {
            command,
            player: args.player,
        })?;
        sink.send(Message::Binary(frame)).await?;
        sleep(Duration::from_millis(args.interval_ms)).await;
    }

    info!("Sent {} commands, disconnecting", args.commands);
    sink.close().await?;

    let received = reader.await?;
    info!("Received {} state updates", received);

    Ok(())
}
