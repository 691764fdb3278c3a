use clap::Parser;
use log::{error, info};
use server::network::{Server, ServerConfig};
use shared::GameConfig;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Request path for the WebSocket upgrade
    #[arg(long, default_value = "/ws")]
    path: String,

    /// Milliseconds between physics ticks
    #[arg(short, long, default_value = "15")]
    tick_ms: u64,

    /// Maximum queued events before readers wait
    #[arg(long, default_value = "100")]
    queue_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        path: args.path,
        tick_period: Duration::from_millis(args.tick_ms.max(1)),
        queue_capacity: args.queue_capacity,
        ..ServerConfig::default()
    };

    info!("Starting pong server...");
    let server = Server::new(config, GameConfig::default()).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}
