use clap::Parser;
use log::{error, info};
use server::config::{ScoringPolicy, ServerConfig};
use server::network::Server;
use shared::{DEFAULT_HOST, DEFAULT_PORT};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Milliseconds between simulation ticks
    #[arg(short, long, default_value = "500", value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Seconds to wait after a round ends before respawning
    #[arg(long, default_value = "3")]
    respawn_secs: u64,

    /// Scoring policy: points per food eaten, or wins across rounds
    #[arg(long, value_enum, default_value_t = ScoringPolicy::Points)]
    scoring: ScoringPolicy,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            tick_interval: Duration::from_millis(args.tick_ms),
            respawn_delay: Duration::from_secs(args.respawn_secs),
            scoring: args.scoring,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig::from(args);

    info!("Starting snake battle server...");
    info!(
        "Tick: {:?}, respawn delay: {:?}, scoring: {:?}",
        config.tick_interval, config.respawn_delay, config.scoring
    );
    info!("Waiting for 2 players");

    let server = Server::bind(config).await?;

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
