//! Server settings fixed at startup.

use clap::ValueEnum;
use shared::{DEFAULT_HOST, DEFAULT_PORT};
use std::time::Duration;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_RESPAWN_DELAY: Duration = Duration::from_secs(3);

/// How the per-player `pontos` counter evolves. Exactly one policy is active per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ScoringPolicy {
    /// One point per food eaten; counters go back to zero on every restart.
    #[default]
    Points,
    /// One win for the sole survivor of a round; counters are never reset.
    Wins,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tick_interval: Duration,
    /// Time between a round ending and the automatic restart.
    pub respawn_delay: Duration,
    pub scoring: ScoringPolicy,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tick_interval: DEFAULT_TICK_INTERVAL,
            respawn_delay: DEFAULT_RESPAWN_DELAY,
            scoring: ScoringPolicy::default(),
        }
    }
}
