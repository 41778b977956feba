//! # Snake Battle Server Library
//!
//! Authoritative server for a two-player snake match over TCP. The server owns
//! the only real copy of the game: clients send direction requests, the server
//! decides what happens and streams the result back on every tick.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Each tick drains at most one queued heading per player, moves both snakes,
//! evaluates collisions against a consistent pre-shrink snapshot, resolves food
//! and growth, and tracks the round. Once a round ends the match restarts by
//! itself after a grace delay.
//!
//! ### Connection Handling
//! Every player gets a reader task and a writer task. The reader parses
//! newline-delimited JSON commands and answers pings directly, without
//! touching the simulation lock. A malformed frame or a closed socket ends that
//! player's connection only; the snake keeps its last heading.
//!
//! ### State Broadcasting
//! After every tick the full state is serialized once and queued to each
//! connected player. A failed send drops that recipient and nothing else.
//!
//! ## Module Organization
//!
//! - [`command_queue`]: FIFO of pending headings per player
//! - [`game`]: the [`game::World`] aggregate, tick algorithm and restart timer
//! - [`connection`]: per-player reader/writer tasks
//! - [`broadcaster`]: fan-out of state frames
//! - [`network`]: accept loop and fixed-rate server loop
//! - [`config`], [`error`]: startup settings and error types
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!
//!     // Blocks until two players connect, then ticks forever
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod broadcaster;
pub mod command_queue;
pub mod config;
pub mod connection;
pub mod error;
pub mod game;
pub mod network;
pub mod utils;
