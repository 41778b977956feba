//! Server loop: accepts both players, then ticks and broadcasts at a fixed rate

use crate::broadcaster::Broadcaster;
use crate::config::ServerConfig;
use crate::connection::{self, SharedWorld};
use crate::error::ServerError;
use crate::game::World;
use log::{debug, info, warn};
use shared::PLAYER_IDS;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};

/// Authoritative server owning the listener and the shared world
pub struct Server {
    listener: TcpListener,
    world: SharedWorld,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let address = config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(ServerError::Bind)?;
        info!("Server listening on {}", address);

        let world = Arc::new(Mutex::new(World::new(
            config.scoring,
            config.respawn_delay,
        )));

        Ok(Server {
            listener,
            world,
            config,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn world(&self) -> SharedWorld {
        Arc::clone(&self.world)
    }

    /// Waits for exactly two players, assigning ids in accept order
    async fn accept_players(&self) -> Result<Broadcaster, ServerError> {
        let mut broadcaster = Broadcaster::new();

        for id in PLAYER_IDS {
            let (stream, addr) = self.listener.accept().await.map_err(ServerError::Accept)?;
            if let Err(e) = stream.set_nodelay(true) {
                warn!("Could not disable Nagle for {}: {}", addr, e);
            }
            info!("Player {} connected from {}", id, addr);

            match connection::open(stream, id, self.world()) {
                Ok(connection) => broadcaster.add(connection),
                Err(e) => warn!("Player {} dropped before the match started: {}", id, e),
            }
        }

        Ok(broadcaster)
    }

    /// Runs the match forever once both players are in
    ///
    /// Each tick holds the world lock only while advancing the simulation and
    /// taking the snapshot; sending happens after the guard is released.
    pub async fn run(self) -> Result<(), ServerError> {
        let mut broadcaster = self.accept_players().await?;
        let Server {
            listener,
            world,
            config,
        } = self;
        drop(listener);
        info!(
            "Both players connected, ticking every {:?}",
            config.tick_interval
        );

        let mut tick_interval = interval(config.tick_interval);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            let (tick, snapshot) = {
                let mut world = world.lock().await;
                let report = world.tick(Instant::now());
                if !report.died.is_empty() {
                    info!("Players {:?} crashed", report.died);
                }
                (world.tick_count(), world.snapshot())
            };

            let delivered = broadcaster.broadcast(&snapshot);

            // Periodic summary
            if tick % 20 == 0 {
                debug!("Tick {}: state sent to {} players", tick, delivered);
            }
        }
    }
}
