use crate::connection::Connection;
use crate::error::ConnectionError;
use log::{debug, error, warn};
use shared::ServerMessage;
#[cfg(test)]
use shared::PlayerId;

/// Fans a frame out to every player still connected
///
/// A recipient whose writer has gone away is logged once and forgotten; the
/// other recipients are unaffected. A recipient that is not keeping up misses
/// frames until its queue drains, since every state supersedes the last.
#[derive(Debug, Default)]
pub struct Broadcaster {
    recipients: Vec<Connection>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, connection: Connection) {
        self.recipients.push(connection);
    }

    #[cfg(test)]
    fn recipient_ids(&self) -> Vec<PlayerId> {
        self.recipients.iter().map(|connection| connection.id).collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.recipients.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Encodes `message` once and queues it for every recipient. Returns how many are still connected.
    pub fn broadcast(&mut self, message: &ServerMessage) -> usize {
        let line = match message.encode() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to encode broadcast: {}", e);
                return 0;
            }
        };

        self.recipients.retain(|connection| match connection.send(line.clone()) {
            Ok(()) => true,
            Err(ConnectionError::Full) => {
                debug!("Player {} is lagging, skipped a frame", connection.id);
                true
            }
            Err(e) => {
                warn!("Failed to send state to player {}: {}", connection.id, e);
                false
            }
        });

        self.recipients.len()
    }
}
