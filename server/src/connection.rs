//! One player's connection: inbound parsing and outbound frame delivery
//!
//! Each connection runs two tasks. The reader splits the inbound stream on `\n`,
//! queues direction commands into the shared world and answers pings. The writer
//! drains a bounded channel of encoded frames and writes each one completely.
//! Broadcasts and pong replies both go through that channel, so a ping is answered
//! without ever waiting on the world lock.

use crate::error::ConnectionError;
use crate::game::World;
use crate::utils::unix_timestamp_secs;
use log::{debug, error, info, warn};
use shared::{ClientMessage, PlayerId, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::timeout;

pub type SharedWorld = Arc<Mutex<World>>;

/// Frames a connection may have waiting for its writer
pub const OUTBOUND_CAPACITY: usize = 64;

/// How long the writer gets to flush queued frames after the reader stops
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Sending side of a player's connection
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: PlayerId,
    sender: mpsc::Sender<String>,
}

impl Connection {
    /// Queues an encoded frame for the writer task without waiting
    ///
    /// Fails with [`ConnectionError::Full`] when the peer has stopped reading and
    /// the outbound queue is at capacity.
    pub fn send(&self, line: String) -> Result<(), ConnectionError> {
        self.sender.try_send(line).map_err(|e| match e {
            TrySendError::Full(_) => ConnectionError::Full,
            TrySendError::Closed(_) => ConnectionError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Starts serving a freshly accepted stream for player `id`
///
/// The identity frame is queued before this returns, so it always precedes the
/// first broadcast. When the reader stops, for whatever reason, the writer stops
/// taking new frames, flushes what is already queued and shuts the stream down.
/// A writer stuck on a peer that never reads is aborted after [`FLUSH_TIMEOUT`].
pub fn open<S>(stream: S, id: PlayerId, world: SharedWorld) -> Result<Connection, ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let (sender, receiver) = mpsc::channel(OUTBOUND_CAPACITY);
    let (reader_done, reader_stopped) = oneshot::channel();

    let connection = Connection { id, sender };
    connection.send(ServerMessage::Identity { id }.encode()?)?;

    let mut writer_task = tokio::spawn(async move {
        if let Err(e) = write_frames(writer, receiver, reader_stopped).await {
            error!("Failed to write to player {}: {}", id, e);
        }
    });

    let replies = connection.sender.clone();
    tokio::spawn(async move {
        match handle_frames(reader, id, &world, &replies).await {
            Ok(()) => info!("Player {} disconnected", id),
            Err(ConnectionError::Protocol(e)) => {
                warn!("Dropping player {} after malformed message: {}", id, e)
            }
            Err(e) => error!("Connection to player {} failed: {}", id, e),
        }

        let _ = reader_done.send(());
        if timeout(FLUSH_TIMEOUT, &mut writer_task).await.is_err() {
            warn!("Player {} is not reading, dropping unsent frames", id);
            writer_task.abort();
        }
    });

    Ok(connection)
}

/// Reads newline-delimited frames until the peer closes or sends something invalid
///
/// Blank lines are skipped. Direction commands take the world lock only for the
/// append; pings are answered straight into `replies`.
pub async fn handle_frames<R>(
    reader: R,
    id: PlayerId,
    world: &Mutex<World>,
    replies: &mpsc::Sender<String>,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match ClientMessage::decode(&line)? {
            ClientMessage::Direction(direction) => {
                world.lock().await.queue_direction(id, direction);
                debug!("Player {} requested {:?}", id, direction);
            }
            ClientMessage::Ping => {
                let pong = ServerMessage::Pong {
                    timestamp: unix_timestamp_secs(),
                }
                .encode()?;
                replies
                    .send(pong)
                    .await
                    .map_err(|_| ConnectionError::Closed)?;
            }
        }
    }

    Ok(())
}

/// Writes every queued frame in full, in order
///
/// Runs until the channel closes or `reader_stopped` fires. In the latter case the
/// channel is closed to new frames and whatever is already queued is still written.
async fn write_frames<W>(
    mut writer: W,
    mut receiver: mpsc::Receiver<String>,
    mut reader_stopped: oneshot::Receiver<()>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            frame = receiver.recv() => match frame {
                Some(line) => writer.write_all(line.as_bytes()).await?,
                None => break,
            },
            _ = &mut reader_stopped => break,
        }
    }

    receiver.close();
    while let Some(line) = receiver.recv().await {
        writer.write_all(line.as_bytes()).await?;
    }
    writer.shutdown().await
}
