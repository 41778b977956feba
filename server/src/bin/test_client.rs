use clap::Parser;
use shared::{ClientMessage, Direction, ServerMessage};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless client for poking at a running server")]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:12345")]
    server: String,

    /// Number of command rounds to send before disconnecting
    #[arg(short = 'n', long, default_value = "10")]
    rounds: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Connecting to {}", args.server);
    let stream = TcpStream::connect(&args.server).await?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    // The identity frame always comes first
    let player_id = match lines.next_line().await? {
        Some(line) => match ServerMessage::decode(&line)? {
            ServerMessage::Identity { id } => id,
            other => return Err(format!("Expected identity but got: {:?}", other).into()),
        },
        None => return Err("Server closed the connection".into()),
    };
    println!("Connected as player {}", player_id);

    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<f64>();
    let id_key = player_id.to_string();

    tokio::spawn(async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match ServerMessage::decode(&line) {
                    Ok(ServerMessage::State {
                        players,
                        food,
                        in_progress,
                    }) => {
                        if let Some(me) = players.get(&id_key) {
                            println!(
                                "State - running: {}, food: {:?}, head: {:?}, len: {}, alive: {}, points: {}",
                                in_progress,
                                food,
                                me.body.first(),
                                me.body.len(),
                                me.alive,
                                me.score
                            );
                        }
                    }
                    Ok(ServerMessage::Pong { timestamp }) => {
                        let _ = pong_tx.send(timestamp);
                    }
                    Ok(other) => println!("Unexpected message: {:?}", other),
                    Err(e) => println!("Failed to decode frame: {}", e),
                },
                Ok(None) => {
                    println!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    println!("Error receiving frame: {}", e);
                    break;
                }
            }
        }
    });

    let turns = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Right,
    ];

    for i in 0..args.rounds {
        let direction = turns[i as usize % turns.len()];
        let command = ClientMessage::Direction(direction).encode()?;
        println!("Sending direction: {:?}", direction);
        writer.write_all(command.as_bytes()).await?;

        let sent_at = Instant::now();
        writer.write_all(ClientMessage::Ping.encode()?.as_bytes()).await?;
        match tokio::time::timeout(Duration::from_secs(2), pong_rx.recv()).await {
            Ok(Some(timestamp)) => println!(
                "Pong at {:.3}, round trip {:.1} ms",
                timestamp,
                sent_at.elapsed().as_secs_f64() * 1000.0
            ),
            Ok(None) => break,
            Err(_) => println!("No pong within 2s"),
        }

        sleep(Duration::from_secs(1)).await;
    }

    println!("Test client finished");
    Ok(())
}
