//! Performance benchmarks for the per-tick work done under the world lock

use server::config::ScoringPolicy;
use server::game::World;
use shared::{ClientMessage, Direction};
use std::time::{Duration, Instant};

/// Benchmarks raw simulation ticks, rounds and restarts included
#[test]
fn benchmark_world_tick() {
    let mut world = World::new(ScoringPolicy::Points, Duration::from_millis(0));
    let turns = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

    let iterations = 100_000;
    let start = Instant::now();
    let mut now = start;

    for i in 0..iterations {
        world.queue_direction(1 + (i % 2) as u32, turns[i % turns.len()]);
        now += Duration::from_millis(200);
        world.tick(now);
    }

    let duration = start.elapsed();
    println!(
        "World tick: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(world.tick_count(), iterations as u64);
    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks encoding the state broadcast
#[test]
fn benchmark_snapshot_encoding() {
    let world = World::new(ScoringPolicy::Points, Duration::from_secs(3));

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let line = world.snapshot().encode().unwrap();
        assert!(line.ends_with('\n'));
    }

    let duration = start.elapsed();
    println!(
        "Snapshot encoding: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks decoding inbound commands
#[test]
fn benchmark_command_decoding() {
    let frames = [
        "{\"acao\":\"direcao\",\"direcao\":\"cima\"}",
        "{\"acao\":\"direcao\",\"direcao\":\"esquerda\"}",
        "{\"acao\":\"ping\"}",
    ];

    let iterations = 50_000;
    let start = Instant::now();

    for i in 0..iterations {
        let message = ClientMessage::decode(frames[i % frames.len()]).unwrap();
        assert!(matches!(
            message,
            ClientMessage::Direction(_) | ClientMessage::Ping
        ));
    }

    let duration = start.elapsed();
    println!(
        "Command decoding: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}
