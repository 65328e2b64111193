//! Basic demonstration of the Blast Arena simulation.
//!
//! Run with: cargo run --example basic_demo
//! Set RUST_LOG=blast_sim=debug for per-event logs.

use blast_sim::{Direction, Room, RoomSettings};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blast_sim=info")))
        .init();

    println!("=== Blast Arena - Simulation Demo ===\n");

    let settings = RoomSettings {
        bot_count: 2,
        ..Default::default()
    };
    let mut room = match Room::new(settings, &["alice", "bob"]) {
        Ok(room) => room,
        Err(err) => {
            eprintln!("could not set up match: {err}");
            return;
        }
    };

    println!("Initial state:");
    print_players(&room);

    // Alice walks down and drops a bomb; Bob walks left.
    room.set_moving("alice", Direction::Down);
    room.set_moving("bob", Direction::Left);

    let tick_ms = (1000.0 / room.settings().tickrate).round() as u64;
    println!("\nRunning 30 seconds of simulation at {tick_ms} ms per tick...\n");
    let mut time = 0;
    for tick in 0..900u64 {
        time = tick * tick_ms;
        room.mutate(time);

        if tick == 15 {
            room.place_bomb("alice");
            room.set_moving("alice", Direction::Up);
        }
        if (tick + 1) % 150 == 0 {
            println!("--- Tick {} (t={:.1}s) ---", room.current_tick(), room.elapsed() as f32 / 1000.0);
            print_players(&room);
        }
        if room.is_game_over() {
            break;
        }
    }

    println!("\nStopped at t={:.1}s, winner: {:?}", time as f32 / 1000.0, room.winner());
    println!("\n=== Final State (JSON) ===\n");
    match room.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("snapshot failed: {err}"),
    }
}

fn print_players(room: &Room) {
    for player in room.snapshot().players {
        println!(
            "    {:<8} pos=({:.1}, {:.1}) hp={:.0} bombs={} radius={} {}",
            player.id,
            player.x,
            player.y,
            player.health,
            player.stats.bomb_count,
            player.stats.explosion_radius,
            if player.alive { "" } else { "[dead]" }
        );
    }
}
