//! Helpers for building small, deterministic rooms in tests.

use crate::grid::{Cell, CellType, MapLayout};
use crate::room::Room;
use crate::settings::RoomSettings;
use rand::rngs::mock::StepRng;
use rand::RngCore;

/// Parse an ASCII map: `#` solid, `B` brick, `S` spawn, anything else open.
/// Spawns are listed in reading order.
pub fn layout(rows: &[&str]) -> MapLayout {
    let height = rows.len();
    let width = rows.first().map_or(0, |r| r.len());
    let mut cells = Vec::with_capacity(width * height);
    let mut spawns = Vec::new();

    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let cell_type = match ch {
                '#' => CellType::Solid,
                'B' => CellType::Brick,
                'S' => {
                    spawns.push(Cell::new(x as i32, y as i32));
                    CellType::Spawn
                }
                _ => CellType::Open,
            };
            cells.push(cell_type);
        }
    }

    MapLayout::new(width, height, cells, spawns)
}

/// Settings with no random bricks, no drops and 10 ticks per second.
pub fn quiet_settings(map: MapLayout) -> RoomSettings {
    RoomSettings {
        map,
        tickrate: 10.0,
        brick_spawn_chance: 0.0,
        powerup_spawn_chance: 0.0,
        ..Default::default()
    }
}

/// A random source whose float rolls are always 0.
pub fn stepped() -> Box<dyn RngCore> {
    Box::new(StepRng::new(0, 1))
}

pub fn room_from_rows(rows: &[&str], players: &[&str]) -> Room {
    Room::with_rng(quiet_settings(layout(rows)), players, stepped()).unwrap()
}

/// Tick from just after `from` until `until` (inclusive) at the room's
/// tickrate. Returns the last tick time.
pub fn run_until(room: &mut Room, from: u64, until: u64) -> u64 {
    let step = (1000.0 / room.settings().tickrate).round() as u64;
    let mut time = from;
    while time < until {
        time += step;
        room.mutate(time);
    }
    time
}
