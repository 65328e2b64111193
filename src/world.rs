//! Snapshot types for the presentation layer.
//!
//! The `Snapshot` struct provides a serializable view of a match that a
//! renderer or network relay can consume without touching the ECS world.
//! Entity ids are the stable bit form of the ECS entity.

use crate::components::*;
use crate::grid::{Direction, GridSnapshot};
use crate::room::Room;
use crate::settings::{Difficulty, Stat};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind-specific entity state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EntityState {
    Player {
        player_id: String,
        moving: bool,
        direction: Option<Direction>,
    },
    Bomb {
        owner: u64,
        radius: u32,
        expires_at: u64,
        sliding: bool,
    },
    Explosion {
        owner: Option<u64>,
        expires_at: u64,
        cells: Vec<ExplosionCell>,
    },
    Brick {
        health: f32,
    },
    Powerup {
        name: String,
        stat: Stat,
        delta: f32,
        rarity: u32,
    },
}

/// Snapshot of a single entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u64,
    pub kind: EntityKind,
    pub x: f32,
    pub y: f32,
    pub state: EntityState,
}

/// Per-player summary, listed in join order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: String,
    pub entity: u64,
    pub is_bot: bool,
    pub alive: bool,
    pub health: f32,
    pub x: f32,
    pub y: f32,
    pub stats: PlayerStats,
    /// Entity id of the explosion that killed this player.
    pub killer: Option<u64>,
    pub difficulty: Option<Difficulty>,
}

/// Complete match state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ticks run so far.
    pub tick: u64,
    /// Milliseconds since the first tick.
    pub elapsed: u64,
    pub grid: GridSnapshot,
    /// Live entities in update order.
    pub entities: Vec<EntitySnapshot>,
    pub players: Vec<PlayerSnapshot>,
    pub game_over: bool,
    pub winner: Option<String>,
}

impl Snapshot {
    /// Create a snapshot from a room.
    pub fn from_room(room: &Room) -> Self {
        let world = room.world();

        let entities = room
            .entities()
            .iter()
            .filter_map(|&entity| entity_snapshot(world, entity))
            .collect();

        let players = room
            .players()
            .filter_map(|(id, entity)| {
                let position = world.get::<Position>(entity)?;
                let stats = world.get::<PlayerStats>(entity)?;
                let health = world.get::<Damagable>(entity);
                Some(PlayerSnapshot {
                    id: id.to_string(),
                    entity: entity.to_bits(),
                    is_bot: world.get::<EntityKind>(entity) == Some(&EntityKind::Bot),
                    alive: room.is_alive(entity),
                    health: health.map_or(0.0, |d| d.health),
                    x: position.x,
                    y: position.y,
                    stats: *stats,
                    killer: health.and_then(|d| d.killer).map(|k| k.to_bits()),
                    difficulty: world.get::<BotBrain>(entity).map(|b| b.difficulty),
                })
            })
            .collect();

        Self {
            tick: room.current_tick(),
            elapsed: room.elapsed(),
            grid: GridSnapshot::from_grid(room.grid()),
            entities,
            players,
            game_over: room.is_game_over(),
            winner: room.winner().map(str::to_string),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty JSON (for debugging).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a snapshot previously produced by [`Snapshot::to_json`].
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

fn entity_snapshot(world: &World, entity: Entity) -> Option<EntitySnapshot> {
    let kind = *world.get::<EntityKind>(entity)?;
    let position = *world.get::<Position>(entity)?;

    let state = match kind {
        EntityKind::Player | EntityKind::Bot => {
            let player = world.get::<Player>(entity)?;
            let movement = world.get::<Movement>(entity);
            EntityState::Player {
                player_id: player.id.clone(),
                moving: movement.is_some_and(|m| m.in_transition),
                direction: movement.and_then(|m| m.direction),
            }
        }
        EntityKind::Bomb => {
            let bomb = world.get::<Bomb>(entity)?;
            EntityState::Bomb {
                owner: bomb.owner.to_bits(),
                radius: bomb.radius,
                expires_at: bomb.expires_at(),
                sliding: world.get::<Slidable>(entity).is_some_and(|s| s.is_sliding()),
            }
        }
        EntityKind::Explosion => {
            let explosion = world.get::<Explosion>(entity)?;
            EntityState::Explosion {
                owner: explosion.owner.map(|o| o.to_bits()),
                expires_at: explosion.expires_at(),
                cells: explosion.cells.clone(),
            }
        }
        EntityKind::Brick => EntityState::Brick {
            health: world.get::<Damagable>(entity).map_or(0.0, |d| d.health),
        },
        EntityKind::Powerup => {
            let powerup = world.get::<Powerup>(entity)?;
            EntityState::Powerup {
                name: powerup.kind.name.clone(),
                stat: powerup.kind.stat,
                delta: powerup.kind.delta,
                rarity: powerup.kind.rarity,
            }
        }
    };

    Some(EntitySnapshot {
        id: entity.to_bits(),
        kind,
        x: position.x,
        y: position.y,
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::test_support::room_from_rows;

    #[test]
    fn test_snapshot_lists_entities_and_players() {
        let mut room = room_from_rows(&["#######", "#S.B.S#", "#######"], &["a", "b"]);
        room.mutate(0);
        room.place_bomb("a");

        let snapshot = room.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.grid.width, 7);
        // Brick, two players, one bomb.
        assert_eq!(snapshot.entities.len(), 4);
        assert_eq!(snapshot.entities.last().unwrap().kind, EntityKind::Bomb);

        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[0].id, "a");
        assert!(snapshot.players.iter().all(|p| p.alive && !p.is_bot));
        assert!(!snapshot.game_over);
        assert_eq!(snapshot.winner, None);
    }

    #[test]
    fn test_snapshot_player_state() {
        let room = room_from_rows(&["#####", "#S..#", "#####"], &["a"]);
        let snapshot = room.snapshot();
        let player = &snapshot.entities[0];
        assert_eq!((player.x, player.y), (1.0, 1.0));
        match &player.state {
            EntityState::Player { player_id, moving, .. } => {
                assert_eq!(player_id, "a");
                assert!(!moving);
            }
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(snapshot.players[0].health, 100.0);
        assert_eq!(Cell::new(1, 1), Position::new(player.x, player.y).round());
    }

    #[test]
    fn test_snapshot_json_is_tagged() {
        let room = room_from_rows(&["#####", "#SB.#", "#####"], &["a"]);
        let json = room.snapshot_json();
        assert!(json.contains("\"type\":\"Brick\""));
        assert!(json.contains("\"game_over\":false"));
    }

    #[test]
    fn test_snapshot_survives_json() {
        let mut room = room_from_rows(&["#######", "#S.B.S#", "#######"], &["a", "b"]);
        room.mutate(250);
        room.place_bomb("b");

        let snapshot = room.snapshot();
        let restored = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(restored.tick, 1);
        assert_eq!(restored.entities.len(), snapshot.entities.len());
        assert_eq!(restored.grid.types, snapshot.grid.types);
        let bomb = restored.entities.iter().find(|e| e.kind == EntityKind::Bomb).unwrap();
        assert!(matches!(bomb.state, EntityState::Bomb { expires_at: 2_250, .. }));
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Snapshot::from_json("{\"tick\": \"soon\"}").is_err());
    }
}
