//! ECS components for the arena simulation.
//!
//! Components are data containers attached to entities. Behaviour components
//! ([`Movement`], [`Slidable`], [`Damagable`]) carry small state-transition
//! helpers; the per-tick logic that drives them lives in [`crate::systems`].

use crate::grid::{Cell, Direction};
use crate::settings::{Difficulty, PowerupType};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Convert a duration in seconds to whole milliseconds.
pub fn seconds_to_millis(seconds: f32) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}

// ============================================================================
// SPATIAL / IDENTITY COMPONENTS
// ============================================================================

/// Which variant an entity is. Drives per-tick dispatch.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Bot,
    Bomb,
    Explosion,
    Brick,
    Powerup,
}

/// Position in cell units. Fractional while an entity is between cells.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_cell(cell: Cell) -> Self {
        Self::new(cell.x as f32, cell.y as f32)
    }

    /// Snap to the nearest cell.
    pub fn round(&self) -> Cell {
        Cell::new(self.x.round() as i32, self.y.round() as i32)
    }

    /// Linear interpolation toward `to`, `t` in [0, 1].
    pub fn lerp(&self, to: Position, t: f32) -> Self {
        Self::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
    }
}

/// Whether the entity blocks traversal of its cell.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Collidable(pub bool);

// ============================================================================
// PLAYER COMPONENTS
// ============================================================================

/// A human- or bot-controlled player.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// External id used by the command surface.
    pub id: String,
}

/// Mutable player stats, modified by power-ups.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Cells per second.
    pub speed: f32,
    /// Blast radius in cells (the centre counts as 1).
    pub explosion_radius: u32,
    /// Seconds an explosion lingers.
    pub explosion_duration: f32,
    /// Bombs a player may have armed at once.
    pub bomb_count: u32,
    /// Fuse length in seconds.
    pub bomb_timer: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            speed: 4.0,
            explosion_radius: 3,
            explosion_duration: 1.0,
            bomb_count: 1,
            bomb_timer: 2.0,
        }
    }
}

// ============================================================================
// BOMB / EXPLOSION COMPONENTS
// ============================================================================

/// An armed bomb.
#[derive(Component, Debug, Clone, Copy)]
pub struct Bomb {
    /// Non-owning reference to the player that placed it.
    pub owner: Entity,
    pub power: f32,
    /// Placement time in milliseconds.
    pub placed_at: u64,
    /// Fuse in seconds.
    pub timer: f32,
    pub radius: u32,
    /// Seconds the resulting explosion persists.
    pub explosion_duration: f32,
}

impl Bomb {
    pub fn expires_at(&self) -> u64 {
        self.placed_at + seconds_to_millis(self.timer)
    }
}

/// One cell of an explosion's blast pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplosionCell {
    pub id: u32,
    /// Ray direction; `None` for the centre cell.
    pub direction: Option<Direction>,
    pub position: Cell,
    pub intensity: f32,
    /// Terminal cell of its ray.
    pub is_end: bool,
    pub is_centre: bool,
}

/// A lingering blast.
#[derive(Component, Debug, Clone)]
pub struct Explosion {
    /// Player whose bomb caused this blast, if still known.
    pub owner: Option<Entity>,
    pub intensity: f32,
    pub radius: u32,
    /// Seconds the blast persists.
    pub duration: f32,
    /// Creation time in milliseconds.
    pub created_at: u64,
    pub cells: Vec<ExplosionCell>,
    /// Entities this explosion has already damaged.
    pub affected: HashSet<Entity>,
}

impl Explosion {
    pub fn expires_at(&self) -> u64 {
        self.created_at + seconds_to_millis(self.duration)
    }
}

// ============================================================================
// PICKUP / DESTRUCTIBLE COMPONENTS
// ============================================================================

/// Marker for destructible brick entities.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Brick;

/// A power-up waiting to be collected.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Powerup {
    pub kind: PowerupType,
}

// ============================================================================
// BEHAVIOUR COMPONENTS
// ============================================================================

/// Player-driven grid movement.
///
/// Idle until `wants_to_move` is set with a direction; then transitions one
/// cell at a time, interpolating `from` → `to` by `percent`.
#[derive(Component, Debug, Clone, Copy)]
pub struct Movement {
    /// Cells per second.
    pub speed: f32,
    pub wants_to_move: bool,
    pub direction: Option<Direction>,
    pub in_transition: bool,
    pub from: Position,
    pub to: Position,
    pub percent: f32,
    /// Remaining cells to move, or [`Movement::UNBOUNDED`].
    pub move_units: i32,
}

impl Movement {
    pub const UNBOUNDED: i32 = -1;

    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            wants_to_move: false,
            direction: None,
            in_transition: false,
            from: Position::default(),
            to: Position::default(),
            percent: 0.0,
            move_units: Self::UNBOUNDED,
        }
    }

    /// Request movement in `direction`, for `units` cells or unbounded (`-1`).
    pub fn set_moving(&mut self, direction: Direction, units: i32) {
        if units == 0 {
            self.halt();
            return;
        }
        self.wants_to_move = true;
        self.direction = Some(direction);
        self.move_units = units;
    }

    /// Release `direction`. Ignored if the entity is heading elsewhere.
    pub fn stop_moving(&mut self, direction: Direction) {
        if self.direction == Some(direction) {
            self.halt();
        }
    }

    /// Stop wanting to move. A transition already underway still completes.
    pub fn halt(&mut self) {
        self.wants_to_move = false;
        self.move_units = Self::UNBOUNDED;
    }

    pub fn is_bounded(&self) -> bool {
        self.move_units >= 0
    }

    pub fn is_idle(&self) -> bool {
        !self.in_transition && !self.wants_to_move
    }

    pub fn begin(&mut self, from: Cell, to: Cell) {
        self.in_transition = true;
        self.from = Position::from_cell(from);
        self.to = Position::from_cell(to);
        self.percent = 0.0;
    }

    /// Close the current transition and spend one unit of a bounded move.
    pub fn finish_step(&mut self) {
        self.in_transition = false;
        self.percent = 0.0;
        if self.move_units > 0 {
            self.move_units -= 1;
            if self.move_units == 0 {
                self.halt();
            }
        }
    }
}

/// Externally driven sliding (kicked bombs).
#[derive(Component, Debug, Clone, Copy)]
pub struct Slidable {
    /// Cells per second.
    pub speed: f32,
    pub direction: Option<Direction>,
    pub from: Position,
    pub to: Position,
    pub percent: f32,
}

impl Slidable {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            direction: None,
            from: Position::default(),
            to: Position::default(),
            percent: 0.0,
        }
    }

    pub fn is_sliding(&self) -> bool {
        self.direction.is_some()
    }

    /// Start sliding one cell from `from` in `direction`.
    pub fn start(&mut self, from: Cell, direction: Direction) {
        self.direction = Some(direction);
        self.from = Position::from_cell(from);
        self.to = Position::from_cell(from.step(direction));
        self.percent = 0.0;
    }

    pub fn stop(&mut self) {
        self.direction = None;
        self.percent = 0.0;
    }
}

/// Health with per-source invulnerability.
#[derive(Component, Debug, Clone)]
pub struct Damagable {
    pub health: f32,
    pub max_health: f32,
    /// Ignore all health changes.
    pub invulnerable: bool,
    /// Sources that can no longer affect this entity.
    pub invulnerable_to: HashSet<Entity>,
    /// First source that brought health to zero.
    pub killer: Option<Entity>,
    /// Remove the entity from the room on the tick after death.
    pub destroy_on_death: bool,
}

impl Damagable {
    pub fn new(health: f32) -> Self {
        Self {
            health,
            max_health: health,
            invulnerable: false,
            invulnerable_to: HashSet::new(),
            killer: None,
            destroy_on_death: false,
        }
    }

    pub fn destroyed_on_death(mut self) -> Self {
        self.destroy_on_death = true;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    /// Apply `delta` to health. Returns false when the change was ignored.
    pub fn modify_health(&mut self, delta: f32, source: Option<Entity>) -> bool {
        if self.invulnerable {
            return false;
        }
        if source.is_some_and(|s| self.invulnerable_to.contains(&s)) {
            return false;
        }

        let was_alive = self.is_alive();
        self.health = (self.health + delta).min(self.max_health);
        if was_alive && self.is_dead() && self.killer.is_none() {
            self.killer = source;
        }
        true
    }

    pub fn grant_immunity(&mut self, source: Entity) {
        self.invulnerable_to.insert(source);
    }
}

// ============================================================================
// AI COMPONENTS
// ============================================================================

/// One entry in a bot's action stack.
#[derive(Debug, Clone, PartialEq)]
pub enum BotAction {
    /// Walk to `target` along an A* path computed on first entry.
    MoveTo {
        target: Cell,
        path: Option<VecDeque<Cell>>,
        /// Cell the last issued one-cell move should end on.
        pending: Option<Cell>,
    },
    PlaceBomb,
    MoveDir {
        direction: Direction,
        units: i32,
        issued: bool,
    },
    Halt,
    Flee,
}

impl BotAction {
    pub fn move_to(target: Cell) -> Self {
        BotAction::MoveTo {
            target,
            path: None,
            pending: None,
        }
    }

    pub fn move_dir(direction: Direction, units: i32) -> Self {
        BotAction::MoveDir {
            direction,
            units,
            issued: false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BotAction::MoveTo { .. } => "MoveTo",
            BotAction::PlaceBomb => "PlaceBomb",
            BotAction::MoveDir { .. } => "MoveDir",
            BotAction::Halt => "Halt",
            BotAction::Flee => "Flee",
        }
    }
}

/// Planning state for a bot-controlled player.
#[derive(Component, Debug, Clone, Default)]
pub struct BotBrain {
    pub difficulty: Difficulty,
    /// LIFO plan; the last element runs next.
    pub actions: Vec<BotAction>,
    /// Bricks already targeted.
    pub seen_bricks: HashSet<Entity>,
}

impl BotBrain {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Default::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        self.actions.is_empty()
    }

    /// Drop references to a removed entity.
    pub fn forget(&mut self, entity: Entity) {
        self.seen_bricks.remove(&entity);
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning a player or bot. Behaviours are attached separately.
#[derive(Bundle)]
pub struct PlayerBundle {
    pub kind: EntityKind,
    pub player: Player,
    pub position: Position,
    pub collidable: Collidable,
    pub stats: PlayerStats,
}

impl PlayerBundle {
    pub fn new(id: &str, cell: Cell, stats: PlayerStats, is_bot: bool) -> Self {
        Self {
            kind: if is_bot { EntityKind::Bot } else { EntityKind::Player },
            player: Player { id: id.to_string() },
            position: Position::from_cell(cell),
            collidable: Collidable(false),
            stats,
        }
    }
}

/// Bundle for spawning a bomb.
#[derive(Bundle)]
pub struct BombBundle {
    pub kind: EntityKind,
    pub position: Position,
    pub collidable: Collidable,
    pub bomb: Bomb,
}

impl BombBundle {
    pub fn new(cell: Cell, bomb: Bomb) -> Self {
        Self {
            kind: EntityKind::Bomb,
            position: Position::from_cell(cell),
            collidable: Collidable(true),
            bomb,
        }
    }
}

/// Bundle for spawning an explosion.
#[derive(Bundle)]
pub struct ExplosionBundle {
    pub kind: EntityKind,
    pub position: Position,
    pub collidable: Collidable,
    pub explosion: Explosion,
}

impl ExplosionBundle {
    pub fn new(cell: Cell, explosion: Explosion) -> Self {
        Self {
            kind: EntityKind::Explosion,
            position: Position::from_cell(cell),
            collidable: Collidable(false),
            explosion,
        }
    }
}

/// Bundle for spawning a brick entity.
#[derive(Bundle)]
pub struct BrickBundle {
    pub kind: EntityKind,
    pub position: Position,
    pub collidable: Collidable,
    pub marker: Brick,
}

impl BrickBundle {
    pub fn new(cell: Cell) -> Self {
        Self {
            kind: EntityKind::Brick,
            position: Position::from_cell(cell),
            collidable: Collidable(true),
            marker: Brick,
        }
    }
}

/// Bundle for spawning a power-up.
#[derive(Bundle)]
pub struct PowerupBundle {
    pub kind: EntityKind,
    pub position: Position,
    pub collidable: Collidable,
    pub powerup: Powerup,
}

impl PowerupBundle {
    pub fn new(cell: Cell, kind: PowerupType) -> Self {
        Self {
            kind: EntityKind::Powerup,
            position: Position::from_cell(cell),
            collidable: Collidable(false),
            powerup: Powerup { kind },
        }
    }
}
