//! Blast Arena - Simulation Core
//!
//! A tick-driven simulation of a grid bombing arena: players walk a tile
//! grid, drop timed bombs whose cross-shaped blasts destroy bricks and kill
//! players, kick bombs, and collect power-ups. Uses `bevy_ecs` for entity
//! storage; per-entity updates run in insertion order through a [`Room`].

pub mod behaviour;
pub mod components;
pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod room;
pub mod settings;
pub mod spatial;
pub mod systems;
pub mod world;

#[cfg(test)]
mod test_support;

pub use behaviour::{Behaviour, BehaviourKind};
pub use components::*;
pub use error::SimError;
pub use grid::{Cell, CellType, Direction, Grid, GridSnapshot, MapLayout};
pub use room::Room;
pub use settings::{Difficulty, PowerupType, RoomSettings, Stat, StatBounds};
pub use spatial::PositionIndex;
pub use world::Snapshot;
