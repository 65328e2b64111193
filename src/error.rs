//! Error types for match setup and bot decisions.

use crate::behaviour::BehaviourKind;
use crate::grid::Cell;
use bevy_ecs::entity::Entity;
use thiserror::Error;

/// Errors raised by the simulation core.
///
/// Configuration errors abort match construction. Pathing errors are local
/// to a single bot action and never escape [`Room::mutate`].
///
/// [`Room::mutate`]: crate::room::Room::mutate
#[derive(Debug, Error)]
pub enum SimError {
    #[error("behaviour {0:?} is already attached to this entity")]
    DuplicateBehaviour(BehaviourKind),

    #[error("entity {0:?} does not exist")]
    UnknownEntity(Entity),

    #[error("{requested} players requested but the map only has {available} starting positions")]
    TooManyPlayers { requested: usize, available: usize },

    #[error("player id {0:?} was given more than once")]
    DuplicatePlayer(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("no path from {from:?} to {to:?}")]
    NoPath { from: Cell, to: Cell },

    #[error("path step to {expected:?} ended at {actual:?}")]
    PathInterrupted { expected: Cell, actual: Cell },

    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
