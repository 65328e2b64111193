//! Per-entity update logic for the arena simulation.
//!
//! Systems operate on one entity at a time through the [`Room`], which gives
//! them the spatial queries and registry operations they need. `Room::mutate`
//! walks the live entities in insertion order and dispatches on
//! [`EntityKind`]:
//!
//! - **Player** - `player::update`: sync speed, advance movement (pushing
//!   bombs), collect power-ups, then the damage check
//! - **Bot** - the player update followed by `bot::update`, which plans when
//!   idle and steps the top of its action stack
//! - **Bomb** - `bomb::update`: advance sliding, and on fuse expiry compute
//!   the blast, spawn the explosion and remove itself
//! - **Explosion** - `explosion::update`: expire, or re-scan its cells for
//!   new victims
//! - **Brick** - `brick::update`: on death reopen the cell, roll a power-up
//!   and leave the room
//! - **Powerup** - passive; collected from the player side
//!
//! Removals take effect immediately, so later entities in the same tick
//! already see the world without them.

pub mod bomb;
pub mod bot;
pub mod brick;
pub mod damage;
pub mod explosion;
pub mod movement;
pub mod player;
pub mod powerup;

pub use bomb::{compute_cells, place_bomb};
pub use bot::find_target;
pub use movement::{force_stop, try_enter};
pub use powerup::{rarity_tier, roll_powerup};

use crate::components::EntityKind;
use crate::room::Room;
use bevy_ecs::prelude::*;

/// Run one entity's update for the current tick.
pub(crate) fn update_entity(room: &mut Room, entity: Entity, kind: EntityKind, time: u64) {
    match kind {
        EntityKind::Player => player::update(room, entity),
        EntityKind::Bot => {
            player::update(room, entity);
            bot::update(room, entity);
        }
        EntityKind::Bomb => bomb::update(room, entity, time),
        EntityKind::Explosion => explosion::update(room, entity, time),
        EntityKind::Brick => brick::update(room, entity),
        EntityKind::Powerup => {}
    }
}
