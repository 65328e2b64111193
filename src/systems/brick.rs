//! Destructible bricks.

use crate::components::Damagable;
use crate::room::Room;
use crate::systems::{damage, powerup};
use bevy_ecs::prelude::*;
use tracing::debug;

/// On death: reopen the brick's cell, leave the room, and maybe drop a
/// power-up where it stood.
pub fn update(room: &mut Room, entity: Entity) {
    let destroyed = room.world().get::<Damagable>(entity).is_some_and(|d| d.is_dead());
    let Some(cell) = room.cell_of(entity).filter(|_| destroyed) else {
        damage::update(room, entity);
        return;
    };

    room.open_cell(cell);
    damage::update(room, entity);
    let drop = powerup::maybe_spawn(room, cell);
    debug!(?cell, dropped = drop.is_some(), "brick destroyed");
}
