//! Per-tick update shared by human and bot players.

use crate::components::{Movement, PlayerStats};
use crate::room::Room;
use crate::systems::{damage, movement, powerup};
use bevy_ecs::prelude::*;

pub fn update(room: &mut Room, entity: Entity) {
    if room.is_alive(entity) {
        sync_speed(room, entity);
        movement::update_movement(room, entity);
        powerup::collect(room, entity);
    } else if let Some(mut movement) = room.world_mut().get_mut::<Movement>(entity) {
        // Dead players finish nothing.
        movement.halt();
        movement.in_transition = false;
    }
    damage::update(room, entity);
}

/// Speed power-ups take effect on the next step.
fn sync_speed(room: &mut Room, entity: Entity) {
    let Some(speed) = room.world().get::<PlayerStats>(entity).map(|s| s.speed) else {
        return;
    };
    if let Some(mut movement) = room.world_mut().get_mut::<Movement>(entity) {
        if movement.speed != speed {
            movement.speed = speed;
        }
    }
}
