//! Health changes and removal of destroyed entities.

use crate::components::Damagable;
use crate::room::Room;
use bevy_ecs::prelude::*;
use tracing::trace;

/// Apply a health change to `target`. Returns false when the target has no
/// health or ignored the change.
pub fn modify_health(room: &mut Room, target: Entity, delta: f32, source: Option<Entity>) -> bool {
    let Some(mut damagable) = room.world_mut().get_mut::<Damagable>(target) else {
        return false;
    };
    let applied = damagable.modify_health(delta, source);
    if applied && damagable.is_dead() {
        trace!(?target, ?source, "lethal damage");
    }
    applied
}

/// Make `target` ignore further changes from `source`.
pub fn grant_immunity(room: &mut Room, target: Entity, source: Entity) {
    if let Some(mut damagable) = room.world_mut().get_mut::<Damagable>(target) {
        damagable.grant_immunity(source);
    }
}

/// Remove `entity` if it is dead and flagged for destruction. Removal never
/// happens inside [`modify_health`]; it waits for the entity's own update.
pub fn update(room: &mut Room, entity: Entity) {
    let doomed = room
        .world()
        .get::<Damagable>(entity)
        .is_some_and(|d| d.is_dead() && d.destroy_on_death);
    if doomed {
        trace!(?entity, "destroyed");
        room.remove_entity(entity);
    }
}
