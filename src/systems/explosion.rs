//! Lingering blasts: damage on spawn, re-scan every tick, expire.

use crate::behaviour::BehaviourKind;
use crate::components::*;
use crate::grid::Cell;
use crate::room::Room;
use crate::systems::damage;
use bevy_ecs::prelude::*;
use tracing::trace;

/// Spawn an explosion at `centre` and damage everything already in its cells.
pub fn spawn(room: &mut Room, centre: Cell, explosion: Explosion) -> Entity {
    let entity = room.create_entity(ExplosionBundle::new(centre, explosion));
    apply_damage(room, entity);
    entity
}

/// Expire the explosion, or hit any damagable entity that has wandered into
/// its cells since the last scan.
pub fn update(room: &mut Room, entity: Entity, time: u64) {
    let Some(expires_at) = room.world().get::<Explosion>(entity).map(|x| x.expires_at()) else {
        return;
    };
    if time >= expires_at {
        trace!(?entity, "explosion expired");
        room.remove_entity(entity);
        return;
    }
    apply_damage(room, entity);
}

/// Damage each damagable entity in the blast once. Returns the number of new
/// victims.
pub fn apply_damage(room: &mut Room, entity: Entity) -> usize {
    let Some(explosion) = room.world().get::<Explosion>(entity) else {
        return 0;
    };
    let cells: Vec<Cell> = explosion.cells.iter().map(|c| c.position).collect();
    let mut affected = explosion.affected.clone();
    let amount = room.settings().explosion_damage;

    let mut hits = 0;
    for cell in cells {
        for victim in room.entities_with_behaviour_at(BehaviourKind::Damagable, cell) {
            if victim == entity || !affected.insert(victim) {
                continue;
            }
            damage::modify_health(room, victim, -amount, Some(entity));
            damage::grant_immunity(room, victim, entity);
            hits += 1;
        }
    }

    if hits > 0 {
        trace!(?entity, hits, "explosion hit");
        if let Some(mut explosion) = room.world_mut().get_mut::<Explosion>(entity) {
            explosion.affected = affected;
        }
    }
    hits
}
