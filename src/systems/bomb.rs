//! Bomb placement, fuse and blast pattern.

use crate::behaviour::Behaviour;
use crate::components::*;
use crate::grid::{Cell, Direction};
use crate::room::Room;
use crate::systems::{explosion, movement};
use bevy_ecs::prelude::*;
use tracing::{debug, warn};

/// Place a bomb under `owner`, using the owner's current stats.
///
/// Refused (returns `None`) when the owner already has `bomb_count` bombs
/// armed or the cell already holds a bomb.
pub fn place_bomb(room: &mut Room, owner: Entity) -> Option<Entity> {
    let stats = *room.world().get::<PlayerStats>(owner)?;
    let cell = room.cell_of(owner)?;

    let armed = room
        .entities()
        .iter()
        .filter(|&&e| room.world().get::<Bomb>(e).is_some_and(|b| b.owner == owner))
        .count();
    if armed >= stats.bomb_count as usize {
        return None;
    }
    if !room.entities_of_kind_at(EntityKind::Bomb, cell).is_empty() {
        return None;
    }

    let bomb = Bomb {
        owner,
        power: room.settings().bomb_power,
        placed_at: room.current_time(),
        timer: stats.bomb_timer,
        radius: stats.explosion_radius,
        explosion_duration: stats.explosion_duration,
    };
    let slide_speed = room.settings().bomb_slide_speed;

    let entity = room.create_entity(BombBundle::new(cell, bomb));
    if let Err(err) = room.add_behaviour(entity, Behaviour::Slidable(Slidable::new(slide_speed))) {
        warn!(error = %err, "bomb spawned without sliding");
    }
    debug!(?owner, ?cell, radius = bomb.radius, expires_at = bomb.expires_at(), "bomb placed");
    Some(entity)
}

/// Advance a bomb: slide, then detonate once the fuse has run out.
pub fn update(room: &mut Room, entity: Entity, time: u64) {
    movement::update_slidable(room, entity);

    let Some(bomb) = room.world().get::<Bomb>(entity).copied() else {
        return;
    };
    if time < bomb.expires_at() {
        return;
    }
    let Some(centre) = movement::force_stop(room, entity) else {
        return;
    };

    let cells = compute_cells(room, centre, bomb.radius, bomb.power);
    let owner = room.contains(bomb.owner).then_some(bomb.owner);
    room.remove_entity(entity);

    debug!(?centre, cells = cells.len(), "bomb detonated");
    explosion::spawn(
        room,
        centre,
        Explosion {
            owner,
            intensity: bomb.power,
            radius: bomb.radius,
            duration: bomb.explosion_duration,
            created_at: time,
            cells,
            affected: Default::default(),
        },
    );
}

/// Blast pattern for a bomb of `radius` at `centre`.
///
/// The centre comes first, then rays grow outward one ring at a time in
/// [`Direction::ALL`] order for up to `radius - 1` cells. A ray never enters
/// a SOLID or out-of-bounds cell, and stops on (and includes) the first cell
/// holding a brick. The last cell of each ray is marked `is_end`.
pub fn compute_cells(room: &Room, centre: Cell, radius: u32, intensity: f32) -> Vec<ExplosionCell> {
    let grid = room.grid();
    let walls = |cell: Cell| !grid.in_bounds(cell) || grid.is_solid(cell);
    let reach = radius.saturating_sub(1) as i32;

    let mut cells = vec![ExplosionCell {
        id: 0,
        direction: None,
        position: centre,
        intensity,
        is_end: false,
        is_centre: true,
    }];

    let mut stopped = [false; 4];
    for direction in Direction::ALL {
        if reach == 0 || walls(centre.step(direction)) {
            stopped[direction.index()] = true;
        }
    }

    for distance in 1..=reach {
        if stopped.iter().all(|&s| s) {
            break;
        }
        for direction in Direction::ALL {
            if stopped[direction.index()] {
                continue;
            }
            let position = centre.offset(direction, distance);
            let is_end = distance == reach
                || walls(centre.offset(direction, distance + 1))
                || !room.entities_of_kind_at(EntityKind::Brick, position).is_empty();
            if is_end {
                stopped[direction.index()] = true;
            }
            cells.push(ExplosionCell {
                id: cells.len() as u32,
                direction: Some(direction),
                position,
                intensity,
                is_end,
                is_centre: false,
            });
        }
    }

    cells
}
