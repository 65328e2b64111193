//! Grid movement and bomb sliding.
//!
//! Both behaviours move one cell at a time, interpolating between cell
//! centres at `speed / tickrate` of a cell per tick, and snap exactly onto
//! the target cell when a step completes.

use crate::behaviour::BehaviourKind;
use crate::components::*;
use crate::grid::{Cell, Direction};
use crate::room::Room;
use bevy_ecs::prelude::*;
use tracing::debug;

/// Advance an entity's [`Movement`] by one tick.
pub fn update_movement(room: &mut Room, entity: Entity) {
    let Some(mut movement) = room.world().get::<Movement>(entity).copied() else {
        return;
    };
    let Some(position) = room.position_of(entity) else {
        return;
    };
    let step = movement.speed / room.settings().tickrate;

    if movement.in_transition {
        movement.percent = (movement.percent + step).min(1.0);
        let next = if movement.percent >= 1.0 {
            let arrived = movement.to;
            movement.finish_step();
            arrived
        } else {
            movement.from.lerp(movement.to, movement.percent)
        };
        room.update_entity_position(entity, next);
    } else if movement.wants_to_move {
        if let Some(direction) = movement.direction {
            let from = position.round();
            let target = from.step(direction);
            if try_enter(room, entity, target, direction) {
                movement.begin(from, target);
            } else if movement.is_bounded() {
                // A bounded move that cannot start is abandoned.
                movement.halt();
            }
        }
    }

    if let Some(mut stored) = room.world_mut().get_mut::<Movement>(entity) {
        *stored = movement;
    }
}

/// Check whether `mover` may step into `target`, pushing slidable occupants
/// ahead of it when the cell beyond is free.
pub fn try_enter(room: &mut Room, mover: Entity, target: Cell, direction: Direction) -> bool {
    if !room.position_is_in_bounds(target) || room.position_is_blocked(target) {
        return false;
    }

    let blockers: Vec<Entity> = room
        .entities_at(target)
        .into_iter()
        .filter(|&e| e != mover && room.is_collidable(e))
        .collect();
    if blockers.is_empty() {
        return true;
    }

    if !blockers.iter().all(|&e| room.has_behaviour(e, BehaviourKind::Slidable)) {
        return false;
    }
    if !room.position_is_traversable(target.step(direction)) {
        return false;
    }

    for blocker in blockers {
        if let Some(mut slidable) = room.world_mut().get_mut::<Slidable>(blocker) {
            if !slidable.is_sliding() {
                slidable.start(target, direction);
                debug!(?blocker, ?direction, "kicked");
            }
        }
    }
    true
}

/// Advance an entity's [`Slidable`] by one tick.
///
/// On reaching a cell the slide continues only while the next cell in the
/// same direction is traversable.
pub fn update_slidable(room: &mut Room, entity: Entity) {
    let Some(mut slide) = room.world().get::<Slidable>(entity).copied() else {
        return;
    };
    let Some(direction) = slide.direction else {
        return;
    };
    let step = slide.speed / room.settings().tickrate;

    slide.percent = (slide.percent + step).min(1.0);
    let position = if slide.percent >= 1.0 {
        let arrived = slide.to.round();
        if room.position_is_traversable_except(arrived.step(direction), Some(entity)) {
            slide.start(arrived, direction);
        } else {
            slide.stop();
        }
        Position::from_cell(arrived)
    } else {
        slide.from.lerp(slide.to, slide.percent)
    };

    room.update_entity_position(entity, position);
    if let Some(mut stored) = room.world_mut().get_mut::<Slidable>(entity) {
        *stored = slide;
    }
}

/// Stop a slide and snap to a cell: the target cell if it would be reached
/// within the next tick, otherwise the nearest one. Returns the final cell.
pub fn force_stop(room: &mut Room, entity: Entity) -> Option<Cell> {
    let position = room.position_of(entity)?;
    let Some(mut slide) = room.world().get::<Slidable>(entity).copied() else {
        return Some(position.round());
    };
    if !slide.is_sliding() {
        return Some(position.round());
    }

    let step = slide.speed / room.settings().tickrate;
    let cell = if 1.0 - slide.percent <= step {
        slide.to.round()
    } else {
        position.round()
    };
    slide.stop();

    room.update_entity_position(entity, Position::from_cell(cell));
    if let Some(mut stored) = room.world_mut().get_mut::<Slidable>(entity) {
        *stored = slide;
    }
    Some(cell)
}
