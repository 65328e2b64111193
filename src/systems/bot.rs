//! Bot control: a LIFO action stack refilled by a brick-hunting planner.
//!
//! When the stack is empty the bot searches outward (BFS over traversable
//! cells) for the nearest cell next to a brick it has not targeted yet, then
//! pushes `PlaceBomb` followed by `MoveTo`, so it walks there first and bombs
//! on arrival. The top action is stepped once per tick.

use crate::components::*;
use crate::error::SimError;
use crate::grid::{Cell, Direction};
use crate::pathfinding::find_path;
use crate::room::Room;
use crate::systems::bomb;
use bevy_ecs::prelude::*;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, trace, warn};

/// Outcome of stepping one action.
#[derive(Debug)]
pub enum ActionStatus {
    Running,
    Done,
    Failed(SimError),
}

pub fn update(room: &mut Room, entity: Entity) {
    if !room.is_alive(entity) || room.is_game_over() {
        return;
    }
    let Some(mut brain) = room.world().get::<BotBrain>(entity).cloned() else {
        return;
    };

    if brain.is_idle() {
        plan(room, entity, &mut brain);
    }

    if let Some(action) = brain.actions.last_mut() {
        let name = action.name();
        match step(room, entity, action) {
            ActionStatus::Running => {}
            ActionStatus::Done => {
                trace!(?entity, action = name, "bot action done");
                brain.actions.pop();
            }
            ActionStatus::Failed(err) => {
                warn!(?entity, action = name, error = %err, "bot action failed");
                brain.actions.pop();
            }
        }
    }

    if let Some(mut stored) = room.world_mut().get_mut::<BotBrain>(entity) {
        *stored = brain;
    }
}

fn plan(room: &Room, entity: Entity, brain: &mut BotBrain) {
    let Some(start) = room.cell_of(entity) else {
        return;
    };
    match find_target(room, start, &brain.seen_bricks) {
        Some((target, bricks)) => {
            debug!(?entity, ?target, bricks = bricks.len(), "bot picked target");
            brain.seen_bricks.extend(bricks);
            brain.actions.push(BotAction::PlaceBomb);
            brain.actions.push(BotAction::move_to(target));
        }
        None => trace!(?entity, "bot has nothing to do"),
    }
}

/// Nearest reachable cell adjacent to at least one brick not in `seen`,
/// together with those bricks.
pub fn find_target(room: &Room, start: Cell, seen: &HashSet<Entity>) -> Option<(Cell, Vec<Entity>)> {
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(cell) = queue.pop_front() {
        let bricks: Vec<Entity> = cell
            .neighbours()
            .into_iter()
            .flat_map(|n| room.entities_of_kind_at(EntityKind::Brick, n))
            .filter(|b| !seen.contains(b))
            .collect();
        if !bricks.is_empty() {
            return Some((cell, bricks));
        }

        for next in cell.neighbours() {
            if room.position_is_traversable(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    None
}

fn step(room: &mut Room, entity: Entity, action: &mut BotAction) -> ActionStatus {
    let Some(movement) = room.world().get::<Movement>(entity).copied() else {
        return ActionStatus::Failed(SimError::UnknownEntity(entity));
    };

    match action {
        BotAction::MoveTo { target, path, pending } => {
            if !movement.is_idle() {
                return ActionStatus::Running;
            }
            let Some(current) = room.cell_of(entity) else {
                return ActionStatus::Failed(SimError::UnknownEntity(entity));
            };
            if let Some(expected) = pending.take() {
                if current != expected {
                    return ActionStatus::Failed(SimError::PathInterrupted { expected, actual: current });
                }
            }
            if path.is_none() {
                match find_path(current, *target, |c| room.position_is_traversable(c)) {
                    Some(found) => *path = Some(found.into()),
                    None => return ActionStatus::Failed(SimError::NoPath { from: current, to: *target }),
                }
            }

            let Some(next) = path.as_mut().and_then(|p| p.pop_front()) else {
                return ActionStatus::Done;
            };
            let Some(direction) = current.direction_to(next) else {
                return ActionStatus::Failed(SimError::PathInterrupted { expected: next, actual: current });
            };
            set_moving(room, entity, direction, 1);
            *pending = Some(next);
            ActionStatus::Running
        }
        BotAction::PlaceBomb => {
            if bomb::place_bomb(room, entity).is_none() {
                trace!(?entity, "bot could not place bomb");
            }
            ActionStatus::Done
        }
        BotAction::MoveDir { direction, units, issued } => {
            if !*issued {
                set_moving(room, entity, *direction, *units);
                *issued = true;
                ActionStatus::Running
            } else if movement.wants_to_move {
                ActionStatus::Running
            } else {
                ActionStatus::Done
            }
        }
        // Fleeing has no planner of its own yet; it stands still like Halt.
        BotAction::Halt | BotAction::Flee => {
            if let Some(mut movement) = room.world_mut().get_mut::<Movement>(entity) {
                movement.halt();
            }
            ActionStatus::Done
        }
    }
}

fn set_moving(room: &mut Room, entity: Entity, direction: Direction, units: i32) {
    if let Some(mut movement) = room.world_mut().get_mut::<Movement>(entity) {
        movement.set_moving(direction, units);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{layout, quiet_settings, run_until, stepped};

    fn bot_room(rows: &[&str]) -> (Room, Entity) {
        let mut settings = quiet_settings(layout(rows));
        settings.bot_count = 1;
        let room = Room::with_rng(settings, &[] as &[&str], stepped()).unwrap();
        let bot = room.player_entity("bot-1").unwrap();
        (room, bot)
    }

    fn brain(room: &Room, bot: Entity) -> &BotBrain {
        room.world().get::<BotBrain>(bot).unwrap()
    }

    #[test]
    fn test_find_target_nearest_unseen_brick() {
        let (room, _) = bot_room(&["########", "#S...B.#", "########"]);
        let (cell, bricks) = find_target(&room, Cell::new(1, 1), &HashSet::new()).unwrap();
        assert_eq!(cell, Cell::new(4, 1));
        assert_eq!(bricks.len(), 1);

        let seen: HashSet<Entity> = bricks.into_iter().collect();
        assert!(find_target(&room, Cell::new(1, 1), &seen).is_none());
    }

    #[test]
    fn test_idle_bot_plans_move_then_bomb() {
        let (mut room, bot) = bot_room(&["########", "#S...B.#", "########"]);
        room.mutate(0);

        let plan = &brain(&room, bot).actions;
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0], BotAction::PlaceBomb);
        assert!(matches!(plan[1], BotAction::MoveTo { target, .. } if target == Cell::new(4, 1)));
        assert_eq!(brain(&room, bot).seen_bricks.len(), 1);
    }

    #[test]
    fn test_bot_walks_to_brick_and_bombs() {
        let (mut room, bot) = bot_room(&["########", "#S...B.#", "########"]);
        // Three cells at 0.4 per tick is under 15 ticks.
        run_until(&mut room, 0, 2_000);

        let bombs: Vec<Entity> = room
            .entities()
            .iter()
            .copied()
            .filter(|&e| room.kind_of(e) == Some(EntityKind::Bomb))
            .collect();
        assert_eq!(bombs.len(), 1);
        assert_eq!(room.cell_of(bombs[0]), Some(Cell::new(4, 1)));
        assert_eq!(room.cell_of(bot), Some(Cell::new(4, 1)));
    }

    #[test]
    fn test_unreachable_target_fails_and_pops() {
        let (mut room, bot) = bot_room(&["#######", "#S#...#", "#######"]);
        room.world_mut()
            .get_mut::<BotBrain>(bot)
            .unwrap()
            .actions
            .push(BotAction::move_to(Cell::new(4, 1)));

        room.mutate(0);
        assert!(brain(&room, bot).is_idle());
    }

    #[test]
    fn test_interrupted_move_is_dropped() {
        let (mut room, bot) = bot_room(&["######", "#S...#", "######"]);
        room.world_mut()
            .get_mut::<BotBrain>(bot)
            .unwrap()
            .actions
            .push(BotAction::move_to(Cell::new(4, 1)));

        // First tick issues a one-cell move toward (2, 1).
        room.mutate(0);
        // Block it with an unkickable obstacle before the move starts.
        let blocker = room.create_entity((EntityKind::Bomb, Position::new(2.0, 1.0), Collidable(true)));
        room.mutate(100);

        assert!(brain(&room, bot).is_idle());
        assert_eq!(room.cell_of(bot), Some(Cell::new(1, 1)));
        assert!(room.contains(blocker));
    }

    #[test]
    fn test_move_dir_completes_when_budget_spent() {
        let (mut room, bot) = bot_room(&["######", "#S...#", "######"]);
        room.world_mut()
            .get_mut::<BotBrain>(bot)
            .unwrap()
            .actions
            .push(BotAction::move_dir(Direction::Right, 2));

        run_until(&mut room, 0, 1_200);
        assert_eq!(room.cell_of(bot), Some(Cell::new(3, 1)));
        assert!(brain(&room, bot).is_idle());
    }

    #[test]
    fn test_halt_and_flee_stop_the_bot() {
        let (mut room, bot) = bot_room(&["######", "#S...#", "######"]);
        room.world_mut().get_mut::<Movement>(bot).unwrap().set_moving(Direction::Right, Movement::UNBOUNDED);
        room.world_mut().get_mut::<BotBrain>(bot).unwrap().actions.push(BotAction::Flee);

        room.mutate(0);
        assert!(!room.world().get::<Movement>(bot).unwrap().wants_to_move);
        assert!(brain(&room, bot).is_idle());
    }
}
