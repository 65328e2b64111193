//! Public API for one match.
//!
//! The [`Room`] owns the ECS world, the grid and the live entity set, and is
//! the only interface the surrounding layers (input, network relay,
//! rendering) talk to.
//!
//! ## Tick model
//!
//! `mutate(time)` runs exactly one simulation step. Every live entity is
//! updated once, in insertion order, over a snapshot of ids taken when the
//! tick starts. Entities removed mid-tick are skipped; entities created
//! mid-tick are first updated on the next tick.
//!
//! ## Position index
//!
//! Every position change goes through [`Room::update_entity_position`], which
//! keeps the [`PositionIndex`] in step immediately. Spatial queries never see
//! a stale cell.

use crate::behaviour::{self, Behaviour, BehaviourKind};
use crate::components::*;
use crate::error::SimError;
use crate::grid::{Cell, CellType, Direction, Grid};
use crate::settings::RoomSettings;
use crate::spatial::PositionIndex;
use crate::systems::{self, bomb};
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::HashSet;
use tracing::{debug, info, trace};

/// The match container.
///
/// Holds the ECS world and the insertion-ordered entity list, providing:
/// - Match setup from settings and a player list
/// - Stepping the simulation forward
/// - Spatial and traversability queries
/// - The command surface (move, stop, place bomb)
/// - State snapshots for presentation
pub struct Room {
    world: World,
    /// Live entities in insertion order.
    entities: Vec<Entity>,
    /// External player ids in join order.
    players: Vec<(String, Entity)>,
    rng: Box<dyn RngCore>,
    tick: u64,
    /// Timestamp of the latest tick, in milliseconds.
    time: u64,
    started_at: Option<u64>,
    game_over_reported: bool,
}

impl Room {
    /// Create a match with an entropy-seeded random source.
    pub fn new<S: AsRef<str>>(settings: RoomSettings, player_ids: &[S]) -> Result<Self, SimError> {
        Self::with_rng(settings, player_ids, Box::new(StdRng::from_entropy()))
    }

    /// Create a match with an injected random source.
    ///
    /// Fails if the settings are invalid, a player id repeats, or the map does
    /// not have a starting position for every player and bot.
    pub fn with_rng<S: AsRef<str>>(
        settings: RoomSettings,
        player_ids: &[S],
        rng: Box<dyn RngCore>,
    ) -> Result<Self, SimError> {
        settings.validate()?;

        let requested = player_ids.len() + settings.bot_count;
        let available = settings.map.spawns.len();
        if requested > available {
            return Err(SimError::TooManyPlayers { requested, available });
        }

        let mut world = World::new();
        world.insert_resource(Grid::from_layout(&settings.map));
        world.insert_resource(PositionIndex::new());
        world.insert_resource(settings);

        let mut room = Self {
            world,
            entities: Vec::new(),
            players: Vec::new(),
            rng,
            tick: 0,
            time: 0,
            started_at: None,
            game_over_reported: false,
        };
        room.setup(player_ids)?;
        Ok(room)
    }

    fn setup<S: AsRef<str>>(&mut self, player_ids: &[S]) -> Result<(), SimError> {
        let mut ids: Vec<String> = player_ids.iter().map(|id| id.as_ref().to_string()).collect();
        let (starts, bot_count) = {
            let settings = self.settings();
            (settings.map.spawns.clone(), settings.bot_count)
        };
        ids.extend((1..=bot_count).map(|n| format!("bot-{n}")));

        let mut unique = HashSet::new();
        if let Some(duplicate) = ids.iter().find(|id| !unique.insert(id.as_str())) {
            return Err(SimError::DuplicatePlayer(duplicate.clone()));
        }

        self.spawn_bricks(&starts)?;

        for (i, id) in ids.iter().enumerate() {
            let is_bot = i >= player_ids.len();
            self.spawn_player(id, starts[i], is_bot)?;
        }

        info!(
            players = player_ids.len(),
            bots = bot_count,
            bricks = self.grid().iter().filter(|(_, c)| c.cell_type == CellType::Brick).count(),
            "match set up"
        );
        Ok(())
    }

    /// Place brick entities on map bricks and on randomly chosen OPEN cells,
    /// keeping every starting position's neighbourhood clear.
    fn spawn_bricks(&mut self, starts: &[Cell]) -> Result<(), SimError> {
        let chance = self.settings().brick_spawn_chance;
        let layout: Vec<(Cell, CellType)> = self.grid().iter().map(|(cell, c)| (cell, c.cell_type)).collect();

        for (cell, cell_type) in layout {
            let is_brick = match cell_type {
                CellType::Brick => true,
                CellType::Open => {
                    let clear_of_spawns = starts.iter().all(|s| s.chebyshev(cell) > 1);
                    clear_of_spawns && self.rng.gen::<f32>() < chance
                }
                CellType::Spawn | CellType::Solid => false,
            };
            if !is_brick {
                continue;
            }

            self.world.resource_mut::<Grid>().set_cell_type(cell, CellType::Brick);
            let brick = self.create_entity(BrickBundle::new(cell));
            self.add_behaviour(brick, Behaviour::Damagable(Damagable::new(1.0).destroyed_on_death()))?;
        }
        Ok(())
    }

    fn spawn_player(&mut self, id: &str, cell: Cell, is_bot: bool) -> Result<Entity, SimError> {
        let (stats, health, difficulty) = {
            let settings = self.settings();
            (settings.default_stats, settings.player_health, settings.difficulty)
        };

        let entity = self.create_entity(PlayerBundle::new(id, cell, stats, is_bot));
        self.add_behaviour(entity, Behaviour::Movement(Movement::new(stats.speed)))?;
        self.add_behaviour(entity, Behaviour::Damagable(Damagable::new(health)))?;
        if is_bot {
            self.world.entity_mut(entity).insert(BotBrain::new(difficulty));
        }
        self.players.push((id.to_string(), entity));

        debug!(player = id, is_bot, ?cell, "player spawned");
        Ok(entity)
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Run one simulation step at absolute time `time` (milliseconds).
    pub fn mutate(&mut self, time: u64) {
        let started_at = *self.started_at.get_or_insert(time);
        self.time = time;
        self.tick += 1;
        trace!(tick = self.tick, elapsed = time.saturating_sub(started_at), "tick");

        let order = self.entities.clone();
        for entity in order {
            let Some(kind) = self.kind_of(entity) else {
                continue;
            };
            systems::update_entity(self, entity, kind, time);
        }

        if !self.game_over_reported && self.is_game_over() {
            self.game_over_reported = true;
            info!(tick = self.tick, winner = ?self.winner(), "game over");
        }
    }

    // ------------------------------------------------------------------------
    // Entity registry
    // ------------------------------------------------------------------------

    /// Spawn an entity and register it in the live set and position index.
    pub fn create_entity<B: Bundle>(&mut self, bundle: B) -> Entity {
        let entity = self.world.spawn(bundle).id();
        if let Some(position) = self.world.get::<Position>(entity).copied() {
            self.world.resource_mut::<PositionIndex>().insert(entity, position.round());
        }
        self.entities.push(entity);
        entity
    }

    /// Remove an entity and purge references to it. Returns false if it was
    /// already gone.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        if !self.contains(entity) {
            return false;
        }

        self.world.resource_mut::<PositionIndex>().remove(entity);
        self.world.despawn(entity);
        self.entities.retain(|&e| e != entity);
        self.players.retain(|(_, e)| *e != entity);

        for &other in &self.entities {
            if let Some(mut brain) = self.world.get_mut::<BotBrain>(other) {
                brain.forget(entity);
            }
        }
        true
    }

    /// Attach a behaviour to a live entity.
    pub fn add_behaviour(&mut self, entity: Entity, behaviour: Behaviour) -> Result<(), SimError> {
        behaviour::add_behaviour(&mut self.world, entity, behaviour)
    }

    pub fn has_behaviour(&self, entity: Entity, kind: BehaviourKind) -> bool {
        behaviour::has_behaviour(&self.world, entity, kind)
    }

    /// Move an entity and re-index it under its new rounded cell.
    pub fn update_entity_position(&mut self, entity: Entity, position: Position) {
        let Some(mut current) = self.world.get_mut::<Position>(entity) else {
            return;
        };
        *current = position;
        self.world.resource_mut::<PositionIndex>().insert(entity, position.round());
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.get::<EntityKind>(entity).is_some()
    }

    pub fn kind_of(&self, entity: Entity) -> Option<EntityKind> {
        self.world.get::<EntityKind>(entity).copied()
    }

    pub fn position_of(&self, entity: Entity) -> Option<Position> {
        self.world.get::<Position>(entity).copied()
    }

    pub fn cell_of(&self, entity: Entity) -> Option<Cell> {
        self.position_of(entity).map(|p| p.round())
    }

    pub fn is_collidable(&self, entity: Entity) -> bool {
        self.world.get::<Collidable>(entity).is_some_and(|c| c.0)
    }

    /// Live entities without health count as alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.contains(entity) && self.world.get::<Damagable>(entity).map_or(true, |d| d.is_alive())
    }

    /// Live entities in insertion order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    // ------------------------------------------------------------------------
    // Grid queries
    // ------------------------------------------------------------------------

    pub fn position_is_in_bounds(&self, cell: Cell) -> bool {
        self.grid().in_bounds(cell)
    }

    /// SOLID or BRICK.
    pub fn position_is_blocked(&self, cell: Cell) -> bool {
        self.grid().is_blocked(cell)
    }

    /// In bounds, not blocked, and free of collidable entities.
    pub fn position_is_traversable(&self, cell: Cell) -> bool {
        self.position_is_traversable_except(cell, None)
    }

    /// Traversability check that disregards `ignore` (e.g. the mover itself).
    pub fn position_is_traversable_except(&self, cell: Cell, ignore: Option<Entity>) -> bool {
        self.position_is_in_bounds(cell)
            && !self.position_is_blocked(cell)
            && !self
                .position_index()
                .at(cell)
                .iter()
                .any(|&e| Some(e) != ignore && self.is_collidable(e))
    }

    /// Entities whose rounded position is `cell`, in arrival order.
    pub fn entities_at(&self, cell: Cell) -> Vec<Entity> {
        self.position_index().at(cell).to_vec()
    }

    pub fn entities_with_behaviour_at(&self, kind: BehaviourKind, cell: Cell) -> Vec<Entity> {
        self.position_index()
            .at(cell)
            .iter()
            .copied()
            .filter(|&e| self.has_behaviour(e, kind))
            .collect()
    }

    pub fn entities_of_kind_at(&self, kind: EntityKind, cell: Cell) -> Vec<Entity> {
        self.position_index()
            .at(cell)
            .iter()
            .copied()
            .filter(|&e| self.kind_of(e) == Some(kind))
            .collect()
    }

    /// Turn a destroyed brick cell back into floor.
    pub fn open_cell(&mut self, cell: Cell) {
        self.world.resource_mut::<Grid>().set_cell_type(cell, CellType::Open);
    }

    // ------------------------------------------------------------------------
    // Command surface
    // ------------------------------------------------------------------------

    /// Start moving a player. No-op for unknown or dead players and after the
    /// match has ended.
    pub fn set_moving(&mut self, player_id: &str, direction: Direction) {
        let Some(entity) = self.active_player(player_id) else {
            return;
        };
        if let Some(mut movement) = self.world.get_mut::<Movement>(entity) {
            movement.set_moving(direction, Movement::UNBOUNDED);
        }
    }

    /// Release a direction key.
    pub fn stop_moving(&mut self, player_id: &str, direction: Direction) {
        let Some(entity) = self.active_player(player_id) else {
            return;
        };
        if let Some(mut movement) = self.world.get_mut::<Movement>(entity) {
            movement.stop_moving(direction);
        }
    }

    /// Place a bomb under a player. Returns the bomb if one was placed.
    pub fn place_bomb(&mut self, player_id: &str) -> Option<Entity> {
        let entity = self.active_player(player_id)?;
        bomb::place_bomb(self, entity)
    }

    fn active_player(&self, player_id: &str) -> Option<Entity> {
        if self.is_game_over() {
            return None;
        }
        self.player_entity(player_id).filter(|&e| self.is_alive(e))
    }

    // ------------------------------------------------------------------------
    // Match state
    // ------------------------------------------------------------------------

    pub fn player_entity(&self, player_id: &str) -> Option<Entity> {
        self.players
            .iter()
            .find(|(id, _)| id == player_id)
            .map(|&(_, entity)| entity)
    }

    /// `(player id, entity)` pairs in join order.
    pub fn players(&self) -> impl Iterator<Item = (&str, Entity)> {
        self.players.iter().map(|(id, e)| (id.as_str(), *e))
    }

    pub fn alive_players(&self) -> impl Iterator<Item = (&str, Entity)> {
        self.players().filter(|&(_, e)| self.is_alive(e))
    }

    /// True once nobody is alive, or when a multi-player match is down to one
    /// survivor.
    pub fn is_game_over(&self) -> bool {
        let alive = self.alive_players().count();
        if self.players.len() > 1 {
            alive <= 1
        } else {
            alive == 0
        }
    }

    /// The last player standing, once the match is over.
    pub fn winner(&self) -> Option<&str> {
        if self.players.len() < 2 {
            return None;
        }
        let mut alive = self.alive_players();
        match (alive.next(), alive.next()) {
            (Some((id, _)), None) => Some(id),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn settings(&self) -> &RoomSettings {
        self.world.resource::<RoomSettings>()
    }

    pub fn grid(&self) -> &Grid {
        self.world.resource::<Grid>()
    }

    pub fn position_index(&self) -> &PositionIndex {
        self.world.resource::<PositionIndex>()
    }

    /// Run `f` with the settings and the match random source.
    pub fn with_settings_and_rng<R>(&mut self, f: impl FnOnce(&RoomSettings, &mut dyn RngCore) -> R) -> R {
        let settings = self.world.resource::<RoomSettings>();
        f(settings, self.rng.as_mut())
    }

    /// Number of ticks run so far.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Timestamp of the latest tick (milliseconds).
    pub fn current_time(&self) -> u64 {
        self.time
    }

    /// Milliseconds since the first tick.
    pub fn elapsed(&self) -> u64 {
        self.started_at.map_or(0, |start| self.time.saturating_sub(start))
    }

    /// Get a snapshot of the current match state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_room(self)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MapLayout;
    use crate::test_support::{layout, quiet_settings, room_from_rows, run_until, stepped};

    #[test]
    fn test_too_many_players_is_fatal() {
        let settings = quiet_settings(MapLayout::classic(13, 11));
        let result = Room::new(settings, &["a", "b", "c", "d", "e"]);
        assert!(matches!(
            result,
            Err(SimError::TooManyPlayers { requested: 5, available: 4 })
        ));
    }

    #[test]
    fn test_bots_count_toward_spawn_slots() {
        let mut settings = quiet_settings(MapLayout::classic(13, 11));
        settings.bot_count = 2;
        assert!(Room::new(settings.clone(), &["a", "b", "c"]).is_err());
        assert!(Room::new(settings, &["a", "b"]).is_ok());
    }

    #[test]
    fn test_duplicate_player_rejected() {
        let settings = quiet_settings(MapLayout::classic(13, 11));
        assert!(matches!(
            Room::new(settings, &["a", "a"]),
            Err(SimError::DuplicatePlayer(_))
        ));
    }

    #[test]
    fn test_repeated_spawn_cell_is_fatal() {
        let mut map = layout(&["#####", "#S..#", "#####"]);
        map.spawns.push(Cell::new(1, 1));
        let result = Room::with_rng(quiet_settings(map), &["a", "b"], stepped());
        assert!(matches!(result, Err(SimError::InvalidMap(_))));
    }

    #[test]
    fn test_four_players_distinct_spawns_with_clear_buffer() {
        let mut settings = quiet_settings(MapLayout::classic(13, 11));
        settings.brick_spawn_chance = 1.0;
        let room = Room::with_rng(settings, &["a", "b", "c", "d"], stepped()).unwrap();

        let spawns: HashSet<Cell> = room.players().filter_map(|(_, e)| room.cell_of(e)).collect();
        assert_eq!(spawns.len(), 4);

        let bricks: Vec<Cell> = room
            .grid()
            .iter()
            .filter(|(_, c)| c.cell_type == CellType::Brick)
            .map(|(cell, _)| cell)
            .collect();
        assert!(!bricks.is_empty());
        for spawn in &spawns {
            assert!(bricks.iter().all(|b| b.chebyshev(*spawn) > 1));
        }

        // Every brick cell carries a brick entity.
        for brick in bricks {
            assert_eq!(room.entities_of_kind_at(EntityKind::Brick, brick).len(), 1);
        }
    }

    #[test]
    fn test_no_random_bricks_when_chance_is_zero() {
        let room = room_from_rows(&["#######", "#S...S#", "#######"], &["a", "b"]);
        assert!(room.grid().iter().all(|(_, c)| c.cell_type != CellType::Brick));
        assert_eq!(room.entities().len(), 2);
    }

    #[test]
    fn test_map_bricks_get_entities() {
        let room = room_from_rows(&["#######", "#S.B..#", "#######"], &["a"]);
        let bricks = room.entities_of_kind_at(EntityKind::Brick, Cell::new(3, 1));
        assert_eq!(bricks.len(), 1);
        assert!(room.has_behaviour(bricks[0], BehaviourKind::Damagable));
    }

    #[test]
    fn test_traversability_queries() {
        let mut room = room_from_rows(&["#######", "#S.B..#", "#######"], &["a"]);
        assert!(room.position_is_traversable(Cell::new(2, 1)));
        assert!(!room.position_is_traversable(Cell::new(3, 1)));
        assert!(room.position_is_blocked(Cell::new(0, 0)));
        assert!(!room.position_is_in_bounds(Cell::new(7, 1)));
        assert!(!room.position_is_traversable(Cell::new(-1, 1)));

        // A bomb blocks its cell, but not for the bomb itself.
        room.mutate(0);
        let bomb = room.place_bomb("a").unwrap();
        let cell = Cell::new(1, 1);
        assert!(!room.position_is_traversable(cell));
        assert!(room.position_is_traversable_except(cell, Some(bomb)));

        // Players are not collidable.
        assert_eq!(room.entities_with_behaviour_at(BehaviourKind::Movement, cell).len(), 1);
    }

    #[test]
    fn test_position_index_tracks_moves() {
        let mut room = room_from_rows(&["#######", "#S....#", "#######"], &["a"]);
        let player = room.player_entity("a").unwrap();

        room.update_entity_position(player, Position::new(2.4, 1.0));
        assert_eq!(room.entities_at(Cell::new(2, 1)), vec![player]);
        assert!(room.entities_at(Cell::new(1, 1)).is_empty());

        room.update_entity_position(player, Position::new(2.6, 1.0));
        assert_eq!(room.position_index().cell_of(player), Some(Cell::new(3, 1)));
    }

    #[test]
    fn test_remove_entity_is_idempotent_and_purges_index() {
        let mut room = room_from_rows(&["#######", "#S.B..#", "#######"], &["a"]);
        let brick = room.entities_of_kind_at(EntityKind::Brick, Cell::new(3, 1))[0];

        assert!(room.remove_entity(brick));
        assert!(!room.remove_entity(brick));
        assert!(!room.contains(brick));
        assert!(room.entities_at(Cell::new(3, 1)).is_empty());
        assert!(!room.entities().contains(&brick));
    }

    #[test]
    fn test_remove_purges_bot_memory() {
        let mut settings = quiet_settings(layout(&["#######", "#S.B.S#", "#######"]));
        settings.bot_count = 1;
        let mut room = Room::with_rng(settings, &["a"], stepped()).unwrap();
        let bot = room.player_entity("bot-1").unwrap();
        let brick = room.entities_of_kind_at(EntityKind::Brick, Cell::new(3, 1))[0];

        room.world_mut().get_mut::<BotBrain>(bot).unwrap().seen_bricks.insert(brick);
        room.remove_entity(brick);
        assert!(room.world().get::<BotBrain>(bot).unwrap().seen_bricks.is_empty());
    }

    #[test]
    fn test_entities_created_mid_tick_wait_for_next_tick() {
        let mut room = room_from_rows(&["#######", "#S....#", "#######"], &["a"]);
        room.mutate(0);
        let bomb = room.place_bomb("a").unwrap();
        let order: Vec<Entity> = room.entities().to_vec();
        assert_eq!(order.last(), Some(&bomb));
    }

    #[test]
    fn test_commands_ignored_for_dead_players() {
        let mut room = room_from_rows(&["#######", "#S...S#", "#######"], &["a", "b"]);
        let a = room.player_entity("a").unwrap();
        room.world_mut().get_mut::<Damagable>(a).unwrap().modify_health(-1000.0, None);

        room.set_moving("a", Direction::Right);
        assert!(!room.world().get::<Movement>(a).unwrap().wants_to_move);
        assert!(room.place_bomb("a").is_none());
        assert!(room.is_game_over());
        assert_eq!(room.winner(), Some("b"));

        // Game over also freezes the survivor.
        assert!(room.place_bomb("b").is_none());
    }

    #[test]
    fn test_unknown_player_commands_are_noops() {
        let mut room = room_from_rows(&["#######", "#S....#", "#######"], &["a"]);
        room.set_moving("ghost", Direction::Right);
        room.stop_moving("ghost", Direction::Right);
        assert!(room.place_bomb("ghost").is_none());
    }

    #[test]
    fn test_single_player_match_ends_on_death() {
        let mut room = room_from_rows(&["#######", "#S....#", "#######"], &["a"]);
        assert!(!room.is_game_over());
        let a = room.player_entity("a").unwrap();
        room.world_mut().get_mut::<Damagable>(a).unwrap().modify_health(-1000.0, None);
        assert!(room.is_game_over());
        assert_eq!(room.winner(), None);
    }

    #[test]
    fn test_time_and_tick_counters() {
        let mut room = room_from_rows(&["#######", "#S....#", "#######"], &["a"]);
        assert_eq!(room.current_tick(), 0);
        assert_eq!(room.elapsed(), 0);
        room.mutate(1_000);
        room.mutate(1_100);
        assert_eq!(room.current_tick(), 2);
        assert_eq!(room.current_time(), 1_100);
        assert_eq!(room.elapsed(), 100);
    }

    #[test]
    fn test_bomb_end_to_end() {
        let mut room = room_from_rows(&["#########", "#S......#", "#########"], &["a"]);
        {
            let a = room.player_entity("a").unwrap();
            let mut stats = room.world_mut().get_mut::<PlayerStats>(a).unwrap();
            stats.explosion_radius = 3;
            stats.bomb_timer = 1.0;
        }

        let start = 5_000;
        room.mutate(start);
        let bomb = room.place_bomb("a").unwrap();
        let bomb_cell = room.cell_of(bomb).unwrap();

        // Walk away so the blast does not end the match.
        room.set_moving("a", Direction::Right);
        let end = run_until(&mut room, start, start + 1_100);
        assert!(end > start + 1_000);

        assert!(!room.contains(bomb));
        let explosions = room.entities_of_kind_at(EntityKind::Explosion, bomb_cell);
        assert_eq!(explosions.len(), 1);
        let explosion = room.world().get::<Explosion>(explosions[0]).unwrap();
        assert_eq!(explosion.cells[0].position, bomb_cell);
        assert!(explosion.cells[0].is_centre);
    }
}
