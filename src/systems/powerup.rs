//! Power-up drops and collection.
//!
//! Drops use a rarity curve: with `roll` uniform in [0, 1), the tier is
//! `floor(max_rarity * roll^exponent) + 1`. Larger exponents push more rolls
//! toward tier 1.

use crate::components::*;
use crate::grid::Cell;
use crate::room::Room;
use crate::settings::{PowerupType, RoomSettings};
use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use tracing::{debug, warn};

/// Map a uniform roll in [0, 1) to a rarity tier in `1..=max_rarity`.
pub fn rarity_tier(max_rarity: u32, roll: f32, exponent: f32) -> u32 {
    (max_rarity as f32 * roll.powf(exponent)).floor() as u32 + 1
}

/// Roll for a drop: spawn chance first, then a tier, then a uniform pick
/// among the catalog entries of that tier.
pub fn roll_powerup(settings: &RoomSettings, rng: &mut dyn RngCore) -> Option<PowerupType> {
    if settings.powerups.is_empty() || rng.gen::<f32>() >= settings.powerup_spawn_chance {
        return None;
    }

    let tier = rarity_tier(settings.max_rarity(), rng.gen::<f32>(), settings.rarity_exponent);
    let candidates: Vec<&PowerupType> = settings.powerups.iter().filter(|p| p.rarity == tier).collect();
    let picked = candidates.choose(rng).map(|&p| p.clone());
    if picked.is_none() {
        warn!(tier, "no power-up for rolled tier");
    }
    picked
}

/// Maybe drop a power-up on `cell`.
pub fn maybe_spawn(room: &mut Room, cell: Cell) -> Option<Entity> {
    let kind = room.with_settings_and_rng(roll_powerup)?;
    debug!(name = %kind.name, ?cell, "power-up dropped");
    Some(room.create_entity(PowerupBundle::new(cell, kind)))
}

/// Collect every power-up on `player`'s cell. Returns how many were taken.
pub fn collect(room: &mut Room, player: Entity) -> usize {
    let Some(cell) = room.cell_of(player) else {
        return 0;
    };

    let mut collected = 0;
    for pickup in room.entities_of_kind_at(EntityKind::Powerup, cell) {
        let Some(kind) = room.world().get::<Powerup>(pickup).map(|p| p.kind.clone()) else {
            continue;
        };
        if let Some(mut stats) = room.world_mut().get_mut::<PlayerStats>(player) {
            kind.stat.apply(&mut stats, kind.delta);
        }
        room.remove_entity(pickup);
        debug!(?player, name = %kind.name, "power-up collected");
        collected += 1;
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Stat;
    use crate::test_support::room_from_rows;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rarity_tier_range() {
        assert_eq!(rarity_tier(3, 0.0, 2.0), 1);
        assert_eq!(rarity_tier(3, 0.5, 1.0), 2);
        assert_eq!(rarity_tier(3, 0.999, 1.0), 3);
        assert_eq!(rarity_tier(1, 0.999, 2.0), 1);
        // The curve's upper limit lands one past the top tier.
        assert_eq!(rarity_tier(2, 0.0, 2.0), 1);
        assert_eq!(rarity_tier(2, 1.0, 2.0), 3);

        for i in 0..1000 {
            let roll = i as f32 / 1000.0;
            let tier = rarity_tier(4, roll, 2.0);
            assert!((1..=4).contains(&tier));
        }
    }

    #[test]
    fn test_higher_exponent_favours_common_tier() {
        let common = |exponent: f32| (0..1000).filter(|&i| rarity_tier(3, i as f32 / 1000.0, exponent) == 1).count();
        assert!(common(3.0) > common(1.0));
    }

    #[test]
    fn test_roll_respects_chance() {
        let mut rng = StdRng::seed_from_u64(7);
        let never = RoomSettings {
            powerup_spawn_chance: 0.0,
            ..Default::default()
        };
        assert!((0..100).all(|_| roll_powerup(&never, &mut rng).is_none()));

        let always = RoomSettings {
            powerup_spawn_chance: 1.0,
            ..Default::default()
        };
        for _ in 0..100 {
            let drop = roll_powerup(&always, &mut rng).unwrap();
            assert!((1..=always.max_rarity()).contains(&drop.rarity));
        }
    }

    #[test]
    fn test_collect_applies_stat_and_removes() {
        let mut room = room_from_rows(&["#####", "#S..#", "#####"], &["a"]);
        let a = room.player_entity("a").unwrap();
        let cell = Cell::new(1, 1);
        room.create_entity(PowerupBundle::new(cell, PowerupType::new("Bomb Up", Stat::BombCount, 1.0, 1)));
        room.create_entity(PowerupBundle::new(cell, PowerupType::new("Fire Up", Stat::ExplosionRadius, 1.0, 1)));

        assert_eq!(collect(&mut room, a), 2);
        let stats = room.world().get::<PlayerStats>(a).unwrap();
        assert_eq!(stats.bomb_count, 2);
        assert_eq!(stats.explosion_radius, 4);
        assert!(room.entities_of_kind_at(EntityKind::Powerup, cell).is_empty());
    }

    #[test]
    fn test_collect_elsewhere_is_noop() {
        let mut room = room_from_rows(&["#####", "#S..#", "#####"], &["a"]);
        let a = room.player_entity("a").unwrap();
        let pickup = room.create_entity(PowerupBundle::new(
            Cell::new(3, 1),
            PowerupType::new("Speed Up", Stat::Speed, 0.5, 1),
        ));
        assert_eq!(collect(&mut room, a), 0);
        assert!(room.contains(pickup));
    }
}
