//! Match settings: map, tickrate, spawn chances, stats and the power-up catalog.
//!
//! Settings are plain serde data so a host can ship them as JSON. They are
//! validated once, at load/construction time; nothing downstream re-checks
//! them.

use crate::components::PlayerStats;
use crate::error::SimError;
use crate::grid::MapLayout;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Bot difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Normal,
    Hard,
}

/// A player stat that power-ups can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Speed,
    ExplosionRadius,
    ExplosionDuration,
    BombCount,
    BombTimer,
}

impl Stat {
    /// Apply `stats.<stat> += delta`.
    ///
    /// Not clamped to [`StatBounds`]; values only floor at zero. Integer stats
    /// round the result.
    pub fn apply(self, stats: &mut PlayerStats, delta: f32) {
        fn add_count(value: u32, delta: f32) -> u32 {
            (value as f32 + delta).round().max(0.0) as u32
        }

        match self {
            Stat::Speed => stats.speed = (stats.speed + delta).max(0.0),
            Stat::ExplosionRadius => {
                stats.explosion_radius = add_count(stats.explosion_radius, delta)
            }
            Stat::ExplosionDuration => {
                stats.explosion_duration = (stats.explosion_duration + delta).max(0.0)
            }
            Stat::BombCount => stats.bomb_count = add_count(stats.bomb_count, delta),
            Stat::BombTimer => stats.bomb_timer = (stats.bomb_timer + delta).max(0.0),
        }
    }
}

/// One entry in the power-up catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerupType {
    pub name: String,
    pub stat: Stat,
    pub delta: f32,
    /// Rarity tier, 1 = most common.
    pub rarity: u32,
}

impl PowerupType {
    pub fn new(name: &str, stat: Stat, delta: f32, rarity: u32) -> Self {
        Self {
            name: name.to_string(),
            stat,
            delta,
            rarity,
        }
    }

    /// The standard catalog.
    pub fn default_catalog() -> Vec<Self> {
        vec![
            Self::new("Bomb Up", Stat::BombCount, 1.0, 1),
            Self::new("Fire Up", Stat::ExplosionRadius, 1.0, 1),
            Self::new("Speed Up", Stat::Speed, 0.5, 1),
            Self::new("Long Burn", Stat::ExplosionDuration, 0.25, 2),
            Self::new("Short Fuse", Stat::BombTimer, -0.25, 2),
        ]
    }
}

/// Minimum and maximum allowed player stats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatBounds {
    pub min: PlayerStats,
    pub max: PlayerStats,
}

impl StatBounds {
    pub fn contains(&self, stats: &PlayerStats) -> bool {
        let (min, max) = (&self.min, &self.max);
        (min.speed..=max.speed).contains(&stats.speed)
            && (min.explosion_radius..=max.explosion_radius).contains(&stats.explosion_radius)
            && (min.explosion_duration..=max.explosion_duration).contains(&stats.explosion_duration)
            && (min.bomb_count..=max.bomb_count).contains(&stats.bomb_count)
            && (min.bomb_timer..=max.bomb_timer).contains(&stats.bomb_timer)
    }
}

impl Default for StatBounds {
    fn default() -> Self {
        Self {
            min: PlayerStats {
                speed: 2.0,
                explosion_radius: 2,
                explosion_duration: 0.5,
                bomb_count: 1,
                bomb_timer: 1.0,
            },
            max: PlayerStats {
                speed: 8.0,
                explosion_radius: 10,
                explosion_duration: 2.0,
                bomb_count: 8,
                bomb_timer: 3.0,
            },
        }
    }
}

/// Configuration for one match.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    /// Pre-parsed map.
    pub map: MapLayout,
    /// Number of bot-controlled players added after the human players.
    pub bot_count: usize,
    pub difficulty: Difficulty,
    /// Simulation ticks per second.
    pub tickrate: f32,
    /// Chance for each eligible OPEN cell to become a brick at setup.
    pub brick_spawn_chance: f32,
    /// Chance for a destroyed brick to drop a power-up.
    pub powerup_spawn_chance: f32,
    pub stat_bounds: StatBounds,
    pub default_stats: PlayerStats,
    pub powerups: Vec<PowerupType>,
    /// Exponent of the rarity curve: `tier = floor(max * roll^exp) + 1`.
    pub rarity_exponent: f32,
    pub player_health: f32,
    /// Damage an explosion deals to each victim.
    pub explosion_damage: f32,
    /// Blast intensity of placed bombs.
    pub bomb_power: f32,
    /// Cells per second for kicked bombs.
    pub bomb_slide_speed: f32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            map: MapLayout::default(),
            bot_count: 0,
            difficulty: Difficulty::Easy,
            tickrate: 30.0,
            brick_spawn_chance: 0.6,
            powerup_spawn_chance: 0.3,
            stat_bounds: StatBounds::default(),
            default_stats: PlayerStats::default(),
            powerups: PowerupType::default_catalog(),
            rarity_exponent: 2.0,
            player_health: 100.0,
            explosion_damage: 1000.0,
            bomb_power: 1.0,
            bomb_slide_speed: 6.0,
        }
    }
}

impl RoomSettings {
    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(data: &str) -> Result<Self, SimError> {
        let settings: Self = serde_json::from_str(data)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Highest rarity tier in the catalog (0 when the catalog is empty).
    pub fn max_rarity(&self) -> u32 {
        self.powerups.iter().map(|p| p.rarity).max().unwrap_or(0)
    }

    /// Reject settings that would fail later at spawn time.
    pub fn validate(&self) -> Result<(), SimError> {
        self.map.validate()?;

        if !(self.tickrate > 0.0) {
            return Err(invalid(format!("tickrate must be positive, got {}", self.tickrate)));
        }
        for (name, chance) in [
            ("brick_spawn_chance", self.brick_spawn_chance),
            ("powerup_spawn_chance", self.powerup_spawn_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(format!("{name} must be within [0, 1], got {chance}")));
            }
        }
        for (name, value) in [
            ("player_health", self.player_health),
            ("explosion_damage", self.explosion_damage),
            ("bomb_slide_speed", self.bomb_slide_speed),
        ] {
            if !(value > 0.0) {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if !(self.rarity_exponent > 0.0) {
            return Err(invalid("rarity_exponent must be positive".to_string()));
        }

        if let Some(p) = self.powerups.iter().find(|p| p.rarity == 0) {
            return Err(invalid(format!("power-up {:?} has rarity 0", p.name)));
        }
        if self.powerups.is_empty() && self.powerup_spawn_chance > 0.0 {
            return Err(invalid("power-ups can spawn but the catalog is empty".to_string()));
        }
        // Every tier the curve can produce must have at least one entry.
        for tier in 1..=self.max_rarity() {
            if !self.powerups.iter().any(|p| p.rarity == tier) {
                return Err(invalid(format!("no power-up defined for rarity tier {tier}")));
            }
        }

        if !self.stat_bounds.contains(&self.default_stats) {
            return Err(invalid("default stats are outside the stat bounds".to_string()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> SimError {
    SimError::InvalidSettings(message)
}
