//! Data-driven combat balance
//!
//! Every balance value the simulation reads lives in [`Tuning`]. Defaults
//! reproduce the shipped game; JSON overrides are validated before use.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// RGB colour tag carried by projectiles for the renderer
pub type Rgb = [u8; 3];

/// Errors raised while loading tuning data
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Immutable colour table handed to pattern emitters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub white: Rgb,
    pub red: Rgb,
    pub green: Rgb,
    pub blue: Rgb,
    pub yellow: Rgb,
    pub cyan: Rgb,
    pub magenta: Rgb,
    pub orange: Rgb,
    pub purple: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            white: [255, 255, 255],
            red: [255, 0, 0],
            green: [0, 255, 0],
            blue: [0, 0, 255],
            yellow: [255, 255, 0],
            cyan: [0, 255, 255],
            magenta: [255, 0, 255],
            orange: [255, 165, 0],
            purple: [128, 0, 128],
        }
    }
}

/// Visible play area in screen space (origin top-left, +y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
        }
    }
}

impl Playfield {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether `pos` lies inside the playfield grown by `margin` on all sides
    #[inline]
    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.x <= self.width + margin
            && pos.y >= -margin
            && pos.y <= self.height + margin
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Complete combat balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub playfield: Playfield,
    pub palette: Palette,

    // === Projectiles ===
    pub hostile_margin: f32,
    pub player_shot_margin: f32,
    pub hostile_capacity: usize,
    pub player_capacity: usize,
    pub projectile_max_age: u32,

    // === Boss ===
    pub boss_size: f32,
    pub boss_entrance_ticks: u32,
    pub boss_entry_depth: f32,
    pub boss_descent_speed: f32,
    /// Score awarded per point of max health when a spell card is broken
    pub card_score_per_health: u64,
    /// Environmental boss health per player level
    pub environmental_health_per_level: f32,

    // === Player ===
    pub player_size: f32,
    pub starting_lives: u32,
    pub invulnerability_ticks: u32,
    pub shield_invulnerability_ticks: u32,
    pub shield_hits: u32,
    pub attack_power: i32,
    /// Lives lost when touching a boss
    pub boss_contact_lives: u32,
    /// Damage dealt to an enemy that rams the player
    pub contact_damage: f32,

    // === Weapons ===
    pub shot_cooldown: u32,
    pub rapid_cooldown: u32,
    pub laser_cooldown: u32,
    pub bomb_cooldown: u32,
    pub laser_max_hits: u32,
    pub bomb_radius: f32,
    pub bomb_damage: f32,

    // === Special attack ===
    pub special_duration: u32,
    pub special_gauge_per_stock: u32,
    pub special_max_stock: u32,
    pub special_enemy_damage: f32,
    /// Fraction of the active card's max health a full special drains
    pub special_boss_fraction: f32,

    // === Rewards ===
    pub base_experience: u32,
    pub boss_experience_multiplier: f32,
    pub card_experience_multiplier: f32,

    // === Hazards ===
    pub wall_interval: u32,
    pub gravity_interval: u32,
    pub max_gravity_fields: usize,
    pub darkness_duration: u32,
    pub darkness_cooldown: u32,
    pub darkness_radius: f32,

    // === Pickups & drones ===
    pub pickup_interval: u32,
    pub pickup_size: f32,
    pub pickup_speed: f32,
    pub drone_size: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            playfield: Playfield::default(),
            palette: Palette::default(),

            hostile_margin: HOSTILE_MARGIN,
            player_shot_margin: PLAYER_SHOT_MARGIN,
            hostile_capacity: MAX_HOSTILE_PROJECTILES,
            player_capacity: MAX_PLAYER_PROJECTILES,
            projectile_max_age: PROJECTILE_MAX_AGE,

            boss_size: BOSS_SIZE,
            boss_entrance_ticks: BOSS_ENTRANCE_TICKS,
            boss_entry_depth: BOSS_ENTRY_DEPTH,
            boss_descent_speed: BOSS_DESCENT_SPEED,
            card_score_per_health: 10,
            environmental_health_per_level: 150.0,

            player_size: PLAYER_SIZE,
            starting_lives: STARTING_LIVES,
            invulnerability_ticks: 120,
            shield_invulnerability_ticks: 60,
            shield_hits: 5,
            attack_power: 1,
            boss_contact_lives: 2,
            contact_damage: 3.0,

            shot_cooldown: 15,
            rapid_cooldown: 5,
            laser_cooldown: 30,
            bomb_cooldown: 60,
            laser_max_hits: 5,
            bomb_radius: 80.0,
            bomb_damage: 10.0,

            special_duration: 300,
            special_gauge_per_stock: 1800,
            special_max_stock: 3,
            special_enemy_damage: 0.5,
            special_boss_fraction: 0.3,

            base_experience: 10,
            boss_experience_multiplier: 10.0,
            card_experience_multiplier: 2.0,

            wall_interval: 120,
            gravity_interval: 240,
            max_gravity_fields: 3,
            darkness_duration: 420,
            darkness_cooldown: 360,
            darkness_radius: 250.0,

            pickup_interval: 600,
            pickup_size: 25.0,
            pickup_speed: 3.0,
            drone_size: PLAYER_SIZE / 2.0,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document. Missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Like [`Tuning::from_json`], but falls back to defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning: {e}");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        fn positive(field: &'static str, value: f32) -> ConfigResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        }
        fn non_zero(field: &'static str, value: u64) -> ConfigResult<()> {
            if value > 0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                })
            }
        }

        positive("playfield.width", self.playfield.width)?;
        positive("playfield.height", self.playfield.height)?;
        positive("boss_size", self.boss_size)?;
        positive("player_size", self.player_size)?;
        positive("bomb_radius", self.bomb_radius)?;
        positive("environmental_health_per_level", self.environmental_health_per_level)?;
        non_zero("hostile_capacity", self.hostile_capacity as u64)?;
        non_zero("player_capacity", self.player_capacity as u64)?;
        non_zero("projectile_max_age", self.projectile_max_age as u64)?;
        non_zero("laser_max_hits", self.laser_max_hits as u64)?;
        non_zero("special_duration", self.special_duration as u64)?;
        non_zero("special_gauge_per_stock", self.special_gauge_per_stock as u64)?;
        non_zero("wall_interval", self.wall_interval as u64)?;
        non_zero("gravity_interval", self.gravity_interval as u64)?;
        non_zero("pickup_interval", self.pickup_interval as u64)?;
        positive("pickup_size", self.pickup_size)?;

        if self.hostile_margin < 0.0 || self.player_shot_margin < 0.0 {
            return Err(ConfigError::Invalid {
                field: "hostile_margin",
                reason: "margins cannot be negative".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.special_boss_fraction) {
            return Err(ConfigError::Invalid {
                field: "special_boss_fraction",
                reason: format!("must be within [0, 1], got {}", self.special_boss_fraction),
            });
        }
        Ok(())
    }
}
