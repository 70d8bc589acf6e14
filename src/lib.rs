//! Danmaku Core - combat simulation for a vertical-scrolling bullet-hell shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (projectiles, bosses, hazards, collisions, encounter state)
//! - `tuning`: Data-driven combat balance and palette

pub mod sim;
pub mod tuning;

pub use tuning::{ConfigError, Palette, Playfield, Rgb, Tuning};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Fixed simulation rate (ticks per second)
    pub const TICK_RATE: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;

    /// Playfield dimensions (screen space, +y points down)
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;
    /// Hostile projectiles survive this far past the visible edge
    pub const HOSTILE_MARGIN: f32 = 50.0;
    /// Player shots are culled almost immediately
    pub const PLAYER_SHOT_MARGIN: f32 = 10.0;

    /// Projectile defaults
    pub const PROJECTILE_MAX_AGE: u32 = 600;
    pub const PROJECTILE_SIZE: f32 = 8.0;
    pub const MAX_HOSTILE_PROJECTILES: usize = 500;
    pub const MAX_PLAYER_PROJECTILES: usize = 200;

    /// Boss defaults
    pub const BOSS_SIZE: f32 = 80.0;
    pub const BOSS_SPAWN_Y: f32 = -50.0;
    pub const BOSS_ENTRANCE_TICKS: u32 = 180;
    /// Boss stops descending once it reaches this depth
    pub const BOSS_ENTRY_DEPTH: f32 = 120.0;
    pub const BOSS_DESCENT_SPEED: f32 = 2.0;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 40.0;
    pub const PLAYER_SHOT_SPEED: f32 = 7.0;
    pub const PLAYER_SHOT_SIZE: f32 = 5.0;
    pub const STARTING_LIVES: u32 = 3;

    /// Basic enemy defaults
    pub const ENEMY_SPEED: f32 = 2.0;
    pub const ENEMY_SIZE: f32 = 30.0;
    pub const ENEMY_SCORE: u64 = 10;
}

/// Normalize angle to (-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Heading of a velocity vector in radians
#[inline]
pub fn heading(vel: Vec2) -> f32 {
    vel.y.atan2(vel.x)
}

/// Velocity with the given heading and speed
#[inline]
pub fn from_heading(angle: f32, speed: f32) -> Vec2 {
    Vec2::new(angle.cos() * speed, angle.sin() * speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_range() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-5);
        assert!((normalize_angle(-3.5 * PI) - 0.5 * PI).abs() < 1e-4);
        assert_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn test_heading_roundtrip() {
        let v = from_heading(1.2, 4.0);
        assert!((heading(v) - 1.2).abs() < 1e-5);
        assert!((v.length() - 4.0).abs() < 1e-5);
    }
}
