//! Hazard actors spawned by the environmental boss
//!
//! Moving walls sweep horizontally across the playfield and hurt the player
//! on contact. Gravity fields drift around and bend projectile velocities.
//! Neither can be destroyed by damage; they leave with their owning boss.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Damageable, Rect};
use crate::from_heading;
use crate::tuning::Playfield;

pub const WALL_WIDTH: f32 = 20.0;
pub const WALL_HEIGHT: f32 = 150.0;
pub const WALL_SPEED: f32 = 3.0;

pub const FIELD_RADIUS: f32 = 80.0;
pub const FIELD_STRENGTH: f32 = 0.5;
pub const FIELD_DRIFT_SPEED: f32 = 1.5;

/// A tall bar crossing the playfield from one side to the other
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingWall {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// +1 moves right, -1 moves left
    pub direction: f32,
    pub speed: f32,
}

impl MovingWall {
    pub fn new(pos: Vec2, direction: f32) -> Self {
        Self {
            pos,
            size: Vec2::new(WALL_WIDTH, WALL_HEIGHT),
            direction: direction.signum(),
            speed: WALL_SPEED,
        }
    }

    /// Enter from a random side at a random height
    pub fn spawn<R: Rng + ?Sized>(field: &Playfield, rng: &mut R) -> Self {
        let y = rng.random_range(0.0..=(field.height - WALL_HEIGHT).max(0.0));
        if rng.random_bool(0.5) {
            Self::new(Vec2::new(-WALL_WIDTH, y), 1.0)
        } else {
            Self::new(Vec2::new(field.width, y), -1.0)
        }
    }

    pub fn update(&mut self) {
        self.pos.x += self.speed * self.direction;
    }

    /// Fully past either horizontal edge
    pub fn is_offscreen(&self, field: &Playfield) -> bool {
        self.pos.x + self.size.x < 0.0 || self.pos.x > field.width
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.pos + self.size)
    }
}

impl Damageable for MovingWall {
    fn apply_damage(&mut self, _amount: f32) -> bool {
        false
    }
}

/// A drifting well that pulls projectiles toward its center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GravityField {
    pub pos: Vec2,
    pub radius: f32,
    pub strength: f32,
    pub speed: f32,
    /// Drift heading in radians
    pub direction: f32,
}

impl GravityField {
    pub fn new(pos: Vec2, direction: f32) -> Self {
        Self {
            pos,
            radius: FIELD_RADIUS,
            strength: FIELD_STRENGTH,
            speed: FIELD_DRIFT_SPEED,
            direction,
        }
    }

    /// Random position at least 100 px from the edges, random drift heading
    pub fn spawn<R: Rng + ?Sized>(field: &Playfield, rng: &mut R) -> Self {
        let x = rng.random_range(100.0..=(field.width - 100.0).max(100.0));
        let y = rng.random_range(100.0..=(field.height - 100.0).max(100.0));
        Self::new(Vec2::new(x, y), rng.random_range(0.0..TAU))
    }

    /// Drift, reflecting the heading off the playfield edges
    pub fn update(&mut self, field: &Playfield) {
        self.pos += from_heading(self.direction, self.speed);
        if self.pos.x - self.radius < 0.0 || self.pos.x + self.radius > field.width {
            self.direction = PI - self.direction;
        }
        if self.pos.y - self.radius < 0.0 || self.pos.y + self.radius > field.height {
            self.direction = -self.direction;
        }
    }

    /// Velocity change for a projectile at `pos`, scaled by `1 - d/r`
    pub fn pull(&self, pos: Vec2) -> Vec2 {
        let offset = self.pos - pos;
        let distance = offset.length();
        if distance >= self.radius || distance == 0.0 {
            return Vec2::ZERO;
        }
        offset / distance * self.strength * (1.0 - distance / self.radius)
    }
}

impl Damageable for GravityField {
    fn apply_damage(&mut self, _amount: f32) -> bool {
        false
    }
}

/// Periodic vision-darkening around the boss (rendering hint only)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Darkness {
    pub active: bool,
    /// Ticks left in the current on/off state
    pub remaining: u32,
    pub duration: u32,
    pub cooldown: u32,
    pub vision_radius: f32,
}

impl Darkness {
    pub fn new(duration: u32, cooldown: u32, vision_radius: f32) -> Self {
        Self {
            active: false,
            remaining: 0,
            duration,
            cooldown,
            vision_radius,
        }
    }

    /// Start darkened immediately
    pub fn begin(&mut self) {
        self.active = true;
        self.remaining = self.duration;
    }

    pub fn update(&mut self) {
        if self.remaining > 0 {
            self.remaining -= 1;
            return;
        }
        self.active = !self.active;
        self.remaining = if self.active { self.duration } else { self.cooldown };
    }
}
