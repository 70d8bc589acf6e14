//! Falling pickups
//!
//! Pickups drift down from the top edge on a fixed cadence and are collected
//! by touching them, invulnerable or not.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::events::GameEvent;
use super::player::Player;
use crate::tuning::{Playfield, Tuning};

const BOB_RATE: f32 = 0.1;
const BOB_AMPLITUDE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    LifeUp,
}

impl PickupKind {
    pub const ALL: [PickupKind; 1] = [PickupKind::LifeUp];

    pub fn name(self) -> &'static str {
        match self {
            PickupKind::LifeUp => "life_up",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: PickupKind,
    /// Fall track; the drawn position floats around it
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
    pub active: bool,
    bob: f32,
}

impl Pickup {
    pub fn new(kind: PickupKind, pos: Vec2, tuning: &Tuning) -> Self {
        Self {
            kind,
            pos,
            size: tuning.pickup_size,
            speed: tuning.pickup_speed,
            active: true,
            bob: 0.0,
        }
    }

    /// Random kind at a random column just above the top edge
    pub fn spawn<R: Rng + ?Sized>(tuning: &Tuning, rng: &mut R) -> Self {
        let kind = PickupKind::ALL[rng.random_range(0..PickupKind::ALL.len())];
        let size = tuning.pickup_size;
        let max_x = (tuning.playfield.width - size).max(size);
        let x = rng.random_range(size..=max_x);
        Self::new(kind, Vec2::new(x, -size), tuning)
    }

    /// Drawn position including the float offset
    pub fn float_pos(&self) -> Vec2 {
        self.pos + Vec2::new(0.0, self.bob.sin() * BOB_AMPLITUDE)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.float_pos(), Vec2::splat(self.size))
    }

    pub fn update(&mut self, field: &Playfield) {
        if !self.active {
            return;
        }
        self.pos.y += self.speed;
        self.bob += BOB_RATE;
        if self.pos.y > field.height + self.size {
            self.active = false;
        }
    }

    /// Hand the pickup's effect to `player`
    pub fn apply(&self, player: &mut Player) -> GameEvent {
        match self.kind {
            PickupKind::LifeUp => {
                player.lives += 1;
                GameEvent::LifeGained { lives: player.lives }
            }
        }
    }
}
