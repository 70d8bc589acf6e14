//! Regular enemies
//!
//! Nine kinds share one struct; per-kind stats come from a lookup table and
//! per-kind movement and firing live in small match arms. Health and speed
//! scale with the inbound difficulty multipliers.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::collision::{Damageable, Rect};
use super::projectile::{Projectile, Side};
use super::scheduler::ProgressionSnapshot;
use crate::consts::*;
use crate::tuning::{Palette, Playfield};
use crate::{from_heading, heading};

const SHOT_SPEED: f32 = 7.0;
const SHOT_SIZE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Basic,
    Fast,
    Tank,
    Zigzag,
    Sniper,
    Shield,
    Stopper,
    Kamikaze,
    Barrage,
}

/// Base stats for one kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindProfile {
    pub health: f32,
    /// Multiple of the base enemy speed
    pub speed: f32,
    pub size: f32,
    pub score: u64,
    /// Experience multiplier relative to a basic enemy
    pub experience: f32,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 9] = [
        EnemyKind::Basic,
        EnemyKind::Fast,
        EnemyKind::Tank,
        EnemyKind::Zigzag,
        EnemyKind::Sniper,
        EnemyKind::Shield,
        EnemyKind::Stopper,
        EnemyKind::Kamikaze,
        EnemyKind::Barrage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Basic => "basic",
            EnemyKind::Fast => "fast",
            EnemyKind::Tank => "tank",
            EnemyKind::Zigzag => "zigzag",
            EnemyKind::Sniper => "sniper",
            EnemyKind::Shield => "shield",
            EnemyKind::Stopper => "stopper",
            EnemyKind::Kamikaze => "kamikaze",
            EnemyKind::Barrage => "barrage",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn profile(self) -> KindProfile {
        let (health, speed, size, score, experience) = match self {
            EnemyKind::Basic => (1.0, 1.0, ENEMY_SIZE * 1.5, ENEMY_SCORE, 1.0),
            EnemyKind::Fast => (1.0, 2.5, ENEMY_SIZE - 5.0, ENEMY_SCORE * 2, 1.1),
            EnemyKind::Tank => (10.0, 0.8, ENEMY_SIZE * 2.0, ENEMY_SCORE * 4, 1.3),
            EnemyKind::Zigzag => (1.0, 0.8, ENEMY_SIZE, ENEMY_SCORE * 3 / 2, 1.2),
            EnemyKind::Sniper => (2.0, 0.3, ENEMY_SIZE * 2.0, ENEMY_SCORE * 2, 1.5),
            EnemyKind::Shield => (1.0, 0.9, ENEMY_SIZE, ENEMY_SCORE * 3, 1.6),
            EnemyKind::Stopper => (2.0, 1.2, ENEMY_SIZE, ENEMY_SCORE * 5 / 2, 1.8),
            EnemyKind::Kamikaze => (1.0, 4.0, ENEMY_SIZE * 2.0, ENEMY_SCORE * 3, 1.4),
            EnemyKind::Barrage => (5.0, 0.8, (ENEMY_SIZE * 1.7).floor(), ENEMY_SCORE * 3, 1.5),
        };
        KindProfile {
            health,
            speed,
            size,
            score,
            experience,
        }
    }

    /// Absorption points before damage reaches health
    fn shield(self) -> f32 {
        match self {
            EnemyKind::Shield => 5.0,
            _ => 0.0,
        }
    }
}

/// Movement stance for kinds that pause mid-screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Stance {
    Advancing,
    Holding { ticks: u32 },
    Released,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    /// Remaining shield absorption
    pub shield: f32,
    pub alive: bool,
    pub stance: Stance,
    start_x: f32,
    hold_y: f32,
    move_timer: u32,
    fire_timer: u32,
    fire_interval: u32,
    fire_cooldown: u32,
    burst_count: u32,
}

impl Enemy {
    /// Spawn at `pos`, scaled by the difficulty snapshot.
    /// Kamikazes lock their dash toward `player` at spawn.
    pub fn spawn<R: Rng + ?Sized>(
        id: EntityId,
        kind: EnemyKind,
        pos: Vec2,
        player: Vec2,
        difficulty: &ProgressionSnapshot,
        field: &Playfield,
        rng: &mut R,
    ) -> Self {
        let profile = kind.profile();
        let health = (profile.health * difficulty.health_multiplier).floor().max(1.0);
        let speed = ENEMY_SPEED * profile.speed * difficulty.speed_multiplier;

        let vel = match kind {
            EnemyKind::Kamikaze => {
                let to_player = player - pos;
                if to_player.length_squared() > 0.0 {
                    to_player.normalize() * speed
                } else {
                    Vec2::new(0.0, speed)
                }
            }
            _ => Vec2::new(0.0, speed),
        };

        let hold_y = match kind {
            EnemyKind::Barrage => {
                let lo = (field.height / 5.0).floor();
                let hi = (field.height / 3.0).floor().max(lo);
                rng.random_range(lo..=hi)
            }
            _ => (field.height / 3.0).floor(),
        };

        let fire_interval = match kind {
            EnemyKind::Tank => 30,
            EnemyKind::Sniper => 90,
            EnemyKind::Barrage => rng.random_range(180..=240),
            _ => rng.random_range(60..=180),
        };

        Self {
            id,
            kind,
            pos,
            vel,
            size: profile.size,
            health,
            max_health: health,
            speed,
            shield: kind.shield(),
            alive: true,
            stance: Stance::Advancing,
            start_x: pos.x,
            hold_y,
            move_timer: 0,
            fire_timer: 0,
            fire_interval,
            fire_cooldown: 0,
            burst_count: 0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, Vec2::splat(self.size))
    }

    /// Advance one tick; returns any shots fired
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        player: Vec2,
        field: &Playfield,
        palette: &Palette,
        rng: &mut R,
    ) -> Vec<Projectile> {
        if !self.alive {
            return Vec::new();
        }
        self.move_timer += 1;
        self.advance(field);

        if self.pos.y > field.height + self.size || self.pos.y < -self.size {
            self.alive = false;
            return Vec::new();
        }

        if self.kind == EnemyKind::Barrage {
            return self.barrage(palette, rng);
        }

        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        if self.fire_timer < self.fire_interval {
            self.fire_timer += 1;
        }

        if self.ready_to_fire(rng) {
            vec![self.shot(player, palette)]
        } else {
            Vec::new()
        }
    }

    fn advance(&mut self, field: &Playfield) {
        match self.kind {
            EnemyKind::Zigzag => {
                self.pos.y += self.speed;
                let x = self.start_x + (self.move_timer as f32 * 0.1).sin() * 80.0;
                let half = self.size / 2.0;
                self.pos.x = x.clamp(half, (field.width - half).max(half));
            }
            EnemyKind::Kamikaze => self.pos += self.vel,
            EnemyKind::Stopper => match self.stance {
                Stance::Advancing => {
                    self.pos.y += self.speed;
                    if self.pos.y >= self.hold_y {
                        self.stance = Stance::Holding { ticks: 0 };
                    }
                }
                Stance::Holding { ticks } => {
                    let ticks = ticks + 1;
                    if ticks >= 180 {
                        self.stance = Stance::Released;
                        self.speed *= 0.8;
                    } else {
                        self.stance = Stance::Holding { ticks };
                    }
                }
                Stance::Released => self.pos.y += self.speed,
            },
            EnemyKind::Barrage => match self.stance {
                Stance::Advancing => {
                    self.pos.y += self.speed;
                    if self.pos.y >= self.hold_y {
                        self.stance = Stance::Holding { ticks: 0 };
                    }
                }
                _ => {
                    self.pos.x += (self.pos.y / 20.0 + self.fire_timer as f32 * 0.1).sin() * 0.5;
                }
            },
            _ => self.pos.y += self.speed,
        }
    }

    fn ready_to_fire<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        match self.kind {
            EnemyKind::Fast | EnemyKind::Kamikaze | EnemyKind::Barrage => false,
            EnemyKind::Tank => {
                if self.fire_timer < self.fire_interval {
                    return false;
                }
                self.fire_timer = 0;
                self.burst_count += 1;
                if self.burst_count >= 3 {
                    self.burst_count = 0;
                    self.fire_interval = rng.random_range(90..=150);
                } else {
                    self.fire_interval = 15;
                }
                true
            }
            EnemyKind::Stopper if matches!(self.stance, Stance::Holding { .. }) => {
                if self.fire_timer >= 20 {
                    self.fire_timer = 0;
                    true
                } else {
                    false
                }
            }
            EnemyKind::Stopper => {
                if self.fire_timer >= self.fire_interval {
                    self.fire_timer = 0;
                    self.fire_interval = rng.random_range(60..=120);
                    true
                } else {
                    false
                }
            }
            _ => {
                if self.fire_cooldown == 0 && self.fire_timer >= self.fire_interval {
                    self.fire_cooldown = rng.random_range(60..=120);
                    self.fire_timer = 0;
                    self.fire_interval = rng.random_range(60..=180);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Straight down, or aimed at the player for snipers
    fn shot(&self, player: Vec2, palette: &Palette) -> Projectile {
        match self.kind {
            EnemyKind::Sniper if player != self.pos => {
                Projectile::hostile(self.pos, heading(player - self.pos), SHOT_SPEED, palette.red)
                    .with_size(SHOT_SIZE)
            }
            _ => Projectile::hostile(
                self.pos + Vec2::new(0.0, self.size / 2.0),
                std::f32::consts::FRAC_PI_2,
                SHOT_SPEED,
                palette.red,
            )
            .with_size(SHOT_SIZE),
        }
    }

    /// Barrage kind: a 16-way ring every few seconds while holding
    fn barrage<R: Rng + ?Sized>(&mut self, palette: &Palette, rng: &mut R) -> Vec<Projectile> {
        if !matches!(self.stance, Stance::Holding { .. }) {
            return Vec::new();
        }
        self.fire_timer += 1;
        if self.fire_timer < self.fire_interval {
            return Vec::new();
        }
        self.fire_timer = 0;
        self.fire_interval = rng.random_range(180..=240);
        (0..16)
            .map(|i| {
                let angle = (i as f32 * 360.0 / 16.0).to_radians();
                Projectile::new(self.pos, from_heading(angle, SHOT_SPEED * 0.8), Side::Hostile)
                    .with_color(palette.purple)
                    .with_size(PROJECTILE_SIZE)
            })
            .collect()
    }
}

impl Damageable for Enemy {
    /// Shields soak damage until exhausted and never report destruction
    fn apply_damage(&mut self, amount: f32) -> bool {
        if !self.alive || amount <= 0.0 {
            return false;
        }
        if self.shield > 0.0 {
            self.shield = (self.shield - amount).max(0.0);
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.alive = false;
            true
        } else {
            false
        }
    }
}
