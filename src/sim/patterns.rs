//! Spell-card attack patterns
//!
//! Each pattern is a pure function of elapsed card ticks, emitter position and
//! target position, plus the injected RNG for scattered shots. Emission is
//! gated by `elapsed % period == 0`. Adding an attack means adding one emitter
//! and one row in [`PATTERNS`].

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::projectile::{Motion, Projectile, TargetRef};
use crate::tuning::{Palette, Playfield};
use crate::{from_heading, heading};

/// Named attack patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternId {
    FairyDance,
    LightBurst,
    MagicStorm,
    StarRain,
    SpiralCurse,
    DragonRoar,
    FireSpiral,
    ThunderSpear,
    UltimateBlast,
}

/// Everything an emitter may read besides time and positions
pub struct EmitEnv<'a> {
    pub field: &'a Playfield,
    pub palette: &'a Palette,
    pub rng: &'a mut dyn RngCore,
}

type EmitFn = fn(u32, Vec2, Vec2, &mut EmitEnv<'_>) -> Vec<Projectile>;

/// Registration row for one pattern
pub struct PatternSpec {
    pub id: PatternId,
    pub key: &'static str,
    /// Spell-card display name
    pub title: &'static str,
    /// Fires on ticks where `elapsed % period == 0`
    pub period: u32,
    /// Card duration in ticks
    pub duration: u32,
    /// Card health pool
    pub health: f32,
    emit: EmitFn,
}

/// Pattern lookup table, indexed by `PatternId as usize`
pub static PATTERNS: [PatternSpec; 9] = [
    PatternSpec {
        id: PatternId::FairyDance,
        key: "fairy_dance",
        title: "Fairy Dance",
        period: 20,
        duration: 600,
        health: 100.0,
        emit: fairy_dance,
    },
    PatternSpec {
        id: PatternId::LightBurst,
        key: "light_burst",
        title: "Scattered Light",
        period: 30,
        duration: 480,
        health: 150.0,
        emit: light_burst,
    },
    PatternSpec {
        id: PatternId::MagicStorm,
        key: "magic_storm",
        title: "Magic Storm",
        period: 8,
        duration: 720,
        health: 200.0,
        emit: magic_storm,
    },
    PatternSpec {
        id: PatternId::StarRain,
        key: "star_rain",
        title: "Stardust Rain",
        period: 15,
        duration: 600,
        health: 250.0,
        emit: star_rain,
    },
    PatternSpec {
        id: PatternId::SpiralCurse,
        key: "spiral_curse",
        title: "Spiral Curse",
        period: 5,
        duration: 540,
        health: 300.0,
        emit: spiral_curse,
    },
    PatternSpec {
        id: PatternId::DragonRoar,
        key: "dragon_roar",
        title: "Dragon Roar",
        period: 40,
        duration: 480,
        health: 300.0,
        emit: dragon_roar,
    },
    PatternSpec {
        id: PatternId::FireSpiral,
        key: "fire_spiral",
        title: "Flame Vortex",
        period: 12,
        duration: 600,
        health: 350.0,
        emit: fire_spiral,
    },
    PatternSpec {
        id: PatternId::ThunderSpear,
        key: "thunder_spear",
        title: "Lightning Spear",
        period: 60,
        duration: 720,
        health: 400.0,
        emit: thunder_spear,
    },
    PatternSpec {
        id: PatternId::UltimateBlast,
        key: "ultimate_blast",
        title: "Ultimate Dragon Break",
        period: 8,
        duration: 900,
        health: 500.0,
        emit: ultimate_blast,
    },
];

impl PatternId {
    pub const ALL: [PatternId; 9] = [
        PatternId::FairyDance,
        PatternId::LightBurst,
        PatternId::MagicStorm,
        PatternId::StarRain,
        PatternId::SpiralCurse,
        PatternId::DragonRoar,
        PatternId::FireSpiral,
        PatternId::ThunderSpear,
        PatternId::UltimateBlast,
    ];

    #[inline]
    pub fn spec(self) -> &'static PatternSpec {
        &PATTERNS[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn from_key(key: &str) -> Option<Self> {
        PATTERNS.iter().find(|spec| spec.key == key).map(|spec| spec.id)
    }
}

/// Run `pattern` for this tick. Returns nothing off-period.
pub fn emit(
    pattern: PatternId,
    elapsed: u32,
    origin: Vec2,
    target: Vec2,
    env: &mut EmitEnv<'_>,
) -> Vec<Projectile> {
    let spec = pattern.spec();
    if elapsed % spec.period != 0 {
        return Vec::new();
    }
    (spec.emit)(elapsed, origin, target, env)
}

/// `count` headings evenly spaced around a full circle
fn ring(count: u32) -> impl Iterator<Item = f32> {
    (0..count).map(move |i| TAU * i as f32 / count as f32)
}

fn fairy_dance(
    elapsed: u32,
    origin: Vec2,
    _target: Vec2,
    env: &mut EmitEnv<'_>,
) -> Vec<Projectile> {
    (0..8)
        .map(|i| {
            let angle = (elapsed as f32 * 0.1 + i as f32 * 45.0).to_radians();
            Projectile::hostile(origin + from_heading(angle, 30.0), angle, 2.5, env.palette.cyan)
        })
        .collect()
}

/// Decelerating ring; every fourth burst bounces off the walls instead
fn light_burst(
    elapsed: u32,
    origin: Vec2,
    _target: Vec2,
    env: &mut EmitEnv<'_>,
) -> Vec<Projectile> {
    let motion = if elapsed % 120 == 0 {
        Motion::Bouncing {
            bounces_left: 3,
            decay: 0.8,
        }
    } else {
        Motion::Decelerating {
            rate: 0.03,
            min_speed: 0.5,
        }
    };
    ring(12)
        .map(|angle| {
            Projectile::hostile(origin, angle, 3.0, env.palette.yellow).with_motion(motion.clone())
        })
        .collect()
}

fn magic_storm(
    elapsed: u32,
    origin: Vec2,
    _target: Vec2,
    env: &mut EmitEnv<'_>,
) -> Vec<Projectile> {
    (0..3)
        .map(|layer| {
            let angle = (elapsed as f32 * 0.2 + layer as f32 * 120.0).to_radians();
            let speed = 2.0 + layer as f32 * 0.5;
            Projectile::hostile(origin, angle, speed, env.palette.magenta).with_motion(
                Motion::Accelerating {
                    rate: 0.05,
                    max_speed: speed * 3.0,
                },
            )
        })
        .collect()
}

/// Weaving drops from random points along the top edge
fn star_rain(
    _elapsed: u32,
    _origin: Vec2,
    _target: Vec2,
    env: &mut EmitEnv<'_>,
) -> Vec<Projectile> {
    let hi = (env.field.width - 50.0).max(50.0);
    (0..5)
        .map(|_| {
            let pos = Vec2::new(env.rng.random_range(50.0..=hi), -10.0);
            Projectile::hostile(pos, std::f32::consts::FRAC_PI_2, 3.5, env.palette.white)
                .with_motion(Motion::sine_wave(pos, 30.0, 0.05))
        })
        .collect()
}

/// Mirrored pair of orbiting shots whose angle grows with time
fn spiral_curse(
    elapsed: u32,
    origin: Vec2,
    _target: Vec2,
    env: &mut EmitEnv<'_>,
) -> Vec<Projectile> {
    let angle = (elapsed as f32 * 0.3).to_radians();
    [-1.0_f32, 1.0]
        .into_iter()
        .map(|direction| {
            let a = angle * direction;
            let pos = origin + from_heading(a, 20.0);
            Projectile::hostile(pos, a, 2.5, env.palette.red)
                .with_motion(Motion::spiral(pos, 20.0, 0.1))
        })
        .collect()
}

/// Fan aimed at the target; the center shot splits
fn dragon_roar(
    _elapsed: u32,
    origin: Vec2,
    target: Vec2,
    env: &mut EmitEnv<'_>,
) -> Vec<Projectile> {
    let muzzle = origin + Vec2::new(0.0, 30.0);
    let center = heading(target - muzzle);
    (0..15)
        .map(|i| {
            let angle = center + (i as f32 - 7.0) * 0.2;
            let shot = Projectile::hostile(muzzle, angle, 4.0, env.palette.orange);
            if i == 7 {
                shot.with_motion(Motion::Splitting { timer: 60 })
            } else {
                shot
            }
        })
        .collect()
}

fn fire_spiral(
    elapsed: u32,
    origin: Vec2,
    _target: Vec2,
    env: &mut EmitEnv<'_>,
) -> Vec<Projectile> {
    let mut shots = Vec::with_capacity(12);
    for ring in 0..2 {
        let speed = 2.0 + ring as f32 * 0.8;
        for i in 0..6 {
            let angle = (elapsed as f32 * 0.15 + i as f32 * 60.0 + ring as f32 * 30.0).to_radians();
            shots.push(Projectile::hostile(origin, angle, speed, env.palette.red));
        }
    }
    shots
}

/// Fast lasers aimed at random points on the bottom edge
fn thunder_spear(
    _elapsed: u32,
    origin: Vec2,
    _target: Vec2,
    env: &mut EmitEnv<'_>,
) -> Vec<Projectile> {
    let hi = (env.field.width - 100.0).max(100.0);
    (0..3)
        .map(|_| {
            let aim = Vec2::new(env.rng.random_range(100.0..=hi), env.field.height);
            Projectile::hostile(origin, heading(aim - origin), 6.0, env.palette.blue)
                .with_motion(Motion::laser(40.0, 4.0, 1))
        })
        .collect()
}

/// Jittered-speed ring, plus a periodic explosive and homing shot at the target
fn ultimate_blast(
    elapsed: u32,
    origin: Vec2,
    target: Vec2,
    env: &mut EmitEnv<'_>,
) -> Vec<Projectile> {
    let mut shots: Vec<Projectile> = ring(12)
        .map(|angle| {
            let speed = 2.0 + env.rng.random::<f32>();
            Projectile::hostile(origin, angle, speed, env.palette.purple)
        })
        .collect();

    let aim = heading(target - origin);
    if elapsed % 120 == 0 {
        shots.push(
            Projectile::hostile(origin, aim, 3.0, env.palette.red)
                .with_size(12.0)
                .with_motion(Motion::Explosive {
                    timer: 120,
                    radius: 30.0,
                    burst_color: env.palette.orange,
                }),
        );
    }
    if elapsed % 48 == 0 {
        shots.push(
            Projectile::hostile(origin, aim, 3.0, env.palette.magenta)
                .with_motion(Motion::homing(0.02, 0.05))
                .with_target(TargetRef::Player),
        );
    }
    shots
}
