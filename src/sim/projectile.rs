//! Projectile simulation
//!
//! A projectile is a moving point with a motion rule. It has no awareness of
//! other entities: anything it tracks arrives as a plain position resolved by
//! the owning pool.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::collision::Rect;
use crate::consts::*;
use crate::tuning::{Playfield, Rgb};
use crate::{from_heading, heading, normalize_angle};

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Player,
    Hostile,
}

/// Stable handle to something a projectile can track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRef {
    Player,
    Enemy(EntityId),
    Boss,
}

/// Area damage dealt when the projectile detonates on contact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaBurst {
    pub radius: f32,
    pub damage: f32,
}

/// Per-kind motion rule and its private state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    Normal,
    /// Turns toward the target by `strength` of the bearing error, at most `max_turn` rad per tick
    Homing { strength: f32, max_turn: f32 },
    Accelerating { rate: f32, max_speed: f32 },
    Decelerating { rate: f32, min_speed: f32 },
    /// Orbits a center that itself travels along the velocity
    Spiral {
        center: Vec2,
        radius: f32,
        angular_rate: f32,
    },
    /// Straight-line base plus a perpendicular sine offset
    SineWave {
        base: Vec2,
        amplitude: f32,
        frequency: f32,
    },
    Bouncing { bounces_left: u32, decay: f32 },
    Splitting { timer: u32 },
    /// Detonates when `timer` runs out; fragments start on the `radius` ring
    Explosive {
        timer: u32,
        radius: f32,
        burst_color: Rgb,
    },
    /// Penetrating beam segment extending `length` ahead of the position
    Laser {
        length: f32,
        width: f32,
        rotation: f32,
        hits: u32,
        max_hits: u32,
        hit_boss: bool,
        struck: Vec<EntityId>,
    },
}

impl Motion {
    pub fn homing(strength: f32, max_turn: f32) -> Self {
        Motion::Homing { strength, max_turn }
    }

    pub fn spiral(center: Vec2, radius: f32, angular_rate: f32) -> Self {
        Motion::Spiral {
            center,
            radius,
            angular_rate,
        }
    }

    pub fn sine_wave(base: Vec2, amplitude: f32, frequency: f32) -> Self {
        Motion::SineWave {
            base,
            amplitude,
            frequency,
        }
    }

    pub fn laser(length: f32, width: f32, max_hits: u32) -> Self {
        Motion::Laser {
            length,
            width,
            rotation: 0.0,
            hits: 0,
            max_hits,
            hit_boss: false,
            struck: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Motion::Normal => "normal",
            Motion::Homing { .. } => "homing",
            Motion::Accelerating { .. } => "accelerating",
            Motion::Decelerating { .. } => "decelerating",
            Motion::Spiral { .. } => "spiral",
            Motion::SineWave { .. } => "sine_wave",
            Motion::Bouncing { .. } => "bouncing",
            Motion::Splitting { .. } => "splitting",
            Motion::Explosive { .. } => "explosive",
            Motion::Laser { .. } => "laser",
        }
    }
}

/// A single bullet, shot, beam or bomb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Assigned by the pool on insertion
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub damage: i32,
    pub owner: Side,
    pub age: u32,
    pub max_age: u32,
    pub active: bool,
    pub color: Rgb,
    /// Rendering hint (explosive telegraph pulses this)
    pub alpha: u8,
    pub motion: Motion,
    #[serde(default)]
    pub target: Option<TargetRef>,
    #[serde(default)]
    pub area: Option<AreaBurst>,
}

impl Projectile {
    pub fn new(pos: Vec2, vel: Vec2, owner: Side) -> Self {
        Self {
            id: 0,
            pos,
            vel,
            size: PROJECTILE_SIZE,
            damage: 1,
            owner,
            age: 0,
            max_age: PROJECTILE_MAX_AGE,
            active: true,
            color: [255, 255, 255],
            alpha: 255,
            motion: Motion::Normal,
            target: None,
            area: None,
        }
    }

    /// Hostile projectile fired along `angle` at `speed`
    pub fn hostile(pos: Vec2, angle: f32, speed: f32, color: Rgb) -> Self {
        Self::new(pos, from_heading(angle, speed), Side::Hostile).with_color(color)
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_damage(mut self, damage: i32) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_max_age(mut self, max_age: u32) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_target(mut self, target: TargetRef) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_area(mut self, radius: f32, damage: f32) -> Self {
        self.area = Some(AreaBurst { radius, damage });
        self
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    #[inline]
    pub fn heading(&self) -> f32 {
        heading(self.vel)
    }

    /// Penetrating projectiles survive hits until their budget runs out
    #[inline]
    pub fn is_penetrating(&self) -> bool {
        matches!(self.motion, Motion::Laser { .. })
    }

    /// Axis-aligned hit box. Lasers cover their whole leading segment.
    pub fn hitbox(&self) -> Rect {
        match &self.motion {
            Motion::Laser { length, width, .. } => {
                let dir = self.vel.normalize_or(Vec2::NEG_Y);
                Rect::from_segment(self.pos, self.pos + dir * *length, *width / 2.0)
            }
            _ => Rect::from_center(self.pos, Vec2::splat(self.size)),
        }
    }

    /// Whether this projectile may still strike enemy `victim`
    pub fn can_strike(&self, victim: EntityId) -> bool {
        if !self.active {
            return false;
        }
        match &self.motion {
            Motion::Laser { struck, .. } => !struck.contains(&victim),
            _ => true,
        }
    }

    /// Record a hit on an enemy. Single-hit projectiles are spent immediately.
    pub fn strike_enemy(&mut self, victim: EntityId) {
        match &mut self.motion {
            Motion::Laser {
                hits,
                max_hits,
                struck,
                ..
            } => {
                struck.push(victim);
                *hits += 1;
                if *hits >= *max_hits {
                    self.active = false;
                }
            }
            _ => self.active = false,
        }
    }

    /// Record a hit on a boss; returns false when the hit must not count.
    /// A laser lands at most one boss hit in its lifetime.
    pub fn strike_boss(&mut self) -> bool {
        if !self.active {
            return false;
        }
        if let Motion::Laser { hit_boss, .. } = &mut self.motion {
            if *hit_boss {
                return false;
            }
            *hit_boss = true;
        }
        self.active = false;
        true
    }

    /// Advance one tick. Returns any projectiles spawned as a side effect.
    ///
    /// `target` is the resolved position of the tracked entity, or `None` when
    /// it no longer exists; homing then continues in a straight line.
    pub fn update(
        &mut self,
        target: Option<Vec2>,
        field: &Playfield,
        margin: f32,
    ) -> Vec<Projectile> {
        if !self.active {
            return Vec::new();
        }

        self.age += 1;
        if self.age >= self.max_age {
            self.active = false;
            return Vec::new();
        }

        let mut spawned = Vec::new();
        let speed = self.speed();

        match &mut self.motion {
            Motion::Normal => self.pos += self.vel,
            Motion::Homing { strength, max_turn } => {
                if let Some(target) = target {
                    let current = heading(self.vel);
                    let bearing = heading(target - self.pos);
                    let turn = (normalize_angle(bearing - current) * *strength)
                        .clamp(-*max_turn, *max_turn);
                    self.vel = from_heading(current + turn, speed);
                }
                self.pos += self.vel;
            }
            Motion::Accelerating { rate, max_speed } => {
                if speed < *max_speed {
                    self.vel = self.vel.normalize_or_zero() * (speed + *rate).min(*max_speed);
                }
                self.pos += self.vel;
            }
            Motion::Decelerating { rate, min_speed } => {
                if speed > *min_speed {
                    self.vel = self.vel.normalize_or_zero() * (speed - *rate).max(*min_speed);
                }
                self.pos += self.vel;
            }
            Motion::Spiral {
                center,
                radius,
                angular_rate,
            } => {
                *center += self.vel;
                let angle = self.age as f32 * *angular_rate;
                self.pos = *center + from_heading(angle, *radius);
            }
            Motion::SineWave {
                base,
                amplitude,
                frequency,
            } => {
                *base += self.vel;
                let perpendicular = heading(self.vel) + std::f32::consts::FRAC_PI_2;
                let offset = (self.age as f32 * *frequency).sin() * *amplitude;
                self.pos = *base + from_heading(perpendicular, offset);
            }
            Motion::Bouncing {
                bounces_left,
                decay,
            } => {
                let next = self.pos + self.vel;
                let hit_x = next.x <= 0.0 || next.x >= field.width;
                let hit_y = next.y <= 0.0 || next.y >= field.height;
                if hit_x {
                    self.vel.x = -self.vel.x * *decay;
                }
                if hit_y {
                    self.vel.y = -self.vel.y * *decay;
                }
                // A corner reflects both axes but costs a single bounce
                if hit_x || hit_y {
                    *bounces_left = bounces_left.saturating_sub(1);
                    if *bounces_left == 0 {
                        self.active = false;
                        return spawned;
                    }
                }
                self.pos += self.vel;
            }
            Motion::Splitting { timer } => {
                self.pos += self.vel;
                *timer = timer.saturating_sub(1);
                if *timer == 0 {
                    self.active = false;
                    let base = heading(self.vel);
                    for i in 0..3 {
                        let angle = base + (i as f32 - 1.0) * 0.5;
                        let vel = from_heading(angle, speed * 0.7);
                        let child = Projectile::new(self.pos, vel, self.owner)
                            .with_color(self.color)
                            .with_size((self.size - 2.0).max(1.0))
                            .with_damage(self.damage)
                            .with_max_age(self.max_age);
                        spawned.push(child);
                    }
                }
            }
            Motion::Explosive {
                timer,
                radius,
                burst_color,
            } => {
                self.pos += self.vel;
                *timer = timer.saturating_sub(1);
                if *timer == 0 {
                    self.active = false;
                    for i in 0..8 {
                        let angle = (i as f32 * 45.0).to_radians();
                        let pos = self.pos + from_heading(angle, *radius);
                        let child = Projectile::new(pos, from_heading(angle, 2.0), self.owner)
                            .with_color(*burst_color)
                            .with_size(6.0)
                            .with_damage(self.damage)
                            .with_max_age(self.max_age);
                        spawned.push(child);
                    }
                } else if *timer < 30 {
                    self.alpha = (128.0 + 127.0 * (self.age as f32 * 0.5).sin()) as u8;
                }
            }
            Motion::Laser { rotation, .. } => {
                self.pos += self.vel;
                *rotation += 0.1;
            }
        }

        let exempt = matches!(self.motion, Motion::Bouncing { .. });
        if self.active && !exempt && !field.contains(self.pos, margin) {
            self.active = false;
        }

        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field() -> Playfield {
        Playfield::default()
    }

    #[test]
    fn test_normal_moves_linearly() {
        let mut p = Projectile::new(Vec2::new(100.0, 100.0), Vec2::new(0.0, -5.0), Side::Hostile);
        for _ in 0..3 {
            p.update(None, &field(), HOSTILE_MARGIN);
        }
        assert!((p.pos - Vec2::new(100.0, 85.0)).length() < 1e-4);
        assert!(p.active);
        assert_eq!(p.age, 3);
    }

    #[test]
    fn test_splitting_spawns_three_children() {
        let mut p = Projectile::new(Vec2::new(400.0, 300.0), Vec2::new(4.0, 0.0), Side::Hostile)
            .with_motion(Motion::Splitting { timer: 2 })
            .with_size(8.0);

        assert!(p.update(None, &field(), HOSTILE_MARGIN).is_empty());
        let children = p.update(None, &field(), HOSTILE_MARGIN);

        assert!(!p.active);
        assert_eq!(children.len(), 3);
        let expected = [-0.5_f32, 0.0, 0.5];
        for (child, want) in children.iter().zip(expected) {
            assert!((child.heading() - want).abs() < 1e-4);
            assert!((child.speed() - 2.8).abs() < 1e-4);
            assert_eq!(child.size, 6.0);
            assert_eq!(child.motion, Motion::Normal);
        }
    }

    #[test]
    fn test_explosive_bursts_into_eight() {
        let mut p = Projectile::new(Vec2::new(400.0, 300.0), Vec2::ZERO, Side::Hostile).with_motion(
            Motion::Explosive {
                timer: 40,
                radius: 30.0,
                burst_color: [255, 165, 0],
            },
        );
        let mut children = Vec::new();
        let mut pulsed = false;
        for _ in 0..40 {
            children = p.update(None, &field(), HOSTILE_MARGIN);
            pulsed |= p.alpha != 255;
        }
        assert!(pulsed);
        assert!(!p.active);
        assert_eq!(children.len(), 8);
        assert!(children.iter().all(|c| (c.speed() - 2.0).abs() < 1e-4));
        assert!(children.iter().all(|c| c.color == [255, 165, 0]));
        assert!(
            children
                .iter()
                .all(|c| ((c.pos - Vec2::new(400.0, 300.0)).length() - 30.0).abs() < 1e-3)
        );
    }

    #[test]
    fn test_children_inherit_parent_lifetime() {
        let mut split = Projectile::new(Vec2::new(400.0, 300.0), Vec2::new(4.0, 0.0), Side::Hostile)
            .with_motion(Motion::Splitting { timer: 1 })
            .with_max_age(100);
        let children = split.update(None, &field(), HOSTILE_MARGIN);
        assert_eq!(children.len(), 3);
        assert!(children.iter().all(|c| c.max_age == 100));

        let mut bomb = Projectile::new(Vec2::new(400.0, 300.0), Vec2::ZERO, Side::Hostile)
            .with_motion(Motion::Explosive {
                timer: 1,
                radius: 0.0,
                burst_color: [255, 165, 0],
            })
            .with_max_age(90);
        let fragments = bomb.update(None, &field(), HOSTILE_MARGIN);
        assert_eq!(fragments.len(), 8);
        assert!(fragments.iter().all(|c| c.max_age == 90));
    }

    #[test]
    fn test_offscreen_deactivates() {
        let mut p = Projectile::new(Vec2::new(400.0, -45.0), Vec2::new(0.0, -10.0), Side::Hostile);
        p.update(None, &field(), HOSTILE_MARGIN);
        assert!(!p.active);
    }

    #[test]
    fn test_bouncing_reflects_and_is_exempt_from_offscreen() {
        let mut p = Projectile::new(Vec2::new(795.0, 300.0), Vec2::new(10.0, 0.0), Side::Hostile)
            .with_motion(Motion::Bouncing {
                bounces_left: 3,
                decay: 0.8,
            });
        p.update(None, &field(), HOSTILE_MARGIN);
        assert!(p.active);
        assert!((p.vel.x + 8.0).abs() < 1e-4);
        assert_eq!(p.motion, Motion::Bouncing { bounces_left: 2, decay: 0.8 });
    }

    #[test]
    fn test_bouncing_exhausts_counter() {
        let mut p = Projectile::new(Vec2::new(5.0, 300.0), Vec2::new(-10.0, 0.0), Side::Hostile)
            .with_motion(Motion::Bouncing {
                bounces_left: 1,
                decay: 0.8,
            });
        p.update(None, &field(), HOSTILE_MARGIN);
        assert!(!p.active);
    }

    #[test]
    fn test_corner_costs_one_bounce() {
        let mut p = Projectile::new(Vec2::new(795.0, 595.0), Vec2::new(10.0, 10.0), Side::Hostile)
            .with_motion(Motion::Bouncing {
                bounces_left: 3,
                decay: 1.0,
            });
        p.update(None, &field(), HOSTILE_MARGIN);
        assert!(p.active);
        assert_eq!(p.vel, Vec2::new(-10.0, -10.0));
        assert_eq!(p.motion, Motion::Bouncing { bounces_left: 2, decay: 1.0 });
    }

    #[test]
    fn test_homing_without_target_flies_straight() {
        let mut p = Projectile::new(Vec2::new(100.0, 100.0), Vec2::new(3.0, 0.0), Side::Hostile)
            .with_motion(Motion::homing(0.5, 0.1));
        p.update(None, &field(), HOSTILE_MARGIN);
        assert_eq!(p.vel, Vec2::new(3.0, 0.0));
        assert_eq!(p.pos, Vec2::new(103.0, 100.0));
    }

    #[test]
    fn test_homing_turns_short_way_around() {
        // Heading just below +π, target just above -π: the short turn is tiny and positive
        let start = std::f32::consts::PI - 0.05;
        let vel = from_heading(start, 2.0);
        let mut p = Projectile::new(Vec2::new(400.0, 300.0), vel, Side::Hostile)
            .with_motion(Motion::homing(1.0, 1.0));
        let target = Vec2::new(400.0, 300.0) + from_heading(-std::f32::consts::PI + 0.05, 100.0);
        p.update(Some(target), &field(), HOSTILE_MARGIN);
        let turned = normalize_angle(p.heading() - start);
        assert!(turned > 0.0 && turned < 0.2, "turned {turned}");
    }

    #[test]
    fn test_accelerating_caps_at_max() {
        let mut p = Projectile::new(Vec2::new(400.0, 300.0), Vec2::new(0.0, 1.0), Side::Hostile)
            .with_motion(Motion::Accelerating {
                rate: 0.5,
                max_speed: 2.0,
            });
        for _ in 0..5 {
            p.update(None, &field(), 1000.0);
        }
        assert!((p.speed() - 2.0).abs() < 1e-4);
        assert!((p.heading() - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_decelerating_floors_at_min() {
        let mut p = Projectile::new(Vec2::new(400.0, 300.0), Vec2::new(3.0, 0.0), Side::Hostile)
            .with_motion(Motion::Decelerating {
                rate: 1.0,
                min_speed: 0.5,
            });
        for _ in 0..5 {
            p.update(None, &field(), HOSTILE_MARGIN);
        }
        assert!((p.speed() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_spiral_orbits_moving_center() {
        let start = Vec2::new(400.0, 300.0);
        let mut p = Projectile::new(start, Vec2::new(0.0, 1.0), Side::Hostile)
            .with_motion(Motion::spiral(start, 20.0, 0.1));
        for _ in 0..10 {
            p.update(None, &field(), HOSTILE_MARGIN);
        }
        let center = start + Vec2::new(0.0, 10.0);
        assert!(((p.pos - center).length() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_sine_wave_offset_is_perpendicular() {
        let start = Vec2::new(100.0, 300.0);
        let mut p = Projectile::new(start, Vec2::new(2.0, 0.0), Side::Hostile)
            .with_motion(Motion::sine_wave(start, 30.0, 0.05));
        for _ in 0..10 {
            p.update(None, &field(), HOSTILE_MARGIN);
        }
        assert!((p.pos.x - 120.0).abs() < 1e-3);
        assert!((p.pos.y - (300.0 + 0.5_f32.sin() * 30.0)).abs() < 1e-3);
    }

    #[test]
    fn test_laser_hit_budget() {
        let mut p = Projectile::new(Vec2::new(400.0, 300.0), Vec2::new(0.0, -20.0), Side::Player)
            .with_motion(Motion::laser(200.0, 8.0, 5));
        let mut landed = 0;
        for victim in 1..=6 {
            if p.can_strike(victim) {
                p.strike_enemy(victim);
                landed += 1;
            }
        }
        assert_eq!(landed, 5);
        assert!(!p.active);
    }

    #[test]
    fn test_laser_hits_boss_once() {
        let mut p = Projectile::new(Vec2::new(400.0, 300.0), Vec2::new(0.0, -20.0), Side::Player)
            .with_motion(Motion::laser(200.0, 8.0, 5));
        assert!(p.strike_boss());
        assert!(!p.strike_boss());
        assert!(!p.active);
    }

    #[test]
    fn test_laser_hitbox_covers_leading_segment() {
        let p = Projectile::new(Vec2::new(400.0, 500.0), Vec2::new(0.0, -20.0), Side::Player)
            .with_motion(Motion::laser(200.0, 8.0, 5));
        let rect = p.hitbox();
        // Padded by half the beam width on every side, ends included
        assert!((rect.min.y - 296.0).abs() < 1e-3);
        assert!((rect.max.y - 504.0).abs() < 1e-3);
        assert!((rect.width() - 8.0).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_age_monotonic_and_expiry(
            max_age in 1u32..50,
            ticks in 1usize..80,
            vx in -3.0f32..3.0,
            vy in -3.0f32..3.0,
        ) {
            let mut p = Projectile::new(Vec2::new(400.0, 300.0), Vec2::new(vx, vy), Side::Hostile)
                .with_max_age(max_age);
            let mut last_age = p.age;
            for _ in 0..ticks {
                p.update(None, &field(), 1000.0);
                prop_assert!(p.age >= last_age);
                last_age = p.age;
                if p.age > max_age {
                    prop_assert!(!p.active);
                }
            }
        }

        #[test]
        fn prop_homing_turn_is_bounded(
            angle in -3.1f32..3.1,
            tx in -200.0f32..1000.0,
            ty in -200.0f32..800.0,
            strength in 0.01f32..1.0,
            max_turn in 0.01f32..0.5,
        ) {
            let vel = from_heading(angle, 3.0);
            let mut p = Projectile::new(Vec2::new(400.0, 300.0), vel, Side::Hostile)
                .with_motion(Motion::homing(strength, max_turn));
            let before = p.heading();
            p.update(Some(Vec2::new(tx, ty)), &field(), 1000.0);
            let turned = normalize_angle(p.heading() - before).abs();
            prop_assert!(turned <= max_turn + 1e-4);
        }

        #[test]
        fn prop_single_hit_projectile_hits_once(
            victims in proptest::collection::vec(1u32..100, 1..10),
        ) {
            let vel = Vec2::new(0.0, -7.0);
            let mut p = Projectile::new(Vec2::new(400.0, 300.0), vel, Side::Player);
            let mut landed = 0;
            for victim in victims {
                if p.can_strike(victim) {
                    p.strike_enemy(victim);
                    landed += 1;
                }
            }
            prop_assert_eq!(landed, 1);
            prop_assert!(!p.active);
        }
    }
}
