//! Player-side combat: hits taken, weapon fire, option drones and the special
//! attack gauge
//!
//! Movement itself is driven by the inbound position snapshot; this module
//! only clamps it to the playfield.

use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::collision::Rect;
use super::enemy::Enemy;
use super::projectile::{Motion, Projectile, Side, TargetRef};
use crate::consts::*;
use crate::from_heading;
use crate::tuning::{Palette, Playfield, Tuning};

const LASER_LENGTH: f32 = 200.0;
const LASER_WIDTH: f32 = 8.0;
const LASER_SPEED: f32 = 20.0;
const BOMB_SIZE: f32 = 10.0;
const BOMB_SPEED: f32 = 4.0;
const WIDE_SPREAD_DEG: f32 = 15.0;
/// Side shots of the wide shot start this far from the center one
const WIDE_SIDE_OFFSET: f32 = 10.0;

/// Positions the player remembers for trailing drones
const TRAIL_LEN: usize = 30;
const ORBIT_RADIUS: f32 = 60.0;
const ORBIT_STEP_DEG: f32 = 2.0;
const DRONE_SPREAD_DEG: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    #[default]
    Normal,
    #[serde(alias = "triple_shot")]
    WideShot,
    Laser,
    Bomb,
    Homing,
}

/// How an incoming hit was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerHit {
    /// Invulnerable; nothing happened
    Ignored,
    Shielded,
    LifeLost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: f32,
    pub lives: u32,
    /// Invulnerability ticks remaining
    pub invulnerable: u32,
    /// Shield hits remaining (0 = no shield)
    pub shield: u32,
    fire_cooldown: u32,
    special_gauge: u32,
    special_stock: u32,
    pub drones: Vec<OptionDrone>,
    /// Recent positions, oldest first
    trail: VecDeque<Vec2>,
    drone_tier: DroneTier,
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        let field = &tuning.playfield;
        Self {
            pos: Vec2::new(field.width / 2.0, field.height - 60.0),
            size: tuning.player_size,
            lives: tuning.starting_lives,
            invulnerable: 0,
            shield: 0,
            fire_cooldown: 0,
            special_gauge: 0,
            special_stock: 0,
            drones: Vec::new(),
            trail: VecDeque::with_capacity(TRAIL_LEN),
            drone_tier: DroneTier::Trailing,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, Vec2::splat(self.size))
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable > 0
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.lives == 0
    }

    pub fn special_stock(&self) -> u32 {
        self.special_stock
    }

    pub fn grant_shield(&mut self, tuning: &Tuning) {
        self.shield = tuning.shield_hits;
    }

    /// Follow the inbound position, kept fully on screen
    pub fn move_to(&mut self, pos: Vec2, field: &Playfield) {
        let half = self.size / 2.0;
        self.pos.x = pos.x.clamp(half, (field.width - half).max(half));
        self.pos.y = pos.y.clamp(half, (field.height - half).max(half));
    }

    /// Count down timers, charge the special gauge and move the drones
    pub fn update(&mut self, tuning: &Tuning) {
        self.invulnerable = self.invulnerable.saturating_sub(1);
        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);

        self.trail.push_back(self.pos);
        if self.trail.len() > TRAIL_LEN {
            self.trail.pop_front();
        }
        for drone in self.drones.iter_mut() {
            drone.update(self.pos, &self.trail);
        }

        if self.special_stock < tuning.special_max_stock {
            self.special_gauge += 1;
            if self.special_gauge >= tuning.special_gauge_per_stock {
                self.special_gauge = 0;
                self.special_stock += 1;
                log::debug!("Special stock charged ({})", self.special_stock);
            }
        } else {
            self.special_gauge = 0;
        }
    }

    /// Take a hit worth `lives`. Any hit that lands opens an invulnerability window.
    pub fn take_hit(&mut self, lives: u32, tuning: &Tuning) -> PlayerHit {
        if self.is_invulnerable() || self.is_dead() {
            return PlayerHit::Ignored;
        }
        if self.shield > 0 {
            self.shield -= 1;
            self.invulnerable = tuning.shield_invulnerability_ticks;
            return PlayerHit::Shielded;
        }
        self.lives = self.lives.saturating_sub(lives);
        self.invulnerable = tuning.invulnerability_ticks;
        PlayerHit::LifeLost
    }

    /// Fire the selected weapon if the cooldown allows it.
    /// `nearest` is the enemy a homing shot should track.
    pub fn fire(
        &mut self,
        weapon: Weapon,
        rapid: bool,
        nearest: Option<EntityId>,
        tuning: &Tuning,
        palette: &Palette,
    ) -> Vec<Projectile> {
        if self.fire_cooldown > 0 || self.is_dead() {
            return Vec::new();
        }

        let cooldown = match weapon {
            Weapon::Laser => tuning.laser_cooldown,
            Weapon::Bomb => tuning.bomb_cooldown,
            _ if rapid => tuning.rapid_cooldown,
            _ => tuning.shot_cooldown,
        };
        self.fire_cooldown = match weapon {
            Weapon::Laser | Weapon::Bomb if rapid => (cooldown / 3).max(1),
            _ => cooldown.max(1),
        };

        let origin = self.pos - Vec2::new(0.0, self.size / 2.0);
        let power = tuning.attack_power;
        let shot = |angle: f32, speed: f32| {
            Projectile::new(origin, from_heading(angle, speed), Side::Player)
        };
        let up = -FRAC_PI_2;

        match weapon {
            Weapon::Normal => vec![
                shot(up, PLAYER_SHOT_SPEED)
                    .with_size(PLAYER_SHOT_SIZE)
                    .with_damage(power)
                    .with_color(palette.yellow),
            ],
            Weapon::WideShot => [-1.0f32, 0.0, 1.0]
                .into_iter()
                .map(|side| {
                    let mut projectile =
                        shot(up + (side * WIDE_SPREAD_DEG).to_radians(), PLAYER_SHOT_SPEED);
                    projectile.pos.x += side * WIDE_SIDE_OFFSET;
                    projectile
                        .with_size(PLAYER_SHOT_SIZE)
                        .with_damage(power)
                        .with_color(palette.yellow)
                })
                .collect(),
            Weapon::Laser => vec![
                shot(up, LASER_SPEED)
                    .with_motion(Motion::laser(LASER_LENGTH, LASER_WIDTH, tuning.laser_max_hits))
                    .with_size(LASER_WIDTH)
                    .with_damage(power * 2)
                    .with_color(palette.cyan),
            ],
            Weapon::Bomb => vec![
                shot(up, BOMB_SPEED)
                    .with_size(BOMB_SIZE)
                    .with_damage(power)
                    .with_area(tuning.bomb_radius, tuning.bomb_damage)
                    .with_color(palette.orange),
            ],
            Weapon::Homing => {
                let mut projectile = shot(up, PLAYER_SHOT_SPEED)
                    .with_motion(Motion::homing(0.1, 5f32.to_radians()))
                    .with_size(PLAYER_SHOT_SIZE)
                    .with_damage(power)
                    .with_color(palette.green);
                if let Some(id) = nearest {
                    projectile = projectile.with_target(TargetRef::Enemy(id));
                }
                vec![projectile]
            }
        }
    }

    /// Match the drone count and formation to `level`. Existing drones keep
    /// their place unless the count or formation tier changes.
    pub fn sync_drones(&mut self, level: u32, tuning: &Tuning) {
        let count = drones_for_level(level);
        let tier = DroneTier::for_level(level);
        if self.drones.len() == count && self.drone_tier == tier {
            return;
        }

        let (pos, size) = (self.pos, tuning.drone_size);
        self.drones.resize_with(count, || OptionDrone::new(pos, size));
        self.drone_tier = tier;
        for (i, drone) in self.drones.iter_mut().enumerate() {
            drone.configure(tier, i, count);
        }
        log::debug!("{count} option drones in {tier:?} formation at level {level}");
    }

    /// Fire every ready drone at the boss, or else at the enemy nearest to it.
    /// Drones with nothing to aim at hold fire.
    pub fn fire_drones(
        &mut self,
        level: u32,
        boss_present: bool,
        enemies: &[Enemy],
        tuning: &Tuning,
        palette: &Palette,
    ) -> Vec<Projectile> {
        if self.is_dead() {
            return Vec::new();
        }
        let mut shots = Vec::new();
        for drone in self.drones.iter_mut().filter(|d| d.fire_cooldown == 0) {
            let target = if boss_present {
                Some(TargetRef::Boss)
            } else {
                enemies
                    .iter()
                    .filter(|e| e.alive)
                    .min_by(|a, b| {
                        a.pos
                            .distance_squared(drone.pos)
                            .total_cmp(&b.pos.distance_squared(drone.pos))
                    })
                    .map(|e| TargetRef::Enemy(e.id))
            };
            if let Some(target) = target {
                shots.extend(drone.fire(level, target, tuning, palette));
            }
        }
        shots
    }

    /// Spend one special stock. The player stays invulnerable while the beam lasts.
    pub fn try_special(&mut self, tuning: &Tuning) -> Option<SpecialAttack> {
        if self.special_stock == 0 || self.is_dead() {
            return None;
        }
        self.special_stock -= 1;
        self.invulnerable = self.invulnerable.max(tuning.special_duration);
        log::info!("Special attack fired, {} stock left", self.special_stock);
        Some(SpecialAttack::new(tuning.special_duration, tuning.playfield.width / 2.0))
    }
}

/// Drones granted at `level`, at most four
pub fn drones_for_level(level: u32) -> usize {
    match level {
        0..=1 => 0,
        2..=3 => 1,
        4..=5 => 2,
        6..=7 => 3,
        _ => 4,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum DroneTier {
    Trailing,
    Tight,
    Orbiting,
}

impl DroneTier {
    fn for_level(level: u32) -> Self {
        match level {
            10.. => DroneTier::Orbiting,
            7.. => DroneTier::Tight,
            _ => DroneTier::Trailing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Formation {
    /// Replays the player's position `delay` ticks late
    Trail { delay: usize },
    /// Circles the player; angle in degrees
    Orbit { angle: f32 },
}

/// Support craft that follows the player and fires on its own cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDrone {
    pub pos: Vec2,
    pub size: f32,
    pub formation: Formation,
    pub fire_interval: u32,
    fire_cooldown: u32,
}

impl OptionDrone {
    pub fn new(pos: Vec2, size: f32) -> Self {
        Self {
            pos,
            size,
            formation: Formation::Trail { delay: 10 },
            fire_interval: 20,
            fire_cooldown: 0,
        }
    }

    fn configure(&mut self, tier: DroneTier, index: usize, count: usize) {
        (self.formation, self.fire_interval) = match tier {
            DroneTier::Orbiting => (
                Formation::Orbit {
                    angle: index as f32 * 360.0 / count.max(1) as f32,
                },
                15,
            ),
            DroneTier::Tight => (Formation::Trail { delay: 5 + 3 * index }, 18),
            DroneTier::Trailing => (Formation::Trail { delay: 10 + 5 * index }, 20),
        };
    }

    fn update(&mut self, player: Vec2, trail: &VecDeque<Vec2>) {
        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        match &mut self.formation {
            Formation::Orbit { angle } => {
                *angle = (*angle + ORBIT_STEP_DEG) % 360.0;
                self.pos = player + from_heading(angle.to_radians(), ORBIT_RADIUS);
            }
            Formation::Trail { delay } => {
                self.pos = match trail.len().checked_sub(*delay) {
                    Some(i) if *delay > 0 => trail[i],
                    _ => player,
                };
            }
        }
    }

    /// Shot shape by level: homing from 12, a three-way spread from 8,
    /// heavy rounds from 5, a single shot below that
    fn fire(
        &mut self,
        level: u32,
        target: TargetRef,
        tuning: &Tuning,
        palette: &Palette,
    ) -> Vec<Projectile> {
        self.fire_cooldown = self.fire_interval.max(1);
        let origin = self.pos - Vec2::new(0.0, self.size / 2.0);
        let power = tuning.attack_power;
        let up = -FRAC_PI_2;
        let shot = |angle: f32| {
            Projectile::new(origin, from_heading(angle, PLAYER_SHOT_SPEED), Side::Player)
                .with_size(PLAYER_SHOT_SIZE)
                .with_color(palette.cyan)
        };

        match level {
            12.. => vec![
                Projectile::new(origin, from_heading(up, PLAYER_SHOT_SPEED * 0.8), Side::Player)
                    .with_motion(Motion::homing(0.1, 5f32.to_radians()))
                    .with_size(PLAYER_SHOT_SIZE)
                    .with_damage(power)
                    .with_color(palette.magenta)
                    .with_target(target),
            ],
            8.. => [-DRONE_SPREAD_DEG, 0.0, DRONE_SPREAD_DEG]
                .into_iter()
                .map(|offset| shot(up + offset.to_radians()).with_damage(power))
                .collect(),
            5.. => vec![shot(up).with_damage(power * 3)],
            _ => vec![shot(up).with_damage(power)],
        }
    }
}

/// A vertical beam from the player to the top edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialAttack {
    pub remaining: u32,
    pub duration: u32,
    pub width: f32,
    /// Tick the beam last dealt damage on
    resolved_tick: Option<u64>,
}

impl SpecialAttack {
    pub fn new(duration: u32, width: f32) -> Self {
        Self {
            remaining: duration,
            duration,
            width,
            resolved_tick: None,
        }
    }

    /// Beam area for a player standing at `origin`
    pub fn beam(&self, origin: Vec2) -> Rect {
        let half = self.width / 2.0;
        Rect::new(Vec2::new(origin.x - half, 0.0), Vec2::new(origin.x + half, origin.y))
    }

    /// Claim the damage application for `tick`; false if already done
    pub fn claim(&mut self, tick: u64) -> bool {
        if self.remaining == 0 || self.resolved_tick == Some(tick) {
            return false;
        }
        self.resolved_tick = Some(tick);
        true
    }

    pub fn update(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> (Player, Tuning) {
        let tuning = Tuning::default();
        (Player::new(&tuning), tuning)
    }

    #[test]
    fn test_hit_grants_invulnerability() {
        let (mut player, tuning) = player();
        assert_eq!(player.take_hit(1, &tuning), PlayerHit::LifeLost);
        assert_eq!(player.lives, 2);
        assert_eq!(player.invulnerable, 120);
        assert_eq!(player.take_hit(1, &tuning), PlayerHit::Ignored);
        assert_eq!(player.lives, 2);
    }

    #[test]
    fn test_shield_absorbs_hits() {
        let (mut player, tuning) = player();
        player.grant_shield(&tuning);
        assert_eq!(player.take_hit(2, &tuning), PlayerHit::Shielded);
        assert_eq!(player.shield, 4);
        assert_eq!(player.lives, 3);
        assert_eq!(player.invulnerable, 60);
    }

    #[test]
    fn test_boss_contact_costs_two_lives() {
        let (mut player, tuning) = player();
        player.take_hit(tuning.boss_contact_lives, &tuning);
        assert_eq!(player.lives, 1);
        player.invulnerable = 0;
        player.take_hit(tuning.boss_contact_lives, &tuning);
        assert!(player.is_dead());
        assert_eq!(player.take_hit(1, &tuning), PlayerHit::Ignored);
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let (mut player, tuning) = player();
        let palette = tuning.palette;
        assert_eq!(player.fire(Weapon::Normal, false, None, &tuning, &palette).len(), 1);
        for _ in 0..14 {
            player.update(&tuning);
            assert!(player.fire(Weapon::Normal, false, None, &tuning, &palette).is_empty());
        }
        player.update(&tuning);
        assert_eq!(player.fire(Weapon::Normal, false, None, &tuning, &palette).len(), 1);
    }

    #[test]
    fn test_weapon_shapes() {
        let (mut player, tuning) = player();
        let palette = tuning.palette;

        let wide = player.fire(Weapon::WideShot, false, None, &tuning, &palette);
        assert_eq!(wide.len(), 3);
        assert!(wide.iter().all(|p| p.vel.y < 0.0));
        let xs: Vec<f32> = wide.iter().map(|p| p.pos.x).collect();
        assert_eq!(xs, vec![390.0, 400.0, 410.0]);

        player.fire_cooldown = 0;
        let laser = player.fire(Weapon::Laser, false, None, &tuning, &palette);
        assert!(laser[0].is_penetrating());
        assert_eq!(laser[0].damage, tuning.attack_power * 2);

        player.fire_cooldown = 0;
        let bomb = player.fire(Weapon::Bomb, false, None, &tuning, &palette);
        assert_eq!(bomb[0].area.map(|a| a.radius), Some(tuning.bomb_radius));

        player.fire_cooldown = 0;
        let homing = player.fire(Weapon::Homing, false, Some(42), &tuning, &palette);
        assert_eq!(homing[0].target, Some(TargetRef::Enemy(42)));
    }

    #[test]
    fn test_triple_shot_is_wide_shot() {
        let weapon: Weapon = serde_json::from_str(r#""triple_shot""#).unwrap();
        assert_eq!(weapon, Weapon::WideShot);
        assert_eq!(serde_json::to_string(&weapon).unwrap(), r#""wide_shot""#);
    }

    #[test]
    fn test_drone_count_by_level() {
        let counts: Vec<usize> = (1..=9).map(drones_for_level).collect();
        assert_eq!(counts, vec![0, 1, 1, 2, 2, 3, 3, 4, 4]);
        assert_eq!(drones_for_level(30), 4);
    }

    #[test]
    fn test_drones_replay_player_trail() {
        let (mut player, tuning) = player();
        player.sync_drones(4, &tuning);
        assert_eq!(player.drones.len(), 2);
        for i in 0..25 {
            player.pos.x = i as f32;
            player.update(&tuning);
        }
        // Trail holds x = 0..=24; delays are 10 and 15
        assert_eq!(player.drones[0].pos.x, 15.0);
        assert_eq!(player.drones[1].pos.x, 10.0);
    }

    #[test]
    fn test_orbiting_drones_keep_their_angle_across_syncs() {
        let (mut player, tuning) = player();
        player.sync_drones(10, &tuning);
        player.update(&tuning);
        player.sync_drones(10, &tuning);
        player.update(&tuning);
        for (i, drone) in player.drones.iter().enumerate() {
            assert!((drone.pos.distance(player.pos) - 60.0).abs() < 1e-3);
            let expected = i as f32 * 90.0 + 4.0;
            assert_eq!(drone.formation, Formation::Orbit { angle: expected });
        }
    }

    #[test]
    fn test_drones_hold_fire_without_target() {
        let (mut player, tuning) = player();
        let palette = tuning.palette;
        player.sync_drones(5, &tuning);
        assert!(player.fire_drones(5, false, &[], &tuning, &palette).is_empty());

        let shots = player.fire_drones(5, true, &[], &tuning, &palette);
        assert_eq!(shots.len(), 2);
        assert!(shots.iter().all(|p| p.damage == 3 && p.owner == Side::Player));
        assert!(player.fire_drones(5, true, &[], &tuning, &palette).is_empty());

        for _ in 0..20 {
            player.update(&tuning);
        }
        assert_eq!(player.fire_drones(5, true, &[], &tuning, &palette).len(), 2);
    }

    #[test]
    fn test_drone_shot_shapes() {
        let (mut player, tuning) = player();
        let palette = tuning.palette;
        player.sync_drones(8, &tuning);
        let spread = player.fire_drones(8, true, &[], &tuning, &palette);
        assert_eq!(spread.len(), 4 * 3);

        let (mut player, _) = self::player();
        player.sync_drones(12, &tuning);
        let homing = player.fire_drones(12, true, &[], &tuning, &palette);
        assert_eq!(homing.len(), 4);
        assert!(homing.iter().all(|p| p.target == Some(TargetRef::Boss)));
    }

    #[test]
    fn test_special_gauge_charges_and_spends() {
        let (mut player, tuning) = player();
        assert!(player.try_special(&tuning).is_none());
        for _ in 0..tuning.special_gauge_per_stock {
            player.update(&tuning);
        }
        assert_eq!(player.special_stock(), 1);
        let special = player.try_special(&tuning);
        assert!(special.is_some());
        assert_eq!(player.special_stock(), 0);
        assert_eq!(player.invulnerable, tuning.special_duration);
    }

    #[test]
    fn test_special_claims_once_per_tick() {
        let mut special = SpecialAttack::new(3, 400.0);
        assert!(special.claim(10));
        assert!(!special.claim(10));
        assert!(special.claim(11));
        special.update();
        special.update();
        special.update();
        assert!(special.is_finished());
        assert!(!special.claim(12));
    }

    #[test]
    fn test_beam_covers_column_above_player() {
        let special = SpecialAttack::new(300, 400.0);
        let beam = special.beam(Vec2::new(400.0, 540.0));
        assert_eq!(beam.min, Vec2::new(200.0, 0.0));
        assert_eq!(beam.max, Vec2::new(600.0, 540.0));
    }
}
