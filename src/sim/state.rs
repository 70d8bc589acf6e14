//! Encounter state
//!
//! Everything one fight owns lives here: the player, the boss, enemies, both
//! projectile pools and the seeded RNG. A single owner means no locking and a
//! stable iteration order.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::boss::{Boss, BossArchetype};
use super::enemy::{Enemy, EnemyKind};
use super::hazard::{Darkness, GravityField, MovingWall};
use super::pickup::Pickup;
use super::player::{Player, SpecialAttack};
use super::pool::ProjectilePool;
use super::projectile::Projectile;
use super::scheduler::{EncounterScheduler, ProgressionSnapshot};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterPhase {
    Running,
    /// Boss defeated; waiting for `resume`
    StageClear,
    /// Player out of lives
    GameOver,
}

/// Complete encounter state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: EncounterPhase,
    /// Stages cleared so far
    pub stage: u32,
    pub score: u64,
    pub experience: u64,
    pub kills: u32,
    pub player: Player,
    pub boss: Option<Boss>,
    /// Sorted by id
    pub enemies: Vec<Enemy>,
    pub hostile: ProjectilePool,
    pub player_shots: ProjectilePool,
    pub specials: Vec<SpecialAttack>,
    pub pickups: Vec<Pickup>,
    pub scheduler: EncounterScheduler,
    next_id: EntityId,
}

impl EncounterState {
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            phase: EncounterPhase::Running,
            stage: 0,
            score: 0,
            experience: 0,
            kills: 0,
            player: Player::new(&tuning),
            boss: None,
            enemies: Vec::new(),
            hostile: ProjectilePool::new(tuning.hostile_capacity),
            player_shots: ProjectilePool::new(tuning.player_capacity),
            specials: Vec::new(),
            pickups: Vec::new(),
            scheduler: EncounterScheduler::new(),
            next_id: 1,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_concluded(&self) -> bool {
        self.phase != EncounterPhase::Running
    }

    /// A boss that has not been defeated yet
    pub fn active_boss(&self) -> Option<&Boss> {
        self.boss.as_ref().filter(|b| !b.is_defeated())
    }

    /// Spawn request from the scheduler. Refused while another boss is alive.
    pub fn spawn_boss(
        &mut self,
        archetype: BossArchetype,
        x: f32,
        y: f32,
        level: u32,
    ) -> Option<EntityId> {
        if let Some(current) = self.active_boss() {
            log::debug!(
                "Refusing {} spawn, boss {} still active",
                archetype.name(),
                current.id
            );
            return None;
        }

        let id = self.next_entity_id();
        let boss = Boss::new(id, archetype, Vec2::new(x, y), level, &self.tuning);
        log::info!(
            "Boss {} ({}) spawned at level {level}, {} health",
            id,
            archetype.name(),
            boss.max_health
        );
        self.boss = Some(boss);
        self.enemies.clear();
        self.scheduler.mark_spawned(archetype, level);
        Some(id)
    }

    /// Spawn a regular enemy scaled by `progression`
    pub fn spawn_enemy(
        &mut self,
        kind: EnemyKind,
        pos: Vec2,
        progression: &ProgressionSnapshot,
    ) -> EntityId {
        let id = self.next_entity_id();
        let enemy = Enemy::spawn(
            id,
            kind,
            pos,
            self.player.pos,
            progression,
            &self.tuning.playfield,
            &mut self.rng,
        );
        self.enemies.push(enemy);
        id
    }

    /// Nearest live enemy to the player
    pub fn nearest_enemy(&self) -> Option<EntityId> {
        let origin = self.player.pos;
        self.enemies
            .iter()
            .filter(|e| e.alive)
            .min_by(|a, b| {
                a.pos
                    .distance_squared(origin)
                    .total_cmp(&b.pos.distance_squared(origin))
            })
            .map(|e| e.id)
    }

    /// Start the next stage after a boss kill. No-op otherwise.
    pub fn resume(&mut self) -> bool {
        if self.phase != EncounterPhase::StageClear {
            return false;
        }
        self.phase = EncounterPhase::Running;
        self.boss = None;
        self.hostile.clear();
        self.stage += 1;
        log::info!("Stage {} begins", self.stage + 1);
        true
    }

    /// Drop destroyed enemies, spent projectiles, finished specials and used pickups
    pub fn cleanup(&mut self) {
        self.enemies.retain(|e| e.alive);
        self.pickups.retain(|p| p.active);
        self.hostile.prune();
        self.player_shots.prune();
        self.specials.retain(|s| !s.is_finished());
    }

    /// Read-only snapshot for the renderer
    pub fn view(&self) -> FrameView<'_> {
        let hazards = self.boss.as_ref().and_then(|b| b.hazards());
        let card_health = self
            .active_boss()
            .and_then(|b| b.active_card())
            .map(|c| c.health_fraction());
        FrameView {
            tick: self.time_ticks,
            score: self.score,
            player: &self.player,
            boss: self.boss.as_ref(),
            card_health,
            enemies: &self.enemies,
            hostile: self.hostile.as_slice(),
            player_shots: self.player_shots.as_slice(),
            walls: hazards.map_or(&[][..], |h| h.walls.as_slice()),
            fields: hazards.map_or(&[][..], |h| h.fields.as_slice()),
            darkness: hazards.map(|h| &h.darkness).filter(|d| d.active),
            specials: &self.specials,
            pickups: &self.pickups,
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub tick: u64,
    pub score: u64,
    pub player: &'a Player,
    pub boss: Option<&'a Boss>,
    /// Remaining share of the current spell card, for the health bar
    pub card_health: Option<f32>,
    pub enemies: &'a [Enemy],
    pub hostile: &'a [Projectile],
    pub player_shots: &'a [Projectile],
    pub walls: &'a [MovingWall],
    pub fields: &'a [GravityField],
    /// Present only while the darkness is on
    pub darkness: Option<&'a Darkness>,
    pub specials: &'a [SpecialAttack],
    pub pickups: &'a [Pickup],
}
