//! Encounter scheduling
//!
//! Decides when a boss, a regular enemy or a pickup should appear, based on
//! the progression snapshot the leveling subsystem supplies each tick.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::boss::BossArchetype;
use super::enemy::EnemyKind;

/// Inbound difficulty view for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSnapshot {
    pub level: u32,
    pub kills: u32,
    pub health_multiplier: f32,
    pub speed_multiplier: f32,
    pub experience_multiplier: f32,
    /// Ticks between regular spawns; derived from the level when unset
    pub spawn_interval: Option<u32>,
    pub available_kinds: Vec<EnemyKind>,
}

impl Default for ProgressionSnapshot {
    fn default() -> Self {
        Self {
            level: 1,
            kills: 0,
            health_multiplier: 1.0,
            speed_multiplier: 1.0,
            experience_multiplier: 1.0,
            spawn_interval: None,
            available_kinds: vec![EnemyKind::Basic],
        }
    }
}

impl ProgressionSnapshot {
    pub fn spawn_interval(&self) -> u32 {
        self.spawn_interval
            .unwrap_or_else(|| 60u32.saturating_sub(self.level.saturating_mul(5)).max(30))
            .max(1)
    }
}

/// Fixed story bosses by level
const BOSS_LEVELS: [(u32, BossArchetype); 4] = [
    (3, BossArchetype::Fairy),
    (5, BossArchetype::Environmental),
    (8, BossArchetype::Witch),
    (12, BossArchetype::Dragon),
];

/// Random bosses start at this level, then every `RANDOM_BOSS_STEP` levels
const RANDOM_BOSS_FROM: u32 = 10;
const RANDOM_BOSS_STEP: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncounterScheduler {
    /// Archetypes already fought; each appears at most once
    spawned: Vec<BossArchetype>,
    last_boss_level: Option<u32>,
    spawn_timer: u32,
    pickup_timer: u32,
}

impl EncounterScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_spawned(&self, archetype: BossArchetype) -> bool {
        self.spawned.contains(&archetype)
    }

    /// Boss that should appear at `level`, if any
    pub fn boss_due<R: Rng + ?Sized>(&self, level: u32, rng: &mut R) -> Option<BossArchetype> {
        if self.last_boss_level == Some(level) {
            return None;
        }

        if let Some(&(_, archetype)) = BOSS_LEVELS.iter().find(|(at, _)| *at == level) {
            return (!self.has_spawned(archetype)).then_some(archetype);
        }

        if level >= RANDOM_BOSS_FROM && level % RANDOM_BOSS_STEP == 0 {
            let remaining: Vec<BossArchetype> = BossArchetype::ALL
                .into_iter()
                .filter(|a| !self.has_spawned(*a))
                .collect();
            if remaining.is_empty() {
                return None;
            }
            return Some(remaining[rng.random_range(0..remaining.len())]);
        }

        None
    }

    pub fn mark_spawned(&mut self, archetype: BossArchetype, level: u32) {
        if !self.has_spawned(archetype) {
            self.spawned.push(archetype);
        }
        self.last_boss_level = Some(level);
        self.spawn_timer = 0;
    }

    /// Count one tick toward the next regular spawn. Never fires during a boss fight.
    pub fn enemy_due(&mut self, progression: &ProgressionSnapshot, boss_active: bool) -> bool {
        if boss_active {
            return false;
        }
        self.spawn_timer += 1;
        if self.spawn_timer >= progression.spawn_interval() {
            self.spawn_timer = 0;
            true
        } else {
            false
        }
    }

    /// Count one tick toward the next pickup drop. Runs through boss fights too.
    pub fn pickup_due(&mut self, interval: u32) -> bool {
        self.pickup_timer += 1;
        if self.pickup_timer >= interval.max(1) {
            self.pickup_timer = 0;
            true
        } else {
            false
        }
    }

    /// Random kind from the snapshot's available set
    pub fn pick_kind<R: Rng + ?Sized>(
        &self,
        progression: &ProgressionSnapshot,
        rng: &mut R,
    ) -> EnemyKind {
        match progression.available_kinds.len() {
            0 => EnemyKind::Basic,
            n => progression.available_kinds[rng.random_range(0..n)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_story_bosses_by_level() {
        let scheduler = EncounterScheduler::new();
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(scheduler.boss_due(1, &mut rng), None);
        assert_eq!(scheduler.boss_due(3, &mut rng), Some(BossArchetype::Fairy));
        assert_eq!(scheduler.boss_due(5, &mut rng), Some(BossArchetype::Environmental));
        assert_eq!(scheduler.boss_due(8, &mut rng), Some(BossArchetype::Witch));
        assert_eq!(scheduler.boss_due(12, &mut rng), Some(BossArchetype::Dragon));
    }

    #[test]
    fn test_each_archetype_once() {
        let mut scheduler = EncounterScheduler::new();
        let mut rng = Pcg32::seed_from_u64(1);
        scheduler.mark_spawned(BossArchetype::Fairy, 3);
        assert_eq!(scheduler.boss_due(3, &mut rng), None);
        assert_eq!(scheduler.boss_due(4, &mut rng), None);
    }

    #[test]
    fn test_random_boss_picks_unspawned() {
        let mut scheduler = EncounterScheduler::new();
        let mut rng = Pcg32::seed_from_u64(9);
        let fought = [BossArchetype::Fairy, BossArchetype::Witch, BossArchetype::Environmental];
        for archetype in fought {
            scheduler.mark_spawned(archetype, 1);
        }
        assert_eq!(scheduler.boss_due(10, &mut rng), Some(BossArchetype::Dragon));
        scheduler.mark_spawned(BossArchetype::Dragon, 10);
        assert_eq!(scheduler.boss_due(15, &mut rng), None);
        assert_eq!(scheduler.boss_due(11, &mut rng), None);
    }

    #[test]
    fn test_spawn_interval_floor() {
        let mut p = ProgressionSnapshot::default();
        assert_eq!(p.spawn_interval(), 55);
        p.level = 20;
        assert_eq!(p.spawn_interval(), 30);
        p.spawn_interval = Some(12);
        assert_eq!(p.spawn_interval(), 12);
    }

    #[test]
    fn test_no_regular_spawns_during_boss() {
        let mut scheduler = EncounterScheduler::new();
        let p = ProgressionSnapshot {
            spawn_interval: Some(3),
            ..Default::default()
        };
        let fired: Vec<bool> = (0..6).map(|_| scheduler.enemy_due(&p, false)).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true]);
        assert!((0..10).all(|_| !scheduler.enemy_due(&p, true)));
    }

    #[test]
    fn test_pickup_cadence_ignores_boss_fights() {
        let mut scheduler = EncounterScheduler::new();
        let drops: Vec<usize> = (1..=1800).filter(|_| scheduler.pickup_due(600)).collect();
        assert_eq!(drops, vec![600, 1200, 1800]);
        scheduler.mark_spawned(BossArchetype::Fairy, 3);
        assert!((1..600).all(|_| !scheduler.pickup_due(600)));
        assert!(scheduler.pickup_due(600));
    }

    #[test]
    fn test_pick_kind_falls_back_to_basic() {
        let scheduler = EncounterScheduler::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let p = ProgressionSnapshot {
            available_kinds: Vec::new(),
            ..Default::default()
        };
        assert_eq!(scheduler.pick_kind(&p, &mut rng), EnemyKind::Basic);
        let p = ProgressionSnapshot {
            available_kinds: vec![EnemyKind::Sniper],
            ..Default::default()
        };
        assert_eq!(scheduler.pick_kind(&p, &mut rng), EnemyKind::Sniper);
    }
}
