//! Boss phase controller
//!
//! A boss enters from above while immune, then either works through its
//! spell-card deck or, for the environmental archetype, unlocks stacking
//! hazard phases as its health falls. Movement runs alongside and is always
//! clamped to a safe margin inside the playfield.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::collision::{Damageable, Rect};
use super::events::GameEvent;
use super::hazard::{Darkness, GravityField, MovingWall};
use super::patterns::{self, EmitEnv, PatternId};
use super::projectile::Projectile;
use super::spell_card::{CardDamage, SpellCard, SpellDeck};
use crate::tuning::{Playfield, Tuning};

/// Closed set of boss kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossArchetype {
    Fairy,
    Witch,
    Dragon,
    Environmental,
}

impl BossArchetype {
    pub const ALL: [BossArchetype; 4] = [
        BossArchetype::Fairy,
        BossArchetype::Witch,
        BossArchetype::Dragon,
        BossArchetype::Environmental,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BossArchetype::Fairy => "fairy",
            BossArchetype::Witch => "witch",
            BossArchetype::Dragon => "dragon",
            BossArchetype::Environmental => "environmental",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Score awarded on defeat
    pub fn score(self) -> u64 {
        match self {
            BossArchetype::Fairy => 3000,
            BossArchetype::Witch => 8000,
            BossArchetype::Dragon => 12000,
            BossArchetype::Environmental => 7500,
        }
    }

    /// Patterns in deck order (empty for the environmental boss)
    pub fn patterns(self) -> &'static [PatternId] {
        match self {
            BossArchetype::Fairy => &[PatternId::FairyDance, PatternId::LightBurst],
            BossArchetype::Witch => &[
                PatternId::MagicStorm,
                PatternId::StarRain,
                PatternId::SpiralCurse,
            ],
            BossArchetype::Dragon => &[
                PatternId::DragonRoar,
                PatternId::FireSpiral,
                PatternId::ThunderSpear,
                PatternId::UltimateBlast,
            ],
            BossArchetype::Environmental => &[],
        }
    }
}

/// Lifecycle of one boss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossState {
    /// Descending into view, immune
    Entering { remaining: u32 },
    Active,
    Defeated,
}

/// Environmental phase level. Each phase keeps every earlier behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HazardPhase {
    /// Moving walls
    Walls = 1,
    /// Plus gravity fields
    Gravity = 2,
    /// Plus periodic darkness
    Darkness = 3,
}

/// Hazards owned by an environmental boss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardPhases {
    pub phase: HazardPhase,
    pub walls: Vec<MovingWall>,
    pub fields: Vec<GravityField>,
    pub darkness: Darkness,
    wall_timer: u32,
    gravity_timer: u32,
}

impl HazardPhases {
    fn new(tuning: &Tuning) -> Self {
        Self {
            phase: HazardPhase::Walls,
            walls: Vec::new(),
            fields: Vec::new(),
            darkness: Darkness::new(
                tuning.darkness_duration,
                tuning.darkness_cooldown,
                tuning.darkness_radius,
            ),
            wall_timer: 0,
            gravity_timer: 0,
        }
    }

    /// Phase implied by the remaining health fraction
    fn phase_for(fraction: f32) -> HazardPhase {
        if fraction <= 0.33 {
            HazardPhase::Darkness
        } else if fraction <= 0.66 {
            HazardPhase::Gravity
        } else {
            HazardPhase::Walls
        }
    }

    fn update<R: Rng + ?Sized>(&mut self, field: &Playfield, tuning: &Tuning, rng: &mut R) {
        self.wall_timer += 1;
        if self.wall_timer >= tuning.wall_interval {
            self.wall_timer = 0;
            self.walls.push(MovingWall::spawn(field, rng));
        }

        if self.phase >= HazardPhase::Gravity {
            self.gravity_timer += 1;
            let room = self.fields.len() < tuning.max_gravity_fields;
            if room && self.gravity_timer > tuning.gravity_interval {
                self.gravity_timer = 0;
                self.fields.push(GravityField::spawn(field, rng));
            }
        }

        if self.phase >= HazardPhase::Darkness {
            self.darkness.update();
        }

        for wall in &mut self.walls {
            wall.update();
        }
        self.walls.retain(|w| !w.is_offscreen(field));
        for well in &mut self.fields {
            well.update(field);
        }
    }

    fn clear(&mut self) {
        self.walls.clear();
        self.fields.clear();
        self.darkness.active = false;
    }
}

/// What drives a boss once it is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Cards(SpellDeck),
    Hazards(HazardPhases),
}

/// Per-archetype movement bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Movement {
    timer: u32,
    target_x: f32,
    direction: f32,
}

/// Result of a single damage application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Immune, entering or already defeated
    Ignored,
    Absorbed,
    /// The card at `index` broke and the next one took over
    CardBroken { index: usize, next: usize },
    /// Health crossed one or more hazard thresholds
    PhaseUnlocked { from: HazardPhase, to: HazardPhase },
    /// Terminal; `broken_card` is the card that broke on this hit, if any
    Defeated { broken_card: Option<usize> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    pub id: EntityId,
    pub archetype: BossArchetype,
    pub pos: Vec2,
    pub size: Vec2,
    pub state: BossState,
    /// Aggregate health across all cards
    pub health: f32,
    pub max_health: f32,
    pub behavior: Behavior,
    /// Damage flash for the renderer
    pub flash_ticks: u32,
    movement: Movement,
}

impl Boss {
    /// Build a boss of `archetype`. `level` only scales the environmental health pool.
    pub fn new(
        id: EntityId,
        archetype: BossArchetype,
        pos: Vec2,
        level: u32,
        tuning: &Tuning,
    ) -> Self {
        let behavior = match archetype {
            BossArchetype::Environmental => Behavior::Hazards(HazardPhases::new(tuning)),
            _ => Behavior::Cards(SpellDeck::new(
                archetype.patterns().iter().map(|&p| SpellCard::from_pattern(p)).collect(),
            )),
        };
        Self::with_behavior(id, archetype, pos, level, behavior, tuning)
    }

    /// Boss with an explicit card list
    pub fn with_cards(
        id: EntityId,
        archetype: BossArchetype,
        pos: Vec2,
        cards: Vec<SpellCard>,
        tuning: &Tuning,
    ) -> Self {
        Self::with_behavior(id, archetype, pos, 1, Behavior::Cards(SpellDeck::new(cards)), tuning)
    }

    fn with_behavior(
        id: EntityId,
        archetype: BossArchetype,
        pos: Vec2,
        level: u32,
        behavior: Behavior,
        tuning: &Tuning,
    ) -> Self {
        let max_health = match &behavior {
            Behavior::Cards(deck) => deck.cards().iter().map(|c| c.max_health).sum(),
            Behavior::Hazards(_) => level.max(1) as f32 * tuning.environmental_health_per_level,
        };
        Self {
            id,
            archetype,
            pos,
            size: Vec2::splat(tuning.boss_size),
            state: BossState::Entering {
                remaining: tuning.boss_entrance_ticks,
            },
            health: max_health,
            max_health,
            behavior,
            flash_ticks: 0,
            movement: Movement {
                timer: 0,
                target_x: pos.x,
                direction: 1.0,
            },
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, self.size)
    }

    pub fn is_entering(&self) -> bool {
        matches!(self.state, BossState::Entering { .. })
    }

    pub fn is_active(&self) -> bool {
        self.state == BossState::Active
    }

    pub fn is_defeated(&self) -> bool {
        self.state == BossState::Defeated
    }

    /// The card currently attacking; only while active
    pub fn active_card(&self) -> Option<&SpellCard> {
        match (&self.state, &self.behavior) {
            (BossState::Active, Behavior::Cards(deck)) => deck.active_card(),
            _ => None,
        }
    }

    pub fn active_card_index(&self) -> Option<usize> {
        match (&self.state, &self.behavior) {
            (BossState::Active, Behavior::Cards(deck)) => deck.active_index(),
            _ => None,
        }
    }

    pub fn hazards(&self) -> Option<&HazardPhases> {
        match &self.behavior {
            Behavior::Hazards(h) => Some(h),
            Behavior::Cards(_) => None,
        }
    }

    /// Health pool the special attack scales against
    pub fn current_pool(&self) -> f32 {
        self.active_card().map_or(self.max_health, |card| card.max_health)
    }

    /// Advance one tick. Returns projectiles emitted by the active card.
    pub fn update(
        &mut self,
        target: Vec2,
        env: &mut EmitEnv<'_>,
        tuning: &Tuning,
        events: &mut Vec<GameEvent>,
    ) -> Vec<Projectile> {
        self.flash_ticks = self.flash_ticks.saturating_sub(1);

        match self.state {
            BossState::Defeated => Vec::new(),
            BossState::Entering { remaining } => {
                if self.pos.y < tuning.boss_entry_depth {
                    self.pos.y += tuning.boss_descent_speed;
                }
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.state = BossState::Active;
                    log::info!("Boss {} ({}) engaged", self.id, self.archetype.name());
                } else {
                    self.state = BossState::Entering { remaining };
                }
                Vec::new()
            }
            BossState::Active => {
                self.update_movement(env.field, &mut *env.rng);
                let origin = self.pos;
                let id = self.id;
                match &mut self.behavior {
                    Behavior::Cards(deck) => {
                        let Some(card) = deck.active_card() else {
                            return Vec::new();
                        };
                        let pattern = card.pattern;
                        let elapsed = deck.step();
                        let shots = patterns::emit(pattern, elapsed, origin, target, env);
                        if let Some(next) = deck.check_timeout() {
                            log::info!("Boss {id} card {} timed out, next card {next}", next - 1);
                            events.push(GameEvent::CardAdvanced {
                                boss: id,
                                from: next - 1,
                                to: Some(next),
                                defeated: false,
                            });
                        }
                        shots
                    }
                    Behavior::Hazards(hazards) => {
                        hazards.update(env.field, tuning, &mut *env.rng);
                        Vec::new()
                    }
                }
            }
        }
    }

    fn update_movement<R: Rng + ?Sized>(&mut self, field: &Playfield, rng: &mut R) {
        let margin = (field.width * 0.08).floor();
        let movement = &mut self.movement;
        movement.timer += 1;

        match self.archetype {
            BossArchetype::Fairy => {
                if movement.timer % 120 == 0 {
                    let max_x = (field.width - margin).max(margin);
                    movement.target_x = rng.random_range(margin..=max_x);
                }
                let dx = movement.target_x - self.pos.x;
                if dx.abs() > 2.0 {
                    self.pos.x += dx * 0.02;
                }
            }
            BossArchetype::Witch => {
                let angle = movement.timer as f32 * 0.02;
                self.pos.x = field.width / 2.0 + angle.cos() * 80.0;
                self.pos.y = 150.0 + (angle * 2.0).sin() * 30.0;
            }
            BossArchetype::Dragon => {
                if movement.timer % 180 == 0 {
                    movement.direction = -movement.direction;
                    movement.target_x = if movement.direction < 0.0 {
                        field.width / 4.0
                    } else {
                        field.width * 3.0 / 4.0
                    };
                }
                let dx = movement.target_x - self.pos.x;
                if dx.abs() > 3.0 {
                    self.pos.x += dx * 0.015;
                }
            }
            BossArchetype::Environmental => {}
        }

        self.pos.x = self.pos.x.clamp(margin, (field.width - margin).max(margin));
        self.pos.y = self.pos.y.clamp(50.0, (field.height - 100.0).max(50.0));
    }

    /// Apply damage, driving card and phase transitions
    pub fn take_hit(&mut self, amount: f32) -> HitOutcome {
        if self.state != BossState::Active || amount <= 0.0 {
            return HitOutcome::Ignored;
        }

        self.health = (self.health - amount).max(0.0);
        self.flash_ticks = 10;

        let outcome = match &mut self.behavior {
            Behavior::Cards(deck) => match deck.damage_active(amount) {
                CardDamage::Empty => HitOutcome::Defeated { broken_card: None },
                CardDamage::Broken { index, next: None } => HitOutcome::Defeated {
                    broken_card: Some(index),
                },
                CardDamage::Broken {
                    index,
                    next: Some(next),
                } => HitOutcome::CardBroken { index, next },
                CardDamage::Absorbed => HitOutcome::Absorbed,
            },
            Behavior::Hazards(hazards) => {
                let fraction = if self.max_health > 0.0 {
                    self.health / self.max_health
                } else {
                    0.0
                };
                let reached = HazardPhases::phase_for(fraction);
                if reached > hazards.phase {
                    let from = hazards.phase;
                    hazards.phase = reached;
                    if reached == HazardPhase::Darkness {
                        hazards.darkness.begin();
                    }
                    HitOutcome::PhaseUnlocked { from, to: reached }
                } else {
                    HitOutcome::Absorbed
                }
            }
        };

        let outcome = match outcome {
            HitOutcome::Defeated { .. } => outcome,
            HitOutcome::CardBroken { index, .. } if self.health <= 0.0 => HitOutcome::Defeated {
                broken_card: Some(index),
            },
            _ if self.health <= 0.0 => HitOutcome::Defeated { broken_card: None },
            other => other,
        };

        if let HitOutcome::Defeated { .. } = outcome {
            self.defeat();
        }
        outcome
    }

    fn defeat(&mut self) {
        self.state = BossState::Defeated;
        if let Behavior::Hazards(hazards) = &mut self.behavior {
            hazards.clear();
        }
        log::info!("Boss {} ({}) defeated", self.id, self.archetype.name());
    }
}

impl Damageable for Boss {
    fn apply_damage(&mut self, amount: f32) -> bool {
        matches!(self.take_hit(amount), HitOutcome::Defeated { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::tuning::Palette;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Rig {
        field: Playfield,
        palette: Palette,
        rng: Pcg32,
        tuning: Tuning,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                field: Playfield::default(),
                palette: Palette::default(),
                rng: Pcg32::seed_from_u64(5),
                tuning: Tuning::default(),
            }
        }

        fn step(&mut self, boss: &mut Boss, events: &mut Vec<GameEvent>) -> Vec<Projectile> {
            let mut env = EmitEnv {
                field: &self.field,
                palette: &self.palette,
                rng: &mut self.rng,
            };
            boss.update(Vec2::new(400.0, 500.0), &mut env, &self.tuning, events)
        }
    }

    fn activated(archetype: BossArchetype, rig: &mut Rig) -> Boss {
        let mut boss = Boss::new(1, archetype, Vec2::new(400.0, BOSS_SPAWN_Y), 3, &rig.tuning);
        let mut events = Vec::new();
        for _ in 0..BOSS_ENTRANCE_TICKS {
            rig.step(&mut boss, &mut events);
        }
        assert!(boss.is_active());
        boss
    }

    #[test]
    fn test_aggregate_health_is_card_sum() {
        let tuning = Tuning::default();
        let boss = Boss::new(1, BossArchetype::Dragon, Vec2::ZERO, 1, &tuning);
        assert_eq!(boss.max_health, 300.0 + 350.0 + 400.0 + 500.0);
        let env_boss = Boss::new(2, BossArchetype::Environmental, Vec2::ZERO, 4, &tuning);
        assert_eq!(env_boss.max_health, 600.0);
    }

    #[test]
    fn test_entrance_is_immune_and_descends() {
        let mut rig = Rig::new();
        let spawn = Vec2::new(400.0, BOSS_SPAWN_Y);
        let mut boss = Boss::new(1, BossArchetype::Fairy, spawn, 1, &rig.tuning);
        let mut events = Vec::new();
        assert_eq!(boss.take_hit(50.0), HitOutcome::Ignored);
        assert!(boss.active_card().is_none());
        for _ in 0..BOSS_ENTRANCE_TICKS - 1 {
            assert!(rig.step(&mut boss, &mut events).is_empty());
        }
        assert!(boss.is_entering());
        rig.step(&mut boss, &mut events);
        assert!(boss.is_active());
        assert_eq!(boss.pos.y, BOSS_ENTRY_DEPTH);
        assert_eq!(boss.health, boss.max_health);
    }

    #[test]
    fn test_card_break_advances_once() {
        let mut rig = Rig::new();
        let mut boss = activated(BossArchetype::Fairy, &mut rig);
        // Fairy deck: 100 then 150
        assert_eq!(boss.take_hit(60.0), HitOutcome::Absorbed);
        assert_eq!(boss.take_hit(60.0), HitOutcome::CardBroken { index: 0, next: 1 });
        assert_eq!(boss.active_card_index(), Some(1));
        assert_eq!(boss.active_card().map(|c| c.current_health), Some(150.0));
        assert_eq!(boss.take_hit(60.0), HitOutcome::Absorbed);
        assert_eq!(boss.active_card_index(), Some(1));
    }

    #[test]
    fn test_breaking_last_card_defeats() {
        let mut rig = Rig::new();
        let mut boss = activated(BossArchetype::Fairy, &mut rig);
        boss.take_hit(100.0);
        assert_eq!(boss.take_hit(150.0), HitOutcome::Defeated { broken_card: Some(1) });
        assert!(boss.is_defeated());
        assert!(boss.active_card().is_none());
        assert_eq!(boss.take_hit(10.0), HitOutcome::Ignored);
    }

    #[test]
    fn test_empty_deck_falls_to_any_damage() {
        let mut rig = Rig::new();
        let pos = Vec2::new(400.0, 120.0);
        let mut boss = Boss::with_cards(1, BossArchetype::Fairy, pos, Vec::new(), &rig.tuning);
        boss.state = BossState::Active;
        let mut events = Vec::new();
        assert!(rig.step(&mut boss, &mut events).is_empty());
        assert!(boss.apply_damage(1.0));
    }

    #[test]
    fn test_timeout_hands_off_and_reports() {
        let mut rig = Rig::new();
        let cards = vec![
            SpellCard::new("a", PatternId::FairyDance, 30, 100.0),
            SpellCard::new("b", PatternId::LightBurst, 30, 100.0),
        ];
        let pos = Vec2::new(400.0, 120.0);
        let mut boss = Boss::with_cards(1, BossArchetype::Fairy, pos, cards, &rig.tuning);
        boss.state = BossState::Active;
        let mut events = Vec::new();
        for _ in 0..30 {
            rig.step(&mut boss, &mut events);
        }
        assert_eq!(boss.active_card_index(), Some(1));
        assert_eq!(
            events,
            vec![GameEvent::CardAdvanced {
                boss: 1,
                from: 0,
                to: Some(1),
                defeated: false
            }]
        );
    }

    #[test]
    fn test_active_card_emits_on_period() {
        let mut rig = Rig::new();
        let mut boss = activated(BossArchetype::Fairy, &mut rig);
        let mut events = Vec::new();
        let mut fired = 0;
        for _ in 0..40 {
            fired += rig.step(&mut boss, &mut events).len();
        }
        // fairy_dance: 8 shots every 20 ticks
        assert_eq!(fired, 16);
    }

    #[test]
    fn test_movement_stays_in_margin() {
        let mut rig = Rig::new();
        for archetype in [BossArchetype::Fairy, BossArchetype::Witch, BossArchetype::Dragon] {
            let mut boss = activated(archetype, &mut rig);
            let mut events = Vec::new();
            for _ in 0..600 {
                rig.step(&mut boss, &mut events);
                assert!(boss.pos.x >= 64.0 && boss.pos.x <= 736.0);
                assert!(boss.pos.y >= 50.0 && boss.pos.y <= 500.0);
            }
        }
    }

    #[test]
    fn test_environmental_phases_stack() {
        let mut rig = Rig::new();
        let mut boss = activated(BossArchetype::Environmental, &mut rig);
        // level 3: 450 health, thresholds at 297 and 148.5
        assert_eq!(boss.take_hit(100.0), HitOutcome::Absorbed);
        assert_eq!(
            boss.take_hit(100.0),
            HitOutcome::PhaseUnlocked {
                from: HazardPhase::Walls,
                to: HazardPhase::Gravity
            }
        );

        let mut events = Vec::new();
        for _ in 0..300 {
            rig.step(&mut boss, &mut events);
        }
        let hazards = boss.hazards().unwrap();
        assert!(!hazards.walls.is_empty());
        assert_eq!(hazards.fields.len(), 1);
        assert!(!hazards.darkness.active);

        assert_eq!(
            boss.take_hit(200.0),
            HitOutcome::PhaseUnlocked {
                from: HazardPhase::Gravity,
                to: HazardPhase::Darkness
            }
        );
        assert!(boss.hazards().unwrap().darkness.active);
        assert_eq!(boss.take_hit(100.0), HitOutcome::Defeated { broken_card: None });
        let hazards = boss.hazards().unwrap();
        assert!(hazards.walls.is_empty() && hazards.fields.is_empty());
    }

    #[test]
    fn test_overkill_on_first_card_defeats_through_aggregate() {
        let mut rig = Rig::new();
        let mut boss = activated(BossArchetype::Fairy, &mut rig);
        assert_eq!(boss.take_hit(1000.0), HitOutcome::Defeated { broken_card: Some(0) });
        assert_eq!(boss.health, 0.0);
    }
}
