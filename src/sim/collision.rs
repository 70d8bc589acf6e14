//! Collision detection and damage resolution
//!
//! Runs once per tick after every entity has moved. Order:
//! 1. player projectiles vs enemies
//! 2. player projectiles vs boss
//! 3. player vs pickups
//! 4. player vs walls, hostile projectiles, enemies and boss
//! 5. special attack vs enemies and boss
//!
//! Each landed hit becomes a transient [`Hit`] that is settled into outbound
//! events immediately, so a destroyed entity's reward, score and removal are
//! always emitted together.

use glam::Vec2;

use super::EntityId;
use super::boss::{Boss, BossArchetype, HazardPhase, HitOutcome};
use super::enemy::{Enemy, EnemyKind};
use super::events::{EntityKind, GameEvent};
use super::patterns::PatternId;
use super::projectile::AreaBurst;
use super::scheduler::ProgressionSnapshot;
use super::state::EncounterState;
use crate::tuning::Tuning;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Bounds of a thick segment from `a` to `b`
    pub fn from_segment(a: Vec2, b: Vec2, half_width: f32) -> Self {
        let pad = Vec2::splat(half_width.abs());
        Self {
            min: a.min(b) - pad,
            max: a.max(b) + pad,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Strict overlap; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Uniform damage entry point for every victim type
pub trait Damageable {
    /// Apply `amount` of damage. True only on the hit that destroys the victim.
    fn apply_damage(&mut self, amount: f32) -> bool;
}

/// What dealt a hit
#[derive(Debug, Clone, Copy, PartialEq)]
enum Attacker {
    Shot(u32),
    Blast(u32),
    Special,
    Body,
}

/// What received a hit, captured at the moment of impact
#[derive(Debug, Clone, Copy, PartialEq)]
enum Victim {
    Enemy {
        id: EntityId,
        kind: EnemyKind,
        pos: Vec2,
        score: u64,
        experience: f32,
    },
    Card {
        boss: EntityId,
        index: usize,
        next: Option<usize>,
        pattern: PatternId,
        max_health: f32,
        pos: Vec2,
    },
    Boss {
        id: EntityId,
        archetype: BossArchetype,
        pos: Vec2,
        phase: Option<(HazardPhase, HazardPhase)>,
    },
}

/// One landed hit, consumed within the resolution pass that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hit {
    attacker: Attacker,
    victim: Victim,
    amount: f32,
    destroyed: bool,
}

/// Totals and events accumulated over one pass
struct Ledger<'a> {
    tuning: &'a Tuning,
    difficulty: f32,
    events: Vec<GameEvent>,
    score: u64,
    experience: u64,
    kills: u32,
    bosses_defeated: u32,
}

impl<'a> Ledger<'a> {
    fn new(tuning: &'a Tuning, difficulty: f32) -> Self {
        Self {
            tuning,
            difficulty,
            events: Vec::new(),
            score: 0,
            experience: 0,
            kills: 0,
            bosses_defeated: 0,
        }
    }

    fn experience(&self, multiplier: f32) -> u32 {
        (self.tuning.base_experience as f32 * multiplier * self.difficulty).floor().max(0.0) as u32
    }

    fn destroyed(
        &mut self,
        id: EntityId,
        kind: EntityKind,
        pos: Vec2,
        score: u64,
        experience: u32,
    ) {
        self.score += score;
        self.experience += u64::from(experience);
        self.events.push(GameEvent::Destroyed {
            id,
            kind,
            pos,
            score,
            experience,
        });
    }

    fn settle(&mut self, hit: Hit) {
        log::trace!("{:?} hit {:?} for {}", hit.attacker, hit.victim, hit.amount);
        match hit.victim {
            Victim::Enemy {
                id,
                kind,
                pos,
                score,
                experience,
            } => {
                if hit.destroyed {
                    let experience = self.experience(experience);
                    self.kills += 1;
                    self.destroyed(id, EntityKind::Enemy(kind), pos, score, experience);
                } else {
                    self.events.push(GameEvent::Damaged { id, amount: hit.amount });
                }
            }
            Victim::Card {
                boss,
                index,
                next,
                pattern,
                max_health,
                pos,
            } => {
                let score = (max_health.max(0.0) as u64) * self.tuning.card_score_per_health;
                let experience = self.experience(self.tuning.card_experience_multiplier);
                self.score += score;
                self.experience += u64::from(experience);
                self.events.push(GameEvent::CardBroken {
                    boss,
                    index,
                    pattern,
                    pos,
                    score,
                    experience,
                });
                log::info!("Boss {boss} card {index} broken");
                self.events.push(GameEvent::CardAdvanced {
                    boss,
                    from: index,
                    to: next,
                    defeated: true,
                });
            }
            Victim::Boss {
                id,
                archetype,
                pos,
                phase,
            } => {
                if hit.destroyed {
                    let experience = self.experience(self.tuning.boss_experience_multiplier);
                    self.bosses_defeated += 1;
                    let kind = EntityKind::Boss(archetype);
                    self.destroyed(id, kind, pos, archetype.score(), experience);
                } else {
                    self.events.push(GameEvent::Damaged { id, amount: hit.amount });
                }
                if let Some((from, to)) = phase {
                    log::info!("Boss {id} entered hazard phase {to:?}");
                    self.events.push(GameEvent::PhaseChanged { boss: id, from, to });
                }
            }
        }
    }

    fn hit_enemy(&mut self, attacker: Attacker, enemy: &mut Enemy, amount: f32) {
        if !enemy.alive {
            return;
        }
        let destroyed = enemy.apply_damage(amount);
        let profile = enemy.kind.profile();
        self.settle(Hit {
            attacker,
            victim: Victim::Enemy {
                id: enemy.id,
                kind: enemy.kind,
                pos: enemy.pos,
                score: profile.score,
                experience: profile.experience,
            },
            amount,
            destroyed,
        });
    }

    /// Damage the boss and settle whatever card or phase transition it caused
    fn hit_boss(&mut self, attacker: Attacker, boss: &mut Boss, amount: f32) {
        let card = boss.active_card().map(|c| (c.pattern, c.max_health));
        let (id, archetype, pos) = (boss.id, boss.archetype, boss.pos);
        let boss_victim = |phase| Victim::Boss {
            id,
            archetype,
            pos,
            phase,
        };
        let card_victim = |index, next| {
            card.map(|(pattern, max_health)| Victim::Card {
                boss: id,
                index,
                next,
                pattern,
                max_health,
                pos,
            })
        };

        let (victims, destroyed): (Vec<Victim>, bool) = match boss.take_hit(amount) {
            HitOutcome::Ignored => return,
            HitOutcome::Absorbed => (vec![boss_victim(None)], false),
            HitOutcome::PhaseUnlocked { from, to } => (vec![boss_victim(Some((from, to)))], false),
            HitOutcome::CardBroken { index, next } => {
                (card_victim(index, Some(next)).into_iter().collect(), false)
            }
            HitOutcome::Defeated { broken_card } => {
                let mut victims: Vec<Victim> = broken_card
                    .and_then(|index| card_victim(index, None))
                    .into_iter()
                    .collect();
                victims.push(boss_victim(None));
                (victims, true)
            }
        };

        for victim in victims {
            let destroyed = match victim {
                Victim::Card { .. } => true,
                _ => destroyed,
            };
            self.settle(Hit {
                attacker,
                victim,
                amount,
                destroyed,
            });
        }
    }

    /// Area damage to every hostile within `area.radius` of `pos`
    fn detonate(
        &mut self,
        shot: u32,
        pos: Vec2,
        area: AreaBurst,
        enemies: &mut [Enemy],
        boss: Option<&mut Boss>,
    ) {
        self.events.push(GameEvent::Detonation { pos, radius: area.radius });
        for enemy in enemies.iter_mut().filter(|e| e.alive) {
            if enemy.pos.distance(pos) <= area.radius {
                self.hit_enemy(Attacker::Blast(shot), enemy, area.damage);
            }
        }
        if let Some(boss) = boss {
            if boss.is_active() && boss.pos.distance(pos) <= area.radius {
                self.hit_boss(Attacker::Blast(shot), boss, area.damage);
            }
        }
    }
}

/// Summary of one resolution pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub events: Vec<GameEvent>,
    pub score: u64,
    pub experience: u64,
    pub kills: u32,
    pub bosses_defeated: u32,
}

/// Resolve every collision for the current tick.
///
/// Score, experience and kill totals are applied to `state`; the returned
/// [`Resolution`] carries the same totals plus the events in emission order.
/// Running it again on an already resolved tick produces nothing new.
pub fn resolve(state: &mut EncounterState, progression: &ProgressionSnapshot) -> Resolution {
    let EncounterState {
        tuning,
        time_ticks,
        player,
        boss,
        enemies,
        hostile,
        player_shots,
        specials,
        pickups,
        ..
    } = &mut *state;

    let mut ledger = Ledger::new(tuning, progression.experience_multiplier);

    // 1. Player projectiles vs enemies
    for shot in player_shots.iter_mut() {
        if !shot.active {
            continue;
        }
        let hitbox = shot.hitbox();
        if let Some(area) = shot.area {
            if enemies.iter().any(|e| e.alive && e.rect().overlaps(&hitbox)) {
                shot.active = false;
                ledger.detonate(shot.id, shot.pos, area, enemies, boss.as_mut());
            }
            continue;
        }
        for enemy in enemies.iter_mut() {
            if !enemy.alive || !shot.can_strike(enemy.id) || !enemy.rect().overlaps(&hitbox) {
                continue;
            }
            shot.strike_enemy(enemy.id);
            ledger.hit_enemy(Attacker::Shot(shot.id), enemy, shot.damage as f32);
        }
    }

    // 2. Player projectiles vs boss
    if let Some(target) = boss.as_mut().filter(|b| b.is_active()) {
        let body = target.rect();
        for shot in player_shots.iter_mut() {
            if !shot.active || !body.overlaps(&shot.hitbox()) {
                continue;
            }
            if let Some(area) = shot.area {
                shot.active = false;
                ledger.detonate(shot.id, shot.pos, area, enemies, Some(&mut *target));
            } else if shot.strike_boss() {
                ledger.hit_boss(Attacker::Shot(shot.id), target, shot.damage as f32);
            }
            if !target.is_active() {
                break;
            }
        }
    }

    // 3. Player vs pickups, at most one per tick. Invulnerability doesn't matter here.
    if !player.is_dead() {
        let body = player.rect();
        if let Some(pickup) = pickups.iter_mut().find(|p| p.active && p.rect().overlaps(&body)) {
            pickup.active = false;
            log::info!("Picked up {} at {:?}", pickup.kind.name(), pickup.pos);
            ledger.events.push(GameEvent::PickupCollected {
                kind: pickup.kind,
                pos: pickup.pos,
            });
            let effect = pickup.apply(player);
            ledger.events.push(effect);
        }
    }

    // 4. Player vs everything hostile. An invulnerable player is skipped outright.
    if !player.is_invulnerable() && !player.is_dead() {
        let body = player.rect();
        let mut lives_at_stake = None;

        let walls = boss
            .as_ref()
            .and_then(|b| b.hazards())
            .map_or(&[][..], |h| &h.walls[..]);
        if walls.iter().any(|w| w.rect().overlaps(&body)) {
            lives_at_stake = Some(1);
        }

        if lives_at_stake.is_none() {
            let struck = hostile
                .iter_mut()
                .find(|p| p.active && p.hitbox().overlaps(&body));
            if let Some(bullet) = struck {
                if !bullet.is_penetrating() {
                    bullet.active = false;
                }
                lives_at_stake = Some(1);
            }
        }

        if lives_at_stake.is_none() {
            let rammed = enemies
                .iter_mut()
                .find(|e| e.alive && e.rect().overlaps(&body));
            if let Some(enemy) = rammed {
                ledger.hit_enemy(Attacker::Body, enemy, tuning.contact_damage);
                lives_at_stake = Some(1);
            }
        }

        let boss_contact = boss
            .as_ref()
            .is_some_and(|b| b.is_active() && b.rect().overlaps(&body));
        if lives_at_stake.is_none() && boss_contact {
            lives_at_stake = Some(tuning.boss_contact_lives);
        }

        if let Some(lives) = lives_at_stake {
            let outcome = player.take_hit(lives, tuning);
            log::debug!("Player hit: {outcome:?}, {} lives left", player.lives);
            ledger.events.push(GameEvent::PlayerHit {
                outcome,
                lives: player.lives,
            });
        }
    }

    // 5. Special attack
    for special in specials.iter_mut() {
        if !special.claim(*time_ticks) {
            continue;
        }
        let beam = special.beam(player.pos);
        for enemy in enemies.iter_mut() {
            if enemy.alive && enemy.rect().overlaps(&beam) {
                ledger.hit_enemy(Attacker::Special, enemy, tuning.special_enemy_damage);
            }
        }
        if let Some(target) = boss.as_mut().filter(|b| b.is_active() && b.rect().overlaps(&beam)) {
            let per_tick = target.current_pool() * tuning.special_boss_fraction
                / special.duration.max(1) as f32;
            ledger.hit_boss(Attacker::Special, target, per_tick);
        }
        let cancelled = hostile.cancel_where(|p| p.hitbox().overlaps(&beam));
        if cancelled > 0 {
            log::trace!("Special cancelled {cancelled} hostile projectiles");
        }
    }

    let resolution = Resolution {
        events: ledger.events,
        score: ledger.score,
        experience: ledger.experience,
        kills: ledger.kills,
        bosses_defeated: ledger.bosses_defeated,
    };
    state.score += resolution.score;
    state.experience += resolution.experience;
    state.kills += resolution.kills;
    resolution
}
