//! Fixed timestep simulation tick
//!
//! Core loop that advances one encounter deterministically:
//! input, scheduling, boss and enemy updates, pickups, projectile motion,
//! collision resolution, cleanup and the conclusion check.

use glam::Vec2;
use rand::Rng;

use super::collision;
use super::events::GameEvent;
use super::patterns::EmitEnv;
use super::pickup::Pickup;
use super::player::Weapon;
use super::projectile::TargetRef;
use super::scheduler::ProgressionSnapshot;
use super::state::{EncounterPhase, EncounterState};
use crate::consts::*;

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Where the player wants to be; `None` keeps the last position
    pub player_pos: Option<Vec2>,
    pub fire: bool,
    pub weapon: Weapon,
    pub rapid_fire: bool,
    /// Spend a special stock
    pub special: bool,
    /// Difficulty view from the progression subsystem
    pub progression: ProgressionSnapshot,
}

/// Outbound result of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub events: Vec<GameEvent>,
    /// True once the encounter is over; stays true on later ticks
    pub concluded: bool,
}

/// Advance the encounter by one fixed timestep
pub fn tick(state: &mut EncounterState, input: &TickInput) -> TickOutput {
    if state.is_concluded() {
        return TickOutput {
            events: Vec::new(),
            concluded: true,
        };
    }

    state.time_ticks += 1;
    let mut events = Vec::new();
    let max_age = state.tuning.projectile_max_age;

    // Player
    if let Some(pos) = input.player_pos {
        state.player.move_to(pos, &state.tuning.playfield);
    }
    let level = input.progression.level;
    state.player.sync_drones(level, &state.tuning);
    state.player.update(&state.tuning);
    if input.fire {
        let nearest = state.nearest_enemy();
        let boss_present = state.active_boss().is_some();
        let EncounterState {
            player,
            player_shots,
            enemies,
            tuning,
            ..
        } = &mut *state;
        let shots = player.fire(input.weapon, input.rapid_fire, nearest, tuning, &tuning.palette);
        player_shots.extend(shots.into_iter().map(|p| p.with_max_age(max_age)));
        let drone_shots = player.fire_drones(level, boss_present, enemies, tuning, &tuning.palette);
        player_shots.extend(drone_shots.into_iter().map(|p| p.with_max_age(max_age)));
    }
    if input.special {
        if let Some(special) = state.player.try_special(&state.tuning) {
            events.push(GameEvent::SpecialFired {
                stock_left: state.player.special_stock(),
            });
            state.specials.push(special);
        }
    }

    schedule(state, &input.progression, &mut events);

    // Boss
    let target = state.player.pos;
    if let Some(boss) = state.boss.as_mut() {
        let mut env = EmitEnv {
            field: &state.tuning.playfield,
            palette: &state.tuning.palette,
            rng: &mut state.rng,
        };
        let shots = boss.update(target, &mut env, &state.tuning, &mut events);
        state.hostile.extend(shots.into_iter().map(|p| p.with_max_age(max_age)));
    }

    // Enemies
    {
        let EncounterState {
            enemies,
            hostile,
            rng,
            tuning,
            ..
        } = &mut *state;
        for enemy in enemies.iter_mut() {
            let shots = enemy.update(target, &tuning.playfield, &tuning.palette, &mut *rng);
            hostile.extend(shots.into_iter().map(|p| p.with_max_age(max_age)));
        }
    }

    // Pickups
    if state.scheduler.pickup_due(state.tuning.pickup_interval) {
        let pickup = Pickup::spawn(&state.tuning, &mut state.rng);
        log::debug!("{} pickup dropping at x {:.0}", pickup.kind.name(), pickup.pos.x);
        state.pickups.push(pickup);
    }
    for pickup in state.pickups.iter_mut() {
        pickup.update(&state.tuning.playfield);
    }

    advance_projectiles(state);

    // Collisions
    let resolution = collision::resolve(state, &input.progression);
    events.extend(resolution.events);
    for _ in 0..resolution.bosses_defeated {
        state.player.lives += 1;
        events.push(GameEvent::LifeGained {
            lives: state.player.lives,
        });
    }

    for special in state.specials.iter_mut() {
        special.update();
    }
    state.cleanup();

    // Conclusion
    if state.boss.as_ref().is_some_and(|b| b.is_defeated()) {
        state.phase = EncounterPhase::StageClear;
        state.hostile.clear();
        log::info!(
            "Stage {} cleared at tick {}, score {}",
            state.stage + 1,
            state.time_ticks,
            state.score
        );
        events.push(GameEvent::EncounterConcluded { victory: true });
    } else if state.player.is_dead() {
        state.phase = EncounterPhase::GameOver;
        log::info!("Game over at tick {}, score {}", state.time_ticks, state.score);
        events.push(GameEvent::EncounterConcluded { victory: false });
    }

    TickOutput {
        concluded: state.is_concluded(),
        events,
    }
}

/// Spawn bosses and regular enemies as the progression snapshot dictates
fn schedule(
    state: &mut EncounterState,
    progression: &ProgressionSnapshot,
    events: &mut Vec<GameEvent>,
) {
    let level = progression.level;

    if state.active_boss().is_none() {
        if let Some(archetype) = state.scheduler.boss_due(level, &mut state.rng) {
            let x = state.tuning.playfield.width / 2.0;
            if let Some(id) = state.spawn_boss(archetype, x, BOSS_SPAWN_Y, level) {
                events.push(GameEvent::BossSpawned { id, archetype, level });
                return;
            }
        }
    }

    let boss_active = state.active_boss().is_some();
    if state.scheduler.enemy_due(progression, boss_active) {
        let kind = state.scheduler.pick_kind(progression, &mut state.rng);
        let size = kind.profile().size;
        let width = state.tuning.playfield.width;
        let x = state.rng.random_range(size..=(width - size).max(size));
        let id = state.spawn_enemy(kind, Vec2::new(x, -size / 2.0), progression);
        log::trace!("Enemy {id} ({}) spawned", kind.name());
    }
}

/// Move both pools. Tracked handles resolve against the current entities.
fn advance_projectiles(state: &mut EncounterState) {
    let EncounterState {
        player,
        enemies,
        boss,
        hostile,
        player_shots,
        tuning,
        ..
    } = state;

    let player_pos = player.pos;
    let gravity = boss
        .as_ref()
        .and_then(|b| b.hazards())
        .map_or(&[][..], |h| h.fields.as_slice());
    let resolve = |target: TargetRef| match target {
        TargetRef::Player => Some(player_pos),
        TargetRef::Enemy(id) => enemies.iter().find(|e| e.alive && e.id == id).map(|e| e.pos),
        TargetRef::Boss => boss.as_ref().filter(|b| !b.is_defeated()).map(|b| b.pos),
    };

    hostile.advance(&resolve, &tuning.playfield, tuning.hostile_margin, gravity);
    player_shots.advance(&resolve, &tuning.playfield, tuning.player_shot_margin, gravity);
}
