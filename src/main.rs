//! Danmaku Core headless runner
//!
//! Plays a scripted autopilot through successive stages and prints a JSON
//! summary of the run.
//!
//! Usage: `danmaku-core [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use danmaku_core::Tuning;

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => Tuning::from_json_or_default(&json),
            Err(e) => {
                log::warn!("Could not read {path}: {e}, using default tuning");
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    log::info!("Danmaku Core (headless) starting with seed {seed}");
    let summary = autopilot::run(seed, tuning);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize summary: {e}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on wasm; the runner is native
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use glam::Vec2;
    use serde::Serialize;

    use danmaku_core::Tuning;
    use danmaku_core::consts::*;
    use danmaku_core::sim::{
        EncounterPhase, EncounterState, EnemyKind, EntityKind, GameEvent, ProgressionSnapshot,
        TickInput, Weapon, tick,
    };

    /// Ten simulated minutes
    const MAX_TICKS: u64 = TICK_RATE as u64 * 600;
    const MAX_LEVEL: u32 = 15;
    const WEAPONS: [Weapon; 5] = [
        Weapon::Normal,
        Weapon::WideShot,
        Weapon::Laser,
        Weapon::Homing,
        Weapon::Bomb,
    ];

    #[derive(Debug, Serialize)]
    pub struct Summary {
        seed: u64,
        ticks: u64,
        seconds: f32,
        outcome: &'static str,
        stages_cleared: u32,
        level: u32,
        score: u64,
        experience: u64,
        kills: u32,
        cards_broken: u32,
        pickups: u32,
        bosses_defeated: Vec<&'static str>,
        lives: u32,
    }

    /// Stand-in for the leveling subsystem: one level per eight kills
    fn progression(kills: u32, bosses: u32) -> ProgressionSnapshot {
        let level = (1 + kills / 8 + bosses).min(MAX_LEVEL);
        let unlocked = (level as usize).clamp(1, EnemyKind::ALL.len());
        ProgressionSnapshot {
            level,
            kills,
            health_multiplier: 1.0 + (level - 1) as f32 * 0.1,
            speed_multiplier: 1.0 + (level - 1) as f32 * 0.05,
            experience_multiplier: 1.0 + (level - 1) as f32 * 0.1,
            spawn_interval: None,
            available_kinds: EnemyKind::ALL[..unlocked].to_vec(),
        }
    }

    pub fn run(seed: u64, tuning: Tuning) -> Summary {
        let field = tuning.playfield;
        let mut state = EncounterState::with_tuning(seed, tuning);
        let mut bosses_defeated = Vec::new();
        let mut cards_broken = 0;
        let mut pickups = 0;

        let outcome = loop {
            if state.time_ticks >= MAX_TICKS {
                break "timeout";
            }

            let t = state.time_ticks as f32;
            let boss_up = state.active_boss().is_some_and(|b| b.is_active());
            let input = TickInput {
                player_pos: Some(Vec2::new(
                    field.width / 2.0 + (t * 0.02).sin() * field.width * 0.35,
                    field.height - 60.0,
                )),
                fire: true,
                weapon: WEAPONS[state.stage as usize % WEAPONS.len()],
                rapid_fire: state.stage > 0,
                special: boss_up && state.player.special_stock() > 0,
                progression: progression(state.kills, bosses_defeated.len() as u32),
            };

            let out = tick(&mut state, &input);
            for event in &out.events {
                match event {
                    GameEvent::Destroyed {
                        kind: EntityKind::Boss(archetype),
                        ..
                    } => bosses_defeated.push(archetype.name()),
                    GameEvent::CardBroken { .. } => cards_broken += 1,
                    GameEvent::PickupCollected { .. } => pickups += 1,
                    _ => {}
                }
            }

            if out.concluded {
                match state.phase {
                    EncounterPhase::StageClear => {
                        state.resume();
                    }
                    _ => break "game_over",
                }
            }
        };

        Summary {
            seed,
            ticks: state.time_ticks,
            seconds: state.time_ticks as f32 * SIM_DT,
            outcome,
            stages_cleared: state.stage,
            level: progression(state.kills, bosses_defeated.len() as u32).level,
            score: state.score,
            experience: state.experience,
            kills: state.kills,
            cards_broken,
            pickups,
            bosses_defeated,
            lives: state.player.lives,
        }
    }
}
