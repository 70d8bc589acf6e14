//! Outbound simulation events
//!
//! Everything outside the core (score display, audio, progression, effects)
//! learns about the fight through these.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use super::boss::{BossArchetype, HazardPhase};
use super::enemy::EnemyKind;
use super::patterns::PatternId;
use super::pickup::PickupKind;
use super::player::PlayerHit;

/// What was destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Enemy(EnemyKind),
    Boss(BossArchetype),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Emitted exactly once per destroyed entity, with its full reward
    Destroyed {
        id: EntityId,
        kind: EntityKind,
        pos: Vec2,
        score: u64,
        experience: u32,
    },
    /// A boss card was emptied. The boss stays unless a `Destroyed` follows.
    CardBroken {
        boss: EntityId,
        index: usize,
        pattern: PatternId,
        pos: Vec2,
        score: u64,
        experience: u32,
    },
    /// Non-lethal damage landed
    Damaged { id: EntityId, amount: f32 },
    PlayerHit { outcome: PlayerHit, lives: u32 },
    /// Active card changed. `to` is `None` when the deck is exhausted.
    CardAdvanced {
        boss: EntityId,
        from: usize,
        to: Option<usize>,
        defeated: bool,
    },
    PhaseChanged {
        boss: EntityId,
        from: HazardPhase,
        to: HazardPhase,
    },
    BossSpawned {
        id: EntityId,
        archetype: BossArchetype,
        level: u32,
    },
    SpecialFired { stock_left: u32 },
    /// A bomb went off
    Detonation { pos: Vec2, radius: f32 },
    /// Extra life from a boss kill or a pickup
    LifeGained { lives: u32 },
    PickupCollected { kind: PickupKind, pos: Vec2 },
    /// Terminal; no further events follow
    EncounterConcluded { victory: bool },
}
