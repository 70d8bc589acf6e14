//! Deterministic simulation module
//!
//! All combat logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or file I/O

pub mod boss;
pub mod collision;
pub mod enemy;
pub mod events;
pub mod hazard;
pub mod patterns;
pub mod pickup;
pub mod player;
pub mod pool;
pub mod projectile;
pub mod scheduler;
pub mod spell_card;
pub mod state;
pub mod tick;

/// Stable handle for enemies and bosses, unique within one encounter
pub type EntityId = u32;

pub use boss::{Boss, BossArchetype, BossState, HazardPhase, HitOutcome};
pub use collision::{Damageable, Rect, Resolution, resolve};
pub use enemy::{Enemy, EnemyKind};
pub use events::{EntityKind, GameEvent};
pub use hazard::{Darkness, GravityField, MovingWall};
pub use patterns::{EmitEnv, PatternId, emit};
pub use pickup::{Pickup, PickupKind};
pub use player::{Formation, OptionDrone, Player, PlayerHit, SpecialAttack, Weapon};
pub use pool::ProjectilePool;
pub use projectile::{Motion, Projectile, Side, TargetRef};
pub use scheduler::{EncounterScheduler, ProgressionSnapshot};
pub use spell_card::{SpellCard, SpellDeck};
pub use state::{EncounterPhase, EncounterState, FrameView};
pub use tick::{TickInput, TickOutput, tick};
