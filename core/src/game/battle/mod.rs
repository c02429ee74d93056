pub mod action;
pub mod combat;
pub mod config;
pub mod context;
pub mod engine;
pub mod entity;
pub mod events;
pub mod invariants;
pub mod setup;
pub mod snapshot;
pub mod status;
pub mod world;

pub use action::{ActionAccepted, ActionRejection, PlayerAction};
pub use combat::{DamageRequest, HealRequest};
pub use config::EngineConfig;
pub use context::ResolveContext;
pub use engine::{BattleEngine, BattleOutcome, EndReason, SessionState, TickReport};
pub use entity::{CastState, Entity, EntityId, EntityState, TeamId};
pub use events::{BattleEvent, EventKind, EventLog};
pub use invariants::{check_invariants, InvariantViolation};
pub use setup::{CardConfiguration, CardSpec, SetupError};
pub use snapshot::{BattleSnapshot, EntitySnapshot, StatusSnapshot, TeamSnapshot};
pub use status::{EffectHook, StatusEffect, StatusKind};
pub use world::{BattleWorld, PlayerId, Team};
