use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use super::{
    engine::{BattleEngine, SessionState},
    entity::{Entity, EntityId, EntityState, TeamId},
    status::{StatusEffect, StatusKind},
    world::PlayerId,
};
use crate::game::{
    enums::{Controller, Element},
    stats::BaseStats,
};

/// 클라이언트에 보내는 전체 상태. 엔티티는 ID로 키잉된다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleSnapshot {
    pub battle_id: Uuid,
    pub state: SessionState,
    pub now_ms: u64,
    pub elapsed_secs: f64,
    pub winner: Option<TeamId>,
    pub teams: Vec<TeamSnapshot>,
    pub entities: BTreeMap<EntityId, EntitySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSnapshot {
    pub id: TeamId,
    pub player: PlayerId,
    pub controller: Controller,
    pub entities: Vec<EntityId>,
    pub living: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub team: TeamId,
    pub owner: PlayerId,
    pub template: &'static str,
    pub name: String,
    pub element: Element,
    pub stats: BaseStats,
    pub health: u32,
    pub max_health: u32,
    pub alive: bool,
    pub state: EntityState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast: Option<CastSnapshot>,
    pub cooldowns: BTreeMap<&'static str, u64>,
    pub effects: Vec<StatusSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastSnapshot {
    pub ability: &'static str,
    pub target: Option<EntityId>,
    pub total_ms: u64,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub name: &'static str,
    pub kind: StatusKind,
    pub value: i32,
    /// None이면 영구
    pub remaining_ms: Option<u64>,
}

impl BattleSnapshot {
    pub fn capture(engine: &BattleEngine) -> Self {
        let world = engine.world();
        let teams = world
            .teams()
            .iter()
            .map(|team| TeamSnapshot {
                id: team.id,
                player: team.player.clone(),
                controller: team.controller,
                entities: team.entities.clone(),
                living: world.living_members(team.id).len(),
            })
            .collect();
        let entities = world
            .entities()
            .map(|entity| (entity.id().clone(), EntitySnapshot::from(entity)))
            .collect();

        Self {
            battle_id: engine.id(),
            state: engine.state(),
            now_ms: engine.now_ms(),
            elapsed_secs: engine.now_ms() as f64 / 1000.0,
            winner: engine.outcome().and_then(|outcome| outcome.winner),
            teams,
            entities,
        }
    }
}

impl From<&Entity> for EntitySnapshot {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id().clone(),
            team: entity.team(),
            owner: entity.owner().to_string(),
            template: entity.template(),
            name: entity.nickname().to_string(),
            element: entity.element(),
            stats: *entity.stats(),
            health: entity.health(),
            max_health: entity.max_health(),
            alive: entity.is_alive(),
            state: entity.state(),
            cast: entity.cast().map(|cast| CastSnapshot {
                ability: cast.ability,
                target: cast.target.clone(),
                total_ms: cast.total_ms,
                elapsed_ms: cast.elapsed_ms,
                remaining_ms: cast.remaining_ms(),
            }),
            cooldowns: entity.cooldowns().clone(),
            effects: entity.effects().iter().map(StatusSnapshot::from).collect(),
            position: entity.position().map(str::to_string),
        }
    }
}

impl From<&StatusEffect> for StatusSnapshot {
    fn from(effect: &StatusEffect) -> Self {
        Self {
            name: effect.name,
            kind: effect.kind,
            value: effect.value,
            remaining_ms: effect.remaining_ms,
        }
    }
}
