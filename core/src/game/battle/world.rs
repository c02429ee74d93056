use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use super::{
    entity::{Entity, EntityId, TeamId},
    events::{BattleEvent, EventKind, EventLog},
    status::StatusEffect,
};
use crate::game::{determinism::BattleRng, enums::Controller};

/// 외부 신원 제공자가 넘겨준 불투명 사용자 ID
pub type PlayerId = String;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub id: TeamId,
    pub player: PlayerId,
    pub controller: Controller,
    /// 팀 순서 (타겟 선택, 스케일링 순서의 기준)
    pub entities: Vec<EntityId>,
}

/// 한 세션의 가변 상태 전체. 세션의 틱 태스크만 소유한다.
#[derive(Debug)]
pub struct BattleWorld {
    pub(crate) entities: HashMap<EntityId, Entity>,
    pub(crate) teams: Vec<Team>,
    pub(crate) events: EventLog,
    pub(crate) rng: BattleRng,
    pub(crate) now_ms: u64,
    next_effect_id: u64,
}

impl BattleWorld {
    pub fn new(rng: BattleRng, event_log_capacity: usize) -> Self {
        Self {
            entities: HashMap::new(),
            teams: Vec::new(),
            events: EventLog::with_capacity(event_log_capacity),
            rng,
            now_ms: 0,
            next_effect_id: 1,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub(crate) fn entity_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.teams
            .iter()
            .flat_map(|team| team.entities.iter())
            .filter_map(|id| self.entities.get(id))
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == id)
    }

    pub fn team_of_player(&self, player: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.player == player)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    pub fn rng_mut(&mut self) -> &mut BattleRng {
        &mut self.rng
    }

    /// 모든 엔티티 ID를 팀 순서대로
    pub fn entity_order(&self) -> Vec<EntityId> {
        self.teams
            .iter()
            .flat_map(|team| team.entities.iter().cloned())
            .collect()
    }

    pub fn is_alive(&self, id: &EntityId) -> bool {
        self.entities.get(id).is_some_and(Entity::is_alive)
    }

    pub fn living_members(&self, team: TeamId) -> Vec<EntityId> {
        self.team(team)
            .map(|team| {
                team.entities
                    .iter()
                    .filter(|id| self.is_alive(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 같은 팀의 살아있는 엔티티 (자신 포함)
    pub fn living_allies(&self, of: &EntityId) -> Vec<EntityId> {
        match self.entities.get(of) {
            Some(entity) => self.living_members(entity.team),
            None => Vec::new(),
        }
    }

    /// 다른 모든 팀의 살아있는 엔티티, 팀 순서
    pub fn living_enemies(&self, of: &EntityId) -> Vec<EntityId> {
        let Some(entity) = self.entities.get(of) else {
            return Vec::new();
        };
        self.teams
            .iter()
            .filter(|team| team.id != entity.team)
            .flat_map(|team| team.entities.iter())
            .filter(|id| self.is_alive(id))
            .cloned()
            .collect()
    }

    pub fn are_enemies(&self, a: &EntityId, b: &EntityId) -> bool {
        match (self.entities.get(a), self.entities.get(b)) {
            (Some(a), Some(b)) => a.team != b.team,
            _ => false,
        }
    }

    pub fn name_of(&self, id: &EntityId) -> String {
        self.entities
            .get(id)
            .map(|entity| entity.nickname.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub(crate) fn emit(&mut self, event: BattleEvent) -> u64 {
        self.events.push(event, self.now_ms)
    }

    pub(crate) fn add_team(&mut self, team: Team, members: Vec<Entity>) {
        for entity in members {
            self.entities.insert(entity.id.clone(), entity);
        }
        self.teams.push(team);
    }

    /// 상태 효과를 부여한다. 죽었거나 없는 대상이면 `None`.
    ///
    /// 같은 이름의 효과는 독립 인스턴스로 중첩된다. 영구 효과만은 같은 이름이 있으면 교체한다.
    pub fn apply_status(&mut self, target: &EntityId, mut effect: StatusEffect) -> Option<u64> {
        let instance_id = self.next_effect_id;
        let entity = self.entities.get_mut(target).filter(|entity| entity.is_alive())?;
        self.next_effect_id += 1;

        effect.instance_id = instance_id;
        let name = effect.name;
        let refreshed = if effect.is_permanent() {
            entity
                .effects
                .iter_mut()
                .find(|existing| existing.is_permanent() && existing.name == name)
                .map(|existing| *existing = effect.clone())
                .is_some()
        } else {
            false
        };
        if !refreshed {
            entity.effects.push(effect.clone());
        }
        let holder = entity.nickname.clone();

        trace!(target = %target, effect = name, refreshed, "status applied");
        let mut event = BattleEvent::new(
            EventKind::StatusApplied,
            format!("{holder} is affected by {name}"),
        )
        .target(target);
        if let Some(source) = &effect.source {
            event = event.source(source);
        }
        self.emit(event);
        Some(instance_id)
    }
}
