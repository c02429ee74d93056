use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use super::{
    status::{EffectHook, StatusEffect},
    world::PlayerId,
};
use crate::game::{enums::Element, stats::BaseStats};

/// 세션 안에서 유일한 엔티티 식별자. 소유 플레이어로 스코프된다 (`"{player}:{slot}"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn for_slot(player: &str, slot: usize) -> Self {
        Self(format!("{player}:{slot}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u8);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    Idle,
    Casting,
    Dead,
}

/// 진행 중인 시전
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastState {
    pub ability: &'static str,
    /// 단일 대상 어빌리티일 때 선택된 대상
    pub target: Option<EntityId>,
    pub total_ms: u64,
    pub elapsed_ms: u64,
}

impl CastState {
    pub fn remaining_ms(&self) -> u64 {
        self.total_ms.saturating_sub(self.elapsed_ms)
    }
}

/// 전투 안의 크리처 인스턴스.
///
/// 체력은 Combat Resolver(`BattleWorld::deal_damage`/`apply_heal`)만 바꾼다.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) team: TeamId,
    pub(crate) owner: PlayerId,
    pub(crate) template: &'static str,
    pub(crate) nickname: String,
    pub(crate) element: Element,
    pub(crate) stats: BaseStats,
    pub(crate) health: u32,
    pub(crate) abilities: Vec<&'static str>,
    pub(crate) effects: Vec<StatusEffect>,
    /// 0이 된 항목은 제거된다
    pub(crate) cooldowns: BTreeMap<&'static str, u64>,
    pub(crate) cast: Option<CastState>,
    pub(crate) position: Option<String>,
}

impl Entity {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: EntityId,
        team: TeamId,
        owner: PlayerId,
        template: &'static str,
        nickname: String,
        element: Element,
        stats: BaseStats,
        abilities: Vec<&'static str>,
    ) -> Self {
        Self {
            id,
            team,
            owner,
            template,
            nickname,
            element,
            stats,
            health: stats.max_health,
            abilities,
            effects: Vec::new(),
            cooldowns: BTreeMap::new(),
            cast: None,
            position: None,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn team(&self) -> TeamId {
        self.team
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn template(&self) -> &'static str {
        self.template
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn stats(&self) -> &BaseStats {
        &self.stats
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.stats.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn state(&self) -> EntityState {
        if !self.is_alive() {
            EntityState::Dead
        } else if self.cast.is_some() {
            EntityState::Casting
        } else {
            EntityState::Idle
        }
    }

    pub fn abilities(&self) -> &[&'static str] {
        &self.abilities
    }

    pub fn knows(&self, ability: &str) -> bool {
        self.abilities.iter().any(|known| *known == ability)
    }

    pub fn effects(&self) -> &[StatusEffect] {
        &self.effects
    }

    pub fn effects_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a StatusEffect> {
        self.effects.iter().filter(move |effect| effect.name == name)
    }

    pub fn cooldown(&self, ability: &str) -> u64 {
        self.cooldowns.get(ability).copied().unwrap_or(0)
    }

    pub fn cooldowns(&self) -> &BTreeMap<&'static str, u64> {
        &self.cooldowns
    }

    pub fn cast(&self) -> Option<&CastState> {
        self.cast.as_ref()
    }

    pub fn position(&self) -> Option<&str> {
        self.position.as_deref()
    }

    pub(crate) fn start_cooldown(&mut self, ability: &'static str, cooldown_ms: u64) {
        if cooldown_ms > 0 {
            self.cooldowns.insert(ability, cooldown_ms);
        }
    }

    /// 쿨다운을 감소시킨다. 0 아래로 내려가지 않으며 0이 된 항목은 지운다.
    pub(crate) fn tick_cooldowns(&mut self, delta_ms: u64) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(delta_ms);
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0);
    }

    /// 보유 효과들의 hook 값 합. 같은 효과가 여러 개면 모두 더한다.
    pub(crate) fn sum_hooks(&self, pick: impl Fn(&EffectHook) -> Option<i32>) -> i32 {
        self.effects
            .iter()
            .flat_map(|effect| effect.hooks.iter())
            .filter_map(pick)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golem() -> Entity {
        Entity::new(
            EntityId::for_slot("p1", 0),
            TeamId(0),
            "p1".to_string(),
            "Stone Golem",
            "Rocky".to_string(),
            Element::Earth,
            BaseStats::with_values(140, 12, 14, 4),
            vec!["Boulder Slam"],
        )
    }

    #[test]
    fn starts_idle_at_full_health() {
        let entity = golem();
        assert_eq!(entity.id().as_str(), "p1:0");
        assert_eq!(entity.health(), 140);
        assert_eq!(entity.state(), EntityState::Idle);
        assert!(entity.knows("Boulder Slam"));
        assert!(!entity.knows("Tremor"));
    }

    #[test]
    fn cooldowns_clamp_and_clear() {
        let mut entity = golem();
        entity.start_cooldown("Boulder Slam", 250);
        entity.start_cooldown("Tremor", 0);
        assert_eq!(entity.cooldowns().len(), 1);

        entity.tick_cooldowns(100);
        assert_eq!(entity.cooldown("Boulder Slam"), 150);
        entity.tick_cooldowns(1_000);
        assert_eq!(entity.cooldown("Boulder Slam"), 0);
        assert!(entity.cooldowns().is_empty());
    }
}
