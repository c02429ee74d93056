use tracing::debug;

use super::{
    combat::{DamageRequest, HealRequest},
    entity::{Entity, EntityId},
    events::{BattleEvent, EventKind},
    status::StatusEffect,
    world::BattleWorld,
};
use crate::game::{
    ability::{AbilityDef, AbilityParams},
    enums::DamageKind,
};

/// 어빌리티 behavior에 넘겨지는 실행 컨텍스트.
///
/// 대상은 생성 전에 검증되며, behavior는 이 컨텍스트를 통해서만 월드를 바꾼다.
pub struct ResolveContext<'w> {
    world: &'w mut BattleWorld,
    ability: &'w AbilityDef,
    caster: EntityId,
    targets: Vec<EntityId>,
    announced: bool,
}

impl<'w> ResolveContext<'w> {
    pub(crate) fn new(
        world: &'w mut BattleWorld,
        ability: &'w AbilityDef,
        caster: EntityId,
        targets: Vec<EntityId>,
    ) -> Self {
        Self {
            world,
            ability,
            caster,
            targets,
            announced: false,
        }
    }

    pub fn ability(&self) -> &AbilityDef {
        self.ability
    }

    pub fn params(&self) -> &AbilityParams {
        &self.ability.params
    }

    pub fn caster_id(&self) -> &EntityId {
        &self.caster
    }

    pub fn caster(&self) -> Option<&Entity> {
        self.world.entity(&self.caster)
    }

    /// 검증된 대상 목록 (팀 순서)
    pub fn targets(&self) -> &[EntityId] {
        &self.targets
    }

    pub fn primary_target(&self) -> Option<&EntityId> {
        self.targets.first()
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.world.entity(id)
    }

    pub fn is_alive(&self, id: &EntityId) -> bool {
        self.world.is_alive(id)
    }

    /// 시전자 팀의 살아있는 엔티티
    pub fn allies(&self) -> Vec<EntityId> {
        self.world.living_allies(&self.caster)
    }

    /// 상대 팀의 살아있는 엔티티
    pub fn enemies(&self) -> Vec<EntityId> {
        self.world.living_enemies(&self.caster)
    }

    pub fn name_of(&self, id: &EntityId) -> String {
        self.world.name_of(id)
    }

    pub fn caster_name(&self) -> String {
        self.world.name_of(&self.caster)
    }

    pub fn now_ms(&self) -> u64 {
        self.world.now_ms()
    }

    pub fn deal_damage(&mut self, target: &EntityId, amount: u32, kind: DamageKind) -> u32 {
        self.world.deal_damage(DamageRequest {
            source: Some(self.caster.clone()),
            target: target.clone(),
            amount,
            kind,
            label: self.ability.name,
        })
    }

    pub fn heal(&mut self, target: &EntityId, amount: u32) -> u32 {
        self.world.apply_heal(HealRequest {
            source: Some(self.caster.clone()),
            target: target.clone(),
            amount,
            label: self.ability.name,
        })
    }

    /// 출처가 비어 있으면 시전자로 채운다.
    pub fn apply_status(&mut self, target: &EntityId, mut effect: StatusEffect) -> bool {
        if effect.source.is_none() {
            effect.source = Some(self.caster.clone());
        }
        self.world.apply_status(target, effect).is_some()
    }

    pub fn apply_status_to_caster(&mut self, effect: StatusEffect) -> bool {
        let caster = self.caster.clone();
        self.apply_status(&caster, effect)
    }

    pub fn roll(&mut self, chance: u8) -> bool {
        self.world.rng_mut().roll_percent(chance)
    }

    pub fn emit(&mut self, event: BattleEvent) {
        self.world.emit(event);
    }

    pub fn system(&mut self, message: impl Into<String>) {
        let event = BattleEvent::new(EventKind::System, message)
            .source(&self.caster)
            .ability(self.ability.name);
        self.world.emit(event);
    }

    /// `ability_used` 이벤트를 남긴다. 한 번의 실행에서 두 번째 호출부터는 무시된다.
    pub fn announce(&mut self, message: impl Into<String>) {
        if self.announced {
            debug!(ability = self.ability.name, "ability already announced");
            return;
        }
        self.announced = true;

        let mut event = BattleEvent::new(EventKind::AbilityUsed, message)
            .source(&self.caster)
            .ability(self.ability.name);
        if let Some(target) = self.targets.first() {
            event = event.target(target);
        }
        self.world.emit(event);
    }

    pub(crate) fn is_announced(&self) -> bool {
        self.announced
    }
}
