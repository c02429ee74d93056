use tracing::debug;

use super::{
    entity::EntityId,
    events::{BattleEvent, EventKind},
    status::{EffectHook, StatusEffect, StatusKind},
    world::BattleWorld,
};
use crate::game::{enums::DamageKind, stats::scale_percent};

/// 데미지 요청
#[derive(Debug, Clone)]
pub struct DamageRequest {
    /// 없으면 환경/출처 불명
    pub source: Option<EntityId>,
    pub target: EntityId,
    pub amount: u32,
    pub kind: DamageKind,
    /// 이벤트에 남길 어빌리티/효과 이름
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub struct HealRequest {
    pub source: Option<EntityId>,
    pub target: EntityId,
    pub amount: u32,
    pub label: &'static str,
}

/// 전환된 회복 데미지의 이벤트 라벨
const REDIRECT_LABEL: &str = "Redirected Healing";

impl BattleWorld {
    /// 데미지를 적용하고 실제로 깎인 체력을 돌려준다.
    ///
    /// 반환값은 수정치 적용 후 양 이하이며 대상의 남은 체력으로만 잘린다.
    /// 죽었거나 없는 대상은 0을 돌려주고 아무것도 바꾸지 않는다.
    pub fn deal_damage(&mut self, request: DamageRequest) -> u32 {
        if !self.is_alive(&request.target) {
            return 0;
        }

        let mut amount = request.amount;
        if request.kind.is_modified() {
            let source_mods = request
                .source
                .as_ref()
                .and_then(|id| self.entity(id))
                .filter(|entity| entity.is_alive())
                .map(|source| {
                    let miss_chance = source.sum_hooks(|hook| match *hook {
                        EffectHook::ReducedAccuracy { miss_chance } => Some(i32::from(miss_chance)),
                        _ => None,
                    });
                    let outgoing = source.sum_hooks(|hook| match *hook {
                        EffectHook::OutgoingDamage { percent } => Some(percent),
                        _ => None,
                    });
                    (miss_chance.clamp(0, 100) as u8, outgoing)
                });

            if let (Some((miss_chance, outgoing)), Some(source_id)) = (source_mods, &request.source) {
                if request.kind == DamageKind::Attack && self.rng.roll_percent(miss_chance) {
                    let message = format!(
                        "{}'s {} misses {}",
                        self.name_of(source_id),
                        request.label,
                        self.name_of(&request.target)
                    );
                    self.emit(
                        BattleEvent::new(EventKind::System, message)
                            .source(source_id)
                            .target(&request.target)
                            .ability(request.label),
                    );
                    return 0;
                }
                amount = scale_percent(amount, outgoing);
            }

            if let Some(target) = self.entity(&request.target) {
                let incoming = target.sum_hooks(|hook| match *hook {
                    EffectHook::IncomingDamage { percent } => Some(percent),
                    _ => None,
                });
                amount = scale_percent(amount, incoming);
            }
        }

        let Some(target) = self.entity_mut(&request.target) else {
            return 0;
        };
        let applied = amount.min(target.health);
        target.health -= applied;
        let remaining = target.health;
        let target_name = target.nickname.clone();

        let mut event = BattleEvent::new(
            EventKind::Damage,
            format!("{target_name} takes {applied} damage from {}", request.label),
        )
        .target(&request.target)
        .ability(request.label)
        .amount(applied);
        if let Some(source) = &request.source {
            event = event.source(source);
        }
        self.emit(event);

        if request.kind == DamageKind::Attack && applied > 0 {
            if let Some(attacker) = &request.source {
                self.retaliate(&request.target, attacker);
            }
        }

        if remaining == 0 {
            self.handle_death(&request.target, request.source.as_ref());
        }
        applied
    }

    /// 회복을 적용하고 실제로 오른 체력을 돌려준다.
    ///
    /// 출처에 회복 전환 패시브가 있으면 (잃은 체력으로 제한된) 회복량이 그 비율만큼 줄고,
    /// 줄어든 양은 출처의 무작위 적에게 데미지로 간다.
    pub fn apply_heal(&mut self, request: HealRequest) -> u32 {
        if !self.is_alive(&request.target) {
            return 0;
        }

        let redirect_percent = request
            .source
            .as_ref()
            .and_then(|id| self.entity(id))
            .filter(|entity| entity.is_alive())
            .map(|entity| {
                entity.sum_hooks(|hook| match *hook {
                    EffectHook::RedirectHealing { percent } => Some(percent as i32),
                    _ => None,
                })
            })
            .unwrap_or(0)
            .clamp(0, 100) as u32;

        let Some(target) = self.entity_mut(&request.target) else {
            return 0;
        };
        // 전환량은 실제로 채울 수 있는 회복량을 기준으로 나눈다
        let healable = request.amount.min(target.max_health() - target.health);
        let redirected = healable * redirect_percent / 100;
        let applied = healable - redirected;
        target.health += applied;
        let target_name = target.nickname.clone();

        let mut event = BattleEvent::new(
            EventKind::Heal,
            format!("{target_name} recovers {applied} health from {}", request.label),
        )
        .target(&request.target)
        .ability(request.label)
        .amount(applied);
        if let Some(source) = &request.source {
            event = event.source(source);
        }
        self.emit(event);

        if redirected > 0 {
            if let Some(source) = &request.source {
                let enemies = self.living_enemies(source);
                if let Some(victim) = self.rng.pick(&enemies).cloned() {
                    self.deal_damage(DamageRequest {
                        source: Some(source.clone()),
                        target: victim,
                        amount: redirected,
                        kind: DamageKind::Redirect,
                        label: REDIRECT_LABEL,
                    });
                }
            }
        }
        applied
    }

    /// 피격자의 반응형 패시브 (공격자 중독)
    fn retaliate(&mut self, defender: &EntityId, attacker: &EntityId) {
        if !self.is_alive(attacker) {
            return;
        }
        let Some(entity) = self.entity(defender) else {
            return;
        };
        let triggers: Vec<(&'static str, EffectHook)> = entity
            .effects
            .iter()
            .flat_map(|effect| effect.hooks.iter().map(move |hook| (effect.name, *hook)))
            .filter(|(_, hook)| matches!(hook, EffectHook::PoisonAttackers { .. }))
            .collect();

        for (name, hook) in triggers {
            let EffectHook::PoisonAttackers {
                poison,
                chance,
                damage,
                duration_ms,
                tick_interval_ms,
            } = hook
            else {
                continue;
            };
            if !self.rng.roll_percent(chance) || !self.is_alive(attacker) {
                continue;
            }
            let poison =
                StatusEffect::periodic(poison, StatusKind::Dot, damage, duration_ms, tick_interval_ms)
                    .with_source(defender);
            let message = format!(
                "{}'s {} poisons {}",
                self.name_of(defender),
                name,
                self.name_of(attacker)
            );
            self.emit(
                BattleEvent::new(EventKind::System, message)
                    .source(defender)
                    .target(attacker)
                    .ability(name),
            );
            self.apply_status(attacker, poison);
        }
    }

    /// 체력이 0이 된 순간 한 번만 호출된다.
    fn handle_death(&mut self, fallen: &EntityId, killer: Option<&EntityId>) {
        let Some(entity) = self.entity_mut(fallen) else {
            return;
        };
        let effects = std::mem::take(&mut entity.effects);
        let interrupted = entity.cast.take();
        let name = entity.nickname.clone();

        debug!(entity = %fallen, killer = ?killer, "entity died");
        if let Some(cast) = interrupted {
            self.emit(
                BattleEvent::new(
                    EventKind::CastCancelled,
                    format!("{name}'s {} is interrupted", cast.ability),
                )
                .source(fallen)
                .ability(cast.ability),
            );
        }

        let mut event = BattleEvent::new(EventKind::Death, format!("{name} has fallen")).target(fallen);
        if let Some(killer) = killer {
            event = event.source(killer);
        }
        self.emit(event);

        for effect in effects {
            for hook in &effect.hooks {
                if let (EffectHook::HealSourceOnDeath { amount }, Some(owner)) = (hook, &effect.source) {
                    if self.is_alive(owner) {
                        self.apply_heal(HealRequest {
                            source: Some(owner.clone()),
                            target: owner.clone(),
                            amount: *amount,
                            label: effect.name,
                        });
                    }
                }
            }
        }
    }
}
