use serde::Serialize;
use tracing::trace;

use super::{
    combat::{DamageRequest, HealRequest},
    entity::EntityId,
    events::{BattleEvent, EventKind},
    world::BattleWorld,
};
use crate::game::enums::DamageKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Dot,
    Hot,
    Buff,
    Debuff,
}

impl StatusKind {
    pub fn is_periodic(self) -> bool {
        matches!(self, StatusKind::Dot | StatusKind::Hot)
    }
}

/// 상태 효과가 다른 곳(Combat Resolver, 만료 처리)에서 읽히는 행동 플래그
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectHook {
    /// 보유자가 주는 Attack/Spell 데미지 수정치 (%)
    OutgoingDamage { percent: i32 },
    /// 보유자가 받는 Attack/Spell 데미지 수정치 (%)
    IncomingDamage { percent: i32 },
    /// 보유자의 Attack 분류 행동이 빗나갈 확률 (%)
    ReducedAccuracy { miss_chance: u8 },
    /// 보유자를 Attack으로 때린 공격자에게 확률적으로 중독 부여
    PoisonAttackers {
        /// 공격자에게 붙는 중독 효과 이름
        poison: &'static str,
        chance: u8,
        damage: i32,
        duration_ms: u64,
        tick_interval_ms: u64,
    },
    /// 보유자가 시전하는 회복의 일부를 무작위 적에게 데미지로 전환 (%)
    RedirectHealing { percent: u32 },
    /// 이 효과를 지닌 채 보유자가 죽으면 효과 출처를 회복
    HealSourceOnDeath { amount: u32 },
    /// 만료 시점에 보유자에게 HealSourceOnDeath 효과가 있으면 보유자를 회복
    ExpireHealWhileParasitized { amount: u32 },
}

/// 엔티티에 붙는 시간제 효과
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEffect {
    /// 월드가 부여하는 인스턴스 번호 (같은 이름의 중첩 구분용)
    pub instance_id: u64,
    pub name: &'static str,
    pub kind: StatusKind,
    /// dot/hot: 펄스당 양, buff/debuff: 표시용 수정치
    pub value: i32,
    /// None이면 전투가 끝날 때까지 유지 (영구 패시브)
    pub remaining_ms: Option<u64>,
    pub tick_interval_ms: Option<u64>,
    pulse_progress_ms: u64,
    pub source: Option<EntityId>,
    pub hooks: Vec<EffectHook>,
}

/// 한 번의 `advance` 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectStep {
    pub pulses: u32,
    pub expired: bool,
}

impl StatusEffect {
    pub fn periodic(
        name: &'static str,
        kind: StatusKind,
        value: i32,
        duration_ms: u64,
        tick_interval_ms: u64,
    ) -> Self {
        Self {
            instance_id: 0,
            name,
            kind,
            value,
            remaining_ms: Some(duration_ms),
            tick_interval_ms: (tick_interval_ms > 0).then_some(tick_interval_ms),
            pulse_progress_ms: 0,
            source: None,
            hooks: Vec::new(),
        }
    }

    pub fn modifier(name: &'static str, kind: StatusKind, duration_ms: u64, hook: EffectHook) -> Self {
        Self {
            instance_id: 0,
            name,
            kind,
            value: hook_value(&hook),
            remaining_ms: Some(duration_ms),
            tick_interval_ms: None,
            pulse_progress_ms: 0,
            source: None,
            hooks: vec![hook],
        }
    }

    pub fn permanent(name: &'static str, hook: EffectHook) -> Self {
        Self {
            remaining_ms: None,
            ..Self::modifier(name, StatusKind::Buff, 0, hook)
        }
    }

    pub fn with_hook(mut self, hook: EffectHook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn with_source(mut self, source: &EntityId) -> Self {
        self.source = Some(source.clone());
        self
    }

    pub fn is_permanent(&self) -> bool {
        self.remaining_ms.is_none()
    }

    pub fn has_hook(&self, predicate: impl Fn(&EffectHook) -> bool) -> bool {
        self.hooks.iter().any(predicate)
    }

    /// 시간을 진행시키고 이번에 발생할 펄스 수와 만료 여부를 계산한다.
    ///
    /// 남은 지속 시간보다 큰 `delta_ms`는 남은 시간만큼만 반영하므로,
    /// 전체 수명 동안 펄스 수는 틱 크기와 무관하게 `floor(D / T)`이다.
    pub fn advance(&mut self, delta_ms: u64) -> EffectStep {
        let applied = match self.remaining_ms {
            Some(remaining) => delta_ms.min(remaining),
            None => delta_ms,
        };

        let mut pulses = 0;
        if let Some(interval) = self.tick_interval_ms {
            self.pulse_progress_ms += applied;
            pulses = (self.pulse_progress_ms / interval) as u32;
            self.pulse_progress_ms %= interval;
        }

        let expired = match self.remaining_ms.as_mut() {
            Some(remaining) => {
                *remaining -= applied;
                *remaining == 0
            }
            None => false,
        };

        EffectStep { pulses, expired }
    }
}

fn hook_value(hook: &EffectHook) -> i32 {
    match *hook {
        EffectHook::OutgoingDamage { percent } | EffectHook::IncomingDamage { percent } => percent,
        EffectHook::ReducedAccuracy { miss_chance } => i32::from(miss_chance),
        EffectHook::PoisonAttackers { chance, .. } => i32::from(chance),
        EffectHook::RedirectHealing { percent } => percent as i32,
        EffectHook::HealSourceOnDeath { amount } | EffectHook::ExpireHealWhileParasitized { amount } => {
            amount as i32
        }
    }
}

struct PendingStep {
    instance_id: u64,
    name: &'static str,
    kind: StatusKind,
    value: i32,
    source: Option<EntityId>,
    hooks: Vec<EffectHook>,
    step: EffectStep,
}

/// 보유자의 모든 상태 효과를 `delta_ms`만큼 진행시킨다.
///
/// 먼저 모든 효과의 시간을 진행해 펄스/만료를 확정한 뒤, 효과 목록 순서대로 펄스를 적용하고
/// 만료 훅을 모두 실행한 다음 만료된 효과를 제거한다. 도중에 보유자가 죽으면 남은 처리는 버린다 (사망 시 효과는 이미 제거됨).
pub fn advance_effects(world: &mut BattleWorld, holder: &EntityId, delta_ms: u64) {
    let pending: Vec<PendingStep> = match world.entity_mut(holder) {
        Some(entity) if entity.is_alive() => entity
            .effects
            .iter_mut()
            .map(|effect| PendingStep {
                instance_id: effect.instance_id,
                name: effect.name,
                kind: effect.kind,
                value: effect.value,
                source: effect.source.clone(),
                hooks: effect.hooks.clone(),
                step: effect.advance(delta_ms),
            })
            .collect(),
        _ => return,
    };

    for pending in &pending {
        for _ in 0..pending.step.pulses {
            if !world.is_alive(holder) {
                return;
            }
            pulse(world, holder, pending);
        }
    }

    // 만료 훅은 모두 제거 전의 효과 목록을 본다
    let expired: Vec<&PendingStep> = pending.iter().filter(|pending| pending.step.expired).collect();
    for pending in &expired {
        if !world.is_alive(holder) {
            return;
        }
        run_expire_hooks(world, holder, pending);
    }
    for pending in &expired {
        if !world.is_alive(holder) {
            return;
        }
        remove_expired(world, holder, pending);
    }
}

fn pulse(world: &mut BattleWorld, holder: &EntityId, pending: &PendingStep) {
    let amount = pending.value.max(0) as u32;
    trace!(holder = %holder, effect = pending.name, amount, "status pulse");

    match pending.kind {
        StatusKind::Dot => {
            world.deal_damage(DamageRequest {
                source: pending.source.clone(),
                target: holder.clone(),
                amount,
                kind: DamageKind::Periodic,
                label: pending.name,
            });
        }
        StatusKind::Hot => {
            world.apply_heal(HealRequest {
                source: pending.source.clone(),
                target: holder.clone(),
                amount,
                label: pending.name,
            });
        }
        StatusKind::Buff | StatusKind::Debuff => {}
    }
}

fn run_expire_hooks(world: &mut BattleWorld, holder: &EntityId, pending: &PendingStep) {
    for hook in &pending.hooks {
        if let EffectHook::ExpireHealWhileParasitized { amount } = *hook {
            let parasitized = world.entity(holder).is_some_and(|entity| {
                entity
                    .effects
                    .iter()
                    .any(|effect| effect.has_hook(|h| matches!(h, EffectHook::HealSourceOnDeath { .. })))
            });
            if parasitized {
                world.apply_heal(HealRequest {
                    source: None,
                    target: holder.clone(),
                    amount,
                    label: pending.name,
                });
            }
        }
    }
}

fn remove_expired(world: &mut BattleWorld, holder: &EntityId, pending: &PendingStep) {
    let Some(entity) = world.entity_mut(holder) else {
        return;
    };
    entity
        .effects
        .retain(|effect| effect.instance_id != pending.instance_id);
    let name = entity.nickname.clone();

    world.emit(
        BattleEvent::new(
            EventKind::StatusExpired,
            format!("{}'s {} wore off", name, pending.name),
        )
        .target(holder),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_pulses(duration_ms: u64, interval_ms: u64, step_ms: u64) -> u32 {
        let mut effect = StatusEffect::periodic("Burn", StatusKind::Dot, 5, duration_ms, interval_ms);
        let mut pulses = 0;
        for _ in 0..(duration_ms / step_ms + 5) {
            pulses += effect.advance(step_ms).pulses;
        }
        pulses
    }

    #[test]
    fn pulse_count_is_independent_of_step_size() {
        assert_eq!(total_pulses(4000, 1000, 100), 4);
        assert_eq!(total_pulses(4000, 1000, 1000), 4);
        assert_eq!(total_pulses(4000, 1000, 3000), 4);
        assert_eq!(total_pulses(3500, 1000, 100), 3);
        assert_eq!(total_pulses(3500, 1000, 700), 3);
    }

    #[test]
    fn large_step_produces_multiple_pulses() {
        let mut effect = StatusEffect::periodic("Bloom", StatusKind::Hot, 6, 5000, 250);
        let step = effect.advance(1000);
        assert_eq!(step.pulses, 4);
        assert!(!step.expired);
    }

    #[test]
    fn expires_exactly_at_zero() {
        let mut effect = StatusEffect::periodic("Poison", StatusKind::Dot, 8, 1000, 1000);
        assert!(!effect.advance(900).expired);
        let step = effect.advance(100);
        assert_eq!(step, EffectStep { pulses: 1, expired: true });
        assert_eq!(effect.remaining_ms, Some(0));
    }

    #[test]
    fn permanent_effect_never_expires() {
        let mut effect = StatusEffect::permanent("Thorn Hide", EffectHook::RedirectHealing { percent: 25 });
        assert!(effect.is_permanent());
        assert!(!effect.advance(u64::MAX / 2).expired);
        assert_eq!(effect.value, 25);
    }
}
