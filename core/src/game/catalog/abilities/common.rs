//! 여러 크리처가 공유하는 behavior 틀. 수치는 `AbilityParams`에서 읽는다.

use crate::game::{
    ability::{AbilityBehavior, AbilityParams},
    battle::{ResolveContext, StatusEffect},
    enums::DamageKind,
};

/// 어빌리티 수치로 상태 효과를 만드는 함수
pub(super) type StatusRecipe = fn(&AbilityParams) -> StatusEffect;

/// 단일 대상 타격. `proc`이 있으면 맞췄을 때 `chance`% 확률로 대상에게 부여한다.
pub(super) struct Strike {
    pub kind: DamageKind,
    pub verb: &'static str,
    pub proc: Option<StatusRecipe>,
}

impl AbilityBehavior for Strike {
    fn resolve(&self, ctx: &mut ResolveContext<'_>) {
        let params = *ctx.params();
        let Some(target) = ctx.primary_target().cloned() else {
            return;
        };

        let message = format!(
            "{} {} {} with {}",
            ctx.caster_name(),
            self.verb,
            ctx.name_of(&target),
            ctx.ability().name
        );
        ctx.announce(message);

        let dealt = ctx.deal_damage(&target, params.damage, self.kind);
        if let Some(recipe) = self.proc {
            if dealt > 0 && ctx.roll(params.chance) {
                ctx.apply_status(&target, recipe(&params));
            }
        }
    }
}

/// 대상 수에 따라 강해지는 광역 공격.
///
/// 팀 순서로 살아있는 n번째 대상(0부터)에게 `damage * (100 + step * n) / 100`을 준다.
pub(super) struct ScalingSweep {
    pub kind: DamageKind,
    pub step_percent: u32,
}

impl AbilityBehavior for ScalingSweep {
    fn resolve(&self, ctx: &mut ResolveContext<'_>) {
        let params = *ctx.params();
        let targets = ctx.targets().to_vec();

        let message = format!(
            "{} unleashes {} on {} foes",
            ctx.caster_name(),
            ctx.ability().name,
            targets.len()
        );
        ctx.announce(message);

        let mut hit = 0u64;
        for target in &targets {
            if !ctx.is_alive(target) {
                continue;
            }
            let scaled = u64::from(params.damage) * (100 + u64::from(self.step_percent) * hit) / 100;
            ctx.deal_damage(target, u32::try_from(scaled).unwrap_or(u32::MAX), self.kind);
            hit += 1;
        }
    }
}

/// 흡혈. 실제로 들어간 데미지만큼 시전자를 회복한다.
pub(super) struct Leech {
    pub kind: DamageKind,
}

impl AbilityBehavior for Leech {
    fn resolve(&self, ctx: &mut ResolveContext<'_>) {
        let params = *ctx.params();
        let Some(target) = ctx.primary_target().cloned() else {
            return;
        };

        let message = format!(
            "{} drains {} with {}",
            ctx.caster_name(),
            ctx.name_of(&target),
            ctx.ability().name
        );
        ctx.announce(message);

        let dealt = ctx.deal_damage(&target, params.damage, self.kind);
        if dealt > 0 {
            let caster = ctx.caster_id().clone();
            ctx.heal(&caster, dealt);
        }
    }
}

pub(super) struct Mend;

impl AbilityBehavior for Mend {
    fn resolve(&self, ctx: &mut ResolveContext<'_>) {
        let params = *ctx.params();
        let Some(target) = ctx.primary_target().cloned() else {
            return;
        };

        let message = format!(
            "{} mends {} with {}",
            ctx.caster_name(),
            ctx.name_of(&target),
            ctx.ability().name
        );
        ctx.announce(message);
        ctx.heal(&target, params.heal);
    }
}

/// 선택적 직접 데미지 후 대상에게 항상 상태 효과를 건다.
pub(super) struct Afflict {
    pub kind: DamageKind,
    pub recipe: StatusRecipe,
}

impl AbilityBehavior for Afflict {
    fn resolve(&self, ctx: &mut ResolveContext<'_>) {
        let params = *ctx.params();
        let Some(target) = ctx.primary_target().cloned() else {
            return;
        };

        let message = format!(
            "{} afflicts {} with {}",
            ctx.caster_name(),
            ctx.name_of(&target),
            ctx.ability().name
        );
        ctx.announce(message);

        if params.damage > 0 {
            ctx.deal_damage(&target, params.damage, self.kind);
        }
        ctx.apply_status(&target, (self.recipe)(&params));
    }
}

/// 대상 전원(자신 포함 가능)에게 강화/보호 효과를 건다.
pub(super) struct Empower {
    pub recipe: StatusRecipe,
}

impl AbilityBehavior for Empower {
    fn resolve(&self, ctx: &mut ResolveContext<'_>) {
        let params = *ctx.params();
        let targets = ctx.targets().to_vec();

        let message = match targets.as_slice() {
            [only] if only == ctx.caster_id() => {
                format!("{} invokes {}", ctx.caster_name(), ctx.ability().name)
            }
            [only] => format!(
                "{} grants {} to {}",
                ctx.caster_name(),
                ctx.ability().name,
                ctx.name_of(only)
            ),
            _ => format!("{} grants {} to its allies", ctx.caster_name(), ctx.ability().name),
        };
        ctx.announce(message);

        for target in &targets {
            ctx.apply_status(target, (self.recipe)(&params));
        }
    }
}

/// 영구 패시브. 전투 시작 시 한 번 적용되며 다시 적용되면 갱신된다.
pub(super) struct Passive {
    pub recipe: StatusRecipe,
}

impl AbilityBehavior for Passive {
    fn resolve(&self, ctx: &mut ResolveContext<'_>) {
        let params = *ctx.params();
        let message = format!("{}'s {} awakens", ctx.caster_name(), ctx.ability().name);
        ctx.announce(message);
        ctx.apply_status_to_caster((self.recipe)(&params));
    }
}
