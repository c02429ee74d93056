use super::{
    common::{Afflict, Empower, Leech},
    Creature,
};
use crate::game::{
    ability::{AbilityDef, AbilityParams, Targeting},
    battle::{EffectHook, StatusEffect, StatusKind},
    catalog::CreatureTemplate,
    enums::{DamageKind, Element},
    stats::BaseStats,
};

const NAME: &str = "Sporeling";

pub const PARASITIC_SPORE: &str = "Parasitic Spore";
pub const SPORE_BLOOM: &str = "Spore Bloom";
pub const LEECH_TENDRIL: &str = "Leech Tendril";

/// 숙주가 감염된 채 죽으면 포자 주인이 `heal`만큼 회복한다.
fn parasite(params: &AbilityParams) -> StatusEffect {
    StatusEffect::periodic(
        PARASITIC_SPORE,
        StatusKind::Dot,
        params.magnitude,
        params.duration_ms,
        params.tick_interval_ms,
    )
    .with_hook(EffectHook::HealSourceOnDeath {
        amount: params.heal,
    })
}

/// 만료될 때 보유자가 기생 포자에 감염되어 있으면 `heal`만큼 추가 회복.
fn bloom(params: &AbilityParams) -> StatusEffect {
    StatusEffect::periodic(
        SPORE_BLOOM,
        StatusKind::Hot,
        params.magnitude,
        params.duration_ms,
        params.tick_interval_ms,
    )
    .with_hook(EffectHook::ExpireHealWhileParasitized {
        amount: params.heal,
    })
}

pub(super) fn creature() -> Creature {
    let template = CreatureTemplate::new(NAME, Element::Nature, BaseStats::with_values(90, 10, 8, 10))
        .with_abilities(&[PARASITIC_SPORE, SPORE_BLOOM, LEECH_TENDRIL]);

    let abilities = vec![
        AbilityDef::new(
            PARASITIC_SPORE,
            NAME,
            Targeting::Enemy,
            Afflict {
                kind: DamageKind::Spell,
                recipe: parasite,
            },
        )
        .describe("Infects an enemy for 4 damage every 2 seconds over 8 seconds. If the host dies while infected, the Sporeling recovers 30 health.")
        .cast_time(1_000)
        .cooldown(10_000)
        .params(AbilityParams {
            heal: 30,
            magnitude: 4,
            duration_ms: 8_000,
            tick_interval_ms: 2_000,
            ..Default::default()
        }),
        AbilityDef::new(SPORE_BLOOM, NAME, Targeting::Ally, Empower { recipe: bloom })
            .describe("Heals an ally for 6 health per second over 5 seconds. If the ally still carries a parasitic spore when it fades, it recovers 15 more.")
            .cooldown(8_000)
            .params(AbilityParams {
                heal: 15,
                magnitude: 6,
                duration_ms: 5_000,
                tick_interval_ms: 1_000,
                ..Default::default()
            }),
        AbilityDef::new(
            LEECH_TENDRIL,
            NAME,
            Targeting::Enemy,
            Leech {
                kind: DamageKind::Attack,
            },
        )
        .describe("Drains 18 health from an enemy, healing for the damage actually dealt.")
        .cast_time(500)
        .cooldown(5_000)
        .params(AbilityParams {
            damage: 18,
            ..Default::default()
        }),
    ];

    (template, abilities)
}
