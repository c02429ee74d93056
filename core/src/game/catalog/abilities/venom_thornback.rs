use super::{
    common::{Afflict, Passive, Strike},
    Creature,
};
use crate::game::{
    ability::{AbilityDef, AbilityParams, Targeting},
    battle::{EffectHook, StatusEffect, StatusKind},
    catalog::CreatureTemplate,
    enums::{DamageKind, Element},
    stats::BaseStats,
};

const NAME: &str = "Venom Thornback";

pub const BARBED_STRIKE: &str = "Barbed Strike";
pub const THORN_HIDE: &str = "Thorn Hide";
pub const TOXIC_SPIT: &str = "Toxic Spit";

fn thorn_hide(params: &AbilityParams) -> StatusEffect {
    StatusEffect::permanent(
        THORN_HIDE,
        EffectHook::PoisonAttackers {
            poison: "Thorn Venom",
            chance: params.chance,
            damage: params.magnitude,
            duration_ms: params.duration_ms,
            tick_interval_ms: params.tick_interval_ms,
        },
    )
}

fn poison(params: &AbilityParams) -> StatusEffect {
    StatusEffect::periodic(
        "Poison",
        StatusKind::Dot,
        params.magnitude,
        params.duration_ms,
        params.tick_interval_ms,
    )
}

pub(super) fn creature() -> Creature {
    let template = CreatureTemplate::new(NAME, Element::Nature, BaseStats::with_values(120, 13, 10, 8))
        .with_abilities(&[BARBED_STRIKE, THORN_HIDE, TOXIC_SPIT]);

    let abilities = vec![
        AbilityDef::new(
            BARBED_STRIKE,
            NAME,
            Targeting::Enemy,
            Strike {
                kind: DamageKind::Attack,
                verb: "rakes",
                proc: None,
            },
        )
        .describe("Rakes an enemy with barbed spines for 16 damage.")
        .cooldown(2_500)
        .params(AbilityParams {
            damage: 16,
            ..Default::default()
        }),
        AbilityDef::new(THORN_HIDE, NAME, Targeting::Caster, Passive { recipe: thorn_hide })
            .describe("Passive. Attackers have a 35% chance to be poisoned for 4 damage per second over 4 seconds.")
            .passive()
            .params(AbilityParams {
                chance: 35,
                magnitude: 4,
                duration_ms: 4_000,
                tick_interval_ms: 1_000,
                ..Default::default()
            }),
        AbilityDef::new(
            TOXIC_SPIT,
            NAME,
            Targeting::Enemy,
            Afflict {
                kind: DamageKind::Spell,
                recipe: poison,
            },
        )
        .describe("Spits venom for 6 damage and poisons the target for 8 damage per second over 4 seconds.")
        .cast_time(1_000)
        .cooldown(6_000)
        .params(AbilityParams {
            damage: 6,
            magnitude: 8,
            duration_ms: 4_000,
            tick_interval_ms: 1_000,
            ..Default::default()
        }),
    ];

    (template, abilities)
}
