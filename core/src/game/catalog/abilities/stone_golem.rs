use super::{
    common::{Empower, ScalingSweep, Strike},
    Creature,
};
use crate::game::{
    ability::{AbilityDef, AbilityParams, Targeting},
    battle::{EffectHook, StatusEffect, StatusKind},
    catalog::CreatureTemplate,
    enums::{DamageKind, Element},
    stats::BaseStats,
};

const NAME: &str = "Stone Golem";

pub const BOULDER_SLAM: &str = "Boulder Slam";
pub const GRANITE_SKIN: &str = "Granite Skin";
pub const TREMOR: &str = "Tremor";

fn cracked_armor(params: &AbilityParams) -> StatusEffect {
    StatusEffect::modifier(
        "Cracked Armor",
        StatusKind::Debuff,
        params.duration_ms,
        EffectHook::IncomingDamage {
            percent: params.magnitude,
        },
    )
}

fn granite_skin(params: &AbilityParams) -> StatusEffect {
    StatusEffect::modifier(
        GRANITE_SKIN,
        StatusKind::Buff,
        params.duration_ms,
        EffectHook::IncomingDamage {
            percent: params.magnitude,
        },
    )
}

pub(super) fn creature() -> Creature {
    let template = CreatureTemplate::new(NAME, Element::Earth, BaseStats::with_values(140, 12, 14, 4))
        .with_abilities(&[BOULDER_SLAM, GRANITE_SKIN, TREMOR]);

    let abilities = vec![
        AbilityDef::new(
            BOULDER_SLAM,
            NAME,
            Targeting::Enemy,
            Strike {
                kind: DamageKind::Attack,
                verb: "slams",
                proc: Some(cracked_armor),
            },
        )
        .describe("Slams an enemy for 26 damage. 30% chance to crack its armor, increasing damage taken by 20% for 5 seconds.")
        .cast_time(1_200)
        .cooldown(5_000)
        .params(AbilityParams {
            damage: 26,
            chance: 30,
            magnitude: 20,
            duration_ms: 5_000,
            ..Default::default()
        }),
        AbilityDef::new(GRANITE_SKIN, NAME, Targeting::Caster, Empower { recipe: granite_skin })
            .describe("Hardens its skin, reducing damage taken by 40% for 6 seconds.")
            .cooldown(14_000)
            .params(AbilityParams {
                magnitude: -40,
                duration_ms: 6_000,
                ..Default::default()
            }),
        AbilityDef::new(
            TREMOR,
            NAME,
            Targeting::AllEnemies,
            ScalingSweep {
                kind: DamageKind::Spell,
                step_percent: 20,
            },
        )
        .describe("Shakes the ground under every enemy, 20% harder for each successive target.")
        .cooldown(10_000)
        .params(AbilityParams {
            damage: 10,
            ..Default::default()
        }),
    ];

    (template, abilities)
}
