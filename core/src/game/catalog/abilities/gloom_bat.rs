use super::{
    common::{Afflict, Leech, ScalingSweep},
    Creature,
};
use crate::game::{
    ability::{AbilityDef, AbilityParams, Targeting},
    battle::{EffectHook, StatusEffect, StatusKind},
    catalog::CreatureTemplate,
    enums::{DamageKind, Element},
    stats::BaseStats,
};

const NAME: &str = "Gloom Bat";

pub const SONIC_SCREECH: &str = "Sonic Screech";
pub const BLOOD_DRAIN: &str = "Blood Drain";
pub const NIGHT_SWARM: &str = "Night Swarm";

fn disoriented(params: &AbilityParams) -> StatusEffect {
    StatusEffect::modifier(
        "Disoriented",
        StatusKind::Debuff,
        params.duration_ms,
        EffectHook::ReducedAccuracy {
            miss_chance: params.chance,
        },
    )
}

pub(super) fn creature() -> Creature {
    let template = CreatureTemplate::new(NAME, Element::Shadow, BaseStats::with_values(80, 14, 5, 16))
        .with_abilities(&[SONIC_SCREECH, BLOOD_DRAIN, NIGHT_SWARM]);

    let abilities = vec![
        AbilityDef::new(
            SONIC_SCREECH,
            NAME,
            Targeting::Enemy,
            Afflict {
                kind: DamageKind::Spell,
                recipe: disoriented,
            },
        )
        .describe("Screeches for 8 damage. The target's attacks miss 40% of the time for 4 seconds.")
        .cooldown(7_000)
        .params(AbilityParams {
            damage: 8,
            chance: 40,
            duration_ms: 4_000,
            ..Default::default()
        }),
        AbilityDef::new(
            BLOOD_DRAIN,
            NAME,
            Targeting::Enemy,
            Leech {
                kind: DamageKind::Attack,
            },
        )
        .describe("Bites for 14 damage and heals for the damage dealt.")
        .cooldown(3_000)
        .params(AbilityParams {
            damage: 14,
            ..Default::default()
        }),
        AbilityDef::new(
            NIGHT_SWARM,
            NAME,
            Targeting::AllEnemies,
            ScalingSweep {
                kind: DamageKind::Spell,
                step_percent: 20,
            },
        )
        .describe("A swarm of bats hits every enemy, growing 20% stronger with each successive target.")
        .cast_time(1_000)
        .cooldown(9_000)
        .params(AbilityParams {
            damage: 12,
            ..Default::default()
        }),
    ];

    (template, abilities)
}
