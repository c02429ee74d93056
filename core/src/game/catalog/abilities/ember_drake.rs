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

const NAME: &str = "Ember Drake";

pub const FLAME_BITE: &str = "Flame Bite";
pub const INFERNO_SWEEP: &str = "Inferno Sweep";
pub const KINDLE: &str = "Kindle";

fn burn(params: &AbilityParams) -> StatusEffect {
    StatusEffect::periodic(
        "Burn",
        StatusKind::Dot,
        params.magnitude,
        params.duration_ms,
        params.tick_interval_ms,
    )
}

fn kindled(params: &AbilityParams) -> StatusEffect {
    StatusEffect::modifier(
        "Kindled",
        StatusKind::Buff,
        params.duration_ms,
        EffectHook::OutgoingDamage {
            percent: params.magnitude,
        },
    )
}

pub(super) fn creature() -> Creature {
    let template = CreatureTemplate::new(NAME, Element::Fire, BaseStats::with_values(110, 16, 6, 12))
        .with_abilities(&[FLAME_BITE, INFERNO_SWEEP, KINDLE]);

    let abilities = vec![
        AbilityDef::new(
            FLAME_BITE,
            NAME,
            Targeting::Enemy,
            Strike {
                kind: DamageKind::Attack,
                verb: "bites",
                proc: Some(burn),
            },
        )
        .describe("Bites an enemy for 20 damage with a 30% chance to burn it for 5 damage per second over 3 seconds.")
        .cooldown(3_000)
        .params(AbilityParams {
            damage: 20,
            chance: 30,
            magnitude: 5,
            duration_ms: 3_000,
            tick_interval_ms: 1_000,
            ..Default::default()
        }),
        AbilityDef::new(
            INFERNO_SWEEP,
            NAME,
            Targeting::AllEnemies,
            ScalingSweep {
                kind: DamageKind::Spell,
                step_percent: 20,
            },
        )
        .describe("Sweeps every enemy with fire. Each successive target takes 20% more than the last.")
        .cast_time(1_500)
        .cooldown(8_000)
        .params(AbilityParams {
            damage: 28,
            ..Default::default()
        }),
        AbilityDef::new(KINDLE, NAME, Targeting::Caster, Empower { recipe: kindled })
            .describe("Stokes its inner fire, dealing 25% more damage for 6 seconds.")
            .cooldown(12_000)
            .params(AbilityParams {
                magnitude: 25,
                duration_ms: 6_000,
                ..Default::default()
            }),
    ];

    (template, abilities)
}
