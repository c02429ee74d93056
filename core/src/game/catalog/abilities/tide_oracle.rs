use super::{
    common::{Empower, Mend, Passive},
    Creature,
};
use crate::game::{
    ability::{AbilityDef, AbilityParams, Targeting},
    battle::{EffectHook, StatusEffect, StatusKind},
    catalog::CreatureTemplate,
    enums::Element,
    stats::BaseStats,
};

const NAME: &str = "Tide Oracle";

pub const TIDAL_MEND: &str = "Tidal Mend";
pub const UNDERTOW: &str = "Undertow";
pub const MIST_VEIL: &str = "Mist Veil";

fn undertow(params: &AbilityParams) -> StatusEffect {
    StatusEffect::permanent(
        UNDERTOW,
        EffectHook::RedirectHealing {
            percent: params.magnitude.max(0) as u32,
        },
    )
}

fn mist_veil(params: &AbilityParams) -> StatusEffect {
    StatusEffect::modifier(
        MIST_VEIL,
        StatusKind::Buff,
        params.duration_ms,
        EffectHook::IncomingDamage {
            percent: params.magnitude,
        },
    )
}

pub(super) fn creature() -> Creature {
    let template = CreatureTemplate::new(NAME, Element::Water, BaseStats::with_values(100, 8, 9, 9))
        .with_abilities(&[TIDAL_MEND, UNDERTOW, MIST_VEIL]);

    let abilities = vec![
        AbilityDef::new(TIDAL_MEND, NAME, Targeting::Ally, Mend)
            .describe("Restores 25 health to an ally.")
            .cast_time(1_000)
            .cooldown(4_000)
            .params(AbilityParams {
                heal: 25,
                ..Default::default()
            }),
        AbilityDef::new(UNDERTOW, NAME, Targeting::Caster, Passive { recipe: undertow })
            .describe("Passive. 25% of the Oracle's healing is pulled away and strikes a random enemy instead.")
            .passive()
            .params(AbilityParams {
                magnitude: 25,
                ..Default::default()
            }),
        AbilityDef::new(MIST_VEIL, NAME, Targeting::Ally, Empower { recipe: mist_veil })
            .describe("Shrouds an ally in mist, reducing damage taken by 30% for 5 seconds.")
            .cooldown(10_000)
            .params(AbilityParams {
                magnitude: -30,
                duration_ms: 5_000,
                ..Default::default()
            }),
    ];

    (template, abilities)
}
