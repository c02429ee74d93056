mod common;
mod ember_drake;
mod gloom_bat;
mod sporeling;
mod stone_golem;
mod tide_oracle;
mod venom_thornback;

use super::{CatalogBuilder, CreatureTemplate};
use crate::game::ability::AbilityDef;

type Creature = (CreatureTemplate, Vec<AbilityDef>);

pub(super) fn register(builder: CatalogBuilder) -> CatalogBuilder {
    let creatures: [Creature; 6] = [
        ember_drake::creature(),
        venom_thornback::creature(),
        sporeling::creature(),
        tide_oracle::creature(),
        gloom_bat::creature(),
        stone_golem::creature(),
    ];

    creatures
        .into_iter()
        .fold(builder, |builder, (template, abilities)| {
            builder.template(template).abilities(abilities)
        })
}
