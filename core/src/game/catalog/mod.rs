//! 어빌리티 카탈로그.
//!
//! 프로세스 시작 시 한 번 만들어지고 이후에는 읽기 전용으로 모든 세션이 `Arc`로 공유한다.

mod abilities;
mod templates;

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::game::{
    ability::{AbilityDef, Targeting},
    battle::{BattleWorld, EntityId, ResolveContext},
};

pub use templates::CreatureTemplate;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("ability {0} is registered twice")]
    DuplicateAbility(String),
    #[error("creature template {0} is registered twice")]
    DuplicateTemplate(String),
    #[error("template {template} references unregistered ability {ability}")]
    UnknownAbility { template: String, ability: String },
    #[error("ability {ability} is owned by unknown template {owner}")]
    UnknownOwner { ability: String, owner: String },
    #[error("ability {ability} is not listed by its owner {owner}")]
    NotListedByOwner { ability: String, owner: String },
}

/// 어빌리티 해석 실패. 실패 시 월드는 전혀 바뀌지 않는다.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown ability {0}")]
    UnknownAbility(String),
    #[error("caster {0} is missing or dead")]
    CasterUnavailable(EntityId),
    #[error("ability requires a target")]
    MissingTarget,
    #[error("target {0} does not exist")]
    UnknownTarget(EntityId),
    #[error("target {0} is dead")]
    TargetDead(EntityId),
    #[error("target {0} is on the wrong side")]
    InvalidTarget(EntityId),
    #[error("no valid targets")]
    NoValidTargets,
}

#[derive(Default)]
pub struct CatalogBuilder {
    abilities: Vec<AbilityDef>,
    templates: Vec<CreatureTemplate>,
}

impl CatalogBuilder {
    pub fn ability(mut self, ability: AbilityDef) -> Self {
        self.abilities.push(ability);
        self
    }

    pub fn abilities(mut self, abilities: impl IntoIterator<Item = AbilityDef>) -> Self {
        self.abilities.extend(abilities);
        self
    }

    pub fn template(mut self, template: CreatureTemplate) -> Self {
        self.templates.push(template);
        self
    }

    /// 이름 중복과 템플릿/어빌리티 상호 참조를 검증한다.
    pub fn build(self) -> Result<AbilityCatalog, CatalogError> {
        let mut abilities = HashMap::with_capacity(self.abilities.len());
        for ability in self.abilities {
            let name = ability.name;
            if abilities.insert(name, ability).is_some() {
                return Err(CatalogError::DuplicateAbility(name.to_string()));
            }
        }

        let mut seen = HashSet::new();
        for template in &self.templates {
            if !seen.insert(template.name) {
                return Err(CatalogError::DuplicateTemplate(template.name.to_string()));
            }
            if let Some(missing) = template
                .abilities
                .iter()
                .find(|name| !abilities.contains_key(*name))
            {
                return Err(CatalogError::UnknownAbility {
                    template: template.name.to_string(),
                    ability: missing.to_string(),
                });
            }
        }

        for ability in abilities.values() {
            let owner = self
                .templates
                .iter()
                .find(|template| template.name == ability.owner)
                .ok_or_else(|| CatalogError::UnknownOwner {
                    ability: ability.name.to_string(),
                    owner: ability.owner.to_string(),
                })?;
            if !owner.abilities.contains(&ability.name) {
                return Err(CatalogError::NotListedByOwner {
                    ability: ability.name.to_string(),
                    owner: owner.name.to_string(),
                });
            }
        }

        debug!(
            abilities = abilities.len(),
            templates = self.templates.len(),
            "ability catalog built"
        );
        Ok(AbilityCatalog {
            abilities,
            templates: self.templates,
        })
    }
}

#[derive(Debug)]
pub struct AbilityCatalog {
    abilities: HashMap<&'static str, AbilityDef>,
    templates: Vec<CreatureTemplate>,
}

impl AbilityCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// 기본 크리처 6종과 어빌리티 18종
    pub fn builtin() -> Result<Self, CatalogError> {
        abilities::register(Self::builder()).build()
    }

    pub fn ability(&self, name: &str) -> Option<&AbilityDef> {
        self.abilities.get(name)
    }

    pub fn template(&self, name: &str) -> Option<&CreatureTemplate> {
        self.templates.iter().find(|template| template.name == name)
    }

    pub fn templates(&self) -> &[CreatureTemplate] {
        &self.templates
    }

    pub fn ability_count(&self) -> usize {
        self.abilities.len()
    }

    /// 어빌리티를 실행한다.
    ///
    /// 대상 검증이 끝나기 전에는 아무것도 바꾸지 않는다.
    /// behavior가 `ability_used`를 남기지 않았다면 기본 문구로 하나 남긴다.
    pub fn resolve(
        &self,
        name: &str,
        world: &mut BattleWorld,
        caster: &EntityId,
        target: Option<&EntityId>,
    ) -> Result<(), ResolveError> {
        let ability = self
            .ability(name)
            .ok_or_else(|| ResolveError::UnknownAbility(name.to_string()))?;
        let targets = select_targets(ability, world, caster, target)?;

        let mut ctx = ResolveContext::new(world, ability, caster.clone(), targets);
        ability.resolve(&mut ctx);
        if !ctx.is_announced() {
            let message = format!("{} uses {}", ctx.caster_name(), ability.name);
            ctx.announce(message);
        }
        Ok(())
    }
}

/// 타겟 규칙에 따라 대상을 검증하고 목록을 만든다.
pub fn select_targets(
    ability: &AbilityDef,
    world: &BattleWorld,
    caster: &EntityId,
    target: Option<&EntityId>,
) -> Result<Vec<EntityId>, ResolveError> {
    if !world.is_alive(caster) {
        return Err(ResolveError::CasterUnavailable(caster.clone()));
    }

    let single = |hostile: bool| -> Result<Vec<EntityId>, ResolveError> {
        let target = target.ok_or(ResolveError::MissingTarget)?;
        let entity = world
            .entity(target)
            .ok_or_else(|| ResolveError::UnknownTarget(target.clone()))?;
        if !entity.is_alive() {
            return Err(ResolveError::TargetDead(target.clone()));
        }
        if world.are_enemies(caster, target) != hostile {
            return Err(ResolveError::InvalidTarget(target.clone()));
        }
        Ok(vec![target.clone()])
    };

    let targets = match ability.targeting {
        Targeting::Enemy => single(true)?,
        Targeting::Ally => single(false)?,
        Targeting::Caster => vec![caster.clone()],
        Targeting::AllEnemies => world.living_enemies(caster),
        Targeting::AllAllies => world.living_allies(caster),
    };

    if targets.is_empty() {
        return Err(ResolveError::NoValidTargets);
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ability::AbilityBehavior, enums::Element, stats::BaseStats};

    struct Noop;

    impl AbilityBehavior for Noop {
        fn resolve(&self, _ctx: &mut ResolveContext<'_>) {}
    }

    fn pebble() -> CreatureTemplate {
        CreatureTemplate::new("Pebble", Element::Earth, BaseStats::with_values(10, 1, 1, 1))
            .with_abilities(&["Roll"])
    }

    #[test]
    fn builtin_catalog_is_consistent() {
        let catalog = AbilityCatalog::builtin().expect("builtin catalog");
        assert_eq!(catalog.templates().len(), 6);
        assert_eq!(catalog.ability_count(), 18);

        for template in catalog.templates() {
            assert_eq!(template.abilities.len(), 3, "{}", template.name);
            for name in &template.abilities {
                let ability = catalog.ability(name).expect("listed ability");
                assert_eq!(ability.owner, template.name);
            }
        }

        let passives: Vec<&str> = catalog
            .templates()
            .iter()
            .flat_map(|template| template.abilities.iter())
            .filter(|name| catalog.ability(name).is_some_and(|def| def.passive))
            .copied()
            .collect();
        assert_eq!(passives, vec!["Thorn Hide", "Undertow"]);
    }

    #[test]
    fn duplicate_ability_is_rejected() {
        let err = AbilityCatalog::builder()
            .template(pebble())
            .ability(AbilityDef::new("Roll", "Pebble", Targeting::Enemy, Noop))
            .ability(AbilityDef::new("Roll", "Pebble", Targeting::Enemy, Noop))
            .build()
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateAbility("Roll".to_string()));
    }

    #[test]
    fn template_with_unregistered_ability_is_rejected() {
        let err = AbilityCatalog::builder().template(pebble()).build().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownAbility { ref ability, .. } if ability == "Roll"));
    }

    #[test]
    fn ability_with_unknown_owner_is_rejected() {
        let err = AbilityCatalog::builder()
            .template(pebble())
            .ability(AbilityDef::new("Roll", "Pebble", Targeting::Enemy, Noop))
            .ability(AbilityDef::new("Quake", "Boulder", Targeting::AllEnemies, Noop))
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownOwner { .. }));
    }
}
