use std::collections::HashSet;

use thiserror::Error;

use super::{
    entity::{EntityId, TeamId},
    world::BattleWorld,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("entity {entity} has health {health} outside [0, {max}]")]
    HealthOutOfRange { entity: EntityId, health: u32, max: u32 },
    #[error("dead entity {0} still has a cast")]
    DeadCaster(EntityId),
    #[error("dead entity {0} still carries status effects")]
    DeadWithEffects(EntityId),
    #[error("entity {0} keeps a zero cooldown entry")]
    StaleCooldown(EntityId),
    #[error("cast of entity {0} has elapsed past its total")]
    CastOverrun(EntityId),
    #[error("entity {0} belongs to no team or more than one")]
    TeamMembership(EntityId),
    #[error("team {team} lists unknown or foreign entity {entity}")]
    ForeignMember { team: TeamId, entity: EntityId },
}

/// 세션 전체의 불변식을 검사한다. 디버그 빌드에서는 매 update 뒤에 실행된다.
pub fn check_invariants(world: &BattleWorld) -> Result<(), InvariantViolation> {
    let mut seen = HashSet::new();
    for team in world.teams() {
        for id in &team.entities {
            let entity = world
                .entity(id)
                .filter(|entity| entity.team() == team.id)
                .ok_or_else(|| InvariantViolation::ForeignMember {
                    team: team.id,
                    entity: id.clone(),
                })?;
            if !seen.insert(id) {
                return Err(InvariantViolation::TeamMembership(id.clone()));
            }

            if entity.health() > entity.max_health() {
                return Err(InvariantViolation::HealthOutOfRange {
                    entity: id.clone(),
                    health: entity.health(),
                    max: entity.max_health(),
                });
            }
            if !entity.is_alive() {
                if entity.cast().is_some() {
                    return Err(InvariantViolation::DeadCaster(id.clone()));
                }
                if !entity.effects().is_empty() {
                    return Err(InvariantViolation::DeadWithEffects(id.clone()));
                }
            }
            if entity.cooldowns().values().any(|remaining| *remaining == 0) {
                return Err(InvariantViolation::StaleCooldown(id.clone()));
            }
            if entity
                .cast()
                .is_some_and(|cast| cast.elapsed_ms > cast.total_ms)
            {
                return Err(InvariantViolation::CastOverrun(id.clone()));
            }
        }
    }

    if let Some(orphan) = world.entities.keys().find(|id| !seen.contains(id)) {
        return Err(InvariantViolation::TeamMembership(orphan.clone()));
    }
    Ok(())
}
