use rand::{seq::SliceRandom, Rng};

use battle_core::{
    game::{ability::Targeting, battle::PlayerId, determinism::BattleRng},
    AbilityCatalog, BattleEngine, CardSpec, PlayerAction, SessionState,
};

/// AI 진영의 단순한 의사결정 루프.
///
/// 틱마다 유휴 상태인 자기 엔티티 각각에 대해 확률적으로 쿨다운이 끝난 어빌리티와
/// 살아있는 대상을 골라, 사람과 똑같은 `submit` 경로로 제출할 행동을 만든다.
pub struct AiDriver {
    player_id: PlayerId,
    action_chance: u8,
    rng: BattleRng,
}

impl AiDriver {
    pub fn new(player_id: impl Into<PlayerId>, action_chance: u8, seed: u64) -> Self {
        Self {
            player_id: player_id.into(),
            action_chance,
            rng: BattleRng::from_seed(seed),
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn decide(&mut self, engine: &BattleEngine) -> Vec<PlayerAction> {
        if engine.state() != SessionState::Active {
            return Vec::new();
        }

        let world = engine.world();
        let catalog = engine.catalog();
        let mut actions = Vec::new();

        for entity in world.entities() {
            if entity.owner() != self.player_id || !entity.is_alive() || entity.cast().is_some() {
                continue;
            }
            if !self.rng.roll_percent(self.action_chance) {
                continue;
            }

            let enemies = world.living_enemies(entity.id());
            let allies = world.living_allies(entity.id());
            let ready: Vec<&'static str> = entity
                .abilities()
                .iter()
                .copied()
                .filter(|name| entity.cooldown(name) == 0)
                .filter(|name| {
                    catalog.ability(name).is_some_and(|def| {
                        !def.passive
                            && match def.targeting {
                                Targeting::Enemy | Targeting::AllEnemies => !enemies.is_empty(),
                                Targeting::Ally | Targeting::AllAllies | Targeting::Caster => true,
                            }
                    })
                })
                .collect();

            let Some(&ability) = self.rng.pick(&ready) else {
                continue;
            };
            let target_id = match catalog.ability(ability).map(|def| def.targeting) {
                Some(Targeting::Enemy) => self.rng.pick(&enemies).cloned(),
                Some(Targeting::Ally) => self.rng.pick(&allies).cloned(),
                _ => None,
            };

            actions.push(PlayerAction::CastAbility {
                entity_id: entity.id().clone(),
                ability_name: ability.to_string(),
                target_id,
            });
        }

        actions
    }
}

/// PVE 상대 로스터. 서로 다른 템플릿을 무작위로 고른다.
pub fn opponent_roster<R: Rng + ?Sized>(
    catalog: &AbilityCatalog,
    size: usize,
    rng: &mut R,
) -> Vec<CardSpec> {
    let size = size.clamp(1, catalog.templates().len().max(1));
    catalog
        .templates()
        .choose_multiple(rng, size)
        .map(|template| CardSpec::new(template.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::game::enums::Controller;
    use rand::{rngs::StdRng, SeedableRng};
    use std::{collections::HashSet, sync::Arc};
    use uuid::Uuid;

    fn pve_engine() -> BattleEngine {
        let catalog = Arc::new(AbilityCatalog::builtin().unwrap());
        let mut engine =
            BattleEngine::with_seed(Uuid::nil(), catalog, Default::default(), 11);
        engine
            .add_team(
                "alice",
                Controller::Human,
                &[CardSpec::new("Ember Drake"), CardSpec::new("Tide Oracle")],
            )
            .unwrap();
        engine
            .add_team(
                "ai",
                Controller::Ai,
                &[CardSpec::new("Gloom Bat"), CardSpec::new("Stone Golem")],
            )
            .unwrap();
        engine.start().unwrap();
        engine
    }

    #[test]
    fn certain_ai_acts_with_every_idle_entity() {
        let mut engine = pve_engine();
        let mut ai = AiDriver::new("ai", 100, 3);

        let actions = ai.decide(&engine);
        assert_eq!(actions.len(), 2);
        for action in actions {
            assert_eq!(engine.entity(action.entity_id()).unwrap().owner(), "ai");
            assert!(engine.submit("ai", action).is_ok());
        }

        // 시전 중이거나 쿨다운이 남은 엔티티는 다시 고르지 않는다
        for action in ai.decide(&engine) {
            let entity = engine.entity(action.entity_id()).unwrap();
            assert!(entity.cast().is_none());
            if let PlayerAction::CastAbility { ability_name, .. } = &action {
                assert_eq!(entity.cooldown(ability_name), 0);
            }
        }
    }

    #[test]
    fn idle_ai_never_acts() {
        let engine = pve_engine();
        let mut ai = AiDriver::new("ai", 0, 3);
        assert!(ai.decide(&engine).is_empty());
    }

    #[test]
    fn ai_targets_live_enemies_only() {
        let mut engine = pve_engine();
        let mut ai = AiDriver::new("ai", 100, 9);
        for _ in 0..50 {
            let actions = ai.decide(&engine);
            for action in &actions {
                if let PlayerAction::CastAbility {
                    target_id: Some(target),
                    ..
                } = action
                {
                    assert!(engine.entity(target).is_some_and(|entity| entity.is_alive()));
                }
            }
            for action in actions {
                let _ = engine.submit("ai", action);
            }
            engine.update(100);
        }
    }

    #[test]
    fn opponent_roster_uses_distinct_templates() {
        let catalog = AbilityCatalog::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let roster = opponent_roster(&catalog, 3, &mut rng);
        assert_eq!(roster.len(), 3);
        let names: HashSet<_> = roster.iter().map(|card| card.card_name.clone()).collect();
        assert_eq!(names.len(), 3);

        assert_eq!(opponent_roster(&catalog, 0, &mut rng).len(), 1);
        assert_eq!(opponent_roster(&catalog, 40, &mut rng).len(), 6);
    }
}
