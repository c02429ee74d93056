mod common;

use battle_core::game::ability::Targeting;
use battle_core::game::battle::{EffectHook, EventKind, StatusEffect, StatusKind};
use battle_core::game::catalog::ResolveError;

use common::*;

fn damage_amounts(engine: &battle_core::BattleEngine, ability: &str) -> Vec<u32> {
    engine
        .world()
        .events()
        .of_kind(EventKind::Damage)
        .filter(|event| event.ability == Some(ability))
        .filter_map(|event| event.amount)
        .collect()
}

// ============================================================
// Damage abilities
// ============================================================

#[cfg(test)]
mod damage_tests {
    use super::*;

    #[test]
    fn sweep_scales_with_each_living_target_in_team_order() {
        let mut engine = battle(&["Ember Drake"], &["Stone Golem", "Stone Golem", "Stone Golem"]);
        engine
            .attempt_action(&slot(ALICE, 0), "Inferno Sweep", None)
            .unwrap();
        run_for(&mut engine, 1_500, TICK_MS);

        assert_eq!(damage_amounts(&engine, "Inferno Sweep"), vec![28, 33, 39]);
        assert_eq!(health(&engine, &slot(BOB, 0)), 112);
        assert_eq!(health(&engine, &slot(BOB, 1)), 107);
        assert_eq!(health(&engine, &slot(BOB, 2)), 101);
    }

    #[test]
    fn sweep_skips_fallen_targets_when_scaling() {
        let mut engine = battle(&["Ember Drake"], &["Stone Golem", "Stone Golem", "Stone Golem"]);
        wound(&mut engine, &slot(BOB, 1), 140);
        engine
            .attempt_action(&slot(ALICE, 0), "Inferno Sweep", None)
            .unwrap();
        run_for(&mut engine, 1_500, TICK_MS);

        assert_eq!(damage_amounts(&engine, "Inferno Sweep"), vec![28, 33]);
        assert_eq!(health(&engine, &slot(BOB, 2)), 107);
    }

    #[test]
    fn leech_heals_for_damage_actually_dealt() {
        let mut engine = battle(&["Gloom Bat"], &["Tide Oracle", "Stone Golem"]);
        let bat = slot(ALICE, 0);
        let oracle = slot(BOB, 0);
        wound(&mut engine, &bat, 30);
        wound(&mut engine, &oracle, 95);

        engine.attempt_action(&bat, "Blood Drain", Some(&oracle)).unwrap();

        assert_eq!(damage_amounts(&engine, "Blood Drain"), vec![5]);
        assert_eq!(health(&engine, &bat), 55);
        assert!(!engine.entity(&oracle).unwrap().is_alive());
    }

    #[test]
    fn blinded_attacker_misses_but_still_pays_cooldown() {
        let mut engine = battle(&["Ember Drake"], &["Stone Golem"]);
        let drake = slot(ALICE, 0);
        engine.world_mut().apply_status(
            &drake,
            StatusEffect::modifier(
                "Disoriented",
                StatusKind::Debuff,
                4_000,
                EffectHook::ReducedAccuracy { miss_chance: 100 },
            ),
        );

        engine
            .attempt_action(&drake, "Flame Bite", Some(&slot(BOB, 0)))
            .unwrap();

        assert_eq!(health(&engine, &slot(BOB, 0)), 140);
        assert_eq!(count_events(&engine, EventKind::System, "Flame Bite"), 1);
        assert_eq!(engine.entity(&drake).unwrap().cooldown("Flame Bite"), 3_000);
    }

    #[test]
    fn screech_disorients_its_target() {
        let mut engine = battle(&["Gloom Bat"], &["Stone Golem"]);
        let golem = slot(BOB, 0);
        engine
            .attempt_action(&slot(ALICE, 0), "Sonic Screech", Some(&golem))
            .unwrap();

        assert_eq!(health(&engine, &golem), 132);
        let debuff = engine
            .entity(&golem)
            .unwrap()
            .effects_named("Disoriented")
            .next()
            .cloned()
            .expect("disoriented");
        assert_eq!(debuff.kind, StatusKind::Debuff);
        assert_eq!(debuff.hooks, vec![EffectHook::ReducedAccuracy { miss_chance: 40 }]);
    }
}

// ============================================================
// Reactive effects
// ============================================================

#[cfg(test)]
mod reactive_tests {
    use super::*;

    fn barbs() -> StatusEffect {
        StatusEffect::permanent(
            "Barbs",
            EffectHook::PoisonAttackers {
                poison: "Thorn Venom",
                chance: 100,
                damage: 4,
                duration_ms: 2_000,
                tick_interval_ms: 1_000,
            },
        )
    }

    #[test]
    fn thornback_starts_with_its_passive() {
        let engine = battle(&["Venom Thornback"], &["Stone Golem"]);
        let hide = engine
            .entity(&slot(ALICE, 0))
            .unwrap()
            .effects_named("Thorn Hide")
            .next()
            .cloned()
            .expect("thorn hide");

        assert!(hide.is_permanent());
        assert!(matches!(
            hide.hooks.as_slice(),
            [EffectHook::PoisonAttackers { chance: 35, .. }]
        ));
    }

    #[test]
    fn attacking_a_thorned_target_poisons_the_attacker() {
        let mut engine = battle(&["Ember Drake"], &["Stone Golem"]);
        let drake = slot(ALICE, 0);
        let golem = slot(BOB, 0);
        engine.world_mut().apply_status(&golem, barbs());

        engine.attempt_action(&drake, "Flame Bite", Some(&golem)).unwrap();
        let venom = engine
            .entity(&drake)
            .unwrap()
            .effects_named("Thorn Venom")
            .next()
            .cloned()
            .expect("attacker poisoned");
        assert_eq!(venom.source, Some(golem.clone()));

        run_for(&mut engine, 2_000, TICK_MS);
        assert_eq!(health(&engine, &drake), 110 - 8);
    }

    #[test]
    fn spells_do_not_trigger_thorns() {
        let mut engine = battle(&["Ember Drake"], &["Stone Golem"]);
        let drake = slot(ALICE, 0);
        engine.world_mut().apply_status(&slot(BOB, 0), barbs());

        engine.attempt_action(&drake, "Inferno Sweep", None).unwrap();
        run_for(&mut engine, 1_500, TICK_MS);

        assert_eq!(damage_amounts(&engine, "Inferno Sweep"), vec![28]);
        assert_eq!(engine.entity(&drake).unwrap().effects_named("Thorn Venom").count(), 0);
    }

    #[test]
    fn undertow_redirects_part_of_healing_to_an_enemy() {
        let mut engine = battle(&["Ember Drake"], &["Tide Oracle", "Stone Golem"]);
        let golem = slot(BOB, 1);
        wound(&mut engine, &golem, 50);

        engine
            .attempt_action(&slot(BOB, 0), "Tidal Mend", Some(&golem))
            .unwrap();
        run_for(&mut engine, 1_000, TICK_MS);

        assert_eq!(health(&engine, &golem), 90 + 19);
        assert_eq!(health(&engine, &slot(ALICE, 0)), 110 - 6);
        assert_eq!(damage_amounts(&engine, "Redirected Healing"), vec![6]);
    }

    #[test]
    fn parasite_heals_its_owner_when_host_dies() {
        let mut engine = battle(&["Sporeling"], &["Gloom Bat", "Stone Golem"]);
        let sporeling = slot(ALICE, 0);
        let bat = slot(BOB, 0);
        wound(&mut engine, &sporeling, 40);

        engine
            .attempt_action(&sporeling, "Parasitic Spore", Some(&bat))
            .unwrap();
        run_for(&mut engine, 1_000, TICK_MS);
        wound(&mut engine, &bat, 80);

        assert_eq!(health(&engine, &sporeling), 50 + 30);
        let heals: Vec<_> = engine
            .world()
            .events()
            .of_kind(EventKind::Heal)
            .filter(|event| event.ability == Some("Parasitic Spore"))
            .filter_map(|event| event.amount)
            .collect();
        assert_eq!(heals, vec![30]);

        wound(&mut engine, &bat, 80);
        assert_eq!(health(&engine, &sporeling), 80);
    }

    #[test]
    fn undertow_does_not_redirect_healing_that_cannot_land() {
        let mut engine = battle(&["Ember Drake"], &["Tide Oracle", "Stone Golem"]);
        let golem = slot(BOB, 1);

        engine
            .attempt_action(&slot(BOB, 0), "Tidal Mend", Some(&golem))
            .unwrap();
        run_for(&mut engine, 1_000, TICK_MS);

        assert_eq!(health(&engine, &golem), 140);
        assert_eq!(health(&engine, &slot(ALICE, 0)), 110);
        assert!(damage_amounts(&engine, "Redirected Healing").is_empty());
    }

    #[test]
    fn undertow_redirect_is_capped_by_missing_health() {
        let mut engine = battle(&["Ember Drake"], &["Tide Oracle", "Stone Golem"]);
        let golem = slot(BOB, 1);
        wound(&mut engine, &golem, 8);

        engine
            .attempt_action(&slot(BOB, 0), "Tidal Mend", Some(&golem))
            .unwrap();
        run_for(&mut engine, 1_000, TICK_MS);

        // 채울 수 있는 8 중 25% (2) 만 적에게 간다
        assert_eq!(health(&engine, &golem), 132 + 6);
        assert_eq!(damage_amounts(&engine, "Redirected Healing"), vec![2]);
    }

    #[test]
    fn bloom_expiring_with_the_spore_still_grants_its_bonus() {
        let mut engine = battle(&["Sporeling"], &["Sporeling", "Stone Golem"]);
        let golem = slot(BOB, 1);
        wound(&mut engine, &golem, 60);

        // 포자는 t=1000 에 붙어 8초, 꽃은 t=4000 에 붙어 5초: 둘 다 t=9000 에 만료
        engine
            .attempt_action(&slot(ALICE, 0), "Parasitic Spore", Some(&golem))
            .unwrap();
        run_for(&mut engine, 4_000, TICK_MS);
        engine
            .attempt_action(&slot(BOB, 0), "Spore Bloom", Some(&golem))
            .unwrap();
        run_for(&mut engine, 5_000, TICK_MS);

        let blooms: Vec<_> = engine
            .world()
            .events()
            .of_kind(EventKind::Heal)
            .filter(|event| event.ability == Some("Spore Bloom"))
            .filter_map(|event| event.amount)
            .collect();
        assert_eq!(blooms, vec![6, 6, 6, 6, 6, 15]);

        let host = engine.entity(&golem).unwrap();
        assert_eq!(host.effects_named("Parasitic Spore").count(), 0);
        assert_eq!(host.effects_named("Spore Bloom").count(), 0);
    }
}

// ============================================================
// Catalog resolution contract
// ============================================================

#[cfg(test)]
mod resolve_tests {
    use super::*;

    #[test]
    fn failed_resolution_leaves_state_untouched() {
        let catalog = catalog();
        let mut engine = battle(&["Ember Drake"], &["Tide Oracle", "Stone Golem"]);
        let drake = slot(ALICE, 0);
        let oracle = slot(BOB, 0);
        wound(&mut engine, &oracle, 100);

        let before = engine.snapshot();
        let emitted = engine.world().events().total_emitted();

        assert_eq!(
            catalog.resolve("Flame Bite", engine.world_mut(), &drake, Some(&oracle)),
            Err(ResolveError::TargetDead(oracle.clone()))
        );
        assert_eq!(
            catalog.resolve("Flame Bite", engine.world_mut(), &drake, None),
            Err(ResolveError::MissingTarget)
        );
        assert_eq!(
            catalog.resolve("Meteor", engine.world_mut(), &drake, None),
            Err(ResolveError::UnknownAbility("Meteor".to_string()))
        );
        assert_eq!(
            catalog.resolve("Flame Bite", engine.world_mut(), &oracle, Some(&drake)),
            Err(ResolveError::CasterUnavailable(oracle.clone()))
        );

        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.world().events().total_emitted(), emitted);
    }

    #[test]
    fn every_ability_announces_exactly_once() {
        let catalog = catalog();
        for template in catalog.templates() {
            for name in &template.abilities {
                let ability = catalog.ability(name).unwrap();
                let mut engine = battle(&[template.name], &["Stone Golem", "Stone Golem"]);
                let caster = slot(ALICE, 0);
                let target = match ability.targeting {
                    Targeting::Enemy => Some(slot(BOB, 0)),
                    Targeting::Ally => Some(caster.clone()),
                    _ => None,
                };
                let before = engine.world().events().of_kind(EventKind::AbilityUsed).count();

                catalog
                    .resolve(name, engine.world_mut(), &caster, target.as_ref())
                    .unwrap();

                let after = engine.world().events().of_kind(EventKind::AbilityUsed).count();
                assert_eq!(after - before, 1, "{name}");
            }
        }
    }
}
