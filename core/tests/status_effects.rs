mod common;

use battle_core::game::battle::{EffectHook, EventKind, StatusEffect, StatusKind};

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
// Periodic effects
// ============================================================

#[cfg(test)]
mod periodic_tests {
    use super::*;

    #[test]
    fn dot_pulses_exactly_duration_over_interval_times() {
        let mut engine = battle(&["Stone Golem"], &["Tide Oracle"]);
        let golem = slot(ALICE, 0);
        engine.world_mut().apply_status(
            &golem,
            StatusEffect::periodic("Poison", StatusKind::Dot, 8, 4_000, 1_000),
        );

        run_for(&mut engine, 5_000, TICK_MS);
        assert_eq!(health(&engine, &golem), 140 - 32);
        assert_eq!(damage_amounts(&engine, "Poison"), vec![8, 8, 8, 8]);
        assert_eq!(engine.entity(&golem).unwrap().effects_named("Poison").count(), 0);

        run_for(&mut engine, 5_000, TICK_MS);
        assert_eq!(health(&engine, &golem), 140 - 32);
        assert_eq!(engine.world().events().of_kind(EventKind::StatusExpired).count(), 1);
    }

    #[test]
    fn pulse_count_does_not_depend_on_tick_size() {
        let mut totals = Vec::new();
        for step in [100, 300, 1_000] {
            let mut engine = battle(&["Stone Golem"], &["Tide Oracle"]);
            let golem = slot(ALICE, 0);
            engine.world_mut().apply_status(&golem, poison(3, 3_500, 500));
            run_for(&mut engine, 6_000, step);
            totals.push((health(&engine, &golem), damage_amounts(&engine, "Test Poison").len()));
        }

        assert_eq!(totals, vec![(140 - 21, 7); 3]);
    }

    #[test]
    fn same_named_effects_stack_independently() {
        let mut engine = battle(&["Stone Golem"], &["Tide Oracle"]);
        let golem = slot(ALICE, 0);
        engine.world_mut().apply_status(&golem, poison(8, 4_000, 1_000));
        run_for(&mut engine, 2_000, TICK_MS);
        engine.world_mut().apply_status(&golem, poison(8, 4_000, 1_000));

        assert_eq!(engine.entity(&golem).unwrap().effects_named("Test Poison").count(), 2);
        run_for(&mut engine, 2_000, TICK_MS);
        assert_eq!(health(&engine, &golem), 140 - 4 * 8 - 2 * 8);
        assert_eq!(engine.entity(&golem).unwrap().effects_named("Test Poison").count(), 1);

        run_for(&mut engine, 3_000, TICK_MS);
        assert_eq!(health(&engine, &golem), 140 - 8 * 8);
    }

    #[test]
    fn holder_death_stops_remaining_pulses() {
        let mut engine = battle(&["Gloom Bat", "Stone Golem"], &["Tide Oracle"]);
        let bat = slot(ALICE, 0);
        wound(&mut engine, &bat, 70);
        engine.world_mut().apply_status(&bat, poison(6, 1_000, 250));
        engine.world_mut().apply_status(&bat, poison(6, 1_000, 250));

        engine.update(1_000);

        let bat = engine.entity(&bat).unwrap();
        assert!(!bat.is_alive());
        assert!(bat.effects().is_empty());
        assert_eq!(damage_amounts(&engine, "Test Poison"), vec![6, 4]);
        assert_eq!(engine.world().events().of_kind(EventKind::Death).count(), 1);
    }
}

// ============================================================
// Modifiers and passives
// ============================================================

#[cfg(test)]
mod modifier_tests {
    use super::*;

    #[test]
    fn damage_buff_applies_until_it_expires() {
        let mut engine = battle(&["Ember Drake"], &["Stone Golem"]);
        let drake = slot(ALICE, 0);
        let golem = slot(BOB, 0);

        engine.attempt_action(&drake, "Kindle", None).unwrap();
        engine.attempt_action(&drake, "Flame Bite", Some(&golem)).unwrap();
        run_for(&mut engine, 6_000, TICK_MS);

        assert_eq!(engine.entity(&drake).unwrap().effects_named("Kindled").count(), 0);
        engine.attempt_action(&drake, "Flame Bite", Some(&golem)).unwrap();
        assert_eq!(damage_amounts(&engine, "Flame Bite"), vec![25, 20]);
    }

    #[test]
    fn damage_reduction_and_vulnerability_combine() {
        let mut engine = battle(&["Ember Drake"], &["Stone Golem"]);
        let golem = slot(BOB, 0);
        engine.attempt_action(&golem, "Granite Skin", None).unwrap();
        engine.world_mut().apply_status(
            &golem,
            StatusEffect::modifier(
                "Cracked Armor",
                StatusKind::Debuff,
                5_000,
                EffectHook::IncomingDamage { percent: 20 },
            ),
        );

        engine
            .attempt_action(&slot(ALICE, 0), "Flame Bite", Some(&golem))
            .unwrap();

        // 20 * (100 - 40 + 20) / 100
        assert_eq!(damage_amounts(&engine, "Flame Bite"), vec![16]);
    }

    #[test]
    fn permanent_passive_persists_and_refreshes_instead_of_stacking() {
        let mut engine = battle(&["Venom Thornback"], &["Stone Golem"]);
        let thornback = slot(ALICE, 0);
        assert_eq!(count_events(&engine, EventKind::AbilityUsed, "Thorn Hide"), 1);

        run_for(&mut engine, 60_000, 1_000);
        let hide: Vec<_> = engine
            .entity(&thornback)
            .unwrap()
            .effects_named("Thorn Hide")
            .cloned()
            .collect();
        assert_eq!(hide.len(), 1);
        assert!(hide[0].is_permanent());

        engine.world_mut().apply_status(&thornback, hide[0].clone());
        assert_eq!(
            engine
                .entity(&thornback)
                .unwrap()
                .effects_named("Thorn Hide")
                .count(),
            1
        );
    }

    #[test]
    fn bloom_heals_extra_on_expiry_while_parasitized() {
        let mut engine = battle(&["Sporeling"], &["Sporeling"]);
        let ours = slot(ALICE, 0);
        let theirs = slot(BOB, 0);
        wound(&mut engine, &theirs, 60);

        engine
            .attempt_action(&ours, "Parasitic Spore", Some(&theirs))
            .unwrap();
        run_for(&mut engine, 1_000, TICK_MS);
        assert_eq!(engine.entity(&theirs).unwrap().effects_named("Parasitic Spore").count(), 1);

        engine
            .attempt_action(&theirs, "Spore Bloom", Some(&theirs))
            .unwrap();
        run_for(&mut engine, 5_000, TICK_MS);

        let heals: Vec<u32> = engine
            .world()
            .events()
            .of_kind(EventKind::Heal)
            .filter(|event| event.ability == Some("Spore Bloom"))
            .filter_map(|event| event.amount)
            .collect();
        assert_eq!(heals, vec![6, 6, 6, 6, 6, 15]);
    }

    #[test]
    fn bloom_without_parasite_gives_only_pulses() {
        let mut engine = battle(&["Sporeling"], &["Stone Golem"]);
        let sporeling = slot(ALICE, 0);
        wound(&mut engine, &sporeling, 60);

        engine
            .attempt_action(&sporeling, "Spore Bloom", Some(&sporeling))
            .unwrap();
        run_for(&mut engine, 6_000, TICK_MS);

        assert_eq!(health(&engine, &sporeling), 30 + 5 * 6);
    }
}
