#![allow(dead_code)]

use std::sync::Arc;

use battle_core::game::battle::{
    BattleEngine, CardSpec, DamageRequest, EngineConfig, EntityId, EventKind, StatusEffect,
    StatusKind,
};
use battle_core::game::enums::{Controller, DamageKind};
use battle_core::AbilityCatalog;
use uuid::Uuid;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const TICK_MS: u64 = 100;

pub fn catalog() -> Arc<AbilityCatalog> {
    Arc::new(AbilityCatalog::builtin().expect("builtin catalog"))
}

pub fn battle_id() -> Uuid {
    Uuid::parse_str("5a0c7d1e-3f2b-4c8a-9e61-0b4d2f7a8c13").unwrap()
}

pub fn cards(names: &[&str]) -> Vec<CardSpec> {
    names.iter().map(|name| CardSpec::new(*name)).collect()
}

/// alice 대 bob, 둘 다 사람이 조작. 이미 `Active` 상태로 돌려준다.
pub fn engine_with(config: EngineConfig, alice: &[&str], bob: &[&str]) -> BattleEngine {
    let mut engine = BattleEngine::with_seed(battle_id(), catalog(), config, 7);
    engine
        .add_team(ALICE, Controller::Human, &cards(alice))
        .unwrap();
    engine.add_team(BOB, Controller::Human, &cards(bob)).unwrap();
    engine.start().unwrap();
    engine
}

/// 기본 설정에 이벤트 로그만 넉넉하게
pub fn config() -> EngineConfig {
    EngineConfig {
        event_log_capacity: 4_096,
        ..EngineConfig::default()
    }
}

pub fn battle(alice: &[&str], bob: &[&str]) -> BattleEngine {
    engine_with(config(), alice, bob)
}

pub fn slot(player: &str, index: usize) -> EntityId {
    EntityId::for_slot(player, index)
}

pub fn health(engine: &BattleEngine, id: &EntityId) -> u32 {
    engine.entity(id).expect("entity exists").health()
}

/// 출처 없는 고정 데미지 (수정치 없음)
pub fn wound(engine: &mut BattleEngine, id: &EntityId, amount: u32) -> u32 {
    engine.world_mut().deal_damage(DamageRequest {
        source: None,
        target: id.clone(),
        amount,
        kind: DamageKind::Periodic,
        label: "Test Wound",
    })
}

pub fn poison(value: i32, duration_ms: u64, interval_ms: u64) -> StatusEffect {
    StatusEffect::periodic("Test Poison", StatusKind::Dot, value, duration_ms, interval_ms)
}

pub fn run_for(engine: &mut BattleEngine, total_ms: u64, step_ms: u64) {
    let mut elapsed = 0;
    while elapsed < total_ms {
        engine.update(step_ms);
        elapsed += step_ms;
    }
}

pub fn count_events(engine: &BattleEngine, kind: EventKind, ability: &str) -> usize {
    engine
        .world()
        .events()
        .of_kind(kind)
        .filter(|event| event.ability == Some(ability))
        .count()
}
