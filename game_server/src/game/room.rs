//! 전투 한 판의 조정 로직. 전송 계층과 무관하게 동기적으로 동작한다.
//!
//! 세션에서 온 행동은 도착 순서대로 `inbound` 에 쌓이고, 틱마다 한 번에 비워진다.
//! 그 다음 AI 행동, `update`, 스냅샷 브로드캐스트 순으로 진행한다.

use std::{collections::VecDeque, sync::Arc};

use tracing::{debug, info, warn};
use uuid::Uuid;

use battle_core::{
    game::{battle::PlayerId, determinism::seed_for_battle, enums::Controller},
    AbilityCatalog, BattleEngine, BattleOutcome, CardSpec, PlayerAction, SessionState, TeamId,
};

use crate::{
    env::BattleSettings,
    errors::CoordinatorError,
    game::ai::AiDriver,
    shared::protocol::{ActionEcho, ActionPayload, ServerMessage},
};

// AI 난수 흐름을 전투 난수와 분리하기 위한 값
const AI_SEED_SALT: u64 = 0xA1_5EED;

#[derive(Debug, Clone)]
pub struct Participant {
    pub player_id: PlayerId,
    pub controller: Controller,
    pub cards: Vec<CardSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Audience {
    Player(PlayerId),
    /// 접속 중인 모든 사람 플레이어
    Everyone,
}

#[derive(Debug, Clone)]
pub struct Outbound {
    pub to: Audience,
    pub message: ServerMessage,
}

impl Outbound {
    fn to_player(player: &str, message: ServerMessage) -> Self {
        Self {
            to: Audience::Player(player.to_string()),
            message,
        }
    }

    fn broadcast(message: ServerMessage) -> Self {
        Self {
            to: Audience::Everyone,
            message,
        }
    }
}

#[derive(Debug, Default)]
pub struct TickOutput {
    pub outbound: Vec<Outbound>,
    /// 이번 틱에 전투가 끝났을 때만 채워진다
    pub finished: Option<BattleOutcome>,
}

#[derive(Debug)]
struct Seat {
    player_id: PlayerId,
    team: TeamId,
    connected: bool,
    /// 연결이 끊긴 시점 (방 시계 기준)
    disconnected_at: Option<u64>,
    forfeited: bool,
}

pub struct BattleRoom {
    engine: BattleEngine,
    seats: Vec<Seat>,
    inbound: VecDeque<(PlayerId, PlayerAction)>,
    ai: Vec<AiDriver>,
    /// 전투 종료 후에도 계속 흐르는 방 시계
    clock_ms: u64,
    ended_at: Option<u64>,
    grace_ms: u64,
    linger_ms: u64,
}

impl BattleRoom {
    /// 참가자마다 팀을 만들고 전투를 시작한다.
    pub fn create(
        battle_id: Uuid,
        catalog: Arc<AbilityCatalog>,
        settings: &BattleSettings,
        participants: &[Participant],
    ) -> Result<Self, CoordinatorError> {
        let mut engine = BattleEngine::new(battle_id, catalog, settings.engine_config());
        let mut seats = Vec::new();
        let mut ai = Vec::new();
        let ai_seed = seed_for_battle(battle_id) ^ AI_SEED_SALT;

        for participant in participants {
            let team = engine.add_team(
                participant.player_id.clone(),
                participant.controller,
                &participant.cards,
            )?;
            match participant.controller {
                Controller::Human => seats.push(Seat {
                    player_id: participant.player_id.clone(),
                    team,
                    connected: true,
                    disconnected_at: None,
                    forfeited: false,
                }),
                Controller::Ai => ai.push(AiDriver::new(
                    participant.player_id.clone(),
                    settings.ai_action_chance,
                    ai_seed.wrapping_add(u64::from(team.0)),
                )),
            }
        }
        engine.start()?;

        info!(%battle_id, humans = seats.len(), ai = ai.len(), "battle room created");
        Ok(Self {
            engine,
            seats,
            inbound: VecDeque::new(),
            ai,
            clock_ms: 0,
            ended_at: None,
            grace_ms: settings.grace_ms(),
            linger_ms: settings.linger_ms(),
        })
    }

    pub fn battle_id(&self) -> Uuid {
        self.engine.id()
    }

    pub fn engine(&self) -> &BattleEngine {
        &self.engine
    }

    /// 사람 참가자 목록
    pub fn players(&self) -> Vec<PlayerId> {
        self.seats.iter().map(|seat| seat.player_id.clone()).collect()
    }

    pub fn is_seated(&self, player: &str) -> bool {
        self.seat(player).is_some()
    }

    pub fn is_connected(&self, player: &str) -> bool {
        self.seat(player).is_some_and(|seat| seat.connected)
    }

    /// 시작 직후 각 플레이어에게 보내는 `BATTLE_STARTED`
    pub fn opening(&self) -> Vec<Outbound> {
        let snapshot = self.engine.snapshot();
        self.seats
            .iter()
            .map(|seat| {
                Outbound::to_player(
                    &seat.player_id,
                    ServerMessage::BattleStarted {
                        battle_id: self.battle_id(),
                        initial_state: snapshot.clone(),
                    },
                )
            })
            .collect()
    }

    /// 도착 순서대로 쌓는다. 검증은 적용 시점의 상태로 다음 틱에 한다.
    pub fn enqueue(&mut self, player: impl Into<PlayerId>, action: PlayerAction) {
        self.inbound.push_back((player.into(), action));
    }

    pub fn pending_actions(&self) -> usize {
        self.inbound.len()
    }

    pub fn detach(&mut self, player: &str) {
        let now = self.clock_ms;
        if let Some(seat) = self.seat_mut(player) {
            if seat.connected {
                seat.connected = false;
                seat.disconnected_at = Some(now);
                warn!(player_id = %player, at_ms = now, "player disconnected from battle");
            }
        }
    }

    /// 재접속. 현재 스냅샷으로 `BATTLE_STARTED` 를 다시 보낸다.
    pub fn reattach(&mut self, player: &str) -> Vec<Outbound> {
        let Some(seat) = self.seat_mut(player) else {
            return Vec::new();
        };
        seat.connected = true;
        seat.disconnected_at = None;
        info!(player_id = %player, "player reattached to battle");

        vec![Outbound::to_player(
            player,
            ServerMessage::BattleStarted {
                battle_id: self.battle_id(),
                initial_state: self.engine.snapshot(),
            },
        )]
    }

    pub fn tick(&mut self, delta_ms: u64) -> TickOutput {
        self.clock_ms += delta_ms;
        let mut output = TickOutput::default();
        let was_ended = self.engine.state() == SessionState::Ended;

        self.expire_grace_periods();

        while let Some((player, action)) = self.inbound.pop_front() {
            let echo = ActionPayload::from_action(&action);
            match self.engine.submit(&player, action) {
                Ok(_) => output.outbound.push(Outbound::broadcast(ServerMessage::PlayerAction(
                    ActionEcho {
                        player_id: player.clone(),
                        action: echo,
                    },
                ))),
                Err(rejection) => {
                    metrics::ACTIONS_REJECTED_TOTAL
                        .with_label_values(&[rejection.code()])
                        .inc();
                    output.outbound.push(Outbound::to_player(
                        &player,
                        ServerMessage::rejected(rejection.code(), &rejection),
                    ));
                }
            }
        }

        for driver in &mut self.ai {
            for action in driver.decide(&self.engine) {
                if let Err(rejection) = self.engine.submit(driver.player_id(), action) {
                    debug!(player_id = driver.player_id(), reason = rejection.code(), "ai action rejected");
                }
            }
        }

        self.engine.update(delta_ms);

        if !was_ended {
            let events = self.engine.drain_events();
            output.outbound.push(Outbound::broadcast(ServerMessage::BattleStateUpdate {
                battle_id: self.battle_id(),
                state: self.engine.snapshot(),
                events,
            }));

            if let Some(outcome) = self.engine.outcome().cloned() {
                self.ended_at = Some(self.clock_ms);
                output
                    .outbound
                    .push(Outbound::broadcast(ServerMessage::BattleEnded(outcome.clone())));
                output.finished = Some(outcome);
            }
        }

        output
    }

    /// 종료 후 모든 사람이 나갔거나 유지 시간이 지나면 true
    pub fn should_close(&self) -> bool {
        match self.ended_at {
            Some(ended_at) => {
                self.seats.iter().all(|seat| !seat.connected)
                    || self.clock_ms.saturating_sub(ended_at) >= self.linger_ms
            }
            None => false,
        }
    }

    fn expire_grace_periods(&mut self) {
        if self.engine.state() != SessionState::Active {
            return;
        }
        let now = self.clock_ms;
        let grace_ms = self.grace_ms;
        let expired: Vec<TeamId> = self
            .seats
            .iter_mut()
            .filter(|seat| !seat.forfeited)
            .filter(|seat| {
                seat.disconnected_at
                    .is_some_and(|at| now.saturating_sub(at) >= grace_ms)
            })
            .map(|seat| {
                seat.forfeited = true;
                warn!(player_id = %seat.player_id, "disconnect grace period elapsed, forfeiting");
                seat.team
            })
            .collect();

        for team in expired {
            self.engine.forfeit(team);
        }
    }

    fn seat(&self, player: &str) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.player_id == player)
    }

    fn seat_mut(&mut self, player: &str) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|seat| seat.player_id == player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{game::battle::EndReason, BattleSnapshot, EntityId};

    const TICK: u64 = 100;

    fn settings() -> BattleSettings {
        BattleSettings {
            disconnect_grace_seconds: 2,
            linger_seconds: 1,
            ai_action_chance: 100,
            ..BattleSettings::default()
        }
    }

    fn human(player: &str, cards: &[&str]) -> Participant {
        Participant {
            player_id: player.to_string(),
            controller: Controller::Human,
            cards: cards.iter().map(|card| CardSpec::new(*card)).collect(),
        }
    }

    fn pvp_room() -> BattleRoom {
        let catalog = Arc::new(AbilityCatalog::builtin().unwrap());
        BattleRoom::create(
            Uuid::new_v4(),
            catalog,
            &settings(),
            &[
                human("alice", &["Ember Drake", "Tide Oracle"]),
                human("bob", &["Stone Golem"]),
            ],
        )
        .unwrap()
    }

    fn rejections_for<'a>(output: &'a TickOutput, player: &str) -> Vec<&'a str> {
        output
            .outbound
            .iter()
            .filter(|out| out.to == Audience::Player(player.to_string()))
            .filter_map(|out| match &out.message {
                ServerMessage::ActionRejected { reason, .. } => Some(reason.as_str()),
                _ => None,
            })
            .collect()
    }

    fn entities(snapshot: &BattleSnapshot) -> String {
        serde_json::to_string(&snapshot.entities).unwrap()
    }

    fn cast(entity: &str, ability: &str, target: Option<&str>) -> PlayerAction {
        PlayerAction::CastAbility {
            entity_id: EntityId::new(entity),
            ability_name: ability.to_string(),
            target_id: target.map(EntityId::new),
        }
    }

    #[test]
    fn opening_greets_every_human() {
        let room = pvp_room();
        let opening = room.opening();
        assert_eq!(opening.len(), 2);
        assert!(opening
            .iter()
            .all(|out| matches!(out.message, ServerMessage::BattleStarted { .. })));
        assert_eq!(room.players(), vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn foreign_or_unknown_entities_are_rejected_without_change() {
        let mut room = pvp_room();
        let before = entities(&room.engine().snapshot());

        room.enqueue("alice", cast("bob:0", "Tremor", None));
        room.enqueue("alice", cast("alice:7", "Flame Bite", Some("bob:0")));
        room.enqueue(
            "alice",
            PlayerAction::Move {
                entity_id: EntityId::new("bob:0"),
                position: "front".to_string(),
            },
        );
        let output = room.tick(0);

        assert_eq!(
            rejections_for(&output, "alice"),
            vec!["not_owner", "unknown_entity", "not_owner"]
        );
        assert!(rejections_for(&output, "bob").is_empty());
        assert_eq!(entities(&room.engine().snapshot()), before);
        assert!(!output
            .outbound
            .iter()
            .any(|out| matches!(out.message, ServerMessage::PlayerAction(_))));
    }

    #[test]
    fn actions_apply_in_arrival_order() {
        let mut room = pvp_room();
        // 같은 엔티티의 두 번째 시전은 첫 시전이 이미 상태를 바꿨으므로 거부된다
        room.enqueue("bob", cast("bob:0", "Boulder Slam", Some("alice:0")));
        room.enqueue("bob", cast("bob:0", "Tremor", None));
        room.enqueue("alice", cast("alice:0", "Flame Bite", Some("bob:0")));
        assert_eq!(room.pending_actions(), 3);

        let output = room.tick(TICK);
        assert_eq!(room.pending_actions(), 0);
        assert_eq!(rejections_for(&output, "bob"), vec!["already_casting"]);
        assert!(rejections_for(&output, "alice").is_empty());

        let echoes: Vec<&str> = output
            .outbound
            .iter()
            .filter_map(|out| match &out.message {
                ServerMessage::PlayerAction(echo) => Some(echo.player_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(echoes, vec!["bob", "alice"]);

        let update = output
            .outbound
            .iter()
            .find_map(|out| match &out.message {
                ServerMessage::BattleStateUpdate { state, events, .. } => Some((state, events)),
                _ => None,
            })
            .unwrap();
        assert_eq!(update.0.entities[&EntityId::new("bob:0")].health, 120);
        assert!(!update.1.is_empty());
    }

    #[test]
    fn grace_period_forfeits_the_absent_player() {
        let mut room = pvp_room();
        room.detach("bob");
        assert!(!room.is_connected("bob"));

        for _ in 0..19 {
            assert!(room.tick(TICK).finished.is_none());
        }
        assert_eq!(room.engine().state(), SessionState::Active);

        let output = room.tick(TICK);
        let outcome = output
            .finished
            .clone()
            .expect("battle should end once grace elapses");
        assert_eq!(outcome.reason, EndReason::Abandoned);
        assert_eq!(outcome.winner_player.as_deref(), Some("alice"));
        assert!(output
            .outbound
            .iter()
            .any(|out| matches!(out.message, ServerMessage::BattleEnded(_))));
    }

    #[test]
    fn reattach_within_grace_keeps_the_battle_alive() {
        let mut room = pvp_room();
        room.detach("bob");
        for _ in 0..10 {
            room.tick(TICK);
        }
        let resent = room.reattach("bob");
        assert_eq!(resent.len(), 1);
        assert!(matches!(resent[0].message, ServerMessage::BattleStarted { .. }));

        for _ in 0..30 {
            room.tick(TICK);
        }
        assert_eq!(room.engine().state(), SessionState::Active);
        assert!(room.reattach("mallory").is_empty());
    }

    #[test]
    fn room_lingers_after_the_end() {
        let mut room = pvp_room();
        room.detach("bob");
        for _ in 0..20 {
            room.tick(TICK);
        }
        assert_eq!(room.engine().state(), SessionState::Ended);
        assert!(!room.should_close());

        // 종료 후에는 스냅샷을 더 보내지 않고 행동은 거부된다
        room.enqueue("alice", cast("alice:0", "Kindle", None));
        let output = room.tick(TICK);
        assert_eq!(rejections_for(&output, "alice"), vec!["session_not_active"]);
        assert!(output.finished.is_none());
        assert!(!output
            .outbound
            .iter()
            .any(|out| matches!(out.message, ServerMessage::BattleStateUpdate { .. })));

        for _ in 0..9 {
            room.tick(TICK);
        }
        assert!(room.should_close());
    }

    #[test]
    fn room_closes_when_everyone_left() {
        let mut room = pvp_room();
        room.detach("bob");
        for _ in 0..20 {
            room.tick(TICK);
        }
        assert!(!room.should_close());
        room.detach("alice");
        assert!(room.should_close());
    }

    #[test]
    fn pve_room_plays_itself_to_completion() {
        let catalog = Arc::new(AbilityCatalog::builtin().unwrap());
        let mut room = BattleRoom::create(
            Uuid::new_v4(),
            catalog,
            &settings(),
            &[
                human("alice", &["Sporeling"]),
                Participant {
                    player_id: crate::AI_PLAYER_ID.to_string(),
                    controller: Controller::Ai,
                    cards: vec![CardSpec::new("Gloom Bat"), CardSpec::new("Stone Golem")],
                },
            ],
        )
        .unwrap();
        assert_eq!(room.players(), vec!["alice".to_string()]);

        let mut finished = None;
        for _ in 0..3000 {
            if let Some(outcome) = room.tick(TICK).finished {
                finished = Some(outcome);
                break;
            }
        }
        let outcome = finished.expect("AI should finish an undefended opponent");
        assert_eq!(outcome.winner_player.as_deref(), Some(crate::AI_PLAYER_ID));
    }

    #[test]
    fn invalid_decks_are_refused() {
        let catalog = Arc::new(AbilityCatalog::builtin().unwrap());
        let err = BattleRoom::create(
            Uuid::new_v4(),
            catalog,
            &settings(),
            &[human("alice", &["Paper Dragon"]), human("bob", &["Stone Golem"])],
        )
        .err()
        .unwrap();
        assert_eq!(err.code(), "invalid_deck");
    }
}
