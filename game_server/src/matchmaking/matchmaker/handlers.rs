use actix::{Actor, AsyncContext, Context, Handler};
use std::{collections::HashMap, time::Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use battle_core::{game::enums::Controller, BattleEngine, CardSpec, EngineConfig};

use crate::{
    errors::CoordinatorError,
    game::{
        ai::opponent_roster,
        battle_actor::{messages::Attach, BattleActor},
        room::{BattleRoom, Participant},
    },
    matchmaking::session::messages::{EnterBattle, LeaveBattle},
    shared::protocol::ServerMessage,
    AI_PLAYER_ID,
};

use super::{
    messages::{BattleClosed, Connect, Disconnect, Enqueue, ReadyConfirm, TryMatch},
    queue::{CancelledMatch, PendingMatch, QueueEntry, ReadyOutcome, Withdrawal},
    BattleHandle, Matchmaker, SessionHandle,
};

// --- Helper Functions ---

impl Matchmaker {
    fn notify(&self, player: &str, message: ServerMessage) {
        if let Some(session) = self.sessions.get(player) {
            session.addr.do_send(message);
        }
    }

    fn reject(&self, player: &str, err: &CoordinatorError) {
        warn!(player_id = %player, reason = err.code(), "matchmaking request rejected");
        metrics::ACTIONS_REJECTED_TOTAL
            .with_label_values(&[err.code()])
            .inc();
        self.notify(player, ServerMessage::rejected(err.code(), err));
    }

    /// 카드 구성이 실제로 팀을 만들 수 있는지 미리 확인한다.
    fn validate_deck(&self, player: &str, cards: &[CardSpec]) -> Result<(), CoordinatorError> {
        if cards.len() > self.battle_settings.max_team_size {
            return Err(CoordinatorError::InvalidDeck(format!(
                "at most {} cards are allowed",
                self.battle_settings.max_team_size
            )));
        }
        let mut probe = BattleEngine::new(
            Uuid::nil(),
            self.catalog.clone(),
            EngineConfig::default(),
        );
        probe.add_team(player, Controller::Human, cards)?;
        Ok(())
    }

    fn notify_cancelled(&self, cancelled: &CancelledMatch, reason: &str) {
        for player in &cancelled.requeued {
            self.notify(
                player,
                ServerMessage::MatchmakingCancelled {
                    match_id: Some(cancelled.match_id),
                    reason: reason.to_string(),
                    requeued: true,
                },
            );
        }
        for player in &cancelled.dropped {
            self.notify(
                player,
                ServerMessage::MatchmakingCancelled {
                    match_id: Some(cancelled.match_id),
                    reason: reason.to_string(),
                    requeued: false,
                },
            );
        }
    }

    fn start_battle(&mut self, pending: PendingMatch, ctx: &mut Context<Self>) {
        let battle_id = Uuid::new_v4();
        let mut participants: Vec<Participant> = pending
            .entries
            .iter()
            .map(|entry| Participant {
                player_id: entry.player_id.clone(),
                controller: Controller::Human,
                cards: entry.cards.clone(),
            })
            .collect();

        if pending.entries.len() < 2 {
            let size = pending.entries.first().map_or(1, |entry| entry.cards.len());
            participants.push(Participant {
                player_id: AI_PLAYER_ID.to_string(),
                controller: Controller::Ai,
                cards: opponent_roster(&self.catalog, size, &mut rand::thread_rng()),
            });
        }

        let room = match BattleRoom::create(
            battle_id,
            self.catalog.clone(),
            &self.battle_settings,
            &participants,
        ) {
            Ok(room) => room,
            Err(err) => {
                error!(%battle_id, match_id = %pending.match_id, error = %err, "failed to create battle");
                for entry in &pending.entries {
                    self.reject(&entry.player_id, &err);
                    self.notify(&entry.player_id, setup_failed(pending.match_id));
                }
                return;
            }
        };

        let sessions: HashMap<_, _> = pending
            .entries
            .iter()
            .filter_map(|entry| {
                self.sessions
                    .get(&entry.player_id)
                    .map(|session| (entry.player_id.clone(), (session.conn_id, session.addr.clone())))
            })
            .collect();

        let players = room.players();
        let addr = BattleActor::new(
            room,
            sessions,
            ctx.address(),
            self.sink.clone(),
            self.battle_settings.tick_interval(),
        )
        .start();

        for player in &players {
            self.player_battles.insert(player.clone(), battle_id);
            if let Some(session) = self.sessions.get(player) {
                session.addr.do_send(EnterBattle {
                    battle_id,
                    addr: addr.clone(),
                });
            }
        }
        info!(%battle_id, match_id = %pending.match_id, mode = %pending.mode, ?players, "battle created");
        self.battles.insert(battle_id, BattleHandle { addr, players });
    }
}

/// 전투 생성에 실패한 매치의 참가자를 대기열 밖 (`Idle`) 으로 돌려보낸다.
fn setup_failed(match_id: Uuid) -> ServerMessage {
    ServerMessage::MatchmakingCancelled {
        match_id: Some(match_id),
        reason: "battle_setup_failed".to_string(),
        requeued: false,
    }
}

// --- Message Handlers ---

impl Handler<Connect> for Matchmaker {
    type Result = ();

    fn handle(&mut self, msg: Connect, _ctx: &mut Self::Context) -> Self::Result {
        if let Some(previous) = self.sessions.get(&msg.player_id) {
            if previous.conn_id != msg.conn_id {
                warn!(player_id = %msg.player_id, "player opened a second connection, replacing the first");
                previous.addr.do_send(crate::Stop {
                    reason: "replaced by a newer connection".to_string(),
                });
            }
        }
        self.sessions.insert(
            msg.player_id.clone(),
            SessionHandle {
                conn_id: msg.conn_id,
                addr: msg.addr.clone(),
            },
        );

        let Some(battle_id) = self.player_battles.get(&msg.player_id).copied() else {
            return;
        };
        if let Some(battle) = self.battles.get(&battle_id) {
            info!(player_id = %msg.player_id, %battle_id, "reattaching player to running battle");
            battle.addr.do_send(Attach {
                player_id: msg.player_id.clone(),
                conn_id: msg.conn_id,
                addr: msg.addr.clone(),
                resend_state: true,
            });
            msg.addr.do_send(EnterBattle {
                battle_id,
                addr: battle.addr.clone(),
            });
        }
    }
}

impl Handler<Disconnect> for Matchmaker {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Self::Context) -> Self::Result {
        let current = self
            .sessions
            .get(&msg.player_id)
            .is_some_and(|session| session.conn_id == msg.conn_id);
        if !current {
            return;
        }
        self.sessions.remove(&msg.player_id);

        match self.queue.withdraw(&msg.player_id) {
            Ok(Withdrawal::Queued(_)) => {
                info!(player_id = %msg.player_id, "player left the queue by disconnecting");
            }
            Ok(Withdrawal::Match(cancelled)) => {
                info!(player_id = %msg.player_id, match_id = %cancelled.match_id, "pending match cancelled by disconnect");
                self.notify_cancelled(&cancelled, "opponent_left");
            }
            Err(_) => {}
        }
        self.refresh_queue_gauge();
    }
}

impl Handler<Enqueue> for Matchmaker {
    type Result = ();

    fn handle(&mut self, msg: Enqueue, _ctx: &mut Self::Context) -> Self::Result {
        if self.player_battles.contains_key(&msg.player_id) {
            self.reject(&msg.player_id, &CoordinatorError::AlreadyInBattle);
            return;
        }
        if msg.cards.is_empty() {
            self.reject(
                &msg.player_id,
                &CoordinatorError::InvalidDeck("at least one card is required".to_string()),
            );
            return;
        }
        if let Err(err) = self.validate_deck(&msg.player_id, &msg.cards) {
            self.reject(&msg.player_id, &err);
            return;
        }

        let entry = QueueEntry {
            player_id: msg.player_id.clone(),
            mode: msg.game_mode,
            cards: msg.cards,
            joined_at: Instant::now(),
        };
        match self.queue.enqueue(entry) {
            Ok(position) => {
                info!(player_id = %msg.player_id, mode = %msg.game_mode, position, "player enqueued");
                self.notify(
                    &msg.player_id,
                    ServerMessage::MatchmakingJoined {
                        mode: msg.game_mode,
                        position,
                    },
                );
            }
            Err(err) => self.reject(&msg.player_id, &err),
        }
        self.refresh_queue_gauge();
    }
}

impl Handler<TryMatch> for Matchmaker {
    type Result = ();

    fn handle(&mut self, _msg: TryMatch, _ctx: &mut Self::Context) -> Self::Result {
        if self.shutdown_token.is_cancelled() {
            return;
        }
        let now = Instant::now();

        for cancelled in self.queue.expire(now) {
            warn!(match_id = %cancelled.match_id, dropped = ?cancelled.dropped, "ready confirmation timed out");
            self.notify_cancelled(&cancelled, "ready_timeout");
        }

        let ready_timeout = self.settings.ready_timeout();
        for pending in self.queue.try_match(now, ready_timeout) {
            metrics::MATCHES_CREATED_TOTAL
                .with_label_values(&[pending.mode.as_str()])
                .inc();
            for entry in &pending.entries {
                metrics::MATCH_WAIT_DURATION_SECONDS
                    .with_label_values(&[pending.mode.as_str()])
                    .observe(now.saturating_duration_since(entry.joined_at).as_secs_f64());
            }
            for player in pending.players() {
                self.notify(
                    player,
                    ServerMessage::MatchFound {
                        match_id: pending.match_id,
                        mode: pending.mode,
                        ready_timeout_ms: ready_timeout.as_millis() as u64,
                    },
                );
            }
            info!(match_id = %pending.match_id, mode = %pending.mode, players = ?pending.players().collect::<Vec<_>>(), "match found");
        }
        self.refresh_queue_gauge();
    }
}

impl Handler<ReadyConfirm> for Matchmaker {
    type Result = ();

    fn handle(&mut self, msg: ReadyConfirm, ctx: &mut Self::Context) -> Self::Result {
        match self.queue.confirm(&msg.player_id) {
            Ok(ReadyOutcome::Waiting { match_id }) => {
                info!(player_id = %msg.player_id, %match_id, "player ready, waiting for the others");
            }
            Ok(ReadyOutcome::Ready(pending)) => self.start_battle(pending, ctx),
            Err(err) => self.reject(&msg.player_id, &err),
        }
    }
}

impl Handler<BattleClosed> for Matchmaker {
    type Result = ();

    fn handle(&mut self, msg: BattleClosed, _ctx: &mut Self::Context) -> Self::Result {
        self.battles.remove(&msg.battle_id);
        for player in &msg.players {
            if self.player_battles.get(player) == Some(&msg.battle_id) {
                self.player_battles.remove(player);
            }
            if let Some(session) = self.sessions.get(player) {
                session.addr.do_send(LeaveBattle {
                    battle_id: msg.battle_id,
                });
            }
        }
        info!(battle_id = %msg.battle_id, "battle closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchmaking::session::helper::SessionState;

    #[test]
    fn failed_battle_setup_releases_the_session() {
        let mut state = SessionState::MatchFound;
        let notices = [
            ServerMessage::rejected(
                CoordinatorError::InvalidDeck("x".into()).code(),
                "invalid deck",
            ),
            setup_failed(Uuid::new_v4()),
        ];
        for notice in &notices {
            if let Some(next) = SessionState::after(notice) {
                assert!(state.can_transition_to(next));
                state = next;
            }
        }

        assert_eq!(state, SessionState::Idle);
        assert!(state.join_rejection().is_none());
    }
}
