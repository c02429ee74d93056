use actix::{ActorContext, Handler, StreamHandler};
use actix_web_actors::ws::{self, Message, ProtocolError};
use std::time::Instant;
use tracing::{debug, info, warn};

use battle_core::{CardSpec, PlayerAction};

use crate::{
    errors::CoordinatorError,
    game::battle_actor::messages::SubmitAction,
    matchmaking::{
        matchmaker::messages::{Enqueue, ReadyConfirm},
        session::{
            helper::{send, send_rejection, SessionState},
            messages::{EnterBattle, LeaveBattle},
            Ctx, PlayerSession,
        },
    },
    shared::protocol::{ClientMessage, ServerMessage},
    GameMode, Stop,
};

impl Handler<Stop> for PlayerSession {
    type Result = ();

    fn handle(&mut self, msg: Stop, ctx: &mut Self::Context) -> Self::Result {
        info!(
            "Stop message received in PlayerSession actor. Stopping actor. {:?}",
            msg.reason
        );
        ctx.close(Some(ws::CloseCode::Policy.into()));
        ctx.stop();
    }
}

// 매치메이커와 전투 액터는 PlayerSession 을 거쳐서 클라이언트와 통신한다.
impl Handler<ServerMessage> for PlayerSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, ctx: &mut Self::Context) -> Self::Result {
        if let Some(next) = SessionState::after(&msg) {
            self.transition_to(next);
        }
        send(ctx, &msg);
    }
}

impl Handler<EnterBattle> for PlayerSession {
    type Result = ();

    fn handle(&mut self, msg: EnterBattle, _ctx: &mut Self::Context) -> Self::Result {
        if self.transition_to(SessionState::InBattle) {
            info!(player_id = %self.player_id, battle_id = %msg.battle_id, "session joined battle");
            self.battle = Some((msg.battle_id, msg.addr));
        }
    }
}

impl Handler<LeaveBattle> for PlayerSession {
    type Result = ();

    fn handle(&mut self, msg: LeaveBattle, _ctx: &mut Self::Context) -> Self::Result {
        if self
            .battle
            .as_ref()
            .is_some_and(|(battle_id, _)| *battle_id == msg.battle_id)
        {
            self.battle = None;
            self.transition_to(SessionState::Idle);
        }
    }
}

impl PlayerSession {
    fn handle_join(&mut self, ctx: &mut Ctx, mode: GameMode, cards: Vec<CardSpec>) {
        if let Some(err) = self.state.join_rejection() {
            warn!(
                player_id = %self.player_id,
                state = ?self.state,
                "JOIN_MATCHMAKING in non-idle state"
            );
            send_rejection(ctx, &err);
            return;
        }
        info!(player_id = %self.player_id, %mode, cards = cards.len(), "player requests queue");
        self.matchmaker_addr.do_send(Enqueue {
            player_id: self.player_id.clone(),
            game_mode: mode,
            cards,
        });
    }

    fn handle_ready(&mut self, ctx: &mut Ctx) {
        if self.state != SessionState::MatchFound {
            send_rejection(ctx, &CoordinatorError::NoPendingMatch);
            return;
        }
        self.matchmaker_addr.do_send(ReadyConfirm {
            player_id: self.player_id.clone(),
        });
    }

    fn handle_action(&mut self, ctx: &mut Ctx, action: PlayerAction) {
        let Some((battle_id, battle)) = &self.battle else {
            send_rejection(ctx, &CoordinatorError::NotInBattle);
            return;
        };
        debug!(player_id = %self.player_id, %battle_id, entity_id = %action.entity_id(), "forwarding action");
        battle.do_send(SubmitAction {
            player_id: self.player_id.clone(),
            action,
        });
    }
}

impl StreamHandler<Result<Message, ProtocolError>> for PlayerSession {
    fn handle(&mut self, msg: Result<Message, ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match ClientMessage::parse(&text) {
                Ok(ClientMessage::JoinMatchmaking { mode, cards }) => {
                    self.handle_join(ctx, mode, cards)
                }
                Ok(ClientMessage::ReadyConfirm) => self.handle_ready(ctx),
                Ok(ClientMessage::PlayerAction(action)) => self.handle_action(ctx, action),
                Ok(ClientMessage::Ping) => {
                    self.last_heartbeat = Instant::now();
                    send(ctx, &ServerMessage::Pong {});
                }
                // 잘못된 메시지는 버리고 연결은 유지한다
                Err(e) => {
                    warn!(player_id = %self.player_id, "Failed to parse client message: {}", e);
                    metrics::MALFORMED_MESSAGES_TOTAL
                        .with_label_values(&[e.label()])
                        .inc();
                }
            },
            Ok(ws::Message::Binary(_)) => {
                warn!(player_id = %self.player_id, "Binary frames are not supported, dropping");
                metrics::MALFORMED_MESSAGES_TOTAL
                    .with_label_values(&["binary_frame"])
                    .inc();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!(player_id = %self.player_id, "Websocket protocol error: {}", e);
                ctx.stop();
            }
        }
    }
}
