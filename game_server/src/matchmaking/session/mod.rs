use actix::{Actor, ActorContext, Addr, AsyncContext, Running};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use battle_core::game::battle::PlayerId;

use crate::{
    game::battle_actor::{messages::Detach, BattleActor},
    matchmaking::matchmaker::{
        messages::{Connect, Disconnect},
        Matchmaker,
    },
};

use self::helper::SessionState;

pub mod handlers;
pub mod helper;
pub mod messages;

pub type Ctx = ws::WebsocketContext<PlayerSession>;

/// 플레이어 한 명의 웹소켓 연결.
///
/// 인증된 id 는 연결 시점에 정해지며 이후 바뀌지 않는다.
pub struct PlayerSession {
    pub(super) player_id: PlayerId,
    pub(super) conn_id: Uuid,
    pub(super) state: SessionState,
    pub(super) last_heartbeat: Instant,
    heartbeat_interval: Duration,
    client_timeout: Duration,
    pub(super) matchmaker_addr: Addr<Matchmaker>,
    pub(super) battle: Option<(Uuid, Addr<BattleActor>)>,
}

impl PlayerSession {
    pub fn new(
        player_id: PlayerId,
        matchmaker_addr: Addr<Matchmaker>,
        heartbeat_interval: Duration,
        client_timeout: Duration,
    ) -> Self {
        Self {
            player_id,
            conn_id: Uuid::new_v4(),
            state: SessionState::Idle,
            last_heartbeat: Instant::now(),
            heartbeat_interval,
            client_timeout,
            matchmaker_addr,
            battle: None,
        }
    }

    /// 허용되지 않는 전이는 로그만 남기고 무시한다.
    pub(super) fn transition_to(&mut self, next: SessionState) -> bool {
        if self.state == next {
            return true;
        }
        if !self.state.can_transition_to(next) {
            warn!(
                player_id = %self.player_id,
                from = ?self.state,
                to = ?next,
                "invalid session state transition"
            );
            return false;
        }
        self.state = next;
        true
    }

    fn heartbeat(&self, ctx: &mut Ctx) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > act.client_timeout {
                info!(player_id = %act.player_id, "Websocket Client heartbeat failed, disconnecting!");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for PlayerSession {
    type Context = Ctx;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(player_id = %self.player_id, conn_id = %self.conn_id, "PlayerSession started.");
        metrics::ACTIVE_WS_CONNECTIONS.inc();
        self.heartbeat(ctx);
        self.matchmaker_addr.do_send(Connect {
            player_id: self.player_id.clone(),
            conn_id: self.conn_id,
            addr: ctx.address(),
        });
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        self.state = SessionState::Disconnecting;
        Running::Stop
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        metrics::ACTIVE_WS_CONNECTIONS.dec();
        if let Some((battle_id, battle)) = self.battle.take() {
            info!(player_id = %self.player_id, %battle_id, "player left an active battle");
            battle.do_send(Detach {
                player_id: self.player_id.clone(),
                conn_id: self.conn_id,
            });
        }
        self.matchmaker_addr.do_send(Disconnect {
            player_id: self.player_id.clone(),
            conn_id: self.conn_id,
        });
        info!(player_id = %self.player_id, "PlayerSession stopped.");
    }
}
