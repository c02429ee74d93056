use actix::{Actor, Addr, AsyncContext, Context};
use std::{collections::HashMap, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use battle_core::{game::battle::PlayerId, AbilityCatalog};

use crate::{
    env::{BattleSettings, MatchmakingSettings},
    game::battle_actor::BattleActor,
    matchmaking::session::PlayerSession,
    provider::BattleResultSink,
};

use self::{messages::TryMatch, queue::MatchQueue};

pub mod handlers;
pub mod messages;
pub mod queue;

/// 플레이어의 현재 웹소켓 연결
pub(crate) struct SessionHandle {
    pub conn_id: Uuid,
    pub addr: Addr<PlayerSession>,
}

pub(crate) struct BattleHandle {
    pub addr: Addr<BattleActor>,
    pub players: Vec<PlayerId>,
}

/// 대기열, 준비 확인, 전투 생성을 맡는 단일 액터.
pub struct Matchmaker {
    pub(super) settings: MatchmakingSettings,
    pub(super) battle_settings: BattleSettings,
    pub(super) catalog: Arc<AbilityCatalog>,
    pub(super) sink: Arc<dyn BattleResultSink>,
    pub(super) queue: MatchQueue,
    pub(super) sessions: HashMap<PlayerId, SessionHandle>,
    pub(super) battles: HashMap<Uuid, BattleHandle>,
    pub(super) player_battles: HashMap<PlayerId, Uuid>,
    /// 취소되면 새 매치를 만들지 않는다. 진행 중인 전투는 그대로 끝까지 간다.
    pub(super) shutdown_token: CancellationToken,
}

impl Matchmaker {
    pub fn new(
        settings: MatchmakingSettings,
        battle_settings: BattleSettings,
        catalog: Arc<AbilityCatalog>,
        sink: Arc<dyn BattleResultSink>,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            settings,
            battle_settings,
            catalog,
            sink,
            queue: MatchQueue::new(),
            sessions: HashMap::new(),
            battles: HashMap::new(),
            player_battles: HashMap::new(),
            shutdown_token,
        }
    }

    pub(super) fn refresh_queue_gauge(&self) {
        metrics::PLAYERS_IN_QUEUE.set(self.queue.waiting_count() as i64);
    }
}

impl Actor for Matchmaker {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("Matchmaker actor started.");
        // 매칭 시도 및 준비 확인 만료 타이머
        ctx.run_interval(self.settings.try_match_interval(), |_act, ctx| {
            ctx.address().do_send(TryMatch);
        });
    }
}
