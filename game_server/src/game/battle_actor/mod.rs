use actix::{Actor, ActorContext, Addr, AsyncContext, Context};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::{info, warn};
use uuid::Uuid;

use battle_core::game::battle::PlayerId;

use crate::{
    game::room::{Audience, BattleRoom, Outbound},
    matchmaking::{
        matchmaker::{messages::BattleClosed, Matchmaker},
        session::PlayerSession,
    },
    provider::BattleResultSink,
};

pub mod handlers;
pub mod messages;

/// 좌석에 붙어 있는 연결
pub(crate) struct SeatLink {
    pub conn_id: Uuid,
    pub addr: Addr<PlayerSession>,
}

/// 전투 하나를 고정 주기로 구동하는 액터.
///
/// 세션별 가변 상태는 모두 이 액터가 단독으로 소유한다. 외부에서는 메시지로만 접근한다.
pub struct BattleActor {
    room: BattleRoom,
    links: HashMap<PlayerId, SeatLink>,
    matchmaker: Addr<Matchmaker>,
    sink: Arc<dyn BattleResultSink>,
    tick: Duration,
}

impl BattleActor {
    pub fn new(
        mut room: BattleRoom,
        sessions: HashMap<PlayerId, (Uuid, Addr<PlayerSession>)>,
        matchmaker: Addr<Matchmaker>,
        sink: Arc<dyn BattleResultSink>,
        tick: Duration,
    ) -> Self {
        let mut links = HashMap::new();
        for player in room.players() {
            match sessions.get(&player) {
                Some((conn_id, addr)) => {
                    links.insert(
                        player,
                        SeatLink {
                            conn_id: *conn_id,
                            addr: addr.clone(),
                        },
                    );
                }
                // 매칭 직후 끊긴 경우: 유예 시간 안에 돌아오면 된다
                None => room.detach(&player),
            }
        }

        Self {
            room,
            links,
            matchmaker,
            sink,
            tick,
        }
    }

    pub fn battle_id(&self) -> Uuid {
        self.room.battle_id()
    }

    fn dispatch(&self, outbound: Vec<Outbound>) {
        for Outbound { to, message } in outbound {
            match to {
                Audience::Player(player) => {
                    if let Some(link) = self.links.get(&player) {
                        link.addr.do_send(message);
                    }
                }
                Audience::Everyone => {
                    for link in self.links.values() {
                        link.addr.do_send(message.clone());
                    }
                }
            }
        }
    }

    fn on_tick(&mut self, ctx: &mut Context<Self>) {
        let timer = metrics::BATTLE_TICK_DURATION_SECONDS.start_timer();
        let output = self.room.tick(self.tick.as_millis() as u64);
        timer.observe_duration();

        self.dispatch(output.outbound);

        if let Some(outcome) = output.finished {
            metrics::BATTLES_FINISHED_TOTAL
                .with_label_values(&[outcome.reason.as_str()])
                .inc();
            info!(
                battle_id = %outcome.battle_id,
                winner = ?outcome.winner,
                duration_ms = outcome.duration_ms,
                "battle finished"
            );
            self.sink.record(&outcome);
        }

        if self.room.should_close() {
            ctx.stop();
        }
    }
}

impl Actor for BattleActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(battle_id = %self.battle_id(), "BattleActor started.");
        metrics::ACTIVE_BATTLES.inc();

        self.dispatch(self.room.opening());
        ctx.run_interval(self.tick, |act, ctx| act.on_tick(ctx));
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        metrics::ACTIVE_BATTLES.dec();
        if self.room.engine().outcome().is_none() {
            warn!(battle_id = %self.battle_id(), "BattleActor stopped before the battle ended");
        }
        self.matchmaker.do_send(BattleClosed {
            battle_id: self.battle_id(),
            players: self.room.players(),
        });
        info!(battle_id = %self.battle_id(), "BattleActor stopped.");
    }
}
