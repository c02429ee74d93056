use actix::Handler;
use tracing::{debug, warn};

use super::{
    messages::{Attach, Detach, SubmitAction},
    BattleActor, SeatLink,
};

impl Handler<SubmitAction> for BattleActor {
    type Result = ();

    fn handle(&mut self, msg: SubmitAction, _ctx: &mut Self::Context) -> Self::Result {
        debug!(
            battle_id = %self.battle_id(),
            player_id = %msg.player_id,
            entity_id = %msg.action.entity_id(),
            "action queued"
        );
        self.room.enqueue(msg.player_id, msg.action);
    }
}

impl Handler<Attach> for BattleActor {
    type Result = ();

    fn handle(&mut self, msg: Attach, _ctx: &mut Self::Context) -> Self::Result {
        if !self.room.is_seated(&msg.player_id) {
            warn!(
                battle_id = %self.battle_id(),
                player_id = %msg.player_id,
                "attach from a player without a seat, ignoring"
            );
            return;
        }

        self.links.insert(
            msg.player_id.clone(),
            SeatLink {
                conn_id: msg.conn_id,
                addr: msg.addr,
            },
        );
        let outbound = self.room.reattach(&msg.player_id);
        if msg.resend_state {
            self.dispatch(outbound);
        }
    }
}

impl Handler<Detach> for BattleActor {
    type Result = ();

    fn handle(&mut self, msg: Detach, _ctx: &mut Self::Context) -> Self::Result {
        // 이미 새 연결로 교체된 좌석은 건드리지 않는다
        let current = self
            .links
            .get(&msg.player_id)
            .is_some_and(|link| link.conn_id == msg.conn_id);
        if !current {
            return;
        }
        self.links.remove(&msg.player_id);
        self.room.detach(&msg.player_id);
    }
}
