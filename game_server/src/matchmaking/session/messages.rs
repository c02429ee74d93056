use actix::{Addr, Message};
use uuid::Uuid;

use crate::game::battle_actor::BattleActor;

/// 매치메이커가 전투 액터 주소를 넘겨준다.
#[derive(Message)]
#[rtype(result = "()")]
pub struct EnterBattle {
    pub battle_id: Uuid,
    pub addr: Addr<BattleActor>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct LeaveBattle {
    pub battle_id: Uuid,
}
