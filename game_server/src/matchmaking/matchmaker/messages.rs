use actix::{Addr, Message};
use uuid::Uuid;

use battle_core::{game::battle::PlayerId, CardSpec};

use crate::{matchmaking::session::PlayerSession, GameMode};

/// 웹소켓 세션이 열렸음을 알린다. 진행 중인 전투가 있으면 다시 붙인다.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub player_id: PlayerId,
    pub conn_id: Uuid,
    pub addr: Addr<PlayerSession>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub player_id: PlayerId,
    pub conn_id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Enqueue {
    pub player_id: PlayerId,
    pub game_mode: GameMode,
    pub cards: Vec<CardSpec>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct ReadyConfirm {
    pub player_id: PlayerId,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct TryMatch;

/// 전투 액터가 멈추면서 보낸다.
#[derive(Message)]
#[rtype(result = "()")]
pub struct BattleClosed {
    pub battle_id: Uuid,
    pub players: Vec<PlayerId>,
}
