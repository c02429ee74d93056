use actix::{Addr, Message};
use uuid::Uuid;

use battle_core::{game::battle::PlayerId, PlayerAction};

use crate::matchmaking::session::PlayerSession;

/// 세션에서 온 행동. 다음 틱에 도착 순서대로 적용된다.
#[derive(Message)]
#[rtype(result = "()")]
pub struct SubmitAction {
    pub player_id: PlayerId,
    pub action: PlayerAction,
}

/// 새 연결을 좌석에 붙인다 (첫 연결 또는 재접속).
#[derive(Message)]
#[rtype(result = "()")]
pub struct Attach {
    pub player_id: PlayerId,
    pub conn_id: Uuid,
    pub addr: Addr<PlayerSession>,
    /// 재접속이면 현재 스냅샷을 다시 보낸다
    pub resend_state: bool,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Detach {
    pub player_id: PlayerId,
    pub conn_id: Uuid,
}
