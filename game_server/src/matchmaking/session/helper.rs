use tracing::warn;

use crate::{errors::CoordinatorError, matchmaking::session::Ctx, shared::protocol::ServerMessage};

/// 봉투로 감싸 전송한다. 직렬화 실패는 로그만 남긴다.
pub fn send(ctx: &mut Ctx, message: &ServerMessage) {
    match message.to_text() {
        Ok(text) => ctx.text(text),
        Err(e) => warn!("Failed to serialize ServerMessage for client: {}", e),
    }
}

pub fn send_rejection(ctx: &mut Ctx, err: &CoordinatorError) {
    metrics::ACTIONS_REJECTED_TOTAL
        .with_label_values(&[err.code()])
        .inc();
    send(ctx, &ServerMessage::rejected(err.code(), err));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,          // 연결 직후 또는 전투가 끝난 뒤
    InQueue,       // 대기열 등록 완료
    MatchFound,    // READY_CONFIRM 대기
    InBattle,      // 전투 진행 중
    Disconnecting, // 종료 처리 중
}

impl SessionState {
    pub fn can_transition_to(&self, new_state: SessionState) -> bool {
        use SessionState::*;
        match (self, new_state) {
            (_, Disconnecting) => true,
            (Disconnecting, _) => false,

            (Idle, InQueue) => true,
            // 재접속하면 곧바로 전투로 돌아간다
            (Idle, InBattle) => true,

            (InQueue, MatchFound) => true,
            (InQueue, Idle) => true,

            (MatchFound, InBattle) => true,
            // 준비 시간 초과 또는 상대 이탈
            (MatchFound, InQueue) => true,
            (MatchFound, Idle) => true,

            (InBattle, Idle) => true,

            _ => false,
        }
    }

    /// 서버 메시지가 세션 상태를 바꾸는 경우 그 다음 상태
    pub fn after(message: &ServerMessage) -> Option<SessionState> {
        match message {
            ServerMessage::MatchmakingJoined { .. } => Some(SessionState::InQueue),
            ServerMessage::MatchFound { .. } => Some(SessionState::MatchFound),
            ServerMessage::MatchmakingCancelled { requeued: true, .. } => {
                Some(SessionState::InQueue)
            }
            ServerMessage::MatchmakingCancelled { requeued: false, .. } => {
                Some(SessionState::Idle)
            }
            _ => None,
        }
    }

    /// 이 상태에서 클라이언트 요청이 거부될 때의 사유
    pub fn join_rejection(&self) -> Option<CoordinatorError> {
        match self {
            SessionState::Idle => None,
            SessionState::InBattle => Some(CoordinatorError::AlreadyInBattle),
            _ => Some(CoordinatorError::AlreadyQueued),
        }
    }
}
