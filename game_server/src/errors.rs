use battle_core::game::battle::SetupError;
use thiserror::Error;

/// 매칭/세션 조정 단계의 거부 사유. 클라이언트에는 `ACTION_REJECTED` 로 전달된다.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("player is already waiting for a match")]
    AlreadyQueued,

    #[error("player is not waiting for a match")]
    NotQueued,

    #[error("no match is waiting for confirmation")]
    NoPendingMatch,

    #[error("invalid deck: {0}")]
    InvalidDeck(String),

    #[error("player is already in a battle")]
    AlreadyInBattle,

    #[error("player is not in a battle")]
    NotInBattle,
}

impl CoordinatorError {
    pub fn code(&self) -> &'static str {
        match self {
            CoordinatorError::AlreadyQueued => "already_queued",
            CoordinatorError::NotQueued => "not_queued",
            CoordinatorError::NoPendingMatch => "no_pending_match",
            CoordinatorError::InvalidDeck(_) => "invalid_deck",
            CoordinatorError::AlreadyInBattle => "already_in_battle",
            CoordinatorError::NotInBattle => "not_in_battle",
        }
    }
}

impl From<SetupError> for CoordinatorError {
    fn from(err: SetupError) -> Self {
        CoordinatorError::InvalidDeck(err.to_string())
    }
}
