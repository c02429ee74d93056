use thiserror::Error;

use super::entity::EntityId;

/// 외부에서 제출되는 행동 (`PLAYER_ACTION`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    CastAbility {
        entity_id: EntityId,
        ability_name: String,
        target_id: Option<EntityId>,
    },
    /// 위치는 타겟팅용 불투명 식별자일 뿐이다
    Move { entity_id: EntityId, position: String },
    CancelCast { entity_id: EntityId },
}

impl PlayerAction {
    pub fn entity_id(&self) -> &EntityId {
        match self {
            PlayerAction::CastAbility { entity_id, .. }
            | PlayerAction::Move { entity_id, .. }
            | PlayerAction::CancelCast { entity_id } => entity_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionAccepted {
    /// 시전 시간 0: 즉시 해결됨
    Resolved,
    CastStarted { cast_time_ms: u64 },
    Moved,
    CastCancelled,
}

/// 거부된 행동. 상태는 바뀌지 않는다.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionRejection {
    #[error("battle is not active")]
    SessionNotActive,
    #[error("no entity with id {0}")]
    UnknownEntity(EntityId),
    #[error("entity {0} is not controlled by this player")]
    NotOwner(EntityId),
    #[error("entity {0} is dead")]
    EntityDead(EntityId),
    #[error("entity {0} is already casting")]
    AlreadyCasting(EntityId),
    #[error("unknown ability {0}")]
    UnknownAbility(String),
    #[error("entity does not know ability {0}")]
    AbilityNotLearned(String),
    #[error("ability {0} is passive and cannot be cast")]
    PassiveAbility(String),
    #[error("ability {ability} is on cooldown for {remaining_ms}ms")]
    OnCooldown { ability: String, remaining_ms: u64 },
    #[error("ability requires a target")]
    MissingTarget,
    #[error("no entity with id {0}")]
    UnknownTarget(EntityId),
    #[error("target {0} is dead")]
    TargetDead(EntityId),
    #[error("target {0} is not valid for this ability")]
    InvalidTarget(EntityId),
    #[error("no valid targets")]
    NoValidTargets,
    #[error("entity {0} is not casting")]
    NotCasting(EntityId),
}

impl ActionRejection {
    /// `ACTION_REJECTED.reason`에 실리는 고정 코드
    pub fn code(&self) -> &'static str {
        match self {
            ActionRejection::SessionNotActive => "session_not_active",
            ActionRejection::UnknownEntity(_) => "unknown_entity",
            ActionRejection::NotOwner(_) => "not_owner",
            ActionRejection::EntityDead(_) => "entity_dead",
            ActionRejection::AlreadyCasting(_) => "already_casting",
            ActionRejection::UnknownAbility(_) => "unknown_ability",
            ActionRejection::AbilityNotLearned(_) => "ability_not_learned",
            ActionRejection::PassiveAbility(_) => "passive_ability",
            ActionRejection::OnCooldown { .. } => "on_cooldown",
            ActionRejection::MissingTarget => "missing_target",
            ActionRejection::UnknownTarget(_) => "unknown_target",
            ActionRejection::TargetDead(_) => "target_dead",
            ActionRejection::InvalidTarget(_) => "invalid_target",
            ActionRejection::NoValidTargets => "no_valid_targets",
            ActionRejection::NotCasting(_) => "not_casting",
        }
    }
}
