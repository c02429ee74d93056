//! 크리처 카드 전투 시뮬레이션 코어.
//!
//! 네트워크와 무관한 순수 시뮬레이션 계층이다. 세션 하나는 [`BattleEngine`] 하나가
//! 소유하며, 어빌리티 정의는 [`AbilityCatalog`]에 한 번 적재된 뒤 모든 세션이
//! `Arc`로 공유한다.

pub mod game;

pub use game::battle::{
    ActionAccepted, ActionRejection, BattleEngine, BattleOutcome, BattleSnapshot, CardSpec,
    EngineConfig, EntityId, PlayerAction, SessionState, TeamId,
};
pub use game::catalog::AbilityCatalog;
