use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::battle::ResolveContext;

/// 어빌리티 타겟 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Targeting {
    /// 살아있는 적 하나 (targetId 필수)
    Enemy,
    /// 살아있는 아군 하나, 자신 포함 (targetId 필수)
    Ally,
    /// 시전자 자신
    Caster,
    /// 살아있는 모든 적, 팀 순서
    AllEnemies,
    /// 살아있는 모든 아군, 팀 순서
    AllAllies,
}

impl Targeting {
    pub fn requires_target(self) -> bool {
        matches!(self, Targeting::Enemy | Targeting::Ally)
    }

    pub fn is_area(self) -> bool {
        matches!(self, Targeting::AllEnemies | Targeting::AllAllies)
    }

    pub fn is_hostile(self) -> bool {
        matches!(self, Targeting::Enemy | Targeting::AllEnemies)
    }
}

/// 어빌리티 기본 수치. 해석은 behavior마다 다르다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AbilityParams {
    pub damage: u32,
    pub heal: u32,
    /// 부여하는 상태 효과의 지속 시간
    pub duration_ms: u64,
    /// 주기 효과의 펄스 간격
    pub tick_interval_ms: u64,
    /// 발동 확률 (%)
    pub chance: u8,
    /// 퍼센트 수정치 등 그 밖의 값
    pub magnitude: i32,
}

/// 어빌리티 실행 로직.
///
/// 모든 어빌리티가 같은 인터페이스를 공유하고, 카탈로그가 이름으로 조회해서 호출한다.
/// `resolve`가 호출될 때 대상은 이미 검증되어 있으므로 실패 경로가 없다.
pub trait AbilityBehavior: Send + Sync {
    fn resolve(&self, ctx: &mut ResolveContext<'_>);
}

/// 불변 어빌리티 정의. 프로세스 시작 시 한 번 등록된다.
pub struct AbilityDef {
    pub name: &'static str,
    /// 이 어빌리티를 가진 크리처 템플릿 이름
    pub owner: &'static str,
    pub description: &'static str,
    pub targeting: Targeting,
    pub cast_time_ms: u64,
    pub cooldown_ms: u64,
    /// 전투 시작 시 자동 적용되며 직접 시전할 수 없다
    pub passive: bool,
    pub params: AbilityParams,
    pub behavior: Box<dyn AbilityBehavior>,
}

impl AbilityDef {
    pub fn new(
        name: &'static str,
        owner: &'static str,
        targeting: Targeting,
        behavior: impl AbilityBehavior + 'static,
    ) -> Self {
        Self {
            name,
            owner,
            description: "",
            targeting,
            cast_time_ms: 0,
            cooldown_ms: 0,
            passive: false,
            params: AbilityParams::default(),
            behavior: Box::new(behavior),
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn cast_time(mut self, cast_time_ms: u64) -> Self {
        self.cast_time_ms = cast_time_ms;
        self
    }

    pub fn cooldown(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    pub fn passive(mut self) -> Self {
        self.passive = true;
        self
    }

    pub fn params(mut self, params: AbilityParams) -> Self {
        self.params = params;
        self
    }

    pub fn resolve(&self, ctx: &mut ResolveContext<'_>) {
        self.behavior.resolve(ctx);
    }
}

impl fmt::Debug for AbilityDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbilityDef")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("targeting", &self.targeting)
            .field("cast_time_ms", &self.cast_time_ms)
            .field("cooldown_ms", &self.cooldown_ms)
            .field("passive", &self.passive)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
