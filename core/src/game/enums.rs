use serde::{Deserialize, Serialize};

/// 크리처 속성
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Water,
    Nature,
    Earth,
    Shadow,
}

/// 팀을 조작하는 주체
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    Human,
    Ai,
}

/// 데미지 분류.
///
/// 수정치(버프/디버프) 적용 범위가 분류마다 다르다.
/// - `Attack`: 명중 판정 + 가해/피해 수정치 + 반응형 패시브
/// - `Spell`: 가해/피해 수정치만
/// - `Periodic`, `Redirect`: 수정치 없음
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageKind {
    Attack,
    Spell,
    Periodic,
    Redirect,
}

impl DamageKind {
    pub fn is_modified(self) -> bool {
        matches!(self, DamageKind::Attack | DamageKind::Spell)
    }
}
