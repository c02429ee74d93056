use serde::{Deserialize, Serialize};

/// 크리처 템플릿의 기본 스탯
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    /// 최대 체력 (전투 시작 시 현재 체력도 이 값)
    pub max_health: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
}

impl BaseStats {
    pub const fn with_values(max_health: u32, attack: u32, defense: u32, speed: u32) -> Self {
        Self {
            max_health,
            attack,
            defense,
            speed,
        }
    }
}

/// `value`에 퍼센트 수정치를 적용한다 (예: +25 → 1.25배, -40 → 0.6배).
///
/// 결과는 내림하며 0 아래로 내려가지 않는다.
pub fn scale_percent(value: u32, percent: i32) -> u32 {
    let factor = (100 + i64::from(percent)).max(0);
    let scaled = i64::from(value) * factor / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_percent_floors_and_clamps() {
        assert_eq!(scale_percent(28, 20), 33);
        assert_eq!(scale_percent(28, 40), 39);
        assert_eq!(scale_percent(10, -40), 6);
        assert_eq!(scale_percent(10, -250), 0);
    }
}
