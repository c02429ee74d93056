/// 전투 엔진 설정. I/O 없이 서버 설정에서 채워진다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// 대상이 모두 죽은 시전을 효과 없이 취소할지 여부 (시전자 사망은 항상 취소)
    pub cast_interruption: bool,
    pub event_log_capacity: usize,
    /// 넘기면 무승부로 끝난다
    pub max_battle_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cast_interruption: true,
            event_log_capacity: 256,
            max_battle_ms: Some(300_000),
        }
    }
}
