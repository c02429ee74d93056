//! 외부 협력자 경계: 신원 확인과 전투 결과 기록.

use actix_web::HttpRequest;
use tracing::info;

use battle_core::BattleOutcome;

use crate::AI_PLAYER_ID;

/// 연결마다 인증된 사용자 id 를 돌려준다. 서버는 이 값을 그대로 플레이어 id 로 믿는다.
pub trait IdentityProvider: Send + Sync {
    fn identify(&self, req: &HttpRequest) -> Option<String>;
}

/// 앞단 게이트웨이가 넣어준 헤더(또는 `user` 쿼리 파라미터)에서 id 를 읽는다.
pub struct HeaderIdentityProvider {
    header: String,
}

impl HeaderIdentityProvider {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }

    fn from_query(query: &str) -> Option<String> {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "user")
            .map(|(_, value)| value.to_string())
    }
}

impl IdentityProvider for HeaderIdentityProvider {
    fn identify(&self, req: &HttpRequest) -> Option<String> {
        let id = req
            .headers()
            .get(self.header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .or_else(|| Self::from_query(req.query_string()))?;

        let id = id.trim();
        // 엔티티 id 가 "player:slot" 형태라 구분자는 허용하지 않는다
        if id.is_empty() || id == AI_PLAYER_ID || id.contains(':') {
            return None;
        }
        Some(id.to_string())
    }
}

/// 전투 종료 후 이력/보상을 기록하는 협력자
pub trait BattleResultSink: Send + Sync {
    fn record(&self, outcome: &BattleOutcome);
}

/// 기본 구현: 결과를 로그로만 남긴다.
pub struct LoggingResultSink;

impl BattleResultSink for LoggingResultSink {
    fn record(&self, outcome: &BattleOutcome) {
        let players: Vec<&str> = outcome
            .rosters
            .iter()
            .map(|team| team.player.as_str())
            .collect();
        info!(
            battle_id = %outcome.battle_id,
            winner = ?outcome.winner,
            winner_player = ?outcome.winner_player,
            reason = ?outcome.reason,
            duration_ms = outcome.duration_ms,
            ?players,
            "battle result recorded"
        );
    }
}
