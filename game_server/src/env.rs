use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

use battle_core::EngineConfig;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub matchmaking: MatchmakingSettings,
    #[serde(default)]
    pub battle: BattleSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        println!("Loading configuration for RUN_MODE: {}", &run_mode);

        let s = Config::builder()
            // 환경별 파일 (development.toml, production.toml ...)
            .add_source(
                File::with_name(&format!("config/{}", run_mode))
                    .format(FileFormat::Toml)
                    .required(false),
            )
            // 환경 변수 (예: APP_SERVER__PORT=8000)
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 타이머 주기는 0 일 수 없다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("battle.tick_interval_ms", self.battle.tick_interval_ms),
            (
                "matchmaking.try_match_tick_interval_ms",
                self.matchmaking.try_match_tick_interval_ms,
            ),
            (
                "matchmaking.heartbeat_interval_seconds",
                self.matchmaking.heartbeat_interval_seconds,
            ),
        ];
        for (key, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Message(format!("{key} must be greater than zero")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub metrics_auth_token: Option<String>,
    /// 앞단 인증 게이트웨이가 채워주는 사용자 id 헤더
    pub identity_header: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            metrics_auth_token: None,
            identity_header: "x-user-id".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: String,
    pub filename: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            filename: "game_server.log".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MatchmakingSettings {
    pub try_match_tick_interval_ms: u64,
    /// MATCH_FOUND 이후 READY_CONFIRM 을 기다리는 시간
    pub ready_timeout_seconds: u64,
    pub heartbeat_interval_seconds: u64,
    pub heartbeat_timeout: u64,
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            try_match_tick_interval_ms: 500,
            ready_timeout_seconds: 15,
            heartbeat_interval_seconds: 5,
            heartbeat_timeout: 15,
        }
    }
}

impl MatchmakingSettings {
    pub fn try_match_interval(&self) -> Duration {
        Duration::from_millis(self.try_match_tick_interval_ms.max(1))
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_seconds)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds.max(1))
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BattleSettings {
    pub tick_interval_ms: u64,
    pub cast_interruption: bool,
    pub event_log_capacity: usize,
    /// 연결이 끊긴 플레이어를 기다리는 시간. 지나면 해당 팀은 기권 처리된다.
    pub disconnect_grace_seconds: u64,
    /// 전투 종료 후 방을 유지하는 시간
    pub linger_seconds: u64,
    /// 0 이면 제한 없음
    pub max_battle_seconds: u64,
    /// 유휴 AI 엔티티가 틱마다 행동할 확률 (%)
    pub ai_action_chance: u8,
    pub max_team_size: usize,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            cast_interruption: true,
            event_log_capacity: 256,
            disconnect_grace_seconds: 20,
            linger_seconds: 30,
            max_battle_seconds: 300,
            ai_action_chance: 35,
            max_team_size: 3,
        }
    }
}

impl BattleSettings {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cast_interruption: self.cast_interruption,
            event_log_capacity: self.event_log_capacity,
            max_battle_ms: (self.max_battle_seconds > 0).then(|| self.max_battle_seconds * 1000),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn grace_ms(&self) -> u64 {
        self.disconnect_grace_seconds * 1000
    }

    pub fn linger_ms(&self) -> u64 {
        self.linger_seconds * 1000
    }
}
