use actix::{Addr, Message};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use battle_core::AbilityCatalog;

use crate::{
    env::Settings,
    matchmaking::matchmaker::Matchmaker,
    provider::IdentityProvider,
};

pub mod env;
pub mod errors;
pub mod game;
pub mod matchmaking;
pub mod provider;
pub mod shared;

/// AI 진영이 사용하는 플레이어 id. 외부 신원으로는 쓸 수 없다.
pub const AI_PLAYER_ID: &str = "ai";

pub struct LoggerManager {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

impl LoggerManager {
    pub fn setup(settings: &Settings) -> Self {
        // 1. 파일 로거 설정
        let file_appender = RollingFileAppender::new(
            Rotation::DAILY,
            &settings.logging.directory,
            &settings.logging.filename,
        );
        let (non_blocking_file_writer, guard) = tracing_appender::non_blocking(file_appender);

        // 2. RUST_LOG 가 있으면 설정 파일 값보다 우선한다
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.server.log_level));

        // 3. 콘솔 출력 레이어
        let console_layer = tracing_fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .pretty();

        // 4. 파일 출력 레이어
        let file_layer = tracing_fmt::layer()
            .with_writer(non_blocking_file_writer)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        tracing::info!(
            "로거 초기화 완료: 콘솔 및 파일({}/{}) 출력 활성화.",
            settings.logging.directory,
            settings.logging.filename
        );

        Self { _guard: guard }
    }
}

// 서버 전체에서 공유하는 상태
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub catalog: Arc<AbilityCatalog>,
    pub matchmaker_addr: Addr<Matchmaker>,
    pub identity: Arc<dyn IdentityProvider>,
    pub logger_manager: Arc<LoggerManager>,
    pub metrics_registry: prometheus::Registry,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameMode {
    /// 사람 대 내장 AI
    #[serde(rename = "PVE")]
    Pve,
    /// 사람 대 사람
    #[serde(rename = "PVP")]
    Pvp,
}

impl GameMode {
    /// 한 매치에 필요한 사람 수
    pub fn required_players(self) -> usize {
        match self {
            GameMode::Pve => 1,
            GameMode::Pvp => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Pve => "PVE",
            GameMode::Pvp => "PVP",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct Stop {
    pub reason: String,
}
