use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 참가자가 들고 오는 카드 한 장 (`JOIN_MATCHMAKING.playerCards[]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSpec {
    /// 크리처 템플릿 이름
    pub card_name: String,
    #[serde(default)]
    pub configuration: CardConfiguration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardConfiguration {
    /// 표시 이름. 비어 있으면 템플릿 이름
    #[serde(default)]
    pub name: String,
    /// 장착할 어빌리티. 비어 있으면 템플릿의 전체 목록
    #[serde(default)]
    pub abilities: Vec<String>,
}

impl CardSpec {
    pub fn new(card_name: impl Into<String>) -> Self {
        Self {
            card_name: card_name.into(),
            configuration: CardConfiguration::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.configuration.name = name.into();
        self
    }

    pub fn with_abilities(mut self, abilities: &[&str]) -> Self {
        self.configuration.abilities = abilities.iter().map(|name| name.to_string()).collect();
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("unknown card: {0}")]
    UnknownCard(String),
    #[error("ability {ability} is not available on card {card}")]
    AbilityNotOnCard { card: String, ability: String },
    #[error("player {0} already has a team in this battle")]
    DuplicatePlayer(String),
    #[error("team of player {0} has no cards")]
    EmptyTeam(String),
    #[error("battle is not initializing")]
    NotInitializing,
    #[error("a battle needs at least two teams, got {0}")]
    NotEnoughTeams(usize),
}
