//! 클라이언트와 주고받는 메시지.
//!
//! 모든 메시지는 `{ "type": ..., "data": { ... }, "timestamp": ... }` 봉투에 실린다.
//! 파싱 실패는 [`ProtocolError`] 로 돌려주고, 호출자는 로그만 남긴 뒤 버린다.

use actix::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use battle_core::{
    game::battle::BattleEvent, BattleOutcome, BattleSnapshot, CardSpec, EntityId, PlayerAction,
};

use crate::GameMode;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message is not valid json: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("unknown message type {0}")]
    UnknownType(String),

    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{action} requires {field}")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },
}

impl ProtocolError {
    /// 메트릭 라벨
    pub fn label(&self) -> &'static str {
        match self {
            ProtocolError::InvalidJson(_) => "invalid_json",
            ProtocolError::UnknownType(_) => "unknown_type",
            ProtocolError::InvalidPayload { .. } => "invalid_payload",
            ProtocolError::MissingField { .. } => "missing_field",
        }
    }
}

// --- Client to Server Messages ---

#[derive(Deserialize)]
struct IncomingEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinMatchmakingData {
    #[serde(rename = "type")]
    mode: GameMode,
    player_cards: Vec<CardSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// 대기열 등록 요청
    JoinMatchmaking { mode: GameMode, cards: Vec<CardSpec> },
    /// MATCH_FOUND 에 대한 준비 완료 응답
    ReadyConfirm,
    PlayerAction(PlayerAction),
    Ping,
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: IncomingEnvelope =
            serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;

        match envelope.kind.as_str() {
            "JOIN_MATCHMAKING" => {
                let data: JoinMatchmakingData = serde_json::from_value(envelope.data)
                    .map_err(|source| ProtocolError::InvalidPayload {
                        kind: "JOIN_MATCHMAKING",
                        source,
                    })?;
                Ok(ClientMessage::JoinMatchmaking {
                    mode: data.mode,
                    cards: data.player_cards,
                })
            }
            "READY_CONFIRM" => Ok(ClientMessage::ReadyConfirm),
            "PLAYER_ACTION" => {
                let payload: ActionPayload = serde_json::from_value(envelope.data)
                    .map_err(|source| ProtocolError::InvalidPayload {
                        kind: "PLAYER_ACTION",
                        source,
                    })?;
                payload.into_action().map(ClientMessage::PlayerAction)
            }
            "PING" => Ok(ClientMessage::Ping),
            _ => Err(ProtocolError::UnknownType(envelope.kind)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    CastAbility,
    Move,
    CancelCast,
}

/// `PLAYER_ACTION.data`. 서버가 다시 브로드캐스트할 때도 같은 모양을 쓴다.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub entity_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ability_name: Option<String>,
    /// MOVE 에서는 이동할 위치 식별자로 쓰인다
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl ActionPayload {
    pub fn into_action(self) -> Result<PlayerAction, ProtocolError> {
        match self.kind {
            ActionKind::CastAbility => {
                let ability_name = self.ability_name.ok_or(ProtocolError::MissingField {
                    action: "CAST_ABILITY",
                    field: "abilityName",
                })?;
                Ok(PlayerAction::CastAbility {
                    entity_id: self.entity_id,
                    ability_name,
                    target_id: self.target_id,
                })
            }
            ActionKind::Move => {
                let position = self.target_id.ok_or(ProtocolError::MissingField {
                    action: "MOVE",
                    field: "targetId",
                })?;
                Ok(PlayerAction::Move {
                    entity_id: self.entity_id,
                    position: position.as_str().to_string(),
                })
            }
            ActionKind::CancelCast => Ok(PlayerAction::CancelCast {
                entity_id: self.entity_id,
            }),
        }
    }

    pub fn from_action(action: &PlayerAction) -> Self {
        let (kind, ability_name, target_id) = match action {
            PlayerAction::CastAbility {
                ability_name,
                target_id,
                ..
            } => (
                ActionKind::CastAbility,
                Some(ability_name.clone()),
                target_id.clone(),
            ),
            PlayerAction::Move { position, .. } => {
                (ActionKind::Move, None, Some(EntityId::new(position.clone())))
            }
            PlayerAction::CancelCast { .. } => (ActionKind::CancelCast, None, None),
        };
        Self {
            kind,
            entity_id: action.entity_id().clone(),
            ability_name,
            target_id,
            timestamp: None,
        }
    }
}

// --- Server to Client Messages ---

/// 수락된 행동의 브로드캐스트
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionEcho {
    pub player_id: String,
    #[serde(flatten)]
    pub action: ActionPayload,
}

#[derive(Serialize, Message, Clone, Debug)]
#[rtype(result = "()")]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// 대기열에 등록되었음을 알립니다.
    MatchmakingJoined { mode: GameMode, position: usize },

    /// 상대가 정해졌습니다. READY_CONFIRM 을 기다립니다.
    MatchFound {
        match_id: Uuid,
        mode: GameMode,
        ready_timeout_ms: u64,
    },

    /// 매치가 성사되지 못했습니다. `requeued` 이면 대기열 맨 앞으로 돌아갑니다.
    MatchmakingCancelled {
        match_id: Option<Uuid>,
        reason: String,
        requeued: bool,
    },

    BattleStarted {
        battle_id: Uuid,
        initial_state: BattleSnapshot,
    },

    /// 틱마다 보내는 전체 스냅샷과 그 틱의 새 이벤트
    BattleStateUpdate {
        battle_id: Uuid,
        state: BattleSnapshot,
        events: Vec<BattleEvent>,
    },

    BattleEnded(BattleOutcome),

    ActionRejected { reason: String, message: String },

    PlayerAction(ActionEcho),

    Pong {},
}

impl ServerMessage {
    pub fn rejected(reason: &str, message: impl ToString) -> Self {
        ServerMessage::ActionRejected {
            reason: reason.to_string(),
            message: message.to_string(),
        }
    }

    /// 봉투에 `timestamp` (epoch ms) 를 붙여 직렬화한다.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "timestamp".to_string(),
                Value::from(chrono::Utc::now().timestamp_millis()),
            );
        }
        serde_json::to_string(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_matchmaking() {
        let text = r#"{
            "type": "JOIN_MATCHMAKING",
            "data": {
                "type": "PVP",
                "playerCards": [
                    { "cardName": "Ember Drake", "configuration": { "name": "Sparky", "abilities": ["Flame Bite"] } },
                    { "cardName": "Stone Golem" }
                ]
            },
            "timestamp": 1700000000000
        }"#;

        let ClientMessage::JoinMatchmaking { mode, cards } = ClientMessage::parse(text).unwrap()
        else {
            panic!("expected JOIN_MATCHMAKING");
        };
        assert_eq!(mode, GameMode::Pvp);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].configuration.name, "Sparky");
        assert_eq!(cards[0].configuration.abilities, vec!["Flame Bite".to_string()]);
        assert!(cards[1].configuration.abilities.is_empty());
    }

    #[test]
    fn parses_bodyless_messages() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"READY_CONFIRM","data":{},"timestamp":1}"#).unwrap(),
            ClientMessage::ReadyConfirm
        );
        assert_eq!(
            ClientMessage::parse(r#"{"type":"PING"}"#).unwrap(),
            ClientMessage::Ping
        );
    }

    #[test]
    fn parses_player_actions() {
        let cast = ClientMessage::parse(
            r#"{"type":"PLAYER_ACTION","data":{"type":"CAST_ABILITY","entityId":"alice:0","abilityName":"Flame Bite","targetId":"bob:0","timestamp":12.5},"timestamp":12}"#,
        )
        .unwrap();
        assert_eq!(
            cast,
            ClientMessage::PlayerAction(PlayerAction::CastAbility {
                entity_id: EntityId::new("alice:0"),
                ability_name: "Flame Bite".to_string(),
                target_id: Some(EntityId::new("bob:0")),
            })
        );

        let moved = ClientMessage::parse(
            r#"{"type":"PLAYER_ACTION","data":{"type":"MOVE","entityId":"alice:0","targetId":"front"}}"#,
        )
        .unwrap();
        assert_eq!(
            moved,
            ClientMessage::PlayerAction(PlayerAction::Move {
                entity_id: EntityId::new("alice:0"),
                position: "front".to_string(),
            })
        );

        let cancel = ClientMessage::parse(
            r#"{"type":"PLAYER_ACTION","data":{"type":"CANCEL_CAST","entityId":"alice:0"}}"#,
        )
        .unwrap();
        assert_eq!(
            cancel,
            ClientMessage::PlayerAction(PlayerAction::CancelCast {
                entity_id: EntityId::new("alice:0"),
            })
        );
    }

    #[test]
    fn malformed_messages_are_classified() {
        let err = ClientMessage::parse("not json").unwrap_err();
        assert_eq!(err.label(), "invalid_json");

        let err = ClientMessage::parse(r#"{"type":"TELEPORT","data":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownType(ref kind) if kind == "TELEPORT"));

        let err = ClientMessage::parse(
            r#"{"type":"PLAYER_ACTION","data":{"type":"CAST_ABILITY","entityId":"alice:0"}}"#,
        )
        .unwrap_err();
        assert_eq!(err.label(), "missing_field");

        let err = ClientMessage::parse(
            r#"{"type":"JOIN_MATCHMAKING","data":{"type":"RANKED","playerCards":[]}}"#,
        )
        .unwrap_err();
        assert_eq!(err.label(), "invalid_payload");

        let err = ClientMessage::parse(r#"{"type":"PLAYER_ACTION","data":{"type":"JUMP","entityId":"a:0"}}"#)
            .unwrap_err();
        assert_eq!(err.label(), "invalid_payload");
    }

    #[test]
    fn server_messages_use_the_envelope() {
        let text = ServerMessage::MatchFound {
            match_id: Uuid::nil(),
            mode: GameMode::Pve,
            ready_timeout_ms: 15_000,
        }
        .to_text()
        .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "MATCH_FOUND");
        assert_eq!(value["data"]["matchId"], Uuid::nil().to_string());
        assert_eq!(value["data"]["mode"], "PVE");
        assert_eq!(value["data"]["readyTimeoutMs"], 15_000);
        assert!(value["timestamp"].is_i64());

        let pong: Value = serde_json::from_str(&ServerMessage::Pong {}.to_text().unwrap()).unwrap();
        assert_eq!(pong["type"], "PONG");
        assert!(pong["data"].as_object().is_some_and(|data| data.is_empty()));
    }

    #[test]
    fn rejection_and_echo_payloads() {
        let rejected: Value = serde_json::to_value(ServerMessage::rejected(
            "not_owner",
            "entity bob:0 is not controlled by this player",
        ))
        .unwrap();
        assert_eq!(rejected["type"], "ACTION_REJECTED");
        assert_eq!(rejected["data"]["reason"], "not_owner");

        let action = PlayerAction::CastAbility {
            entity_id: EntityId::new("alice:0"),
            ability_name: "Tremor".to_string(),
            target_id: None,
        };
        let echo: Value = serde_json::to_value(ServerMessage::PlayerAction(ActionEcho {
            player_id: "alice".to_string(),
            action: ActionPayload::from_action(&action),
        }))
        .unwrap();
        assert_eq!(echo["type"], "PLAYER_ACTION");
        assert_eq!(echo["data"]["playerId"], "alice");
        assert_eq!(echo["data"]["type"], "CAST_ABILITY");
        assert_eq!(echo["data"]["abilityName"], "Tremor");
        assert!(echo["data"].get("targetId").is_none());
    }
}
