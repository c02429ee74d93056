use std::collections::VecDeque;

use serde::Serialize;

use super::entity::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AbilityUsed,
    System,
    Damage,
    Heal,
    StatusApplied,
    StatusExpired,
    CastStarted,
    CastCancelled,
    Death,
    BattleEnded,
}

/// 전투 이벤트 (append-only)
///
/// 생성 후 변경되지 않는다. `seq`와 `time_ms`는 [`EventLog::push`]가 채운다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleEvent {
    pub seq: u64,
    pub time_ms: u64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ability: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    pub message: String,
}

impl BattleEvent {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            time_ms: 0,
            kind,
            source: None,
            target: None,
            ability: None,
            amount: None,
            message: message.into(),
        }
    }

    pub fn source(mut self, source: &EntityId) -> Self {
        self.source = Some(source.clone());
        self
    }

    pub fn target(mut self, target: &EntityId) -> Self {
        self.target = Some(target.clone());
        self
    }

    pub fn ability(mut self, ability: &'static str) -> Self {
        self.ability = Some(ability);
        self
    }

    pub fn amount(mut self, amount: u32) -> Self {
        self.amount = Some(amount);
        self
    }

    /// 전투 기준 시각 (초)
    pub fn time_secs(&self) -> f64 {
        self.time_ms as f64 / 1000.0
    }
}

/// 최근 이벤트 링 버퍼.
///
/// 용량을 넘으면 가장 오래된 이벤트부터 버린다. 시퀀스 번호는 버려진 이벤트와 상관없이 계속 증가한다.
#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    events: VecDeque<BattleEvent>,
    next_seq: u64,
    /// 아직 브로드캐스트하지 않은 첫 시퀀스
    cursor: u64,
}

impl EventLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
            next_seq: 0,
            cursor: 0,
        }
    }

    pub fn push(&mut self, mut event: BattleEvent, now_ms: u64) -> u64 {
        event.seq = self.next_seq;
        event.time_ms = now_ms;
        self.next_seq += 1;

        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
        self.next_seq - 1
    }

    /// 마지막 호출 이후 쌓인 이벤트를 돌려준다. 그 사이 버퍼에서 밀려난 이벤트는 포함되지 않는다.
    pub fn drain_new(&mut self) -> Vec<BattleEvent> {
        let cursor = self.cursor;
        self.cursor = self.next_seq;
        self.events
            .iter()
            .filter(|event| event.seq >= cursor)
            .cloned()
            .collect()
    }

    pub fn recent(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter()
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter().filter(move |event| event.kind == kind)
    }

    pub fn last(&self) -> Option<&BattleEvent> {
        self.events.back()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total_emitted(&self) -> u64 {
        self.next_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(message: &str) -> BattleEvent {
        BattleEvent::new(EventKind::System, message)
    }

    #[test]
    fn ring_buffer_drops_oldest() {
        let mut log = EventLog::with_capacity(3);
        for i in 0..5 {
            log.push(system(&format!("event {i}")), i * 100);
        }

        let seqs: Vec<u64> = log.recent().map(|event| event.seq).collect();
        assert_eq!(seqs, vec![2, 3, 4]);
        assert_eq!(log.total_emitted(), 5);
        assert_eq!(log.last().map(|event| event.time_ms), Some(400));
    }

    #[test]
    fn drain_new_returns_each_event_once() {
        let mut log = EventLog::with_capacity(8);
        log.push(system("a"), 0);
        log.push(system("b"), 0);

        assert_eq!(log.drain_new().len(), 2);
        assert!(log.drain_new().is_empty());

        log.push(system("c"), 100);
        let fresh = log.drain_new();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].message, "c");
        assert_eq!(log.len(), 3);
    }
}
