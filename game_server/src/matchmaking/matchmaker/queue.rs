//! 대기열과 준비 확인 대기 중인 매치. 액터와 분리된 순수 상태다.

use std::{
    collections::{BTreeSet, HashMap, VecDeque},
    time::{Duration, Instant},
};

use uuid::Uuid;

use battle_core::{game::battle::PlayerId, CardSpec};

use crate::{errors::CoordinatorError, GameMode};

#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub player_id: PlayerId,
    pub mode: GameMode,
    pub cards: Vec<CardSpec>,
    pub joined_at: Instant,
}

/// MATCH_FOUND 를 보낸 뒤 READY_CONFIRM 을 기다리는 매치
#[derive(Debug, Clone)]
pub struct PendingMatch {
    pub match_id: Uuid,
    pub mode: GameMode,
    pub entries: Vec<QueueEntry>,
    pub confirmed: BTreeSet<PlayerId>,
    pub deadline: Instant,
}

impl PendingMatch {
    pub fn players(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.player_id.as_str())
    }

    fn is_ready(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| self.confirmed.contains(&entry.player_id))
    }
}

#[derive(Debug)]
pub enum ReadyOutcome {
    /// 다른 참가자를 기다리는 중
    Waiting { match_id: Uuid },
    /// 모두 준비 완료. 대기 목록에서 빠진다.
    Ready(PendingMatch),
}

/// 준비 시간 초과나 이탈로 깨진 매치
#[derive(Debug, Clone, PartialEq)]
pub struct CancelledMatch {
    pub match_id: Uuid,
    /// 대기열 맨 앞으로 돌아간 플레이어
    pub requeued: Vec<PlayerId>,
    /// 대기열에서 빠진 플레이어
    pub dropped: Vec<PlayerId>,
}

#[derive(Debug, PartialEq)]
pub enum Withdrawal {
    Queued(QueueEntry),
    Match(CancelledMatch),
}

#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: HashMap<GameMode, VecDeque<QueueEntry>>,
    pending: HashMap<Uuid, PendingMatch>,
    pending_by_player: HashMap<PlayerId, Uuid>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, player: &str) -> bool {
        self.pending_by_player.contains_key(player)
            || self
                .waiting
                .values()
                .any(|queue| queue.iter().any(|entry| entry.player_id == player))
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.values().map(VecDeque::len).sum()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// 대기열 끝에 넣고 1부터 시작하는 순번을 돌려준다.
    pub fn enqueue(&mut self, entry: QueueEntry) -> Result<usize, CoordinatorError> {
        if self.contains(&entry.player_id) {
            return Err(CoordinatorError::AlreadyQueued);
        }
        let queue = self.waiting.entry(entry.mode).or_default();
        queue.push_back(entry);
        Ok(queue.len())
    }

    /// 모드별로 가장 오래 기다린 순서대로 묶는다. PVE 는 혼자서 매치가 된다.
    pub fn try_match(&mut self, now: Instant, ready_timeout: Duration) -> Vec<PendingMatch> {
        let mut formed = Vec::new();
        for mode in [GameMode::Pve, GameMode::Pvp] {
            let Some(queue) = self.waiting.get_mut(&mode) else {
                continue;
            };
            let required = mode.required_players();
            while queue.len() >= required {
                let entries: Vec<QueueEntry> = queue.drain(..required).collect();
                formed.push(PendingMatch {
                    match_id: Uuid::new_v4(),
                    mode,
                    entries,
                    confirmed: BTreeSet::new(),
                    deadline: now + ready_timeout,
                });
            }
        }

        for pending in &formed {
            for player in pending.players() {
                self.pending_by_player
                    .insert(player.to_string(), pending.match_id);
            }
            self.pending.insert(pending.match_id, pending.clone());
        }
        formed
    }

    pub fn confirm(&mut self, player: &str) -> Result<ReadyOutcome, CoordinatorError> {
        let match_id = *self
            .pending_by_player
            .get(player)
            .ok_or(CoordinatorError::NoPendingMatch)?;
        let pending = self
            .pending
            .get_mut(&match_id)
            .ok_or(CoordinatorError::NoPendingMatch)?;

        pending.confirmed.insert(player.to_string());
        if !pending.is_ready() {
            return Ok(ReadyOutcome::Waiting { match_id });
        }

        let ready = self.take_pending(match_id).ok_or(CoordinatorError::NoPendingMatch)?;
        Ok(ReadyOutcome::Ready(ready))
    }

    /// 기한이 지난 매치를 깨뜨린다. 확인한 플레이어는 맨 앞으로 돌아가고 나머지는 빠진다.
    pub fn expire(&mut self, now: Instant) -> Vec<CancelledMatch> {
        let expired: Vec<Uuid> = self
            .pending
            .values()
            .filter(|pending| pending.deadline <= now)
            .map(|pending| pending.match_id)
            .collect();

        let mut cancelled = Vec::with_capacity(expired.len());
        for match_id in expired {
            if let Some(pending) = self.take_pending(match_id) {
                let confirmed = pending.confirmed.clone();
                cancelled.push(self.cancel(pending, |entry| confirmed.contains(&entry.player_id)));
            }
        }
        cancelled
    }

    /// 연결이 끊긴 플레이어를 빼낸다. 매치 대기 중이었다면 남은 참가자는 모두 맨 앞으로 돌아간다.
    pub fn withdraw(&mut self, player: &str) -> Result<Withdrawal, CoordinatorError> {
        if let Some(match_id) = self.pending_by_player.get(player).copied() {
            let pending = self
                .take_pending(match_id)
                .ok_or(CoordinatorError::NotQueued)?;
            return Ok(Withdrawal::Match(
                self.cancel(pending, |entry| entry.player_id != player),
            ));
        }

        for queue in self.waiting.values_mut() {
            if let Some(index) = queue.iter().position(|entry| entry.player_id == player) {
                if let Some(entry) = queue.remove(index) {
                    return Ok(Withdrawal::Queued(entry));
                }
            }
        }
        Err(CoordinatorError::NotQueued)
    }

    fn take_pending(&mut self, match_id: Uuid) -> Option<PendingMatch> {
        let pending = self.pending.remove(&match_id)?;
        for player in pending.players() {
            self.pending_by_player.remove(player);
        }
        Some(pending)
    }

    fn cancel(
        &mut self,
        pending: PendingMatch,
        keep: impl Fn(&QueueEntry) -> bool,
    ) -> CancelledMatch {
        let (kept, dropped): (Vec<QueueEntry>, Vec<QueueEntry>) =
            pending.entries.into_iter().partition(|entry| keep(entry));

        let queue = self.waiting.entry(pending.mode).or_default();
        // 원래 순서를 유지한 채 맨 앞으로
        for entry in kept.iter().rev() {
            queue.push_front(entry.clone());
        }

        CancelledMatch {
            match_id: pending.match_id,
            requeued: kept.into_iter().map(|entry| entry.player_id).collect(),
            dropped: dropped.into_iter().map(|entry| entry.player_id).collect(),
        }
    }
}
