use std::{collections::BTreeSet, sync::Arc};

use serde::Serialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{
    action::{ActionAccepted, ActionRejection, PlayerAction},
    config::EngineConfig,
    entity::{CastState, Entity, EntityId, TeamId},
    events::{BattleEvent, EventKind},
    invariants::check_invariants,
    setup::{CardSpec, SetupError},
    snapshot::BattleSnapshot,
    status::advance_effects,
    world::{BattleWorld, PlayerId, Team},
};
use crate::game::{
    ability::{AbilityDef, Targeting},
    catalog::{select_targets, AbilityCatalog, ResolveError},
    determinism::{seed_for_battle, BattleRng},
    enums::Controller,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initializing,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// 한 팀만 살아남음
    Elimination,
    /// 같은 틱에 모든 팀이 전멸 (무승부)
    MutualElimination,
    /// 최대 전투 시간 초과 (무승부)
    Timeout,
    /// 기권/연결 끊김 유예 만료
    Abandoned,
}

impl EndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::Elimination => "elimination",
            EndReason::MutualElimination => "mutual_elimination",
            EndReason::Timeout => "timeout",
            EndReason::Abandoned => "abandoned",
        }
    }
}

/// 종료 시점 기록. 결과 저장 협력자에게 그대로 넘겨진다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleOutcome {
    pub battle_id: Uuid,
    /// None이면 무승부
    pub winner: Option<TeamId>,
    pub winner_player: Option<PlayerId>,
    pub duration_ms: u64,
    pub reason: EndReason,
    pub rosters: Vec<Team>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub now_ms: u64,
    /// 이번 update에서 전투가 끝났을 때만 채워진다
    pub outcome: Option<BattleOutcome>,
}

/// 하나의 전투 세션.
///
/// 전송 계층에 의존하지 않는다. 모든 변경은 소유자(세션 틱 태스크)가 동기적으로 호출한다.
#[derive(Debug)]
pub struct BattleEngine {
    id: Uuid,
    state: SessionState,
    catalog: Arc<AbilityCatalog>,
    config: EngineConfig,
    world: BattleWorld,
    outcome: Option<BattleOutcome>,
    forfeited: BTreeSet<TeamId>,
}

impl BattleEngine {
    /// 시드는 battle_id에서 유도한다.
    pub fn new(id: Uuid, catalog: Arc<AbilityCatalog>, config: EngineConfig) -> Self {
        Self::with_seed(id, catalog, config, seed_for_battle(id))
    }

    pub fn with_seed(id: Uuid, catalog: Arc<AbilityCatalog>, config: EngineConfig, seed: u64) -> Self {
        let world = BattleWorld::new(BattleRng::from_seed(seed), config.event_log_capacity);
        Self {
            id,
            state: SessionState::Initializing,
            catalog,
            config,
            world,
            outcome: None,
            forfeited: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AbilityCatalog {
        &self.catalog
    }

    pub fn world(&self) -> &BattleWorld {
        &self.world
    }

    /// 테스트와 서버 진단용. 체력은 여전히 `deal_damage`/`apply_heal`로만 바뀐다.
    pub fn world_mut(&mut self) -> &mut BattleWorld {
        &mut self.world
    }

    pub fn now_ms(&self) -> u64 {
        self.world.now_ms
    }

    pub fn outcome(&self) -> Option<&BattleOutcome> {
        self.outcome.as_ref()
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.world.entity(id)
    }

    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.world.events.drain_new()
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot::capture(self)
    }

    /// 카드 목록으로 팀을 만든다. `Initializing` 상태에서만 가능하다.
    pub fn add_team(
        &mut self,
        player: impl Into<PlayerId>,
        controller: Controller,
        cards: &[CardSpec],
    ) -> Result<TeamId, SetupError> {
        let player = player.into();
        if self.state != SessionState::Initializing {
            return Err(SetupError::NotInitializing);
        }
        if self.world.team_of_player(&player).is_some() {
            return Err(SetupError::DuplicatePlayer(player));
        }
        if cards.is_empty() {
            return Err(SetupError::EmptyTeam(player));
        }

        let team_id = TeamId(self.world.teams.len() as u8);
        let mut members = Vec::with_capacity(cards.len());
        for (slot, card) in cards.iter().enumerate() {
            let template = self
                .catalog
                .template(&card.card_name)
                .ok_or_else(|| SetupError::UnknownCard(card.card_name.clone()))?;

            let abilities = if card.configuration.abilities.is_empty() {
                template.abilities.clone()
            } else {
                card.configuration
                    .abilities
                    .iter()
                    .map(|wanted| {
                        template
                            .abilities
                            .iter()
                            .find(|name| **name == wanted.as_str())
                            .copied()
                            .ok_or_else(|| SetupError::AbilityNotOnCard {
                                card: card.card_name.clone(),
                                ability: wanted.clone(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?
            };

            let nickname = if card.configuration.name.is_empty() {
                template.name.to_string()
            } else {
                card.configuration.name.clone()
            };

            members.push(Entity::new(
                EntityId::for_slot(&player, slot),
                team_id,
                player.clone(),
                template.name,
                nickname,
                template.element,
                template.stats,
                abilities,
            ));
        }

        let team = Team {
            id: team_id,
            player: player.clone(),
            controller,
            entities: members.iter().map(|entity| entity.id.clone()).collect(),
        };
        debug!(battle_id = %self.id, player = %player, team = %team_id, size = members.len(), "team added");
        self.world.add_team(team, members);
        Ok(team_id)
    }

    /// `Initializing → Active`. 패시브 어빌리티를 모든 엔티티에 적용한다.
    pub fn start(&mut self) -> Result<(), SetupError> {
        if self.state != SessionState::Initializing {
            return Err(SetupError::NotInitializing);
        }
        let populated = self
            .world
            .teams
            .iter()
            .filter(|team| !team.entities.is_empty())
            .count();
        if populated < 2 {
            return Err(SetupError::NotEnoughTeams(populated));
        }

        self.state = SessionState::Active;
        self.world
            .emit(BattleEvent::new(EventKind::System, "The battle begins"));

        let catalog = Arc::clone(&self.catalog);
        for id in self.world.entity_order() {
            let passives: Vec<&'static str> = match self.world.entity(&id) {
                Some(entity) => entity
                    .abilities
                    .iter()
                    .copied()
                    .filter(|name| catalog.ability(name).is_some_and(|def| def.passive))
                    .collect(),
                None => continue,
            };
            for name in passives {
                if let Err(err) = catalog.resolve(name, &mut self.world, &id, None) {
                    error!(battle_id = %self.id, entity = %id, ability = name, error = %err, "passive failed to apply");
                }
            }
        }

        debug!(battle_id = %self.id, teams = self.world.teams.len(), "battle started");
        Ok(())
    }

    /// 플레이어 단위 진입점. 소유권을 검증한 뒤 행동 종류별로 나눈다.
    pub fn submit(&mut self, player: &str, action: PlayerAction) -> Result<ActionAccepted, ActionRejection> {
        self.ensure_active()?;
        let entity_id = action.entity_id();
        let entity = self
            .world
            .entity(entity_id)
            .ok_or_else(|| ActionRejection::UnknownEntity(entity_id.clone()))?;
        if entity.owner != player {
            return Err(ActionRejection::NotOwner(entity_id.clone()));
        }

        let result = match action {
            PlayerAction::CastAbility {
                entity_id,
                ability_name,
                target_id,
            } => self.attempt_action(&entity_id, &ability_name, target_id.as_ref()),
            PlayerAction::Move { entity_id, position } => self.move_entity(&entity_id, position),
            PlayerAction::CancelCast { entity_id } => self.cancel_cast(&entity_id),
        };
        if let Err(rejection) = &result {
            debug!(battle_id = %self.id, player, reason = rejection.code(), "action rejected");
        }
        result
    }

    /// 시전을 시도한다. 거부 시 상태는 바뀌지 않는다.
    pub fn attempt_action(
        &mut self,
        entity_id: &EntityId,
        ability_name: &str,
        target: Option<&EntityId>,
    ) -> Result<ActionAccepted, ActionRejection> {
        self.ensure_active()?;
        let entity = self.living_entity(entity_id)?;
        if entity.cast.is_some() {
            return Err(ActionRejection::AlreadyCasting(entity_id.clone()));
        }

        let catalog = Arc::clone(&self.catalog);
        let ability = catalog
            .ability(ability_name)
            .ok_or_else(|| ActionRejection::UnknownAbility(ability_name.to_string()))?;
        if !entity.knows(ability.name) {
            return Err(ActionRejection::AbilityNotLearned(ability_name.to_string()));
        }
        if ability.passive {
            return Err(ActionRejection::PassiveAbility(ability_name.to_string()));
        }
        let remaining_ms = entity.cooldown(ability.name);
        if remaining_ms > 0 {
            return Err(ActionRejection::OnCooldown {
                ability: ability_name.to_string(),
                remaining_ms,
            });
        }

        select_targets(ability, &self.world, entity_id, target).map_err(rejection_for)?;

        if ability.cast_time_ms == 0 {
            catalog
                .resolve(ability.name, &mut self.world, entity_id, target)
                .map_err(rejection_for)?;
            self.start_cooldown(entity_id, ability);
            self.evaluate_termination(EndReason::Elimination);
            return Ok(ActionAccepted::Resolved);
        }

        let caster_name = self.world.name_of(entity_id);
        if let Some(entity) = self.world.entity_mut(entity_id) {
            entity.cast = Some(CastState {
                ability: ability.name,
                target: target.filter(|_| ability.targeting.requires_target()).cloned(),
                total_ms: ability.cast_time_ms,
                elapsed_ms: 0,
            });
        }
        let mut event = BattleEvent::new(
            EventKind::CastStarted,
            format!("{caster_name} begins casting {}", ability.name),
        )
        .source(entity_id)
        .ability(ability.name);
        if let Some(target) = target {
            event = event.target(target);
        }
        self.world.emit(event);

        Ok(ActionAccepted::CastStarted {
            cast_time_ms: ability.cast_time_ms,
        })
    }

    /// 진행 중인 시전을 쿨다운 없이 취소한다.
    pub fn cancel_cast(&mut self, entity_id: &EntityId) -> Result<ActionAccepted, ActionRejection> {
        self.ensure_active()?;
        self.living_entity(entity_id)?;

        let cast = self
            .world
            .entity_mut(entity_id)
            .and_then(|entity| entity.cast.take())
            .ok_or_else(|| ActionRejection::NotCasting(entity_id.clone()))?;
        let name = self.world.name_of(entity_id);
        self.world.emit(
            BattleEvent::new(
                EventKind::CastCancelled,
                format!("{name} stops casting {}", cast.ability),
            )
            .source(entity_id)
            .ability(cast.ability),
        );
        Ok(ActionAccepted::CastCancelled)
    }

    /// 위치 식별자만 바꾼다. 물리 시뮬레이션은 없다.
    pub fn move_entity(&mut self, entity_id: &EntityId, position: String) -> Result<ActionAccepted, ActionRejection> {
        self.ensure_active()?;
        let entity = self.living_entity(entity_id)?;
        if entity.cast.is_some() {
            return Err(ActionRejection::AlreadyCasting(entity_id.clone()));
        }
        if position.is_empty() {
            return Err(ActionRejection::MissingTarget);
        }

        let name = self.world.name_of(entity_id);
        let message = format!("{name} moves to {position}");
        if let Some(entity) = self.world.entity_mut(entity_id) {
            entity.position = Some(position);
        }
        self.world
            .emit(BattleEvent::new(EventKind::System, message).source(entity_id));
        Ok(ActionAccepted::Moved)
    }

    /// 시간을 `delta_ms`만큼 진행한다. `Active`가 아니면 아무것도 하지 않는다.
    ///
    /// 순서: 쿨다운 감소 → 상태 효과 진행 → 시전 진행/완료 → 종료 판정.
    /// 모든 순회는 팀 순서를 따른다.
    pub fn update(&mut self, delta_ms: u64) -> TickReport {
        if self.state != SessionState::Active {
            return TickReport {
                now_ms: self.world.now_ms,
                outcome: None,
            };
        }

        self.world.now_ms += delta_ms;
        let order = self.world.entity_order();

        for id in &order {
            if let Some(entity) = self.world.entity_mut(id) {
                entity.tick_cooldowns(delta_ms);
            }
        }

        for id in &order {
            advance_effects(&mut self.world, id, delta_ms);
        }

        for id in &order {
            self.progress_cast(id, delta_ms);
        }

        self.evaluate_termination(EndReason::Elimination);
        if self.state == SessionState::Active {
            if let Some(limit) = self.config.max_battle_ms {
                if self.world.now_ms >= limit {
                    self.finish(None, EndReason::Timeout);
                }
            }
        }

        if cfg!(debug_assertions) {
            if let Err(violation) = check_invariants(&self.world) {
                error!(battle_id = %self.id, %violation, "battle invariant violated");
                debug_assert!(false, "battle invariant violated: {violation}");
            }
        }

        TickReport {
            now_ms: self.world.now_ms,
            outcome: if self.state == SessionState::Ended {
                self.outcome.clone()
            } else {
                None
            },
        }
    }

    /// 팀을 기권 처리한다. 전투가 끝나면 결과를 돌려준다.
    pub fn forfeit(&mut self, team: TeamId) -> Option<&BattleOutcome> {
        if self.state != SessionState::Active || self.world.team(team).is_none() {
            return None;
        }
        if self.forfeited.insert(team) {
            warn!(battle_id = %self.id, %team, "team forfeited");
            self.world
                .emit(BattleEvent::new(EventKind::System, format!("{team} abandons the battle")));
        }
        self.evaluate_termination(EndReason::Abandoned);
        self.outcome.as_ref()
    }

    fn ensure_active(&self) -> Result<(), ActionRejection> {
        if self.state == SessionState::Active {
            Ok(())
        } else {
            Err(ActionRejection::SessionNotActive)
        }
    }

    fn living_entity(&self, entity_id: &EntityId) -> Result<&Entity, ActionRejection> {
        let entity = self
            .world
            .entity(entity_id)
            .ok_or_else(|| ActionRejection::UnknownEntity(entity_id.clone()))?;
        if !entity.is_alive() {
            return Err(ActionRejection::EntityDead(entity_id.clone()));
        }
        Ok(entity)
    }

    fn start_cooldown(&mut self, entity_id: &EntityId, ability: &AbilityDef) {
        if let Some(entity) = self.world.entity_mut(entity_id) {
            entity.start_cooldown(ability.name, ability.cooldown_ms);
        }
    }

    fn progress_cast(&mut self, entity_id: &EntityId, delta_ms: u64) {
        let finished = match self.world.entity_mut(entity_id) {
            Some(entity) if entity.is_alive() => match entity.cast.as_mut() {
                Some(cast) => {
                    cast.elapsed_ms = (cast.elapsed_ms + delta_ms).min(cast.total_ms);
                    cast.elapsed_ms >= cast.total_ms
                }
                None => false,
            },
            _ => false,
        };
        if !finished {
            return;
        }
        if let Some(cast) = self.world.entity_mut(entity_id).and_then(|entity| entity.cast.take()) {
            self.complete_cast(entity_id, cast);
        }
    }

    /// 시전 완료 처리. 대상이 사라진 경우의 정책은 `cast_interruption` 설정을 따른다.
    fn complete_cast(&mut self, caster: &EntityId, cast: CastState) {
        let catalog = Arc::clone(&self.catalog);
        let Some(ability) = catalog.ability(cast.ability) else {
            error!(battle_id = %self.id, ability = cast.ability, "casting ability missing from catalog");
            return;
        };

        let target = match ability.targeting {
            Targeting::Enemy | Targeting::Ally => {
                let chosen = cast.target.clone();
                match chosen {
                    Some(target) if self.world.is_alive(&target) => Some(target),
                    Some(target) if !self.config.cast_interruption => {
                        match self.retarget(&target) {
                            Some(replacement) => Some(replacement),
                            None => {
                                self.fizzle(caster, ability);
                                return;
                            }
                        }
                    }
                    _ => {
                        self.interrupt(caster, &cast);
                        return;
                    }
                }
            }
            Targeting::AllEnemies | Targeting::AllAllies => {
                let remaining = match ability.targeting {
                    Targeting::AllEnemies => self.world.living_enemies(caster),
                    _ => self.world.living_allies(caster),
                };
                if remaining.is_empty() {
                    if self.config.cast_interruption {
                        self.interrupt(caster, &cast);
                    } else {
                        self.fizzle(caster, ability);
                    }
                    return;
                }
                None
            }
            Targeting::Caster => None,
        };

        match catalog.resolve(ability.name, &mut self.world, caster, target.as_ref()) {
            Ok(()) => self.start_cooldown(caster, ability),
            Err(err) => {
                warn!(battle_id = %self.id, caster = %caster, ability = ability.name, error = %err, "cast could not resolve");
                self.interrupt(caster, &cast);
            }
        }
    }

    /// 죽은 대상과 같은 편의 첫 번째 생존자
    fn retarget(&self, fallen: &EntityId) -> Option<EntityId> {
        let team = self.world.entity(fallen)?.team;
        self.world.living_members(team).into_iter().next()
    }

    fn interrupt(&mut self, caster: &EntityId, cast: &CastState) {
        let name = self.world.name_of(caster);
        self.world.emit(
            BattleEvent::new(
                EventKind::CastCancelled,
                format!("{name}'s {} is interrupted", cast.ability),
            )
            .source(caster)
            .ability(cast.ability),
        );
    }

    fn fizzle(&mut self, caster: &EntityId, ability: &AbilityDef) {
        let name = self.world.name_of(caster);
        self.world.emit(
            BattleEvent::new(
                EventKind::System,
                format!("{name}'s {} fizzles with no target", ability.name),
            )
            .source(caster)
            .ability(ability.name),
        );
        self.start_cooldown(caster, ability);
    }

    /// 살아있는 엔티티가 남은 (기권하지 않은) 팀이 하나 이하가 되면 전투를 끝낸다.
    fn evaluate_termination(&mut self, reason: EndReason) {
        if self.state != SessionState::Active {
            return;
        }
        let standing: Vec<TeamId> = self
            .world
            .teams
            .iter()
            .map(|team| team.id)
            .filter(|team| !self.forfeited.contains(team))
            .filter(|team| !self.world.living_members(*team).is_empty())
            .collect();

        match standing.as_slice() {
            [] if self.forfeited.is_empty() => self.finish(None, EndReason::MutualElimination),
            [] => self.finish(None, EndReason::Abandoned),
            [winner] => self.finish(Some(*winner), reason),
            _ => {}
        }
    }

    fn finish(&mut self, winner: Option<TeamId>, reason: EndReason) {
        self.state = SessionState::Ended;
        let winner_player = winner
            .and_then(|team| self.world.team(team))
            .map(|team| team.player.clone());

        let message = match &winner_player {
            Some(player) => format!("{player} wins the battle"),
            None => "The battle ends in a draw".to_string(),
        };
        self.world
            .emit(BattleEvent::new(EventKind::BattleEnded, message));

        debug!(battle_id = %self.id, winner = ?winner, ?reason, duration_ms = self.world.now_ms, "battle ended");
        self.outcome = Some(BattleOutcome {
            battle_id: self.id,
            winner,
            winner_player,
            duration_ms: self.world.now_ms,
            reason,
            rosters: self.world.teams.clone(),
        });
    }
}

fn rejection_for(err: ResolveError) -> ActionRejection {
    match err {
        ResolveError::UnknownAbility(name) => ActionRejection::UnknownAbility(name),
        ResolveError::CasterUnavailable(id) => ActionRejection::EntityDead(id),
        ResolveError::MissingTarget => ActionRejection::MissingTarget,
        ResolveError::UnknownTarget(id) => ActionRejection::UnknownTarget(id),
        ResolveError::TargetDead(id) => ActionRejection::TargetDead(id),
        ResolveError::InvalidTarget(id) => ActionRejection::InvalidTarget(id),
        ResolveError::NoValidTargets => ActionRejection::NoValidTargets,
    }
}
