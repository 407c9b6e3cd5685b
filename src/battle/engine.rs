//! Battle Engine
//!
//! The authoritative round loop. Given the same rosters (in the same order),
//! the same seed and the same commands, it produces an identical log.
//!
//! Round:
//! 1. Advance the round counter.
//! 2. Order living combatants by `agility * guard + jitter`.
//! 3. Ask each living actor's decision source for a command and resolve it,
//!    re-checking the outcome after every command.
//! 4. Poison, then tick every status ledger.
//! 5. Re-check the outcome.

use tracing::{debug, info, warn};

use crate::battle::action::{Action, ActionKind, Command, DjinnMode, ItemEffect, SpecialEffect, TargetScope};
use crate::battle::config::BattleConfig;
use crate::battle::damage::{clamp_amount, roll_damage, DamageInput};
use crate::battle::decision::{DecisionContext, DecisionSources};
use crate::battle::error::BattleError;
use crate::battle::events::{BattleEvent, EventData};
use crate::battle::snapshot::Snapshot;
use crate::battle::state::{Combatant, CombatantId, Element, Outcome, Parties, Side};
use crate::battle::status::{self, StatusEffect, StatusId, PERMANENT};
use crate::core::rng::{DeterministicRng, DEFAULT_SEED};

/// Construction options.
#[derive(Clone, Debug, Default)]
pub struct EngineOptions {
    /// Textual seed; defaults to [`DEFAULT_SEED`]
    pub seed: Option<String>,
    /// Round cap applied when `run` does not give one
    pub max_rounds: Option<u32>,
    /// Rule tuning
    pub config: BattleConfig,
}

impl EngineOptions {
    /// Set the seed.
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Set the default round cap.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    /// Set the rule tuning.
    pub fn with_config(mut self, config: BattleConfig) -> Self {
        self.config = config;
        self
    }
}

/// Options for a single `run`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunOptions {
    /// Stop once this many rounds have been played in total
    pub max_rounds: Option<u32>,
}

/// How a single-target action picks its default target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Intent {
    Offensive,
    Supportive,
    Revive,
}

/// A deterministic battle between two rosters.
pub struct BattleEngine {
    seed: String,
    round: u32,
    parties: Parties,
    log: Vec<BattleEvent>,
    outcome: Outcome,
    rng: DeterministicRng,
    config: BattleConfig,
    max_rounds: Option<u32>,
}

impl BattleEngine {
    /// Create an engine. Rosters are cloned; their order is preserved.
    pub fn new(players: &[Combatant], enemies: &[Combatant], options: EngineOptions) -> Self {
        let seed = options.seed.unwrap_or_else(|| DEFAULT_SEED.to_string());
        let rng = DeterministicRng::from_seed_str(&seed);

        Self {
            seed,
            round: 0,
            parties: Parties::new(players, enemies),
            log: Vec::new(),
            outcome: Outcome::InProgress,
            rng,
            config: options.config,
            max_rounds: options.max_rounds,
        }
    }

    /// Current round (0 before the first round).
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Current outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Log so far.
    pub fn log(&self) -> &[BattleEvent] {
        &self.log
    }

    /// Independent copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            seed: self.seed.clone(),
            round: self.round,
            parties: self.parties.clone(),
            log: self.log.clone(),
            outcome: self.outcome,
        }
    }

    /// Play rounds until the battle ends or the round cap is reached.
    ///
    /// Without a cap from either `options` or construction this only
    /// returns once the battle ends.
    pub fn run(&mut self, mut sources: DecisionSources<'_>, options: RunOptions) -> Result<Snapshot, BattleError> {
        let cap = options.max_rounds.or(self.max_rounds);
        self.evaluate_outcome();

        while !self.outcome.is_terminal() {
            if cap.is_some_and(|cap| self.round >= cap) {
                debug!(round = self.round, "round cap reached");
                break;
            }
            self.run_round(&mut sources)?;
        }

        Ok(self.snapshot())
    }

    /// Play a single round and return the resulting snapshot.
    pub fn run_round(&mut self, sources: &mut DecisionSources<'_>) -> Result<Snapshot, BattleError> {
        if self.outcome.is_terminal() {
            return Ok(self.snapshot());
        }

        self.round += 1;
        debug!(round = self.round, "round start");

        let order = self.turn_order();
        self.push(BattleEvent::turn_order(self.round, order.clone()));

        for actor_id in &order {
            let Some(actor) = self.parties.get(actor_id) else { continue };
            if !actor.is_alive() {
                continue;
            }
            // Every living actor needs a source, even one that cannot act
            if !sources.contains_key(actor_id) {
                return Err(BattleError::MissingDecisionSource { actor: actor_id.clone() });
            }
            if actor.has_status(StatusId::Stun) {
                let text = format!("{} is stunned and cannot act", actor.name);
                self.push_message(text);
                continue;
            }

            let command = self.request_command(actor_id, sources)?;
            self.resolve(actor_id, &command)?;

            self.evaluate_outcome();
            if self.outcome.is_terminal() {
                break;
            }
        }

        if !self.outcome.is_terminal() {
            self.end_of_round();
            self.evaluate_outcome();
        }

        Ok(self.snapshot())
    }

    // =========================================================================
    // TURN ORDER
    // =========================================================================

    /// Living combatants sorted by descending priority.
    ///
    /// Draws one jitter value per living combatant in storage order
    /// (players, then enemies) before sorting.
    fn turn_order(&mut self) -> Vec<CombatantId> {
        let jitter = self.config.turn_jitter;
        let mut scored: Vec<(CombatantId, f64)> = Vec::new();

        for combatant in self.parties.players.iter().chain(self.parties.enemies.iter()) {
            if !combatant.is_alive() {
                continue;
            }
            let score = combatant.stats.agility as f64 * combatant.guard_multiplier()
                + self.rng.next_f64() * jitter;
            scored.push((combatant.id.clone(), score));
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.into_iter().map(|(id, _)| id).collect()
    }

    fn request_command(&mut self, actor_id: &CombatantId, sources: &mut DecisionSources<'_>) -> Result<Command, BattleError> {
        let actor = self
            .parties
            .get(actor_id)
            .cloned()
            .ok_or_else(|| BattleError::MissingDecisionSource { actor: actor_id.clone() })?;

        let source = sources
            .get_mut(actor_id)
            .ok_or_else(|| BattleError::MissingDecisionSource { actor: actor_id.clone() })?;

        let allies: Vec<Combatant> = self.parties.living(actor.side).cloned().collect();
        let enemies: Vec<Combatant> = self.parties.living(actor.side.opposite()).cloned().collect();

        let mut ctx = DecisionContext::new(actor, allies, enemies, self.round, &self.log, &mut self.rng);
        let command = source.choose_action(&mut ctx)?;

        if &command.actor != actor_id {
            return Err(BattleError::UnknownActor {
                actor: actor_id.clone(),
                commanded: command.actor,
            });
        }
        Ok(command)
    }

    // =========================================================================
    // RESOLUTION
    // =========================================================================

    fn resolve(&mut self, actor_id: &CombatantId, command: &Command) -> Result<(), BattleError> {
        let actor = self
            .parties
            .get(actor_id)
            .ok_or_else(|| BattleError::MissingDecisionSource { actor: actor_id.clone() })?;
        let action = actor
            .action(&command.action_id)
            .cloned()
            .ok_or_else(|| BattleError::UnknownAction {
                actor: actor_id.clone(),
                action_id: command.action_id.clone(),
            })?;
        let actor_name = actor.name.clone();
        let actor_element = actor.stats.element;

        debug!(
            round = self.round,
            actor = %actor_id,
            action = %action.id,
            category = action.kind.category(),
            "resolving command"
        );
        self.push(BattleEvent::action_started(self.round, actor_id.clone(), &action.id, &action.name));

        let target = command.target.as_ref();
        match action.kind {
            ActionKind::Attack => {
                let targets = self.resolve_targets(actor_id, &action, target, Intent::Offensive);
                self.strike(actor_id, &targets, actor_element, 1.0, false);
            }

            ActionKind::Special { element, cost, power, effect } => {
                let Some(actor) = self.parties.get_mut(actor_id) else { return Ok(()) };
                if !actor.spend_pp(cost) {
                    let text = format!("{} does not have enough PP for {}", actor_name, action.name);
                    self.soft_fail(text);
                    return Ok(());
                }
                let remaining = actor.stats.pp;
                self.push(BattleEvent::resource_delta(self.round, actor_id.clone(), -(cost as i64), remaining));

                match effect {
                    Some(SpecialEffect::Heal) => {
                        let targets = self.resolve_targets(actor_id, &action, target, Intent::Supportive);
                        let attack = self.parties.get(actor_id).map_or(0, |a| a.stats.attack);
                        let amount = (power * self.config.heal_power_factor
                            + attack as f64 * self.config.heal_attack_factor)
                            .round();
                        self.restore(actor_id, &targets, amount);
                    }
                    Some(SpecialEffect::Cleanse) => {
                        let targets = self.resolve_targets(actor_id, &action, target, Intent::Supportive);
                        self.cleanse(&targets);
                    }
                    Some(SpecialEffect::Afflict(status_id)) => {
                        let targets = self.resolve_targets(actor_id, &action, target, Intent::Offensive);
                        self.strike(actor_id, &targets, element, power, false);
                        let duration = self.config.affliction_duration;
                        for target_id in &targets {
                            self.apply_status(target_id, StatusEffect::new(status_id, duration), true);
                        }
                    }
                    Some(SpecialEffect::Buff) | None => {
                        let targets = self.resolve_targets(actor_id, &action, target, Intent::Offensive);
                        self.strike(actor_id, &targets, element, power, false);
                    }
                }
            }

            ActionKind::Djinn { mode: DjinnMode::Ready, power, .. } => {
                let effect = StatusEffect::new(StatusId::DjinnSet, self.config.djinn_set_duration).with_potency(power);
                self.apply_status(actor_id, effect, false);
            }

            ActionKind::Djinn { element, mode: DjinnMode::Release, power } => {
                let banked = self
                    .parties
                    .get(actor_id)
                    .and_then(|a| a.status(StatusId::DjinnSet))
                    .map(|s| s.potency.unwrap_or(0.0));
                let Some(banked) = banked else {
                    let text = format!("{} has no djinn set to release", actor_name);
                    self.soft_fail(text);
                    return Ok(());
                };

                self.recover_djinn(actor_id);
                let targets = self.resolve_targets(actor_id, &action, target, Intent::Offensive);
                self.strike(actor_id, &targets, element, power + banked, false);
            }

            ActionKind::Summon { element, power, required } => {
                let side = self.parties.get(actor_id).map_or(Side::Ally, |a| a.side);
                let ready: Vec<CombatantId> = self
                    .parties
                    .living(side)
                    .filter(|c| c.has_status(StatusId::DjinnSet))
                    .map(|c| c.id.clone())
                    .collect();
                if ready.len() < required as usize {
                    let text = format!(
                        "{} needs {} set djinn for {} but only {} are ready",
                        actor_name,
                        required,
                        action.name,
                        ready.len()
                    );
                    self.soft_fail(text);
                    return Ok(());
                }

                for ally in ready.iter().take(required as usize) {
                    self.recover_djinn(ally);
                }
                let targets = self.resolve_targets(actor_id, &action, target, Intent::Offensive);
                self.strike(actor_id, &targets, element, power, true);
            }

            ActionKind::Item { effect: ItemEffect::Heal, power } => {
                let targets = self.resolve_targets(actor_id, &action, target, Intent::Supportive);
                self.restore(actor_id, &targets, power.round());
            }

            ActionKind::Item { effect: ItemEffect::Revive, power } => {
                let targets = self.resolve_targets(actor_id, &action, target, Intent::Revive);
                self.revive(actor_id, &targets, power.round());
            }

            ActionKind::Item { effect: ItemEffect::Cleanse, .. } => {
                let targets = self.resolve_targets(actor_id, &action, target, Intent::Supportive);
                self.cleanse(&targets);
            }

            ActionKind::Defend { guard } => {
                let effect = StatusEffect::new(StatusId::Guarding, self.config.guard_duration).with_potency(guard);
                self.apply_status(actor_id, effect, false);
            }

            ActionKind::Flee => self.attempt_flee(actor_id, &actor_name),
        }

        Ok(())
    }

    /// Pick the targets an action lands on.
    ///
    /// A dead explicit target is swapped for the first living member of its
    /// side (except for revives). Unknown target ids fall back to the implied
    /// target.
    fn resolve_targets(
        &self,
        actor_id: &CombatantId,
        action: &Action,
        explicit: Option<&CombatantId>,
        intent: Intent,
    ) -> Vec<CombatantId> {
        let Some(actor) = self.parties.get(actor_id) else { return Vec::new() };
        let allied = actor.side;
        let opposing = actor.side.opposite();

        let single = |wanted: Option<&CombatantId>| -> Vec<CombatantId> {
            if let Some(found) = wanted.and_then(|id| self.parties.get(id)) {
                if found.is_alive() || intent == Intent::Revive {
                    return vec![found.id.clone()];
                }
                return self
                    .parties
                    .living(found.side)
                    .next()
                    .map(|c| vec![c.id.clone()])
                    .unwrap_or_default();
            }
            match intent {
                Intent::Offensive => self
                    .parties
                    .living(opposing)
                    .next()
                    .map(|c| vec![c.id.clone()])
                    .unwrap_or_default(),
                Intent::Supportive => vec![actor.id.clone()],
                Intent::Revive => self
                    .parties
                    .roster(allied)
                    .iter()
                    .find(|c| !c.is_alive())
                    .map(|c| vec![c.id.clone()])
                    .unwrap_or_else(|| vec![actor.id.clone()]),
            }
        };

        let side_members = |side: Side| -> Vec<CombatantId> {
            self.parties
                .roster(side)
                .iter()
                .filter(|c| c.is_alive() || intent == Intent::Revive)
                .map(|c| c.id.clone())
                .collect()
        };

        match &action.target {
            TargetScope::Single => single(explicit),
            TargetScope::Id(id) => single(Some(id)),
            TargetScope::AllAllies => side_members(allied),
            TargetScope::AllEnemies => side_members(opposing),
            TargetScope::All => {
                let mut all = side_members(Side::Ally);
                all.extend(side_members(Side::Enemy));
                all
            }
        }
    }

    /// Deal damage to every living target.
    fn strike(&mut self, actor_id: &CombatantId, targets: &[CombatantId], element: Element, power: f64, ultimate: bool) {
        let Some(actor) = self.parties.get(actor_id) else { return };
        let attack = actor.stats.attack;
        let luck = actor.stats.luck;

        for target_id in targets {
            let Some(target) = self.parties.get(target_id) else { continue };
            if !target.is_alive() {
                continue;
            }
            let input = DamageInput {
                attack,
                power,
                defense: target.stats.defense,
                luck,
                element,
                defender_element: target.stats.element,
                guard: target.guard_multiplier(),
                ultimate,
            };
            let roll = roll_damage(&input, &mut self.rng, &self.config);
            self.deal_damage(Some(actor_id), target_id, roll.amount, element, roll.multiplier, roll.critical);
        }
    }

    /// Subtract health, log it, and down the target at zero.
    fn deal_damage(
        &mut self,
        source: Option<&CombatantId>,
        target_id: &CombatantId,
        amount: u32,
        element: Element,
        multiplier: f64,
        critical: bool,
    ) {
        let Some(target) = self.parties.get_mut(target_id) else { return };
        target.take_damage(amount);
        let remaining = target.stats.hp;

        self.push(BattleEvent::new(
            self.round,
            EventData::Damage {
                source: source.cloned(),
                target: target_id.clone(),
                amount,
                element,
                multiplier,
                critical,
                remaining,
            },
        ));

        if remaining == 0 {
            let already_down = self
                .parties
                .get(target_id)
                .is_some_and(|t| t.has_status(StatusId::Downed));
            if !already_down {
                self.apply_status(target_id, StatusEffect::new(StatusId::Downed, PERMANENT), false);
            }
        }
    }

    /// Restore health to every living target.
    fn restore(&mut self, source: &CombatantId, targets: &[CombatantId], amount: f64) {
        let amount = if amount <= 0.0 { 0 } else { clamp_amount(amount) };
        for target_id in targets {
            let Some(target) = self.parties.get_mut(target_id) else { continue };
            if !target.is_alive() {
                continue;
            }
            let healed = target.heal(amount);
            let remaining = target.stats.hp;
            self.push(BattleEvent::new(
                self.round,
                EventData::Heal {
                    source: source.clone(),
                    target: target_id.clone(),
                    amount: healed,
                    remaining,
                },
            ));
        }
    }

    /// Bring downed targets back.
    fn revive(&mut self, source: &CombatantId, targets: &[CombatantId], power: f64) {
        for target_id in targets {
            let Some(target) = self.parties.get_mut(target_id) else { continue };
            if target.is_alive() {
                let text = format!("{} is not down; the revive has no effect", target.name);
                self.soft_fail(text);
                continue;
            }
            let hp = if power <= 0.0 { 1 } else { clamp_amount(power) };
            target.stats.hp = hp.min(target.stats.max_hp);
            target.remove_status(StatusId::Downed);
            let remaining = target.stats.hp;

            self.push(BattleEvent::status_removed(self.round, target_id.clone(), vec![StatusId::Downed]));
            self.push(BattleEvent::new(
                self.round,
                EventData::Heal {
                    source: source.clone(),
                    target: target_id.clone(),
                    amount: remaining,
                    remaining,
                },
            ));
        }
    }

    /// Strip poison and stun; one removal event per target.
    fn cleanse(&mut self, targets: &[CombatantId]) {
        for target_id in targets {
            let Some(target) = self.parties.get_mut(target_id) else { continue };
            let mut removed = Vec::new();
            for id in [StatusId::Poison, StatusId::Stun] {
                if target.remove_status(id) {
                    removed.push(id);
                }
            }
            self.push(BattleEvent::status_removed(self.round, target_id.clone(), removed));
        }
    }

    /// Move a set djinn to recovery.
    fn recover_djinn(&mut self, combatant_id: &CombatantId) {
        let Some(combatant) = self.parties.get_mut(combatant_id) else { return };
        combatant.remove_status(StatusId::DjinnSet);
        self.push(BattleEvent::status_removed(self.round, combatant_id.clone(), vec![StatusId::DjinnSet]));

        let recovery = StatusEffect::new(StatusId::DjinnRecovery, self.config.djinn_recovery_duration);
        self.apply_status(combatant_id, recovery, false);
    }

    /// Apply a status and log it. `living_only` skips downed targets.
    fn apply_status(&mut self, target_id: &CombatantId, effect: StatusEffect, living_only: bool) {
        let Some(target) = self.parties.get_mut(target_id) else { return };
        if living_only && !target.is_alive() {
            return;
        }
        let status_id = effect.id;
        target.apply_status(effect);
        let duration = target
            .statuses
            .iter()
            .find(|s| s.id == status_id)
            .map_or(0, |s| s.duration);
        self.push(BattleEvent::status_applied(self.round, target_id.clone(), status_id, duration));
    }

    fn attempt_flee(&mut self, actor_id: &CombatantId, actor_name: &str) {
        let Some(actor) = self.parties.get(actor_id) else { return };
        let side = actor.side;
        let agility = actor.stats.agility as f64;

        let enemies: Vec<f64> = self
            .parties
            .living(side.opposite())
            .map(|c| c.stats.agility as f64)
            .collect();
        let average = if enemies.is_empty() {
            0.0
        } else {
            enemies.iter().sum::<f64>() / enemies.len() as f64
        };

        let chance = (self.config.flee_base + (agility - average) / self.config.flee_agility_divisor)
            .clamp(self.config.flee_min, self.config.flee_max);
        let roll = self.rng.next_f64();

        if roll < chance {
            self.outcome = Outcome::Fled { side };
            info!(round = self.round, ?side, "side fled");
            self.push_message(format!("{} fled the battle", actor_name));
        } else {
            self.soft_fail(format!("{} tried to flee but could not escape", actor_name));
        }
    }

    // =========================================================================
    // ROUND END / OUTCOME
    // =========================================================================

    fn end_of_round(&mut self) {
        let divisor = self.config.poison_divisor.max(1);
        let poisoned: Vec<(CombatantId, u32)> = self
            .parties
            .iter()
            .filter(|c| c.is_alive() && c.has_status(StatusId::Poison))
            .map(|c| (c.id.clone(), (c.stats.max_hp / divisor).max(1)))
            .collect();
        for (id, amount) in poisoned {
            self.deal_damage(None, &id, amount, Element::Neutral, 1.0, false);
        }

        for combatant in self.parties.iter_mut() {
            status::tick(&mut combatant.statuses);
        }
    }

    /// Victory for a side as soon as the other has nobody standing.
    /// Never recomputed once terminal.
    ///
    /// Enemies are checked first, so if both sides are empty at once (empty
    /// rosters, or poison downing the last of each side) the allies win.
    fn evaluate_outcome(&mut self) {
        if self.outcome.is_terminal() {
            return;
        }
        let winner = if self.parties.living_count(Side::Enemy) == 0 {
            Some(Side::Ally)
        } else if self.parties.living_count(Side::Ally) == 0 {
            Some(Side::Enemy)
        } else {
            None
        };
        if let Some(side) = winner {
            self.outcome = Outcome::Victory { side };
            info!(round = self.round, ?side, "battle won");
        }
    }

    // =========================================================================
    // LOG
    // =========================================================================

    fn push(&mut self, event: BattleEvent) {
        self.log.push(event);
    }

    fn push_message(&mut self, text: String) {
        self.push(BattleEvent::message(self.round, text));
    }

    fn soft_fail(&mut self, text: String) {
        warn!(round = self.round, "{}", text);
        self.push_message(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::decision::{
        DecisionSource, HeuristicDecisions, QueuedDecisions, RecordingDecisions, ScriptedDecisions,
    };
    use crate::battle::state::Stats;
    use proptest::prelude::*;

    fn fighter(id: &str, agility: u32) -> Combatant {
        Combatant::new(
            id,
            id,
            Side::Ally,
            Stats::new(100, 20, 10, 5, agility, 0),
            vec![Action::attack(), Action::defend(0.5)],
        )
    }

    fn engine(players: &[Combatant], enemies: &[Combatant]) -> BattleEngine {
        BattleEngine::new(players, enemies, EngineOptions::default().with_seed("engine-test"))
    }

    #[test]
    fn test_turn_order_draws_once_per_living_combatant() {
        let mut down = fighter("down", 50);
        down.stats.hp = 0;
        let mut battle = engine(&[fighter("a", 10), down], &[fighter("b", 20)]);

        let order = battle.turn_order();
        assert_eq!(order.len(), 2);
        assert_eq!(battle.rng.draws(), 2);
    }

    #[test]
    fn test_turn_order_prefers_agility() {
        let mut battle = engine(&[fighter("slow", 10)], &[fighter("fast", 100)]);
        let order = battle.turn_order();
        assert_eq!(order, vec![CombatantId::from("fast"), CombatantId::from("slow")]);
    }

    #[test]
    fn test_guard_scales_turn_priority() {
        let mut guarded = fighter("guarded", 100);
        guarded.apply_status(StatusEffect::new(StatusId::Guarding, 1).with_potency(0.01));
        let mut battle = engine(&[guarded], &[fighter("open", 50)]);

        let order = battle.turn_order();
        assert_eq!(order[0], CombatantId::from("open"));
    }

    #[test]
    fn test_dead_explicit_target_is_retargeted() {
        let mut fallen = fighter("fallen", 10);
        fallen.stats.hp = 0;
        let battle = engine(&[fighter("hero", 10)], &[fallen, fighter("standing", 10)]);

        let targets = battle.resolve_targets(
            &CombatantId::from("hero"),
            &Action::attack(),
            Some(&CombatantId::from("fallen")),
            Intent::Offensive,
        );
        assert_eq!(targets, vec![CombatantId::from("standing")]);
    }

    #[test]
    fn test_implied_targets() {
        let battle = engine(&[fighter("hero", 10), fighter("friend", 10)], &[fighter("foe", 10)]);
        let hero = CombatantId::from("hero");

        let offensive = battle.resolve_targets(&hero, &Action::attack(), None, Intent::Offensive);
        assert_eq!(offensive, vec![CombatantId::from("foe")]);

        let supportive = battle.resolve_targets(&hero, &Action::defend(0.5), None, Intent::Supportive);
        assert_eq!(supportive, vec![hero.clone()]);

        let everyone = Action::new("nova", "Nova", ActionKind::Attack, TargetScope::All);
        let all = battle.resolve_targets(&hero, &everyone, None, Intent::Offensive);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2], CombatantId::from("foe"));
    }

    #[test]
    fn test_round_end_ticks_statuses() {
        let mut battle = engine(&[fighter("hero", 10)], &[fighter("foe", 10)]);
        let mut sources: DecisionSources<'_> = DecisionSources::new();
        sources.insert(CombatantId::from("hero"), Box::new(ScriptedDecisions::repeat("defend")));
        sources.insert(CombatantId::from("foe"), Box::new(ScriptedDecisions::repeat("defend")));

        let snapshot = battle.run_round(&mut sources).unwrap();
        assert_eq!(snapshot.round, 1);
        // Guard lasts one round and is gone after the tick
        assert!(snapshot.parties.iter().all(|c| !c.has_status(StatusId::Guarding)));
        let applied = snapshot
            .log
            .iter()
            .filter(|e| matches!(e.data, EventData::StatusApplied { status: StatusId::Guarding, .. }))
            .count();
        assert_eq!(applied, 2);
    }

    #[test]
    fn test_terminal_outcome_is_never_recomputed() {
        let mut battle = engine(&[fighter("hero", 10)], &[fighter("foe", 10)]);
        battle.outcome = Outcome::Fled { side: Side::Enemy };
        battle.parties.enemies[0].stats.hp = 0;
        battle.evaluate_outcome();
        assert_eq!(battle.outcome(), Outcome::Fled { side: Side::Enemy });
    }

    // =========================================================================
    // BATTLE SCENARIOS
    // =========================================================================

    fn script(steps: &[&str]) -> Box<dyn DecisionSource> {
        Box::new(ScriptedDecisions::new(steps.iter().map(|s| (s.to_string(), None)).collect()))
    }

    fn script_at(steps: &[(&str, &str)]) -> Box<dyn DecisionSource> {
        Box::new(ScriptedDecisions::new(
            steps
                .iter()
                .map(|(action, target)| (action.to_string(), Some(CombatantId::from(*target))))
                .collect(),
        ))
    }

    fn queue(queue: QueuedDecisions) -> Box<dyn DecisionSource> {
        Box::new(queue)
    }

    fn sources(entries: Vec<(&str, Box<dyn DecisionSource>)>) -> DecisionSources<'static> {
        entries.into_iter().map(|(id, source)| (CombatantId::from(id), source)).collect()
    }

    fn rounds(n: u32) -> RunOptions {
        RunOptions { max_rounds: Some(n) }
    }

    fn messages(snapshot: &Snapshot) -> Vec<&str> {
        snapshot
            .log
            .iter()
            .filter_map(|e| match &e.data {
                EventData::Message { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn hero(id: &str, actions: Vec<Action>) -> Combatant {
        Combatant::new(id, id, Side::Ally, Stats::new(100, 20, 20, 5, 10, 0).with_element(Element::Venus), actions)
    }

    fn dummy() -> Combatant {
        Combatant::new("dummy", "Dummy", Side::Enemy, Stats::new(160, 0, 5, 0, 5, 0), vec![Action::defend(1.0)])
    }

    fn djinn(id: &str, mode: DjinnMode, power: f64) -> Action {
        Action::new(id, id, ActionKind::Djinn { element: Element::Venus, mode, power }, TargetScope::Single)
    }

    fn judgment() -> Action {
        Action::new(
            "judgment",
            "Judgment",
            ActionKind::Summon { element: Element::Venus, power: 2.0, required: 2 },
            TargetScope::AllEnemies,
        )
    }

    fn damage_from(snapshot: &Snapshot, source: &str, round: u32) -> Vec<u32> {
        snapshot
            .log
            .iter()
            .filter(|e| e.round == round)
            .filter_map(|e| match &e.data {
                EventData::Damage { source: Some(s), amount, .. } if s.as_str() == source => Some(*amount),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_one_hp_target_falls_within_the_action() {
        let mut slime = Combatant::new("slime", "Slime", Side::Enemy, Stats::new(30, 0, 5, 0, 5, 0), vec![Action::defend(1.0)]);
        slime.stats.hp = 1;
        let mut battle = engine(&[hero("isaac", vec![Action::attack()])], &[slime]);

        let snapshot = battle
            .run(sources(vec![("isaac", script(&["attack"])), ("slime", script(&["defend"]))]), rounds(5))
            .unwrap();

        assert_eq!(snapshot.outcome, Outcome::Victory { side: Side::Ally });
        assert_eq!(snapshot.round, 1);
        let slime = snapshot.combatant("slime").unwrap();
        assert_eq!(slime.stats.hp, 0);
        assert!(slime.has_status(StatusId::Downed));

        // Nothing is logged after the killing blow
        let n = snapshot.log.len();
        assert!(matches!(
            snapshot.log[n - 1].data,
            EventData::StatusApplied { status: StatusId::Downed, .. }
        ));
        assert!(matches!(snapshot.log[n - 2].data, EventData::Damage { remaining: 0, .. }));
    }

    #[test]
    fn test_insufficient_pp_is_a_message() {
        let psy = Action::new(
            "ragnarok",
            "Ragnarok",
            ActionKind::Special { element: Element::Venus, cost: 10, power: 2.0, effect: None },
            TargetScope::Single,
        );
        let mut isaac = hero("isaac", vec![psy]);
        isaac.stats.pp = 0;
        let mut battle = engine(&[isaac], &[dummy()]);

        let snapshot = battle
            .run(sources(vec![("isaac", script(&["ragnarok"])), ("dummy", script(&["defend"]))]), rounds(1))
            .unwrap();

        assert_eq!(snapshot.combatant("isaac").unwrap().stats.pp, 0);
        assert_eq!(snapshot.combatant("dummy").unwrap().stats.hp, 160);
        assert!(messages(&snapshot).iter().any(|m| m.contains("not have enough PP")));
        assert!(!snapshot.log.iter().any(|e| matches!(e.data, EventData::ResourceDelta { .. })));
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let mut battle = engine(&[hero("isaac", vec![Action::attack()])], &[dummy()]);
        let err = battle.run(sources(vec![("isaac", script(&["attack"]))]), rounds(1)).unwrap_err();
        assert!(matches!(err, BattleError::MissingDecisionSource { actor } if actor.as_str() == "dummy"));
    }

    #[test]
    fn test_unknown_action_is_fatal() {
        let mut battle = engine(&[hero("isaac", vec![Action::attack()])], &[dummy()]);
        let err = battle
            .run(sources(vec![("isaac", script(&["meteor"])), ("dummy", script(&["defend"]))]), rounds(1))
            .unwrap_err();
        assert!(matches!(err, BattleError::UnknownAction { action_id, .. } if action_id == "meteor"));
    }

    #[test]
    fn test_command_for_wrong_actor_is_fatal() {
        let mut battle = engine(&[hero("isaac", vec![Action::attack()])], &[dummy()]);
        let forged = QueuedDecisions::from_commands([Command::new("dummy", "defend")]);
        let err = battle
            .run(sources(vec![("isaac", queue(forged)), ("dummy", script(&["defend"]))]), rounds(1))
            .unwrap_err();
        assert!(matches!(err, BattleError::UnknownActor { .. }));
    }

    #[test]
    fn test_empty_queue_is_fatal() {
        let mut battle = engine(&[hero("isaac", vec![Action::attack()])], &[dummy()]);
        let err = battle
            .run(
                sources(vec![("isaac", queue(QueuedDecisions::new())), ("dummy", script(&["defend"]))]),
                rounds(1),
            )
            .unwrap_err();
        assert!(matches!(err, BattleError::EmptyQueue { .. }));
    }

    #[test]
    fn test_flee_success_ends_battle() {
        let config = BattleConfig { flee_min: 1.0, flee_max: 1.0, ..BattleConfig::default() };
        let options = EngineOptions::default().with_seed("flee").with_config(config);
        let mut battle = BattleEngine::new(&[hero("isaac", vec![Action::flee()])], &[dummy()], options);

        let snapshot = battle
            .run(sources(vec![("isaac", script(&["flee"])), ("dummy", script(&["defend"]))]), rounds(10))
            .unwrap();

        assert_eq!(snapshot.outcome, Outcome::Fled { side: Side::Ally });
        assert_eq!(snapshot.round, 1);
        assert!(messages(&snapshot).iter().any(|m| m.contains("fled")));
    }

    #[test]
    fn test_failed_flee_is_a_message() {
        let config = BattleConfig { flee_min: 0.0, flee_max: 0.0, ..BattleConfig::default() };
        let options = EngineOptions::default().with_seed("flee").with_config(config);
        let mut battle = BattleEngine::new(&[hero("isaac", vec![Action::flee()])], &[dummy()], options);

        let snapshot = battle
            .run(sources(vec![("isaac", script(&["flee"])), ("dummy", script(&["defend"]))]), rounds(3))
            .unwrap();

        assert_eq!(snapshot.outcome, Outcome::InProgress);
        let failures = messages(&snapshot).iter().filter(|m| m.contains("could not escape")).count();
        assert_eq!(failures, 3);
    }

    #[test]
    fn test_djinn_ready_then_release() {
        let isaac = hero(
            "isaac",
            vec![djinn("flint-set", DjinnMode::Ready, 0.6), djinn("flint", DjinnMode::Release, 1.0)],
        );
        let mut battle = engine(&[isaac], &[dummy()]);
        let mut sources = sources(vec![("isaac", script(&["flint-set", "flint"])), ("dummy", script(&["defend"]))]);

        let first = battle.run_round(&mut sources).unwrap();
        let set = first.combatant("isaac").unwrap().status(StatusId::DjinnSet).unwrap();
        assert_eq!(set.potency, Some(0.6));

        let second = battle.run_round(&mut sources).unwrap();
        let isaac = second.combatant("isaac").unwrap();
        assert!(!isaac.has_status(StatusId::DjinnSet));
        assert!(isaac.has_status(StatusId::DjinnRecovery));

        // 20 * (1.0 + 0.6) = 32 before variance
        let hits = damage_from(&second, "isaac", 2);
        assert_eq!(hits.len(), 1);
        assert!((28..=36).contains(&hits[0]), "{}", hits[0]);
    }

    #[test]
    fn test_release_without_set_djinn_is_a_message() {
        let isaac = hero("isaac", vec![djinn("flint", DjinnMode::Release, 1.0)]);
        let mut battle = engine(&[isaac], &[dummy()]);

        let snapshot = battle
            .run(sources(vec![("isaac", script(&["flint"])), ("dummy", script(&["defend"]))]), rounds(1))
            .unwrap();

        assert!(messages(&snapshot).iter().any(|m| m.contains("no djinn set")));
        assert!(damage_from(&snapshot, "isaac", 1).is_empty());
    }

    #[test]
    fn test_summon_consumes_set_djinn() {
        let isaac = hero("isaac", vec![djinn("flint-set", DjinnMode::Ready, 0.6), judgment()]);
        let garet = hero("garet", vec![djinn("forge-set", DjinnMode::Ready, 0.6), Action::defend(0.5)]);
        let mut battle = engine(&[isaac, garet], &[dummy()]);

        let snapshot = battle
            .run(
                sources(vec![
                    ("isaac", script(&["flint-set", "judgment"])),
                    ("garet", script(&["forge-set", "defend"])),
                    ("dummy", script(&["defend"])),
                ]),
                rounds(2),
            )
            .unwrap();

        for id in ["isaac", "garet"] {
            let c = snapshot.combatant(id).unwrap();
            assert!(!c.has_status(StatusId::DjinnSet), "{id} still has a set djinn");
            assert!(c.has_status(StatusId::DjinnRecovery));
        }
        assert_eq!(damage_from(&snapshot, "isaac", 2).len(), 1);
    }

    #[test]
    fn test_summon_without_enough_djinn_is_a_message() {
        let isaac = hero("isaac", vec![djinn("flint-set", DjinnMode::Ready, 0.6), judgment()]);
        let mut battle = engine(&[isaac], &[dummy()]);

        let snapshot = battle
            .run(
                sources(vec![("isaac", script(&["flint-set", "judgment"])), ("dummy", script(&["defend"]))]),
                rounds(2),
            )
            .unwrap();

        assert!(messages(&snapshot).iter().any(|m| m.contains("needs 2 set djinn")));
        assert!(snapshot.combatant("isaac").unwrap().has_status(StatusId::DjinnSet));
        assert!(damage_from(&snapshot, "isaac", 2).is_empty());
    }

    #[test]
    fn test_healing_special() {
        let ply = Action::new(
            "ply",
            "Ply",
            ActionKind::Special { element: Element::Mercury, cost: 4, power: 30.0, effect: Some(SpecialEffect::Heal) },
            TargetScope::Single,
        );
        let mut mia = Combatant::new("mia", "Mia", Side::Ally, Stats::new(100, 20, 10, 5, 10, 0), vec![ply]);
        mia.stats.hp = 50;
        let mut battle = engine(&[mia], &[dummy()]);

        let snapshot = battle
            .run(sources(vec![("mia", script(&["ply"])), ("dummy", script(&["defend"]))]), rounds(1))
            .unwrap();

        // round(30 * 1.1 + 10 * 0.2) = 35
        let mia = snapshot.combatant("mia").unwrap();
        assert_eq!(mia.stats.hp, 85);
        assert_eq!(mia.stats.pp, 16);
        assert!(snapshot.log.iter().any(|e| matches!(e.data, EventData::ResourceDelta { delta: -4, remaining: 16, .. })));
        assert!(snapshot.log.iter().any(|e| matches!(e.data, EventData::Heal { amount: 35, .. })));
    }

    #[test]
    fn test_revive_item() {
        let water = Action::new(
            "water",
            "Water of Life",
            ActionKind::Item { effect: ItemEffect::Revive, power: 40.0 },
            TargetScope::Single,
        );
        let mia = hero("mia", vec![water]);
        let mut garet = hero("garet", vec![Action::attack()]);
        garet.stats.hp = 0;
        garet.apply_status(StatusEffect::new(StatusId::Downed, PERMANENT));
        let mut battle = engine(&[mia, garet], &[dummy()]);

        let mut sources = sources(vec![("mia", script_at(&[("water", "garet")])), ("dummy", script(&["defend"]))]);
        let snapshot = battle.run_round(&mut sources).unwrap();

        let garet = snapshot.combatant("garet").unwrap();
        assert_eq!(garet.stats.hp, 40);
        assert!(!garet.has_status(StatusId::Downed));
        assert!(garet.is_alive());
    }

    #[test]
    fn test_revive_on_living_target_is_a_message() {
        let water = Action::new(
            "water",
            "Water of Life",
            ActionKind::Item { effect: ItemEffect::Revive, power: 40.0 },
            TargetScope::Single,
        );
        let mut battle = engine(&[hero("mia", vec![water])], &[dummy()]);

        let snapshot = battle
            .run(sources(vec![("mia", script_at(&[("water", "mia")])), ("dummy", script(&["defend"]))]), rounds(1))
            .unwrap();

        assert!(messages(&snapshot).iter().any(|m| m.contains("not down")));
        assert_eq!(snapshot.combatant("mia").unwrap().stats.hp, 100);
    }

    #[test]
    fn test_cleanse_item() {
        let herb = Action::new(
            "antidote",
            "Antidote",
            ActionKind::Item { effect: ItemEffect::Cleanse, power: 0.0 },
            TargetScope::Single,
        );
        let mut mia = hero("mia", vec![herb]);
        mia.apply_status(StatusEffect::new(StatusId::Poison, 3));
        let mut battle = engine(&[mia], &[dummy()]);

        let snapshot = battle
            .run(sources(vec![("mia", script(&["antidote"])), ("dummy", script(&["defend"]))]), rounds(1))
            .unwrap();

        let mia = snapshot.combatant("mia").unwrap();
        assert!(!mia.has_status(StatusId::Poison));
        assert_eq!(mia.stats.hp, 100);
        assert!(snapshot.log.iter().any(|e| matches!(
            &e.data,
            EventData::StatusRemoved { statuses, .. } if statuses == &vec![StatusId::Poison]
        )));
    }

    #[test]
    fn test_poison_hurts_at_round_end() {
        let mut target = dummy();
        target.apply_status(StatusEffect::new(StatusId::Poison, 3));
        let mut battle = engine(&[hero("isaac", vec![Action::defend(0.5)])], &[target]);

        let snapshot = battle
            .run(sources(vec![("isaac", script(&["defend"])), ("dummy", script(&["defend"]))]), rounds(1))
            .unwrap();

        // 160 / 16
        let dummy = snapshot.combatant("dummy").unwrap();
        assert_eq!(dummy.stats.hp, 150);
        assert_eq!(dummy.status(StatusId::Poison).map(|s| s.duration), Some(2));
        assert!(snapshot.log.iter().any(|e| matches!(
            &e.data,
            EventData::Damage { source: None, amount: 10, .. }
        )));
    }

    #[test]
    fn test_stunned_actor_is_not_asked() {
        let mut target = dummy();
        target.apply_status(StatusEffect::new(StatusId::Stun, 1));
        let mut battle = engine(&[hero("isaac", vec![Action::defend(0.5)])], &[target]);

        // An empty queue would fail if consulted
        let snapshot = battle
            .run(
                sources(vec![("isaac", script(&["defend"])), ("dummy", queue(QueuedDecisions::new()))]),
                rounds(1),
            )
            .unwrap();

        assert!(messages(&snapshot).iter().any(|m| m.contains("stunned")));
        assert!(!snapshot.combatant("dummy").unwrap().has_status(StatusId::Stun));
    }

    #[test]
    fn test_stunned_actor_still_needs_a_source() {
        let mut target = dummy();
        target.apply_status(StatusEffect::new(StatusId::Stun, 1));
        let mut battle = engine(&[hero("isaac", vec![Action::defend(0.5)])], &[target]);

        let mut sources = sources(vec![("isaac", script(&["defend"]))]);
        let err = battle.run_round(&mut sources).unwrap_err();
        assert!(matches!(err, BattleError::MissingDecisionSource { actor } if actor.as_str() == "dummy"));
    }

    #[test]
    fn test_cleansing_special_covers_living_allies() {
        let cure = Action::new(
            "cure-all",
            "Cure All",
            ActionKind::Special { element: Element::Mercury, cost: 3, power: 0.0, effect: Some(SpecialEffect::Cleanse) },
            TargetScope::AllAllies,
        );
        let mut mia = hero("mia", vec![cure]);
        mia.apply_status(StatusEffect::new(StatusId::Poison, 3));
        let mut garet = hero("garet", vec![Action::defend(0.5)]);
        garet.apply_status(StatusEffect::new(StatusId::Stun, 3));
        garet.apply_status(StatusEffect::new(StatusId::Poison, 3));
        let mut ivan = hero("ivan", vec![Action::attack()]);
        ivan.stats.hp = 0;
        ivan.apply_status(StatusEffect::new(StatusId::Downed, PERMANENT));
        ivan.apply_status(StatusEffect::new(StatusId::Poison, 3));
        let mut battle = engine(&[mia, garet, ivan], &[dummy()]);

        let mut sources = sources(vec![
            ("mia", script(&["cure-all"])),
            ("garet", script(&["defend"])),
            ("dummy", script(&["defend"])),
        ]);
        let snapshot = battle.run_round(&mut sources).unwrap();

        for id in ["mia", "garet"] {
            let c = snapshot.combatant(id).unwrap();
            assert!(!c.has_status(StatusId::Poison), "{id} still poisoned");
            assert!(!c.has_status(StatusId::Stun), "{id} still stunned");
            assert_eq!(c.stats.hp, 100);
        }
        assert_eq!(snapshot.combatant("mia").unwrap().stats.pp, 17);
        assert!(snapshot.log.iter().any(|e| matches!(e.data, EventData::ResourceDelta { delta: -3, remaining: 17, .. })));

        // Downed allies are not targeted
        assert!(snapshot.combatant("ivan").unwrap().statuses.iter().any(|s| s.id == StatusId::Poison));

        let removed: Vec<(&str, &Vec<StatusId>)> = snapshot
            .log
            .iter()
            .filter_map(|e| match &e.data {
                EventData::StatusRemoved { target, statuses } => Some((target.as_str(), statuses)),
                _ => None,
            })
            .collect();
        assert_eq!(removed.len(), 2);
        let garet_removed = removed.iter().find(|(id, _)| *id == "garet").map(|(_, s)| *s);
        assert_eq!(garet_removed, Some(&vec![StatusId::Poison, StatusId::Stun]));
        let mia_removed = removed.iter().find(|(id, _)| *id == "mia").map(|(_, s)| *s);
        assert_eq!(mia_removed, Some(&vec![StatusId::Poison]));
    }

    #[test]
    fn test_healing_item_stops_at_max() {
        let herb = Action::new("herb", "Herb", ActionKind::Item { effect: ItemEffect::Heal, power: 50.0 }, TargetScope::Single);
        let mut mia = hero("mia", vec![herb]);
        mia.stats.hp = 90;
        let mut battle = engine(&[mia], &[dummy()]);

        let snapshot = battle
            .run(sources(vec![("mia", script(&["herb"])), ("dummy", script(&["defend"]))]), rounds(1))
            .unwrap();

        assert_eq!(snapshot.combatant("mia").unwrap().stats.hp, 100);
        assert!(snapshot
            .log
            .iter()
            .any(|e| matches!(e.data, EventData::Heal { amount: 10, remaining: 100, .. })));
    }

    #[test]
    fn test_area_special_hits_each_living_enemy() {
        let quake = Action::new(
            "quake",
            "Quake",
            ActionKind::Special { element: Element::Venus, cost: 5, power: 1.0, effect: None },
            TargetScope::AllEnemies,
        );
        let imp = Combatant::new("imp", "Imp", Side::Enemy, Stats::new(160, 0, 5, 0, 5, 0), vec![Action::defend(1.0)]);
        let mut fallen = Combatant::new("bones", "Bones", Side::Enemy, Stats::new(50, 0, 5, 0, 5, 0), vec![Action::attack()]);
        fallen.stats.hp = 0;
        let mut battle = engine(&[hero("isaac", vec![quake])], &[dummy(), fallen, imp]);

        let snapshot = battle
            .run(
                sources(vec![
                    ("isaac", script(&["quake"])),
                    ("dummy", script(&["defend"])),
                    ("imp", script(&["defend"])),
                ]),
                rounds(1),
            )
            .unwrap();

        let targets: Vec<&str> = snapshot
            .log
            .iter()
            .filter_map(|e| match &e.data {
                EventData::Damage { source: Some(s), target, .. } if s.as_str() == "isaac" => Some(target.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(targets, vec!["dummy", "imp"]);
        assert_eq!(snapshot.combatant("isaac").unwrap().stats.pp, 15);
    }

    #[test]
    fn test_both_sides_empty_goes_to_allies() {
        let mut battle = engine(&[], &[]);
        let snapshot = battle.run(DecisionSources::new(), rounds(3)).unwrap();
        assert_eq!(snapshot.outcome, Outcome::Victory { side: Side::Ally });
        assert_eq!(snapshot.round, 0);
    }

    #[test]
    fn test_round_caps() {
        let make = |options: EngineOptions| BattleEngine::new(&[hero("isaac", vec![Action::defend(0.5)])], &[dummy()], options);
        let both_defend = || sources(vec![("isaac", script(&["defend"])), ("dummy", script(&["defend"]))]);

        let mut capped = make(EngineOptions::default());
        let snapshot = capped.run(both_defend(), rounds(3)).unwrap();
        assert_eq!(snapshot.round, 3);
        assert_eq!(snapshot.outcome, Outcome::InProgress);

        let mut preset = make(EngineOptions::default().with_max_rounds(2));
        assert_eq!(preset.run(both_defend(), RunOptions::default()).unwrap().round, 2);

        // The run cap wins over the construction cap
        let mut overridden = make(EngineOptions::default().with_max_rounds(2));
        assert_eq!(overridden.run(both_defend(), rounds(4)).unwrap().round, 4);
    }

    #[test]
    fn test_run_on_already_decided_battle() {
        let mut fallen = dummy();
        fallen.stats.hp = 0;
        let mut battle = engine(&[hero("isaac", vec![Action::attack()])], &[fallen]);

        let snapshot = battle.run(DecisionSources::new(), rounds(5)).unwrap();
        assert_eq!(snapshot.round, 0);
        assert_eq!(snapshot.outcome, Outcome::Victory { side: Side::Ally });
        assert!(snapshot.log.is_empty());
    }

    #[test]
    fn test_snapshot_survives_later_rounds() {
        let mut battle = engine(&[hero("isaac", vec![Action::attack()])], &[dummy()]);
        let mut sources = sources(vec![("isaac", script(&["attack"])), ("dummy", script(&["defend"]))]);

        let early = battle.run_round(&mut sources).unwrap();
        let early_copy = early.clone();
        battle.run_round(&mut sources).unwrap();
        battle.run_round(&mut sources).unwrap();

        assert_eq!(early, early_copy);
        assert_eq!(early.round, 1);
        assert!(battle.snapshot().combatant("dummy").unwrap().stats.hp < early.combatant("dummy").unwrap().stats.hp);
    }

    // =========================================================================
    // DETERMINISM
    // =========================================================================

    fn skirmish() -> (Vec<Combatant>, Vec<Combatant>) {
        let special = |id: &str, element, cost, power, effect| {
            Action::new(id, id, ActionKind::Special { element, cost, power, effect }, TargetScope::Single)
        };
        let players = vec![
            Combatant::new(
                "isaac",
                "Isaac",
                Side::Ally,
                Stats::new(90, 20, 16, 8, 12, 20).with_element(Element::Venus),
                vec![Action::attack(), special("quake", Element::Venus, 5, 1.4, None)],
            ),
            Combatant::new(
                "mia",
                "Mia",
                Side::Ally,
                Stats::new(80, 30, 11, 7, 11, 10).with_element(Element::Mercury),
                vec![Action::attack(), special("ply", Element::Mercury, 4, 25.0, Some(SpecialEffect::Heal))],
            ),
        ];
        let enemies = vec![
            Combatant::new(
                "lizard",
                "Lizard",
                Side::Enemy,
                Stats::new(110, 12, 15, 9, 10, 15).with_element(Element::Mars),
                vec![Action::attack(), special("venom", Element::Mars, 4, 1.1, Some(SpecialEffect::Afflict(StatusId::Poison)))],
            ),
            Combatant::new(
                "harpy",
                "Harpy",
                Side::Enemy,
                Stats::new(70, 10, 13, 6, 15, 25).with_element(Element::Jupiter),
                vec![Action::attack(), Action::defend(0.5)],
            ),
        ];
        (players, enemies)
    }

    fn heuristic_sources(players: &[Combatant], enemies: &[Combatant]) -> DecisionSources<'static> {
        players
            .iter()
            .chain(enemies)
            .map(|c| (c.id.clone(), Box::new(HeuristicDecisions::default()) as Box<dyn DecisionSource>))
            .collect()
    }

    #[test]
    fn test_battle_determinism() {
        let (players, enemies) = skirmish();
        let options = EngineOptions::default().with_seed("determinism");

        let mut battle1 = BattleEngine::new(&players, &enemies, options.clone());
        let mut battle2 = BattleEngine::new(&players, &enemies, options);
        let snap1 = battle1.run(heuristic_sources(&players, &enemies), rounds(40)).unwrap();
        let snap2 = battle2.run(heuristic_sources(&players, &enemies), rounds(40)).unwrap();

        assert_eq!(snap1.to_json().unwrap(), snap2.to_json().unwrap());
        assert_eq!(snap1.digest().unwrap(), snap2.digest().unwrap());
    }

    #[test]
    fn test_replay_determinism() {
        let (players, enemies) = skirmish();
        let options = EngineOptions::default().with_seed("replay");

        let mut recorders: Vec<(CombatantId, RecordingDecisions<HeuristicDecisions>)> = players
            .iter()
            .chain(&enemies)
            .map(|c| (c.id.clone(), RecordingDecisions::new(HeuristicDecisions::default())))
            .collect();

        let mut live = BattleEngine::new(&players, &enemies, options.clone());
        let mut live_sources: DecisionSources<'_> = DecisionSources::new();
        for (id, recorder) in recorders.iter_mut() {
            live_sources.insert(id.clone(), Box::new(recorder));
        }
        let original = live.run(live_sources, rounds(40)).unwrap();

        let mut replay = BattleEngine::new(&players, &enemies, options);
        let replay_sources: DecisionSources<'_> = recorders
            .iter()
            .map(|(id, recorder)| (id.clone(), Box::new(recorder.replay()) as Box<dyn DecisionSource>))
            .collect();
        let replayed = replay.run(replay_sources, rounds(40)).unwrap();

        assert_eq!(original.log, replayed.log);
        assert_eq!(original.digest().unwrap(), replayed.digest().unwrap());
    }

    proptest! {
        #[test]
        fn prop_battle_bounds(seed in "[a-z]{1,10}") {
            let (players, enemies) = skirmish();
            let mut battle = BattleEngine::new(&players, &enemies, EngineOptions::default().with_seed(seed));
            let snapshot = battle.run(heuristic_sources(&players, &enemies), rounds(30)).unwrap();

            for c in snapshot.parties.iter() {
                prop_assert!(c.stats.hp <= c.stats.max_hp);
                prop_assert!(c.stats.pp <= c.stats.max_pp);
            }
            for event in &snapshot.log {
                if let EventData::Damage { amount, .. } = event.data {
                    prop_assert!(amount >= 1);
                }
            }
            if let Outcome::Victory { side } = snapshot.outcome {
                prop_assert_eq!(snapshot.parties.living_count(side.opposite()), 0);
                prop_assert!(snapshot.parties.living_count(side) > 0);
            }
        }
    }
}
