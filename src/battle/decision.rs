//! Decision Sources
//!
//! The engine never picks actions itself. For each living actor it hands a
//! [`DecisionContext`] to that actor's [`DecisionSource`] and resolves the
//! command it gets back. The context holds clones, so a source cannot reach
//! engine state except through the shared random stream.

use std::collections::{BTreeMap, VecDeque};

use crate::battle::action::{ActionKind, Command, SpecialEffect};
use crate::battle::error::BattleError;
use crate::battle::events::BattleEvent;
use crate::battle::state::{Combatant, CombatantId};
use crate::core::rng::DeterministicRng;

/// Read-only view of the battle for one decision.
pub struct DecisionContext<'a> {
    /// The acting combatant
    pub actor: Combatant,
    /// Living members of the actor's side, including the actor
    pub allies: Vec<Combatant>,
    /// Living members of the opposing side
    pub enemies: Vec<Combatant>,
    /// Current round
    pub round: u32,
    /// Everything logged so far
    pub log: &'a [BattleEvent],
    rng: &'a mut DeterministicRng,
}

impl<'a> DecisionContext<'a> {
    /// Build a context over the engine's generator.
    pub fn new(
        actor: Combatant,
        allies: Vec<Combatant>,
        enemies: Vec<Combatant>,
        round: u32,
        log: &'a [BattleEvent],
        rng: &'a mut DeterministicRng,
    ) -> Self {
        Self { actor, allies, enemies, round, log, rng }
    }

    /// Draw from the battle's shared random stream.
    ///
    /// Any draw here shifts every later roll in the battle, so replays must
    /// use sources that draw the same way.
    pub fn random(&mut self) -> f64 {
        self.rng.next_f64()
    }

    /// Command for the acting combatant.
    pub fn command(&self, action_id: &str) -> Command {
        Command::new(self.actor.id.clone(), action_id)
    }
}

/// Something that chooses what an actor does.
pub trait DecisionSource {
    /// Pick this turn's command for `ctx.actor`.
    fn choose_action(&mut self, ctx: &mut DecisionContext<'_>) -> Result<Command, BattleError>;
}

impl<S: DecisionSource + ?Sized> DecisionSource for &mut S {
    fn choose_action(&mut self, ctx: &mut DecisionContext<'_>) -> Result<Command, BattleError> {
        (**self).choose_action(ctx)
    }
}

impl<S: DecisionSource + ?Sized> DecisionSource for Box<S> {
    fn choose_action(&mut self, ctx: &mut DecisionContext<'_>) -> Result<Command, BattleError> {
        (**self).choose_action(ctx)
    }
}

/// Decision source per actor id.
pub type DecisionSources<'a> = BTreeMap<CombatantId, Box<dyn DecisionSource + 'a>>;

// =============================================================================
// QUEUED
// =============================================================================

/// FIFO of commands fed from outside (UI input, recordings).
#[derive(Clone, Debug, Default)]
pub struct QueuedDecisions {
    queue: VecDeque<Command>,
}

impl QueuedDecisions {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue pre-filled with commands.
    pub fn from_commands(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            queue: commands.into_iter().collect(),
        }
    }

    /// Append a command.
    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Commands still waiting.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl DecisionSource for QueuedDecisions {
    fn choose_action(&mut self, ctx: &mut DecisionContext<'_>) -> Result<Command, BattleError> {
        self.queue.pop_front().ok_or_else(|| BattleError::EmptyQueue {
            actor: ctx.actor.id.clone(),
        })
    }
}

// =============================================================================
// SCRIPTED
// =============================================================================

/// Cycles through a fixed list of `(action, target)` choices.
#[derive(Clone, Debug)]
pub struct ScriptedDecisions {
    script: Vec<(String, Option<CombatantId>)>,
    cursor: usize,
}

impl ScriptedDecisions {
    /// Script of action ids with optional explicit targets.
    pub fn new(script: Vec<(String, Option<CombatantId>)>) -> Self {
        Self { script, cursor: 0 }
    }

    /// Always use the same action with no explicit target.
    pub fn repeat(action_id: impl Into<String>) -> Self {
        Self::new(vec![(action_id.into(), None)])
    }
}

impl DecisionSource for ScriptedDecisions {
    fn choose_action(&mut self, ctx: &mut DecisionContext<'_>) -> Result<Command, BattleError> {
        if self.script.is_empty() {
            return Err(BattleError::NoAvailableAction {
                actor: ctx.actor.id.clone(),
            });
        }
        let (action_id, target) = &self.script[self.cursor % self.script.len()];
        self.cursor += 1;

        let mut command = ctx.command(action_id);
        command.target = target.clone();
        Ok(command)
    }
}

// =============================================================================
// HEURISTIC
// =============================================================================

/// Simple opponent: heal when an ally drops below the threshold, use the
/// strongest affordable offensive psynergy while PP is plentiful, otherwise
/// attack. Every pick targets the valid combatant with the least health.
#[derive(Clone, Debug)]
pub struct HeuristicDecisions {
    /// Heal allies below this health ratio
    pub heal_threshold: f64,
    /// Use offensive psynergy while PP is at or above this ratio of max
    pub pp_reserve: f64,
}

impl Default for HeuristicDecisions {
    fn default() -> Self {
        Self {
            heal_threshold: 0.35,
            pp_reserve: 0.5,
        }
    }
}

impl HeuristicDecisions {
    fn lowest_health<'c>(candidates: impl IntoIterator<Item = &'c Combatant>) -> Option<&'c Combatant> {
        candidates.into_iter().min_by_key(|c| c.stats.hp)
    }
}

impl DecisionSource for HeuristicDecisions {
    fn choose_action(&mut self, ctx: &mut DecisionContext<'_>) -> Result<Command, BattleError> {
        let actor = &ctx.actor;
        let pp = actor.stats.pp;

        // 1. Heal a hurt ally
        let heal = actor.actions.iter().find(|a| {
            matches!(a.kind, ActionKind::Special { cost, effect: Some(SpecialEffect::Heal), .. } if cost <= pp)
        });
        let hurt = ctx.allies.iter().filter(|c| c.health_ratio() < self.heal_threshold);
        if let (Some(heal), Some(patient)) = (heal, Self::lowest_health(hurt)) {
            return Ok(ctx.command(&heal.id).at(patient.id.clone()));
        }

        let target = Self::lowest_health(&ctx.enemies).map(|c| c.id.clone());

        // 2. Offensive psynergy while PP is plentiful
        let plentiful = actor.stats.max_pp > 0
            && pp as f64 >= actor.stats.max_pp as f64 * self.pp_reserve;
        if plentiful {
            let strongest = actor
                .actions
                .iter()
                .filter_map(|a| match a.kind {
                    ActionKind::Special { cost, power, effect, .. }
                        if cost <= pp
                            && !matches!(effect, Some(SpecialEffect::Heal) | Some(SpecialEffect::Cleanse)) =>
                    {
                        Some((a, power))
                    }
                    _ => None,
                })
                .max_by(|(_, p1), (_, p2)| p1.total_cmp(p2))
                .map(|(a, _)| a);
            if let Some(special) = strongest {
                let mut command = ctx.command(&special.id);
                command.target = target;
                return Ok(command);
            }
        }

        // 3. Plain attack
        if let Some(attack) = actor.actions.iter().find(|a| a.kind == ActionKind::Attack) {
            let mut command = ctx.command(&attack.id);
            command.target = target;
            return Ok(command);
        }

        // 4. Anything that is not a flee
        actor
            .actions
            .iter()
            .find(|a| a.kind != ActionKind::Flee)
            .map(|a| ctx.command(&a.id))
            .ok_or_else(|| BattleError::NoAvailableAction {
                actor: actor.id.clone(),
            })
    }
}

// =============================================================================
// RECORDING
// =============================================================================

/// Wraps a source and records every command it returns.
///
/// Feed the recording back through [`QueuedDecisions`] to replay a battle.
#[derive(Clone, Debug)]
pub struct RecordingDecisions<S> {
    inner: S,
    recorded: Vec<Command>,
}

impl<S: DecisionSource> RecordingDecisions<S> {
    /// Wrap a source.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            recorded: Vec::new(),
        }
    }

    /// Commands returned so far, in order.
    pub fn commands(&self) -> &[Command] {
        &self.recorded
    }

    /// Replay source over the recording.
    pub fn replay(&self) -> QueuedDecisions {
        QueuedDecisions::from_commands(self.recorded.iter().cloned())
    }
}

impl<S: DecisionSource> DecisionSource for RecordingDecisions<S> {
    fn choose_action(&mut self, ctx: &mut DecisionContext<'_>) -> Result<Command, BattleError> {
        let command = self.inner.choose_action(ctx)?;
        self.recorded.push(command.clone());
        Ok(command)
    }
}
