//! Actions and Commands
//!
//! `ActionKind` is a closed enum; the engine matches it exhaustively, so an
//! unhandled category is a compile error rather than a runtime one.

use serde::{Serialize, Deserialize};

use crate::battle::state::{CombatantId, Element};
use crate::battle::status::StatusId;

/// Who an action lands on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetScope {
    /// One combatant, named by the command (or implied when omitted)
    Single,
    /// One fixed combatant
    Id(CombatantId),
    /// Every living member of the actor's side
    AllAllies,
    /// Every living member of the opposing side
    AllEnemies,
    /// Every living combatant, players first
    All,
}

/// Optional effect of a special ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialEffect {
    /// Restore health instead of dealing damage
    Heal,
    /// Strip poison and stun instead of dealing damage
    Cleanse,
    /// Damage, tagged as a buff by content (resolves as damage)
    Buff,
    /// Damage, then apply the status to each surviving target
    Afflict(StatusId),
}

/// Djinn mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DjinnMode {
    /// Bank power on the owner
    Ready,
    /// Spend banked power for a burst
    Release,
}

/// Item effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemEffect {
    /// Restore `power` health
    Heal,
    /// Bring a downed target back with `power` health
    Revive,
    /// Strip poison and stun
    Cleanse,
}

/// Action category and its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Physical attack in the actor's own element. No cost.
    Attack,
    /// PP-costing psynergy
    Special {
        /// Element of the ability
        element: Element,
        /// PP cost
        cost: u32,
        /// Power
        power: f64,
        /// Optional effect tag
        effect: Option<SpecialEffect>,
    },
    /// Readiable djinn
    Djinn {
        /// Element of the djinn
        element: Element,
        /// Ready or release
        mode: DjinnMode,
        /// Power
        power: f64,
    },
    /// Party ultimate consuming readied djinn across the side
    Summon {
        /// Element of the summon
        element: Element,
        /// Power
        power: f64,
        /// Readied djinn needed
        required: u32,
    },
    /// Consumable
    Item {
        /// Effect
        effect: ItemEffect,
        /// Power
        power: f64,
    },
    /// Guard with the given incoming-damage multiplier
    Defend {
        /// Guard multiplier
        guard: f64,
    },
    /// Attempt to escape
    Flee,
}

impl ActionKind {
    /// Short category name for logs.
    pub fn category(&self) -> &'static str {
        match self {
            ActionKind::Attack => "attack",
            ActionKind::Special { .. } => "special",
            ActionKind::Djinn { .. } => "djinn",
            ActionKind::Summon { .. } => "summon",
            ActionKind::Item { .. } => "item",
            ActionKind::Defend { .. } => "defend",
            ActionKind::Flee => "flee",
        }
    }
}

/// Something a combatant can do.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Id referenced by commands
    pub id: String,
    /// Display name
    pub name: String,
    /// Category and parameters
    pub kind: ActionKind,
    /// Target scope
    pub target: TargetScope,
}

impl Action {
    /// Create an action.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ActionKind, target: TargetScope) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            target,
        }
    }

    /// Plain single-target attack.
    pub fn attack() -> Self {
        Self::new("attack", "Attack", ActionKind::Attack, TargetScope::Single)
    }

    /// Guard with the given multiplier.
    pub fn defend(guard: f64) -> Self {
        Self::new("defend", "Defend", ActionKind::Defend { guard }, TargetScope::Single)
    }

    /// Attempt to escape.
    pub fn flee() -> Self {
        Self::new("flee", "Flee", ActionKind::Flee, TargetScope::Single)
    }
}

/// What an actor will do this turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Acting combatant
    pub actor: CombatantId,
    /// Id of an action the actor owns
    pub action_id: String,
    /// Explicit target for single-target scopes
    pub target: Option<CombatantId>,
}

impl Command {
    /// Command without an explicit target.
    pub fn new(actor: impl Into<CombatantId>, action_id: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            action_id: action_id.into(),
            target: None,
        }
    }

    /// Set the explicit target.
    pub fn at(mut self, target: impl Into<CombatantId>) -> Self {
        self.target = Some(target.into());
        self
    }
}
