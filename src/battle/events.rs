//! Battle Events
//!
//! The append-only log of everything that happened in a battle. A
//! presentation layer reads this instead of diffing state, so every soft
//! rule failure shows up here as a message.

use serde::{Serialize, Deserialize};

use crate::battle::state::{CombatantId, Element};
use crate::battle::status::StatusId;

/// Battle event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventData {
    /// Acting order for the round
    TurnOrder {
        order: Vec<CombatantId>,
    },

    /// An actor began an action
    ActionStarted {
        actor: CombatantId,
        action_id: String,
        action_name: String,
    },

    /// Health lost. `source` is `None` for poison.
    Damage {
        source: Option<CombatantId>,
        target: CombatantId,
        amount: u32,
        element: Element,
        multiplier: f64,
        critical: bool,
        remaining: u32,
    },

    /// Health restored
    Heal {
        source: CombatantId,
        target: CombatantId,
        amount: u32,
        remaining: u32,
    },

    /// Status applied or extended
    StatusApplied {
        target: CombatantId,
        status: StatusId,
        duration: u32,
    },

    /// Statuses removed from one target
    StatusRemoved {
        target: CombatantId,
        statuses: Vec<StatusId>,
    },

    /// PP changed
    ResourceDelta {
        target: CombatantId,
        delta: i64,
        remaining: u32,
    },

    /// Human-readable note (soft failures, flee results, skipped turns)
    Message {
        text: String,
    },
}

/// A battle event stamped with its round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    /// Round when event occurred
    pub round: u32,

    /// Event data
    pub data: EventData,
}

impl BattleEvent {
    /// Create a new event.
    pub fn new(round: u32, data: EventData) -> Self {
        Self { round, data }
    }

    /// Create turn order event.
    pub fn turn_order(round: u32, order: Vec<CombatantId>) -> Self {
        Self::new(round, EventData::TurnOrder { order })
    }

    /// Create action started event.
    pub fn action_started(round: u32, actor: CombatantId, action_id: &str, action_name: &str) -> Self {
        Self::new(
            round,
            EventData::ActionStarted {
                actor,
                action_id: action_id.to_string(),
                action_name: action_name.to_string(),
            },
        )
    }

    /// Create status applied event.
    pub fn status_applied(round: u32, target: CombatantId, status: StatusId, duration: u32) -> Self {
        Self::new(round, EventData::StatusApplied { target, status, duration })
    }

    /// Create status removed event.
    pub fn status_removed(round: u32, target: CombatantId, statuses: Vec<StatusId>) -> Self {
        Self::new(round, EventData::StatusRemoved { target, statuses })
    }

    /// Create resource delta event.
    pub fn resource_delta(round: u32, target: CombatantId, delta: i64, remaining: u32) -> Self {
        Self::new(round, EventData::ResourceDelta { target, delta, remaining })
    }

    /// Create message event.
    pub fn message(round: u32, text: impl Into<String>) -> Self {
        Self::new(round, EventData::Message { text: text.into() })
    }

    /// The combatant this event is mainly about, if any.
    pub fn subject(&self) -> Option<&CombatantId> {
        match &self.data {
            EventData::ActionStarted { actor, .. } => Some(actor),
            EventData::Damage { target, .. }
            | EventData::Heal { target, .. }
            | EventData::StatusApplied { target, .. }
            | EventData::StatusRemoved { target, .. }
            | EventData::ResourceDelta { target, .. } => Some(target),
            EventData::TurnOrder { .. } | EventData::Message { .. } => None,
        }
    }

    /// True for message events.
    pub fn is_message(&self) -> bool {
        matches!(self.data, EventData::Message { .. })
    }
}
