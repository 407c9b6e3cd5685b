//! Fatal battle errors.
//!
//! These signal a configuration or programming defect and stop resolution.
//! Rule failures (not enough PP, nothing readied, failed flee) are never
//! errors; they are logged as message events.

use crate::battle::state::CombatantId;

/// Errors that abort a battle.
#[derive(Debug, thiserror::Error)]
pub enum BattleError {
    /// A living actor has no decision source
    #[error("no decision source for living actor {actor}")]
    MissingDecisionSource {
        /// Actor without a source
        actor: CombatantId,
    },

    /// A command names an action the actor does not own
    #[error("{actor} does not own action {action_id:?}")]
    UnknownAction {
        /// Acting combatant
        actor: CombatantId,
        /// Requested action id
        action_id: String,
    },

    /// A command was issued for someone other than the asked actor
    #[error("command for {commanded} returned while {actor} is acting")]
    UnknownActor {
        /// Actor whose turn it is
        actor: CombatantId,
        /// Actor named by the command
        commanded: CombatantId,
    },

    /// A queued source was asked to act with nothing queued
    #[error("decision queue for {actor} is empty")]
    EmptyQueue {
        /// Actor whose queue ran dry
        actor: CombatantId,
    },

    /// A source found nothing it could choose
    #[error("{actor} has no usable action")]
    NoAvailableAction {
        /// Actor without options
        actor: CombatantId,
    },

    /// JSON encode/decode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary encode/decode failure
    #[error("binary codec error: {0}")]
    Binary(#[from] bincode::Error),
}
