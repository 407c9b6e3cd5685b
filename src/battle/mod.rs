//! Battle Simulation Module
//!
//! All battle logic. Deterministic given a seed and a command stream.
//!
//! ## Module Structure
//!
//! - `state`: Combatants, stats, rosters, outcome
//! - `status`: Status effects and the ledger operations over them
//! - `action`: Action vocabulary and commands
//! - `events`: Append-only event log entries
//! - `damage`: Element cycle and damage rolls
//! - `decision`: Decision source trait and stock implementations
//! - `engine`: Round loop and action resolution
//! - `snapshot`: Independent state projections
//! - `config`: Rule tuning
//! - `error`: Fatal errors

pub mod state;
pub mod status;
pub mod action;
pub mod events;
pub mod damage;
pub mod decision;
pub mod engine;
pub mod snapshot;
pub mod config;
pub mod error;

// Re-export key types
pub use state::{Combatant, CombatantId, Element, Outcome, Parties, Side, Stats};
pub use status::{StatusEffect, StatusId};
pub use action::{Action, ActionKind, Command, DjinnMode, ItemEffect, SpecialEffect, TargetScope};
pub use events::{BattleEvent, EventData};
pub use decision::{
    DecisionContext, DecisionSource, DecisionSources, HeuristicDecisions, QueuedDecisions,
    RecordingDecisions, ScriptedDecisions,
};
pub use engine::{BattleEngine, EngineOptions, RunOptions};
pub use snapshot::Snapshot;
pub use config::BattleConfig;
pub use error::BattleError;
