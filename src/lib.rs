//! # Battle Sim
//!
//! Deterministic turn-based party battle simulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BATTLE SIM                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── rng.rs       - Seeded Xorshift128+ sequence generator   │
//! │  └── hash.rs      - Snapshot hashing for replay checks       │
//! │                                                              │
//! │  battle/          - Battle logic (deterministic)             │
//! │  ├── state.rs     - Combatants, rosters, outcome             │
//! │  ├── status.rs    - Status ledger                            │
//! │  ├── action.rs    - Actions and commands                     │
//! │  ├── damage.rs    - Element cycle, damage rolls              │
//! │  ├── decision.rs  - Decision sources                         │
//! │  ├── engine.rs    - Round loop and resolution                │
//! │  ├── events.rs    - Event log                                │
//! │  └── snapshot.rs  - Immutable snapshots                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same seed, the same rosters in the same order, and decision
//! sources that return the same commands, two engines produce identical
//! logs and snapshots:
//! - All randomness comes from one engine-owned generator
//! - Rosters keep their storage order; sources live in a `BTreeMap`
//! - No I/O, no system time, no threads

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod battle;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use battle::{
    Action, ActionKind, BattleEngine, BattleError, BattleEvent, Combatant, Command,
    DecisionSource, DecisionSources, EngineOptions, Outcome, RunOptions, Side, Snapshot, Stats,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
