//! Battle Snapshots
//!
//! A snapshot owns all of its data. Holding one never pins engine state,
//! and further simulation never changes a snapshot already handed out.

use serde::{Serialize, Deserialize};

use crate::battle::error::BattleError;
use crate::battle::events::BattleEvent;
use crate::battle::state::{Combatant, CombatantId, Outcome, Parties};
use crate::core::hash::{compute_state_hash, StateHash};

/// Immutable projection of a battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Seed the battle was started with
    pub seed: String,
    /// Rounds played so far
    pub round: u32,
    /// Both rosters
    pub parties: Parties,
    /// Every event, in order
    pub log: Vec<BattleEvent>,
    /// Result so far
    pub outcome: Outcome,
}

impl Snapshot {
    /// Find a combatant by id.
    pub fn combatant(&self, id: &str) -> Option<&Combatant> {
        self.parties.get(&CombatantId::from(id))
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, BattleError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(s: &str) -> Result<Self, BattleError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, BattleError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, BattleError> {
        Ok(bincode::deserialize(data)?)
    }

    /// SHA-256 over round, seed and the binary encoding.
    ///
    /// Equal digests mean identical battles.
    pub fn digest(&self) -> Result<StateHash, BattleError> {
        let bytes = self.to_bytes()?;
        Ok(compute_state_hash(self.round, &self.seed, &bytes))
    }
}
