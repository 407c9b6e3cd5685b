//! Battle tuning.
//!
//! Every constant the rules reference lives here so content can be tuned
//! without touching the resolver. Loaded from JSON; omitted fields keep
//! their defaults.

use serde::{Serialize, Deserialize};

use crate::battle::error::BattleError;

/// Configuration for battle simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Rounds a guard lasts (ticked at round end)
    pub guard_duration: u32,
    /// Rounds a readied djinn stays set
    pub djinn_set_duration: u32,
    /// Rounds a released djinn recovers
    pub djinn_recovery_duration: u32,
    /// Rounds a poison/stun affliction lasts
    pub affliction_duration: u32,
    /// Poison damage per round end is `max_hp / poison_divisor` (min 1)
    pub poison_divisor: u32,
    /// Turn-order jitter scale
    pub turn_jitter: f64,
    /// Base flee chance
    pub flee_base: f64,
    /// Agility difference divisor for flee chance
    pub flee_agility_divisor: f64,
    /// Lowest flee chance
    pub flee_min: f64,
    /// Highest flee chance
    pub flee_max: f64,
    /// Critical chance is `luck / crit_divisor`
    pub crit_divisor: f64,
    /// Critical damage multiplier
    pub crit_multiplier: f64,
    /// Party ultimate damage multiplier
    pub ultimate_multiplier: f64,
    /// Lower bound of the damage variance roll
    pub variance_min: f64,
    /// Upper bound of the damage variance roll
    pub variance_max: f64,
    /// Defense weight in the base damage term
    pub defense_factor: f64,
    /// Multiplier when the attacking element has the advantage
    pub element_advantage: f64,
    /// Multiplier when the defending element has the advantage
    pub element_resist: f64,
    /// Power weight for healing psynergy
    pub heal_power_factor: f64,
    /// Attack weight for healing psynergy
    pub heal_attack_factor: f64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            guard_duration: 1,
            djinn_set_duration: 99,
            djinn_recovery_duration: 2,
            affliction_duration: 3,
            poison_divisor: 16,
            turn_jitter: 5.0,
            flee_base: 0.35,
            flee_agility_divisor: 200.0,
            flee_min: 0.2,
            flee_max: 0.9,
            crit_divisor: 200.0,
            crit_multiplier: 1.5,
            ultimate_multiplier: 1.2,
            variance_min: 0.9,
            variance_max: 1.1,
            defense_factor: 0.4,
            element_advantage: 1.25,
            element_resist: 0.75,
            heal_power_factor: 1.1,
            heal_attack_factor: 0.2,
        }
    }
}

impl BattleConfig {
    /// Parse from JSON, keeping defaults for omitted fields.
    pub fn from_json(s: &str) -> Result<Self, BattleError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, BattleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
