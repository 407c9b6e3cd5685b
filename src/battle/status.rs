//! Status Ledger
//!
//! Pure operations over a combatant's list of timed effects.
//! An entry whose duration is zero is logically absent even if it is still
//! physically present in the list.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Duration used for effects that should outlive any battle (downed).
pub const PERMANENT: u32 = u32::MAX;

/// Closed set of status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusId {
    /// Knocked out; terminal until revived
    Downed,
    /// Scales incoming damage and turn priority by its potency
    Guarding,
    /// Loses health at round end
    Poison,
    /// Skips turns
    Stun,
    /// A djinn is readied; potency is the banked power
    DjinnSet,
    /// A released djinn is recovering
    DjinnRecovery,
}

impl StatusId {
    /// Log-friendly name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusId::Downed => "downed",
            StatusId::Guarding => "guarding",
            StatusId::Poison => "poison",
            StatusId::Stun => "stun",
            StatusId::DjinnSet => "djinn-set",
            StatusId::DjinnRecovery => "djinn-recovery",
        }
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timed effect on a combatant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Which effect
    pub id: StatusId,
    /// Remaining rounds
    pub duration: u32,
    /// Effect-specific magnitude (guard multiplier, banked djinn power)
    pub potency: Option<f64>,
}

impl StatusEffect {
    /// Effect without potency.
    pub fn new(id: StatusId, duration: u32) -> Self {
        Self { id, duration, potency: None }
    }

    /// Attach a potency.
    pub fn with_potency(mut self, potency: f64) -> Self {
        self.potency = Some(potency);
        self
    }

    /// Zero-duration entries are logically absent.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.duration > 0
    }
}

/// True if an active entry with this id exists.
pub fn has(statuses: &[StatusEffect], id: StatusId) -> bool {
    get(statuses, id).is_some()
}

/// The active entry with this id, if any.
pub fn get(statuses: &[StatusEffect], id: StatusId) -> Option<&StatusEffect> {
    statuses.iter().find(|s| s.id == id && s.is_active())
}

/// Apply an effect, merging into an existing entry with the same id.
///
/// Merging keeps the longer duration and overwrites potency only when the
/// new effect carries one. Returns true if a new entry was inserted.
pub fn apply(statuses: &mut Vec<StatusEffect>, effect: StatusEffect) -> bool {
    if let Some(existing) = statuses.iter_mut().find(|s| s.id == effect.id) {
        existing.duration = existing.duration.max(effect.duration);
        if effect.potency.is_some() {
            existing.potency = effect.potency;
        }
        return false;
    }
    statuses.push(effect);
    true
}

/// Decrement every duration and drop expired entries.
///
/// Called once per combatant at the end of every round.
pub fn tick(statuses: &mut Vec<StatusEffect>) {
    for status in statuses.iter_mut() {
        status.duration = status.duration.saturating_sub(1);
    }
    statuses.retain(|s| s.duration > 0);
}

/// Discard any entry with this id. Returns true if anything was removed.
pub fn remove(statuses: &mut Vec<StatusEffect>, id: StatusId) -> bool {
    let before = statuses.len();
    statuses.retain(|s| s.id != id);
    statuses.len() != before
}
