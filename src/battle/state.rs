//! Battle State Definitions
//!
//! Combatants, their stat blocks, and the two rosters they fight in.
//! Rosters are plain `Vec`s: storage order is part of the replay contract
//! (turn-order jitter is drawn in this order), so it is never re-sorted.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::battle::action::Action;
use crate::battle::status::{self, StatusEffect, StatusId};

// =============================================================================
// COMBATANT ID
// =============================================================================

/// Unique combatant identifier.
///
/// Must be unique across both rosters of a battle.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub String);

impl CombatantId {
    /// Create from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CombatantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CombatantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// SIDE / ELEMENT
// =============================================================================

/// Which roster a combatant fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    /// Player party
    Ally,
    /// Opposing party
    Enemy,
}

impl Side {
    /// The other side.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Ally => Side::Enemy,
            Side::Enemy => Side::Ally,
        }
    }
}

/// Elemental affinity.
///
/// The four non-neutral elements form an advantage cycle, see
/// [`crate::battle::damage::element_multiplier`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Element {
    /// Earth
    Venus,
    /// Fire
    Mars,
    /// Wind
    Jupiter,
    /// Water
    Mercury,
    /// No affinity; never gains or loses advantage
    #[default]
    Neutral,
}

// =============================================================================
// STATS
// =============================================================================

/// Mutable stat block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Current health
    pub hp: u32,
    /// Maximum health
    pub max_hp: u32,
    /// Current psynergy points
    pub pp: u32,
    /// Maximum psynergy points
    pub max_pp: u32,
    /// Attack
    pub attack: u32,
    /// Defense
    pub defense: u32,
    /// Agility (turn order)
    pub agility: u32,
    /// Luck (critical chance)
    pub luck: u32,
    /// Elemental affinity
    pub element: Element,
}

impl Stats {
    /// Full health and PP.
    pub fn new(max_hp: u32, max_pp: u32, attack: u32, defense: u32, agility: u32, luck: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            pp: max_pp,
            max_pp,
            attack,
            defense,
            agility,
            luck,
            element: Element::Neutral,
        }
    }

    /// Set elemental affinity.
    pub fn with_element(mut self, element: Element) -> Self {
        self.element = element;
        self
    }

    /// Clamp current values into `[0, max]`.
    pub fn clamp(&mut self) {
        self.hp = self.hp.min(self.max_hp);
        self.pp = self.pp.min(self.max_pp);
    }
}

// =============================================================================
// COMBATANT
// =============================================================================

/// A single participant in a battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Unique id
    pub id: CombatantId,
    /// Display name
    pub name: String,
    /// Roster this combatant belongs to
    pub side: Side,
    /// Stat block
    pub stats: Stats,
    /// Active timed effects
    pub statuses: Vec<StatusEffect>,
    /// Actions this combatant can perform
    pub actions: Vec<Action>,
}

impl Combatant {
    /// Create a combatant with no statuses.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        side: Side,
        mut stats: Stats,
        actions: Vec<Action>,
    ) -> Self {
        stats.clamp();
        Self {
            id: CombatantId::new(id),
            name: name.into(),
            side,
            stats,
            statuses: Vec::new(),
            actions,
        }
    }

    /// Alive iff health > 0 and not downed.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.stats.hp > 0 && !self.has_status(StatusId::Downed)
    }

    /// Look up an owned action by id.
    pub fn action(&self, action_id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == action_id)
    }

    /// Active status check.
    #[inline]
    pub fn has_status(&self, id: StatusId) -> bool {
        status::has(&self.statuses, id)
    }

    /// Active status lookup.
    #[inline]
    pub fn status(&self, id: StatusId) -> Option<&StatusEffect> {
        status::get(&self.statuses, id)
    }

    /// Apply a status. Returns true if it was newly added.
    pub fn apply_status(&mut self, effect: StatusEffect) -> bool {
        status::apply(&mut self.statuses, effect)
    }

    /// Remove a status regardless of duration. Returns true if anything was removed.
    pub fn remove_status(&mut self, id: StatusId) -> bool {
        status::remove(&mut self.statuses, id)
    }

    /// Incoming-damage and turn-order multiplier from an active guard.
    pub fn guard_multiplier(&self) -> f64 {
        self.status(StatusId::Guarding)
            .and_then(|s| s.potency)
            .unwrap_or(1.0)
    }

    /// Health as a fraction of maximum.
    pub fn health_ratio(&self) -> f64 {
        if self.stats.max_hp == 0 {
            return 0.0;
        }
        self.stats.hp as f64 / self.stats.max_hp as f64
    }

    /// Subtract health, saturating at zero. Returns the amount actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let before = self.stats.hp;
        self.stats.hp = before.saturating_sub(amount);
        before - self.stats.hp
    }

    /// Add health, capped at maximum. Returns the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.stats.hp;
        self.stats.hp = before.saturating_add(amount).min(self.stats.max_hp);
        self.stats.hp - before
    }

    /// Spend PP if affordable.
    pub fn spend_pp(&mut self, cost: u32) -> bool {
        if self.stats.pp < cost {
            return false;
        }
        self.stats.pp -= cost;
        true
    }
}

// =============================================================================
// PARTIES
// =============================================================================

/// Both rosters, in storage order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Parties {
    /// Player roster
    pub players: Vec<Combatant>,
    /// Enemy roster
    pub enemies: Vec<Combatant>,
}

impl Parties {
    /// Build from two rosters; side flags are forced to match the roster.
    pub fn new(players: &[Combatant], enemies: &[Combatant]) -> Self {
        let tag = |roster: &[Combatant], side: Side| -> Vec<Combatant> {
            roster
                .iter()
                .cloned()
                .map(|mut c| {
                    c.side = side;
                    c.stats.clamp();
                    c
                })
                .collect()
        };
        Self {
            players: tag(players, Side::Ally),
            enemies: tag(enemies, Side::Enemy),
        }
    }

    /// Roster for a side.
    pub fn roster(&self, side: Side) -> &[Combatant] {
        match side {
            Side::Ally => &self.players,
            Side::Enemy => &self.enemies,
        }
    }

    /// All combatants, players first.
    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.players.iter().chain(self.enemies.iter())
    }

    /// All combatants mutably, players first.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.players.iter_mut().chain(self.enemies.iter_mut())
    }

    /// Living members of a side.
    pub fn living(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.roster(side).iter().filter(|c| c.is_alive())
    }

    /// Number of living members of a side.
    pub fn living_count(&self, side: Side) -> usize {
        self.living(side).count()
    }

    /// Find a combatant by id.
    pub fn get(&self, id: &CombatantId) -> Option<&Combatant> {
        self.iter().find(|c| &c.id == id)
    }

    /// Find a combatant by id, mutably.
    pub fn get_mut(&mut self, id: &CombatantId) -> Option<&mut Combatant> {
        self.iter_mut().find(|c| &c.id == id)
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Battle result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// Rounds still resolve
    #[default]
    InProgress,
    /// The named side has living members and the other has none
    Victory {
        /// Winning side
        side: Side,
    },
    /// The named side escaped
    Fled {
        /// Side that fled
        side: Side,
    },
}

impl Outcome {
    /// True once the battle is over.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}
