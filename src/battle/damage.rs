//! Damage resolution.
//!
//! Element cycle: Venus -> Mars -> Jupiter -> Mercury -> Venus, where each
//! element beats the one before it (Mars beats Venus, Venus beats Mercury).
//! Neutral never gains or loses advantage.

use crate::battle::config::BattleConfig;
use crate::battle::state::Element;
use crate::core::rng::DeterministicRng;

/// The element this element beats, or `None` for neutral.
fn beats(element: Element) -> Option<Element> {
    match element {
        Element::Venus => Some(Element::Mercury),
        Element::Mars => Some(Element::Venus),
        Element::Jupiter => Some(Element::Mars),
        Element::Mercury => Some(Element::Jupiter),
        Element::Neutral => None,
    }
}

/// Elemental multiplier for an attack.
pub fn element_multiplier(attacker: Element, defender: Element, config: &BattleConfig) -> f64 {
    if attacker == Element::Neutral || defender == Element::Neutral || attacker == defender {
        return 1.0;
    }

    if beats(attacker) == Some(defender) {
        config.element_advantage
    } else if beats(defender) == Some(attacker) {
        config.element_resist
    } else {
        1.0
    }
}

/// Inputs to one damage roll.
#[derive(Clone, Copy, Debug)]
pub struct DamageInput {
    /// Attacker's attack stat
    pub attack: u32,
    /// Action power
    pub power: f64,
    /// Defender's defense stat
    pub defense: u32,
    /// Attacker's luck (critical chance)
    pub luck: u32,
    /// Element of the action
    pub element: Element,
    /// Defender's affinity
    pub defender_element: Element,
    /// Defender's active guard potency (1.0 when not guarding)
    pub guard: f64,
    /// Party ultimate bonus applies
    pub ultimate: bool,
}

/// Result of one damage roll.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageRoll {
    /// Final damage, at least 1
    pub amount: u32,
    /// Elemental multiplier that was applied
    pub multiplier: f64,
    /// Critical hit landed
    pub critical: bool,
}

/// Roll damage.
///
/// Draws exactly two values from `rng`: variance, then critical.
pub fn roll_damage(input: &DamageInput, rng: &mut DeterministicRng, config: &BattleConfig) -> DamageRoll {
    let base = (input.attack as f64 * input.power - input.defense as f64 * config.defense_factor).max(1.0);
    let multiplier = element_multiplier(input.element, input.defender_element, config);

    let variance = rng.next_range(config.variance_min, config.variance_max);
    let critical = rng.next_f64() < input.luck as f64 / config.crit_divisor;

    let mut damage = base * multiplier * variance;
    if critical {
        damage *= config.crit_multiplier;
    }
    damage *= input.guard;
    if input.ultimate {
        damage *= config.ultimate_multiplier;
    }

    DamageRoll {
        amount: clamp_amount(damage.round()),
        multiplier,
        critical,
    }
}

/// Convert a rounded amount to `u32`, never below 1.
pub(crate) fn clamp_amount(value: f64) -> u32 {
    if value.is_nan() || value < 1.0 {
        1
    } else if value >= u32::MAX as f64 {
        u32::MAX
    } else {
        value as u32
    }
}
