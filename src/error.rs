//! Error types for the simulation engine.
//!
//! Every variant of [`SimError`] is an internal-consistency violation: a
//! defect in calling code or data, never an ordinary runtime condition.
//! Spell unavailability is reported through
//! [`SpellStatus`](crate::spell::SpellStatus) and combat outcomes through
//! [`Outcome`](crate::roll::Outcome); neither goes through this type.

use crate::ids::{BuffId, SpellId};
use crate::resource::ResourceType;
use thiserror::Error;

/// Format a prerequisite cycle as a readable string.
fn format_cycle_path(path: &[String]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.join(" -> ")
}

/// Errors raised when the engine detects an invariant violation.
///
/// A run that hits one of these aborts: [`Simulation::run`](crate::Simulation::run)
/// propagates it to the caller instead of continuing with corrupt state.
///
/// # Examples
///
/// ```rust
/// use combatsim::SimError;
///
/// let err = SimError::AlreadyEnabled("Bloodthirst".to_string());
/// assert_eq!(err.to_string(), "Tried to enable an already enabled spell 'Bloodthirst'");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// `enable()` was called on a spell that is already enabled.
    #[error("Tried to enable an already enabled spell '{0}'")]
    AlreadyEnabled(String),

    /// A spell was performed without the resources to pay for it.
    ///
    /// The scheduler must check [`SpellStatus`](crate::spell::SpellStatus)
    /// first, so reaching this means the caller skipped that check.
    #[error("Tried to perform '{spell}' with insufficient {resource}: have {available}, need {cost}")]
    InsufficientResource {
        spell: String,
        resource: ResourceType,
        available: i64,
        cost: i64,
    },

    /// A resist tier code outside the known table.
    #[error("Unhandled resist tier code: {0}")]
    UnknownResistTier(i32),

    /// A spell handle that does not belong to this character.
    #[error("Unknown spell: {0}")]
    UnknownSpell(SpellId),

    /// A buff handle that does not belong to this character.
    #[error("Unknown buff: {0}")]
    UnknownBuff(BuffId),

    /// A talent tried to apply an effect its target cannot carry.
    #[error("'{target}' does not support rank effect {effect}")]
    UnsupportedRankEffect { target: String, effect: String },

    /// A rank was added to a talent that is already maxed.
    #[error("Talent '{talent}' is already at max rank {max_rank}")]
    TalentAtMaxRank { talent: String, max_rank: u32 },

    /// A rank was removed from a talent with no ranks.
    #[error("Talent '{0}' has no ranks to remove")]
    TalentAtMinRank(String),

    /// A talent name that is not part of the tree.
    #[error("Unknown talent: {0}")]
    UnknownTalent(String),

    /// A talent position code that could not be parsed.
    #[error("Invalid talent position: {0}")]
    InvalidPosition(String),

    /// Not enough points spent in lower tiers to reach this talent.
    #[error("Talent '{talent}' requires {required} points in lower tiers, {spent} spent")]
    TierLocked {
        talent: String,
        required: u32,
        spent: u32,
    },

    /// The talent's prerequisite is not at max rank.
    #[error("Talent '{talent}' requires '{prerequisite}' at max rank")]
    PrerequisiteNotMet {
        talent: String,
        prerequisite: String,
    },

    /// Removing a rank would orphan a talent that depends on this one.
    #[error("Cannot remove rank from '{talent}': required by '{dependent}'")]
    RequiredByDependent { talent: String, dependent: String },

    /// Talent prerequisites form a cycle.
    #[error("Prerequisite cycle detected: {}", format_cycle_path(.path))]
    PrerequisiteCycle { path: Vec<String> },

    /// A configuration value failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::ConfigParse(err.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::InsufficientResource {
            spell: "Execute".to_string(),
            resource: ResourceType::Rage,
            available: 5,
            cost: 15,
        };
        let display = err.to_string();
        assert!(display.contains("Execute"));
        assert!(display.contains("Rage"));
        assert!(display.contains("need 15"));
    }

    #[test]
    fn test_cycle_error_display() {
        let err = SimError::PrerequisiteCycle {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        let display = err.to_string();
        assert!(display.contains("cycle"));
        assert!(display.contains("A -> B -> A"));
    }

    #[test]
    fn test_config_parse_from_serde() {
        let parse_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: SimError = parse_err.into();
        assert!(matches!(err, SimError::ConfigParse(_)));
    }
}
