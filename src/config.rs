//! Simulation configuration.
//!
//! All engine-level tunables live in [`SimulationConfig`]. Class stat
//! tables and spell coefficients are not configuration; they are supplied
//! by whoever builds the [`Character`](crate::Character).

use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

/// Configuration for a simulation run.
///
/// Missing fields in a JSON document fall back to [`Default`].
///
/// # Examples
///
/// ```rust
/// use combatsim::SimulationConfig;
///
/// let config = SimulationConfig::from_json(r#"{ "seed": 7, "iterations": 50 }"#).unwrap();
/// assert_eq!(config.seed, 7);
/// assert_eq!(config.iterations, 50);
/// assert_eq!(config.global_cooldown, 1.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the run's random source.
    pub seed: u64,

    /// Number of combat iterations in one statistics window.
    pub iterations: usize,

    /// Length of one combat iteration, in seconds of simulation time.
    pub combat_length: f64,

    /// Tolerance when comparing a cooldown's next-use time to the clock.
    ///
    /// Absorbs floating point jitter from repeated `now + cooldown` sums.
    pub cooldown_epsilon: f64,

    /// Global cooldown triggered by GCD-restricted spells, in seconds.
    pub global_cooldown: f64,

    /// Damage multiplier for physical critical strikes.
    pub crit_multiplier: f64,

    /// Damage multiplier for magical critical strikes.
    pub spell_crit_multiplier: f64,

    /// Damage multiplier for glancing blows.
    pub glancing_multiplier: f64,

    /// Interval between resource regeneration ticks, in seconds.
    pub regen_interval: f64,

    /// Talent points that must be spent per tier to unlock the next one.
    pub points_per_tier: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            iterations: 1000,
            combat_length: 300.0,
            cooldown_epsilon: 0.0001,
            global_cooldown: 1.5,
            crit_multiplier: 2.0,
            spell_crit_multiplier: 1.5,
            glancing_multiplier: 0.7,
            regen_interval: 2.0,
            points_per_tier: 5,
        }
    }
}

impl SimulationConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Same config with a different seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(SimError::InvalidConfig("iterations must be at least 1".into()));
        }

        if !(self.combat_length > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "combat_length ({}) must be positive",
                self.combat_length
            )));
        }

        if !(self.cooldown_epsilon >= 0.0 && self.cooldown_epsilon < 0.1) {
            return Err(SimError::InvalidConfig(format!(
                "cooldown_epsilon ({}) must be in [0, 0.1)",
                self.cooldown_epsilon
            )));
        }

        // A GCD inside the epsilon never reads as running, so the rotation
        // would keep casting at the same instant.
        if !(self.global_cooldown > self.cooldown_epsilon) {
            return Err(SimError::InvalidConfig(format!(
                "global_cooldown ({}) must exceed cooldown_epsilon ({})",
                self.global_cooldown, self.cooldown_epsilon
            )));
        }

        if self.crit_multiplier < 1.0 || self.spell_crit_multiplier < 1.0 {
            return Err(SimError::InvalidConfig(
                "critical multipliers must be at least 1.0".into(),
            ));
        }

        if !(self.glancing_multiplier > 0.0 && self.glancing_multiplier <= 1.0) {
            return Err(SimError::InvalidConfig(format!(
                "glancing_multiplier ({}) must be in (0, 1]",
                self.glancing_multiplier
            )));
        }

        if !(self.regen_interval > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "regen_interval ({}) must be positive",
                self.regen_interval
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let config = SimulationConfig {
            iterations: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_glancing_multiplier() {
        let config = SimulationConfig {
            glancing_multiplier: 1.5,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_global_cooldown_within_epsilon() {
        for global_cooldown in [0.0, 0.00005, 0.0001] {
            let config = SimulationConfig {
                global_cooldown,
                ..SimulationConfig::default()
            };
            assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
        }

        let config = SimulationConfig {
            global_cooldown: 0.001,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = SimulationConfig::from_json(r#"{ "combat_length": 60.0 }"#).unwrap();
        assert_eq!(config.combat_length, 60.0);
        assert_eq!(config.iterations, 1000);
    }

    #[test]
    fn test_from_json_invalid() {
        let err = SimulationConfig::from_json(r#"{ "combat_length": -1.0 }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));

        let err = SimulationConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, SimError::ConfigParse(_)));
    }

    #[test]
    fn test_with_seed() {
        let config = SimulationConfig::default().with_seed(99);
        assert_eq!(config.seed, 99);
        assert_eq!(config.iterations, 1000);
    }
}
