//! Combat formulas consumed by the engine.
//!
//! The engine never hardcodes mitigation curves; it asks a [`Mechanics`]
//! implementation. [`ClassicMechanics`] provides the classic level-scaled
//! curves and is what the engine uses unless told otherwise.

/// Probability of each partial-resist tier for one magical attack.
///
/// Tiers not listed here (no resist) take whatever probability is left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResistChances {
    pub resist_75: f64,
    pub resist_50: f64,
    pub resist_25: f64,
}

impl ResistChances {
    /// Sum of the partial-resist probabilities.
    pub fn total(&self) -> f64 {
        self.resist_75 + self.resist_50 + self.resist_25
    }
}

/// Pure mitigation formulas.
///
/// Implementations must be deterministic functions of their inputs.
pub trait Mechanics: Send + Sync {
    /// Fraction of physical damage removed by `armor` against an attacker
    /// of `attacker_level`. Monotonically increasing in `armor`.
    fn armor_reduction(&self, armor: f64, attacker_level: u32) -> f64;

    /// Average fraction of magical damage resisted.
    fn average_resist(&self, resistance: f64, attacker_level: u32) -> f64;

    /// Spread an average resist over the discrete partial-resist tiers.
    ///
    /// The default interpolates between the two tiers adjacent to the
    /// average, so the expected resisted fraction equals the average.
    fn resist_chances(&self, resistance: f64, attacker_level: u32) -> ResistChances {
        let average = self.average_resist(resistance, attacker_level).clamp(0.0, 0.75);
        let position = average / 0.25;
        let lower = position.floor().min(2.0);
        let upper_weight = position - lower;
        let lower_weight = 1.0 - upper_weight;

        let mut tiers = [0.0; 4];
        let lower_index = lower as usize;
        tiers[lower_index] += lower_weight;
        tiers[lower_index + 1] += upper_weight;

        ResistChances {
            resist_25: tiers[1],
            resist_50: tiers[2],
            resist_75: tiers[3],
        }
    }
}

/// Classic level-scaled formulas.
///
/// # Examples
///
/// ```rust
/// use combatsim::{ClassicMechanics, Mechanics};
///
/// let mechanics = ClassicMechanics;
/// let reduction = mechanics.armor_reduction(3731.0, 60);
/// assert!((reduction - 0.4042).abs() < 0.001);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicMechanics;

impl Mechanics for ClassicMechanics {
    fn armor_reduction(&self, armor: f64, attacker_level: u32) -> f64 {
        if armor <= 0.0 {
            return 0.0;
        }
        let reduction = armor / (armor + 400.0 + 85.0 * f64::from(attacker_level));
        reduction.clamp(0.0, 0.75)
    }

    fn average_resist(&self, resistance: f64, attacker_level: u32) -> f64 {
        if resistance <= 0.0 {
            return 0.0;
        }
        let level = f64::from(attacker_level.max(1));
        (resistance / (level * 5.0) * 0.75).clamp(0.0, 0.75)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armor_reduction_monotonic() {
        let mechanics = ClassicMechanics;
        let mut previous = -1.0;
        for armor in (0..20_000).step_by(500) {
            let reduction = mechanics.armor_reduction(armor as f64, 60);
            assert!(reduction >= previous);
            assert!(reduction <= 0.75);
            previous = reduction;
        }
    }

    #[test]
    fn test_armor_reduction_scales_with_level() {
        let mechanics = ClassicMechanics;
        assert!(mechanics.armor_reduction(2000.0, 10) > mechanics.armor_reduction(2000.0, 60));
        assert_eq!(mechanics.armor_reduction(-50.0, 60), 0.0);
    }

    #[test]
    fn test_average_resist() {
        let mechanics = ClassicMechanics;
        assert_eq!(mechanics.average_resist(0.0, 60), 0.0);
        assert!((mechanics.average_resist(150.0, 60) - 0.375).abs() < 1e-9);
        assert_eq!(mechanics.average_resist(10_000.0, 60), 0.75);
    }

    #[test]
    fn test_resist_chances_expected_value() {
        let mechanics = ClassicMechanics;
        for resistance in [0.0, 40.0, 75.0, 150.0, 222.0, 300.0, 1000.0] {
            let chances = mechanics.resist_chances(resistance, 60);
            let expected = 0.75 * chances.resist_75 + 0.5 * chances.resist_50 + 0.25 * chances.resist_25;
            let average = mechanics.average_resist(resistance, 60);
            assert!((expected - average).abs() < 1e-9, "resistance {resistance}");
            assert!(chances.total() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_resist_chances_zero_resistance() {
        let chances = ClassicMechanics.resist_chances(0.0, 60);
        assert_eq!(chances, ResistChances::default());
    }
}
