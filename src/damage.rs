//! Damage pipeline.
//!
//! Turns base damage and a rolled [`Outcome`] into the amount dealt:
//!
//! ```text
//! physical: base x physical modifier x (1 - armor reduction) x outcome multiplier
//! magical:  base x spell modifier x resist multiplier x outcome multiplier
//! ```
//!
//! The result carries the statistics category it belongs to, or the kind
//! of avoidance when nothing got through, plus a step-by-step breakdown.

use crate::error::Result;
use crate::mechanics::Mechanics;
use crate::roll::{AttackCategory, Outcome, ResistTier};
use serde::{Deserialize, Serialize};

/// Damage multiplier of a resist tier.
///
/// # Examples
///
/// ```rust
/// use combatsim::{resist_multiplier, ResistTier};
///
/// assert_eq!(resist_multiplier(ResistTier::Full), 0.0);
/// assert_eq!(resist_multiplier(ResistTier::Resist75), 0.25);
/// assert_eq!(resist_multiplier(ResistTier::None), 1.0);
/// ```
pub fn resist_multiplier(tier: ResistTier) -> f64 {
    match tier {
        ResistTier::Full => 0.0,
        ResistTier::Resist75 => 0.25,
        ResistTier::Resist50 => 0.5,
        ResistTier::Resist25 => 0.75,
        ResistTier::None => 1.0,
    }
}

/// Damage multiplier for a raw resist tier code.
///
/// # Errors
///
/// [`SimError::UnknownResistTier`](crate::SimError::UnknownResistTier) when
/// the code is not in the table. There is no fallback multiplier.
pub fn partial_resist_dmg_modifier(code: i32) -> Result<f64> {
    Ok(resist_multiplier(ResistTier::from_code(code)?))
}

/// Statistics category of damage that got through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageCategory {
    Hit,
    Crit,
    Glancing,
    PartialResist,
    PartialBlock,
    PartialBlockCrit,
}

/// Why an attack dealt no damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Avoidance {
    Miss,
    Dodge,
    Parry,
    FullResist,
    /// The block value absorbed the whole hit.
    FullBlock,
}

/// Modifiers that apply to one damage instance.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageModifiers {
    /// Caster's total physical damage modifier, buffs included.
    pub physical_damage_modifier: f64,
    /// Caster's total spell damage modifier.
    pub spell_damage_modifier: f64,
    pub target_armor: f64,
    pub attacker_level: u32,
    pub block_value: f64,
    pub crit_multiplier: f64,
    pub spell_crit_multiplier: f64,
    pub glancing_multiplier: f64,
}

impl Default for DamageModifiers {
    fn default() -> Self {
        Self {
            physical_damage_modifier: 1.0,
            spell_damage_modifier: 1.0,
            target_armor: 0.0,
            attacker_level: 60,
            block_value: 0.0,
            crit_multiplier: 2.0,
            spell_crit_multiplier: 1.5,
            glancing_multiplier: 0.7,
        }
    }
}

/// Damage that got through, with its breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDamage {
    pub category: DamageCategory,
    /// Final damage, rounded to whole points.
    pub amount: u32,
    /// `(step, value after step)` in application order.
    pub steps: Vec<(String, f64)>,
}

impl ResolvedDamage {
    fn new(category: DamageCategory, value: f64, steps: Vec<(String, f64)>) -> Self {
        Self {
            category,
            amount: value.max(0.0).round() as u32,
            steps,
        }
    }
}

/// Result of running an outcome through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum DamageResult {
    Avoided(Avoidance),
    Dealt(ResolvedDamage),
}

/// Applies modifiers to base damage.
///
/// # Examples
///
/// ```rust
/// use combatsim::{
///     AttackCategory, ClassicMechanics, DamageCategory, DamageModifiers, DamagePipeline,
///     DamageResult, Outcome,
/// };
///
/// let pipeline = DamagePipeline::new(&ClassicMechanics);
/// let modifiers = DamageModifiers::default();
///
/// match pipeline.resolve(100.0, Outcome::Critical, AttackCategory::MeleeSpecial, &modifiers) {
///     DamageResult::Dealt(damage) => {
///         assert_eq!(damage.category, DamageCategory::Crit);
///         assert_eq!(damage.amount, 200);
///     }
///     DamageResult::Avoided(_) => unreachable!(),
/// }
/// ```
#[derive(Clone, Copy)]
pub struct DamagePipeline<'a> {
    mechanics: &'a dyn Mechanics,
}

impl<'a> DamagePipeline<'a> {
    /// Create a pipeline using `mechanics` for armor mitigation.
    pub fn new(mechanics: &'a dyn Mechanics) -> Self {
        Self { mechanics }
    }

    /// Base damage after caster modifiers and armor, before the outcome.
    ///
    /// Pure: identical inputs always give identical output.
    pub fn damage_after_modifiers(
        &self,
        base: f64,
        category: AttackCategory,
        modifiers: &DamageModifiers,
    ) -> f64 {
        if category.is_magical() {
            return base * modifiers.spell_damage_modifier;
        }
        let armor_reduction = 1.0
            - self
                .mechanics
                .armor_reduction(modifiers.target_armor, modifiers.attacker_level);
        base * modifiers.physical_damage_modifier * armor_reduction
    }

    /// Run `base` damage with a rolled `outcome` through the pipeline.
    pub fn resolve(
        &self,
        base: f64,
        outcome: Outcome,
        category: AttackCategory,
        modifiers: &DamageModifiers,
    ) -> DamageResult {
        match outcome {
            Outcome::Miss => return DamageResult::Avoided(Avoidance::Miss),
            Outcome::Dodge => return DamageResult::Avoided(Avoidance::Dodge),
            Outcome::Parry => return DamageResult::Avoided(Avoidance::Parry),
            Outcome::Resist(ResistTier::Full) => {
                return DamageResult::Avoided(Avoidance::FullResist)
            }
            _ => {}
        }

        let mut steps = vec![("base".to_string(), base)];
        let modified = self.damage_after_modifiers(base, category, modifiers);
        let label = if category.is_magical() {
            "spell modifiers"
        } else {
            "physical modifiers and armor"
        };
        steps.push((label.to_string(), modified));

        let crit_multiplier = if category.is_magical() {
            modifiers.spell_crit_multiplier
        } else {
            modifiers.crit_multiplier
        };

        let (category, value) = match outcome {
            // A zero-tier resist takes nothing off and counts as a hit.
            Outcome::Hit | Outcome::Resist(ResistTier::None) => (DamageCategory::Hit, modified),
            Outcome::Critical => {
                let value = modified * crit_multiplier;
                steps.push(("critical".to_string(), value));
                (DamageCategory::Crit, value)
            }
            Outcome::Glancing => {
                let value = modified * modifiers.glancing_multiplier;
                steps.push(("glancing".to_string(), value));
                (DamageCategory::Glancing, value)
            }
            Outcome::Resist(tier) => {
                let value = modified * resist_multiplier(tier);
                steps.push((format!("resist {tier:?}"), value));
                (DamageCategory::PartialResist, value)
            }
            Outcome::Block | Outcome::BlockCritical => {
                let (category, before_block) = if outcome == Outcome::BlockCritical {
                    let value = modified * crit_multiplier;
                    steps.push(("critical".to_string(), value));
                    (DamageCategory::PartialBlockCrit, value)
                } else {
                    (DamageCategory::PartialBlock, modified)
                };
                let value = before_block - modifiers.block_value;
                steps.push(("block".to_string(), value));
                if value.round() < 1.0 {
                    return DamageResult::Avoided(Avoidance::FullBlock);
                }
                (category, value)
            }
            Outcome::Miss | Outcome::Dodge | Outcome::Parry => unreachable!("avoidance handled above"),
        };

        DamageResult::Dealt(ResolvedDamage::new(category, value, steps))
    }
}
