//! Combat roll resolution.
//!
//! An attack's outcome comes from one uniform draw in `[0, 1)` checked
//! against a table of mutually exclusive bands. Bands are laid out in a
//! fixed order and the first band containing the draw wins:
//!
//! ```text
//! miss -> dodge -> parry -> glancing -> block -> critical -> partial resists -> hit
//! ```
//!
//! Whatever probability is left after the listed bands is a normal hit.

use crate::context::SimContext;
use crate::error::{Result, SimError};
use crate::mechanics::{ClassicMechanics, Mechanics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Schools of magical damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MagicSchool {
    Arcane,
    Fire,
    Frost,
    Holy,
    Nature,
    Shadow,
}

/// What kind of attack is being rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackCategory {
    /// White melee swings. The only category that can glance.
    MeleeAutoAttack,
    /// Yellow melee abilities.
    MeleeSpecial,
    /// Ranged weapon attacks. Cannot be parried.
    Ranged,
    /// Spells of the given school. Cannot be dodged, parried or blocked.
    Magic(MagicSchool),
}

impl AttackCategory {
    /// Whether the attack uses the magical table.
    pub fn is_magical(self) -> bool {
        matches!(self, AttackCategory::Magic(_))
    }

    /// Whether the attack is a melee attack.
    pub fn is_melee(self) -> bool {
        matches!(
            self,
            AttackCategory::MeleeAutoAttack | AttackCategory::MeleeSpecial
        )
    }
}

/// Partial-resist magnitude of a magical attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResistTier {
    /// Nothing gets through.
    Full,
    /// 75% of the damage is resisted.
    Resist75,
    /// 50% of the damage is resisted.
    Resist50,
    /// 25% of the damage is resisted.
    Resist25,
    /// Nothing is resisted.
    None,
}

impl ResistTier {
    /// Integer code of the tier, as exchanged with statistics and reporting.
    pub fn code(self) -> i32 {
        match self {
            ResistTier::None => 0,
            ResistTier::Resist25 => 1,
            ResistTier::Resist50 => 2,
            ResistTier::Resist75 => 3,
            ResistTier::Full => 4,
        }
    }

    /// Decode a tier code.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownResistTier`] for any code outside the table.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(ResistTier::None),
            1 => Ok(ResistTier::Resist25),
            2 => Ok(ResistTier::Resist50),
            3 => Ok(ResistTier::Resist75),
            4 => Ok(ResistTier::Full),
            other => Err(SimError::UnknownResistTier(other)),
        }
    }
}

/// The result of one combat roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Miss,
    Dodge,
    Parry,
    Glancing,
    Block,
    /// A blocked attack that was also a critical strike.
    BlockCritical,
    Critical,
    /// A magical resist of the given tier. A spell miss is `Resist(Full)`.
    Resist(ResistTier),
    Hit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Resist(tier) => write!(f, "Resist({tier:?})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Attacker stats consumed by the roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackerStats {
    pub level: u32,
    pub weapon_skill: u32,
    /// Melee/ranged hit chance from gear, as a fraction.
    pub hit_chance: f64,
    pub crit_chance: f64,
    pub spell_hit_chance: f64,
    pub spell_crit_chance: f64,
    /// Dual wielding adds a flat miss penalty to auto attacks.
    pub dual_wield: bool,
}

impl Default for AttackerStats {
    fn default() -> Self {
        Self {
            level: 60,
            weapon_skill: 300,
            hit_chance: 0.0,
            crit_chance: 0.05,
            spell_hit_chance: 0.0,
            spell_crit_chance: 0.05,
            dual_wield: false,
        }
    }
}

/// Defender stats consumed by the roll and the damage pipeline.
///
/// Zero avoidance chances mean the defender cannot dodge, parry or block
/// at all (e.g. attacked from behind).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenderStats {
    pub level: u32,
    pub armor: f64,
    pub dodge_chance: f64,
    pub parry_chance: f64,
    pub block_chance: f64,
    pub block_value: f64,
    pub resistances: BTreeMap<MagicSchool, f64>,
}

impl Default for DefenderStats {
    fn default() -> Self {
        Self {
            level: 63,
            armor: 3731.0,
            dodge_chance: 0.05,
            parry_chance: 0.0,
            block_chance: 0.0,
            block_value: 0.0,
            resistances: BTreeMap::new(),
        }
    }
}

impl DefenderStats {
    /// Defense skill implied by level.
    pub fn defense_skill(&self) -> u32 {
        self.level * 5
    }

    /// Resistance against `school`; zero when unset.
    pub fn resistance(&self, school: MagicSchool) -> f64 {
        self.resistances.get(&school).copied().unwrap_or(0.0)
    }
}

/// Cumulative outcome bands for one attack.
///
/// # Examples
///
/// ```rust
/// use combatsim::{Outcome, OutcomeTable};
///
/// let mut table = OutcomeTable::new();
/// table.push(0.25, Outcome::Miss);
/// table.push(0.25, Outcome::Critical);
///
/// assert_eq!(table.resolve(0.10), Outcome::Miss);
/// assert_eq!(table.resolve(0.30), Outcome::Critical);
/// assert_eq!(table.resolve(0.75), Outcome::Hit);
/// assert_eq!(table.chance(Outcome::Hit), 0.5);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutcomeTable {
    bands: Vec<(f64, Outcome)>,
}

impl OutcomeTable {
    /// An empty table: every draw is a hit.
    pub fn new() -> Self {
        Self::default()
    }

    fn covered(&self) -> f64 {
        self.bands.last().map_or(0.0, |(upper, _)| *upper)
    }

    /// Append a band of `width`, clamped so the table never exceeds 1.
    /// Empty bands are skipped.
    pub fn push(&mut self, width: f64, outcome: Outcome) {
        let covered = self.covered();
        let width = width.max(0.0).min(1.0 - covered);
        if width > 0.0 {
            self.bands.push((covered + width, outcome));
        }
    }

    /// The outcome of `draw`, a uniform value in `[0, 1)`.
    pub fn resolve(&self, draw: f64) -> Outcome {
        self.bands
            .iter()
            .find(|(upper, _)| draw < *upper)
            .map_or(Outcome::Hit, |(_, outcome)| *outcome)
    }

    /// Probability the table assigns to `outcome`.
    pub fn chance(&self, outcome: Outcome) -> f64 {
        let mut lower = 0.0;
        let mut total = 0.0;
        for (upper, band) in &self.bands {
            if *band == outcome {
                total += upper - lower;
            }
            lower = *upper;
        }
        if outcome == Outcome::Hit {
            total += 1.0 - self.covered();
        }
        total
    }

    /// Build the table for a physical or magical attack.
    pub fn build(
        attacker: &AttackerStats,
        defender: &DefenderStats,
        category: AttackCategory,
        mechanics: &dyn Mechanics,
    ) -> Self {
        match category {
            AttackCategory::Magic(school) => Self::magical(attacker, defender, school, mechanics),
            physical => Self::physical(attacker, defender, physical),
        }
    }

    fn physical(attacker: &AttackerStats, defender: &DefenderStats, category: AttackCategory) -> Self {
        let defense = f64::from(defender.defense_skill());
        let skill = f64::from(attacker.weapon_skill);
        let skill_diff = defense - skill;

        let mut miss = if skill_diff > 10.0 {
            0.07 + (skill_diff - 10.0) * 0.004
        } else {
            0.05 + skill_diff * 0.001
        };
        if category == AttackCategory::MeleeAutoAttack && attacker.dual_wield {
            miss += 0.19;
        }
        // One point of hit is lost against targets more than 10 skill above.
        let hit = if skill_diff > 10.0 {
            attacker.hit_chance - 0.01
        } else {
            attacker.hit_chance
        };
        let miss = (miss - hit.max(0.0)).max(0.0);

        let dodge = if defender.dodge_chance > 0.0 {
            (defender.dodge_chance + skill_diff * 0.001).max(0.0)
        } else {
            0.0
        };

        let parry = if category.is_melee() && defender.parry_chance > 0.0 {
            (defender.parry_chance + skill_diff * 0.001).max(0.0)
        } else {
            0.0
        };

        let glancing = if category == AttackCategory::MeleeAutoAttack
            && defender.level >= attacker.level
        {
            let capped_skill = skill.min(f64::from(attacker.level * 5));
            (0.1 + (defense - capped_skill) * 0.02).clamp(0.0, 0.4)
        } else {
            0.0
        };

        let crit_suppression = if skill_diff > 0.0 {
            skill_diff * 0.002
        } else {
            skill_diff * 0.0004
        };
        let crit = (attacker.crit_chance - crit_suppression).max(0.0);

        let block = defender.block_chance.max(0.0);
        let block_crit = block * crit.min(1.0);

        let mut table = Self::new();
        table.push(miss, Outcome::Miss);
        table.push(dodge, Outcome::Dodge);
        table.push(parry, Outcome::Parry);
        table.push(glancing, Outcome::Glancing);
        table.push(block - block_crit, Outcome::Block);
        table.push(block_crit, Outcome::BlockCritical);
        table.push(crit, Outcome::Critical);
        table
    }

    fn magical(
        attacker: &AttackerStats,
        defender: &DefenderStats,
        school: MagicSchool,
        mechanics: &dyn Mechanics,
    ) -> Self {
        let level_diff = i64::from(defender.level) - i64::from(attacker.level);
        let base_miss = if level_diff <= 2 {
            0.04 + 0.01 * level_diff as f64
        } else {
            0.06 + 0.11 * (level_diff - 2) as f64
        };
        let miss = (base_miss - attacker.spell_hit_chance).clamp(0.01, 0.99);

        let mut table = Self::new();
        table.push(miss, Outcome::Resist(ResistTier::Full));
        table.push(attacker.spell_crit_chance, Outcome::Critical);

        // Resist tiers split whatever lands without critting.
        let landing = 1.0 - table.covered();
        let chances = mechanics.resist_chances(defender.resistance(school), attacker.level);
        table.push(chances.resist_75 * landing, Outcome::Resist(ResistTier::Resist75));
        table.push(chances.resist_50 * landing, Outcome::Resist(ResistTier::Resist50));
        table.push(chances.resist_25 * landing, Outcome::Resist(ResistTier::Resist25));
        table
    }
}

/// Rolls combat outcomes using a [`Mechanics`] implementation.
#[derive(Clone)]
pub struct CombatRoll {
    mechanics: Arc<dyn Mechanics>,
}

impl CombatRoll {
    /// Create a roller backed by `mechanics`.
    pub fn new(mechanics: Arc<dyn Mechanics>) -> Self {
        Self { mechanics }
    }

    /// The formulas in use.
    pub fn mechanics(&self) -> &dyn Mechanics {
        self.mechanics.as_ref()
    }

    /// The outcome table for an attack, without rolling it.
    pub fn outcome_table(
        &self,
        attacker: &AttackerStats,
        defender: &DefenderStats,
        category: AttackCategory,
    ) -> OutcomeTable {
        OutcomeTable::build(attacker, defender, category, self.mechanics.as_ref())
    }

    /// Roll one attack, consuming exactly one draw from the context.
    pub fn roll(
        &self,
        ctx: &mut SimContext,
        attacker: &AttackerStats,
        defender: &DefenderStats,
        category: AttackCategory,
    ) -> Outcome {
        let table = self.outcome_table(attacker, defender, category);
        table.resolve(ctx.draw())
    }
}

impl Default for CombatRoll {
    fn default() -> Self {
        Self::new(Arc::new(ClassicMechanics))
    }
}

impl fmt::Debug for CombatRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatRoll").finish_non_exhaustive()
    }
}
