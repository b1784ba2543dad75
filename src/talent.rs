//! Talents and the rank-effect binding between talents and their targets.
//!
//! A talent never inspects the spells or buffs it changes. It holds typed
//! [`TargetHandle`]s resolved once at setup and, on every rank change,
//! asks the owner to hand out each target through the [`RankScoped`]
//! capability. Every [`RankEffect`] is additive, and fractional
//! magnitudes are kept as [`RankedMagnitude`] counts rather than running
//! float sums, so applying and removing a rank are exact inverses and
//! talents touching the same target commute bit for bit.

use crate::error::{Result, SimError};
use crate::ids::{BuffId, SpellId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One rank's worth of change to a spell or buff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RankEffect {
    /// Bump the target's own rank counter.
    Rank,
    /// Additional damage fraction (0.2 = +20%).
    DamageBonus(f64),
    /// Seconds removed from the cooldown.
    CooldownReduction(f64),
    /// Resource points removed from the cost.
    CostReduction(u32),
    /// Additional critical strike chance for this spell.
    CritBonus(f64),
    /// Make the spell usable. The spell is enabled while at least one
    /// unlock rank is held.
    Unlock,
    /// Seconds added to a buff's duration.
    DurationBonus(f64),
}

/// Capability a talent target must expose: rank-scoped increase/decrease.
///
/// Implementations must make `decrease_rank(e)` undo `increase_rank(e)`
/// exactly.
pub trait RankScoped {
    fn increase_rank(&mut self, effect: &RankEffect) -> Result<()>;
    fn decrease_rank(&mut self, effect: &RankEffect) -> Result<()>;
}

/// A fractional magnitude built from per-rank contributions.
///
/// Each distinct contribution is counted rather than folded into a running
/// sum, and the total is recomputed from the counts in a fixed order. Adding
/// and then removing a contribution therefore restores the previous total
/// exactly, whatever else is stacked on the same target.
///
/// # Examples
///
/// ```rust
/// use combatsim::RankedMagnitude;
///
/// let mut bonus = RankedMagnitude::default();
/// bonus.add(0.1);
/// let before = bonus.total();
///
/// bonus.add(0.2);
/// assert!(bonus.remove(0.2));
/// assert_eq!(bonus.total(), before);
/// assert!(!bonus.remove(0.2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedMagnitude {
    // Contribution bit pattern -> number of ranks holding it.
    counts: BTreeMap<u64, u32>,
    total: f64,
}

impl RankedMagnitude {
    /// Add one rank contributing `amount`.
    pub fn add(&mut self, amount: f64) {
        *self.counts.entry(amount.to_bits()).or_insert(0) += 1;
        self.recompute();
    }

    /// Remove one rank contributing `amount`.
    ///
    /// Returns `false` and changes nothing if no rank holds `amount`.
    pub fn remove(&mut self, amount: f64) -> bool {
        let bits = amount.to_bits();
        let Some(count) = self.counts.get_mut(&bits) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&bits);
        }
        self.recompute();
        true
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    fn recompute(&mut self) {
        self.total = self
            .counts
            .iter()
            .fold(0.0, |sum, (bits, count)| sum + f64::from_bits(*bits) * f64::from(*count));
    }
}

/// What a talent points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetHandle {
    Spell(SpellId),
    Buff(BuffId),
}

/// Something that owns talent targets and can lend them out.
pub trait RankTargets {
    fn rank_target_mut(&mut self, handle: TargetHandle) -> Result<&mut dyn RankScoped>;
}

/// A handle plus the effect one rank has on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentTarget {
    pub handle: TargetHandle,
    pub effect: RankEffect,
}

/// Applies and removes rank effects across a talent's targets.
pub struct TalentEffectBinder;

impl TalentEffectBinder {
    /// Apply one rank of every target's effect.
    ///
    /// All-or-nothing: if a target rejects its effect, the targets already
    /// changed are rolled back before the error is returned.
    pub fn apply_rank_effect(targets: &[TalentTarget], owner: &mut dyn RankTargets) -> Result<()> {
        for (index, target) in targets.iter().enumerate() {
            let applied = owner
                .rank_target_mut(target.handle)
                .and_then(|scoped| scoped.increase_rank(&target.effect));
            if let Err(err) = applied {
                Self::undo(&targets[..index], owner, true);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Remove one rank of every target's effect. All-or-nothing.
    pub fn remove_rank_effect(targets: &[TalentTarget], owner: &mut dyn RankTargets) -> Result<()> {
        for (index, target) in targets.iter().enumerate() {
            let removed = owner
                .rank_target_mut(target.handle)
                .and_then(|scoped| scoped.decrease_rank(&target.effect));
            if let Err(err) = removed {
                Self::undo(&targets[..index], owner, false);
                return Err(err);
            }
        }
        Ok(())
    }

    fn undo(done: &[TalentTarget], owner: &mut dyn RankTargets, was_increase: bool) {
        for target in done.iter().rev() {
            if let Ok(scoped) = owner.rank_target_mut(target.handle) {
                // Reversing a change that just succeeded cannot fail.
                let _ = if was_increase {
                    scoped.decrease_rank(&target.effect)
                } else {
                    scoped.increase_rank(&target.effect)
                };
            }
        }
    }
}

/// Column of a talent within its tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TalentColumn {
    LeftLeft,
    MiddleLeft,
    MiddleRight,
    RightRight,
}

/// Where a talent sits in its tree, written like `"5ML"`.
///
/// # Examples
///
/// ```rust
/// use combatsim::{TalentColumn, TalentPosition};
///
/// let position: TalentPosition = "5ML".parse().unwrap();
/// assert_eq!(position.tier, 5);
/// assert_eq!(position.column, TalentColumn::MiddleLeft);
/// assert_eq!(position.to_string(), "5ML");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TalentPosition {
    pub tier: u32,
    pub column: TalentColumn,
}

impl FromStr for TalentPosition {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SimError::InvalidPosition(s.to_string());
        let split = s.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        let (tier, column) = s.split_at(split);
        let tier: u32 = tier.parse().map_err(|_| invalid())?;
        if tier == 0 {
            return Err(invalid());
        }
        let column = match column {
            "LL" => TalentColumn::LeftLeft,
            "ML" => TalentColumn::MiddleLeft,
            "MR" => TalentColumn::MiddleRight,
            "RR" => TalentColumn::RightRight,
            _ => return Err(invalid()),
        };
        Ok(Self { tier, column })
    }
}

impl fmt::Display for TalentPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = match self.column {
            TalentColumn::LeftLeft => "LL",
            TalentColumn::MiddleLeft => "ML",
            TalentColumn::MiddleRight => "MR",
            TalentColumn::RightRight => "RR",
        };
        write!(f, "{}{}", self.tier, column)
    }
}

/// A talent with ranks that change spells and buffs.
///
/// # Examples
///
/// ```rust
/// use combatsim::{Buff, Character, RankEffect, Talent};
///
/// let mut warrior = Character::new("Warrior", 60);
/// let death_wish = warrior.add_buff(Buff::new("Death Wish", 30.0).with_physical_damage_per_rank(0.2));
///
/// let mut talent = Talent::new("Death Wish", "5ML", "spell_shadow_deathpact", 1)
///     .unwrap()
///     .with_buff_target(death_wish, RankEffect::Rank);
///
/// talent.increment_rank(&mut warrior).unwrap();
/// assert_eq!(warrior.buff(death_wish).unwrap().rank(), 1);
/// assert!(talent.increment_rank(&mut warrior).is_err());
///
/// talent.decrement_rank(&mut warrior).unwrap();
/// assert_eq!(warrior.buff(death_wish).unwrap().rank(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Talent {
    name: String,
    icon: String,
    position: TalentPosition,
    max_rank: u32,
    current_rank: u32,
    rank_descriptions: Vec<String>,
    targets: Vec<TalentTarget>,
}

impl Talent {
    /// Create a rank-0 talent at `position` (e.g. `"5ML"`).
    pub fn new(name: impl Into<String>, position: &str, icon: impl Into<String>, max_rank: u32) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            icon: icon.into(),
            position: position.parse()?,
            max_rank,
            current_rank: 0,
            rank_descriptions: Vec::new(),
            targets: Vec::new(),
        })
    }

    /// Descriptions indexed by rank, starting with rank 0.
    pub fn with_rank_descriptions<I, S>(mut self, descriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rank_descriptions = descriptions.into_iter().map(Into::into).collect();
        self
    }

    /// Add a spell this talent changes by `effect` per rank.
    pub fn with_spell_target(mut self, spell: SpellId, effect: RankEffect) -> Self {
        self.targets.push(TalentTarget {
            handle: TargetHandle::Spell(spell),
            effect,
        });
        self
    }

    /// Add a buff this talent changes by `effect` per rank.
    pub fn with_buff_target(mut self, buff: BuffId, effect: RankEffect) -> Self {
        self.targets.push(TalentTarget {
            handle: TargetHandle::Buff(buff),
            effect,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn position(&self) -> TalentPosition {
        self.position
    }

    pub fn tier(&self) -> u32 {
        self.position.tier
    }

    pub fn max_rank(&self) -> u32 {
        self.max_rank
    }

    pub fn current_rank(&self) -> u32 {
        self.current_rank
    }

    pub fn is_maxed(&self) -> bool {
        self.current_rank == self.max_rank
    }

    pub fn targets(&self) -> &[TalentTarget] {
        &self.targets
    }

    /// Description for `rank`, if one was provided.
    pub fn rank_description(&self, rank: u32) -> Option<&str> {
        self.rank_descriptions.get(rank as usize).map(String::as_str)
    }

    /// Add a rank, applying its effect to every target once.
    pub fn increment_rank(&mut self, owner: &mut dyn RankTargets) -> Result<()> {
        if self.current_rank >= self.max_rank {
            return Err(SimError::TalentAtMaxRank {
                talent: self.name.clone(),
                max_rank: self.max_rank,
            });
        }
        TalentEffectBinder::apply_rank_effect(&self.targets, owner)?;
        self.current_rank += 1;
        Ok(())
    }

    /// Remove a rank, removing its effect from every target once.
    pub fn decrement_rank(&mut self, owner: &mut dyn RankTargets) -> Result<()> {
        if self.current_rank == 0 {
            return Err(SimError::TalentAtMinRank(self.name.clone()));
        }
        TalentEffectBinder::remove_rank_effect(&self.targets, owner)?;
        self.current_rank -= 1;
        Ok(())
    }
}
