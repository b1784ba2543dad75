//! Talent trees: point spending with tier gates and prerequisites.
//!
//! A tree owns its [`Talent`]s and a [`TalentGraph`] of prerequisites. Every
//! rank change goes through [`Talent::increment_rank`] or
//! [`Talent::decrement_rank`], so each point spent or refunded applies or
//! removes its rank effect exactly once.

use crate::config::SimulationConfig;
use crate::error::{Result, SimError};
use crate::graph::TalentGraph;
use crate::talent::{RankTargets, Talent};
use std::collections::HashMap;
use tracing::debug;

/// A named set of talents.
///
/// # Examples
///
/// ```rust
/// use combatsim::{Character, RankEffect, Spell, SpellKind, AttackCategory, Talent, TalentTree};
///
/// let mut warrior = Character::new("Warrior", 60);
/// let strike = warrior.add_spell(Spell::new(
///     "Heroic Strike",
///     "ability_rogue_ambush",
///     SpellKind::DirectDamage { min: 157, max: 157, category: AttackCategory::MeleeSpecial },
/// ));
///
/// let mut arms = TalentTree::new("Arms", 5);
/// arms.add_talent(
///     Talent::new("Improved Heroic Strike", "1ML", "ability_rogue_ambush", 3)
///         .unwrap()
///         .with_spell_target(strike, RankEffect::CostReduction(1)),
/// );
///
/// arms.apply_setup(&[("Improved Heroic Strike", 3)], &mut warrior).unwrap();
/// assert_eq!(arms.total_points(), 3);
///
/// arms.clear(&mut warrior).unwrap();
/// assert_eq!(arms.total_points(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TalentTree {
    name: String,
    points_per_tier: u32,
    talents: Vec<Talent>,
    index: HashMap<String, usize>,
    graph: TalentGraph,
}

impl TalentTree {
    /// Create an empty tree. A talent in tier `t` needs
    /// `(t - 1) * points_per_tier` points in lower tiers.
    pub fn new(name: impl Into<String>, points_per_tier: u32) -> Self {
        Self {
            name: name.into(),
            points_per_tier,
            ..Self::default()
        }
    }

    /// Create an empty tree gated by `config.points_per_tier`.
    pub fn from_config(name: impl Into<String>, config: &SimulationConfig) -> Self {
        Self::new(name, config.points_per_tier)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a talent, replacing any talent with the same name.
    pub fn add_talent(&mut self, talent: Talent) {
        self.graph.add_node(talent.name());
        match self.index.get(talent.name()) {
            Some(&idx) => self.talents[idx] = talent,
            None => {
                self.index.insert(talent.name().to_string(), self.talents.len());
                self.talents.push(talent);
            }
        }
    }

    /// Require `prerequisite` at max rank before `talent` can take ranks.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownTalent`] if either talent is missing, and
    /// [`SimError::PrerequisiteCycle`] if the link would close a cycle (the
    /// link is not kept).
    pub fn set_prerequisite(&mut self, talent: &str, prerequisite: &str) -> Result<()> {
        self.position(talent)?;
        self.position(prerequisite)?;
        self.graph.add_prerequisite(talent, prerequisite);
        if let Err(err) = self.graph.detect_cycles() {
            self.graph.remove_prerequisite(talent, prerequisite);
            return Err(err);
        }
        Ok(())
    }

    pub fn talents(&self) -> &[Talent] {
        &self.talents
    }

    pub fn talent(&self, name: &str) -> Result<&Talent> {
        Ok(&self.talents[self.position(name)?])
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| SimError::UnknownTalent(name.to_string()))
    }

    /// Points spent in the whole tree.
    pub fn total_points(&self) -> u32 {
        self.talents.iter().map(Talent::current_rank).sum()
    }

    /// Points spent in tiers strictly below `tier`.
    pub fn points_below_tier(&self, tier: u32) -> u32 {
        self.talents
            .iter()
            .filter(|talent| talent.tier() < tier)
            .map(Talent::current_rank)
            .sum()
    }

    fn required_for_tier(&self, tier: u32) -> u32 {
        tier.saturating_sub(1) * self.points_per_tier
    }

    /// Spend one point in `name`.
    ///
    /// # Errors
    ///
    /// [`SimError::TierLocked`], [`SimError::PrerequisiteNotMet`],
    /// [`SimError::TalentAtMaxRank`], or whatever the rank effect reports.
    pub fn increment_rank(&mut self, name: &str, owner: &mut dyn RankTargets) -> Result<()> {
        let idx = self.position(name)?;
        let tier = self.talents[idx].tier();
        let required = self.required_for_tier(tier);
        let spent = self.points_below_tier(tier);
        if spent < required {
            return Err(SimError::TierLocked {
                talent: name.to_string(),
                required,
                spent,
            });
        }

        for prerequisite in self.graph.prerequisites(name) {
            if !self.talent(&prerequisite)?.is_maxed() {
                return Err(SimError::PrerequisiteNotMet {
                    talent: name.to_string(),
                    prerequisite,
                });
            }
        }

        self.talents[idx].increment_rank(owner)?;
        debug!(tree = %self.name, talent = name, rank = self.talents[idx].current_rank(), "talent rank added");
        Ok(())
    }

    /// Refund one point from `name`.
    ///
    /// # Errors
    ///
    /// [`SimError::RequiredByDependent`] if a dependent talent has ranks or
    /// a higher-tier talent would lose its tier gate, and
    /// [`SimError::TalentAtMinRank`] if `name` has no ranks.
    pub fn decrement_rank(&mut self, name: &str, owner: &mut dyn RankTargets) -> Result<()> {
        let idx = self.position(name)?;
        let talent = &self.talents[idx];
        if talent.current_rank() == 0 {
            return Err(SimError::TalentAtMinRank(name.to_string()));
        }

        for dependent in self.graph.dependents(name) {
            if self.talent(&dependent)?.current_rank() > 0 {
                return Err(SimError::RequiredByDependent {
                    talent: name.to_string(),
                    dependent,
                });
            }
        }

        let tier = talent.tier();
        for higher in self.talents.iter().filter(|t| t.tier() > tier && t.current_rank() > 0) {
            let remaining = self.points_below_tier(higher.tier()) - 1;
            if remaining < self.required_for_tier(higher.tier()) {
                return Err(SimError::RequiredByDependent {
                    talent: name.to_string(),
                    dependent: higher.name().to_string(),
                });
            }
        }

        self.talents[idx].decrement_rank(owner)?;
        debug!(tree = %self.name, talent = name, rank = self.talents[idx].current_rank(), "talent rank removed");
        Ok(())
    }

    /// Refund every point, dependents before their prerequisites.
    ///
    /// Each refunded rank removes its effect exactly once.
    pub fn clear(&mut self, owner: &mut dyn RankTargets) -> Result<()> {
        let mut order = self.graph.topological_sort()?;
        order.reverse();
        // Within the prerequisite order, higher tiers go first.
        order.sort_by_key(|name| {
            std::cmp::Reverse(self.index.get(name).map_or(0, |&idx| self.talents[idx].tier()))
        });

        for name in order {
            let idx = self.position(&name)?;
            while self.talents[idx].current_rank() > 0 {
                self.talents[idx].decrement_rank(owner)?;
            }
        }
        Ok(())
    }

    /// Clear the tree and spend points according to `setup`.
    ///
    /// Entries are applied lowest tier first, so a setup may list talents
    /// in any order as long as the whole setup is valid.
    pub fn apply_setup(&mut self, setup: &[(&str, u32)], owner: &mut dyn RankTargets) -> Result<()> {
        self.clear(owner)?;

        let mut entries = Vec::with_capacity(setup.len());
        for &(name, rank) in setup {
            let idx = self.position(name)?;
            entries.push((self.talents[idx].tier(), name, rank));
        }
        entries.sort_by_key(|(tier, _, _)| *tier);

        for (_, name, rank) in entries {
            for _ in 0..rank {
                self.increment_rank(name, owner)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buff::Buff;
    use crate::character::Character;
    use crate::ids::{BuffId, SpellId};
    use crate::roll::AttackCategory;
    use crate::spell::{Spell, SpellKind};
    use crate::talent::RankEffect;

    struct Fixture {
        warrior: Character,
        tree: TalentTree,
        strike: SpellId,
        death_wish: BuffId,
    }

    fn fixture() -> Fixture {
        let mut warrior = Character::new("Warrior", 60);
        let strike = warrior.add_spell(Spell::new(
            "Heroic Strike",
            "ability_rogue_ambush",
            SpellKind::DirectDamage {
                min: 157,
                max: 157,
                category: AttackCategory::MeleeSpecial,
            },
        ));
        let death_wish = warrior.add_buff(Buff::new("Death Wish", 30.0).with_physical_damage_per_rank(0.2));

        let mut tree = TalentTree::new("Fury", 5);
        tree.add_talent(
            Talent::new("Cruelty", "1MR", "ability_rogue_eviscerate", 5)
                .unwrap()
                .with_spell_target(strike, RankEffect::CritBonus(0.01)),
        );
        tree.add_talent(
            Talent::new("Unbridled Wrath", "2MR", "spell_nature_stoneclawtotem", 5)
                .unwrap()
                .with_spell_target(strike, RankEffect::DamageBonus(0.02)),
        );
        tree.add_talent(
            Talent::new("Death Wish", "5ML", "spell_shadow_deathpact", 1)
                .unwrap()
                .with_buff_target(death_wish, RankEffect::Rank),
        );
        tree.add_talent(
            Talent::new("Improved Death Wish", "6ML", "spell_shadow_deathpact", 2)
                .unwrap()
                .with_buff_target(death_wish, RankEffect::DurationBonus(3.0)),
        );
        tree.set_prerequisite("Improved Death Wish", "Death Wish").unwrap();

        Fixture {
            warrior,
            tree,
            strike,
            death_wish,
        }
    }

    #[test]
    fn test_spend_points() {
        let mut f = fixture();
        for _ in 0..5 {
            f.tree.increment_rank("Cruelty", &mut f.warrior).unwrap();
        }
        assert!(matches!(
            f.tree.increment_rank("Cruelty", &mut f.warrior),
            Err(SimError::TalentAtMaxRank { .. })
        ));
        assert_eq!(f.warrior.spell(f.strike).unwrap().crit_bonus(), 0.01 * 5.0);

        f.tree.increment_rank("Unbridled Wrath", &mut f.warrior).unwrap();
        assert_eq!(f.tree.total_points(), 6);
    }

    #[test]
    fn test_tier_gate() {
        let mut f = fixture();
        assert_eq!(
            f.tree.increment_rank("Unbridled Wrath", &mut f.warrior),
            Err(SimError::TierLocked {
                talent: "Unbridled Wrath".to_string(),
                required: 5,
                spent: 0,
            })
        );
        assert!(matches!(
            f.tree.increment_rank("Death Wish", &mut f.warrior),
            Err(SimError::TierLocked { required: 20, .. })
        ));
    }

    #[test]
    fn test_refund_blocked_by_higher_tier() {
        let mut f = fixture();
        f.tree
            .apply_setup(&[("Cruelty", 5), ("Unbridled Wrath", 1)], &mut f.warrior)
            .unwrap();
        assert!(matches!(
            f.tree.decrement_rank("Cruelty", &mut f.warrior),
            Err(SimError::RequiredByDependent { ref dependent, .. }) if dependent == "Unbridled Wrath"
        ));
        f.tree.decrement_rank("Unbridled Wrath", &mut f.warrior).unwrap();
        f.tree.decrement_rank("Cruelty", &mut f.warrior).unwrap();
    }

    #[test]
    fn test_prerequisite_and_dependent() {
        let mut f = fixture();
        f.tree.points_per_tier = 0;

        assert!(matches!(
            f.tree.increment_rank("Improved Death Wish", &mut f.warrior),
            Err(SimError::PrerequisiteNotMet { .. })
        ));
        f.tree.increment_rank("Death Wish", &mut f.warrior).unwrap();
        f.tree.increment_rank("Improved Death Wish", &mut f.warrior).unwrap();
        assert_eq!(f.warrior.buff(f.death_wish).unwrap().duration(), 33.0);

        assert!(matches!(
            f.tree.decrement_rank("Death Wish", &mut f.warrior),
            Err(SimError::RequiredByDependent { .. })
        ));
    }

    #[test]
    fn test_prerequisite_cycle_is_rejected() {
        let mut f = fixture();
        assert!(matches!(
            f.tree.set_prerequisite("Death Wish", "Improved Death Wish"),
            Err(SimError::PrerequisiteCycle { .. })
        ));
        // The rejected link is not kept.
        assert!(f.tree.graph.detect_cycles().is_ok());
        assert!(matches!(
            f.tree.set_prerequisite("Death Wish", "Flurry"),
            Err(SimError::UnknownTalent(_))
        ));
    }

    #[test]
    fn test_clear_filled_tree_restores_targets() {
        let mut f = fixture();
        f.tree.points_per_tier = 0;
        f.tree
            .apply_setup(
                &[
                    ("Improved Death Wish", 2),
                    ("Death Wish", 1),
                    ("Unbridled Wrath", 5),
                    ("Cruelty", 5),
                ],
                &mut f.warrior,
            )
            .unwrap();
        assert_eq!(f.tree.total_points(), 13);
        assert_eq!(f.warrior.buff(f.death_wish).unwrap().rank(), 1);

        f.tree.clear(&mut f.warrior).unwrap();
        assert_eq!(f.tree.total_points(), 0);
        let strike = f.warrior.spell(f.strike).unwrap();
        assert_eq!(strike.crit_bonus(), 0.0);
        assert_eq!(strike.damage_bonus(), 0.0);
        let buff = f.warrior.buff(f.death_wish).unwrap();
        assert_eq!(buff.rank(), 0);
        assert_eq!(buff.duration(), 30.0);
    }

    #[test]
    fn test_refill_after_switching_setup() {
        let mut f = fixture();
        f.tree.apply_setup(&[("Cruelty", 5)], &mut f.warrior).unwrap();
        f.tree
            .apply_setup(&[("Cruelty", 3), ("Unbridled Wrath", 2)], &mut f.warrior)
            .unwrap_err();
        // The next setup starts from a cleared tree.
        f.tree
            .apply_setup(&[("Unbridled Wrath", 2), ("Cruelty", 5)], &mut f.warrior)
            .unwrap();

        assert_eq!(f.tree.talent("Cruelty").unwrap().current_rank(), 5);
        assert_eq!(f.tree.talent("Unbridled Wrath").unwrap().current_rank(), 2);
        let strike = f.warrior.spell(f.strike).unwrap();
        assert_eq!(strike.crit_bonus(), 0.01 * 5.0);
        assert_eq!(strike.damage_bonus(), 0.02 * 2.0);
    }
}
