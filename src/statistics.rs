//! Per-spell combat statistics.
//!
//! A [`StatisticsCollector`] records every avoidance and every damage
//! instance, keyed by [`SpellKey`]. Records live in a window opened by
//! [`StatisticsCollector::prepare_set_of_combat_iterations`]; closing the
//! window hands out an immutable [`StatisticsWindow`] for reporting.

use crate::damage::{Avoidance, DamageCategory, DamageResult};
use crate::ids::SpellKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running total for one damage category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageTally {
    pub count: u32,
    pub damage: u64,
    pub resource_cost: u64,
    /// Time of the most recent instance.
    pub last_event_time: f64,
}

impl DamageTally {
    pub fn add(&mut self, damage: u32, resource_cost: u32, time: f64) {
        self.count += 1;
        self.damage += u64::from(damage);
        self.resource_cost += u64::from(resource_cost);
        self.last_event_time = time;
    }

    /// Mean damage per instance; zero when empty.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.damage as f64 / f64::from(self.count)
        }
    }

    fn merge(&mut self, other: &DamageTally) {
        self.count += other.count;
        self.damage += other.damage;
        self.resource_cost += other.resource_cost;
        self.last_event_time = self.last_event_time.max(other.last_event_time);
    }
}

/// Everything recorded for one spell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSpell {
    key: SpellKey,
    casts: u32,
    misses: u32,
    dodges: u32,
    parries: u32,
    full_resists: u32,
    full_blocks: u32,
    hit: DamageTally,
    crit: DamageTally,
    glancing: DamageTally,
    partial_resist: DamageTally,
    partial_block: DamageTally,
    partial_block_crit: DamageTally,
}

impl StatisticsSpell {
    pub fn new(key: SpellKey) -> Self {
        Self {
            key,
            casts: 0,
            misses: 0,
            dodges: 0,
            parries: 0,
            full_resists: 0,
            full_blocks: 0,
            hit: DamageTally::default(),
            crit: DamageTally::default(),
            glancing: DamageTally::default(),
            partial_resist: DamageTally::default(),
            partial_block: DamageTally::default(),
            partial_block_crit: DamageTally::default(),
        }
    }

    pub fn key(&self) -> &SpellKey {
        &self.key
    }

    pub fn record_cast(&mut self) {
        self.casts += 1;
    }

    pub fn increment_miss(&mut self) {
        self.misses += 1;
    }

    pub fn increment_dodge(&mut self) {
        self.dodges += 1;
    }

    pub fn increment_parry(&mut self) {
        self.parries += 1;
    }

    pub fn increment_full_resist(&mut self) {
        self.full_resists += 1;
    }

    pub fn increment_full_block(&mut self) {
        self.full_blocks += 1;
    }

    pub fn increment_avoidance(&mut self, avoidance: Avoidance) {
        match avoidance {
            Avoidance::Miss => self.increment_miss(),
            Avoidance::Dodge => self.increment_dodge(),
            Avoidance::Parry => self.increment_parry(),
            Avoidance::FullResist => self.increment_full_resist(),
            Avoidance::FullBlock => self.increment_full_block(),
        }
    }

    /// Add a damage instance to its category's tally.
    pub fn add_damage(&mut self, category: DamageCategory, damage: u32, resource_cost: u32, time: f64) {
        self.tally_mut(category).add(damage, resource_cost, time);
    }

    /// Record whatever the damage pipeline produced.
    pub fn record_damage(&mut self, result: &DamageResult, resource_cost: u32, time: f64) {
        match result {
            DamageResult::Avoided(avoidance) => self.increment_avoidance(*avoidance),
            DamageResult::Dealt(damage) => {
                self.add_damage(damage.category, damage.amount, resource_cost, time)
            }
        }
    }

    pub fn casts(&self) -> u32 {
        self.casts
    }

    pub fn avoidance_count(&self, avoidance: Avoidance) -> u32 {
        match avoidance {
            Avoidance::Miss => self.misses,
            Avoidance::Dodge => self.dodges,
            Avoidance::Parry => self.parries,
            Avoidance::FullResist => self.full_resists,
            Avoidance::FullBlock => self.full_blocks,
        }
    }

    pub fn tally(&self, category: DamageCategory) -> &DamageTally {
        match category {
            DamageCategory::Hit => &self.hit,
            DamageCategory::Crit => &self.crit,
            DamageCategory::Glancing => &self.glancing,
            DamageCategory::PartialResist => &self.partial_resist,
            DamageCategory::PartialBlock => &self.partial_block,
            DamageCategory::PartialBlockCrit => &self.partial_block_crit,
        }
    }

    fn tally_mut(&mut self, category: DamageCategory) -> &mut DamageTally {
        match category {
            DamageCategory::Hit => &mut self.hit,
            DamageCategory::Crit => &mut self.crit,
            DamageCategory::Glancing => &mut self.glancing,
            DamageCategory::PartialResist => &mut self.partial_resist,
            DamageCategory::PartialBlock => &mut self.partial_block,
            DamageCategory::PartialBlockCrit => &mut self.partial_block_crit,
        }
    }

    fn tallies(&self) -> [&DamageTally; 6] {
        [
            &self.hit,
            &self.crit,
            &self.glancing,
            &self.partial_resist,
            &self.partial_block,
            &self.partial_block_crit,
        ]
    }

    pub fn total_damage(&self) -> u64 {
        self.tallies().iter().map(|t| t.damage).sum()
    }

    /// Damage instances plus avoided attempts.
    pub fn total_attempts(&self) -> u32 {
        let landed: u32 = self.tallies().iter().map(|t| t.count).sum();
        landed + self.misses + self.dodges + self.parries + self.full_resists + self.full_blocks
    }

    /// Add another record's counters to this one.
    pub fn merge(&mut self, other: &StatisticsSpell) {
        self.casts += other.casts;
        self.misses += other.misses;
        self.dodges += other.dodges;
        self.parries += other.parries;
        self.full_resists += other.full_resists;
        self.full_blocks += other.full_blocks;
        self.hit.merge(&other.hit);
        self.crit.merge(&other.crit);
        self.glancing.merge(&other.glancing);
        self.partial_resist.merge(&other.partial_resist);
        self.partial_block.merge(&other.partial_block);
        self.partial_block_crit.merge(&other.partial_block_crit);
    }
}

/// Collects statistics for one window of combat iterations.
///
/// # Examples
///
/// ```rust
/// use combatsim::{DamageCategory, SpellKey, StatisticsCollector};
///
/// let bloodthirst = SpellKey::new("Bloodthirst", "spell_nature_bloodlust");
/// let mut collector = StatisticsCollector::new();
/// collector.prepare_set_of_combat_iterations([bloodthirst.clone()]);
///
/// collector
///     .spell_statistics(&bloodthirst)
///     .add_damage(DamageCategory::Crit, 1200, 30, 4.5);
/// collector.record_iteration(60.0);
///
/// let window = collector.close_window();
/// assert_eq!(window.total_damage(), 1200);
/// assert_eq!(window.dps(), 20.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    records: BTreeMap<SpellKey, StatisticsSpell>,
    iterations: u32,
    combat_time: f64,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new window with a fresh record for every key.
    pub fn prepare_set_of_combat_iterations<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = SpellKey>,
    {
        self.records = keys
            .into_iter()
            .map(|key| (key.clone(), StatisticsSpell::new(key)))
            .collect();
        self.iterations = 0;
        self.combat_time = 0.0;
    }

    /// The record for `key`, created on first use.
    pub fn spell_statistics(&mut self, key: &SpellKey) -> &mut StatisticsSpell {
        self.records
            .entry(key.clone())
            .or_insert_with(|| StatisticsSpell::new(key.clone()))
    }

    /// Count one finished iteration of `combat_length` seconds.
    pub fn record_iteration(&mut self, combat_length: f64) {
        self.iterations += 1;
        self.combat_time += combat_length;
    }

    /// Close the window and hand its records out.
    pub fn close_window(&mut self) -> StatisticsWindow {
        let records = std::mem::take(&mut self.records);
        let window = StatisticsWindow {
            iterations: self.iterations,
            combat_time: self.combat_time,
            spells: records.into_values().collect(),
        };
        self.iterations = 0;
        self.combat_time = 0.0;
        window
    }
}

/// Immutable statistics of a closed window, sorted by spell key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsWindow {
    iterations: u32,
    combat_time: f64,
    spells: Vec<StatisticsSpell>,
}

impl StatisticsWindow {
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Simulated combat seconds across all iterations.
    pub fn combat_time(&self) -> f64 {
        self.combat_time
    }

    pub fn spells(&self) -> &[StatisticsSpell] {
        &self.spells
    }

    /// First record whose spell has this name.
    pub fn spell(&self, name: &str) -> Option<&StatisticsSpell> {
        self.spells.iter().find(|record| record.key().name() == name)
    }

    pub fn total_damage(&self) -> u64 {
        self.spells.iter().map(StatisticsSpell::total_damage).sum()
    }

    /// Damage per simulated second; zero for an empty window.
    pub fn dps(&self) -> f64 {
        if self.combat_time > 0.0 {
            self.total_damage() as f64 / self.combat_time
        } else {
            0.0
        }
    }

    /// Fold another window (e.g. from an independent run) into this one.
    pub fn merge(&mut self, other: &StatisticsWindow) {
        self.iterations += other.iterations;
        self.combat_time += other.combat_time;
        for record in &other.spells {
            match self.spells.binary_search_by(|existing| existing.key().cmp(record.key())) {
                Ok(index) => self.spells[index].merge(record),
                Err(index) => self.spells.insert(index, record.clone()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::ResolvedDamage;

    fn key(name: &str) -> SpellKey {
        SpellKey::new(name, "icon")
    }

    #[test]
    fn test_record_routes_results() {
        let mut record = StatisticsSpell::new(key("Whirlwind"));
        record.record_damage(&DamageResult::Avoided(Avoidance::Dodge), 25, 1.0);
        record.record_damage(&DamageResult::Avoided(Avoidance::FullBlock), 25, 2.0);
        record.record_damage(
            &DamageResult::Dealt(ResolvedDamage {
                category: DamageCategory::PartialBlockCrit,
                amount: 410,
                steps: Vec::new(),
            }),
            25,
            3.0,
        );

        assert_eq!(record.avoidance_count(Avoidance::Dodge), 1);
        assert_eq!(record.avoidance_count(Avoidance::FullBlock), 1);
        let tally = record.tally(DamageCategory::PartialBlockCrit);
        assert_eq!(tally.count, 1);
        assert_eq!(tally.damage, 410);
        assert_eq!(tally.resource_cost, 25);
        assert_eq!(tally.last_event_time, 3.0);
        assert_eq!(record.total_attempts(), 3);
    }

    #[test]
    fn test_every_category_is_independent() {
        let mut record = StatisticsSpell::new(key("Auto Attack"));
        let categories = [
            DamageCategory::Hit,
            DamageCategory::Crit,
            DamageCategory::Glancing,
            DamageCategory::PartialResist,
            DamageCategory::PartialBlock,
            DamageCategory::PartialBlockCrit,
        ];
        for (i, category) in categories.iter().enumerate() {
            record.add_damage(*category, 100 * (i as u32 + 1), 0, i as f64);
        }
        for (i, category) in categories.iter().enumerate() {
            assert_eq!(record.tally(*category).damage, 100 * (i as u64 + 1));
        }
        assert_eq!(record.total_damage(), 2100);
    }

    #[test]
    fn test_unknown_keys_are_created_lazily() {
        let mut collector = StatisticsCollector::new();
        collector.prepare_set_of_combat_iterations([key("Slam")]);
        collector.spell_statistics(&key("Hamstring")).increment_miss();

        let window = collector.close_window();
        assert_eq!(window.spells().len(), 2);
        assert_eq!(
            window.spell("Hamstring").unwrap().avoidance_count(Avoidance::Miss),
            1
        );
    }

    #[test]
    fn test_new_window_starts_fresh() {
        let mut collector = StatisticsCollector::new();
        collector.prepare_set_of_combat_iterations([key("Slam")]);
        collector.spell_statistics(&key("Slam")).add_damage(DamageCategory::Hit, 50, 0, 1.0);
        collector.record_iteration(10.0);
        let _ = collector.close_window();

        collector.prepare_set_of_combat_iterations([key("Slam")]);
        let window = collector.close_window();
        assert_eq!(window.total_damage(), 0);
        assert_eq!(window.iterations(), 0);
    }

    #[test]
    fn test_window_merge() {
        let mut a = StatisticsCollector::new();
        a.prepare_set_of_combat_iterations([key("Slam")]);
        a.spell_statistics(&key("Slam")).add_damage(DamageCategory::Hit, 100, 15, 2.0);
        a.record_iteration(10.0);

        let mut b = StatisticsCollector::new();
        b.prepare_set_of_combat_iterations([key("Slam"), key("Execute")]);
        b.spell_statistics(&key("Slam")).add_damage(DamageCategory::Hit, 300, 15, 7.0);
        b.spell_statistics(&key("Execute")).add_damage(DamageCategory::Crit, 900, 10, 9.0);
        b.record_iteration(10.0);

        let mut merged = a.close_window();
        merged.merge(&b.close_window());

        assert_eq!(merged.iterations(), 2);
        assert_eq!(merged.total_damage(), 1300);
        assert_eq!(merged.dps(), 65.0);
        let slam = merged.spell("Slam").unwrap().tally(DamageCategory::Hit);
        assert_eq!(slam.count, 2);
        assert_eq!(slam.last_event_time, 7.0);
        assert_eq!(slam.average(), 200.0);
        let names: Vec<&str> = merged.spells().iter().map(|s| s.key().name()).collect();
        assert_eq!(names, vec!["Execute", "Slam"]);
    }

    #[test]
    fn test_window_serializes() {
        let mut collector = StatisticsCollector::new();
        collector.prepare_set_of_combat_iterations([key("Slam")]);
        collector.record_iteration(5.0);
        let window = collector.close_window();

        let json = serde_json::to_string(&window).unwrap();
        let back: StatisticsWindow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, window);
    }
}
