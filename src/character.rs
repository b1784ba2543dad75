//! Characters: the caster state the core reads, plus the spells and buffs
//! it owns.
//!
//! [`Caster`] is everything a spell needs from its owner (resources, GCD,
//! cast flag, target, damage modifiers, buffs). [`Character`] adds the
//! spells and the rotation, and is the [`RankTargets`] talents resolve
//! their handles against. Keeping the two apart lets a spell borrow its
//! caster mutably while the character lends the spell out.

use crate::buff::Buff;
use crate::config::SimulationConfig;
use crate::context::SimContext;
use crate::damage::DamageModifiers;
use crate::engine::CombatScope;
use crate::error::{Result, SimError};
use crate::ids::{BuffId, SpellId, SpellKey};
use crate::resource::ResourceLedger;
use crate::roll::{AttackerStats, CombatRoll, DefenderStats};
use crate::spell::{Spell, SpellStatus};
use crate::statistics::StatisticsCollector;
use crate::talent::{RankScoped, RankTargets, TargetHandle};
use serde::{Deserialize, Serialize};

/// Gear-derived character stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterStats {
    pub attacker: AttackerStats,
    /// Physical damage modifier before buffs.
    pub physical_damage_modifier: f64,
    pub spell_damage_modifier: f64,
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self {
            attacker: AttackerStats::default(),
            physical_damage_modifier: 1.0,
            spell_damage_modifier: 1.0,
        }
    }
}

/// State of a character that spells read and change.
#[derive(Debug, Clone, PartialEq)]
pub struct Caster {
    stats: CharacterStats,
    ledger: ResourceLedger,
    buffs: Vec<Buff>,
    target: DefenderStats,
    cast_in_progress: Option<SpellId>,
}

impl Caster {
    pub fn new(stats: CharacterStats, global_cooldown: f64) -> Self {
        Self {
            stats,
            ledger: ResourceLedger::new(global_cooldown),
            buffs: Vec::new(),
            target: DefenderStats::default(),
            cast_in_progress: None,
        }
    }

    pub fn level(&self) -> u32 {
        self.stats.attacker.level
    }

    pub fn stats(&self) -> &CharacterStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut CharacterStats {
        &mut self.stats
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    pub fn target(&self) -> &DefenderStats {
        &self.target
    }

    pub fn set_target(&mut self, target: DefenderStats) {
        self.target = target;
    }

    pub fn buffs(&self) -> &[Buff] {
        &self.buffs
    }

    pub fn buff(&self, id: BuffId) -> Result<&Buff> {
        self.buffs.get(id.index()).ok_or(SimError::UnknownBuff(id))
    }

    pub fn buff_mut(&mut self, id: BuffId) -> Result<&mut Buff> {
        self.buffs.get_mut(id.index()).ok_or(SimError::UnknownBuff(id))
    }

    pub fn is_casting(&self) -> bool {
        self.cast_in_progress.is_some()
    }

    /// The spell currently being cast, if any.
    pub fn cast_in_progress(&self) -> Option<SpellId> {
        self.cast_in_progress
    }

    pub fn start_cast(&mut self, spell: SpellId) {
        self.cast_in_progress = Some(spell);
    }

    pub fn finish_cast(&mut self) -> Option<SpellId> {
        self.cast_in_progress.take()
    }

    /// Base physical damage modifier times every active buff's bonus.
    pub fn total_physical_damage_modifier(&self) -> f64 {
        self.buffs
            .iter()
            .fold(self.stats.physical_damage_modifier, |total, buff| {
                total * (1.0 + buff.physical_damage_bonus())
            })
    }

    pub fn attacker_stats(&self) -> AttackerStats {
        self.stats.attacker.clone()
    }

    /// Modifiers for a damage instance dealt now against the target.
    pub fn damage_modifiers(&self, config: &SimulationConfig) -> DamageModifiers {
        DamageModifiers {
            physical_damage_modifier: self.total_physical_damage_modifier(),
            spell_damage_modifier: self.stats.spell_damage_modifier,
            target_armor: self.target.armor,
            attacker_level: self.level(),
            block_value: self.target.block_value,
            crit_multiplier: config.crit_multiplier,
            spell_crit_multiplier: config.spell_crit_multiplier,
            glancing_multiplier: config.glancing_multiplier,
        }
    }

    /// Restore the start-of-iteration state. Buff ranks are kept.
    pub fn reset(&mut self) {
        self.ledger.reset();
        for buff in &mut self.buffs {
            buff.reset();
        }
        self.cast_in_progress = None;
    }
}

/// A simulated character: caster state, spells and rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    name: String,
    caster: Caster,
    spells: Vec<Spell>,
    rotation: Vec<SpellId>,
    precombat: Vec<SpellId>,
}

impl Character {
    /// Create a character at `level` with default stats and no spells.
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        let mut stats = CharacterStats::default();
        stats.attacker.level = level;
        stats.attacker.weapon_skill = level * 5;
        Self {
            name: name.into(),
            caster: Caster::new(stats, SimulationConfig::default().global_cooldown),
            spells: Vec::new(),
            rotation: Vec::new(),
            precombat: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn caster(&self) -> &Caster {
        &self.caster
    }

    pub fn caster_mut(&mut self) -> &mut Caster {
        &mut self.caster
    }

    /// Register a spell and return its handle.
    pub fn add_spell(&mut self, spell: Spell) -> SpellId {
        self.spells.push(spell);
        SpellId(self.spells.len() - 1)
    }

    /// Register a buff and return its handle.
    pub fn add_buff(&mut self, buff: Buff) -> BuffId {
        self.caster.buffs.push(buff);
        BuffId(self.caster.buffs.len() - 1)
    }

    pub fn spells(&self) -> &[Spell] {
        &self.spells
    }

    pub fn spell(&self, id: SpellId) -> Result<&Spell> {
        self.spells.get(id.index()).ok_or(SimError::UnknownSpell(id))
    }

    pub fn spell_mut(&mut self, id: SpellId) -> Result<&mut Spell> {
        self.spells.get_mut(id.index()).ok_or(SimError::UnknownSpell(id))
    }

    pub fn buff(&self, id: BuffId) -> Result<&Buff> {
        self.caster.buff(id)
    }

    /// Statistics keys of every spell, in registration order.
    pub fn spell_keys(&self) -> Vec<SpellKey> {
        self.spells.iter().map(|spell| spell.key().clone()).collect()
    }

    /// Rotation in priority order, highest first.
    pub fn set_rotation(&mut self, rotation: Vec<SpellId>) {
        self.rotation = rotation;
    }

    pub fn rotation(&self) -> &[SpellId] {
        &self.rotation
    }

    /// Spells cast once during the setup phase of every iteration.
    pub fn set_precombat(&mut self, precombat: Vec<SpellId>) {
        self.precombat = precombat;
    }

    pub fn precombat(&self) -> &[SpellId] {
        &self.precombat
    }

    pub fn spell_status(&self, id: SpellId, ctx: &SimContext) -> Result<SpellStatus> {
        self.spell(id)?.get_spell_status(ctx, &self.caster)
    }

    pub fn perform(
        &mut self,
        id: SpellId,
        ctx: &mut SimContext,
        roll: &CombatRoll,
        statistics: &mut StatisticsCollector,
    ) -> Result<()> {
        let spell = self.spells.get_mut(id.index()).ok_or(SimError::UnknownSpell(id))?;
        let mut scope = CombatScope { ctx, roll, statistics };
        spell.perform(id, &mut scope, &mut self.caster)
    }

    pub fn complete_cast(
        &mut self,
        id: SpellId,
        ctx: &mut SimContext,
        roll: &CombatRoll,
        statistics: &mut StatisticsCollector,
    ) -> Result<bool> {
        let spell = self.spells.get_mut(id.index()).ok_or(SimError::UnknownSpell(id))?;
        let mut scope = CombatScope { ctx, roll, statistics };
        spell.complete_cast(id, &mut scope, &mut self.caster)
    }

    pub fn periodic_tick(
        &mut self,
        id: SpellId,
        ctx: &mut SimContext,
        roll: &CombatRoll,
        statistics: &mut StatisticsCollector,
    ) -> Result<bool> {
        let spell = self.spells.get_mut(id.index()).ok_or(SimError::UnknownSpell(id))?;
        let mut scope = CombatScope { ctx, roll, statistics };
        spell.periodic_tick(id, &mut scope, &mut self.caster)
    }

    /// Expire a buff if it is due. Returns whether it expired.
    pub fn expire_buff(&mut self, id: BuffId, ctx: &SimContext) -> Result<bool> {
        let epsilon = ctx.config().cooldown_epsilon;
        Ok(self.caster.buff_mut(id)?.expire_if_due(ctx.now(), epsilon))
    }

    /// Restore the start-of-iteration state. Talent-driven state is kept.
    pub fn reset(&mut self) {
        self.caster.reset();
        for spell in &mut self.spells {
            spell.reset();
        }
    }
}

impl RankTargets for Character {
    fn rank_target_mut(&mut self, handle: TargetHandle) -> Result<&mut dyn RankScoped> {
        match handle {
            TargetHandle::Spell(id) => self
                .spells
                .get_mut(id.index())
                .map(|spell| spell as &mut dyn RankScoped)
                .ok_or(SimError::UnknownSpell(id)),
            TargetHandle::Buff(id) => self
                .caster
                .buffs
                .get_mut(id.index())
                .map(|buff| buff as &mut dyn RankScoped)
                .ok_or(SimError::UnknownBuff(id)),
        }
    }
}
