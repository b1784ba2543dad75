//! Spell readiness state machine.
//!
//! A [`Spell`] answers "can I be cast right now?" with a [`SpellStatus`]
//! computed fresh on every query, and when performed debits its owner,
//! stamps its cooldown and runs its effect hook. The owning caster is
//! passed in explicitly; a spell never stores a back-reference to it.

use crate::character::Caster;
use crate::context::SimContext;
use crate::damage::{DamagePipeline, DamageResult};
use crate::engine::CombatScope;
use crate::error::{Result, SimError};
use crate::event::Action;
use crate::ids::{BuffId, SpellId, SpellKey};
use crate::resource::ResourceType;
use crate::roll::{AttackCategory, AttackerStats, Outcome};
use crate::talent::{RankEffect, RankScoped, RankedMagnitude};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Why a spell can or cannot be cast right now.
///
/// Variants are checked in declaration order and the first that applies
/// is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellStatus {
    NotEnabled,
    OnGCD,
    CastInProgress,
    OnCooldown,
    InsufficientResources,
    /// The spell needs a buff to be inactive, and it is active.
    BuffActive,
    /// The spell needs a buff to be active, and it is not.
    BuffInactive,
    Available,
}

/// What a spell does when it goes off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpellKind {
    /// Rolls once and deals `min..=max` base damage.
    DirectDamage {
        min: u32,
        max: u32,
        category: AttackCategory,
    },
    /// Activates (or refreshes) one of the caster's buffs.
    ApplyBuff { buff: BuffId },
    /// Deals `damage_per_tick` every `interval` seconds, `ticks` times.
    /// Re-applying restarts the ticks.
    Periodic {
        damage_per_tick: f64,
        ticks: u32,
        interval: f64,
        category: AttackCategory,
    },
}

/// Extra readiness condition beyond cooldown and cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Readiness {
    #[default]
    Always,
    RequiresBuffActive(BuffId),
    RequiresBuffInactive(BuffId),
}

/// A castable ability.
///
/// # Examples
///
/// ```rust
/// use combatsim::{
///     AttackCategory, Character, ResourcePool, ResourceType, SimContext, SimulationConfig,
///     Spell, SpellKind, SpellStatus,
/// };
///
/// let mut warrior = Character::new("Warrior", 60);
/// warrior
///     .caster_mut()
///     .ledger_mut()
///     .add_pool(ResourcePool::new(ResourceType::Rage, 10.0, 100.0, 0.0));
///
/// let execute = warrior.add_spell(
///     Spell::new(
///         "Execute",
///         "inv_sword_48",
///         SpellKind::DirectDamage { min: 600, max: 600, category: AttackCategory::MeleeSpecial },
///     )
///     .with_cost(ResourceType::Rage, 15),
/// );
///
/// let ctx = SimContext::new(SimulationConfig::default());
/// assert_eq!(warrior.spell_status(execute, &ctx).unwrap(), SpellStatus::InsufficientResources);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Spell {
    key: SpellKey,
    kind: SpellKind,
    readiness: Readiness,
    restricted_by_gcd: bool,
    base_cooldown: f64,
    cast_time: f64,
    resource_type: ResourceType,
    resource_cost: u32,
    enabled: bool,
    rank: u32,
    last_used: f64,
    // Talent-driven magnitudes.
    damage_bonus: RankedMagnitude,
    cooldown_reduction: RankedMagnitude,
    cost_reduction: u32,
    crit_bonus: RankedMagnitude,
    unlock_ranks: u32,
    // Transient state, cleared on reset.
    ticks_remaining: u32,
}

impl Spell {
    /// Create an enabled, GCD-restricted, instant spell with no cooldown
    /// and no cost.
    pub fn new(name: &str, icon: &str, kind: SpellKind) -> Self {
        Self {
            key: SpellKey::new(name, icon),
            kind,
            readiness: Readiness::Always,
            restricted_by_gcd: true,
            base_cooldown: 0.0,
            cast_time: 0.0,
            resource_type: ResourceType::Mana,
            resource_cost: 0,
            enabled: true,
            rank: 0,
            last_used: 0.0,
            damage_bonus: RankedMagnitude::default(),
            cooldown_reduction: RankedMagnitude::default(),
            cost_reduction: 0,
            crit_bonus: RankedMagnitude::default(),
            unlock_ranks: 0,
            ticks_remaining: 0,
        }
    }

    pub fn with_cooldown(mut self, cooldown: f64) -> Self {
        self.base_cooldown = cooldown;
        self.last_used = -cooldown;
        self
    }

    pub fn with_cost(mut self, resource_type: ResourceType, cost: u32) -> Self {
        self.resource_type = resource_type;
        self.resource_cost = cost;
        self
    }

    pub fn with_cast_time(mut self, cast_time: f64) -> Self {
        self.cast_time = cast_time;
        self
    }

    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    /// Not subject to the global cooldown.
    pub fn off_gcd(mut self) -> Self {
        self.restricted_by_gcd = false;
        self
    }

    /// Start disabled, e.g. until a talent unlocks it.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn key(&self) -> &SpellKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn kind(&self) -> &SpellKind {
        &self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_restricted_by_gcd(&self) -> bool {
        self.restricted_by_gcd
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn last_used(&self) -> f64 {
        self.last_used
    }

    pub fn cast_time(&self) -> f64 {
        self.cast_time
    }

    pub fn damage_bonus(&self) -> f64 {
        self.damage_bonus.total()
    }

    pub fn crit_bonus(&self) -> f64 {
        self.crit_bonus.total()
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Cost after talent reductions.
    pub fn resource_cost(&self) -> u32 {
        self.resource_cost.saturating_sub(self.cost_reduction)
    }

    /// Cooldown after talent reductions.
    pub fn cooldown(&self) -> f64 {
        (self.base_cooldown - self.cooldown_reduction.total()).max(0.0)
    }

    /// Periodic ticks still to come from the last application.
    pub fn ticks_remaining(&self) -> u32 {
        self.ticks_remaining
    }

    /// Seconds until the cooldown is over; never negative.
    pub fn get_cooldown_remaining(&self, now: f64) -> f64 {
        (self.last_used + self.cooldown() - now).max(0.0)
    }

    /// Current status. See [`SpellStatus`] for the evaluation order.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownBuff`] if the readiness condition names a buff
    /// the caster does not own.
    pub fn get_spell_status(&self, ctx: &SimContext, caster: &Caster) -> Result<SpellStatus> {
        if !self.enabled {
            return Ok(SpellStatus::NotEnabled);
        }

        let now = ctx.now();
        let epsilon = ctx.config().cooldown_epsilon;
        if self.restricted_by_gcd && caster.ledger().global_cooldown().is_active(now, epsilon) {
            return Ok(SpellStatus::OnGCD);
        }
        if caster.is_casting() {
            return Ok(SpellStatus::CastInProgress);
        }
        if self.last_used + self.cooldown() - now > epsilon {
            return Ok(SpellStatus::OnCooldown);
        }
        if caster.ledger().level(self.resource_type).trunc() < f64::from(self.resource_cost()) {
            return Ok(SpellStatus::InsufficientResources);
        }

        let status = match self.readiness {
            Readiness::Always => SpellStatus::Available,
            Readiness::RequiresBuffActive(buff) => {
                if caster.buff(buff)?.is_active() {
                    SpellStatus::Available
                } else {
                    SpellStatus::BuffInactive
                }
            }
            Readiness::RequiresBuffInactive(buff) => {
                if caster.buff(buff)?.is_active() {
                    SpellStatus::BuffActive
                } else {
                    SpellStatus::Available
                }
            }
        };
        Ok(status)
    }

    /// Enable the spell.
    ///
    /// # Errors
    ///
    /// [`SimError::AlreadyEnabled`] if the spell is already enabled.
    pub fn enable(&mut self) -> Result<()> {
        if self.enabled {
            return Err(SimError::AlreadyEnabled(self.key.name().to_string()));
        }
        self.enabled = true;
        Ok(())
    }

    /// Disable the spell. Idempotent; the teardown hook only runs on the
    /// enabled-to-disabled transition.
    pub fn disable(&mut self) {
        if self.enabled {
            self.enabled = false;
            self.teardown();
        }
    }

    fn teardown(&mut self) {
        // Outstanding periodic ticks find nothing left and are dropped.
        self.ticks_remaining = 0;
    }

    /// Restore the start-of-iteration state.
    pub fn reset(&mut self) {
        self.last_used = -self.base_cooldown;
        self.ticks_remaining = 0;
    }

    /// Schedule a `PlayerAction` for when the cooldown is over.
    pub fn add_spell_cd_event(&self, ctx: &mut SimContext) {
        ctx.schedule(Action::PlayerAction, self.last_used + self.cooldown());
    }

    /// Start the caster's global cooldown and schedule a `PlayerAction`
    /// for when it is over. Skipped during the setup phase.
    ///
    /// A global cooldown no longer than the cooldown epsilon schedules
    /// nothing: it is already over, and a `PlayerAction` at the same
    /// instant would walk the rotation again without the clock moving.
    pub fn add_gcd_event(&self, ctx: &mut SimContext, caster: &mut Caster) {
        if ctx.is_setup_phase() {
            return;
        }
        let now = ctx.now();
        caster.ledger_mut().start_global_cooldown(now);
        let duration = caster.ledger().global_cooldown().duration();
        if duration > ctx.config().cooldown_epsilon {
            ctx.schedule(Action::PlayerAction, now + duration);
        }
    }

    /// Cast the spell: debit the caster, stamp the cooldown, schedule
    /// follow-ups and run the effect (or start the cast).
    ///
    /// # Errors
    ///
    /// [`SimError::InsufficientResource`] if the caster cannot pay. The
    /// caller is expected to check [`Spell::get_spell_status`] first.
    pub fn perform(&mut self, id: SpellId, scope: &mut CombatScope<'_>, caster: &mut Caster) -> Result<()> {
        let cost = self.resource_cost();
        let available = caster.ledger().level(self.resource_type).trunc();
        if available < f64::from(cost) {
            return Err(SimError::InsufficientResource {
                spell: self.key.name().to_string(),
                resource: self.resource_type,
                available: available as i64,
                cost: i64::from(cost),
            });
        }

        let now = scope.ctx.now();
        self.last_used = now;
        caster.ledger_mut().spend(self.resource_type, f64::from(cost));
        scope.statistics.spell_statistics(&self.key).record_cast();

        if self.restricted_by_gcd {
            self.add_gcd_event(scope.ctx, caster);
        }
        if self.cooldown() > scope.ctx.config().cooldown_epsilon {
            self.add_spell_cd_event(scope.ctx);
        }

        if self.cast_time > 0.0 {
            trace!(spell = %self.key, time = now, cast_time = self.cast_time, "cast started");
            caster.start_cast(id);
            scope.ctx.schedule(Action::CastComplete(id), now + self.cast_time);
            return Ok(());
        }
        self.effect(id, scope, caster)
    }

    /// Finish a cast started by [`Spell::perform`].
    ///
    /// Returns `false` without doing anything if this spell is not the one
    /// being cast. A spell disabled mid-cast still ends the cast but has
    /// no effect.
    pub fn complete_cast(&mut self, id: SpellId, scope: &mut CombatScope<'_>, caster: &mut Caster) -> Result<bool> {
        if caster.cast_in_progress() != Some(id) {
            return Ok(false);
        }
        caster.finish_cast();
        let now = scope.ctx.now();
        scope.ctx.schedule(Action::PlayerAction, now);
        if self.enabled {
            self.effect(id, scope, caster)?;
        } else {
            trace!(spell = %self.key, time = now, "cast finished on a disabled spell");
        }
        Ok(true)
    }

    /// Deal the next periodic tick.
    ///
    /// Returns `false` for stale ticks: the spell is not periodic, was
    /// disabled, or has no ticks left.
    pub fn periodic_tick(&mut self, id: SpellId, scope: &mut CombatScope<'_>, caster: &mut Caster) -> Result<bool> {
        let SpellKind::Periodic {
            damage_per_tick,
            interval,
            category,
            ..
        } = self.kind
        else {
            return Ok(false);
        };
        if !self.enabled || self.ticks_remaining == 0 {
            return Ok(false);
        }

        self.ticks_remaining -= 1;
        let base = damage_per_tick * (1.0 + self.damage_bonus());
        self.deal_damage(base, category, Outcome::Hit, 0, scope, caster);

        if self.ticks_remaining > 0 {
            scope.ctx.schedule_in(Action::PeriodicTick(id), interval);
        }
        Ok(true)
    }

    /// Stats the roll sees for this spell, talent crit included.
    pub fn attacker_stats(&self, caster: &Caster) -> AttackerStats {
        let mut stats = caster.attacker_stats();
        stats.crit_chance += self.crit_bonus();
        stats.spell_crit_chance += self.crit_bonus();
        stats
    }

    fn effect(&mut self, id: SpellId, scope: &mut CombatScope<'_>, caster: &mut Caster) -> Result<()> {
        let now = scope.ctx.now();
        match self.kind {
            SpellKind::DirectDamage { min, max, category } => {
                let base = f64::from(scope.ctx.range(min, max)) * (1.0 + self.damage_bonus());
                let attacker = self.attacker_stats(caster);
                let outcome = scope.roll.roll(scope.ctx, &attacker, caster.target(), category);
                let cost = self.resource_cost();
                self.deal_damage(base, category, outcome, cost, scope, caster);
            }
            SpellKind::ApplyBuff { buff } => {
                let expires_at = caster.buff_mut(buff)?.apply(now);
                scope.ctx.schedule(Action::BuffExpiry(buff), expires_at);
                debug!(spell = %self.key, time = now, buff = %buff, expires_at, "buff applied");
            }
            SpellKind::Periodic { ticks, interval, .. } => {
                scope
                    .ctx
                    .queue_mut()
                    .retain(|action| *action != Action::PeriodicTick(id));
                self.ticks_remaining = ticks;
                if ticks > 0 {
                    scope.ctx.schedule(Action::PeriodicTick(id), now + interval);
                }
                debug!(spell = %self.key, time = now, ticks, "periodic effect applied");
            }
        }
        Ok(())
    }

    fn deal_damage(
        &self,
        base: f64,
        category: AttackCategory,
        outcome: Outcome,
        resource_cost: u32,
        scope: &mut CombatScope<'_>,
        caster: &Caster,
    ) {
        let now = scope.ctx.now();
        let modifiers = caster.damage_modifiers(scope.ctx.config());
        let result = DamagePipeline::new(scope.roll.mechanics()).resolve(base, outcome, category, &modifiers);
        let damage = match &result {
            DamageResult::Dealt(resolved) => resolved.amount,
            DamageResult::Avoided(_) => 0,
        };
        debug!(spell = %self.key, time = now, %outcome, damage, "spell resolved");
        scope
            .statistics
            .spell_statistics(&self.key)
            .record_damage(&result, resource_cost, now);
    }

    fn unsupported(&self, effect: &RankEffect) -> SimError {
        SimError::UnsupportedRankEffect {
            target: self.key.name().to_string(),
            effect: format!("{effect:?}"),
        }
    }
}

impl RankScoped for Spell {
    fn increase_rank(&mut self, effect: &RankEffect) -> Result<()> {
        match effect {
            RankEffect::Rank => self.rank += 1,
            RankEffect::DamageBonus(bonus) => self.damage_bonus.add(*bonus),
            RankEffect::CooldownReduction(seconds) => self.cooldown_reduction.add(*seconds),
            RankEffect::CostReduction(points) => self.cost_reduction += points,
            RankEffect::CritBonus(chance) => self.crit_bonus.add(*chance),
            RankEffect::Unlock => {
                if self.unlock_ranks == 0 {
                    self.enable()?;
                }
                self.unlock_ranks += 1;
            }
            RankEffect::DurationBonus(_) => return Err(self.unsupported(effect)),
        }
        Ok(())
    }

    fn decrease_rank(&mut self, effect: &RankEffect) -> Result<()> {
        let at_min = || SimError::TalentAtMinRank(self.key.name().to_string());
        match effect {
            RankEffect::Rank => self.rank = self.rank.checked_sub(1).ok_or_else(at_min)?,
            RankEffect::DamageBonus(bonus) => {
                if !self.damage_bonus.remove(*bonus) {
                    return Err(at_min());
                }
            }
            RankEffect::CooldownReduction(seconds) => {
                if !self.cooldown_reduction.remove(*seconds) {
                    return Err(at_min());
                }
            }
            RankEffect::CostReduction(points) => {
                self.cost_reduction = self.cost_reduction.checked_sub(*points).ok_or_else(at_min)?;
            }
            RankEffect::CritBonus(chance) => {
                if !self.crit_bonus.remove(*chance) {
                    return Err(at_min());
                }
            }
            RankEffect::Unlock => {
                self.unlock_ranks = self.unlock_ranks.checked_sub(1).ok_or_else(at_min)?;
                if self.unlock_ranks == 0 {
                    self.disable();
                }
            }
            RankEffect::DurationBonus(_) => return Err(self.unsupported(effect)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buff::Buff;
    use crate::character::Character;
    use crate::config::SimulationConfig;
    use crate::resource::ResourcePool;
    use crate::roll::CombatRoll;
    use crate::statistics::StatisticsCollector;

    fn strike() -> Spell {
        Spell::new(
            "Mortal Strike",
            "ability_warrior_savageblow",
            SpellKind::DirectDamage {
                min: 300,
                max: 300,
                category: AttackCategory::MeleeSpecial,
            },
        )
    }

    fn warrior(rage: f64) -> Character {
        let mut character = Character::new("Warrior", 60);
        character
            .caster_mut()
            .ledger_mut()
            .add_pool(ResourcePool::new(ResourceType::Rage, rage, 100.0, 0.0));
        character
    }

    /// Advance the clock to `time` by scheduling and popping a marker event.
    fn advance(ctx: &mut SimContext, time: f64) {
        ctx.schedule(Action::ResourceTick, time);
        while ctx.next_event().is_some_and(|event| event.due_time < time) {}
    }

    #[test]
    fn test_enable_twice_is_an_error() {
        let mut spell = strike().disabled();
        spell.enable().unwrap();
        assert_eq!(
            spell.enable(),
            Err(SimError::AlreadyEnabled("Mortal Strike".to_string()))
        );
    }

    #[test]
    fn test_disable_is_idempotent() {
        let mut spell = strike();
        spell.disable();
        spell.disable();
        assert!(!spell.is_enabled());
    }

    #[test]
    fn test_not_enabled_wins_over_everything() {
        let mut character = warrior(0.0);
        let id = character.add_spell(strike().with_cooldown(6.0).with_cost(ResourceType::Rage, 30).disabled());
        let mut ctx = SimContext::new(SimulationConfig::default());
        character.spell_mut(id).unwrap().last_used = 0.0;
        advance(&mut ctx, 1.0);

        assert_eq!(character.spell_status(id, &ctx).unwrap(), SpellStatus::NotEnabled);
    }

    #[test]
    fn test_cooldown_boundary() {
        let mut character = warrior(100.0);
        let id = character.add_spell(strike().with_cooldown(10.0).off_gcd());
        let mut ctx = SimContext::new(SimulationConfig::default());
        let mut statistics = StatisticsCollector::new();
        let roll = CombatRoll::default();

        character.perform(id, &mut ctx, &roll, &mut statistics).unwrap();

        advance(&mut ctx, 9.9999);
        assert_eq!(character.spell_status(id, &ctx).unwrap(), SpellStatus::OnCooldown);

        advance(&mut ctx, 10.0001);
        assert_eq!(character.spell_status(id, &ctx).unwrap(), SpellStatus::Available);
        assert_eq!(character.spell(id).unwrap().get_cooldown_remaining(ctx.now()), 0.0);
    }

    #[test]
    fn test_reset_clears_cooldown() {
        let mut character = warrior(100.0);
        let id = character.add_spell(strike().with_cooldown(30.0).off_gcd());
        let mut ctx = SimContext::new(SimulationConfig::default());
        let mut statistics = StatisticsCollector::new();
        character
            .perform(id, &mut ctx, &CombatRoll::default(), &mut statistics)
            .unwrap();
        assert_eq!(character.spell_status(id, &ctx).unwrap(), SpellStatus::OnCooldown);

        character.reset();
        ctx.begin_setup();
        assert_ne!(character.spell_status(id, &ctx).unwrap(), SpellStatus::OnCooldown);
    }

    #[test]
    fn test_perform_without_resources_is_an_error() {
        let mut character = warrior(10.0);
        let id = character.add_spell(strike().with_cost(ResourceType::Rage, 30));
        let mut ctx = SimContext::new(SimulationConfig::default());
        let mut statistics = StatisticsCollector::new();

        let err = character
            .perform(id, &mut ctx, &CombatRoll::default(), &mut statistics)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::InsufficientResource {
                available: 10,
                cost: 30,
                ..
            }
        ));
        assert_eq!(character.caster().ledger().level(ResourceType::Rage), 10.0);
    }

    #[test]
    fn test_perform_debits_and_triggers_gcd() {
        let mut character = warrior(50.0);
        let id = character.add_spell(strike().with_cost(ResourceType::Rage, 30));
        let other = character.add_spell(
            Spell::new(
                "Heroic Strike",
                "ability_rogue_ambush",
                SpellKind::DirectDamage {
                    min: 100,
                    max: 100,
                    category: AttackCategory::MeleeSpecial,
                },
            )
            .with_cost(ResourceType::Rage, 15),
        );
        let mut ctx = SimContext::new(SimulationConfig::default());
        let mut statistics = StatisticsCollector::new();

        character
            .perform(id, &mut ctx, &CombatRoll::default(), &mut statistics)
            .unwrap();
        assert_eq!(character.caster().ledger().level(ResourceType::Rage), 20.0);
        assert_eq!(character.spell_status(other, &ctx).unwrap(), SpellStatus::OnGCD);
        assert_eq!(ctx.peek_time(), Some(1.5));
    }

    #[test]
    fn test_gcd_skipped_during_setup() {
        let mut character = warrior(50.0);
        let id = character.add_spell(strike());
        let mut ctx = SimContext::new(SimulationConfig::default());
        ctx.begin_setup();
        let mut statistics = StatisticsCollector::new();

        character
            .perform(id, &mut ctx, &CombatRoll::default(), &mut statistics)
            .unwrap();
        assert!(ctx.peek_time().is_none());
        assert_eq!(character.spell_status(id, &ctx).unwrap(), SpellStatus::Available);
    }

    #[test]
    fn test_instant_gcd_schedules_nothing() {
        let mut character = warrior(50.0);
        character.caster_mut().ledger_mut().set_global_cooldown(0.0);
        let id = character.add_spell(strike());
        let mut ctx = SimContext::new(SimulationConfig::default());
        let mut statistics = StatisticsCollector::new();

        character
            .perform(id, &mut ctx, &CombatRoll::default(), &mut statistics)
            .unwrap();
        assert!(ctx.peek_time().is_none());
        assert_eq!(character.spell_status(id, &ctx).unwrap(), SpellStatus::Available);
    }

    #[test]
    fn test_readiness_with_unknown_buff_is_an_error() {
        let mut other = Character::new("Rogue", 60);
        let foreign = other.add_buff(Buff::new("Slice and Dice", 9.0));

        let mut character = warrior(50.0);
        let inactive = character.add_spell(strike().with_readiness(Readiness::RequiresBuffInactive(foreign)));
        let active = character.add_spell(strike().with_readiness(Readiness::RequiresBuffActive(foreign)));
        let ctx = SimContext::new(SimulationConfig::default());

        assert_eq!(character.spell_status(inactive, &ctx), Err(SimError::UnknownBuff(foreign)));
        assert_eq!(character.spell_status(active, &ctx), Err(SimError::UnknownBuff(foreign)));
    }

    #[test]
    fn test_disabled_mid_cast_finishes_without_effect() {
        let mut character = warrior(50.0);
        let id = character.add_spell(strike().with_cast_time(2.0));
        let mut ctx = SimContext::new(SimulationConfig::default());
        let mut statistics = StatisticsCollector::new();
        let roll = CombatRoll::default();

        character.perform(id, &mut ctx, &roll, &mut statistics).unwrap();
        assert!(character.caster().is_casting());
        character.spell_mut(id).unwrap().disable();
        advance(&mut ctx, 2.0);

        assert!(character.complete_cast(id, &mut ctx, &roll, &mut statistics).unwrap());
        assert!(!character.caster().is_casting());
        let key = character.spell(id).unwrap().key().clone();
        assert_eq!(statistics.spell_statistics(&key).total_damage(), 0);
        // A second completion for the same cast is stale.
        assert!(!character.complete_cast(id, &mut ctx, &roll, &mut statistics).unwrap());
    }

    #[test]
    fn test_unlock_talent_enables_and_disables() {
        let mut spell = strike().disabled();
        spell.increase_rank(&RankEffect::Unlock).unwrap();
        assert!(spell.is_enabled());
        spell.decrease_rank(&RankEffect::Unlock).unwrap();
        assert!(!spell.is_enabled());
    }

    #[test]
    fn test_unlock_on_enabled_spell_is_an_error() {
        let mut spell = strike();
        assert!(matches!(
            spell.increase_rank(&RankEffect::Unlock),
            Err(SimError::AlreadyEnabled(_))
        ));
    }

    #[test]
    fn test_talent_reductions() {
        let mut spell = strike().with_cooldown(6.0).with_cost(ResourceType::Rage, 30);
        spell.increase_rank(&RankEffect::CooldownReduction(0.5)).unwrap();
        spell.increase_rank(&RankEffect::CostReduction(5)).unwrap();
        assert_eq!(spell.cooldown(), 5.5);
        assert_eq!(spell.resource_cost(), 25);

        spell.decrease_rank(&RankEffect::CostReduction(5)).unwrap();
        assert!(spell.decrease_rank(&RankEffect::CostReduction(5)).is_err());
        assert!(spell.increase_rank(&RankEffect::DurationBonus(1.0)).is_err());
    }

    #[test]
    fn test_stacked_reductions_remove_exactly() {
        let mut spell = strike().with_cooldown(6.0);
        spell.increase_rank(&RankEffect::DamageBonus(0.1)).unwrap();
        spell.increase_rank(&RankEffect::CooldownReduction(0.3)).unwrap();
        let damage = spell.damage_bonus();
        let cooldown = spell.cooldown();

        spell.increase_rank(&RankEffect::DamageBonus(0.2)).unwrap();
        spell.increase_rank(&RankEffect::CooldownReduction(0.7)).unwrap();
        spell.decrease_rank(&RankEffect::DamageBonus(0.2)).unwrap();
        spell.decrease_rank(&RankEffect::CooldownReduction(0.7)).unwrap();

        assert_eq!(spell.damage_bonus(), damage);
        assert_eq!(spell.cooldown(), cooldown);
        // Removing a contribution no rank holds is refused.
        assert!(matches!(
            spell.decrease_rank(&RankEffect::DamageBonus(0.2)),
            Err(SimError::TalentAtMinRank(_))
        ));
        assert_eq!(spell.damage_bonus(), damage);
    }

    #[test]
    fn test_disable_cancels_periodic_ticks() {
        let mut character = warrior(100.0);
        let id = character.add_spell(Spell::new(
            "Rend",
            "ability_gouge",
            SpellKind::Periodic {
                damage_per_tick: 21.0,
                ticks: 7,
                interval: 3.0,
                category: AttackCategory::MeleeSpecial,
            },
        ));
        let mut ctx = SimContext::new(SimulationConfig::default());
        let mut statistics = StatisticsCollector::new();
        character
            .perform(id, &mut ctx, &CombatRoll::default(), &mut statistics)
            .unwrap();
        assert_eq!(character.spell(id).unwrap().ticks_remaining(), 7);

        character.spell_mut(id).unwrap().disable();
        assert_eq!(character.spell(id).unwrap().ticks_remaining(), 0);
    }
}
