//! # combatsim - Deterministic Discrete-Event Combat Simulator
//!
//! A combat simulation engine for role-playing-game characters that provides:
//! - **Deterministic** runs (same seed and setup → same statistics)
//! - **Event-driven** time: nothing happens between scheduled events
//! - **Single-draw** combat rolls over an ordered outcome table
//! - **Rank-scoped** talents that change spells and buffs without downcasts
//! - **Parallel** Monte-Carlo trials with reproducible merged results
//!
//! ## Core Concepts
//!
//! ### Combat Pipeline
//!
//! Every cast flows through the same pipeline:
//!
//! ```text
//! [EventQueue] → [SpellStatus] → [ResourceLedger] → [CombatRoll] → [DamagePipeline] → [StatisticsCollector]
//! ```
//!
//! 1. **Events** are popped in time order, ties in insertion order
//! 2. **Spells** report whether they can be cast right now
//! 3. **Resources** are debited and cooldowns stamped
//! 4. **Rolls** pick one outcome (miss, dodge, parry, glancing, block, crit, resist, hit)
//! 5. **Damage** applies modifiers, mitigation and the outcome multiplier
//! 6. **Statistics** record the result per spell and category
//!
//! Follow-up work (global cooldown expiry, spell cooldown expiry, cast
//! completion, periodic ticks, buff expiry, resource regeneration) is
//! scheduled back onto the queue.
//!
//! ## Example
//!
//! ```rust
//! use combatsim::*;
//!
//! let mut warrior = Character::new("Warrior", 60);
//! warrior
//!     .caster_mut()
//!     .ledger_mut()
//!     .add_pool(ResourcePool::new(ResourceType::Rage, 100.0, 100.0, 10.0));
//!
//! let death_wish = warrior.add_buff(Buff::new("Death Wish", 30.0).with_physical_damage_per_rank(0.2));
//! let activate = warrior.add_spell(
//!     Spell::new("Death Wish", "spell_shadow_deathpact", SpellKind::ApplyBuff { buff: death_wish })
//!         .with_cooldown(180.0)
//!         .with_cost(ResourceType::Rage, 10)
//!         .disabled(),
//! );
//! let strike = warrior.add_spell(
//!     Spell::new(
//!         "Heroic Strike",
//!         "ability_rogue_ambush",
//!         SpellKind::DirectDamage { min: 300, max: 350, category: AttackCategory::MeleeSpecial },
//!     )
//!     .with_cost(ResourceType::Rage, 15),
//! );
//! warrior.set_rotation(vec![activate, strike]);
//!
//! // The talent unlocks the spell and gives the buff its rank.
//! let mut fury = TalentTree::new("Fury", 0);
//! fury.add_talent(
//!     Talent::new("Death Wish", "5ML", "spell_shadow_deathpact", 1)
//!         .unwrap()
//!         .with_spell_target(activate, RankEffect::Unlock)
//!         .with_buff_target(death_wish, RankEffect::Rank),
//! );
//! fury.apply_setup(&[("Death Wish", 1)], &mut warrior).unwrap();
//!
//! let config = SimulationConfig { seed: 1, combat_length: 60.0, ..SimulationConfig::default() };
//! let mut sim = Simulation::new(config, warrior).unwrap();
//! let window = sim.run(20).unwrap();
//!
//! assert_eq!(window.spell("Death Wish").unwrap().casts(), 20);
//! assert!(window.dps() > 0.0);
//! ```
//!
//! ## Modules
//!
//! - [`event`] - Event queue and simulation clock
//! - [`context`] - Explicit simulation handle (clock, RNG, phase, config)
//! - [`resource`] - Resource pools and the global cooldown
//! - [`mechanics`] - Armor and resistance formulas
//! - [`roll`] - Combat roll outcome tables
//! - [`damage`] - Damage modifier pipeline
//! - [`spell`] - Spell readiness state machine
//! - [`buff`] - Rank-driven timed effects
//! - [`talent`] - Talents and rank effects
//! - [`talent_tree`] - Point spending, tier gates and prerequisites
//! - [`graph`] - Talent prerequisite graph
//! - [`character`] - Caster state, spells and rotation
//! - [`statistics`] - Per-spell statistics windows
//! - [`engine`] - The simulation loop
//! - [`runner`] - Parallel Monte-Carlo trials
//! - [`config`] - Simulation configuration
//! - [`ids`] - Spell and buff handles, statistics keys
//! - [`error`] - Error types

pub mod buff;
pub mod character;
pub mod config;
pub mod context;
pub mod damage;
pub mod engine;
pub mod error;
pub mod event;
pub mod graph;
pub mod ids;
pub mod mechanics;
pub mod resource;
pub mod roll;
pub mod runner;
pub mod spell;
pub mod statistics;
pub mod talent;
pub mod talent_tree;

// Re-export main types for convenience
pub use config::SimulationConfig;
pub use context::{SimContext, SimPhase};
pub use engine::{CombatScope, Simulation};
pub use error::{Result, SimError};
pub use event::{Action, Event, EventQueue};
pub use ids::{BuffId, SpellId, SpellKey};

// Re-export the combat model
pub use character::{Caster, Character, CharacterStats};
pub use damage::{
    partial_resist_dmg_modifier, resist_multiplier, Avoidance, DamageCategory, DamageModifiers,
    DamagePipeline, DamageResult, ResolvedDamage,
};
pub use mechanics::{ClassicMechanics, Mechanics, ResistChances};
pub use resource::{GlobalCooldown, ResourceLedger, ResourcePool, ResourceType};
pub use roll::{
    AttackCategory, AttackerStats, CombatRoll, DefenderStats, MagicSchool, Outcome, OutcomeTable,
    ResistTier,
};
pub use spell::{Readiness, Spell, SpellKind, SpellStatus};

// Re-export talents and buffs
pub use buff::Buff;
pub use talent::{
    RankEffect, RankScoped, RankTargets, RankedMagnitude, Talent, TalentColumn, TalentEffectBinder,
    TalentPosition, TalentTarget, TargetHandle,
};
pub use talent_tree::TalentTree;

// Re-export statistics
pub use statistics::{DamageTally, StatisticsCollector, StatisticsSpell, StatisticsWindow};
