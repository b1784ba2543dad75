//! The simulation loop.
//!
//! [`Simulation`] owns one character, one [`SimContext`] and one statistics
//! collector. Each iteration resets the character, casts the pre-combat
//! spells in the setup phase, then dispatches events in time order until
//! the combat length is reached.
//!
//! Handlers re-check state when they run, so events made stale by later
//! changes (a refreshed buff, a disabled periodic spell, a cancelled cast)
//! are dropped instead of acted on.

use crate::character::Character;
use crate::config::SimulationConfig;
use crate::context::SimContext;
use crate::error::Result;
use crate::event::Action;
use crate::mechanics::Mechanics;
use crate::roll::CombatRoll;
use crate::spell::SpellStatus;
use crate::statistics::{StatisticsCollector, StatisticsWindow};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// What a spell effect needs from the running simulation.
pub struct CombatScope<'a> {
    pub ctx: &'a mut SimContext,
    pub roll: &'a CombatRoll,
    pub statistics: &'a mut StatisticsCollector,
}

/// A single-threaded simulation of one character.
///
/// # Examples
///
/// ```rust
/// use combatsim::{
///     AttackCategory, Character, ResourcePool, ResourceType, Simulation, SimulationConfig,
///     Spell, SpellKind,
/// };
///
/// let mut warrior = Character::new("Warrior", 60);
/// warrior
///     .caster_mut()
///     .ledger_mut()
///     .add_pool(ResourcePool::new(ResourceType::Rage, 100.0, 100.0, 10.0));
/// let bloodthirst = warrior.add_spell(
///     Spell::new(
///         "Bloodthirst",
///         "spell_nature_bloodlust",
///         SpellKind::DirectDamage { min: 500, max: 600, category: AttackCategory::MeleeSpecial },
///     )
///     .with_cooldown(6.0)
///     .with_cost(ResourceType::Rage, 30),
/// );
/// warrior.set_rotation(vec![bloodthirst]);
///
/// let config = SimulationConfig { combat_length: 60.0, ..SimulationConfig::default() };
/// let mut sim = Simulation::new(config, warrior).unwrap();
/// let window = sim.run(10).unwrap();
///
/// assert_eq!(window.iterations(), 10);
/// assert!(window.spell("Bloodthirst").unwrap().casts() >= 10 * 9);
/// ```
#[derive(Debug, Clone)]
pub struct Simulation {
    ctx: SimContext,
    character: Character,
    roll: CombatRoll,
    statistics: StatisticsCollector,
}

impl Simulation {
    /// Validate `config` and set up a simulation of `character`.
    pub fn new(config: SimulationConfig, mut character: Character) -> Result<Self> {
        config.validate()?;
        character
            .caster_mut()
            .ledger_mut()
            .set_global_cooldown(config.global_cooldown);
        Ok(Self {
            ctx: SimContext::new(config),
            character,
            roll: CombatRoll::default(),
            statistics: StatisticsCollector::new(),
        })
    }

    /// Use `mechanics` instead of the classic formulas.
    pub fn with_mechanics(mut self, mechanics: Arc<dyn Mechanics>) -> Self {
        self.roll = CombatRoll::new(mechanics);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        self.ctx.config()
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }

    /// Run the configured number of iterations.
    pub fn run_configured(&mut self) -> Result<StatisticsWindow> {
        let iterations = self.ctx.config().iterations;
        self.run(iterations)
    }

    /// Run `iterations` combats and return their statistics window.
    ///
    /// # Errors
    ///
    /// Any [`SimError`](crate::SimError) raised by a handler aborts the run.
    pub fn run(&mut self, iterations: usize) -> Result<StatisticsWindow> {
        info!(
            character = self.character.name(),
            iterations,
            seed = self.ctx.config().seed,
            "simulation started"
        );

        self.statistics
            .prepare_set_of_combat_iterations(self.character.spell_keys());
        for _ in 0..iterations {
            self.run_iteration()?;
        }
        let window = self.statistics.close_window();

        info!(
            character = self.character.name(),
            total_damage = window.total_damage(),
            dps = window.dps(),
            "simulation finished"
        );
        Ok(window)
    }

    /// Run one combat iteration into the open statistics window.
    pub fn run_iteration(&mut self) -> Result<()> {
        self.character.reset();

        self.ctx.begin_setup();
        for id in self.character.precombat().to_vec() {
            let status = self.character.spell_status(id, &self.ctx)?;
            if status == SpellStatus::Available {
                self.character
                    .perform(id, &mut self.ctx, &self.roll, &mut self.statistics)?;
            } else {
                debug!(spell = %id, ?status, "pre-combat spell skipped");
            }
        }
        self.ctx.begin_combat();

        let regen_interval = self.ctx.config().regen_interval;
        let combat_length = self.ctx.config().combat_length;
        self.ctx.schedule_in(Action::PlayerAction, 0.0);
        self.ctx.schedule_in(Action::ResourceTick, regen_interval);

        while self.ctx.peek_time().is_some_and(|time| time <= combat_length) {
            let Some(event) = self.ctx.next_event() else {
                break;
            };
            trace!(time = event.due_time, action = ?event.action, "dispatch");
            self.dispatch(event.action)?;
        }

        self.statistics.record_iteration(combat_length);
        Ok(())
    }

    fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::PlayerAction => self.player_action(),
            Action::CastComplete(id) => {
                let completed = self
                    .character
                    .complete_cast(id, &mut self.ctx, &self.roll, &mut self.statistics)?;
                if !completed {
                    warn!(spell = %id, time = self.ctx.now(), "stale cast completion dropped");
                }
                Ok(())
            }
            Action::PeriodicTick(id) => {
                let ticked = self
                    .character
                    .periodic_tick(id, &mut self.ctx, &self.roll, &mut self.statistics)?;
                if !ticked {
                    trace!(spell = %id, "stale periodic tick dropped");
                }
                Ok(())
            }
            Action::BuffExpiry(id) => {
                if self.character.expire_buff(id, &self.ctx)? {
                    debug!(buff = %id, time = self.ctx.now(), "buff expired");
                    self.player_action()
                } else {
                    trace!(buff = %id, "superseded buff expiry dropped");
                    Ok(())
                }
            }
            Action::ResourceTick => {
                self.character.caster_mut().ledger_mut().regen_tick();
                let regen_interval = self.ctx.config().regen_interval;
                self.ctx.schedule_in(Action::ResourceTick, regen_interval);
                self.player_action()
            }
        }
    }

    /// Walk the rotation in priority order, casting what is available until
    /// a cast triggers the global cooldown or starts casting.
    fn player_action(&mut self) -> Result<()> {
        let epsilon = self.ctx.config().cooldown_epsilon;
        for id in self.character.rotation().to_vec() {
            if self.character.spell_status(id, &self.ctx)? != SpellStatus::Available {
                continue;
            }
            self.character
                .perform(id, &mut self.ctx, &self.roll, &mut self.statistics)?;

            let caster = self.character.caster();
            let gcd_running = caster
                .ledger()
                .global_cooldown()
                .is_active(self.ctx.now(), epsilon);
            if caster.is_casting() || gcd_running {
                break;
            }
        }
        Ok(())
    }
}
