//! Simulation context handle.
//!
//! [`SimContext`] bundles everything a run shares across components: the
//! event queue (clock and event sink), the seeded random source, the
//! setup/combat phase flag and the run's configuration. It is passed
//! explicitly to every operation that needs time or randomness, so two
//! contexts never share state and independent runs can execute in
//! parallel.

use crate::config::SimulationConfig;
use crate::event::{Action, EventQueue};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Which part of an iteration the simulation is in.
///
/// During [`SimPhase::Setup`] pre-combat actions (e.g. pre-buffing) run at
/// time zero without triggering the global cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    /// Pre-combat preparation.
    Setup,
    /// The timed encounter.
    Combat,
}

/// Clock, event sink, random source and phase for one simulation run.
///
/// # Examples
///
/// ```rust
/// use combatsim::{Action, SimContext, SimulationConfig};
///
/// let mut ctx = SimContext::new(SimulationConfig::default());
/// ctx.schedule(Action::PlayerAction, 1.5);
///
/// let event = ctx.next_event().unwrap();
/// assert_eq!(event.action, Action::PlayerAction);
/// assert_eq!(ctx.now(), 1.5);
/// ```
#[derive(Debug, Clone)]
pub struct SimContext {
    queue: EventQueue<Action>,
    rng: ChaCha8Rng,
    phase: SimPhase,
    config: SimulationConfig,
}

impl SimContext {
    /// Create a context seeded from `config.seed`, in the combat phase.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            queue: EventQueue::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            phase: SimPhase::Combat,
            config,
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> f64 {
        self.queue.current_time()
    }

    /// Schedule an action at an absolute time.
    pub fn schedule(&mut self, action: Action, due_time: f64) {
        self.queue.add_event(action, due_time);
    }

    /// Schedule an action `delay` seconds from now.
    pub fn schedule_in(&mut self, action: Action, delay: f64) {
        let due_time = self.now() + delay;
        self.queue.add_event(action, due_time);
    }

    /// Pop the next due event, advancing the clock.
    pub fn next_event(&mut self) -> Option<crate::event::Event<Action>> {
        self.queue.pop_next()
    }

    /// Due time of the next pending event.
    pub fn peek_time(&self) -> Option<f64> {
        self.queue.peek_time()
    }

    /// The underlying queue, e.g. to purge events.
    pub fn queue_mut(&mut self) -> &mut EventQueue<Action> {
        &mut self.queue
    }

    /// Uniform draw in `[0, 1)`.
    pub fn draw(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform integer in `[min, max]`; returns `min` when the range is empty.
    pub fn range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Current phase.
    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    /// Whether pre-combat setup is in progress.
    pub fn is_setup_phase(&self) -> bool {
        self.phase == SimPhase::Setup
    }

    /// Start a new iteration: empty the queue, rewind the clock and enter
    /// the setup phase. The random source keeps its stream.
    pub fn begin_setup(&mut self) {
        self.queue.reset();
        self.phase = SimPhase::Setup;
    }

    /// Leave setup and start the timed encounter.
    pub fn begin_combat(&mut self) {
        self.phase = SimPhase::Combat;
    }

    /// The run's configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
