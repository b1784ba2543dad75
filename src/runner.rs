//! Monte-Carlo runner.
//!
//! Runs independent simulations on the rayon thread pool. Every run owns
//! its character, context, random source and collector; the only thing
//! runs share is the base configuration. Each run's seed is derived from
//! the base seed and the run index, and windows are merged in run-index
//! order, so the merged result does not depend on thread scheduling.

use crate::character::Character;
use crate::config::SimulationConfig;
use crate::engine::Simulation;
use crate::error::Result;
use crate::statistics::StatisticsWindow;
use rayon::prelude::*;
use tracing::info;

/// Seed for run `run` of a batch seeded with `base`.
///
/// SplitMix64 finalizer over the pair, so neighbouring run indices get
/// unrelated streams.
pub fn derive_seed(base: u64, run: u64) -> u64 {
    let mut z = base ^ run.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Run `runs` independent simulations of `config.iterations` iterations
/// each and merge their statistics windows.
///
/// `build` creates the character for a run from its index; it is called
/// once per run, possibly from several threads at once.
///
/// # Examples
///
/// ```rust
/// use combatsim::runner::run_trials;
/// use combatsim::{AttackCategory, Character, SimulationConfig, Spell, SpellKind};
///
/// let config = SimulationConfig { iterations: 5, combat_length: 30.0, ..SimulationConfig::default() };
/// let window = run_trials(&config, 4, |_| {
///     let mut rogue = Character::new("Rogue", 60);
///     let strike = rogue.add_spell(Spell::new(
///         "Sinister Strike",
///         "spell_shadow_ritualofsacrifice",
///         SpellKind::DirectDamage { min: 120, max: 160, category: AttackCategory::MeleeSpecial },
///     ));
///     rogue.set_rotation(vec![strike]);
///     Ok(rogue)
/// })
/// .unwrap();
///
/// assert_eq!(window.iterations(), 20);
/// ```
pub fn run_trials<F>(config: &SimulationConfig, runs: usize, build: F) -> Result<StatisticsWindow>
where
    F: Fn(usize) -> Result<Character> + Sync,
{
    config.validate()?;
    info!(runs, iterations = config.iterations, seed = config.seed, "trials started");

    let windows = (0..runs)
        .into_par_iter()
        .map(|run| {
            let run_config = config.with_seed(derive_seed(config.seed, run as u64));
            let mut simulation = Simulation::new(run_config, build(run)?)?;
            simulation.run_configured()
        })
        .collect::<Result<Vec<_>>>()?;

    let mut merged = StatisticsWindow::default();
    for window in &windows {
        merged.merge(window);
    }

    info!(runs, total_damage = merged.total_damage(), dps = merged.dps(), "trials finished");
    Ok(merged)
}
