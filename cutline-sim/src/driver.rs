//! Simulation driver - repeated trials under trial-count and time budgets
//!
//! Each trial gets its own RNG derived from the base seed and the trial index,
//! so a seeded run produces byte-identical reports whether trials execute
//! sequentially or across the rayon pool. Trials run in batches; the deadline
//! is checked between batches, never inside one.

use std::time::{Duration, Instant};

use cutline_core::{SimResult, TourFormat, TournamentState};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::info;

use crate::aggregate::SimulationAggregate;
use crate::report::SimulationReport;
use crate::runner::{run_trial, TrialOutcome};
use crate::settings::{SimSettings, StopCondition};

pub struct SimulationDriver<'a> {
    format: &'a TourFormat,
    baseline: &'a TournamentState,
    settings: &'a SimSettings,
}

impl<'a> SimulationDriver<'a> {
    pub fn new(
        format: &'a TourFormat,
        baseline: &'a TournamentState,
        settings: &'a SimSettings,
    ) -> Self {
        SimulationDriver {
            format,
            baseline,
            settings,
        }
    }

    /// Run under the configured seed, or a fresh random one
    pub fn run(&self) -> SimResult<SimulationReport> {
        let base_seed = self
            .settings
            .random_seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        self.run_seeded(base_seed)
    }

    /// Run every trial from the given base seed
    pub fn run_seeded(&self, base_seed: u64) -> SimResult<SimulationReport> {
        let started = Instant::now();
        let deadline = started + self.settings.duration();
        let mut aggregate =
            SimulationAggregate::new(self.baseline.players.len(), &self.format.cut_stages);

        info!(
            tournament = %self.format.tournament_name,
            target_trials = self.settings.number_of_sims,
            base_seed,
            parallel = self.settings.parallel,
            "starting simulation"
        );

        let mut next_log = self.settings.log_every_n_sims;
        while self.should_continue(aggregate.trials, deadline) {
            let mut batch = self.batch_size(aggregate.trials);
            // Shrink the batch so trials stop starting once the deadline hits;
            // only in-flight trials may overrun
            if aggregate.trials > 0 {
                if let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
                    let per_trial = started.elapsed().div_f64(aggregate.trials as f64);
                    batch = batch.min(trials_that_fit(remaining, per_trial));
                }
            }
            let outcomes = self.run_batch(base_seed, aggregate.trials, batch)?;
            for outcome in &outcomes {
                aggregate.fold(outcome);
            }

            if aggregate.trials >= next_log {
                info!(
                    trials = aggregate.trials,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "progress"
                );
                next_log += self.settings.log_every_n_sims;
            }
        }

        info!(
            trials = aggregate.trials,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "simulation finished"
        );
        Ok(SimulationReport::build(self.format, self.baseline, &aggregate))
    }

    fn should_continue(&self, trials: u64, deadline: Instant) -> bool {
        let under_count = trials < self.settings.number_of_sims;
        let under_time = Instant::now() < deadline;
        match self.settings.stop_condition {
            StopCondition::First => under_count && under_time,
            StopCondition::All => under_count || under_time,
        }
    }

    /// Sequential runs check the deadline after every trial. Parallel runs
    /// amortize scheduling over up to one logging interval, after a first
    /// single-trial batch that calibrates the per-trial time estimate.
    fn batch_size(&self, trials: u64) -> u64 {
        if !self.settings.parallel || trials == 0 {
            return 1;
        }
        let remaining = self.settings.number_of_sims.saturating_sub(trials);
        if remaining > 0 {
            remaining.min(self.settings.log_every_n_sims)
        } else {
            self.settings.log_every_n_sims
        }
    }

    fn run_batch(&self, base_seed: u64, start: u64, batch: u64) -> SimResult<Vec<TrialOutcome>> {
        if self.settings.parallel {
            // Ordered collect keeps folding deterministic
            (0..batch)
                .into_par_iter()
                .map(|k| {
                    let mut rng = trial_rng(base_seed, start + k);
                    run_trial(self.baseline, self.format, &mut rng)
                })
                .collect()
        } else {
            (0..batch)
                .map(|k| {
                    let mut rng = trial_rng(base_seed, start + k);
                    run_trial(self.baseline, self.format, &mut rng)
                })
                .collect()
        }
    }
}

/// Independent per-trial stream from the base seed and trial index
fn trial_rng(base_seed: u64, trial: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(base_seed ^ trial.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// How many trials of the observed duration fit in the remaining time budget,
/// at least one so progress never stalls
fn trials_that_fit(remaining: Duration, per_trial: Duration) -> u64 {
    if per_trial.is_zero() {
        return u64::MAX;
    }
    let fit = (remaining.as_secs_f64() / per_trial.as_secs_f64()).ceil() as u64;
    fit.max(1)
}
