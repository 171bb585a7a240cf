//! Cutline Sim - Monte Carlo tournament simulation
//!
//! This crate provides the simulation machinery over the `cutline-core` model:
//! - Round simulation (random placements per lobby)
//! - Lobby shuffling (snake and random)
//! - Cut engine (survivor selection and cut-threshold samples)
//! - Tournament runner (one trial to a terminal state)
//! - Simulation driver (repeated trials, aggregation, report)
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: SimulationDriver::run (orchestration)
//! - Level 2: run_trial (one trial)
//! - Level 3: simulate_round, shuffle_lobbies, apply_cut (steps)
//! - Level 4: settings, aggregate, report (configuration and output)

pub mod aggregate;
pub mod cut;
pub mod driver;
pub mod report;
pub mod round;
pub mod runner;
pub mod settings;
pub mod shuffle;

pub use aggregate::SimulationAggregate;
pub use cut::{apply_cut, CutKind, CutOutcome, ThresholdSample};
pub use driver::SimulationDriver;
pub use report::{PlayerReport, SimulationReport, ThresholdStats};
pub use round::{lobby_id, simulate_round, Lobby};
pub use runner::{run_trial, CutEvent, TrialOutcome};
pub use settings::{SimSettings, StopCondition};
pub use shuffle::{balanced_sizes, shuffle_lobbies, standings_lobbies};
