//! Cutline Core - tournament domain model
//!
//! This crate provides the data model for Monte Carlo tournament simulation:
//! - Points and placement scoring tables
//! - Tournament format (round structure, tiebreaker order, cut stages)
//! - Tournament state (player roster with round history)
//! - Tiebreak resolution (total order over players)

pub mod error;
pub mod format;
pub mod player;
pub mod scoring;
pub mod state;
pub mod tiebreak;

// Re-exports for convenient access
pub use error::{SimError, SimResult};
pub use format::{AfterRound, RoundSpec, ShuffleMode, TourFormat};
pub use player::{Player, RoundResult, Tiebreakers};
pub use scoring::{Points, ScoringTable, ShortLobbyRule};
pub use state::TournamentState;
pub use tiebreak::{Metric, TiebreakResolver};
