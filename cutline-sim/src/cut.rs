//! Cut engine - survivor selection and the cut-threshold statistic
//!
//! The threshold is computed per cut occurrence: when the last survivor and
//! the first eliminated player share a point total, tiebreakers decided the
//! line and the threshold is that total (a whole number under whole-point
//! scoring). When a point gap separates them, the threshold is the midpoint
//! (a half number).

use cutline_core::{Points, TiebreakResolver, TournamentState};
use rand::Rng;

/// How the cut line was decided
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CutKind {
    /// Point gap between last survivor and first eliminated player
    Clean,
    /// Boundary players tied on points; tiebreakers (possibly the random
    /// fallback) separated them
    Tiebreaker,
}

/// One cut-threshold observation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThresholdSample {
    pub value: Points,
    pub kind: CutKind,
}

/// Result of asking for a cut
#[derive(Clone, Debug)]
pub enum CutOutcome {
    /// The field was already at or below the target; nothing was cut
    Skipped,
    Applied {
        /// Survivor indices, best rank first
        survivors: Vec<usize>,
        sample: ThresholdSample,
    },
}

/// Cut the active field down to `cut_to` players after completed round
/// `round`. Eliminated players are marked inactive with `eliminated_at_round`
/// set to the first round they will not play.
pub fn apply_cut<R: Rng>(
    state: &mut TournamentState,
    resolver: &TiebreakResolver,
    cut_to: u32,
    round: u32,
    rng: &mut R,
) -> CutOutcome {
    let active = state.active_indices();
    let target = cut_to as usize;
    if target >= active.len() {
        return CutOutcome::Skipped;
    }
    debug_assert!(target >= 1, "cut targets are validated positive");

    let ranked = resolver.rank(&state.players, active, rng);
    let survivors = ranked[..target].to_vec();

    let included = state.players[ranked[target - 1]].points;
    let excluded = state.players[ranked[target]].points;
    let sample = if included == excluded {
        ThresholdSample {
            value: included,
            kind: CutKind::Tiebreaker,
        }
    } else {
        ThresholdSample {
            value: Points::midpoint(included, excluded),
            kind: CutKind::Clean,
        }
    };

    for &eliminated in &ranked[target..] {
        state.players[eliminated].eliminated_at_round = Some(round + 1);
        state.players[eliminated].pending_lobby = None;
    }

    CutOutcome::Applied { survivors, sample }
}
