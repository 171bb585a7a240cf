//! Tournament runner - plays one trial from a baseline state to a terminal state
//!
//! A trial clones the baseline, then walks the remaining rounds: simulate the
//! round, apply the post-round directive, repeat until an `end` directive, a
//! checkmate victory, or the last scheduled round. The outcome records the
//! winner, which players reached each cut stage, and every cut-threshold
//! sample observed along the way.

use std::collections::BTreeMap;

use cutline_core::{AfterRound, SimResult, TiebreakResolver, TourFormat, TournamentState};
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::cut::{apply_cut, CutOutcome, ThresholdSample};
use crate::round::{simulate_round, Lobby};
use crate::shuffle::{shuffle_lobbies, standings_lobbies};

/// One cut that actually eliminated players during a trial
#[derive(Clone, Debug, PartialEq)]
pub struct CutEvent {
    /// Round after which the cut was applied
    pub round: u32,
    pub cut_to: u32,
    pub sample: ThresholdSample,
}

impl CutEvent {
    /// Stable identifier for grouping threshold samples across trials
    pub fn id(&self) -> String {
        format!("round_{}_cut_to_{}", self.round, self.cut_to)
    }
}

/// Terminal result of one simulated trial
#[derive(Clone, Debug, PartialEq)]
pub struct TrialOutcome {
    /// Roster index of the tournament winner
    pub winner: usize,
    /// For each cut stage, the roster indices that reached it
    pub stage_survivors: FxHashMap<u32, Vec<usize>>,
    pub cut_events: Vec<CutEvent>,
    /// Final average placement per roster index
    pub avg_placements: Vec<f64>,
}

/// Simulate the remainder of the tournament once. The baseline is cloned;
/// every call with an identically-seeded RNG reproduces the same outcome.
pub fn run_trial<R: Rng>(
    baseline: &TournamentState,
    format: &TourFormat,
    rng: &mut R,
) -> SimResult<TrialOutcome> {
    let mut state = baseline.clone();
    let resolver = TiebreakResolver::new(&format.tiebreaker_order);
    let max_size = format.scoring.max_lobby_size();

    let mut stage_survivors: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
    let mut cut_events = Vec::new();

    // Stages the field already fits inside are reached by every active player
    let active = state.active_indices();
    for &stage in &format.cut_stages {
        if stage as usize >= active.len() {
            stage_survivors.insert(stage, active.clone());
        }
    }

    let mut next_lobbies = take_pending(&mut state);

    let first_round = state.next_round;
    let total_rounds = format.total_rounds();
    for round in first_round..=total_rounds {
        let lobbies = match next_lobbies.take() {
            Some(lobbies) => lobbies,
            None => standings_lobbies(&state, &resolver, max_size, rng)?,
        };
        simulate_round(&mut state, &lobbies, round, &format.scoring, rng)?;

        // round_spec is total since the loop is bounded by total_rounds
        let spec = format
            .round_spec(round)
            .unwrap_or_else(|| unreachable!("round {round} within 1..={total_rounds}"));
        match spec.after_round {
            AfterRound::None => next_lobbies = Some(lobbies),
            AfterRound::End => break,
            AfterRound::CheckmateEval => {
                if let Some(winner) = checkmate_winner(&state, format, &resolver, rng) {
                    return Ok(finish(state, format, winner, stage_survivors, cut_events));
                }
                next_lobbies = Some(lobbies);
            }
            AfterRound::Shuffle(mode) => {
                next_lobbies = Some(shuffle_lobbies(&state, mode, &resolver, max_size, rng)?);
            }
            AfterRound::CutTo(target) => {
                let before_cut = state.active_indices();
                match apply_cut(&mut state, &resolver, target, round, rng) {
                    CutOutcome::Applied { survivors, sample } => {
                        cut_events.push(CutEvent {
                            round,
                            cut_to: target,
                            sample,
                        });
                        // Anyone alive before this cut reached every larger stage
                        for &stage in &format.cut_stages {
                            if stage > target {
                                stage_survivors
                                    .entry(stage)
                                    .or_insert_with(|| before_cut.clone());
                            }
                        }
                        stage_survivors.entry(target).or_insert(survivors);
                    }
                    CutOutcome::Skipped => {
                        record_stage(&mut stage_survivors, format, target, before_cut);
                    }
                }
                // Survivors regroup by standings for the next round
            }
        }
    }

    let active = state.active_indices();
    let winner = resolver.rank(&state.players, active, rng)[0];
    Ok(finish(state, format, winner, stage_survivors, cut_events))
}

/// Record `members` as having reached `target` and any larger unrecorded stage
fn record_stage(
    stage_survivors: &mut FxHashMap<u32, Vec<usize>>,
    format: &TourFormat,
    target: u32,
    members: Vec<usize>,
) {
    for &stage in &format.cut_stages {
        if stage > target {
            stage_survivors
                .entry(stage)
                .or_insert_with(|| members.clone());
        }
    }
    stage_survivors.entry(target).or_insert(members);
}

fn finish(
    state: TournamentState,
    format: &TourFormat,
    winner: usize,
    mut stage_survivors: FxHashMap<u32, Vec<usize>>,
    cut_events: Vec<CutEvent>,
) -> TrialOutcome {
    // Stages never reached before the tournament ended are credited to the
    // players still standing
    let active = state.active_indices();
    for &stage in &format.cut_stages {
        stage_survivors
            .entry(stage)
            .or_insert_with(|| active.clone());
    }
    for survivors in stage_survivors.values_mut() {
        survivors.sort_unstable();
    }
    let avg_placements = state.players.iter().map(|p| p.avg_placement()).collect();
    TrialOutcome {
        winner,
        stage_survivors,
        cut_events,
        avg_placements,
    }
}

/// Pending lobby assignments for the next round, grouped by lobby id.
/// Clears the pending markers so they are consumed exactly once.
fn take_pending(state: &mut TournamentState) -> Option<Vec<Lobby>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, player) in state.players.iter_mut().enumerate() {
        if let Some(lobby) = player.pending_lobby.take() {
            groups.entry(lobby).or_default().push(i);
        }
    }
    if groups.is_empty() {
        return None;
    }
    Some(
        groups
            .into_iter()
            .map(|(id, members)| Lobby { id, members })
            .collect(),
    )
}

/// Winner by checkmate, if any active player reached the victory threshold
fn checkmate_winner<R: Rng>(
    state: &TournamentState,
    format: &TourFormat,
    resolver: &TiebreakResolver,
    rng: &mut R,
) -> Option<usize> {
    let threshold = format.checkmate_points?;
    let reached: Vec<usize> = state
        .active_indices()
        .into_iter()
        .filter(|&i| state.players[i].points >= threshold)
        .collect();
    if reached.is_empty() {
        return None;
    }
    Some(resolver.rank(&state.players, reached, rng)[0])
}
