//! Trial aggregation - counters folded over trial outcomes
//!
//! The aggregate is pure counting; probabilities are derived once at the end.
//! Folding is sequential and in trial order so a seeded run always produces
//! the same aggregate regardless of how trials were scheduled.

use std::collections::BTreeMap;

use cutline_core::Points;

use crate::cut::CutKind;
use crate::runner::TrialOutcome;

/// Per-cut threshold counters keyed by exact point value
#[derive(Clone, Debug, Default)]
pub struct ThresholdAccumulator {
    pub counts: BTreeMap<Points, u64>,
    pub clean: u64,
    pub tiebreaker: u64,
}

impl ThresholdAccumulator {
    pub fn total(&self) -> u64 {
        self.clean + self.tiebreaker
    }
}

/// Counters accumulated across completed trials
#[derive(Clone, Debug)]
pub struct SimulationAggregate {
    pub trials: u64,
    /// Win count per roster index
    pub wins: Vec<u64>,
    /// For each cut stage, made-it count per roster index
    pub made: BTreeMap<u32, Vec<u64>>,
    /// Sum of final average placements per roster index
    pub avg_placement_sum: Vec<f64>,
    /// Threshold samples grouped by cut identifier
    pub thresholds: BTreeMap<String, ThresholdAccumulator>,
}

impl SimulationAggregate {
    pub fn new(player_count: usize, cut_stages: &[u32]) -> Self {
        SimulationAggregate {
            trials: 0,
            wins: vec![0; player_count],
            made: cut_stages
                .iter()
                .map(|&stage| (stage, vec![0; player_count]))
                .collect(),
            avg_placement_sum: vec![0.0; player_count],
            thresholds: BTreeMap::new(),
        }
    }

    /// Fold one trial outcome into the counters
    pub fn fold(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        self.wins[outcome.winner] += 1;

        for (&stage, survivors) in &outcome.stage_survivors {
            if let Some(counts) = self.made.get_mut(&stage) {
                for &player in survivors {
                    counts[player] += 1;
                }
            }
        }

        for (sum, &value) in self.avg_placement_sum.iter_mut().zip(&outcome.avg_placements) {
            *sum += value;
        }

        for event in &outcome.cut_events {
            let acc = self.thresholds.entry(event.id()).or_default();
            *acc.counts.entry(event.sample.value).or_insert(0) += 1;
            match event.sample.kind {
                CutKind::Clean => acc.clean += 1,
                CutKind::Tiebreaker => acc.tiebreaker += 1,
            }
        }
    }

    /// Probability of the given count under the trials run so far
    pub fn probability(&self, count: u64) -> f64 {
        count as f64 / self.trials.max(1) as f64
    }

    /// Mean of a player's final average placement across trials
    pub fn mean_avg_placement(&self, player: usize) -> f64 {
        self.avg_placement_sum[player] / self.trials.max(1) as f64
    }
}
