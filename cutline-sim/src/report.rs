//! Report assembly - the JSON document written after a simulation run
//!
//! Distribution keys are the exact point values rendered the way they score:
//! whole-number thresholds print without a decimal ("17"), half-number
//! thresholds with one ("18.5").

use std::collections::BTreeMap;

use cutline_core::{Points, TourFormat, TournamentState};
use serde::Serialize;

use crate::aggregate::{SimulationAggregate, ThresholdAccumulator};

#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub tournament_name: String,
    pub total_trials: u64,
    pub players: Vec<PlayerReport>,
    pub cut_threshold_statistics: BTreeMap<String, ThresholdStats>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerReport {
    pub name: String,
    pub current_points: Points,
    /// Mean over trials of the player's final average placement
    pub average_placement: f64,
    pub win_probability: f64,
    /// Keyed "top8", "top16", ... per configured cut stage
    pub cut_probabilities: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MostCommonThreshold {
    pub threshold: f64,
    pub probability: f64,
    pub count: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ThresholdStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Trials in which this cut actually eliminated players
    pub count: u64,
    pub most_common: MostCommonThreshold,
    pub clean_cut_fraction: f64,
    pub tiebreaker_cut_fraction: f64,
    pub distribution: BTreeMap<String, f64>,
}

impl SimulationReport {
    /// Assemble the report for a finished run
    pub fn build(
        format: &TourFormat,
        baseline: &TournamentState,
        aggregate: &SimulationAggregate,
    ) -> Self {
        let players = baseline
            .players
            .iter()
            .enumerate()
            .map(|(i, player)| PlayerReport {
                name: player.name.clone(),
                current_points: player.points,
                average_placement: aggregate.mean_avg_placement(i),
                win_probability: aggregate.probability(aggregate.wins[i]),
                cut_probabilities: aggregate
                    .made
                    .iter()
                    .map(|(stage, counts)| {
                        (format!("top{stage}"), aggregate.probability(counts[i]))
                    })
                    .collect(),
            })
            .collect();

        let cut_threshold_statistics = aggregate
            .thresholds
            .iter()
            .map(|(id, acc)| (id.clone(), threshold_stats(acc)))
            .collect();

        SimulationReport {
            tournament_name: format.tournament_name.clone(),
            total_trials: aggregate.trials,
            players,
            cut_threshold_statistics,
        }
    }
}

fn threshold_stats(acc: &ThresholdAccumulator) -> ThresholdStats {
    let total = acc.total();
    let weighted_sum: f64 = acc
        .counts
        .iter()
        .map(|(value, &count)| value.as_f64() * count as f64)
        .sum();

    // Ascending key order plus a strict comparison picks the smallest
    // threshold among tied counts
    let mut most_common = (Points::ZERO, 0u64);
    for (&value, &count) in &acc.counts {
        if count > most_common.1 {
            most_common = (value, count);
        }
    }

    let denominator = total.max(1) as f64;
    ThresholdStats {
        mean: weighted_sum / denominator,
        min: acc.counts.keys().next().map_or(0.0, |v| v.as_f64()),
        max: acc.counts.keys().next_back().map_or(0.0, |v| v.as_f64()),
        count: total,
        most_common: MostCommonThreshold {
            threshold: most_common.0.as_f64(),
            probability: most_common.1 as f64 / denominator,
            count: most_common.1,
        },
        clean_cut_fraction: acc.clean as f64 / denominator,
        tiebreaker_cut_fraction: acc.tiebreaker as f64 / denominator,
        distribution: acc
            .counts
            .iter()
            .map(|(value, &count)| (value.to_string(), count as f64 / denominator))
            .collect(),
    }
}
