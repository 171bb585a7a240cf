//! Tournament format - immutable round structure, tiebreaker order, cut stages
//!
//! The JSON file uses a loosely-typed `after_round` string with sibling
//! `shuffle_type`/`cut_to` fields; loading converts that into the closed
//! `AfterRound` enum so every directive is handled exhaustively downstream.

use std::path::Path;

use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::scoring::{Points, ScoringTable};
use crate::tiebreak::Metric;

/// Lobby reassignment mode between rounds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShuffleMode {
    /// Alternating forward/reverse passes over the points-sorted field
    Snake,
    /// Independent uniform draw with balanced lobby sizes
    Random,
}

/// Post-round directive, one per scheduled round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AfterRound {
    None,
    /// End the tournament now if any player reached the checkmate threshold
    CheckmateEval,
    End,
    Shuffle(ShuffleMode),
    CutTo(u32),
}

/// One scheduled round
#[derive(Clone, Debug)]
pub struct RoundSpec {
    /// 1-based overall round number
    pub overall_round: u32,
    pub day: u32,
    pub round_in_day: u32,
    pub after_round: AfterRound,
}

/// Immutable description of the whole event
#[derive(Clone, Debug)]
pub struct TourFormat {
    pub tournament_name: String,
    pub rounds: Vec<RoundSpec>,
    /// Metrics evaluated left-to-right after points; the random fallback is implicit
    pub tiebreaker_order: Vec<Metric>,
    /// Descending target counts, used for labeling made-cut statistics
    pub cut_stages: Vec<u32>,
    /// Victory threshold for `CheckmateEval` rounds
    pub checkmate_points: Option<Points>,
    pub scoring: ScoringTable,
}

#[derive(Deserialize)]
struct RawRound {
    overall_round: u32,
    day: u32,
    round_in_day: u32,
    after_round: String,
    #[serde(default)]
    shuffle_type: Option<String>,
    #[serde(default)]
    cut_to: Option<u32>,
}

#[derive(Deserialize)]
struct RawFormat {
    tournament_name: String,
    round_structure: Vec<RawRound>,
    tiebreaker_order: Vec<String>,
    #[serde(default)]
    cut_stages: Vec<u32>,
    #[serde(default)]
    checkmate_points: Option<Points>,
    #[serde(default)]
    scoring: Option<ScoringTable>,
}

impl TourFormat {
    /// Load and validate a format file
    pub fn load(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SimError::format("FORMAT_IO", format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        let raw: RawFormat = serde_json::from_str(json)
            .map_err(|e| SimError::format("FORMAT_PARSE", e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawFormat) -> SimResult<Self> {
        let mut rounds = Vec::with_capacity(raw.round_structure.len());
        for round in &raw.round_structure {
            rounds.push(RoundSpec {
                overall_round: round.overall_round,
                day: round.day,
                round_in_day: round.round_in_day,
                after_round: convert_action(round)?,
            });
        }

        let mut tiebreaker_order = Vec::with_capacity(raw.tiebreaker_order.len());
        for name in &raw.tiebreaker_order {
            let metric = Metric::parse(name).ok_or_else(|| {
                SimError::format(
                    "FORMAT_UNKNOWN_METRIC",
                    format!("unknown tiebreak metric '{name}'"),
                )
            })?;
            tiebreaker_order.push(metric);
        }

        let format = TourFormat {
            tournament_name: raw.tournament_name,
            rounds,
            tiebreaker_order,
            cut_stages: raw.cut_stages,
            checkmate_points: raw.checkmate_points,
            scoring: raw.scoring.unwrap_or_default(),
        };
        format.validate()?;
        Ok(format)
    }

    pub fn total_rounds(&self) -> u32 {
        self.rounds.len() as u32
    }

    /// Spec for a 1-based overall round number
    pub fn round_spec(&self, round: u32) -> Option<&RoundSpec> {
        self.rounds.get(round.checked_sub(1)? as usize)
    }

    fn validate(&self) -> SimResult<()> {
        if self.rounds.is_empty() {
            return Err(SimError::format(
                "FORMAT_EMPTY_ROUNDS",
                "round_structure must contain at least one round",
            ));
        }
        for (i, round) in self.rounds.iter().enumerate() {
            if round.overall_round != i as u32 + 1 {
                return Err(SimError::format(
                    "FORMAT_BAD_ROUND_NUMBERING",
                    format!(
                        "round_structure entry {} has overall_round {}, expected {}",
                        i,
                        round.overall_round,
                        i + 1
                    ),
                ));
            }
        }

        self.scoring.validate()?;

        if self.cut_stages.windows(2).any(|w| w[1] >= w[0]) {
            return Err(SimError::format(
                "FORMAT_NON_MONOTONIC_CUTS",
                "cut_stages must be strictly descending",
            ));
        }
        if self.cut_stages.iter().any(|&s| s == 0) {
            return Err(SimError::format(
                "FORMAT_NON_MONOTONIC_CUTS",
                "cut_stages targets must be positive",
            ));
        }

        let mut last_cut: Option<u32> = None;
        let mut has_checkmate = false;
        for round in &self.rounds {
            match round.after_round {
                AfterRound::CutTo(target) => {
                    if let Some(previous) = last_cut {
                        if target > previous {
                            return Err(SimError::format(
                                "FORMAT_NON_MONOTONIC_CUTS",
                                format!(
                                    "cut to {target} after round {} follows a cut to {previous}",
                                    round.overall_round
                                ),
                            ));
                        }
                    }
                    last_cut = Some(target);
                    if !self.cut_stages.contains(&target) {
                        return Err(SimError::format(
                            "FORMAT_CUT_NOT_IN_STAGES",
                            format!("cut target {target} is not listed in cut_stages"),
                        ));
                    }
                }
                AfterRound::CheckmateEval => has_checkmate = true,
                _ => {}
            }
        }

        if has_checkmate && self.checkmate_points.is_none() {
            return Err(SimError::format(
                "FORMAT_MISSING_CHECKMATE_POINTS",
                "round_structure uses checkmate but checkmate_points is not set",
            ));
        }

        Ok(())
    }
}

fn convert_action(round: &RawRound) -> SimResult<AfterRound> {
    match round.after_round.as_str() {
        "nothing" | "none" => Ok(AfterRound::None),
        "checkmate" => Ok(AfterRound::CheckmateEval),
        "end" => Ok(AfterRound::End),
        "shuffle" => match round.shuffle_type.as_deref() {
            Some("snake") => Ok(AfterRound::Shuffle(ShuffleMode::Snake)),
            Some("random") => Ok(AfterRound::Shuffle(ShuffleMode::Random)),
            other => Err(SimError::format(
                "FORMAT_UNKNOWN_ACTION",
                format!(
                    "round {}: shuffle requires shuffle_type snake|random, got {:?}",
                    round.overall_round, other
                ),
            )),
        },
        "cut" => round.cut_to.map(AfterRound::CutTo).ok_or_else(|| {
            SimError::format(
                "FORMAT_UNKNOWN_ACTION",
                format!("round {}: cut requires cut_to", round.overall_round),
            )
        }),
        other => Err(SimError::format(
            "FORMAT_UNKNOWN_ACTION",
            format!("round {}: unknown after_round '{other}'", round.overall_round),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_json(round_structure: &str, extra: &str) -> String {
        format!(
            r#"{{
                "tournament_name": "Test Open",
                "round_structure": {round_structure},
                "tiebreaker_order": ["firsts", "top4s", "avg_placement"]
                {extra}
            }}"#
        )
    }

    #[test]
    fn test_load_basic_format() {
        let json = format_json(
            r#"[
                {"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "nothing"},
                {"overall_round": 2, "day": 1, "round_in_day": 2, "after_round": "shuffle", "shuffle_type": "snake"},
                {"overall_round": 3, "day": 1, "round_in_day": 3, "after_round": "cut", "cut_to": 8},
                {"overall_round": 4, "day": 2, "round_in_day": 1, "after_round": "end"}
            ]"#,
            r#", "cut_stages": [8]"#,
        );
        let format = TourFormat::from_json(&json).unwrap();
        assert_eq!(format.tournament_name, "Test Open");
        assert_eq!(format.total_rounds(), 4);
        assert_eq!(format.rounds[1].after_round, AfterRound::Shuffle(ShuffleMode::Snake));
        assert_eq!(format.rounds[2].after_round, AfterRound::CutTo(8));
        assert_eq!(format.rounds[3].after_round, AfterRound::End);
        assert_eq!(
            format.tiebreaker_order,
            vec![Metric::Firsts, Metric::Top4s, Metric::AvgPlacement]
        );
        assert_eq!(format.scoring, ScoringTable::default());
    }

    #[test]
    fn test_unknown_action_is_format_error() {
        let json = format_json(
            r#"[{"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "explode"}]"#,
            "",
        );
        let err = TourFormat::from_json(&json).unwrap_err();
        assert_eq!(err.code(), "FORMAT_UNKNOWN_ACTION");
    }

    #[test]
    fn test_shuffle_without_mode_is_format_error() {
        let json = format_json(
            r#"[{"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "shuffle"}]"#,
            "",
        );
        assert_eq!(
            TourFormat::from_json(&json).unwrap_err().code(),
            "FORMAT_UNKNOWN_ACTION"
        );
    }

    #[test]
    fn test_unknown_metric_is_format_error() {
        let json = r#"{
            "tournament_name": "Test",
            "round_structure": [{"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "end"}],
            "tiebreaker_order": ["fourteenths"]
        }"#;
        assert_eq!(
            TourFormat::from_json(json).unwrap_err().code(),
            "FORMAT_UNKNOWN_METRIC"
        );
    }

    #[test]
    fn test_bad_round_numbering() {
        let json = format_json(
            r#"[
                {"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "nothing"},
                {"overall_round": 3, "day": 1, "round_in_day": 2, "after_round": "end"}
            ]"#,
            "",
        );
        assert_eq!(
            TourFormat::from_json(&json).unwrap_err().code(),
            "FORMAT_BAD_ROUND_NUMBERING"
        );
    }

    #[test]
    fn test_non_monotonic_cut_targets() {
        let json = format_json(
            r#"[
                {"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "cut", "cut_to": 8},
                {"overall_round": 2, "day": 1, "round_in_day": 2, "after_round": "cut", "cut_to": 16}
            ]"#,
            r#", "cut_stages": [16, 8]"#,
        );
        assert_eq!(
            TourFormat::from_json(&json).unwrap_err().code(),
            "FORMAT_NON_MONOTONIC_CUTS"
        );
    }

    #[test]
    fn test_cut_target_must_be_listed_in_stages() {
        let json = format_json(
            r#"[{"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "cut", "cut_to": 8}]"#,
            r#", "cut_stages": [16]"#,
        );
        assert_eq!(
            TourFormat::from_json(&json).unwrap_err().code(),
            "FORMAT_CUT_NOT_IN_STAGES"
        );
    }

    #[test]
    fn test_checkmate_requires_threshold() {
        let json = format_json(
            r#"[{"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "checkmate"}]"#,
            "",
        );
        assert_eq!(
            TourFormat::from_json(&json).unwrap_err().code(),
            "FORMAT_MISSING_CHECKMATE_POINTS"
        );

        let with_threshold = format_json(
            r#"[{"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "checkmate"}]"#,
            r#", "checkmate_points": 20"#,
        );
        let format = TourFormat::from_json(&with_threshold).unwrap();
        assert_eq!(format.checkmate_points, Some(Points::from_whole(20)));
    }

    #[test]
    fn test_scoring_override() {
        let json = format_json(
            r#"[{"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "end"}]"#,
            r#", "scoring": {"table": [4, 3, 2, 1], "short_lobby_rule": "shift"}"#,
        );
        let format = TourFormat::from_json(&json).unwrap();
        assert_eq!(format.scoring.max_lobby_size(), 4);
        assert_eq!(
            format.scoring.short_lobby_rule,
            crate::scoring::ShortLobbyRule::Shift
        );
    }

    #[test]
    fn test_empty_round_structure() {
        let json = format_json("[]", "");
        assert_eq!(
            TourFormat::from_json(&json).unwrap_err().code(),
            "FORMAT_EMPTY_ROUNDS"
        );
    }
}
