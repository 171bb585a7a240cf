//! Tournament state - the mutable snapshot cloned once per simulation trial
//!
//! Loading validates the hard consistency invariants up front: the simulator
//! never guesses or repairs tournament data. Derived stats (average placement,
//! tiebreak counters) are recomputed from the round history; the recorded
//! point totals are verified against that history under the scoring table.

use std::collections::BTreeMap;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::format::TourFormat;
use crate::player::{Player, RoundResult, Tiebreakers};
use crate::scoring::Points;

/// All players' results-to-date plus the next round to simulate
#[derive(Clone, Debug)]
pub struct TournamentState {
    pub players: Vec<Player>,
    /// 1-based overall round number of the earliest incomplete round
    pub next_round: u32,
}

#[derive(Deserialize)]
struct RawRoundEntry {
    round: u32,
    lobby: String,
    /// `null` marks a drawn-but-unplayed lobby assignment
    #[serde(default)]
    placement: Option<u32>,
}

#[derive(Deserialize)]
struct RawPlayer {
    name: String,
    points: Points,
    #[serde(default)]
    rounds: Vec<RawRoundEntry>,
    #[serde(default)]
    eliminated_at_round: Option<u32>,
}

#[derive(Deserialize)]
struct RawState {
    players: Vec<RawPlayer>,
}

impl TournamentState {
    /// Build a state directly; used by tests and by callers that assemble
    /// players programmatically. Does not run file-level validation.
    pub fn new(players: Vec<Player>, next_round: u32) -> Self {
        TournamentState {
            players,
            next_round,
        }
    }

    /// Load and validate a state file against the format
    pub fn load(path: &Path, format: &TourFormat) -> SimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SimError::state("STATE_IO", format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content, format)
    }

    pub fn from_json(json: &str, format: &TourFormat) -> SimResult<Self> {
        let raw: RawState = serde_json::from_str(json)
            .map_err(|e| SimError::state("STATE_PARSE", e.to_string()))?;
        Self::from_raw(raw, format)
    }

    fn from_raw(raw: RawState, format: &TourFormat) -> SimResult<Self> {
        if raw.players.is_empty() {
            return Err(SimError::state(
                "STATE_NO_PLAYERS",
                "tour_state has no players",
            ));
        }

        let mut names = FxHashSet::default();
        let mut players = Vec::with_capacity(raw.players.len());
        let mut pending_rounds = Vec::with_capacity(raw.players.len());
        for raw_player in raw.players {
            if !names.insert(raw_player.name.clone()) {
                return Err(SimError::state(
                    "STATE_DUPLICATE_NAME",
                    format!("duplicate player name '{}'", raw_player.name),
                ));
            }
            let (player, pending_round) = build_player(raw_player)?;
            players.push(player);
            pending_rounds.push(pending_round);
        }

        let next_round = validate_players(&players, &pending_rounds, format)?;
        Ok(TournamentState {
            players,
            next_round,
        })
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    /// Indices of still-active players, in roster order
    pub fn active_indices(&self) -> Vec<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_active())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Convert one raw player, recomputing derived stats from the round history.
/// Returns the round number of the pending lobby entry, if any.
fn build_player(raw: RawPlayer) -> SimResult<(Player, Option<u32>)> {
    let mut results = Vec::new();
    let mut pending: Option<(u32, String)> = None;

    for entry in raw.rounds {
        match entry.placement {
            Some(placement) => results.push(RoundResult {
                round: entry.round,
                lobby: entry.lobby,
                placement,
            }),
            None => {
                if pending.is_some() {
                    return Err(SimError::state(
                        "STATE_BAD_PENDING",
                        format!("player '{}' has multiple pending lobby entries", raw.name),
                    ));
                }
                pending = Some((entry.round, entry.lobby));
            }
        }
    }
    results.sort_by_key(|r| r.round);

    let placement_sum = results.iter().map(|r| r.placement).sum();
    let tiebreakers = Tiebreakers::from_results(&results);

    let mut player = Player::new(raw.name);
    player.points = raw.points;
    player.results = results;
    player.tiebreakers = tiebreakers;
    player.placement_sum = placement_sum;
    player.eliminated_at_round = raw.eliminated_at_round;
    let pending_round = pending.as_ref().map(|(round, _)| *round);
    player.pending_lobby = pending.map(|(_, lobby)| lobby);
    Ok((player, pending_round))
}

/// Cross-player validation; returns the 1-based next round to simulate
fn validate_players(
    players: &[Player],
    pending_rounds: &[Option<u32>],
    format: &TourFormat,
) -> SimResult<u32> {
    let total_rounds = format.total_rounds();

    // Per-player round sequences
    for player in players {
        for (i, result) in player.results.iter().enumerate() {
            if result.round != i as u32 + 1 {
                return Err(SimError::state(
                    "STATE_UNEVEN_ROUNDS",
                    format!(
                        "player '{}' round history is not consecutive from round 1",
                        player.name
                    ),
                ));
            }
        }
        if player.completed_rounds() as u32 > total_rounds {
            return Err(SimError::state(
                "STATE_UNEVEN_ROUNDS",
                format!(
                    "player '{}' has {} completed rounds but the format defines {}",
                    player.name,
                    player.completed_rounds(),
                    total_rounds
                ),
            ));
        }
        if let Some(eliminated_at) = player.eliminated_at_round {
            if eliminated_at == 0 {
                return Err(SimError::state(
                    "STATE_RESULT_AFTER_ELIMINATION",
                    format!("player '{}' eliminated at round 0", player.name),
                ));
            }
            // eliminated_at is the first unplayed round
            if player.completed_rounds() as u32 != eliminated_at - 1 {
                return Err(SimError::state(
                    "STATE_RESULT_AFTER_ELIMINATION",
                    format!(
                        "player '{}' eliminated before round {} but has {} completed rounds",
                        player.name,
                        eliminated_at,
                        player.completed_rounds()
                    ),
                ));
            }
            if player.pending_lobby.is_some() {
                return Err(SimError::state(
                    "STATE_BAD_PENDING",
                    format!(
                        "eliminated player '{}' has a pending lobby assignment",
                        player.name
                    ),
                ));
            }
        }
    }

    // All active players must agree on the number of completed rounds; a round
    // partially completed across a lobby is illegal.
    let active: Vec<&Player> = players.iter().filter(|p| p.is_active()).collect();
    if active.is_empty() {
        return Err(SimError::state(
            "STATE_NO_PLAYERS",
            "every player is already eliminated",
        ));
    }
    let completed = active[0].completed_rounds();
    if let Some(player) = active.iter().find(|p| p.completed_rounds() != completed) {
        return Err(SimError::state(
            "STATE_UNEVEN_ROUNDS",
            format!(
                "player '{}' has {} completed rounds while '{}' has {}",
                player.name,
                player.completed_rounds(),
                active[0].name,
                completed
            ),
        ));
    }
    let next_round = completed as u32 + 1;

    for (player, pending_round) in players.iter().zip(pending_rounds) {
        if let Some(round) = pending_round {
            if *round != next_round {
                return Err(SimError::state(
                    "STATE_BAD_PENDING",
                    format!(
                        "player '{}' pending lobby targets round {round}, next round is {next_round}",
                        player.name
                    ),
                ));
            }
        }
    }

    validate_lobby_placements(players, format)?;
    validate_points(players, format)?;
    validate_pending(players, next_round, total_rounds, format)?;

    Ok(next_round)
}

/// Each (round, lobby) group must hold placements forming exactly 1..=size
fn validate_lobby_placements(players: &[Player], format: &TourFormat) -> SimResult<()> {
    let mut lobbies: FxHashMap<(u32, &str), Vec<u32>> = FxHashMap::default();
    for player in players {
        for result in &player.results {
            lobbies
                .entry((result.round, result.lobby.as_str()))
                .or_default()
                .push(result.placement);
        }
    }

    for ((round, lobby), mut placements) in lobbies {
        let size = placements.len();
        if size > format.scoring.max_lobby_size() {
            return Err(SimError::state(
                "STATE_BAD_PLACEMENTS",
                format!(
                    "round {round} lobby {lobby} has {size} players but the scoring table covers {}",
                    format.scoring.max_lobby_size()
                ),
            ));
        }
        placements.sort_unstable();
        if placements
            .iter()
            .enumerate()
            .any(|(i, &p)| p != i as u32 + 1)
        {
            return Err(SimError::state(
                "STATE_BAD_PLACEMENTS",
                format!(
                    "round {round} lobby {lobby} placements {placements:?} are not a permutation of 1..={size}"
                ),
            ));
        }
    }
    Ok(())
}

/// Recorded points must reconcile with the round history under the scoring table
fn validate_points(players: &[Player], format: &TourFormat) -> SimResult<()> {
    // Lobby sizes are needed to score short lobbies
    let mut sizes: FxHashMap<(u32, &str), usize> = FxHashMap::default();
    for player in players {
        for result in &player.results {
            *sizes
                .entry((result.round, result.lobby.as_str()))
                .or_default() += 1;
        }
    }

    for player in players {
        let mut expected = Points::ZERO;
        for result in &player.results {
            let size = sizes[&(result.round, result.lobby.as_str())];
            let earned = format
                .scoring
                .points_for(result.placement as usize, size)
                .ok_or_else(|| {
                    SimError::state(
                        "STATE_BAD_PLACEMENTS",
                        format!(
                            "player '{}' placement {} is invalid for a {size}-player lobby",
                            player.name, result.placement
                        ),
                    )
                })?;
            expected += earned;
        }
        if expected != player.points {
            return Err(SimError::state(
                "STATE_POINTS_MISMATCH",
                format!(
                    "player '{}' has {} recorded points but the round history yields {}",
                    player.name, player.points, expected
                ),
            ));
        }
    }
    Ok(())
}

/// Pending assignments must target the next round, cover all active players or
/// none, and fit the scoring table
fn validate_pending(
    players: &[Player],
    next_round: u32,
    total_rounds: u32,
    format: &TourFormat,
) -> SimResult<()> {
    let active: Vec<&Player> = players.iter().filter(|p| p.is_active()).collect();
    let with_pending = active.iter().filter(|p| p.pending_lobby.is_some()).count();
    if with_pending == 0 {
        return Ok(());
    }
    if with_pending != active.len() {
        return Err(SimError::state(
            "STATE_BAD_PENDING",
            format!(
                "{with_pending} of {} active players have a pending lobby assignment",
                active.len()
            ),
        ));
    }
    if next_round > total_rounds {
        return Err(SimError::state(
            "STATE_BAD_PENDING",
            "pending lobby assignment but the format has no rounds left",
        ));
    }

    let mut sizes: BTreeMap<&str, usize> = BTreeMap::new();
    for player in &active {
        if let Some(lobby) = player.pending_lobby.as_deref() {
            *sizes.entry(lobby).or_default() += 1;
        }
    }
    for (lobby, size) in sizes {
        if size > format.scoring.max_lobby_size() {
            return Err(SimError::state(
                "STATE_BAD_PENDING",
                format!(
                    "pending lobby {lobby} has {size} players but the scoring table covers {}",
                    format.scoring.max_lobby_size()
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TourFormat;

    fn two_round_format() -> TourFormat {
        TourFormat::from_json(
            r#"{
                "tournament_name": "Test",
                "round_structure": [
                    {"overall_round": 1, "day": 1, "round_in_day": 1, "after_round": "nothing"},
                    {"overall_round": 2, "day": 1, "round_in_day": 2, "after_round": "end"}
                ],
                "tiebreaker_order": ["firsts", "avg_placement"]
            }"#,
        )
        .unwrap()
    }

    fn fresh_players_json(count: usize) -> String {
        let players: Vec<String> = (0..count)
            .map(|i| format!(r#"{{"name": "P{i}", "points": 0}}"#))
            .collect();
        format!(r#"{{"players": [{}]}}"#, players.join(","))
    }

    #[test]
    fn test_load_fresh_state() {
        let format = two_round_format();
        let state = TournamentState::from_json(&fresh_players_json(8), &format).unwrap();
        assert_eq!(state.players.len(), 8);
        assert_eq!(state.next_round, 1);
        assert_eq!(state.active_count(), 8);
    }

    #[test]
    fn test_load_mid_tournament_state() {
        let format = two_round_format();
        // Two players, a completed 2-player round 1 (placements 1 and 2)
        let json = r#"{"players": [
            {"name": "A", "points": 8, "rounds": [{"round": 1, "lobby": "A", "placement": 1}]},
            {"name": "B", "points": 7, "rounds": [{"round": 1, "lobby": "A", "placement": 2}]}
        ]}"#;
        let state = TournamentState::from_json(json, &format).unwrap();
        assert_eq!(state.next_round, 2);
        assert_eq!(state.players[0].tiebreakers.firsts, 1);
        assert_eq!(state.players[1].avg_placement(), 2.0);
    }

    #[test]
    fn test_uneven_completed_rounds_is_inconsistent() {
        let format = two_round_format();
        let json = r#"{"players": [
            {"name": "A", "points": 8, "rounds": [{"round": 1, "lobby": "A", "placement": 1}]},
            {"name": "B", "points": 0}
        ]}"#;
        let err = TournamentState::from_json(json, &format).unwrap_err();
        assert_eq!(err.code(), "STATE_UNEVEN_ROUNDS");
    }

    #[test]
    fn test_duplicate_placements_are_inconsistent() {
        let format = two_round_format();
        let json = r#"{"players": [
            {"name": "A", "points": 8, "rounds": [{"round": 1, "lobby": "A", "placement": 1}]},
            {"name": "B", "points": 8, "rounds": [{"round": 1, "lobby": "A", "placement": 1}]}
        ]}"#;
        let err = TournamentState::from_json(json, &format).unwrap_err();
        assert_eq!(err.code(), "STATE_BAD_PLACEMENTS");
    }

    #[test]
    fn test_points_must_reconcile_with_history() {
        let format = two_round_format();
        let json = r#"{"players": [
            {"name": "A", "points": 99, "rounds": [{"round": 1, "lobby": "A", "placement": 1}]},
            {"name": "B", "points": 7, "rounds": [{"round": 1, "lobby": "A", "placement": 2}]}
        ]}"#;
        let err = TournamentState::from_json(json, &format).unwrap_err();
        assert_eq!(err.code(), "STATE_POINTS_MISMATCH");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let format = two_round_format();
        let json = r#"{"players": [
            {"name": "A", "points": 0},
            {"name": "A", "points": 0}
        ]}"#;
        let err = TournamentState::from_json(json, &format).unwrap_err();
        assert_eq!(err.code(), "STATE_DUPLICATE_NAME");
    }

    #[test]
    fn test_pending_assignment_must_cover_all_active_players() {
        let format = two_round_format();
        let json = r#"{"players": [
            {"name": "A", "points": 8, "rounds": [
                {"round": 1, "lobby": "A", "placement": 1},
                {"round": 2, "lobby": "B", "placement": null}
            ]},
            {"name": "B", "points": 7, "rounds": [{"round": 1, "lobby": "A", "placement": 2}]}
        ]}"#;
        let err = TournamentState::from_json(json, &format).unwrap_err();
        assert_eq!(err.code(), "STATE_BAD_PENDING");
    }

    #[test]
    fn test_pending_assignment_loads() {
        let format = two_round_format();
        let json = r#"{"players": [
            {"name": "A", "points": 8, "rounds": [
                {"round": 1, "lobby": "A", "placement": 1},
                {"round": 2, "lobby": "B", "placement": null}
            ]},
            {"name": "B", "points": 7, "rounds": [
                {"round": 1, "lobby": "A", "placement": 2},
                {"round": 2, "lobby": "B", "placement": null}
            ]}
        ]}"#;
        let state = TournamentState::from_json(json, &format).unwrap();
        assert_eq!(state.next_round, 2);
        assert_eq!(state.players[0].pending_lobby.as_deref(), Some("B"));
    }

    #[test]
    fn test_eliminated_player_history_must_stop_before_elimination() {
        let format = two_round_format();
        // Eliminated before round 2 yet carries a round 2 result
        let json = r#"{"players": [
            {"name": "A", "points": 16, "rounds": [
                {"round": 1, "lobby": "A", "placement": 1},
                {"round": 2, "lobby": "A", "placement": 1}
            ], "eliminated_at_round": 2},
            {"name": "B", "points": 7, "rounds": [{"round": 1, "lobby": "A", "placement": 2}]}
        ]}"#;
        let err = TournamentState::from_json(json, &format).unwrap_err();
        assert_eq!(err.code(), "STATE_RESULT_AFTER_ELIMINATION");
    }

    #[test]
    fn test_empty_roster_rejected() {
        let format = two_round_format();
        let err = TournamentState::from_json(r#"{"players": []}"#, &format).unwrap_err();
        assert_eq!(err.code(), "STATE_NO_PLAYERS");
    }

    #[test]
    fn test_clone_is_independent() {
        let format = two_round_format();
        let state = TournamentState::from_json(&fresh_players_json(4), &format).unwrap();
        let mut clone = state.clone();
        clone.players[0].points = Points::from_whole(99);
        assert_eq!(state.players[0].points, Points::ZERO);
    }
}
