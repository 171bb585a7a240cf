//! Player roster types - results-to-date for a single competitor

use crate::scoring::Points;

/// One completed round for one player
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundResult {
    /// Overall round number (1-based)
    pub round: u32,
    /// Lobby identifier (`A`, `B`, ...)
    pub lobby: String,
    /// Placement within the lobby (1-based, distinct per lobby)
    pub placement: u32,
}

/// Count-based tiebreak metrics, monotonically non-decreasing as rounds complete
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tiebreakers {
    pub firsts: u32,
    pub seconds: u32,
    pub thirds: u32,
    pub fourths: u32,
    pub fifths: u32,
    pub sixths: u32,
    pub sevenths: u32,
    pub eighths: u32,
    pub top4s: u32,
}

impl Tiebreakers {
    /// Fold one placement into the counters
    pub fn record(&mut self, placement: u32) {
        match placement {
            1 => self.firsts += 1,
            2 => self.seconds += 1,
            3 => self.thirds += 1,
            4 => self.fourths += 1,
            5 => self.fifths += 1,
            6 => self.sixths += 1,
            7 => self.sevenths += 1,
            8 => self.eighths += 1,
            _ => {}
        }
        if placement <= 4 {
            self.top4s += 1;
        }
    }

    /// Recompute counters from a full round history
    pub fn from_results(results: &[RoundResult]) -> Self {
        let mut counters = Tiebreakers::default();
        for result in results {
            counters.record(result.placement);
        }
        counters
    }
}

/// One competitor: identity, cumulative results and elimination status
#[derive(Clone, Debug)]
pub struct Player {
    /// Unique within a tournament
    pub name: String,
    /// Cumulative points across completed rounds
    pub points: Points,
    /// Completed rounds in ascending round order
    pub results: Vec<RoundResult>,
    pub tiebreakers: Tiebreakers,
    /// Sum of placements across completed rounds
    pub placement_sum: u32,
    /// First round this player does not play, once cut
    pub eliminated_at_round: Option<u32>,
    /// Lobby assignment for the next unplayed round, if already drawn
    pub pending_lobby: Option<String>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Player {
            name: name.into(),
            points: Points::ZERO,
            results: Vec::new(),
            tiebreakers: Tiebreakers::default(),
            placement_sum: 0,
            eliminated_at_round: None,
            pending_lobby: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.eliminated_at_round.is_none()
    }

    pub fn completed_rounds(&self) -> usize {
        self.results.len()
    }

    /// Placement sum divided by rounds played; 0.0 before any round
    pub fn avg_placement(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            self.placement_sum as f64 / self.results.len() as f64
        }
    }

    /// Append a completed round and update all derived stats
    pub fn record_result(&mut self, round: u32, lobby: String, placement: u32, points: Points) {
        self.results.push(RoundResult {
            round,
            lobby,
            placement,
        });
        self.points += points;
        self.placement_sum += placement;
        self.tiebreakers.record(placement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_result_updates_derived_stats() {
        let mut player = Player::new("Ari");
        player.record_result(1, "A".to_string(), 1, Points::from_whole(8));
        player.record_result(2, "A".to_string(), 4, Points::from_whole(5));

        assert_eq!(player.points, Points::from_whole(13));
        assert_eq!(player.completed_rounds(), 2);
        assert_eq!(player.avg_placement(), 2.5);
        assert_eq!(player.tiebreakers.firsts, 1);
        assert_eq!(player.tiebreakers.fourths, 1);
        assert_eq!(player.tiebreakers.top4s, 2);
    }

    #[test]
    fn test_avg_placement_before_any_round() {
        assert_eq!(Player::new("Bo").avg_placement(), 0.0);
    }

    #[test]
    fn test_tiebreakers_from_results() {
        let results = vec![
            RoundResult {
                round: 1,
                lobby: "A".to_string(),
                placement: 1,
            },
            RoundResult {
                round: 2,
                lobby: "B".to_string(),
                placement: 8,
            },
            RoundResult {
                round: 3,
                lobby: "A".to_string(),
                placement: 3,
            },
        ];
        let counters = Tiebreakers::from_results(&results);
        assert_eq!(counters.firsts, 1);
        assert_eq!(counters.thirds, 1);
        assert_eq!(counters.eighths, 1);
        assert_eq!(counters.top4s, 2);
    }

    #[test]
    fn test_active_flag_follows_elimination() {
        let mut player = Player::new("Cy");
        assert!(player.is_active());
        player.eliminated_at_round = Some(5);
        assert!(!player.is_active());
    }
}
