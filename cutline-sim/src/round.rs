//! Round simulation - random placements for one unplayed round
//!
//! Every lobby member gets a distinct placement drawn as a uniform random
//! permutation of 1..=lobby_size; placements convert to points through the
//! configured scoring table.

use cutline_core::{ScoringTable, SimError, SimResult, TournamentState};
use rand::seq::SliceRandom;
use rand::Rng;

/// One lobby of players scheduled for a round
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lobby {
    /// Identifier recorded in each player's round history
    pub id: String,
    /// Indices into the state's roster
    pub members: Vec<usize>,
}

/// Lobby identifier for a 0-based lobby index: `A`..`Z`, then `AA`, `AB`, ...
pub fn lobby_id(index: usize) -> String {
    let mut n = index;
    let mut id = String::new();
    loop {
        id.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    id
}

/// Simulate one round for every lobby, updating points, history and tiebreak
/// counters. Advances the state's next-round marker.
pub fn simulate_round<R: Rng>(
    state: &mut TournamentState,
    lobbies: &[Lobby],
    round: u32,
    table: &ScoringTable,
    rng: &mut R,
) -> SimResult<()> {
    for lobby in lobbies {
        let size = lobby.members.len();
        let mut placements: Vec<u32> = (1..=size as u32).collect();
        placements.shuffle(rng);

        for (&member, &placement) in lobby.members.iter().zip(placements.iter()) {
            let points = table.points_for(placement as usize, size).ok_or_else(|| {
                SimError::state(
                    "STATE_BAD_PLACEMENTS",
                    format!(
                        "lobby {} holds {size} players but the scoring table covers {}",
                        lobby.id,
                        table.max_lobby_size()
                    ),
                )
            })?;
            state.players[member].record_result(round, lobby.id.clone(), placement, points);
        }
    }
    state.next_round = round + 1;
    Ok(())
}
