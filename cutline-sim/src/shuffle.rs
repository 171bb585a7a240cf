//! Lobby shuffling - snake and random assignment between rounds
//!
//! Both modes tile the active field into lobbies no larger than the scoring
//! table allows, with lobby sizes differing by at most one.

use cutline_core::{ShuffleMode, SimError, SimResult, TiebreakResolver, TournamentState};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::round::{lobby_id, Lobby};

/// Balanced lobby sizes for `player_count` players: as few lobbies as possible,
/// none above `max_size`, size spread at most one, larger lobbies first.
pub fn balanced_sizes(player_count: usize, max_size: usize) -> SimResult<Vec<usize>> {
    if player_count == 0 {
        return Err(SimError::format(
            "FORMAT_EMPTY_SHUFFLE",
            "cannot assign lobbies for zero active players",
        ));
    }
    let lobbies = player_count.div_ceil(max_size);
    let base = player_count / lobbies;
    let extra = player_count % lobbies;
    Ok((0..lobbies)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect())
}

/// Reassign all active players to lobbies for the next round
pub fn shuffle_lobbies<R: Rng>(
    state: &TournamentState,
    mode: ShuffleMode,
    resolver: &TiebreakResolver,
    max_size: usize,
    rng: &mut R,
) -> SimResult<Vec<Lobby>> {
    let active = state.active_indices();
    match mode {
        ShuffleMode::Snake => snake_lobbies(state, active, resolver, max_size, rng),
        ShuffleMode::Random => random_lobbies(active, max_size, rng),
    }
}

/// Chunk the tiebreak-ranked field into balanced lobbies in standings order.
/// Used when a round has no explicit assignment and no shuffle directive.
pub fn standings_lobbies<R: Rng>(
    state: &TournamentState,
    resolver: &TiebreakResolver,
    max_size: usize,
    rng: &mut R,
) -> SimResult<Vec<Lobby>> {
    let active = state.active_indices();
    let ranked = resolver.rank(&state.players, active, rng);
    let sizes = balanced_sizes(ranked.len(), max_size)?;

    let mut lobbies = Vec::with_capacity(sizes.len());
    let mut cursor = 0;
    for (i, size) in sizes.into_iter().enumerate() {
        lobbies.push(Lobby {
            id: lobby_id(i),
            members: ranked[cursor..cursor + size].to_vec(),
        });
        cursor += size;
    }
    Ok(lobbies)
}

/// Snake assignment: sorted-rank `k` goes to the lobby given by `k mod 2L`
/// (forward half) or its mirror (backward half)
fn snake_lobbies<R: Rng>(
    state: &TournamentState,
    active: Vec<usize>,
    resolver: &TiebreakResolver,
    max_size: usize,
    rng: &mut R,
) -> SimResult<Vec<Lobby>> {
    if active.is_empty() {
        return Err(SimError::format(
            "FORMAT_EMPTY_SHUFFLE",
            "cannot snake-shuffle zero active players",
        ));
    }
    let ranked = resolver.rank(&state.players, active, rng);
    let count = ranked.len().div_ceil(max_size);

    let mut members = vec![Vec::new(); count];
    for (k, &player) in ranked.iter().enumerate() {
        let pass_position = k % (2 * count);
        let lobby = if pass_position < count {
            pass_position
        } else {
            2 * count - 1 - pass_position
        };
        members[lobby].push(player);
    }

    Ok(members
        .into_iter()
        .enumerate()
        .map(|(i, members)| Lobby {
            id: lobby_id(i),
            members,
        })
        .collect())
}

/// Random assignment: uniform shuffle, then chunk into balanced lobbies
fn random_lobbies<R: Rng>(
    mut active: Vec<usize>,
    max_size: usize,
    rng: &mut R,
) -> SimResult<Vec<Lobby>> {
    let sizes = balanced_sizes(active.len(), max_size)?;
    active.shuffle(rng);

    let mut lobbies = Vec::with_capacity(sizes.len());
    let mut cursor = 0;
    for (i, size) in sizes.into_iter().enumerate() {
        lobbies.push(Lobby {
            id: lobby_id(i),
            members: active[cursor..cursor + size].to_vec(),
        });
        cursor += size;
    }
    Ok(lobbies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_core::{Metric, Player, Points};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn state_with_descending_points(count: usize) -> TournamentState {
        let players = (0..count)
            .map(|i| {
                let mut p = Player::new(format!("P{i}"));
                // P0 leads, strictly descending, so ranking is deterministic
                p.points = Points::from_whole((count - i) as i64 * 10);
                p
            })
            .collect();
        TournamentState::new(players, 1)
    }

    #[test]
    fn test_balanced_sizes_prefers_full_lobbies() {
        assert_eq!(balanced_sizes(16, 8).unwrap(), vec![8, 8]);
        assert_eq!(balanced_sizes(30, 8).unwrap(), vec![8, 8, 7, 7]);
        assert_eq!(balanced_sizes(9, 8).unwrap(), vec![5, 4]);
        assert_eq!(balanced_sizes(7, 8).unwrap(), vec![7]);
    }

    #[test]
    fn test_balanced_sizes_zero_players_is_format_error() {
        assert_eq!(
            balanced_sizes(0, 8).unwrap_err().code(),
            "FORMAT_EMPTY_SHUFFLE"
        );
    }

    #[test]
    fn test_snake_law_for_two_lobbies() {
        let state = state_with_descending_points(16);
        let order = [Metric::Firsts];
        let resolver = TiebreakResolver::new(&order);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lobbies =
            shuffle_lobbies(&state, ShuffleMode::Snake, &resolver, 8, &mut rng).unwrap();

        assert_eq!(lobbies.len(), 2);
        // Rank k lands in lobby k mod 4 -> {0,1,1,0} repeating
        assert_eq!(lobbies[0].members, vec![0, 3, 4, 7, 8, 11, 12, 15]);
        assert_eq!(lobbies[1].members, vec![1, 2, 5, 6, 9, 10, 13, 14]);
    }

    #[test]
    fn test_snake_is_seed_independent_when_no_ties() {
        let state = state_with_descending_points(24);
        let order = [Metric::Firsts];
        let resolver = TiebreakResolver::new(&order);

        let mut rng_a = ChaCha8Rng::seed_from_u64(1);
        let mut rng_b = ChaCha8Rng::seed_from_u64(999);
        let a = shuffle_lobbies(&state, ShuffleMode::Snake, &resolver, 8, &mut rng_a).unwrap();
        let b = shuffle_lobbies(&state, ShuffleMode::Snake, &resolver, 8, &mut rng_b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_snake_sizes_stay_balanced() {
        let state = state_with_descending_points(30);
        let order = [Metric::Firsts];
        let resolver = TiebreakResolver::new(&order);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lobbies =
            shuffle_lobbies(&state, ShuffleMode::Snake, &resolver, 8, &mut rng).unwrap();

        let mut sizes: Vec<usize> = lobbies.iter().map(|l| l.members.len()).collect();
        assert_eq!(sizes.len(), 4);
        assert!(sizes.iter().all(|&s| s <= 8));
        sizes.sort_unstable();
        assert!(sizes[sizes.len() - 1] - sizes[0] <= 1);
    }

    #[test]
    fn test_random_shuffle_places_everyone_once() {
        let state = state_with_descending_points(30);
        let order = [Metric::Firsts];
        let resolver = TiebreakResolver::new(&order);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let lobbies =
            shuffle_lobbies(&state, ShuffleMode::Random, &resolver, 8, &mut rng).unwrap();

        assert_eq!(
            lobbies.iter().map(|l| l.members.len()).collect::<Vec<_>>(),
            vec![8, 8, 7, 7]
        );
        let mut all: Vec<usize> = lobbies.iter().flat_map(|l| l.members.clone()).collect();
        all.sort_unstable();
        assert_eq!(all, (0..30).collect::<Vec<usize>>());
    }

    #[test]
    fn test_standings_lobbies_chunk_in_rank_order() {
        let state = state_with_descending_points(10);
        let order = [Metric::Firsts];
        let resolver = TiebreakResolver::new(&order);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let lobbies = standings_lobbies(&state, &resolver, 8, &mut rng).unwrap();

        assert_eq!(lobbies.len(), 2);
        assert_eq!(lobbies[0].members, vec![0, 1, 2, 3, 4]);
        assert_eq!(lobbies[1].members, vec![5, 6, 7, 8, 9]);
        assert_eq!(lobbies[0].id, "A");
        assert_eq!(lobbies[1].id, "B");
    }
}
