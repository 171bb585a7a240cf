//! Tiebreak resolution - strict total order over players
//!
//! Players are compared by points first, then by each configured metric in
//! order. Groups that remain fully tied are ordered uniformly at random from
//! the trial's random stream; that random fallback is the documented final
//! rule, so `rank` always produces a strict order.

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::player::Player;

/// A tiebreak metric with explicit polarity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Firsts,
    Seconds,
    Thirds,
    Fourths,
    Fifths,
    Sixths,
    Sevenths,
    Eighths,
    Top4s,
    AvgPlacement,
}

impl Metric {
    /// Parse a metric name as it appears in `tiebreaker_order`
    pub fn parse(name: &str) -> Option<Metric> {
        match name {
            "firsts" => Some(Metric::Firsts),
            "seconds" => Some(Metric::Seconds),
            "thirds" => Some(Metric::Thirds),
            "fourths" => Some(Metric::Fourths),
            "fifths" => Some(Metric::Fifths),
            "sixths" => Some(Metric::Sixths),
            "sevenths" => Some(Metric::Sevenths),
            "eighths" => Some(Metric::Eighths),
            "top4s" => Some(Metric::Top4s),
            "avg_placement" => Some(Metric::AvgPlacement),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Firsts => "firsts",
            Metric::Seconds => "seconds",
            Metric::Thirds => "thirds",
            Metric::Fourths => "fourths",
            Metric::Fifths => "fifths",
            Metric::Sixths => "sixths",
            Metric::Sevenths => "sevenths",
            Metric::Eighths => "eighths",
            Metric::Top4s => "top4s",
            Metric::AvgPlacement => "avg_placement",
        }
    }

    /// Polarity: counts rank higher-is-better, average placement lower-is-better
    pub fn higher_is_better(self) -> bool {
        !matches!(self, Metric::AvgPlacement)
    }

    fn counter(self, player: &Player) -> u32 {
        match self {
            Metric::Firsts => player.tiebreakers.firsts,
            Metric::Seconds => player.tiebreakers.seconds,
            Metric::Thirds => player.tiebreakers.thirds,
            Metric::Fourths => player.tiebreakers.fourths,
            Metric::Fifths => player.tiebreakers.fifths,
            Metric::Sixths => player.tiebreakers.sixths,
            Metric::Sevenths => player.tiebreakers.sevenths,
            Metric::Eighths => player.tiebreakers.eighths,
            Metric::Top4s => player.tiebreakers.top4s,
            Metric::AvgPlacement => unreachable!("avg_placement is not count-based"),
        }
    }

    /// Ordering of `a` against `b` on this metric alone, better first
    fn ordering(self, a: &Player, b: &Player) -> Ordering {
        match self {
            Metric::AvgPlacement => a
                .avg_placement()
                .partial_cmp(&b.avg_placement())
                .unwrap_or(Ordering::Equal),
            _ => self.counter(b).cmp(&self.counter(a)),
        }
    }
}

/// Total-order comparator over players for a configured tiebreaker order
pub struct TiebreakResolver<'a> {
    order: &'a [Metric],
}

impl<'a> TiebreakResolver<'a> {
    pub fn new(order: &'a [Metric]) -> Self {
        TiebreakResolver { order }
    }

    /// Compare two players, better first: points, then each metric in order.
    /// `Equal` is only possible before the random fallback is applied.
    pub fn compare(&self, a: &Player, b: &Player) -> Ordering {
        let mut ordering = b.points.cmp(&a.points);
        for &metric in self.order {
            if ordering != Ordering::Equal {
                break;
            }
            ordering = metric.ordering(a, b);
        }
        ordering
    }

    /// Rank the given player indices, best first. Runs that are fully tied
    /// after all metrics are shuffled so every permutation of a tied group is
    /// equally likely.
    pub fn rank<R: Rng>(
        &self,
        players: &[Player],
        mut indices: Vec<usize>,
        rng: &mut R,
    ) -> Vec<usize> {
        indices.sort_by(|&a, &b| self.compare(&players[a], &players[b]));

        let mut start = 0;
        while start < indices.len() {
            let mut end = start + 1;
            while end < indices.len()
                && self.compare(&players[indices[start]], &players[indices[end]])
                    == Ordering::Equal
            {
                end += 1;
            }
            if end - start > 1 {
                indices[start..end].shuffle(rng);
            }
            start = end;
        }
        indices
    }
}
