//! Points and placement scoring
//!
//! Points are stored as a count of half-point units so that cut thresholds
//! (whole numbers for tiebreaker cuts, half numbers for clean cuts) compare,
//! hash and render exactly. The placement-to-points table is an explicit,
//! configurable parameter rather than a hardcoded assumption.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{SimError, SimResult};

/// Tournament points in half-point units
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Points(i64);

impl Points {
    pub const ZERO: Points = Points(0);

    /// Whole-number points (the usual case under integer scoring)
    pub fn from_whole(points: i64) -> Self {
        Points(points * 2)
    }

    /// Construct from raw half-point units
    pub fn from_half_units(units: i64) -> Self {
        Points(units)
    }

    /// Parse a decimal value; only half-point increments are representable
    pub fn from_f64(value: f64) -> Option<Self> {
        let scaled = value * 2.0;
        if scaled.is_finite() && scaled.fract() == 0.0 {
            Some(Points(scaled as i64))
        } else {
            None
        }
    }

    pub fn half_units(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 2.0
    }

    pub fn is_whole(self) -> bool {
        self.0 % 2 == 0
    }

    /// Midpoint of two point totals. Under whole-point scoring both inputs sit
    /// on the whole-point grid, so the result stays on the half-point grid.
    pub fn midpoint(a: Points, b: Points) -> Points {
        Points((a.0 + b.0) / 2)
    }
}

impl Add for Points {
    type Output = Points;
    fn add(self, rhs: Points) -> Points {
        Points(self.0 + rhs.0)
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Points) {
        self.0 += rhs.0;
    }
}

impl Sub for Points {
    type Output = Points;
    fn sub(self, rhs: Points) -> Points {
        Points(self.0 - rhs.0)
    }
}

impl fmt::Display for Points {
    /// Renders `17` for whole values and `18.5` for half values
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole() {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{:.1}", self.as_f64())
        }
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_whole() {
            serializer.serialize_i64(self.0 / 2)
        } else {
            serializer.serialize_f64(self.as_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::from_f64(value).ok_or_else(|| {
            D::Error::custom(format!("points value {value} is not on the half-point grid"))
        })
    }
}

/// How lobbies smaller than the full table are scored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortLobbyRule {
    /// Use the same table truncated: last place in a 7-player lobby earns the
    /// 7th-place value (2 under the standard table)
    Truncate,
    /// Shift the table so last place always earns the bottom value: last place
    /// in a 7-player lobby earns 1, first place 7
    Shift,
}

impl Default for ShortLobbyRule {
    fn default() -> Self {
        ShortLobbyRule::Truncate
    }
}

/// Placement-to-points table, best placement first
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringTable {
    #[serde(default = "default_table")]
    pub table: Vec<Points>,
    #[serde(default)]
    pub short_lobby_rule: ShortLobbyRule,
}

fn default_table() -> Vec<Points> {
    (1..=8).rev().map(Points::from_whole).collect()
}

impl Default for ScoringTable {
    fn default() -> Self {
        ScoringTable {
            table: default_table(),
            short_lobby_rule: ShortLobbyRule::default(),
        }
    }
}

impl ScoringTable {
    /// Largest lobby the table can score
    pub fn max_lobby_size(&self) -> usize {
        self.table.len()
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.table.is_empty() {
            return Err(SimError::format(
                "FORMAT_BAD_SCORING_TABLE",
                "scoring table must not be empty",
            ));
        }
        if self.table.windows(2).any(|w| w[1] > w[0]) {
            return Err(SimError::format(
                "FORMAT_BAD_SCORING_TABLE",
                "scoring table must be non-increasing from first place down",
            ));
        }
        Ok(())
    }

    /// Points for a placement (1-based) in a lobby of `lobby_size` players.
    /// Returns `None` when the placement or lobby size is out of range.
    pub fn points_for(&self, placement: usize, lobby_size: usize) -> Option<Points> {
        if placement == 0 || placement > lobby_size || lobby_size > self.table.len() {
            return None;
        }
        let index = match self.short_lobby_rule {
            ShortLobbyRule::Truncate => placement - 1,
            ShortLobbyRule::Shift => placement - 1 + (self.table.len() - lobby_size),
        };
        Some(self.table[index])
    }

    /// Total points awarded to a full lobby of `lobby_size` players
    pub fn lobby_total(&self, lobby_size: usize) -> Option<Points> {
        (1..=lobby_size)
            .map(|p| self.points_for(p, lobby_size))
            .try_fold(Points::ZERO, |acc, p| p.map(|p| acc + p))
    }
}
