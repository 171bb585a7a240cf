//! Simulation settings - trial counts, time budget, seeding, output location

use std::path::{Path, PathBuf};
use std::time::Duration;

use cutline_core::{SimError, SimResult};
use serde::Deserialize;

/// How the trial-count and time budgets combine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopCondition {
    /// Stop when either budget is exhausted
    #[default]
    First,
    /// Keep simulating until both budgets are exhausted
    All,
}

fn default_log_every() -> u64 {
    1000
}

fn default_parallel() -> bool {
    true
}

/// Driver configuration, loaded from a JSON settings file
#[derive(Clone, Debug, Deserialize)]
pub struct SimSettings {
    pub number_of_sims: u64,
    /// Wall-clock budget in seconds
    pub duration_of_sim: f64,
    #[serde(default)]
    pub stop_condition: StopCondition,
    /// Base seed; omitted means a fresh seed per run
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default = "default_log_every")]
    pub log_every_n_sims: u64,
    pub output_file: PathBuf,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl SimSettings {
    pub fn load(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SimError::config("CONFIG_PARSE", format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        let settings: SimSettings = serde_json::from_str(json)
            .map_err(|e| SimError::config("CONFIG_PARSE", e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_of_sim)
    }

    fn validate(&self) -> SimResult<()> {
        if self.number_of_sims == 0 {
            return Err(SimError::config(
                "CONFIG_NONPOSITIVE",
                "number_of_sims must be at least 1",
            ));
        }
        if self.duration_of_sim.is_nan() || self.duration_of_sim <= 0.0 {
            return Err(SimError::config(
                "CONFIG_NONPOSITIVE",
                "duration_of_sim must be a positive number of seconds",
            ));
        }
        if self.log_every_n_sims == 0 {
            return Err(SimError::config(
                "CONFIG_NONPOSITIVE",
                "log_every_n_sims must be at least 1",
            ));
        }
        Ok(())
    }
}
