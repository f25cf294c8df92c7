use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{HperfError, Result, Target};

/// Execution mode selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Series,
    Parallel,
}

impl RunMode {
    pub fn as_name(&self) -> &'static str {
        match self {
            RunMode::Series => "series",
            RunMode::Parallel => "parallel",
        }
    }
}

/// Run configuration as produced by the CLI or a JSON config file.
///
/// `rate` is in requests per second: `0` runs sequentially, a positive value
/// paces concurrent launches, a negative value launches concurrently without delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub target: String,
    pub connections: usize,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub verbose: bool,
    /// Per-request deadline in milliseconds; `None` waits indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl RunConfig {
    pub fn new(target: impl Into<String>, connections: usize) -> Self {
        Self {
            target: target.into(),
            connections,
            rate: 0.0,
            verbose: false,
            timeout_ms: None,
        }
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Load a config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HperfError::ConfigFile(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| HperfError::ConfigFile(format!("{}: {e}", path.display())))
    }

    /// Check the configuration and return the parsed target.
    pub fn validate(&self) -> Result<Target> {
        let target = Target::parse(&self.target)?;
        if self.connections == 0 {
            return Err(HperfError::ZeroConnections);
        }
        if !self.rate.is_finite() || (self.rate > 0.0 && self.pacing().is_none()) {
            return Err(HperfError::InvalidRate(self.rate.to_string()));
        }
        Ok(target)
    }

    /// Zero selects series; any other value, negative included, selects parallel.
    pub fn mode(&self) -> RunMode {
        if self.rate == 0.0 {
            RunMode::Series
        } else {
            RunMode::Parallel
        }
    }

    /// Delay between parallel launches; only a positive rate paces. `None` as
    /// well when the interval is too long to represent, which `validate` rejects.
    pub fn pacing(&self) -> Option<Duration> {
        if self.rate > 0.0 && self.rate.is_finite() {
            Duration::try_from_secs_f64(1.0 / self.rate).ok()
        } else {
            None
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
