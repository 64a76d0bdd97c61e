//! Run configuration produced by the command line.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_LOWER_BOUND: u64 = 1;
pub const DEFAULT_STEP_SIZE: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("step size must be at least 1, got {0}")]
    NonPositiveStep(u64),
}

/// Immutable settings for one planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    pub domain_path: PathBuf,
    pub problem_path: PathBuf,
    /// Where each encoding is written; `None` means standard output.
    pub encoding_path: Option<PathBuf>,
    pub solve: bool,
    pub readable_names: bool,
    pub lower_bound: u64,
    /// `None` searches without an upper limit.
    pub upper_bound: Option<u64>,
    pub step_size: u64,
    pub prune: bool,
    pub rpg_lower_bound: bool,
    /// Per-bound solver timeout in seconds; 0 disables it.
    pub solver_timeout_secs: u64,
    pub report_path: Option<PathBuf>,
}

impl Configuration {
    pub fn new(domain_path: impl Into<PathBuf>, problem_path: impl Into<PathBuf>) -> Self {
        Self {
            domain_path: domain_path.into(),
            problem_path: problem_path.into(),
            encoding_path: None,
            solve: true,
            readable_names: false,
            lower_bound: DEFAULT_LOWER_BOUND,
            upper_bound: None,
            step_size: DEFAULT_STEP_SIZE,
            prune: false,
            rpg_lower_bound: false,
            solver_timeout_secs: 0,
            report_path: None,
        }
    }

    /// Reject settings under which the search could never advance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_size == 0 {
            return Err(ConfigError::NonPositiveStep(self.step_size));
        }
        Ok(())
    }

    /// Upper bound as the command line spells it (-1 for unlimited).
    pub fn upper_bound_display(&self) -> String {
        match self.upper_bound {
            Some(u) => u.to_string(),
            None => "-1".to_string(),
        }
    }
}
