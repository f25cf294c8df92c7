use thiserror::Error;

pub mod config;
pub mod outcome;
pub mod target;

pub use config::{RunConfig, RunMode};
pub use outcome::{Failure, FailureKind, Outcome};
pub use target::Target;

/// Error types for hperf runs.
///
/// Only configuration and bookkeeping problems live here. Transport failures of
/// individual requests are data (see [`Failure`]) and never surface as an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HperfError {
    #[error("Target is required")]
    EmptyTarget,

    #[error("Invalid target {0:?}: {1}")]
    InvalidTarget(String, String),

    #[error("Unsupported scheme {0:?}; expected http or https")]
    UnsupportedScheme(String),

    #[error("Connection count is required and cannot be zero")]
    ZeroConnections,

    #[error("Rate must be a finite number, got {0}")]
    InvalidRate(String),

    #[error("Outcome index {index} out of range for {requested} requests")]
    IndexOutOfRange { index: usize, requested: usize },

    #[error("Outcome index {0} was already recorded")]
    DuplicateIndex(usize),

    #[error("Results are finalized and no longer accept outcomes")]
    AlreadyFinalized,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Failed to load config: {0}")]
    ConfigFile(String),
}

/// Result type for hperf operations
pub type Result<T> = std::result::Result<T, HperfError>;
