//! Error taxonomy for the rollback core
//!
//! Only `ConfigError` escapes construction. Rollback failures are folded
//! into a `ResimulationResult` with an explicit code.

use serde::Serialize;
use thiserror::Error;

/// Invalid construction-time configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("history duration must be finite and positive, got {0}")]
    InvalidDuration(f64),

    #[error("ticks per second must be non-zero")]
    ZeroTickRate,

    #[error("capture interval must be at least one tick")]
    ZeroCaptureInterval,

    #[error("history capacity is zero ({duration}s at {ticks_per_second} Hz)")]
    ZeroCapacity { duration: f64, ticks_per_second: u32 },

    #[error("max frames per resimulation must be non-zero")]
    ZeroFrameBudget,

    #[error("unknown concurrent policy {0:?} (expected \"queue\" or \"reject\")")]
    UnknownPolicy(String),

    #[error("config parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Snapshot history ordering violation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    #[error("snapshot at {incoming:.4}s does not follow newest at {newest:.4}s")]
    OutOfOrder { newest: f64, incoming: f64 },
}

/// Raised by a `SimulationStepper` when a step cannot complete
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{reason}")]
pub struct StepError {
    pub reason: String,
}

impl StepError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Structured rollback failure codes
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RollbackError {
    #[error("stale event: adjusted time {adjusted_time:.3}s is before retained window at {window_start:.3}s")]
    StaleEvent { adjusted_time: f64, window_start: f64 },

    #[error("rollback already pending ({pending} queued), request rejected")]
    ConcurrentRollback { pending: usize },

    #[error("stepper failed at frame {frame}: {source}")]
    StepperFailure {
        frame: u64,
        #[source]
        source: StepError,
    },

    #[error("replay needs {needed} frames, budget is {budget}")]
    CapacityExceeded { needed: u64, budget: u32 },
}

/// Failures while advancing the live simulation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("step failed at frame {frame}: {source}")]
    Step {
        frame: u64,
        #[source]
        source: StepError,
    },

    #[error("timestep must be finite and positive, got {0}")]
    InvalidTimestep(f32),

    #[error(transparent)]
    History(#[from] HistoryError),
}

pub type SessionResult<T> = Result<T, SessionError>;
