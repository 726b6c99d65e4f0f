//! Deterministic rollback and resimulation
//!
//! - `snapshot`: immutable deep copies of simulation state
//! - `history`: bounded, time-ordered snapshot ring buffer
//! - `journal`: per-frame inputs for exact replay
//! - `stepper`: contracts the game layer implements
//! - `query`: read-only temporal hit resolution
//! - `manager`: restore → apply → resimulate, all or nothing

pub mod history;
pub mod journal;
pub mod manager;
pub mod query;
pub mod snapshot;
pub mod stepper;
pub mod types;

pub use history::{HistoryStats, SnapshotHistory, TIME_EPSILON};
pub use journal::{FrameRecord, InputJournal};
pub use manager::RollbackManager;
pub use query::{Resolution, TemporalQuery};
pub use snapshot::StateSnapshot;
pub use stepper::{HitCheck, SimulationStepper, StepContext};
pub use types::{
    DiagnosticCode, HitOutcome, PendingHit, ResimulationResult, RollbackPhase, adjusted_time,
};
