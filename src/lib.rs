//! Impact Rollback - deterministic rollback and resimulation for late hits
//!
//! Core modules:
//! - `rollback`: Snapshot history, temporal hit queries, transactional resimulation
//! - `effects`: Side effects emitted by steps, suppressed on replay
//! - `config`: Data-driven window, tick rate and replay budget
//! - `error`: Error taxonomy for configuration, history and rollback
//! - `sim`: Reference deterministic target gallery

pub mod config;
pub mod effects;
pub mod error;
pub mod rollback;
pub mod sim;

pub use config::{ConcurrentPolicy, RollbackConfig};
pub use effects::{EffectBuffer, SideEffect, SoundEffect};
pub use error::{ConfigError, HistoryError, RollbackError, SessionError, StepError};
pub use rollback::{
    DiagnosticCode, HitCheck, HitOutcome, PendingHit, ResimulationResult, RollbackManager,
    SimulationStepper, SnapshotHistory, StateSnapshot, StepContext, TemporalQuery,
};

/// Reference game constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the default tick rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Play field is the unit square
    pub const FIELD_SIZE: f32 = 1.0;

    /// Target defaults
    pub const TARGET_RADIUS: f32 = 0.05;
    /// Field units per second
    pub const TARGET_SPEED: f32 = 0.15;
    /// Four seconds at 60 Hz
    pub const TARGET_TTL_TICKS: u32 = 240;
    pub const MAX_TARGETS: usize = 8;

    /// Spawn cadence
    pub const FIRST_SPAWN_TICKS: u32 = 30;
    pub const SPAWN_INTERVAL_TICKS: u32 = 45;
    pub const SPAWN_JITTER_TICKS: u32 = 30;
    /// Targets added by a burst input
    pub const BURST_SIZE: usize = 3;

    /// Hits per combo multiplier step
    pub const COMBO_STEP: u32 = 5;
}
