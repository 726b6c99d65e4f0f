//! Immutable simulation snapshots
//!
//! A snapshot owns a full deep copy of the simulation state. The state type
//! is opaque to the rollback core; it only has to be `Clone` and fully
//! self-contained (entities, scores, timers, RNG position).

use std::time::{SystemTime, UNIX_EPOCH};

/// State captured at one simulated instant
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot<S> {
    frame_number: u64,
    sim_time: f64,
    /// Wall clock at capture (ms since epoch); diagnostics only
    wall_time_ms: f64,
    state: S,
}

impl<S: Clone> StateSnapshot<S> {
    /// Deep-copy `state` and stamp it with frame and time
    pub fn capture(state: &S, frame_number: u64, sim_time: f64) -> Self {
        Self {
            frame_number,
            sim_time,
            wall_time_ms: wall_clock_ms(),
            state: state.clone(),
        }
    }

    /// Independent copy of the captured state, for restore
    pub fn restore(&self) -> S {
        self.state.clone()
    }
}

impl<S> StateSnapshot<S> {
    #[inline]
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    #[inline]
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    #[inline]
    pub fn wall_time_ms(&self) -> f64 {
        self.wall_time_ms
    }

    /// Read-only view for hit testing
    #[inline]
    pub fn state(&self) -> &S {
        &self.state
    }
}

fn wall_clock_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
