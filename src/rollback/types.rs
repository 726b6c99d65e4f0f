//! Requests and results crossing the rollback boundary

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::RollbackError;

/// A hit reported by the detection backend, not yet resolved.
///
/// Timestamps are simulation seconds since session start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingHit {
    pub x: f32,
    pub y: f32,
    pub detected_timestamp: f64,
    pub estimated_latency_ms: f64,
    pub confidence: f32,
}

impl PendingHit {
    pub fn new(x: f32, y: f32, detected_timestamp: f64, estimated_latency_ms: f64) -> Self {
        Self {
            x,
            y,
            detected_timestamp,
            estimated_latency_ms,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Detection time corrected for flight and processing latency
    #[inline]
    pub fn adjusted_time(&self) -> f64 {
        adjusted_time(self.detected_timestamp, self.estimated_latency_ms)
    }
}

#[inline]
pub fn adjusted_time(event_timestamp: f64, estimated_latency_ms: f64) -> f64 {
    event_timestamp - estimated_latency_ms / 1000.0
}

/// Why a hit outcome came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// Hit test succeeded
    ConfirmedHit,
    /// Hit test ran and found nothing
    ConfirmedMiss,
    /// Adjusted time is outside the retained window
    StaleEvent,
    /// No snapshot retained at all
    NoHistory,
    /// Replay was clamped; outcome not committed
    LowConfidence,
    /// Stepper failed during replay; rollback undone
    Aborted,
}

impl DiagnosticCode {
    /// True when the hit test actually ran against a resolved state
    pub fn is_resolved(&self) -> bool {
        matches!(self, DiagnosticCode::ConfirmedHit | DiagnosticCode::ConfirmedMiss)
    }
}

/// Result of testing one hit against one state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitOutcome {
    pub hit: bool,
    pub target_id: Option<u32>,
    pub points: u32,
    pub diagnostic: DiagnosticCode,
    /// Frame of the state the test ran against (`None` when unresolved)
    pub resolved_frame: Option<u64>,
}

impl HitOutcome {
    pub fn hit(target_id: u32, points: u32) -> Self {
        Self {
            hit: true,
            target_id: Some(target_id),
            points,
            diagnostic: DiagnosticCode::ConfirmedHit,
            resolved_frame: None,
        }
    }

    pub fn miss() -> Self {
        Self {
            hit: false,
            target_id: None,
            points: 0,
            diagnostic: DiagnosticCode::ConfirmedMiss,
            resolved_frame: None,
        }
    }

    /// No hit test ran; `code` says why
    pub fn unresolved(code: DiagnosticCode) -> Self {
        Self {
            hit: false,
            target_id: None,
            points: 0,
            diagnostic: code,
            resolved_frame: None,
        }
    }

    pub fn at_frame(mut self, frame: u64) -> Self {
        self.resolved_frame = Some(frame);
        self
    }

    /// Keep the test result but mark it as not authoritative
    pub fn downgraded(mut self, code: DiagnosticCode) -> Self {
        self.diagnostic = code;
        self
    }
}

/// Telemetry for one rollback call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResimulationResult {
    pub frames_replayed: u32,
    pub snapshot_age_ms: f64,
    pub success: bool,
    pub partial: bool,
    pub hit_outcome: HitOutcome,
    pub snapshot_frame: Option<u64>,
    pub effects_suppressed: usize,
    pub inputs_reconstructed: u32,
    pub error: Option<RollbackError>,
}

impl ResimulationResult {
    /// A rollback that did not touch any state
    pub fn failed(error: RollbackError, code: DiagnosticCode) -> Self {
        Self {
            frames_replayed: 0,
            snapshot_age_ms: 0.0,
            success: false,
            partial: false,
            hit_outcome: HitOutcome::unresolved(code),
            snapshot_frame: None,
            effects_suppressed: 0,
            inputs_reconstructed: 0,
            error: Some(error),
        }
    }
}

/// Rollback state machine: `Idle → Resolving → Restoring → Resimulating → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPhase {
    #[default]
    Idle,
    Resolving,
    Restoring,
    Resimulating,
}
