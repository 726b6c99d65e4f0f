//! Read-only temporal hit resolution
//!
//! Answers "did this hit land?" against the state nearest the corrected
//! event time without touching history or live state.

use glam::Vec2;

use super::history::{SnapshotHistory, TIME_EPSILON};
use super::snapshot::StateSnapshot;
use super::stepper::HitCheck;
use super::types::{DiagnosticCode, HitOutcome, adjusted_time};

/// Where a hit should be evaluated
#[derive(Debug)]
pub enum Resolution<'a, S> {
    /// At or after the newest snapshot: test the live state
    Live,
    /// Inside the window: test this snapshot
    Snapshot(&'a StateSnapshot<S>),
    /// Outside the retained window
    Stale { window_start: f64 },
    /// Nothing retained
    NoHistory,
}

/// Earliest simulated time the history can still answer for
pub fn window_start<S>(history: &SnapshotHistory<S>, window_seconds: f64) -> Option<f64> {
    let oldest = history.oldest()?.sim_time();
    let newest = history.newest()?.sim_time();
    Some(oldest.max(newest - window_seconds))
}

/// Read-only view over history plus the live state
pub struct TemporalQuery<'a, S> {
    history: &'a SnapshotHistory<S>,
    live: &'a S,
    live_frame: u64,
    window_seconds: f64,
}

impl<'a, S> TemporalQuery<'a, S> {
    pub fn new(
        history: &'a SnapshotHistory<S>,
        live: &'a S,
        live_frame: u64,
        window_seconds: f64,
    ) -> Self {
        Self {
            history,
            live,
            live_frame,
            window_seconds,
        }
    }

    /// Decide which state an event at `adjusted` should be tested against
    pub fn locate(&self, adjusted: f64) -> Resolution<'a, S> {
        let Some(newest) = self.history.newest() else {
            return Resolution::NoHistory;
        };
        let start = window_start(self.history, self.window_seconds).unwrap_or(newest.sim_time());
        if !adjusted.is_finite() {
            return Resolution::Stale {
                window_start: start,
            };
        }
        if adjusted >= newest.sim_time() {
            return Resolution::Live;
        }
        if adjusted < start - TIME_EPSILON {
            return Resolution::Stale {
                window_start: start,
            };
        }
        match self.history.find_closest(adjusted) {
            Some(snap) => Resolution::Snapshot(snap),
            None => Resolution::NoHistory,
        }
    }

    /// Resolve a detected hit. Never mutates anything; repeated calls give
    /// the same answer until history changes.
    pub fn resolve_hit<C: HitCheck<S>>(
        &self,
        checker: &C,
        x: f32,
        y: f32,
        event_timestamp: f64,
        estimated_latency_ms: f64,
    ) -> HitOutcome {
        let adjusted = adjusted_time(event_timestamp, estimated_latency_ms);
        let pos = Vec2::new(x, y);

        match self.locate(adjusted) {
            Resolution::Live => checker.check_hit(self.live, pos).at_frame(self.live_frame),
            Resolution::Snapshot(snap) => checker
                .check_hit(snap.state(), pos)
                .at_frame(snap.frame_number()),
            Resolution::Stale { window_start } => {
                log::warn!(
                    "Stale hit at ({x:.3}, {y:.3}): adjusted {adjusted:.3}s < window {window_start:.3}s"
                );
                HitOutcome::unresolved(DiagnosticCode::StaleEvent)
            }
            Resolution::NoHistory => HitOutcome::unresolved(DiagnosticCode::NoHistory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single circular target: (center, radius); `None` means no target
    type Board = Option<(Vec2, f32)>;

    fn circle_check(state: &Board, pos: Vec2) -> HitOutcome {
        match state {
            Some((center, radius)) if pos.distance(*center) <= *radius => HitOutcome::hit(1, 50),
            _ => HitOutcome::miss(),
        }
    }

    /// Target present only in the snapshot at `target_time`
    fn history_with_target_at(target_time: f64) -> SnapshotHistory<Board> {
        let mut history = SnapshotHistory::with_capacity(64);
        for frame in 0..=20u64 {
            let t = 9.0 + frame as f64 * 0.1;
            let board = if (t - target_time).abs() < 1e-9 {
                Some((Vec2::new(0.5, 0.5), 0.05))
            } else {
                None
            };
            history
                .append(StateSnapshot::capture(&board, frame, t))
                .unwrap();
        }
        history
    }

    #[test]
    fn test_latency_corrected_exact_match() {
        let history = history_with_target_at(10.0);
        let live: Board = None;
        let query = TemporalQuery::new(&history, &live, 20, 5.0);

        let outcome = query.resolve_hit(&circle_check, 0.5, 0.5, 10.15, 150.0);
        assert!(outcome.hit);
        assert_eq!(outcome.diagnostic, DiagnosticCode::ConfirmedHit);
        assert_eq!(outcome.resolved_frame, Some(10));

        // Without latency correction the world has moved on
        let naive = query.resolve_hit(&circle_check, 0.5, 0.5, 10.15, 0.0);
        assert!(!naive.hit);
        assert_eq!(naive.diagnostic, DiagnosticCode::ConfirmedMiss);
    }

    #[test]
    fn test_fast_path_uses_live_state() {
        let history = history_with_target_at(10.0);
        let live: Board = Some((Vec2::new(0.2, 0.2), 0.1));
        let query = TemporalQuery::new(&history, &live, 21, 5.0);

        let outcome = query.resolve_hit(&circle_check, 0.2, 0.2, 11.0, 0.0);
        assert!(outcome.hit);
        assert_eq!(outcome.resolved_frame, Some(21));
    }

    #[test]
    fn test_stale_event_is_distinct_from_miss() {
        let history = history_with_target_at(10.0);
        let live: Board = None;
        let query = TemporalQuery::new(&history, &live, 20, 5.0);

        let outcome = query.resolve_hit(&circle_check, 0.5, 0.5, 8.0, 100.0);
        assert!(!outcome.hit);
        assert_eq!(outcome.diagnostic, DiagnosticCode::StaleEvent);
        assert_eq!(outcome.resolved_frame, None);
    }

    #[test]
    fn test_window_shorter_than_history_marks_stale() {
        let history = history_with_target_at(10.0);
        let live: Board = None;
        // newest = 11.0, window = 0.5s → anything before 10.5 is stale
        let query = TemporalQuery::new(&history, &live, 20, 0.5);
        let outcome = query.resolve_hit(&circle_check, 0.5, 0.5, 10.15, 150.0);
        assert_eq!(outcome.diagnostic, DiagnosticCode::StaleEvent);
    }

    #[test]
    fn test_non_finite_time_is_unresolvable() {
        // Target sits in the oldest snapshot, where a NaN would otherwise land
        let history = history_with_target_at(9.0);
        let live: Board = Some((Vec2::new(0.5, 0.5), 0.05));
        let query = TemporalQuery::new(&history, &live, 20, 5.0);

        let nan_ts = query.resolve_hit(&circle_check, 0.5, 0.5, f64::NAN, 100.0);
        assert!(!nan_ts.hit);
        assert_eq!(nan_ts.diagnostic, DiagnosticCode::StaleEvent);

        let inf_latency = query.resolve_hit(&circle_check, 0.5, 0.5, 10.0, f64::INFINITY);
        assert_eq!(inf_latency.diagnostic, DiagnosticCode::StaleEvent);

        // Live state would also match; +inf must not take the fast path
        let future = query.resolve_hit(&circle_check, 0.5, 0.5, f64::INFINITY, 0.0);
        assert_eq!(future.diagnostic, DiagnosticCode::StaleEvent);
        assert!(matches!(query.locate(f64::NAN), Resolution::Stale { .. }));
    }

    #[test]
    fn test_empty_history_unresolvable() {
        let history: SnapshotHistory<Board> = SnapshotHistory::with_capacity(4);
        let live: Board = Some((Vec2::new(0.5, 0.5), 0.5));
        let query = TemporalQuery::new(&history, &live, 0, 5.0);
        let outcome = query.resolve_hit(&circle_check, 0.5, 0.5, 1.0, 0.0);
        assert_eq!(outcome.diagnostic, DiagnosticCode::NoHistory);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let history = history_with_target_at(10.0);
        let live: Board = None;
        let query = TemporalQuery::new(&history, &live, 20, 5.0);
        let a = query.resolve_hit(&circle_check, 0.51, 0.49, 10.2, 200.0);
        let b = query.resolve_hit(&circle_check, 0.51, 0.49, 10.2, 200.0);
        assert_eq!(a, b);
        assert_eq!(history.len(), 21);
    }
}
