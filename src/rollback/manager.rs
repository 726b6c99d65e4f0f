//! Rollback orchestration
//!
//! Owns the live simulation, its snapshot history and input journal.
//! A late hit is resolved by restoring the nearest earlier snapshot,
//! applying the hit there, and replaying recorded inputs up to the present.
//!
//! The corrected timeline is built on a working copy. Live state and the
//! overwritten snapshots are committed together only after every replayed
//! step succeeds, so a failed or clamped rollback leaves nothing behind.

use std::collections::VecDeque;

use glam::Vec2;

use super::history::{HistoryStats, SnapshotHistory, TIME_EPSILON};
use super::journal::InputJournal;
use super::query::{TemporalQuery, window_start};
use super::snapshot::StateSnapshot;
use super::stepper::{HitCheck, SimulationStepper, StepContext};
use super::types::{DiagnosticCode, HitOutcome, PendingHit, ResimulationResult, RollbackPhase};
use crate::config::{ConcurrentPolicy, RollbackConfig};
use crate::effects::{EffectBuffer, SideEffect};
use crate::error::{ConfigError, RollbackError, SessionError, SessionResult};

pub struct RollbackManager<P: SimulationStepper> {
    config: RollbackConfig,
    stepper: P,
    live: P::State,
    frame: u64,
    sim_time: f64,
    ticks_since_capture: u32,
    history: SnapshotHistory<P::State>,
    journal: InputJournal<P::Input>,
    phase: RollbackPhase,
    pending: VecDeque<PendingHit>,
    /// Effects delivered to the game layer, oldest first
    outbox: Vec<SideEffect>,
}

impl<P: SimulationStepper> RollbackManager<P> {
    /// Start a session at frame 0 / t = 0 with `initial` as live state.
    /// Invalid configuration is the only error that escapes the manager.
    pub fn new(config: RollbackConfig, stepper: P, initial: P::State) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut history = SnapshotHistory::with_capacity(config.history_capacity());
        // Ordering cannot fail on an empty history
        let _ = history.append(StateSnapshot::capture(&initial, 0, 0.0));
        let journal = InputJournal::with_capacity(config.journal_capacity());

        log::info!(
            "Rollback session: {} snapshots over {}s, budget {} frames, policy {}",
            config.history_capacity(),
            config.history_duration_seconds,
            config.max_frames_per_resimulation,
            config.concurrent_policy.as_str()
        );

        Ok(Self {
            config,
            stepper,
            live: initial,
            frame: 0,
            sim_time: 0.0,
            ticks_since_capture: 0,
            history,
            journal,
            phase: RollbackPhase::Idle,
            pending: VecDeque::new(),
            outbox: Vec::new(),
        })
    }

    pub fn config(&self) -> &RollbackConfig {
        &self.config
    }

    pub fn stepper(&self) -> &P {
        &self.stepper
    }

    pub fn live_state(&self) -> &P::State {
        &self.live
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[inline]
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    #[inline]
    pub fn phase(&self) -> RollbackPhase {
        self.phase
    }

    pub fn history(&self) -> &SnapshotHistory<P::State> {
        &self.history
    }

    pub fn get_history_stats(&self) -> HistoryStats {
        self.history.get_history_stats()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Take all effects delivered since the last drain
    pub fn drain_effects(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.outbox)
    }

    /// Advance the live simulation by one step at the fixed timestep
    pub fn advance_fixed(&mut self, input: P::Input) -> SessionResult<()> {
        let dt = self.config.fixed_dt();
        self.advance(input, dt)
    }

    /// Advance the live simulation by one step.
    ///
    /// Records the input, delivers the step's effects and captures a
    /// snapshot at the configured cadence. A failing step leaves the live
    /// state untouched.
    pub fn advance(&mut self, input: P::Input, dt: f32) -> SessionResult<()> {
        // The clock must move, or the snapshot for this frame would not
        // follow the newest one in history
        let next_time = self.sim_time + f64::from(dt);
        if !dt.is_finite() || dt <= 0.0 || next_time <= self.sim_time {
            return Err(SessionError::InvalidTimestep(dt));
        }

        let next_frame = self.frame + 1;
        let mut next = self.live.clone();
        let mut ctx = StepContext::new(next_frame, dt, false);
        self.stepper
            .step(&mut next, &input, &mut ctx)
            .map_err(|source| SessionError::Step {
                frame: next_frame,
                source,
            })?;

        self.live = next;
        self.frame = next_frame;
        self.sim_time = next_time;
        self.journal.record(next_frame, dt, input);
        self.outbox.extend(ctx.effects_mut().take());

        self.ticks_since_capture += 1;
        if self.ticks_since_capture >= self.config.capture_interval_ticks {
            self.capture()?;
        }
        Ok(())
    }

    /// Snapshot the live state into history. Capturing the same frame
    /// twice overwrites the earlier capture.
    pub fn capture(&mut self) -> SessionResult<()> {
        let snapshot = StateSnapshot::capture(&self.live, self.frame, self.sim_time);
        self.ticks_since_capture = 0;
        if self.history.newest().map(|s| s.frame_number()) == Some(self.frame) {
            self.history.replace(snapshot);
            return Ok(());
        }
        self.history.append(snapshot)?;
        Ok(())
    }

    /// Read-only hit resolution against history or live state
    pub fn resolve_hit<C: HitCheck<P::State>>(
        &self,
        checker: &C,
        x: f32,
        y: f32,
        event_timestamp: f64,
        estimated_latency_ms: f64,
    ) -> HitOutcome {
        TemporalQuery::new(
            &self.history,
            &self.live,
            self.frame,
            self.config.history_duration_seconds,
        )
        .resolve_hit(checker, x, y, event_timestamp, estimated_latency_ms)
    }

    /// Queue a detected hit for `process_pending`
    pub fn submit(&mut self, hit: PendingHit) -> Result<(), RollbackError> {
        let pending = self.pending.len();
        let rejected = match self.config.concurrent_policy {
            ConcurrentPolicy::Reject => pending > 0,
            ConcurrentPolicy::Queue => pending >= self.config.max_pending_hits,
        };
        if rejected {
            log::warn!(
                "Rejected hit at ({:.3}, {:.3}): {} already pending",
                hit.x,
                hit.y,
                pending
            );
            return Err(RollbackError::ConcurrentRollback { pending });
        }
        self.pending.push_back(hit);
        Ok(())
    }

    /// Resolve queued hits one at a time, oldest first
    pub fn process_pending<F>(&mut self, mut apply: F) -> Vec<ResimulationResult>
    where
        F: FnMut(&mut P::State, Vec2, &mut EffectBuffer) -> HitOutcome,
    {
        let mut results = Vec::with_capacity(self.pending.len());
        while let Some(hit) = self.pending.pop_front() {
            log::trace!(
                "Processing hit ({:.3}, {:.3}) confidence {:.2}",
                hit.x,
                hit.y,
                hit.confidence
            );
            results.push(self.rollback_and_resimulate(hit.adjusted_time(), hit.position(), &mut apply));
        }
        results
    }

    /// Apply a hit at `target_sim_time` and bring the live state back up
    /// to the present.
    ///
    /// `apply` runs exactly once, against the restored state. Failures are
    /// reported in the result, never returned.
    ///
    /// `&mut self` rules out a second rollback while one is in flight;
    /// queued hits are bounded by `submit` under the concurrent policy.
    pub fn rollback_and_resimulate<F>(
        &mut self,
        target_sim_time: f64,
        position: Vec2,
        apply: F,
    ) -> ResimulationResult
    where
        F: FnOnce(&mut P::State, Vec2, &mut EffectBuffer) -> HitOutcome,
    {
        self.set_phase(RollbackPhase::Resolving);
        let result = self.run_rollback(target_sim_time, position, apply);
        self.set_phase(RollbackPhase::Idle);
        result
    }

    fn run_rollback<F>(&mut self, target: f64, position: Vec2, apply: F) -> ResimulationResult
    where
        F: FnOnce(&mut P::State, Vec2, &mut EffectBuffer) -> HitOutcome,
    {
        let request_time = self.sim_time;

        // NaN timestamps or latencies cannot be placed on the timeline
        if !target.is_finite() {
            let window = window_start(&self.history, self.config.history_duration_seconds)
                .unwrap_or(request_time);
            return self.stale(target, window);
        }

        let Some(newest_time) = self.history.newest().map(|s| s.sim_time()) else {
            return self.stale(target, request_time);
        };

        // Nothing to rewind: the live state is the state at `target`
        if target >= newest_time {
            return self.apply_live(position, apply);
        }

        let window = window_start(&self.history, self.config.history_duration_seconds)
            .unwrap_or(newest_time);
        if target < window - TIME_EPSILON {
            return self.stale(target, window);
        }
        let Some((snap_frame, snap_time)) = self
            .history
            .find_at_or_before(target)
            .map(|s| (s.frame_number(), s.sim_time()))
        else {
            return self.stale(target, window);
        };

        let snapshot_age_ms = (request_time - snap_time) * 1000.0;
        let frames_needed = self.frame.saturating_sub(snap_frame);
        let budget = self.config.max_frames_per_resimulation;
        let partial = frames_needed > u64::from(budget);
        let to_replay = frames_needed.min(u64::from(budget));

        self.set_phase(RollbackPhase::Restoring);
        let Some(mut working) = self
            .history
            .index_of_frame(snap_frame)
            .and_then(|idx| self.history.get(idx))
            .map(|s| s.restore())
        else {
            return self.stale(target, window);
        };
        self.stepper.rebuild_derived(&mut working);

        let mut hit_effects = EffectBuffer::new();
        let outcome = apply(&mut working, position, &mut hit_effects).at_frame(snap_frame);

        // Corrected history, committed only if the whole replay succeeds
        let mut staged = vec![StateSnapshot::capture(&working, snap_frame, snap_time)];

        self.set_phase(RollbackPhase::Resimulating);
        let fixed_dt = self.config.fixed_dt();
        let mut effects_suppressed = 0;
        let mut inputs_reconstructed = 0u32;
        let mut replayed = 0u32;

        for frame in (snap_frame + 1)..=(snap_frame + to_replay) {
            let (dt, input) = match self.journal.get(frame) {
                Some(record) => (record.dt, record.input.clone()),
                None => {
                    inputs_reconstructed += 1;
                    (fixed_dt, P::Input::default())
                }
            };

            let mut ctx = StepContext::new(frame, dt, true);
            if let Err(source) = self.stepper.step(&mut working, &input, &mut ctx) {
                log::error!(
                    "Replay aborted at frame {frame} ({replayed} of {to_replay} replayed): {source}"
                );
                return ResimulationResult {
                    frames_replayed: replayed,
                    snapshot_age_ms,
                    success: false,
                    partial: false,
                    hit_outcome: outcome.downgraded(DiagnosticCode::Aborted),
                    snapshot_frame: Some(snap_frame),
                    effects_suppressed,
                    inputs_reconstructed,
                    error: Some(RollbackError::StepperFailure { frame, source }),
                };
            }
            effects_suppressed += ctx.effects_mut().discard();
            replayed += 1;

            if let Some(time) = self
                .history
                .index_of_frame(frame)
                .and_then(|idx| self.history.get(idx))
                .map(|s| s.sim_time())
            {
                staged.push(StateSnapshot::capture(&working, frame, time));
            }
            log::trace!("Replayed frame {frame}");
        }

        if inputs_reconstructed > 0 {
            log::warn!(
                "Replay from frame {snap_frame} reconstructed {inputs_reconstructed} missing inputs"
            );
        }

        if partial {
            log::warn!(
                "Replay clamped: needed {frames_needed} frames, budget {budget}; rollback not committed"
            );
            return ResimulationResult {
                frames_replayed: replayed,
                snapshot_age_ms,
                success: false,
                partial: true,
                hit_outcome: outcome.downgraded(DiagnosticCode::LowConfidence),
                snapshot_frame: Some(snap_frame),
                effects_suppressed,
                inputs_reconstructed,
                error: Some(RollbackError::CapacityExceeded {
                    needed: frames_needed,
                    budget,
                }),
            };
        }

        for snap in staged {
            self.history.replace(snap);
        }
        self.live = working;
        self.outbox.extend(hit_effects.take());

        log::debug!(
            "Rollback to frame {snap_frame} ({snapshot_age_ms:.1}ms old): replayed {replayed}, suppressed {effects_suppressed} effects, hit={}",
            outcome.hit
        );

        ResimulationResult {
            frames_replayed: replayed,
            snapshot_age_ms,
            success: true,
            partial: false,
            hit_outcome: outcome,
            snapshot_frame: Some(snap_frame),
            effects_suppressed,
            inputs_reconstructed,
            error: None,
        }
    }

    /// Fast path: the hit lands on the present
    fn apply_live<F>(&mut self, position: Vec2, apply: F) -> ResimulationResult
    where
        F: FnOnce(&mut P::State, Vec2, &mut EffectBuffer) -> HitOutcome,
    {
        let mut effects = EffectBuffer::new();
        let outcome = apply(&mut self.live, position, &mut effects).at_frame(self.frame);
        self.outbox.extend(effects.take());

        // Keep the newest snapshot in step with the mutated live state
        if self.history.newest().map(|s| s.frame_number()) == Some(self.frame) {
            self.history
                .replace(StateSnapshot::capture(&self.live, self.frame, self.sim_time));
        }

        ResimulationResult {
            frames_replayed: 0,
            snapshot_age_ms: 0.0,
            success: true,
            partial: false,
            hit_outcome: outcome,
            snapshot_frame: None,
            effects_suppressed: 0,
            inputs_reconstructed: 0,
            error: None,
        }
    }

    fn stale(&self, adjusted_time: f64, window_start: f64) -> ResimulationResult {
        log::warn!(
            "Stale rollback request at {adjusted_time:.3}s (window starts {window_start:.3}s, now {:.3}s)",
            self.sim_time
        );
        ResimulationResult::failed(
            RollbackError::StaleEvent {
                adjusted_time,
                window_start,
            },
            DiagnosticCode::StaleEvent,
        )
    }

    fn set_phase(&mut self, phase: RollbackPhase) {
        log::trace!("Rollback phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
