//! Contracts supplied by the game/behavior layer
//!
//! The rollback core never looks inside the state. It needs a pure step
//! function to replay with and a read-only hit test.

use glam::Vec2;

use super::types::HitOutcome;
use crate::effects::{EffectBuffer, SideEffect, SoundEffect};
use crate::error::StepError;

/// Per-step context handed to the stepper
#[derive(Debug, Default)]
pub struct StepContext {
    /// Frame number this step produces
    pub frame: u64,
    pub dt: f32,
    /// True when re-executing an already delivered frame
    pub replaying: bool,
    effects: EffectBuffer,
}

impl StepContext {
    pub fn new(frame: u64, dt: f32, replaying: bool) -> Self {
        Self {
            frame,
            dt,
            replaying,
            effects: EffectBuffer::new(),
        }
    }

    /// Queue an externally visible effect; dropped by the caller on replay
    pub fn emit(&mut self, effect: SideEffect) {
        self.effects.emit(effect);
    }

    pub fn play(&mut self, sound: SoundEffect) {
        self.effects.play(sound);
    }

    pub fn effects(&self) -> &EffectBuffer {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectBuffer {
        &mut self.effects
    }
}

/// Deterministic simulation step.
///
/// `step` must be a pure function of `(state, input, ctx.dt)`: no wall
/// clock, no RNG outside the state, no I/O. Effects go through `ctx`.
pub trait SimulationStepper {
    /// Complete, self-contained simulation state
    type State: Clone;
    /// Everything external a step consumes
    type Input: Clone + Default;

    fn step(
        &self,
        state: &mut Self::State,
        input: &Self::Input,
        ctx: &mut StepContext,
    ) -> Result<(), StepError>;

    /// Rebuild caches derived from the state after a restore
    fn rebuild_derived(&self, _state: &mut Self::State) {}
}

/// Read-only geometric hit test against a state
pub trait HitCheck<S> {
    fn check_hit(&self, state: &S, pos: Vec2) -> HitOutcome;
}

impl<S, F> HitCheck<S> for F
where
    F: Fn(&S, Vec2) -> HitOutcome,
{
    fn check_hit(&self, state: &S, pos: Vec2) -> HitOutcome {
        self(state, pos)
    }
}
