//! Reference deterministic simulation: a target gallery
//!
//! Exercises the rollback core end to end. This module must be pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG carried inside the state
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, circle_wall_collision, point_in_circle, reflect_velocity};
pub use state::{GamePhase, GameState, Target, TargetKind};
pub use tick::{TickInput, apply_hit, check_hit, tick};

use glam::Vec2;

use crate::error::StepError;
use crate::rollback::{HitCheck, HitOutcome, SimulationStepper, StepContext};

/// Plugs the gallery into the rollback core
#[derive(Debug, Clone, Copy, Default)]
pub struct GalleryStepper;

impl SimulationStepper for GalleryStepper {
    type State = GameState;
    type Input = TickInput;

    fn step(
        &self,
        state: &mut GameState,
        input: &TickInput,
        ctx: &mut StepContext,
    ) -> Result<(), StepError> {
        let dt = ctx.dt;
        tick(state, input, dt, ctx.effects_mut());
        if let Some(bad) = state.targets.iter().find(|t| !t.pos.is_finite()) {
            return Err(StepError::new(format!(
                "target {} left the field at frame {}",
                bad.id, ctx.frame
            )));
        }
        Ok(())
    }

    fn rebuild_derived(&self, state: &mut GameState) {
        state.normalize_order();
    }
}

impl HitCheck<GameState> for GalleryStepper {
    fn check_hit(&self, state: &GameState, pos: Vec2) -> HitOutcome {
        check_hit(state, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::effects::SideEffect;

    #[test]
    fn test_stepper_routes_effects_through_context() {
        let mut state = GameState::new(11);
        let mut ctx = StepContext::new(1, SIM_DT, false);
        let burst = TickInput {
            spawn_burst: true,
            ..Default::default()
        };
        GalleryStepper.step(&mut state, &burst, &mut ctx).unwrap();
        assert_eq!(state.targets.len(), 3);
        let spawns = ctx
            .effects()
            .iter()
            .filter(|e| matches!(e, SideEffect::SpawnEntity { .. }))
            .count();
        assert_eq!(spawns, 3);
    }

    #[test]
    fn test_stepper_rejects_corrupt_state() {
        let mut state = GameState::new(11);
        state.place_target(TargetKind::Standard, Vec2::new(0.5, 0.5), Vec2::new(f32::NAN, 0.0));
        let mut ctx = StepContext::new(4, SIM_DT, true);
        let err = GalleryStepper
            .step(&mut state, &TickInput::default(), &mut ctx)
            .unwrap_err();
        assert!(err.reason.contains("frame 4"));
    }

    #[test]
    fn test_rebuild_derived_restores_order() {
        let mut state = GameState::new(2);
        state.place_target(TargetKind::Standard, Vec2::new(0.2, 0.2), Vec2::ZERO);
        state.place_target(TargetKind::Fast, Vec2::new(0.8, 0.8), Vec2::ZERO);
        state.targets.reverse();
        GalleryStepper.rebuild_derived(&mut state);
        assert!(state.targets.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn test_hit_check_is_read_only() {
        let mut state = GameState::new(2);
        let id = state.place_target(TargetKind::Bonus, Vec2::new(0.4, 0.6), Vec2::ZERO);
        let before = state.clone();
        let outcome = GalleryStepper.check_hit(&state, Vec2::new(0.4, 0.6));
        assert_eq!(outcome.target_id, Some(id));
        assert_eq!(outcome.points, 500);
        assert_eq!(state, before);
    }
}
