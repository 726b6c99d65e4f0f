//! Fixed timestep simulation tick
//!
//! Advances the gallery deterministically and applies projectile hits.
//! Sounds and score events are emitted as effects, never played here.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{circle_wall_collision, reflect_velocity};
use super::state::{GamePhase, GameState};
use crate::consts::*;
use crate::effects::{EffectBuffer, SideEffect, SoundEffect};
use crate::rollback::{DiagnosticCode, HitOutcome};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Pause toggle
    pub pause: bool,
    /// Spawn extra targets this tick (operator/debug)
    pub spawn_burst: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32, fx: &mut EffectBuffer) {
    // Handle pause toggle
    if input.pause {
        state.phase = match state.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
        };
    }
    if state.phase == GamePhase::Paused {
        return;
    }

    state.time_ticks += 1;

    // Move targets and bounce them off the field edges
    for target in &mut state.targets {
        target.pos += target.vel * dt;
        let wall = circle_wall_collision(target.pos, target.radius);
        if wall.hit {
            target.pos += wall.normal * wall.penetration;
            if target.vel.dot(wall.normal) < 0.0 {
                target.vel = reflect_velocity(target.vel, wall.normal);
                fx.play(SoundEffect::WallBounce);
            }
        }
        target.ttl_ticks = target.ttl_ticks.saturating_sub(1);
    }

    // Expire targets nobody hit; an expiry breaks the combo
    let mut expired = Vec::new();
    state.targets.retain(|t| {
        if t.ttl_ticks == 0 {
            expired.push(t.id);
            false
        } else {
            true
        }
    });
    for id in expired {
        state.combo = 0;
        fx.play(SoundEffect::TargetExpire);
        fx.emit(SideEffect::DespawnEntity { entity_id: id });
    }

    // Spawning
    state.spawn_timer = state.spawn_timer.saturating_sub(1);
    if state.spawn_timer == 0 {
        if state.targets.len() < MAX_TARGETS {
            let id = state.spawn_target();
            fx.play(SoundEffect::TargetSpawn);
            fx.emit(SideEffect::SpawnEntity { entity_id: id });
        }
        // Jitter the interval from the state's own RNG stream
        state.spawn_timer = SPAWN_INTERVAL_TICKS + state.rng.random_range(0..SPAWN_JITTER_TICKS);
    }
    if input.spawn_burst {
        for _ in 0..BURST_SIZE {
            if state.targets.len() >= MAX_TARGETS {
                break;
            }
            let id = state.spawn_target();
            fx.emit(SideEffect::SpawnEntity { entity_id: id });
        }
        fx.play(SoundEffect::TargetSpawn);
    }

    // Ensure deterministic ordering
    state.normalize_order();
}

/// Read-only hit test: what would a projectile at `point` strike?
pub fn check_hit(state: &GameState, point: Vec2) -> HitOutcome {
    match state.target_at(point) {
        Some(target) => HitOutcome::hit(target.id, state.points_for(target)),
        None => HitOutcome::miss(),
    }
}

/// Apply a projectile impact at `point`: destroy the struck target and
/// award points, or register a miss.
pub fn apply_hit(state: &mut GameState, point: Vec2, fx: &mut EffectBuffer) -> HitOutcome {
    let outcome = check_hit(state, point);
    match (outcome.diagnostic, outcome.target_id) {
        (DiagnosticCode::ConfirmedHit, Some(id)) => {
            state.targets.retain(|t| t.id != id);
            state.combo += 1;
            state.hits += 1;
            state.score += u64::from(outcome.points);

            fx.play(SoundEffect::TargetHit);
            fx.emit(SideEffect::AwardScore {
                target_id: id,
                points: outcome.points,
            });
            fx.emit(SideEffect::DespawnEntity { entity_id: id });
            if state.combo.is_multiple_of(COMBO_STEP) {
                fx.play(SoundEffect::ComboUp);
            }
        }
        _ => {
            state.combo = 0;
            state.misses += 1;
            fx.play(SoundEffect::Miss);
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::TargetKind;

    fn run(state: &mut GameState, ticks: usize) -> EffectBuffer {
        let mut fx = EffectBuffer::new();
        for _ in 0..ticks {
            tick(state, &TickInput::default(), SIM_DT, &mut fx);
        }
        fx
    }

    #[test]
    fn test_first_spawn() {
        let mut state = GameState::new(12345);
        let fx = run(&mut state, FIRST_SPAWN_TICKS as usize);
        assert_eq!(state.targets.len(), 1);
        assert!(fx
            .iter()
            .any(|e| matches!(e, SideEffect::SpawnEntity { .. })));
    }

    #[test]
    fn test_tick_pause() {
        let mut state = GameState::new(12345);
        let mut fx = EffectBuffer::new();
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause, SIM_DT, &mut fx);
        assert_eq!(state.phase, GamePhase::Paused);
        run(&mut state, 10);
        assert_eq!(state.time_ticks, 0);

        // Unpause
        tick(&mut state, &pause, SIM_DT, &mut fx);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_targets_expire_and_break_combo() {
        let mut state = GameState::new(1);
        state.spawn_timer = u32::MAX;
        state.combo = 3;
        state.place_target(TargetKind::Standard, Vec2::new(0.5, 0.5), Vec2::ZERO);
        let fx = run(&mut state, TARGET_TTL_TICKS as usize);
        assert!(state.targets.is_empty());
        assert_eq!(state.combo, 0);
        assert!(fx.iter().any(|e| *e
            == SideEffect::PlaySound {
                sound: SoundEffect::TargetExpire
            }));
    }

    #[test]
    fn test_targets_stay_in_field() {
        let mut state = GameState::new(777);
        let mut fx = EffectBuffer::new();
        let burst = TickInput {
            spawn_burst: true,
            ..Default::default()
        };
        tick(&mut state, &burst, SIM_DT, &mut fx);
        run(&mut state, 600);
        for t in &state.targets {
            assert!(t.pos.x >= 0.0 && t.pos.x <= FIELD_SIZE);
            assert!(t.pos.y >= 0.0 && t.pos.y <= FIELD_SIZE);
        }
    }

    #[test]
    fn test_apply_hit_scores_and_removes() {
        let mut state = GameState::new(5);
        let id = state.place_target(TargetKind::Standard, Vec2::new(0.5, 0.5), Vec2::ZERO);
        let mut fx = EffectBuffer::new();

        let outcome = apply_hit(&mut state, Vec2::new(0.5, 0.5), &mut fx);
        assert!(outcome.hit);
        assert_eq!(outcome.target_id, Some(id));
        assert_eq!(outcome.points, 100);
        assert_eq!(state.score, 100);
        assert_eq!(state.combo, 1);
        assert!(state.targets.is_empty());
        assert!(fx.iter().any(|e| *e
            == SideEffect::AwardScore {
                target_id: id,
                points: 100
            }));
    }

    #[test]
    fn test_apply_miss_resets_combo() {
        let mut state = GameState::new(5);
        state.combo = 4;
        let mut fx = EffectBuffer::new();
        let outcome = apply_hit(&mut state, Vec2::new(0.1, 0.9), &mut fx);
        assert!(!outcome.hit);
        assert_eq!(outcome.diagnostic, DiagnosticCode::ConfirmedMiss);
        assert_eq!(state.combo, 0);
        assert_eq!(state.misses, 1);
    }

    #[test]
    fn test_combo_multiplier() {
        let mut state = GameState::new(5);
        state.combo = COMBO_STEP - 1;
        state.place_target(TargetKind::Fast, Vec2::new(0.3, 0.3), Vec2::ZERO);
        let mut fx = EffectBuffer::new();
        let outcome = apply_hit(&mut state, Vec2::new(0.3, 0.3), &mut fx);
        assert_eq!(outcome.points, 500);
        assert!(fx.iter().any(|e| *e
            == SideEffect::PlaySound {
                sound: SoundEffect::ComboUp
            }));
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999);
        let mut state2 = GameState::new(99999);

        let inputs = [
            TickInput::default(),
            TickInput {
                spawn_burst: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        let mut fx = EffectBuffer::new();
        for _ in 0..200 {
            for input in &inputs {
                tick(&mut state1, input, SIM_DT, &mut fx);
                tick(&mut state2, input, SIM_DT, &mut fx);
            }
        }

        assert_eq!(state1, state2);
    }
}
