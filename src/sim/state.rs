//! Game state and core simulation types
//!
//! Everything a step reads lives here, including the RNG stream, so a
//! cloned `GameState` is a complete snapshot.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Targets moving, spawns running
    Playing,
    /// Game is paused
    Paused,
}

/// Target types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetKind {
    #[default]
    Standard,
    /// Smaller and quicker
    Fast,
    /// Rare, large, slow, worth the most
    Bonus,
}

impl TargetKind {
    pub fn base_points(&self) -> u32 {
        match self {
            TargetKind::Standard => 100,
            TargetKind::Fast => 250,
            TargetKind::Bonus => 500,
        }
    }

    pub fn radius(&self) -> f32 {
        match self {
            TargetKind::Standard => TARGET_RADIUS,
            TargetKind::Fast => TARGET_RADIUS * 0.6,
            TargetKind::Bonus => TARGET_RADIUS * 1.5,
        }
    }

    pub fn speed(&self) -> f32 {
        match self {
            TargetKind::Standard => TARGET_SPEED,
            TargetKind::Fast => TARGET_SPEED * 2.0,
            TargetKind::Bonus => TARGET_SPEED * 0.5,
        }
    }
}

/// A circular target entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    pub kind: TargetKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Ticks left before the target expires
    pub ttl_ticks: u32,
}

impl Target {
    /// Whether a field-space point lands on this target
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        super::collision::point_in_circle(point, self.pos, self.radius)
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// RNG stream; its position is part of the state
    pub rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Current phase
    pub phase: GamePhase,
    pub score: u64,
    /// Consecutive hits without a miss or expiry
    pub combo: u32,
    pub hits: u32,
    pub misses: u32,
    /// Ticks until the next spawn attempt
    pub spawn_timer: u32,
    /// Active targets (sorted by id for determinism)
    pub targets: Vec<Target>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            phase: GamePhase::Playing,
            score: 0,
            combo: 0,
            hits: 0,
            misses: 0,
            spawn_timer: FIRST_SPAWN_TICKS,
            targets: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn a target at a random position and heading. Returns its id.
    pub fn spawn_target(&mut self) -> u32 {
        let roll: u32 = self.rng.random_range(0..100);
        let kind = match roll {
            0..8 => TargetKind::Bonus,
            8..30 => TargetKind::Fast,
            _ => TargetKind::Standard,
        };
        let radius = kind.radius();
        let pos = Vec2::new(
            self.rng.random_range(radius..FIELD_SIZE - radius),
            self.rng.random_range(radius..FIELD_SIZE - radius),
        );
        let heading: f32 = self.rng.random_range(0.0..std::f32::consts::TAU);
        let vel = Vec2::new(heading.cos(), heading.sin()) * kind.speed();

        let id = self.next_entity_id();
        self.targets.push(Target {
            id,
            kind,
            pos,
            vel,
            radius,
            ttl_ticks: TARGET_TTL_TICKS,
        });
        id
    }

    /// Place a target explicitly (tests, scripted scenarios)
    pub fn place_target(&mut self, kind: TargetKind, pos: Vec2, vel: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.targets.push(Target {
            id,
            kind,
            pos,
            vel,
            radius: kind.radius(),
            ttl_ticks: TARGET_TTL_TICKS,
        });
        id
    }

    /// Target under `point`; overlaps resolve to the closest center
    pub fn target_at(&self, point: Vec2) -> Option<&Target> {
        self.targets
            .iter()
            .filter(|t| t.contains(point))
            .min_by(|a, b| {
                a.pos
                    .distance_squared(point)
                    .partial_cmp(&b.pos.distance_squared(point))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Points a hit on `target` would award at the current combo
    pub fn points_for(&self, target: &Target) -> u32 {
        let multiplier = 1 + (self.combo + 1) / COMBO_STEP;
        target.kind.base_points() * multiplier
    }

    /// Ensure targets are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.targets.sort_by_key(|t| t.id);
    }
}
