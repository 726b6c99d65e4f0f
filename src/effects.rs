//! Externally visible side effects
//!
//! Steps never play sounds or push UI events directly. They emit tagged
//! effects into a per-step buffer; the rollback manager delivers the buffer
//! to the outbox on first execution and drops it on replay.

use serde::{Deserialize, Serialize};

/// Sound cues the game layer knows how to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Projectile struck a target
    TargetHit,
    /// Projectile landed on empty space
    Miss,
    /// New target appeared
    TargetSpawn,
    /// Target timed out without being hit
    TargetExpire,
    /// Target bounced off the play-field edge
    WallBounce,
    /// Combo threshold reached
    ComboUp,
}

/// A non-idempotent effect emitted by a step or hit applicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SideEffect {
    PlaySound { sound: SoundEffect },
    AwardScore { target_id: u32, points: u32 },
    SpawnEntity { entity_id: u32 },
    DespawnEntity { entity_id: u32 },
}

/// Effects emitted during a single step, in emission order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectBuffer {
    effects: Vec<SideEffect>,
}

impl EffectBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, effect: SideEffect) {
        self.effects.push(effect);
    }

    pub fn play(&mut self, sound: SoundEffect) {
        self.emit(SideEffect::PlaySound { sound });
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SideEffect> {
        self.effects.iter()
    }

    /// Take the buffered effects, leaving the buffer empty
    pub fn take(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Drop buffered effects, returning how many were discarded
    pub fn discard(&mut self) -> usize {
        let count = self.effects.len();
        self.effects.clear();
        count
    }
}
