//! Bounded, time-ordered snapshot history
//!
//! Fixed-capacity ring buffer. Entries are strictly increasing in
//! `sim_time`; the oldest entry is evicted when a new one arrives at
//! capacity. Lookups are binary searches over the ordered buffer.

use std::collections::VecDeque;

use serde::Serialize;

use super::snapshot::StateSnapshot;
use crate::error::HistoryError;

/// Slack for float comparisons against snapshot times (seconds)
pub const TIME_EPSILON: f64 = 1e-6;

/// Diagnostic counters for the history buffer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HistoryStats {
    pub len: usize,
    pub capacity: usize,
    pub oldest_frame: Option<u64>,
    pub newest_frame: Option<u64>,
    pub oldest_time: Option<f64>,
    pub newest_time: Option<f64>,
    pub span_seconds: f64,
}

/// Ring buffer of snapshots ordered by simulated time
#[derive(Debug, Clone)]
pub struct SnapshotHistory<S> {
    buf: VecDeque<StateSnapshot<S>>,
    capacity: usize,
}

impl<S> SnapshotHistory<S> {
    /// A zero capacity history accepts appends but retains nothing;
    /// `RollbackConfig::validate` keeps that out of real sessions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn oldest(&self) -> Option<&StateSnapshot<S>> {
        self.buf.front()
    }

    pub fn newest(&self) -> Option<&StateSnapshot<S>> {
        self.buf.back()
    }

    pub fn get(&self, idx: usize) -> Option<&StateSnapshot<S>> {
        self.buf.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateSnapshot<S>> {
        self.buf.iter()
    }

    /// Append at the newest end, evicting the oldest entry at capacity
    pub fn append(&mut self, snapshot: StateSnapshot<S>) -> Result<(), HistoryError> {
        if let Some(newest) = self.buf.back() {
            if snapshot.sim_time() <= newest.sim_time() {
                return Err(HistoryError::OutOfOrder {
                    newest: newest.sim_time(),
                    incoming: snapshot.sim_time(),
                });
            }
        }
        if self.capacity == 0 {
            return Ok(());
        }
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(snapshot);
        Ok(())
    }

    /// Entry with minimal `|sim_time - target_time|`; ties go to the earlier one
    pub fn find_closest(&self, target_time: f64) -> Option<&StateSnapshot<S>> {
        let idx = self.buf.partition_point(|s| s.sim_time() < target_time);
        let before = idx.checked_sub(1).and_then(|i| self.buf.get(i));
        let after = self.buf.get(idx);

        match (before, after) {
            (Some(b), Some(a)) => {
                if a.sim_time() - target_time < target_time - b.sim_time() {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// Latest entry at or before `target_time` (within `TIME_EPSILON`)
    pub fn find_at_or_before(&self, target_time: f64) -> Option<&StateSnapshot<S>> {
        let idx = self
            .buf
            .partition_point(|s| s.sim_time() <= target_time + TIME_EPSILON);
        idx.checked_sub(1).and_then(|i| self.buf.get(i))
    }

    /// Position of the entry captured at `frame`
    pub fn index_of_frame(&self, frame: u64) -> Option<usize> {
        self.buf
            .binary_search_by_key(&frame, |s| s.frame_number())
            .ok()
    }

    /// Overwrite the entry with the same frame number in place.
    /// Returns false when that frame is not retained.
    pub fn replace(&mut self, snapshot: StateSnapshot<S>) -> bool {
        match self.index_of_frame(snapshot.frame_number()) {
            Some(idx) => {
                self.buf[idx] = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn get_history_stats(&self) -> HistoryStats {
        let oldest = self.buf.front();
        let newest = self.buf.back();
        let span_seconds = match (oldest, newest) {
            (Some(o), Some(n)) => n.sim_time() - o.sim_time(),
            _ => 0.0,
        };
        HistoryStats {
            len: self.buf.len(),
            capacity: self.capacity,
            oldest_frame: oldest.map(|s| s.frame_number()),
            newest_frame: newest.map(|s| s.frame_number()),
            oldest_time: oldest.map(|s| s.sim_time()),
            newest_time: newest.map(|s| s.sim_time()),
            span_seconds,
        }
    }
}
