//! Per-frame input journal
//!
//! Replay is only exact if every input a step consumed is fed back in.
//! The journal keeps the `(dt, input)` pair for each live frame across the
//! whole history window, independent of snapshot cadence.

use std::collections::VecDeque;

/// Inputs consumed by the step that produced `frame`
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord<I> {
    pub frame: u64,
    pub dt: f32,
    pub input: I,
}

/// Bounded, frame-ordered record of step inputs
#[derive(Debug, Clone)]
pub struct InputJournal<I> {
    records: VecDeque<FrameRecord<I>>,
    capacity: usize,
}

impl<I> InputJournal<I> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record a live frame's inputs; frames must arrive in order
    pub fn record(&mut self, frame: u64, dt: f32, input: I) {
        if self.capacity == 0 {
            return;
        }
        debug_assert!(
            self.records.back().is_none_or(|r| r.frame < frame),
            "journal frames must increase"
        );
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(FrameRecord { frame, dt, input });
    }

    /// Inputs for `frame`, if still retained
    pub fn get(&self, frame: u64) -> Option<&FrameRecord<I>> {
        let first = self.records.front()?.frame;
        let idx = usize::try_from(frame.checked_sub(first)?).ok()?;
        // Frames are contiguous in normal operation; fall back to a search if not
        match self.records.get(idx) {
            Some(r) if r.frame == frame => Some(r),
            _ => self
                .records
                .binary_search_by_key(&frame, |r| r.frame)
                .ok()
                .and_then(|i| self.records.get(i)),
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let mut journal = InputJournal::with_capacity(3);
        for frame in 1..=5u64 {
            journal.record(frame, 0.5, frame * 10);
        }
        assert_eq!(journal.len(), 3);
        assert!(journal.get(2).is_none());
        assert_eq!(journal.get(3).unwrap().input, 30);
        assert_eq!(journal.get(5).unwrap().input, 50);
        assert!(journal.get(6).is_none());
    }

    #[test]
    fn test_lookup_with_gap() {
        let mut journal = InputJournal::with_capacity(8);
        journal.record(1, 0.1, 'a');
        journal.record(2, 0.1, 'b');
        journal.record(5, 0.1, 'e');
        assert_eq!(journal.get(5).unwrap().input, 'e');
        assert!(journal.get(3).is_none());
    }

    #[test]
    fn test_zero_capacity_retains_nothing() {
        let mut journal = InputJournal::with_capacity(0);
        journal.record(1, 0.1, ());
        assert!(journal.is_empty());
    }
}
