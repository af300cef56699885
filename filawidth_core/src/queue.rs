//! Position-indexed delay queue deferring diameter measurements until the
//! corresponding filament segment reaches the hot end.

use std::collections::VecDeque;

/// One deferred measurement: `diameter` applies once the extruder has
/// advanced to `projected_position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueEntry {
    pub projected_position: f64,
    pub diameter: f64,
}

/// FIFO of (projected position, diameter) samples.
///
/// Entries arrive in ascending projected position (the extruder position is
/// assumed monotonically non-decreasing; retraction behavior is unspecified).
/// Enqueueing is rate limited to one entry per `measurement_interval` mm of
/// extruder travel, which bounds growth regardless of tick frequency; the
/// explicit capacity cap is a backstop should the two cadences ever drift.
#[derive(Debug)]
pub struct DelayQueue {
    entries: VecDeque<QueueEntry>,
    measurement_interval: f64,
    capacity: usize,
}

/// Backstop capacity; unreachable while rate limiting holds.
const DEFAULT_CAPACITY: usize = 1024;

impl DelayQueue {
    pub fn new(measurement_interval: f64) -> Self {
        Self::with_capacity(measurement_interval, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(measurement_interval: f64, capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            measurement_interval,
            capacity: capacity.max(1),
        }
    }

    /// Append iff the queue is empty or the new entry is at least one
    /// measurement interval past the tail. Returns whether it was queued.
    pub fn maybe_push(&mut self, projected_position: f64, diameter: f64) -> bool {
        let spaced = match self.entries.back() {
            None => true,
            Some(tail) => projected_position >= tail.projected_position + self.measurement_interval,
        };
        if !spaced || self.entries.len() >= self.capacity {
            return false;
        }
        self.entries.push_back(QueueEntry {
            projected_position,
            diameter,
        });
        true
    }

    /// Oldest deferred measurement, if any.
    pub fn front(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    /// Remove and return the head if `pred` accepts it. Callers use this to
    /// pop only once the extruder has reached the head's projected position;
    /// popping early would apply a diameter meant for a segment that has not
    /// been extruded yet.
    pub fn pop_front_if(&mut self, pred: impl FnOnce(&QueueEntry) -> bool) -> Option<QueueEntry> {
        if self.entries.front().is_some_and(|head| pred(head)) {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Drop all entries; used on runout and on explicit reset/disable.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest-first; used by tests and diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}
