//! Priority event queue ordered by `(time, insertion sequence)`.
//!
//! Backed by a binary min-heap. Each insert is tagged with a monotonically
//! increasing sequence number, so two events at the same simulated time pop
//! in the order they were inserted. The queue also carries a causality
//! floor (the scheduler's current clock) and rejects inserts scheduled
//! strictly before it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use thiserror::Error;

use super::Event;
use crate::time::SimTime;

/// Event queue error conditions.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("event queue is empty")]
    Empty,

    #[error(
        "causality violation: module '{module}' scheduled '{kind}' at {scheduled}, \
         but the clock is already at {floor}"
    )]
    CausalityViolation {
        module: String,
        kind: String,
        scheduled: SimTime,
        floor: SimTime,
    },
}

struct QueuedEvent {
    seq: u64,
    event: Event,
}

impl QueuedEvent {
    #[inline]
    fn key(&self) -> (SimTime, u64) {
        (self.event.time(), self.seq)
    }
}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order: the earliest (time, seq) key has the highest priority.
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueuedEvent {}

/// Priority queue of pending [`Event`]s.
pub struct EventQueue {
    heap: BinaryHeap<QueuedEvent>,
    next_seq: u64,
    floor: SimTime,
}

impl EventQueue {
    /// Creates an empty queue with the causality floor at `floor`. Events
    /// scheduled before the floor are rejected.
    pub fn new(floor: SimTime) -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
            floor,
        }
    }

    /// Inserts an event, assigning it the next insertion sequence number.
    ///
    /// O(log n). Fails with [`QueueError::CausalityViolation`] if the event
    /// is scheduled strictly before the current floor.
    pub fn insert(&mut self, event: Event) -> Result<(), QueueError> {
        if event.time() < self.floor {
            return Err(QueueError::CausalityViolation {
                module: event.module().to_string(),
                kind: event.kind().to_string(),
                scheduled: event.time(),
                floor: self.floor,
            });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedEvent { seq, event });
        Ok(())
    }

    /// Removes and returns the event with the smallest `(time, seq)` key.
    ///
    /// O(log n). Fails with [`QueueError::Empty`] on an empty queue.
    pub fn pop_min(&mut self) -> Result<Event, QueueError> {
        self.heap
            .pop()
            .map(|queued| queued.event)
            .ok_or(QueueError::Empty)
    }

    /// The event `pop_min` would return, without removing it.
    pub fn peek_min(&self) -> Option<&Event> {
        self.heap.peek().map(|queued| &queued.event)
    }

    /// Raises the causality floor to `floor`. Called by the scheduler as the
    /// clock advances; a floor below the current one is ignored.
    pub fn raise_floor(&mut self, floor: SimTime) {
        if floor > self.floor {
            self.floor = floor;
        }
    }

    /// The current causality floor.
    pub fn floor(&self) -> SimTime {
        self.floor
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
