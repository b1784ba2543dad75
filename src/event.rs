//! Event queue and simulation clock.
//!
//! The queue orders pending actions by due time. Events due at the same
//! time are dispatched in insertion order, which keeps a run reproducible
//! given the same seed and the same sequence of insertions.

use crate::ids::{BuffId, SpellId};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Actions the engine schedules for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Re-evaluate the rotation and cast whatever is available.
    PlayerAction,
    /// A spell with a cast time finishes casting.
    CastComplete(SpellId),
    /// A periodic effect owned by the spell deals its next tick.
    PeriodicTick(SpellId),
    /// A buff may have run out.
    BuffExpiry(BuffId),
    /// Resource pools regenerate.
    ResourceTick,
}

/// A scheduled action.
#[derive(Debug, Clone)]
pub struct Event<A> {
    /// Simulation time at which the action is due.
    pub due_time: f64,
    seq: u64,
    /// The scheduled payload.
    pub action: A,
}

impl<A> PartialEq for Event<A> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<A> Eq for Event<A> {}

impl<A> PartialOrd for Event<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Event<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse so the earliest (then oldest) pops first.
        self.due_time
            .total_cmp(&other.due_time)
            .then(self.seq.cmp(&other.seq))
            .reverse()
    }
}

/// Priority queue of pending events plus the simulation clock.
///
/// # Examples
///
/// ```rust
/// use combatsim::EventQueue;
///
/// let mut queue = EventQueue::new();
/// queue.add_event("late", 5.0);
/// queue.add_event("early", 3.0);
/// queue.add_event("early again", 3.0);
///
/// assert_eq!(queue.pop_next().unwrap().action, "early");
/// assert_eq!(queue.pop_next().unwrap().action, "early again");
/// assert_eq!(queue.current_time(), 3.0);
/// assert_eq!(queue.pop_next().unwrap().action, "late");
/// assert!(queue.pop_next().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct EventQueue<A> {
    heap: BinaryHeap<Event<A>>,
    next_seq: u64,
    current_time: f64,
}

impl<A> EventQueue<A> {
    /// Create an empty queue with the clock at zero.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
            current_time: 0.0,
        }
    }

    /// Schedule `action` at `due_time`.
    ///
    /// Scheduling into the past is a caller defect and trips a debug
    /// assertion; release builds dispatch it at its stated time.
    pub fn add_event(&mut self, action: A, due_time: f64) {
        debug_assert!(
            due_time >= self.current_time,
            "event scheduled at {} but the clock is already at {}",
            due_time,
            self.current_time
        );

        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Event {
            due_time,
            seq,
            action,
        });
    }

    /// Remove and return the earliest event, advancing the clock to it.
    pub fn pop_next(&mut self) -> Option<Event<A>> {
        let event = self.heap.pop()?;
        self.current_time = event.due_time;
        Some(event)
    }

    /// Time of the most recently popped event.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Due time of the next event without popping it.
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|event| event.due_time)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Purge pending events whose action does not satisfy `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&A) -> bool) {
        self.heap.retain(|event| keep(&event.action));
    }

    /// Drop all pending events and rewind the clock to zero.
    ///
    /// The sequence counter keeps counting so ordering stays total across
    /// iterations.
    pub fn reset(&mut self) {
        self.heap.clear();
        self.current_time = 0.0;
    }
}

impl<A> Default for EventQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}
