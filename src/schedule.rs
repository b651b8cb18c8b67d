use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// What a round timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Exposure over: show the response controls.
    Reveal,
    /// Exposure over with no hit: the mole escaped.
    MoleTimeout,
    /// First feedback phase over: hide the result.
    FeedbackClear,
    /// Second feedback phase over: open the next round.
    NextRound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub due_ms: u64,
    pub generation: u64,
    pub action: TimerAction,
    seq: u64,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due_ms
            .cmp(&other.due_ms)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending round timers. Each entry carries the generation it was scheduled
/// under; the owner compares it against its current generation when the entry
/// fires, so superseded timers are dropped instead of cancelled in place.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, generation: u64, action: TimerAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled {
            due_ms,
            generation,
            action,
            seq,
        }));
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(entry)| entry.due_ms)
    }

    /// Removes and returns the earliest entry if it is due at `now_ms`.
    /// Entries due at the same instant come out in scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Scheduled> {
        match self.queue.peek() {
            Some(Reverse(entry)) if entry.due_ms <= now_ms => {
                self.queue.pop().map(|Reverse(entry)| entry)
            }
            _ => None,
        }
    }
}
