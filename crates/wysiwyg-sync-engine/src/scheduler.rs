//! Deterministic timers on a virtual clock.
//!
//! Nothing runs on its own: the host moves the clock with
//! [`Scheduler::pop_due`] (normally via the session's `advance`) and every
//! task whose due time has been reached comes out in due order. A zero
//! delay is a "next tick" task.

use std::time::Duration;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deferred work a session schedules for itself.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Task {
    /// Debounce expiry of the change detector.
    ValueChangedFlush,
    /// Second half of a fallback paste.
    PasteMerge,
    /// Throttled selection check.
    SelectionCheck,
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    due: Duration,
    task: Task,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Run `task` once `delay` has passed.
    pub fn schedule(&mut self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            due: self.now + delay,
            task,
        });
        id
    }

    /// Run `task` on the next tick.
    pub fn defer(&mut self, task: Task) -> TimerId {
        self.schedule(Duration::ZERO, task)
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|timer| timer.id != id);
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    pub fn has_pending(&self) -> bool {
        !self.timers.is_empty()
    }

    /// Remove and return the earliest task due at or before `until`,
    /// moving the clock to its due time. Ties run in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, Task)> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= until)
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(index, _)| index)?;
        let timer = self.timers.remove(index);
        self.now = self.now.max(timer.due);
        Some((timer.id, timer.task))
    }

    /// Move the clock forward without running anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}
