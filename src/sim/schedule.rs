//! Deferred tasks on the simulation clock
//!
//! Tasks are plain values released by [`Scheduler::advance`] once their delay
//! has elapsed. Nothing runs on its own; the owner advances the scheduler
//! from its tick and handles whatever comes due.

/// Handle to a scheduled task, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// A task released by [`Scheduler::advance`]
#[derive(Debug, Clone, PartialEq)]
pub struct Due<T> {
    pub handle: TaskHandle,
    pub task: T,
    /// How far past its due time the clock had moved when released
    pub overshoot_secs: f32,
}

#[derive(Debug, Clone)]
struct Scheduled<T> {
    handle: TaskHandle,
    due_at: f64,
    task: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    /// Simulation seconds advanced so far
    now: f64,
    pending: Vec<Scheduled<T>>,
    next_handle: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            pending: Vec::new(),
            next_handle: 1,
        }
    }

    /// Schedule `task` to come due after `delay_secs`
    pub fn schedule(&mut self, delay_secs: f32, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(Scheduled {
            handle,
            due_at: self.now + f64::from(delay_secs.max(0.0)),
            task,
        });
        handle
    }

    /// Cancel a pending task; returns false if it already ran or was cancelled
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.handle != handle);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|s| s.handle == handle)
    }

    /// Seconds until `handle` comes due
    pub fn remaining(&self, handle: TaskHandle) -> Option<f32> {
        self.pending
            .iter()
            .find(|s| s.handle == handle)
            .map(|s| (s.due_at - self.now).max(0.0) as f32)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advance the clock and take every task now due, earliest first
    /// (ties in scheduling order)
    pub fn advance(&mut self, dt: f32) -> Vec<Due<T>> {
        self.now += f64::from(dt.max(0.0));
        let now = self.now;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|s| s.due_at <= now);
        self.pending = pending;

        due.sort_by(|a, b| {
            a.due_at
                .partial_cmp(&b.due_at)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.handle.0.cmp(&b.handle.0))
        });
        due.into_iter()
            .map(|s| Due {
                handle: s.handle,
                task: s.task,
                overshoot_secs: (now - s.due_at) as f32,
            })
            .collect()
    }
}
