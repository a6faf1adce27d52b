//! Virtual clock with explicit flush/advance control
//!
//! Pending work is a queue ordered by `(due time, scheduling sequence)`, so equal
//! due times run FIFO. Nothing runs unless a test calls one of:
//!
//! - [`VirtualClock::flush_pending`]: one generation, exactly what was pending
//!   when the flush began
//! - [`VirtualClock::advance_by`]: everything falling due inside a window,
//!   including work scheduled while advancing
//! - [`VirtualClock::run_all`]: until the queue is empty, bounded by the timer limit
//!
//! No lock is held while a callback runs, so callbacks may freely schedule or
//! cancel through the same clock. Driving the clock from inside a callback is
//! not supported: a nested flush, advance or drain does nothing and leaves new
//! work pending for the outer caller's next generation.

use parking_lot::Mutex;
use persona_core::effects::{TimeError, TimeoutHandle, TimerCallback, TimerEffects};
use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

/// Default bound on timers run by a single `advance_by`/`run_all`.
pub const DEFAULT_TIMER_LIMIT: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TimerKey {
    due_ms: u64,
    seq: u64,
}

struct PendingTimer {
    id: TimeoutHandle,
    callback: TimerCallback,
    interval_ms: Option<u64>,
}

#[derive(Debug)]
struct RunningTimer {
    id: TimeoutHandle,
    cancelled: bool,
}

#[derive(Default)]
struct ClockState {
    now_ms: u64,
    next_seq: u64,
    queue: BTreeMap<TimerKey, PendingTimer>,
    keys: HashMap<TimeoutHandle, TimerKey>,
    running: Vec<RunningTimer>,
    driving: bool,
}

impl ClockState {
    fn enqueue(
        &mut self,
        id: TimeoutHandle,
        due_ms: u64,
        callback: TimerCallback,
        interval_ms: Option<u64>,
    ) {
        let key = TimerKey {
            due_ms,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert(
            key,
            PendingTimer {
                id,
                callback,
                interval_ms,
            },
        );
        self.keys.insert(id, key);
    }

    fn first_due(&self) -> Option<TimerKey> {
        self.queue.keys().next().copied()
    }
}

/// Clears the driving flag when a flush, advance or drain ends, unwinding included.
struct Driving<'a> {
    state: &'a Mutex<ClockState>,
}

impl Drop for Driving<'_> {
    fn drop(&mut self) {
        self.state.lock().driving = false;
    }
}

/// Deterministic scheduler driven only by explicit calls.
#[derive(Clone)]
pub struct VirtualClock {
    state: Arc<Mutex<ClockState>>,
    timer_limit: usize,
}

impl VirtualClock {
    /// Create a clock reading `start_ms` with no pending work.
    pub fn new(start_ms: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState {
                now_ms: start_ms,
                ..ClockState::default()
            })),
            timer_limit: DEFAULT_TIMER_LIMIT,
        }
    }

    /// Bound on timers run by one `advance_by` or `run_all`.
    pub fn with_timer_limit(mut self, timer_limit: usize) -> Self {
        self.timer_limit = timer_limit;
        self
    }

    /// Whether both handles drive the same pending set.
    pub fn ptr_eq(&self, other: &VirtualClock) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// The configured timer limit.
    pub fn timer_limit(&self) -> usize {
        self.timer_limit
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.state.lock().now_ms
    }

    /// Move the clock reading without firing anything.
    pub fn set_system_time(&self, now_ms: u64) {
        self.state.lock().now_ms = now_ms;
    }

    /// Number of timers waiting to run.
    pub fn pending_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Whether nothing is pending.
    pub fn is_idle(&self) -> bool {
        self.state.lock().queue.is_empty()
    }

    /// Due time of the earliest pending timer.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.state.lock().first_due().map(|key| key.due_ms)
    }

    fn schedule(
        &self,
        delay_ms: u64,
        callback: TimerCallback,
        interval_ms: Option<u64>,
    ) -> TimeoutHandle {
        let id = Uuid::new_v4();
        let mut state = self.state.lock();
        let due_ms = state.now_ms.saturating_add(delay_ms);
        state.enqueue(id, due_ms, callback, interval_ms);
        tracing::trace!(timer = %id, due_ms, ?interval_ms, "virtual timer scheduled");
        id
    }

    /// Remove a pending timer. An interval cancelled from inside its own
    /// callback is not re-armed.
    pub fn cancel(&self, handle: TimeoutHandle) -> bool {
        let mut state = self.state.lock();
        if let Some(key) = state.keys.remove(&handle) {
            state.queue.remove(&key);
            return true;
        }
        match state
            .running
            .iter_mut()
            .rev()
            .find(|running| running.id == handle)
        {
            Some(running) if !running.cancelled => {
                running.cancelled = true;
                true
            }
            _ => false,
        }
    }

    fn begin_driving(&self, operation: &'static str) -> Option<Driving<'_>> {
        let mut state = self.state.lock();
        if state.driving {
            tracing::warn!(
                operation,
                "virtual clock driven from a timer callback; ignored"
            );
            return None;
        }
        state.driving = true;
        Some(Driving { state: &self.state })
    }

    /// Run the timer at `key` if it is still pending. Returns whether it ran.
    ///
    /// A panicking callback is unregistered before the panic resumes; an
    /// interval that panics is not re-armed.
    fn fire(&self, key: TimerKey) -> bool {
        let timer = {
            let mut state = self.state.lock();
            let Some(timer) = state.queue.remove(&key) else {
                return false;
            };
            state.keys.remove(&timer.id);
            state.now_ms = state.now_ms.max(key.due_ms);
            state.running.push(RunningTimer {
                id: timer.id,
                cancelled: false,
            });
            timer
        };

        let PendingTimer {
            id,
            mut callback,
            interval_ms,
        } = timer;
        tracing::trace!(timer = %id, due_ms = key.due_ms, "firing virtual timer");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback()));

        let mut state = self.state.lock();
        let index = state.running.iter().rposition(|running| running.id == id);
        let cancelled = index.is_some_and(|at| state.running.remove(at).cancelled);
        if let Err(payload) = outcome {
            drop(state);
            drop(callback);
            panic::resume_unwind(payload);
        }
        if let Some(period) = interval_ms {
            if !cancelled {
                let due_ms = key.due_ms.saturating_add(period);
                state.enqueue(id, due_ms, callback, interval_ms);
            }
        }
        true
    }

    /// Run exactly the timers pending right now, earliest due first.
    ///
    /// Work scheduled by those callbacks, interval re-arms included, stays
    /// pending for a later flush. A timer cancelled by an earlier callback in
    /// the same flush does not run. Returns the number of callbacks run, or 0
    /// when called from inside a callback.
    pub fn flush_pending(&self) -> usize {
        let Some(_driving) = self.begin_driving("flush_pending") else {
            return 0;
        };
        let generation: Vec<TimerKey> = self.state.lock().queue.keys().copied().collect();
        tracing::debug!(
            pending = generation.len(),
            "flushing pending virtual timers"
        );

        let mut fired = 0;
        for key in generation {
            if self.fire(key) {
                fired += 1;
            }
        }
        fired
    }

    /// Advance virtual time by `ms`, running every timer that falls due on the way.
    ///
    /// Called from inside a callback, time does not move and `Ok(0)` is returned.
    pub fn advance_by(&self, ms: u64) -> Result<usize, TimeError> {
        let Some(_driving) = self.begin_driving("advance_by") else {
            return Ok(0);
        };
        let target = self.now_ms().saturating_add(ms);
        let fired = self.run_while(|key| key.due_ms <= target)?;

        let mut state = self.state.lock();
        state.now_ms = state.now_ms.max(target);
        tracing::debug!(fired, now_ms = state.now_ms, "advanced virtual time");
        Ok(fired)
    }

    /// Run timers until none are pending.
    pub fn run_all(&self) -> Result<usize, TimeError> {
        let Some(_driving) = self.begin_driving("run_all") else {
            return Ok(0);
        };
        let fired = self.run_while(|_| true)?;
        tracing::debug!(fired, "ran all virtual timers");
        Ok(fired)
    }

    fn run_while(&self, mut eligible: impl FnMut(TimerKey) -> bool) -> Result<usize, TimeError> {
        let mut fired = 0;
        loop {
            let next = self.state.lock().first_due().filter(|key| eligible(*key));
            let Some(key) = next else {
                return Ok(fired);
            };
            if fired >= self.timer_limit {
                return Err(TimeError::TimerLimitExceeded {
                    limit: self.timer_limit,
                    remaining: self.pending_count(),
                });
            }
            if self.fire(key) {
                fired += 1;
            }
        }
    }

    /// Drop all pending work without running it. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let dropped = {
            let mut state = self.state.lock();
            state.keys.clear();
            state.running.clear();
            std::mem::take(&mut state.queue)
        };
        // Callbacks are dropped outside the lock; their captures may reach back here.
        let count = dropped.len();
        drop(dropped);
        count
    }
}

impl TimerEffects for VirtualClock {
    fn now_ms(&self) -> u64 {
        VirtualClock::now_ms(self)
    }

    fn set_timeout(
        &self,
        delay_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimeoutHandle, TimeError> {
        Ok(self.schedule(delay_ms, callback, None))
    }

    fn set_interval(
        &self,
        period_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimeoutHandle, TimeError> {
        // Same floor as real intervals: a zero period would never let time move.
        let period_ms = period_ms.max(1);
        Ok(self.schedule(period_ms, callback, Some(period_ms)))
    }

    fn clear_timer(&self, handle: TimeoutHandle) -> Result<(), TimeError> {
        if self.cancel(handle) {
            Ok(())
        } else {
            Err(TimeError::TimeoutNotFound { handle })
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VirtualClock")
            .field("now_ms", &state.now_ms)
            .field("pending", &state.queue.len())
            .field("timer_limit", &self.timer_limit)
            .finish()
    }
}
