//! Real/virtual switch for the scheduler handed to code under test
//!
//! The controller is the `TimerEffects` that application code holds. In
//! [`ClockMode::Real`] it forwards to the real handler; between `install()` and
//! `uninstall()` every call lands on a fresh [`VirtualClock`] instead.

use super::virtual_clock::{VirtualClock, DEFAULT_TIMER_LIMIT};
use parking_lot::Mutex;
use persona_core::effects::{TimeError, TimeoutHandle, TimerCallback, TimerEffects};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

/// Which scheduler is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Scheduling goes to the real handler.
    Real,
    /// Scheduling goes to the installed virtual clock.
    Virtual,
}

/// Switches scheduling between the real clock and a per-test virtual clock.
pub struct ClockController {
    real: Arc<dyn TimerEffects>,
    active: Mutex<Option<VirtualClock>>,
    start_time_ms: u64,
    timer_limit: usize,
}

impl ClockController {
    /// Create a controller over `real`; virtual clocks start at `start_time_ms`.
    pub fn new(real: Arc<dyn TimerEffects>, start_time_ms: u64) -> Self {
        Self {
            real,
            active: Mutex::new(None),
            start_time_ms,
            timer_limit: DEFAULT_TIMER_LIMIT,
        }
    }

    /// Bound on timers run by one `advance_by`/`run_all` of an installed clock.
    pub fn with_timer_limit(mut self, timer_limit: usize) -> Self {
        self.timer_limit = timer_limit;
        self
    }

    /// Which scheduler is active.
    pub fn mode(&self) -> ClockMode {
        if self.active.lock().is_some() {
            ClockMode::Virtual
        } else {
            ClockMode::Real
        }
    }

    /// The installed virtual clock, if any.
    pub fn virtual_clock(&self) -> Option<VirtualClock> {
        self.active.lock().clone()
    }

    /// Switch to virtual time.
    ///
    /// The returned guard flushes pending work and uninstalls when released or
    /// dropped. Installing twice is a harness bug.
    pub fn install(self: &Arc<Self>) -> VirtualTimeGuard {
        let clock = VirtualClock::new(self.start_time_ms).with_timer_limit(self.timer_limit);
        {
            let mut active = self.active.lock();
            if active.is_some() {
                tracing::error!("virtual clock installed twice; replacing the active clock");
                debug_assert!(false, "virtual clock installed twice");
            }
            if let Some(previous) = active.replace(clock.clone()) {
                previous.clear();
            }
        }
        tracing::debug!(
            start_time_ms = self.start_time_ms,
            "virtual clock installed"
        );
        VirtualTimeGuard {
            controller: Arc::clone(self),
            clock,
            released: false,
        }
    }

    /// Run the timers pending right now on the installed clock. No-op in real mode.
    pub fn flush_pending(&self) -> usize {
        self.virtual_clock()
            .map(|clock| clock.flush_pending())
            .unwrap_or(0)
    }

    /// Restore the real clock, discarding pending virtual work unrun.
    /// Returns how many timers were discarded.
    pub fn uninstall(&self) -> usize {
        let Some(clock) = self.active.lock().take() else {
            tracing::error!("virtual clock uninstalled while real time was active");
            debug_assert!(false, "virtual clock uninstalled twice");
            return 0;
        };
        let discarded = clock.clear();
        tracing::debug!(discarded, "virtual clock uninstalled");
        discarded
    }

    fn scheduler(&self) -> Arc<dyn TimerEffects> {
        match self.virtual_clock() {
            Some(clock) => Arc::new(clock),
            None => Arc::clone(&self.real),
        }
    }
}

impl TimerEffects for ClockController {
    fn now_ms(&self) -> u64 {
        match self.virtual_clock() {
            Some(clock) => clock.now_ms(),
            None => self.real.now_ms(),
        }
    }

    fn set_timeout(
        &self,
        delay_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimeoutHandle, TimeError> {
        self.scheduler().set_timeout(delay_ms, callback)
    }

    fn set_interval(
        &self,
        period_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimeoutHandle, TimeError> {
        self.scheduler().set_interval(period_ms, callback)
    }

    fn clear_timer(&self, handle: TimeoutHandle) -> Result<(), TimeError> {
        self.scheduler().clear_timer(handle)
    }

    fn is_simulated(&self) -> bool {
        self.mode() == ClockMode::Virtual
    }
}

impl std::fmt::Debug for ClockController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockController")
            .field("mode", &self.mode())
            .field("start_time_ms", &self.start_time_ms)
            .field("timer_limit", &self.timer_limit)
            .finish()
    }
}

/// Scoped virtual time. Teardown (flush, then uninstall) runs exactly once,
/// on [`release`](Self::release) or drop.
#[must_use = "dropping the guard immediately tears virtual time down"]
pub struct VirtualTimeGuard {
    controller: Arc<ClockController>,
    clock: VirtualClock,
    released: bool,
}

impl VirtualTimeGuard {
    /// The virtual clock this guard installed.
    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// Current virtual time.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Number of pending virtual timers.
    pub fn pending_count(&self) -> usize {
        self.clock.pending_count()
    }

    /// See [`VirtualClock::flush_pending`].
    pub fn flush_pending(&self) -> usize {
        self.clock.flush_pending()
    }

    /// See [`VirtualClock::advance_by`].
    pub fn advance_by(&self, ms: u64) -> Result<usize, TimeError> {
        self.clock.advance_by(ms)
    }

    /// See [`VirtualClock::run_all`].
    pub fn run_all(&self) -> Result<usize, TimeError> {
        self.clock.run_all()
    }

    /// Tear down now. A panic from a timer callback during the final flush is
    /// returned instead of raised, after the real clock has been restored.
    pub fn release(mut self) -> thread::Result<usize> {
        self.teardown()
    }

    fn teardown(&mut self) -> thread::Result<usize> {
        if self.released {
            return Ok(0);
        }
        self.released = true;

        let clock = self.clock.clone();
        let flushed = panic::catch_unwind(AssertUnwindSafe(move || clock.flush_pending()));
        let still_active = self
            .controller
            .virtual_clock()
            .is_some_and(|active| active.ptr_eq(&self.clock));
        if still_active {
            self.controller.uninstall();
        } else {
            self.clock.clear();
        }
        if let Ok(count) = &flushed {
            tracing::debug!(flushed = count, "virtual time released");
        }
        flushed
    }
}

impl Drop for VirtualTimeGuard {
    fn drop(&mut self) {
        if let Err(payload) = self.teardown() {
            resume_unless_panicking(payload);
        }
    }
}

/// Re-raise a teardown panic, unless a test panic is already unwinding.
fn resume_unless_panicking(payload: Box<dyn Any + Send>) {
    if thread::panicking() {
        tracing::warn!("timer callback panicked during teardown; keeping the original panic");
    } else {
        panic::resume_unwind(payload);
    }
}
