//! Timer scheduling effect interface
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `persona-effects` (real clock), `persona-testkit` (virtual clock)
//! - **Usage**: Any code that defers work (timeouts, periodic polling, `now`)
//!
//! Code under test receives an `Arc<dyn TimerEffects>` instead of reaching for a
//! process-wide clock, so a test can swap the real scheduler for a virtual one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle returned by scheduling calls, used for cancellation.
pub type TimeoutHandle = Uuid;

/// Deferred work. Intervals invoke the same callback repeatedly, hence `FnMut`.
pub type TimerCallback = Box<dyn FnMut() + Send + 'static>;

/// Error type for timer operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    /// The handle is unknown, already fired, or already cleared.
    #[error("Timeout handle not found: {handle}")]
    TimeoutNotFound {
        /// Handle passed to `clear_timer`
        handle: TimeoutHandle,
    },
    /// No scheduler is available, e.g. no tokio runtime is running.
    #[error("Time service unavailable")]
    ServiceUnavailable,
    /// A drain or advance ran its limit of callbacks with work still pending.
    #[error("Ran {limit} timers and {remaining} are still pending; assuming runaway rescheduling")]
    TimerLimitExceeded {
        /// Configured timer limit
        limit: usize,
        /// Timers still pending when the limit was hit
        remaining: usize,
    },
}

/// Scheduling surface shared by the real and virtual clocks.
pub trait TimerEffects: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// Run `callback` once after `delay_ms`.
    fn set_timeout(
        &self,
        delay_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimeoutHandle, TimeError>;

    /// Run `callback` every `period_ms` until cleared.
    fn set_interval(
        &self,
        period_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimeoutHandle, TimeError>;

    /// Cancel a pending timeout or interval.
    fn clear_timer(&self, handle: TimeoutHandle) -> Result<(), TimeError>;

    /// Whether this scheduler runs on simulated time.
    fn is_simulated(&self) -> bool {
        false
    }
}

/// Blanket implementation for Arc<T> where T: TimerEffects
impl<T: TimerEffects + ?Sized> TimerEffects for std::sync::Arc<T> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn set_timeout(
        &self,
        delay_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimeoutHandle, TimeError> {
        (**self).set_timeout(delay_ms, callback)
    }

    fn set_interval(
        &self,
        period_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimeoutHandle, TimeError> {
        (**self).set_interval(period_ms, callback)
    }

    fn clear_timer(&self, handle: TimeoutHandle) -> Result<(), TimeError> {
        (**self).clear_timer(handle)
    }

    fn is_simulated(&self) -> bool {
        (**self).is_simulated()
    }
}
