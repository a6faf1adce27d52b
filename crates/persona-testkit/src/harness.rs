//! Per-test lifecycle
//!
//! A [`TestHarness`] owns the scheduler and console handed to code under test.
//! [`TestHarness::before_each`] installs virtual time and returns a
//! [`TestScope`]; dropping the scope is the after-each hook. It flushes the
//! pending timer generation, restores the real clock, then clears recorded
//! diagnostics, on success, failure, and panic alike.
//!
//! The scope mutably borrows its harness, so a second install cannot happen
//! while a test is still running.

use crate::config::HarnessConfig;
use crate::console::{InterceptingConsole, RecordedCallLog};
use crate::environment::TestEnvironment;
use crate::logging::init_test_tracing_with;
use crate::time::{ClockController, ClockMode, VirtualClock, VirtualTimeGuard};
use persona_core::effects::{ConsoleEffects, DiagnosticChannel, TimeError, TimerEffects};
use persona_core::events::{MouseEventInit, MouseEventLike};
use persona_core::{Globals, Result};
use persona_effects::{RealTimerHandler, TracingConsoleHandler};
use std::sync::Arc;

/// Scheduler, console and globals for one test thread.
pub struct TestHarness {
    clock: Arc<ClockController>,
    console: Arc<InterceptingConsole>,
    environment: &'static TestEnvironment,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Create a harness with the default configuration.
    pub fn new() -> Self {
        Self::with_config(HarnessConfig::default())
    }

    /// Harness backed by the production tokio timer and tracing console.
    pub fn with_config(config: HarnessConfig) -> Self {
        Self::with_handlers(
            &config,
            Arc::new(RealTimerHandler::new()),
            Arc::new(TracingConsoleHandler::new()),
        )
    }

    /// Harness over caller-supplied real handlers.
    pub fn with_handlers(
        config: &HarnessConfig,
        real_timers: Arc<dyn TimerEffects>,
        passthrough: Arc<dyn ConsoleEffects>,
    ) -> Self {
        init_test_tracing_with(&config.log_filter);
        let clock = ClockController::new(real_timers, config.start_time_ms)
            .with_timer_limit(config.timer_limit);
        let console =
            InterceptingConsole::new(passthrough, config.suppressed_channels.iter().copied());
        Self {
            clock: Arc::new(clock),
            console: Arc::new(console),
            environment: TestEnvironment::global(),
        }
    }

    /// The scheduler to hand to code under test.
    pub fn timers(&self) -> Arc<dyn TimerEffects> {
        self.clock.clone()
    }

    /// The console to hand to code under test.
    pub fn console(&self) -> Arc<dyn ConsoleEffects> {
        self.console.clone()
    }

    /// Process globals with the synthetic pointer event registered.
    pub fn globals(&self) -> &'static Globals {
        self.environment.globals()
    }

    /// Whether virtual time is currently installed.
    pub fn clock_mode(&self) -> ClockMode {
        self.clock.mode()
    }

    /// Recorded calls for a suppressed channel.
    pub fn recorded(&self, channel: DiagnosticChannel) -> Option<&RecordedCallLog> {
        self.console.log(channel)
    }

    /// Before-each hook: switch to virtual time for the duration of the scope.
    pub fn before_each(&mut self) -> TestScope<'_> {
        let clock = self.clock.install();
        TestScope {
            clock,
            reset: DiagnosticsReset { harness: self },
        }
    }

    /// Run `body` inside a scope. Whatever the body returns, error values
    /// included, comes back unchanged; a panic propagates after teardown.
    pub fn run<T>(&mut self, body: impl FnOnce(&TestScope<'_>) -> T) -> T {
        let scope = self.before_each();
        body(&scope)
    }
}

impl std::fmt::Debug for TestHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestHarness")
            .field("clock", &self.clock)
            .field("console", &self.console)
            .finish()
    }
}

/// One test's view of the harness. Dropping it runs the after-each hook.
#[must_use = "dropping the scope immediately runs teardown"]
pub struct TestScope<'a> {
    // Field order is teardown order: flush and uninstall, then clear logs.
    clock: VirtualTimeGuard,
    reset: DiagnosticsReset<'a>,
}

impl TestScope<'_> {
    fn harness(&self) -> &TestHarness {
        self.reset.harness
    }

    /// The scheduler, virtual for the life of the scope.
    pub fn timers(&self) -> Arc<dyn TimerEffects> {
        self.harness().timers()
    }

    /// The intercepting console.
    pub fn console(&self) -> Arc<dyn ConsoleEffects> {
        self.harness().console()
    }

    /// Process globals with the synthetic pointer event registered.
    pub fn globals(&self) -> &'static Globals {
        self.harness().globals()
    }

    /// Construct a pointer event through the registered `"MouseEvent"` slot.
    pub fn new_mouse_event(
        &self,
        event_type: &str,
        init: Option<&MouseEventInit>,
    ) -> Result<Box<dyn MouseEventLike>> {
        self.globals().new_mouse_event(event_type, init)
    }

    /// The virtual clock installed for this scope.
    pub fn clock(&self) -> &VirtualClock {
        self.clock.clock()
    }

    /// Current virtual time.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Move virtual time without firing anything.
    pub fn set_system_time(&self, now_ms: u64) {
        self.clock.clock().set_system_time(now_ms);
    }

    /// Number of pending virtual timers.
    pub fn pending_timers(&self) -> usize {
        self.clock.pending_count()
    }

    /// Run exactly the timers pending right now.
    pub fn flush_pending(&self) -> usize {
        self.clock.flush_pending()
    }

    /// Advance virtual time, running timers that fall due.
    pub fn advance_by(&self, ms: u64) -> std::result::Result<usize, TimeError> {
        self.clock.advance_by(ms)
    }

    /// Run timers until none are pending.
    pub fn run_all(&self) -> std::result::Result<usize, TimeError> {
        self.clock.run_all()
    }

    /// Recorded calls for a suppressed channel.
    pub fn recorded(&self, channel: DiagnosticChannel) -> Option<&RecordedCallLog> {
        self.harness().recorded(channel)
    }
}

/// Clears recorded diagnostics once the clock guard has been torn down.
struct DiagnosticsReset<'a> {
    harness: &'a TestHarness,
}

impl Drop for DiagnosticsReset<'_> {
    fn drop(&mut self) {
        self.harness.console.clear_all();
        tracing::debug!("recorded diagnostics cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_core::effects::{TimeoutHandle, TimerCallback};

    /// Real scheduler stand-in; the harness must never reach it while virtual.
    struct UnreachableReal;

    impl TimerEffects for UnreachableReal {
        fn now_ms(&self) -> u64 {
            0
        }

        fn set_timeout(
            &self,
            _: u64,
            _: TimerCallback,
        ) -> std::result::Result<TimeoutHandle, TimeError> {
            Err(TimeError::ServiceUnavailable)
        }

        fn set_interval(
            &self,
            _: u64,
            _: TimerCallback,
        ) -> std::result::Result<TimeoutHandle, TimeError> {
            Err(TimeError::ServiceUnavailable)
        }

        fn clear_timer(&self, handle: TimeoutHandle) -> std::result::Result<(), TimeError> {
            Err(TimeError::TimeoutNotFound { handle })
        }
    }

    fn harness() -> TestHarness {
        TestHarness::with_handlers(
            &HarnessConfig::default(),
            Arc::new(UnreachableReal),
            Arc::new(TracingConsoleHandler::new()),
        )
    }

    #[test]
    fn scope_installs_and_drop_restores() {
        let mut harness = harness();
        assert_eq!(harness.clock_mode(), ClockMode::Real);
        {
            let scope = harness.before_each();
            assert!(scope.timers().is_simulated());
            assert_eq!(scope.now_ms(), HarnessConfig::default().start_time_ms);
            scope.timers().set_timeout(10, Box::new(|| {})).unwrap();
            assert_eq!(scope.pending_timers(), 1);
        }
        assert_eq!(harness.clock_mode(), ClockMode::Real);
        let after_teardown = harness.timers().set_timeout(10, Box::new(|| {}));
        assert!(after_teardown.is_err());
    }

    #[test]
    fn run_returns_body_error_unchanged() {
        let mut harness = harness();
        let outcome: Result<()> =
            harness.run(|_| Err(persona_core::PersonaError::invalid("assertion")));
        assert_eq!(
            outcome,
            Err(persona_core::PersonaError::invalid("assertion"))
        );
        assert_eq!(harness.clock_mode(), ClockMode::Real);
    }

    #[test]
    fn recorded_logs_are_cleared_at_teardown() {
        let mut harness = harness();
        harness.run(|scope| {
            scope.console().error("noisy");
            let errors = scope.recorded(DiagnosticChannel::Error).unwrap();
            assert_eq!(errors.call_count(), 1);
        });
        assert!(!harness
            .recorded(DiagnosticChannel::Error)
            .unwrap()
            .was_called());
    }
}
