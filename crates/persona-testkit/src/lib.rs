//! Persona Testing Infrastructure
//!
//! Deterministic environment for unit-testing event-driven, time-dependent
//! code. Two things happen around every test:
//!
//! - once per process, a synthetic pointer event is registered in the shared
//!   [`Globals`](persona_core::Globals) ([`TestEnvironment`])
//! - per test, the scheduler switches to a [`VirtualClock`]; teardown flushes
//!   exactly the pending generation, restores real time and clears the
//!   recorded `error`/`warn` diagnostics ([`TestHarness`], [`TestScope`])
//!
//! # Usage
//!
//! Add this to your crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! persona-testkit = { path = "../persona-testkit" }
//! ```
//!
//! Then in your tests:
//! ```rust,no_run
//! use persona_testkit::*;
//!
//! #[test]
//! fn poller_retries() {
//!     let mut harness = TestHarness::new();
//!     harness.run(|scope| {
//!         let timers = scope.timers();
//!         timers.set_timeout(1_000, Box::new(|| {})).unwrap();
//!         scope.advance_by(1_000).unwrap();
//!     });
//! }
//! ```

pub mod config;
pub mod console;
pub mod environment;
pub mod events;
pub mod harness;
pub mod logging;
pub mod time;

pub use config::HarnessConfig;
pub use console::{InterceptingConsole, RecordedCallLog};
pub use environment::TestEnvironment;
pub use events::{install_synthetic_events, SyntheticEventFactory, SyntheticMouseEvent};
pub use harness::{TestHarness, TestScope};
pub use logging::{init_test_tracing, init_test_tracing_with};
pub use time::{ClockController, ClockMode, VirtualClock, VirtualTimeGuard};

// Re-export the traits test bodies call through
pub use persona_core::{
    ConsoleEffects, DiagnosticChannel, EventLike, EventTarget, MouseEventInit, MouseEventLike,
    TimeError, TimerEffects,
};
