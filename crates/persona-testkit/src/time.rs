//! Time control for deterministic testing
//!
//! [`ClockController`] is the scheduler handed to code under test. Installing it
//! swaps in a fresh [`VirtualClock`] for one test; the returned
//! [`VirtualTimeGuard`] flushes the pending generation and restores real time
//! when it goes out of scope.

mod controller;
mod virtual_clock;

pub use controller::{ClockController, ClockMode, VirtualTimeGuard};
pub use virtual_clock::{VirtualClock, DEFAULT_TIMER_LIMIT};
