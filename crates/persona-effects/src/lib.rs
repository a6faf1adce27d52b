//! Persona Effects
//!
//! Production handlers for the effect traits declared in `persona-core`:
//!
//! - [`RealTimerHandler`]: wall-clock scheduling on the ambient tokio runtime
//! - [`TracingConsoleHandler`]: diagnostic channels forwarded to `tracing`
//!
//! Test doubles for the same traits live in `persona-testkit`.

pub mod console;
pub mod time;

pub use console::TracingConsoleHandler;
pub use time::RealTimerHandler;
