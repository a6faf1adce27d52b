//! Effect traits
//!
//! Infrastructure effects that code under test depends on instead of ambient
//! process state. Real handlers live in `persona-effects`; controllable test
//! handlers live in `persona-testkit`.

pub mod console;
pub mod time;

pub use console::{ConsoleEffects, DiagnosticChannel};
pub use time::{TimeError, TimeoutHandle, TimerCallback, TimerEffects};
