//! Persona Core
//!
//! Foundation layer shared by application code and its test infrastructure:
//!
//! - [`effects`]: scheduling and diagnostic effect traits that code under test
//!   depends on instead of ambient process state
//! - [`events`]: the minimal generic/pointer event model and a flat dispatch target
//! - [`globals`]: the write-once registration point for host-provided constructors
//! - [`errors`]: the unified error type
//!
//! Real handlers live in `persona-effects`; controllable ones in `persona-testkit`.

pub mod effects;
pub mod errors;
pub mod events;
pub mod globals;

pub use effects::{
    ConsoleEffects, DiagnosticChannel, TimeError, TimeoutHandle, TimerCallback, TimerEffects,
};
pub use errors::{PersonaError, Result};
pub use events::{
    Event, EventInit, EventLike, EventListener, EventTarget, ListenerId, MouseEventConstructor,
    MouseEventInit, MouseEventLike,
};
pub use globals::Globals;
