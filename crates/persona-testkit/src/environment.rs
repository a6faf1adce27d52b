//! Process-wide test environment
//!
//! Built lazily on first access and never torn down. It owns the [`Globals`]
//! that code under test reads host constructors from, with the synthetic
//! pointer event already registered.

use crate::events::install_synthetic_events;
use once_cell::sync::Lazy;
use persona_core::Globals;

static ENVIRONMENT: Lazy<TestEnvironment> = Lazy::new(TestEnvironment::bootstrap);

/// One-time process setup shared by every test.
#[derive(Debug)]
pub struct TestEnvironment {
    globals: Globals,
}

impl TestEnvironment {
    /// The process environment, initialized on first call.
    pub fn global() -> &'static TestEnvironment {
        &ENVIRONMENT
    }

    /// Globals with `"MouseEvent"` registered.
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    fn bootstrap() -> Self {
        let globals = Globals::new();
        install_synthetic_events(&globals);
        tracing::debug!("test environment initialized");
        Self { globals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_core::EventLike;

    #[test]
    fn global_environment_is_shared_and_registered() {
        let first = TestEnvironment::global();
        let second = TestEnvironment::global();
        assert!(std::ptr::eq(first, second));
        assert!(first.globals().is_registered(Globals::MOUSE_EVENT));
    }

    #[test]
    fn reinstalling_into_global_is_a_no_op() {
        let globals = TestEnvironment::global().globals();
        assert!(!install_synthetic_events(globals));
        let event = globals.new_mouse_event("click", None).unwrap();
        assert_eq!(event.event_type(), "click");
    }
}
