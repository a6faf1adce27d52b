//! Process-wide registration point
//!
//! Code that needs to construct host-provided types reads them from a
//! [`Globals`] it was handed, rather than from hidden mutable statics. Each slot
//! is write-once: the first registration wins for the lifetime of the value.

use crate::events::{MouseEventConstructor, MouseEventInit, MouseEventLike};
use crate::{PersonaError, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Named constructor slots visible to code under test.
#[derive(Default)]
pub struct Globals {
    mouse_event: OnceCell<Arc<dyn MouseEventConstructor>>,
}

impl Globals {
    /// Name of the pointer event constructor slot.
    pub const MOUSE_EVENT: &'static str = "MouseEvent";

    /// Create globals with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the `"MouseEvent"` slot.
    ///
    /// Returns `true` if this call filled the slot. Later calls leave the
    /// existing constructor in place and return `false`.
    pub fn register_mouse_event(&self, constructor: Arc<dyn MouseEventConstructor>) -> bool {
        let mut filled = false;
        self.mouse_event.get_or_init(|| {
            filled = true;
            constructor
        });
        if !filled {
            tracing::debug!(
                slot = Self::MOUSE_EVENT,
                "slot already registered, keeping existing"
            );
        }
        filled
    }

    /// Whether the named slot has been populated.
    pub fn is_registered(&self, slot: &str) -> bool {
        match slot {
            Self::MOUSE_EVENT => self.mouse_event.get().is_some(),
            _ => false,
        }
    }

    /// The registered pointer event constructor.
    pub fn mouse_event(&self) -> Result<&dyn MouseEventConstructor> {
        self.mouse_event
            .get()
            .map(|constructor| constructor.as_ref())
            .ok_or_else(|| {
                PersonaError::not_found(format!("global `{}` is not registered", Self::MOUSE_EVENT))
            })
    }

    /// Shorthand for `mouse_event()?.construct(..)`.
    pub fn new_mouse_event(
        &self,
        event_type: &str,
        init: Option<&MouseEventInit>,
    ) -> Result<Box<dyn MouseEventLike>> {
        Ok(self.mouse_event()?.construct(event_type, init))
    }
}

impl std::fmt::Debug for Globals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Globals")
            .field(Self::MOUSE_EVENT, &self.is_registered(Self::MOUSE_EVENT))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventLike};

    #[derive(Debug)]
    struct FixedEvent {
        event: Event,
        tag: i32,
    }

    impl EventLike for FixedEvent {
        fn as_event(&self) -> &Event {
            &self.event
        }
    }

    impl MouseEventLike for FixedEvent {
        fn client_x(&self) -> i32 {
            self.tag
        }
        fn client_y(&self) -> i32 {
            self.tag
        }
        fn button(&self) -> i16 {
            0
        }
    }

    struct Fixed(i32);

    impl MouseEventConstructor for Fixed {
        fn construct(
            &self,
            event_type: &str,
            _init: Option<&MouseEventInit>,
        ) -> Box<dyn MouseEventLike> {
            Box::new(FixedEvent {
                event: Event::new(event_type, None),
                tag: self.0,
            })
        }
    }

    #[test]
    fn unregistered_slot_is_not_found() {
        let globals = Globals::new();
        assert!(!globals.is_registered(Globals::MOUSE_EVENT));
        assert!(matches!(
            globals.new_mouse_event("click", None),
            Err(PersonaError::NotFound { .. })
        ));
    }

    #[test]
    fn first_registration_wins() {
        let globals = Globals::new();
        assert!(globals.register_mouse_event(Arc::new(Fixed(1))));
        assert!(!globals.register_mouse_event(Arc::new(Fixed(2))));

        let event = globals.new_mouse_event("click", None).unwrap();
        assert_eq!(event.client_x(), 1);
        assert_eq!(event.event_type(), "click");
    }

    #[test]
    fn unknown_slot_names_are_never_registered() {
        let globals = Globals::new();
        globals.register_mouse_event(Arc::new(Fixed(1)));
        assert!(!globals.is_registered("PointerEvent"));
    }
}
