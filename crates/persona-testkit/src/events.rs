//! Synthetic pointer events
//!
//! The test host has no native pointer event type, so this module provides one
//! and registers it in the `"MouseEvent"` slot of [`Globals`]. Construction
//! never fails: absent pointer fields default to `0` and supplied values are
//! taken as-is.

use persona_core::events::{Event, EventLike, MouseEventConstructor, MouseEventInit, MouseEventLike};
use persona_core::Globals;
use std::sync::Arc;

/// Stand-in for a host pointer event.
#[derive(Debug, Clone)]
pub struct SyntheticMouseEvent {
    event: Event,
    client_x: i32,
    client_y: i32,
    button: i16,
}

impl SyntheticMouseEvent {
    /// Create a pointer event. Absent pointer fields default to 0.
    pub fn new(event_type: &str, init: Option<&MouseEventInit>) -> Self {
        let init = init.copied().unwrap_or_default();
        Self {
            event: Event::new(event_type, Some(&init.event)),
            client_x: init.client_x.unwrap_or(0),
            client_y: init.client_y.unwrap_or(0),
            button: init.button.unwrap_or(0),
        }
    }
}

impl EventLike for SyntheticMouseEvent {
    fn as_event(&self) -> &Event {
        &self.event
    }

    fn as_mouse_event(&self) -> Option<&dyn MouseEventLike> {
        Some(self)
    }
}

impl MouseEventLike for SyntheticMouseEvent {
    fn client_x(&self) -> i32 {
        self.client_x
    }

    fn client_y(&self) -> i32 {
        self.client_y
    }

    fn button(&self) -> i16 {
        self.button
    }
}

/// Constructor registered under [`Globals::MOUSE_EVENT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticEventFactory;

impl MouseEventConstructor for SyntheticEventFactory {
    fn construct(
        &self,
        event_type: &str,
        init: Option<&MouseEventInit>,
    ) -> Box<dyn MouseEventLike> {
        Box::new(SyntheticMouseEvent::new(event_type, init))
    }
}

/// Register the synthetic pointer event. Safe to call repeatedly; only the
/// first call on a given `Globals` has an effect.
pub fn install_synthetic_events(globals: &Globals) -> bool {
    let installed = globals.register_mouse_event(Arc::new(SyntheticEventFactory));
    if installed {
        tracing::debug!(
            slot = Globals::MOUSE_EVENT,
            "synthetic pointer events registered"
        );
    }
    installed
}
