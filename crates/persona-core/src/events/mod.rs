//! Minimal event model
//!
//! The generic [`Event`] carries a type tag and the three base flags; pointer
//! events layer `client_x`/`client_y`/`button` on top through [`MouseEventLike`].
//! There is no capture or bubble phase: [`EventTarget`] delivers an event to the
//! listeners registered for its type and nothing else.

mod target;

pub use target::{EventListener, EventTarget, ListenerId};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Options accepted by [`Event::new`]. Every flag defaults to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventInit {
    /// Whether the event propagates to ancestors.
    pub bubbles: bool,
    /// Whether `prevent_default` has an effect.
    pub cancelable: bool,
    /// Whether the event crosses shadow boundaries.
    pub composed: bool,
}

/// Generic event: a type tag plus base flags.
#[derive(Debug)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    cancelable: bool,
    composed: bool,
    time_stamp_ms: u64,
    default_prevented: AtomicBool,
}

impl Event {
    /// Create an event of the given type. The type string is kept verbatim.
    pub fn new(event_type: impl Into<String>, init: Option<&EventInit>) -> Self {
        let init = init.copied().unwrap_or_default();
        Self {
            event_type: event_type.into(),
            bubbles: init.bubbles,
            cancelable: init.cancelable,
            composed: init.composed,
            time_stamp_ms: 0,
            default_prevented: AtomicBool::new(false),
        }
    }

    /// Stamp the event with a creation time, typically read from a `TimerEffects`.
    pub fn with_time_stamp(mut self, time_stamp_ms: u64) -> Self {
        self.time_stamp_ms = time_stamp_ms;
        self
    }

    /// The type tag, exactly as constructed.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Whether the event propagates to ancestors.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether `prevent_default` has an effect.
    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// Whether the event crosses shadow boundaries.
    pub fn composed(&self) -> bool {
        self.composed
    }

    /// Creation time in milliseconds; 0 unless stamped.
    pub fn time_stamp_ms(&self) -> u64 {
        self.time_stamp_ms
    }

    /// Mark the event as handled. Ignored unless the event is cancelable.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.store(true, Ordering::Relaxed);
        }
    }

    /// Whether a listener cancelled the default action.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::Relaxed)
    }
}

impl Clone for Event {
    fn clone(&self) -> Self {
        Self {
            event_type: self.event_type.clone(),
            bubbles: self.bubbles,
            cancelable: self.cancelable,
            composed: self.composed,
            time_stamp_ms: self.time_stamp_ms,
            default_prevented: AtomicBool::new(self.default_prevented()),
        }
    }
}

/// Capability set of a generic event.
///
/// Anything that can hand out its base [`Event`] can be dispatched through an
/// [`EventTarget`]; the provided methods forward to that base.
pub trait EventLike: fmt::Debug + Send + Sync {
    /// The base event this value extends.
    fn as_event(&self) -> &Event;

    /// Downcast hook for listeners that need pointer fields.
    fn as_mouse_event(&self) -> Option<&dyn MouseEventLike> {
        None
    }

    /// The type tag, exactly as constructed.
    fn event_type(&self) -> &str {
        self.as_event().event_type()
    }

    /// Whether `prevent_default` has an effect.
    fn cancelable(&self) -> bool {
        self.as_event().cancelable()
    }

    /// Cancel the default action if the event is cancelable.
    fn prevent_default(&self) {
        self.as_event().prevent_default();
    }

    /// Whether a listener cancelled the default action.
    fn default_prevented(&self) -> bool {
        self.as_event().default_prevented()
    }
}

impl EventLike for Event {
    fn as_event(&self) -> &Event {
        self
    }
}

/// Pointer/mouse event fields on top of the generic capability set.
pub trait MouseEventLike: EventLike {
    /// Horizontal pointer position in viewport pixels.
    fn client_x(&self) -> i32;
    /// Vertical pointer position in viewport pixels.
    fn client_y(&self) -> i32;
    /// Which pointer button changed state (0 = primary).
    fn button(&self) -> i16;
}

/// Options accepted when constructing a pointer event.
///
/// Absent pointer fields fall back to `0` at construction time; values are
/// taken as-is otherwise, negative or out-of-range included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseEventInit {
    /// Horizontal pointer position; 0 when absent.
    pub client_x: Option<i32>,
    /// Vertical pointer position; 0 when absent.
    pub client_y: Option<i32>,
    /// Pointer button; 0 (primary) when absent.
    pub button: Option<i16>,
    /// Base event flags.
    pub event: EventInit,
}

impl MouseEventInit {
    /// Create options with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the horizontal pointer position.
    pub fn client_x(mut self, client_x: i32) -> Self {
        self.client_x = Some(client_x);
        self
    }

    /// Set the vertical pointer position.
    pub fn client_y(mut self, client_y: i32) -> Self {
        self.client_y = Some(client_y);
        self
    }

    /// Set the pointer button.
    pub fn button(mut self, button: i16) -> Self {
        self.button = Some(button);
        self
    }

    /// Set the base `bubbles` flag.
    pub fn bubbles(mut self, bubbles: bool) -> Self {
        self.event.bubbles = bubbles;
        self
    }

    /// Set the base `cancelable` flag.
    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.event.cancelable = cancelable;
        self
    }
}

/// Constructor stored in the `"MouseEvent"` slot of [`Globals`](crate::Globals).
pub trait MouseEventConstructor: Send + Sync {
    /// Build a pointer event of `event_type` from optional options.
    fn construct(
        &self,
        event_type: &str,
        init: Option<&MouseEventInit>,
    ) -> Box<dyn MouseEventLike>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_is_kept_verbatim() {
        let event = Event::new("  Click-Me ", None);
        assert_eq!(event.event_type(), "  Click-Me ");
        assert!(!event.bubbles());
        assert!(!event.cancelable());
        assert!(!event.composed());
        assert_eq!(event.time_stamp_ms(), 0);
    }

    #[test]
    fn prevent_default_requires_cancelable() {
        let plain = Event::new("click", None);
        plain.prevent_default();
        assert!(!plain.default_prevented());

        let cancelable = Event::new(
            "click",
            Some(&EventInit {
                cancelable: true,
                ..EventInit::default()
            }),
        );
        cancelable.prevent_default();
        assert!(cancelable.default_prevented());
        assert!(cancelable.clone().default_prevented());
    }

    #[test]
    fn mouse_init_builder_sets_only_named_fields() {
        let init = MouseEventInit::new().client_y(-4).cancelable(true);
        assert_eq!(init.client_x, None);
        assert_eq!(init.client_y, Some(-4));
        assert_eq!(init.button, None);
        assert!(init.event.cancelable);
        assert!(!init.event.bubbles);
    }
}
