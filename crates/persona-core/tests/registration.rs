//! Concurrent registration into a shared `Globals`

use persona_core::{
    Event, EventLike, Globals, MouseEventConstructor, MouseEventInit, MouseEventLike,
};
use std::sync::{Arc, Barrier};
use std::thread;

#[derive(Debug)]
struct Tagged {
    event: Event,
    tag: i16,
}

impl EventLike for Tagged {
    fn as_event(&self) -> &Event {
        &self.event
    }

    fn as_mouse_event(&self) -> Option<&dyn MouseEventLike> {
        Some(self)
    }
}

impl MouseEventLike for Tagged {
    fn client_x(&self) -> i32 {
        0
    }

    fn client_y(&self) -> i32 {
        0
    }

    fn button(&self) -> i16 {
        self.tag
    }
}

struct TaggedConstructor(i16);

impl MouseEventConstructor for TaggedConstructor {
    fn construct(
        &self,
        event_type: &str,
        init: Option<&MouseEventInit>,
    ) -> Box<dyn MouseEventLike> {
        Box::new(Tagged {
            event: Event::new(event_type, init.map(|init| &init.event)),
            tag: self.0,
        })
    }
}

#[test]
fn racing_registrations_fill_the_slot_once() {
    let globals = Arc::new(Globals::new());
    let barrier = Arc::new(Barrier::new(8));

    let workers: Vec<_> = (0..8i16)
        .map(|tag| {
            let globals = Arc::clone(&globals);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                globals
                    .register_mouse_event(Arc::new(TaggedConstructor(tag)))
                    .then_some(tag)
            })
        })
        .collect();

    let winners: Vec<i16> = workers
        .into_iter()
        .filter_map(|worker| worker.join().unwrap())
        .collect();
    assert_eq!(winners.len(), 1);

    // Every later construction goes through the winning constructor.
    for _ in 0..3 {
        let event = globals.new_mouse_event("click", None).unwrap();
        assert_eq!(event.button(), winners[0]);
    }
}

#[test]
fn constructed_events_dispatch_as_base_events() {
    let globals = Globals::new();
    assert!(globals.register_mouse_event(Arc::new(TaggedConstructor(4))));

    let init = MouseEventInit::new().cancelable(true);
    let event = globals.new_mouse_event("contextmenu", Some(&init)).unwrap();
    let base: &dyn EventLike = event.as_ref();

    assert_eq!(base.event_type(), "contextmenu");
    assert!(base.cancelable());
    assert_eq!(base.as_mouse_event().map(|mouse| mouse.button()), Some(4));
}
