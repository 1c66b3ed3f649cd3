//! The engine-facing slice of UI events.

use std::cell::Cell;

use crate::value::Value;

/// What a synthesized handler sees of the triggering event: an optional
/// payload (an input's current text, a checkbox state, a picked item) and
/// the flags the handler may raise back at the host.
///
/// The flags use interior mutability so that a handler can raise them
/// through the shared reference it is invoked with; the host reads them
/// after dispatch and performs the actual default-suppression and blur.
#[derive(Debug, Default)]
pub struct Event {
    value: Option<Value>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
    blur_requested: Cell<bool>,
}

impl Event {
    /// An event with no payload (clicks, submits).
    pub fn new() -> Event {
        Event::default()
    }

    /// An event carrying a payload (input changes).
    pub fn with_value(value: impl Into<Value>) -> Event {
        Event {
            value: Some(value.into()),
            ..Event::default()
        }
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Suppresses the default action, stops propagation and asks the host
    /// to drop focus from the event's target.
    pub fn prevent_default_and_blur(&self) {
        self.default_prevented.set(true);
        self.propagation_stopped.set(true);
        self.blur_requested.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn blur_requested(&self) -> bool {
        self.blur_requested.get()
    }
}
