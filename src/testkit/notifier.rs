//! Notifier that records events for assertions.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::service::{Event, Notifier};

/// Keeps every event it is handed. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Rendered message text, in delivery order.
    pub fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }
}
