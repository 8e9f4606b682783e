//! Canned [`AccountEventStream`] for listener tests.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::domain::AccountEvent;
use crate::exchange::AccountEventStream;

/// Replays a fixed queue of events.
///
/// Once the queue is drained the stream either reports closure or, with
/// [`ScriptedEventStream::hold_open`], never yields again.
pub struct ScriptedEventStream {
    events: VecDeque<AccountEvent>,
    hold_open: bool,
}

impl ScriptedEventStream {
    pub fn new(events: Vec<AccountEvent>) -> Self {
        Self {
            events: events.into(),
            hold_open: false,
        }
    }

    /// Stay pending after the last event instead of closing.
    #[must_use]
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl AccountEventStream for ScriptedEventStream {
    async fn next_event(&mut self) -> Option<AccountEvent> {
        match self.events.pop_front() {
            Some(event) => Some(event),
            None if self.hold_open => std::future::pending().await,
            None => None,
        }
    }
}
