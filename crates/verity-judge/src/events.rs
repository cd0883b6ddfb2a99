//! Event sink seam.

use std::sync::{Arc, Mutex};

use verity_types::events::Event;

/// Receives events for committed operations.
pub trait EventSink {
    /// Deliver one event.
    fn emit(&self, event: Event);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// Keeps every event in memory. Clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events emitted so far.
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, event: Event) {
        (**self).emit(event);
    }
}

#[cfg(test)]
mod tests {
    use verity_types::{AccountId, GameTypeId};

    use super::*;

    #[test]
    fn test_recording_sink_shares_buffer() {
        let sink = RecordingSink::new();
        let handle = sink.clone();
        sink.emit(Event::GameTypeCreated {
            game_type: GameTypeId::from("NEO-USD"),
            creator: AccountId([1; 20]),
            created_at: 1480,
        });
        assert_eq!(handle.events().len(), 1);
        assert_eq!(handle.events()[0].name(), "game_type_created");
    }
}
