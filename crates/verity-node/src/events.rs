//! Event broadcasting.
//!
//! The engine reports committed operations to the [`EventBus`]; the RPC loop
//! subscribes and forwards each one to the client as a JSON-RPC
//! notification. Subscribers that fall more than the buffer capacity behind
//! lose the oldest events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use verity_judge::EventSink;
use verity_types::events::Event;

/// A judge event stamped for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Position in the node's event stream, starting at 1.
    pub seq: u64,
    /// Unix timestamp at emission.
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: Event,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        tracing::debug!(seq, event = event.name(), "event emitted");
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(Notification {
            seq,
            timestamp,
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use verity_types::GameTypeId;

    use super::*;

    fn sample() -> Event {
        Event::JudgingComplete {
            game_type: GameTypeId::from("NEO-USD"),
            bucket_ts: 1480,
            n_correct: 2,
            leader: 100,
            total_bounty: 5,
        }
    }

    #[test]
    fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(sample());

        let notification = rx.try_recv().expect("receive event");
        assert_eq!(notification.seq, 1);
        assert_eq!(notification.event, sample());
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        bus.emit(sample());
        bus.emit(sample());
        assert_eq!(bus.sequence(), 2);
    }

    #[test]
    fn test_notification_flattens_event() {
        let notification = Notification {
            seq: 7,
            timestamp: 1500,
            event: sample(),
        };
        let json = serde_json::to_value(&notification).expect("serialize");
        assert_eq!(json["seq"], 7);
        assert_eq!(json["event_type"], "judging_complete");
        assert_eq!(json["bucket_ts"], 1480);
    }
}
