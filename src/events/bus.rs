//! # Broadcast bus for pipeline events.
//!
//! ```text
//!   Annotator ───────┐
//!   Publisher ───────┼──► Bus ──► event listener ──► SubscriberSet
//!   subscriber workers┘
//! ```
//!
//! Publishing is fire-and-forget: the event lands in a shared ring buffer of
//! `capacity` slots and the caller moves on. Only the annotator's listener
//! reads from it; if that listener falls behind it skips the oldest events
//! (`RecvError::Lagged`) rather than slowing down publishing.
//!
//! Events sent while nobody is subscribed are discarded.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle for publishing [`Event`]s.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus holding at most `capacity` (min 1) undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Sends `ev` to every current receiver. Never blocks.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Returns a receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use tokio::sync::broadcast::error::RecvError;

    #[tokio::test]
    async fn subscriber_sees_events_in_publish_order() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();

        bus.publish(Event::new(EventKind::RunStarted));
        bus.publish(Event::new(EventKind::DrainCompleted));

        assert_eq!(rx.recv().await.map(|e| e.kind).ok(), Some(EventKind::RunStarted));
        assert_eq!(rx.recv().await.map(|e| e.kind).ok(), Some(EventKind::DrainCompleted));
    }

    #[tokio::test]
    async fn slow_receiver_skips_oldest() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..3 {
            bus.publish(Event::new(EventKind::AnnotationPublished));
        }
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn publish_without_receivers_is_a_noop() {
        Bus::new(0).publish(Event::new(EventKind::RunStarted));
    }
}
