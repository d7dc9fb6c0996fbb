//! # Fan-out of pipeline events to subscribers.
//!
//! Every subscriber owns a bounded mailbox and a worker task draining it, so
//! one slow or broken subscriber cannot hold up the others or the event
//! listener feeding them.
//!
//! ```text
//! emit(ev) ─┬─► mailbox(LogWriter) ─► worker ─► on_event()
//!           └─► mailbox(custom)    ─► worker ─► on_event() ─► panic? ─► SubscriberPanicked
//! ```
//!
//! - `emit` uses `try_send`; a full or closed mailbox drops the event for
//!   that subscriber and reports `SubscriberOverflow` on the bus.
//! - Each worker handles its events one at a time, in emit order.
//! - [`SubscriberSet::shutdown`] closes the mailboxes and waits for the
//!   workers to finish their backlog.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct Mailbox {
    owner: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Subscribers of one annotator, each behind its own worker.
pub struct SubscriberSet {
    mailboxes: Vec<Mailbox>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (mailboxes, workers) = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let mailbox = Mailbox {
                    owner: sub.name(),
                    tx,
                };
                (mailbox, tokio::spawn(deliver(sub, rx, bus.clone())))
            })
            .unzip();
        Self {
            mailboxes,
            workers,
            bus,
        }
    }

    /// Returns `true` when no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }

    /// Queues `event` for every subscriber without waiting.
    ///
    /// Overflow of an overflow event is not reported again.
    pub fn emit(&self, event: Event) {
        let report_overflow = !event.is_subscriber_overflow();
        let event = Arc::new(event);

        for mailbox in &self.mailboxes {
            let reason = match mailbox.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if report_overflow {
                self.bus.publish(Event::subscriber_overflow(mailbox.owner, reason));
            }
        }
    }

    /// Closes every mailbox and waits until the workers have drained them.
    pub async fn shutdown(self) {
        drop(self.mailboxes);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

async fn deliver(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let handled = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
        if let Err(payload) = handled {
            bus.publish(Event::subscriber_panicked(sub.name(), panic_message(&*payload)));
        }
    }
}
