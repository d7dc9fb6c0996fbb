//! # Observing the annotation pipeline.
//!
//! Implement [`Subscribe`] to react to pipeline events: publish results,
//! dropped failures, interrupts and drain completion. Register it with
//! [`AnnotatorBuilder::with_subscribers`](crate::AnnotatorBuilder::with_subscribers).
//!
//! Subscribers run on their own worker task, behind a bounded mailbox sized
//! by [`Subscribe::queue_capacity`]. A panic inside `on_event` is caught and
//! turned into a `SubscriberPanicked` event; the worker keeps going.
//! Whatever is still queued at shutdown is delivered before `shutdown` returns.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use ci_annotator::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct RejectedCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for RejectedCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::PublishFailed {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "rejected-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of pipeline events.
///
/// `on_event` runs on a Tokio worker: keep it non-blocking and do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in emit order.
    async fn on_event(&self, event: &Event);

    /// Short name used in overflow and panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Mailbox size for this subscriber (min 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
