//! # Publisher: the single background worker.
//!
//! Drains the event channel one message at a time, renders each failure and
//! hands it to the [`Sink`](crate::Sink). Exactly one publisher exists per
//! channel, which gives two guarantees:
//! - annotations are appended in the order failures were reported;
//! - the sink is never invoked concurrently.
//!
//! ## State machine
//! ```text
//!            ┌──────────── publish done (ok or error) ─────────────┐
//!            ▼                                                      │
//!   ┌──► Idle ── recv Failure ──► Publishing ── render + annotate ──┘
//!   │      │
//!   │      ├── recv Shutdown ─────► Drained       (terminal)
//!   │      └── channel closed ────► Disconnected  (terminal)
//!   │
//!   └── token cancelled (Idle or Publishing) ──► Interrupted (terminal)
//! ```
//!
//! ## Rules
//! - Sink errors (and sink panics) are published as `PublishFailed`, tagged
//!   with the sink's name; the loop continues.
//! - No retry and no re-queue: each failure gets one attempt.
//! - Cancellation aborts an in-flight publish; undrained failures are lost.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::select;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::CiContext;
use crate::core::queue::{Message, QueueRx};
use crate::error::{AnnotateError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::failures::FailureEvent;
use crate::render::render_failure;
use crate::sinks::{Annotation, SinkRef};

/// How the publisher stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainExit {
    /// The pipeline never ran (CI not detected) or was already shut down.
    #[default]
    Inactive,
    /// Every failure pushed before shutdown got its publish attempt.
    Drained,
    /// Interrupted before reaching the shutdown message.
    Interrupted,
    /// All producers vanished without sending the shutdown message.
    Disconnected,
}

/// Outcome of one publisher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Terminal state.
    pub exit: DrainExit,
    /// Annotations the sink accepted.
    pub published: u64,
    /// Publish attempts the sink rejected.
    pub failed: u64,
}

impl DrainReport {
    /// Total publish attempts.
    pub fn attempted(&self) -> u64 {
        self.published + self.failed
    }
}

/// Background worker state.
pub(crate) struct Publisher {
    sink: SinkRef,
    ci: CiContext,
    context: Arc<str>,
    bus: Bus,
}

impl Publisher {
    pub(crate) fn new(sink: SinkRef, ci: CiContext, context: Arc<str>, bus: Bus) -> Self {
        Self {
            sink,
            ci,
            context,
            bus,
        }
    }

    /// Runs until the shutdown message, channel closure, or cancellation.
    pub(crate) async fn run(self, mut rx: QueueRx, token: CancellationToken) -> DrainReport {
        let mut report = DrainReport::default();

        let exit = loop {
            let msg = select! {
                biased;
                _ = token.cancelled() => break DrainExit::Interrupted,
                msg = rx.recv() => msg,
            };
            let failure = match msg {
                Some(Message::Failure(failure)) => failure,
                Some(Message::Shutdown) => break DrainExit::Drained,
                None => break DrainExit::Disconnected,
            };

            let published = select! {
                biased;
                _ = token.cancelled() => break DrainExit::Interrupted,
                ok = self.publish(&failure) => ok,
            };
            if published {
                report.published += 1;
            } else {
                report.failed += 1;
            }
        };

        report.exit = exit;
        let kind = match exit {
            DrainExit::Interrupted => EventKind::Interrupted,
            _ => EventKind::DrainCompleted,
        };
        self.bus.publish(Event::new(kind).with_counts(&report));
        report
    }

    /// Renders and publishes one failure. Returns `true` if the sink accepted it.
    async fn publish(&self, failure: &FailureEvent) -> bool {
        let started = Instant::now();
        let body = render_failure(failure, &self.ci);
        let annotation = Annotation::failure(Arc::clone(&self.context), body.into_string());

        let result = match AssertUnwindSafe(self.sink.annotate(&annotation))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic_err) => Err(AnnotateError::Panicked {
                info: panic_message(&*panic_err),
            }),
        };

        let ev = match &result {
            Ok(()) => Event::new(EventKind::AnnotationPublished),
            Err(e) => Event::new(EventKind::PublishFailed)
                .with_reason(format!("{}: {}", self.sink.name(), e.as_message())),
        };
        self.bus.publish(
            ev.with_subject(failure.description())
                .with_elapsed(started.elapsed()),
        );
        result.is_ok()
    }
}
