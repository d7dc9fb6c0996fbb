//! # Diagnostic events emitted by the annotation pipeline.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries a timestamp, a
//! global sequence number and optional metadata. Events are observability
//! only: they never feed back into publishing.
//!
//! ## Ordering guarantees
//! Each event has a globally unique, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use ci_annotator::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::PublishFailed)
//!     .with_subject("adds numbers")
//!     .with_reason("buildkite-agent exited with status 1");
//!
//! assert_eq!(ev.kind, EventKind::PublishFailed);
//! assert_eq!(ev.subject.as_deref(), Some("adds numbers"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::DrainReport;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of pipeline events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Host notifications ===
    /// The host reported the start of the test run.
    ///
    /// Sets: `subject` (annotation context tag).
    RunStarted,

    /// A failure could not be queued and was dropped.
    ///
    /// Sets: `subject` (failure description), `reason` ("full" / "closed").
    FailureDropped,

    // === Publisher ===
    /// One annotation was appended successfully.
    ///
    /// Sets: `subject` (failure description), `elapsed_ms`.
    AnnotationPublished,

    /// The sink rejected one annotation; it will not be retried.
    ///
    /// Sets: `subject` (failure description), `reason` (error message), `elapsed_ms`.
    PublishFailed,

    /// The publisher stopped early on an interrupt; remaining failures are lost.
    ///
    /// Sets: `published`, `failed`.
    Interrupted,

    /// The publisher consumed everything up to the shutdown message.
    ///
    /// Sets: `published`, `failed`.
    DrainCompleted,

    // === Shutdown ===
    /// The drain did not finish within the configured grace period.
    ///
    /// Sets: `elapsed_ms` (grace).
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `subject` (subscriber name), `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `subject` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// Pipeline event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// What the event is about: failure description, subscriber name, context tag.
    pub subject: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Duration in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Annotations published so far.
    pub published: Option<u64>,
    /// Publish attempts that failed so far.
    pub failed: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            subject: None,
            reason: None,
            elapsed_ms: None,
            published: None,
            failed: None,
        }
    }

    /// Attaches a subject.
    #[inline]
    pub fn with_subject(mut self, subject: impl Into<Arc<str>>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.elapsed_ms = Some(ms);
        self
    }

    /// Attaches publish counters from a drain report.
    #[inline]
    pub fn with_counts(mut self, report: &DrainReport) -> Self {
        self.published = Some(report.published);
        self.failed = Some(report.failed);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_subject(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_subject(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
