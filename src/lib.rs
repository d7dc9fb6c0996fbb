//! # ci-annotator
//!
//! **ci-annotator** publishes test failures as live CI build annotations
//! while the test run is still going.
//!
//! The host test runner reports each failure the moment it happens; a single
//! background publisher renders it into an HTML fragment (ANSI colors
//! translated to markup) and appends it to the build's annotation through the
//! CI agent. The host never waits on the agent, and at the end of the run it
//! waits until every reported failure has been published.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   host test runner
//!     │ on_run_started / on_failure / shutdown
//!     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Annotator (lifecycle controller)                                 │
//! │  - event channel producer (unbounded, or bounded + drop on full)  │
//! │  - interrupt token (explicit, grace expiry, OS signal)            │
//! │  - Bus + event listener                                           │
//! └──────┬─────────────────────────────────────────────────────┬──────┘
//!        ▼                                                     │
//!   [event channel]  Failure, Failure, ..., Shutdown           │
//!        ▼                                                     │
//! ┌──────────────────────────────┐                             │
//! │  Publisher (single worker)   │                             │
//! │  render_failure ──► Sink     │                             │
//! └──────┬───────────────────────┘                             │
//!        │ AnnotationPublished / PublishFailed / DrainCompleted│
//!        ▼                                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          SubscriberSet (per-sub queues)
//!                          ┌────────┴────────┐
//!                          ▼                 ▼
//!                      LogWriter         custom subscribers
//! ```
//!
//! ### Lifecycle
//! ```text
//! AnnotatorConfig::from_env()
//!   ├─ CI not detected ──► inert annotator: every call is a no-op
//!   └─ CI detected     ──► spawn publisher + listener
//!
//! on_failure(ev) ──► push (never blocks)
//! shutdown()
//!   ├─► push Shutdown (after every failure already pushed)
//!   ├─► await publisher (bounded by grace, if set)
//!   └─► flush subscribers
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                        |
//! |-----------------|----------------------------------------------------------|-------------------------------------------|
//! | **Lifecycle**   | Host-facing entry point and drain protocol.              | [`Annotator`], [`AnnotatorBuilder`]       |
//! | **Rendering**   | ANSI to markup, failure fragment, escaping.              | [`render::recolorize`], [`render::render_failure`] |
//! | **Sinks**       | Where annotations go: the CI agent, or a closure.        | [`Sink`], [`AgentSink`], [`SinkFn`]       |
//! | **Subscribers** | Observe publish results, drops and drain completion.     | [`Subscribe`], [`LogWriter`]              |
//! | **Errors**      | Typed errors for sinks, the queue and shutdown.          | [`AnnotateError`], [`RuntimeError`]       |
//! | **Config**      | CI detection and pipeline settings.                      | [`AnnotatorConfig`], [`CiContext`]        |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use ci_annotator::{Annotation, Annotator, AnnotatorConfig, CiContext, FailureEvent, SinkFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cfg = AnnotatorConfig {
//!         enabled: true,
//!         ci: CiContext::new("https://buildkite.com/acme/app/builds/42", "0190-ab"),
//!         log_to_stdout: false,
//!         ..AnnotatorConfig::default()
//!     };
//!
//!     // Print instead of calling the agent.
//!     let sink = SinkFn::arc("stdout", |a: Annotation| async move {
//!         print!("{}", a.body);
//!         Ok(())
//!     });
//!
//!     let annotator = Annotator::builder(cfg).with_sink(sink).build();
//!     annotator.on_run_started();
//!     annotator.on_failure(
//!         FailureEvent::new("Calculator adds numbers")
//!             .with_message_line("\x1b[31mexpected: 4\x1b[0m")
//!             .with_message_line("     got: 5")
//!             .with_rerun_command("cargo test adds_numbers")
//!             .with_full_description("Calculator adds numbers"),
//!     );
//!
//!     let report = annotator.shutdown().await.unwrap();
//!     assert_eq!(report.published, 1);
//! }
//! ```
mod core;
mod error;
mod events;
mod failures;
pub mod render;
mod sinks;
mod subscribers;

// ---- Public re-exports ----

pub use core::{
    Annotator, AnnotatorBuilder, AnnotatorConfig, CiContext, DEFAULT_AGENT, DEFAULT_CONTEXT,
    DrainExit, DrainReport, ENV_BUILD_URL, ENV_JOB_ID, ENV_MARKER,
};
pub use error::{AnnotateError, QueueError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use failures::FailureEvent;
pub use sinks::{AgentSink, Annotation, AnnotationStyle, Sink, SinkFn, SinkRef};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
