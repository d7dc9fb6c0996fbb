//! Pipeline events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish diagnostic events emitted by the annotator, the publisher and the
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Annotator` (run started, dropped failures, grace exceeded),
//!   `Publisher` (published / failed / interrupted / drained), `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumer**: the annotator's event listener, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
