//! # Event subscribers for the annotation pipeline.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Annotator / Publisher ── publish(Event) ──► Bus ──► event listener
//!                                                        │
//!                                                        ▼
//!                                                  SubscriberSet::emit
//!                                                  ┌─────┴─────┐
//!                                                  ▼           ▼
//!                                              LogWriter    Custom ...
//! ```

mod embedded;
mod subscriber;
mod subscriber_set;

pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
