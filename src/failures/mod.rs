//! # Failure notifications received from the host test runner.
//!
//! - [`FailureEvent`] - immutable record of one failed test
//!
//! The host builds a `FailureEvent` the moment a test fails and hands it to
//! [`Annotator::on_failure`](crate::Annotator::on_failure). From then on the
//! pipeline owns it until the publish attempt, after which it is dropped.

mod failure;

pub use failure::FailureEvent;
