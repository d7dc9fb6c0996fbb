//! # Annotation sinks.
//!
//! - [`Sink`] - trait every destination implements
//! - [`AgentSink`] - default sink, runs the CI agent's `annotate` command
//! - [`SinkFn`] - closure-backed sink
//! - [`Annotation`], [`AnnotationStyle`] - the request handed to a sink

mod agent;
mod sink;
mod sink_fn;

#[cfg(test)]
pub(crate) mod recording;

pub use agent::AgentSink;
pub use sink::{Annotation, AnnotationStyle, Sink, SinkRef};
pub use sink_fn::SinkFn;
