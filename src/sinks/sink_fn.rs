//! # Function-backed sink (`SinkFn`)
//!
//! [`SinkFn`] wraps a closure `F: Fn(Annotation) -> Fut`, producing a fresh
//! future per annotation. Handy for hosts that publish through their own
//! client, and for tests.
//!
//! ## Example
//! ```rust
//! use ci_annotator::{AnnotateError, Annotation, SinkFn, SinkRef};
//!
//! let sink: SinkRef = SinkFn::arc("discard", |_a: Annotation| async {
//!     Ok::<_, AnnotateError>(())
//! });
//! assert_eq!(sink.name(), "discard");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AnnotateError;
use crate::sinks::{Annotation, Sink};

/// Function-backed sink implementation.
#[derive(Debug)]
pub struct SinkFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> SinkFn<F> {
    /// Creates a new function-backed sink.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the sink and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Sink for SinkFn<F>
where
    F: Fn(Annotation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), AnnotateError>> + Send + 'static,
{
    async fn annotate(&self, annotation: &Annotation) -> Result<(), AnnotateError> {
        (self.f)(annotation.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
