//! # Annotation sink abstraction.
//!
//! A [`Sink`] persists one rendered annotation. The publisher calls it once
//! per failure, sequentially, and never concurrently: implementations do not
//! need to be safe against parallel appends to the same context.
//!
//! Failures are reported as typed [`AnnotateError`]s; the publisher logs them
//! and moves on.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AnnotateError;

/// Visual style of an annotation on the build page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationStyle {
    Success,
    Info,
    Warning,
    #[default]
    Error,
}

impl AnnotationStyle {
    /// Value passed to the agent's `--style` flag.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationStyle::Success => "success",
            AnnotationStyle::Info => "info",
            AnnotationStyle::Warning => "warning",
            AnnotationStyle::Error => "error",
        }
    }
}

/// One annotate request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// Context tag; requests sharing it target the same annotation.
    pub context: Arc<str>,
    /// Visual style.
    pub style: AnnotationStyle,
    /// Append to the existing annotation instead of replacing it.
    pub append: bool,
    /// Suppress the command's own output unless it fails.
    pub quiet: bool,
    /// Markup body.
    pub body: String,
}

impl Annotation {
    /// Error-styled, appending, quiet annotation: what every failure publishes.
    pub fn failure(context: impl Into<Arc<str>>, body: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            style: AnnotationStyle::Error,
            append: true,
            quiet: true,
            body: body.into(),
        }
    }
}

/// # Destination for rendered annotations.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use ci_annotator::{AnnotateError, Annotation, Sink};
///
/// struct Stdout;
///
/// #[async_trait]
/// impl Sink for Stdout {
///     async fn annotate(&self, annotation: &Annotation) -> Result<(), AnnotateError> {
///         println!("{}", annotation.body);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Publishes one annotation. Called at most once per failure.
    async fn annotate(&self, annotation: &Annotation) -> Result<(), AnnotateError>;

    /// Returns a short name for diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a sink.
pub type SinkRef = Arc<dyn Sink>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_annotation_defaults() {
        let a = Annotation::failure("test-failures", "<details></details>");
        assert_eq!(&*a.context, "test-failures");
        assert_eq!(a.style.as_str(), "error");
        assert!(a.append);
        assert!(a.quiet);
    }
}
