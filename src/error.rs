//! Error types used by the annotation pipeline and its sinks.
//!
//! This module defines three enums:
//!
//! - [`AnnotateError`] - a single sink invocation failed.
//! - [`QueueError`] - a failure could not be handed to the publisher.
//! - [`RuntimeError`] - the shutdown/drain protocol did not complete cleanly.
//!
//! All of them provide an `as_label` helper for log lines.
//! None of these errors is ever allowed to fail the host's test run.

use std::any::Any;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by a [`Sink`](crate::Sink) invocation.
///
/// The publisher inspects these and moves on: no retry, no re-queue.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AnnotateError {
    /// The annotation command could not be started at all.
    #[error("failed to run {}: {source}", .program.display())]
    Spawn {
        /// Program that was invoked.
        program: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The annotation command ran and exited unsuccessfully.
    #[error(
        "{} exited with {}{}",
        .program.display(),
        describe_code(.code),
        describe_output(.stdout, .stderr)
    )]
    Exit {
        /// Program that was invoked.
        program: PathBuf,
        /// Exit code (`None` when terminated by a signal).
        code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The sink panicked while publishing.
    #[error("sink panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Custom sink failure.
    #[error("annotation rejected: {error}")]
    Rejected {
        /// The underlying error message.
        error: String,
    },
}

impl AnnotateError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use ci_annotator::AnnotateError;
    ///
    /// let err = AnnotateError::Rejected { error: "nope".into() };
    /// assert_eq!(err.as_label(), "annotate_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AnnotateError::Spawn { .. } => "annotate_spawn",
            AnnotateError::Exit { .. } => "annotate_exit",
            AnnotateError::Panicked { .. } => "annotate_panicked",
            AnnotateError::Rejected { .. } => "annotate_rejected",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn describe_output(stdout: &str, stderr: &str) -> String {
    let mut out = String::new();
    if !stdout.trim().is_empty() {
        out.push_str("\n\nstdout:\n");
        out.push_str(stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        out.push_str("\n\nstderr:\n");
        out.push_str(stderr.trim_end());
    }
    out
}

/// # Errors produced when pushing a failure onto the event channel.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Bounded queue is at capacity; the failure was dropped.
    #[error("queue full")]
    Full,

    /// The publisher is gone; the failure was dropped.
    #[error("queue closed")]
    Closed,
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Full => "full",
            QueueError::Closed => "closed",
        }
    }
}

/// # Errors produced by the shutdown protocol.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Draining did not finish within the configured grace period; the
    /// publisher was interrupted and the remaining failures were lost.
    #[error("drain timeout {grace:?} exceeded; published {published} before interrupting")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Annotations published before the deadline hit.
        published: u64,
    },

    /// The publisher task terminated abnormally.
    #[error("publisher worker crashed: {info}")]
    WorkerPanicked {
        /// Panic or join failure details.
        info: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use ci_annotator::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), published: 2 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::WorkerPanicked { .. } => "runtime_worker_panicked",
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
