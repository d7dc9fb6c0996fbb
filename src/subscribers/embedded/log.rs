//! # LogWriter - stdout event printer
//!
//! Installed by default (see `AnnotatorConfig::log_to_stdout`). Publish
//! failures are printed with the sink's error message so a broken agent
//! setup is visible in the job log without failing any test.
//!
//! ## Example output
//! ```text
//! ci-annotator has started.
//! [publish-failed] failure="adds numbers" err=agent: buildkite-agent exited with status 1
//! [failure-dropped] failure="slow test" reason=full
//! [interrupted] published=3 failed=0
//! [drained] published=4 failed=1
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let subject = e.subject.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::RunStarted => {
                println!("{} has started.", env!("CARGO_PKG_NAME"));
            }
            EventKind::AnnotationPublished => {}
            EventKind::PublishFailed => {
                println!("[publish-failed] failure={subject:?} err={reason}");
            }
            EventKind::FailureDropped => {
                println!("[failure-dropped] failure={subject:?} reason={reason}");
            }
            EventKind::Interrupted => {
                println!(
                    "[interrupted] published={} failed={}",
                    e.published.unwrap_or(0),
                    e.failed.unwrap_or(0)
                );
            }
            EventKind::DrainCompleted => {
                println!(
                    "[drained] published={} failed={}",
                    e.published.unwrap_or(0),
                    e.failed.unwrap_or(0)
                );
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded] grace={}ms", e.elapsed_ms.unwrap_or(0));
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] subscriber={subject} reason={reason}");
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] subscriber={subject} info={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
