//! # Annotator: lifecycle controller of the annotation pipeline.
//!
//! The [`Annotator`] is what the host test runner talks to. It owns the
//! producer half of the event channel, the publisher task and the event
//! listener, and implements the shutdown/drain protocol.
//!
//! ## Architecture
//! ```text
//! host test runner
//!   ├─ on_run_started() ──► Bus.publish(RunStarted)
//!   ├─ on_failure(ev)  ──► [event channel] ──► Publisher ──► render ──► Sink
//!   │                        (FIFO, non-blocking push)        │
//!   │                                                         └─► Bus.publish(Published / PublishFailed)
//!   └─ shutdown().await
//!        ├─► push Shutdown (last message, exactly once)
//!        ├─► await Publisher: Drained | Interrupted | Disconnected
//!        │     └─ grace exceeded → interrupt, GraceExceeded
//!        └─► stop listener, flush subscribers (LogWriter, ...)
//!
//! Bus ──► event listener ──► SubscriberSet ──► subscriber workers
//! ```
//!
//! ## Inert mode
//! When CI is not detected the annotator holds nothing: no channel, no tasks.
//! Every call returns immediately and `shutdown` reports [`DrainExit::Inactive`](crate::DrainExit::Inactive).
//!
//! ## Example
//! ```rust
//! use ci_annotator::{Annotator, AnnotatorConfig, FailureEvent};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let annotator = Annotator::builder(AnnotatorConfig::from_env()).build();
//!
//!     annotator.on_run_started();
//!     annotator.on_failure(
//!         FailureEvent::new("adds numbers")
//!             .with_message_line("expected 4, got 5")
//!             .with_rerun_command("cargo test adds_numbers")
//!             .with_full_description("calc::tests::adds_numbers"),
//!     );
//!
//!     // Publishing is best-effort: a failed drain never fails the test run.
//!     let _ = annotator.shutdown().await;
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::select;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::builder::AnnotatorBuilder;
use crate::core::executor::Executor;
use crate::core::config::AnnotatorConfig;
use crate::core::publisher::DrainReport;
use crate::core::queue::QueueTx;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::failures::FailureEvent;
use crate::subscribers::SubscriberSet;

/// Running pipeline state. Absent when inert or after shutdown.
pub(crate) struct Active {
    pub(crate) executor: Executor,
    pub(crate) tx: QueueTx,
    pub(crate) bus: Bus,
    pub(crate) context: Arc<str>,
    pub(crate) worker: JoinHandle<DrainReport>,
    pub(crate) interrupt: CancellationToken,
    pub(crate) listener: Option<JoinHandle<()>>,
    pub(crate) stop_listener: CancellationToken,
    pub(crate) signals: Option<JoinHandle<()>>,
    pub(crate) grace: Option<Duration>,
}

/// Entry point for the host test runner.
///
/// All methods take `&self`; share it as `Arc<Annotator>`.
pub struct Annotator {
    active: Mutex<Option<Active>>,
}

impl Annotator {
    /// Creates a builder for the given configuration.
    pub fn builder(cfg: AnnotatorConfig) -> AnnotatorBuilder {
        AnnotatorBuilder::new(cfg)
    }

    /// Builds an annotator from the process environment with the default
    /// agent sink.
    pub fn from_env() -> Arc<Self> {
        AnnotatorBuilder::new(AnnotatorConfig::from_env()).build()
    }

    pub(crate) fn inert() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    pub(crate) fn running(active: Active) -> Self {
        Self {
            active: Mutex::new(Some(active)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Active>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` while failures are being accepted.
    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Host notification: the test run started.
    pub fn on_run_started(&self) {
        if let Some(active) = self.lock().as_ref() {
            let ev = Event::new(EventKind::RunStarted).with_subject(Arc::clone(&active.context));
            active.bus.publish(ev);
        }
    }

    /// Host notification: a test failed.
    ///
    /// Never blocks beyond the channel push. Inert or shut-down annotators drop
    /// the failure silently; a full bounded queue drops it with a `FailureDropped` event.
    pub fn on_failure(&self, failure: FailureEvent) {
        let guard = self.lock();
        let Some(active) = guard.as_ref() else {
            return;
        };
        if let Err((err, failure)) = active.tx.push(failure) {
            active.bus.publish(
                Event::new(EventKind::FailureDropped)
                    .with_subject(failure.description())
                    .with_reason(err.as_label()),
            );
        }
    }

    /// Aborts the publisher, abandoning failures not yet published.
    ///
    /// Best-effort: `shutdown` still has to be called to release resources.
    pub fn interrupt(&self) {
        if let Some(active) = self.lock().as_ref() {
            active.interrupt.cancel();
        }
    }

    /// Pushes the shutdown message and waits until the publisher has drained
    /// every failure reported before this call.
    ///
    /// With `AnnotatorConfig::grace` set, the wait is bounded: on expiry the
    /// publisher is interrupted and [`RuntimeError::GraceExceeded`] is returned.
    ///
    /// Subsequent calls return an [`Inactive`](crate::DrainExit::Inactive) report.
    pub async fn shutdown(&self) -> Result<DrainReport, RuntimeError> {
        let Some(active) = self.lock().take() else {
            return Ok(DrainReport::default());
        };
        let Active {
            executor,
            tx,
            bus,
            context: _,
            mut worker,
            interrupt,
            listener,
            stop_listener,
            signals,
            grace,
        } = active;

        let worker_ref = &mut worker;
        let drain = async move {
            tx.close().await;
            worker_ref.await
        };
        let joined = match grace {
            None => Ok(drain.await),
            Some(grace) => tokio::time::timeout(grace, drain).await.map_err(|_| grace),
        };

        let result = match joined {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(join_err)) => Err(RuntimeError::WorkerPanicked {
                info: join_err.to_string(),
            }),
            Err(grace) => {
                bus.publish(Event::new(EventKind::GraceExceeded).with_elapsed(grace));
                interrupt.cancel();
                let published = worker.await.map(|r| r.published).unwrap_or(0);
                Err(RuntimeError::GraceExceeded { grace, published })
            }
        };

        if let Some(signals) = signals {
            signals.abort();
        }
        stop_listener.cancel();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        executor.release();
        result
    }

    /// Blocking form of [`shutdown`](Self::shutdown) for hosts without an
    /// async context, such as a plain `#[test]` harness.
    ///
    /// Must not be called from within an async task.
    pub fn shutdown_blocking(&self) -> Result<DrainReport, RuntimeError> {
        let handle = match self.lock().as_ref() {
            Some(active) => active.executor.handle().clone(),
            None => return Ok(DrainReport::default()),
        };
        handle.block_on(self.shutdown())
    }
}

/// Forwards bus events to the subscriber set until `stop` fires, then
/// forwards whatever is still buffered and flushes the subscribers.
pub(crate) fn spawn_event_listener(
    bus: &Bus,
    set: SubscriberSet,
    stop: CancellationToken,
) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => set.emit(ev),
                            Err(TryRecvError::Lagged(_)) => continue,
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        set.shutdown().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DrainExit;
    use crate::sinks::recording::RecordingSink;
    use crate::subscribers::Subscribe;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<Event>>,
    }

    impl Collect {
        fn kinds(&self) -> Vec<EventKind> {
            self.seen.lock().unwrap().iter().map(|e| e.kind).collect()
        }
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.clone());
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    fn enabled() -> AnnotatorConfig {
        AnnotatorConfig {
            enabled: true,
            log_to_stdout: false,
            ..AnnotatorConfig::default()
        }
    }

    #[test]
    fn inert_pipeline_drops_everything_without_a_runtime() {
        let sink = Arc::new(RecordingSink::new());
        // No Tokio runtime here: building must not spawn anything.
        let annotator = Annotator::builder(AnnotatorConfig::default())
            .with_sink(sink.clone())
            .build();

        assert!(!annotator.is_active());
        annotator.on_run_started();
        for i in 0..5 {
            annotator.on_failure(FailureEvent::new(format!("failure {i}")));
        }
        let report = futures::executor::block_on(annotator.shutdown()).unwrap();

        assert_eq!(report.exit, DrainExit::Inactive);
        assert_eq!(sink.calls(), 0);
    }

    #[test]
    fn enabled_pipeline_runs_without_a_host_runtime() {
        let sink = Arc::new(RecordingSink::new());
        let annotator = Annotator::builder(enabled()).with_sink(sink.clone()).build();
        assert!(annotator.is_active());

        annotator.on_run_started();
        annotator.on_failure(FailureEvent::new("live"));

        // Published while the producer thread is still running synchronously.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while sink.calls() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(sink.calls(), 1);

        annotator.on_failure(FailureEvent::new("at exit"));
        let report = annotator.shutdown_blocking().unwrap();
        assert_eq!(report.exit, DrainExit::Drained);
        assert_eq!(report.published, 2);
        assert_eq!(annotator.shutdown_blocking().unwrap().exit, DrainExit::Inactive);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn drains_on_a_multi_thread_host_runtime() {
        let sink = Arc::new(RecordingSink::new());
        let annotator = Annotator::builder(enabled()).with_sink(sink.clone()).build();

        for name in ["a", "b", "c"] {
            annotator.on_failure(FailureEvent::new(name));
        }
        let report = annotator.shutdown().await.unwrap();

        assert_eq!(report.published, 3);
        assert!(sink.bodies()[2].contains("<summary>c</summary>"));
    }

    #[tokio::test]
    async fn signal_watcher_does_not_interrupt_a_normal_drain() {
        let sink = Arc::new(RecordingSink::new());
        let cfg = AnnotatorConfig {
            interrupt_on_signal: true,
            ..enabled()
        };
        let annotator = Annotator::builder(cfg).with_sink(sink.clone()).build();

        annotator.on_failure(FailureEvent::new("kept"));
        let report = annotator.shutdown().await.unwrap();

        assert_eq!(report.exit, DrainExit::Drained);
        assert_eq!(report.published, 1);
    }

    #[tokio::test]
    async fn shutdown_drains_everything_pushed_before_it() {
        let sink = Arc::new(RecordingSink::new().with_delay(Duration::from_millis(20)));
        let annotator = Annotator::builder(enabled()).with_sink(sink.clone()).build();

        annotator.on_failure(FailureEvent::new("E1"));
        annotator.on_failure(FailureEvent::new("E2"));
        let report = annotator.shutdown().await.unwrap();

        assert_eq!(report.exit, DrainExit::Drained);
        assert_eq!(report.published, 2);
        let bodies = sink.bodies();
        assert!(bodies[0].contains("<summary>E1</summary>"));
        assert!(bodies[1].contains("<summary>E2</summary>"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sink.calls(), 2);
        assert!(!annotator.is_active());
    }

    #[tokio::test]
    async fn one_failed_publish_does_not_stop_the_rest() {
        let sink = Arc::new(RecordingSink::new().failing_on(2));
        let collect = Arc::new(Collect::default());
        let annotator = Annotator::builder(enabled())
            .with_sink(sink.clone())
            .with_subscribers(vec![collect.clone() as Arc<dyn Subscribe>])
            .build();

        annotator.on_run_started();
        for name in ["first", "second", "third"] {
            annotator.on_failure(FailureEvent::new(name));
        }
        let report = annotator.shutdown().await.unwrap();

        assert_eq!(report.published, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(sink.calls(), 3);
        assert_eq!(
            collect.kinds(),
            [
                EventKind::RunStarted,
                EventKind::AnnotationPublished,
                EventKind::PublishFailed,
                EventKind::AnnotationPublished,
                EventKind::DrainCompleted,
            ]
        );
        let seen = collect.seen.lock().unwrap();
        assert_eq!(seen[2].subject.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn grace_exceeded_interrupts_the_publisher() {
        let sink = Arc::new(RecordingSink::new().stalling_on(1));
        let cfg = AnnotatorConfig {
            grace: Duration::from_millis(50),
            ..enabled()
        };
        let annotator = Annotator::builder(cfg).with_sink(sink.clone()).build();

        annotator.on_failure(FailureEvent::new("hangs"));
        annotator.on_failure(FailureEvent::new("lost"));
        let err = annotator.shutdown().await.unwrap_err();

        assert!(matches!(err, RuntimeError::GraceExceeded { published: 0, .. }));
        assert_eq!(sink.calls(), 1);
    }

    #[tokio::test]
    async fn interrupt_abandons_the_backlog() {
        let sink = Arc::new(RecordingSink::new().stalling_on(1));
        let annotator = Annotator::builder(enabled()).with_sink(sink.clone()).build();

        annotator.on_failure(FailureEvent::new("stuck"));
        annotator.on_failure(FailureEvent::new("abandoned"));
        sink.entered.notified().await;
        annotator.interrupt();

        let report = annotator.shutdown().await.unwrap();
        assert_eq!(report.exit, DrainExit::Interrupted);
        assert_eq!(sink.calls(), 1);
    }

    #[tokio::test]
    async fn calls_after_shutdown_are_ignored() {
        let sink = Arc::new(RecordingSink::new());
        let annotator = Annotator::builder(enabled()).with_sink(sink.clone()).build();

        assert_eq!(annotator.shutdown().await.unwrap().exit, DrainExit::Drained);
        annotator.on_failure(FailureEvent::new("late"));
        assert_eq!(annotator.shutdown().await.unwrap().exit, DrainExit::Inactive);
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn full_bounded_queue_drops_and_reports() {
        let sink = Arc::new(RecordingSink::new().stalling_on(1));
        let collect = Arc::new(Collect::default());
        let cfg = AnnotatorConfig {
            queue_capacity: 1,
            ..enabled()
        };
        let annotator = Annotator::builder(cfg)
            .with_sink(sink.clone())
            .with_subscribers(vec![collect.clone() as Arc<dyn Subscribe>])
            .build();

        annotator.on_failure(FailureEvent::new("in flight"));
        sink.entered.notified().await;
        annotator.on_failure(FailureEvent::new("queued"));
        annotator.on_failure(FailureEvent::new("overflow"));

        annotator.interrupt();
        let report = annotator.shutdown().await.unwrap();
        assert_eq!(report.exit, DrainExit::Interrupted);

        let seen = collect.seen.lock().unwrap();
        let dropped: Vec<_> = seen
            .iter()
            .filter(|e| e.kind == EventKind::FailureDropped)
            .collect();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].subject.as_deref(), Some("overflow"));
        assert_eq!(dropped[0].reason.as_deref(), Some("full"));
    }
}
