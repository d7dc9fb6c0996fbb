use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::annotator::{Active, Annotator, spawn_event_listener};
use super::executor::Executor;
use super::publisher::Publisher;
use super::{queue, shutdown};
use crate::{
    core::AnnotatorConfig,
    events::Bus,
    sinks::{AgentSink, SinkRef},
    subscribers::{LogWriter, Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Annotator`] with optional overrides.
pub struct AnnotatorBuilder {
    cfg: AnnotatorConfig,
    sink: Option<SinkRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl AnnotatorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: AnnotatorConfig) -> Self {
        Self {
            cfg,
            sink: None,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the default agent sink.
    pub fn with_sink(mut self, sink: SinkRef) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Added next to the built-in [`LogWriter`] when `log_to_stdout` is set.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the annotator.
    ///
    /// With `enabled == false` nothing is allocated or spawned and the result
    /// is inert. Otherwise this starts:
    /// - the event bus and its listener, when there are subscribers;
    /// - the publisher task, owning the consumer half of the event channel;
    /// - the signal watcher, if `interrupt_on_signal` is set.
    ///
    /// Tasks run on the caller's multi-thread runtime if there is one, and on
    /// a dedicated thread otherwise (see [`Annotator::shutdown_blocking`]).
    /// If no runtime can be started the annotator is inert.
    pub fn build(self) -> Arc<Annotator> {
        let cfg = self.cfg;
        if !cfg.enabled {
            return Arc::new(Annotator::inert());
        }
        let executor = match Executor::acquire() {
            Ok(executor) => executor,
            Err(err) => {
                if cfg.log_to_stdout {
                    println!("[runtime-unavailable] annotations disabled: {err}");
                }
                return Arc::new(Annotator::inert());
            }
        };
        let handle = executor.handle().clone();
        let _entered = handle.enter();

        let bus = Bus::new(cfg.bus_capacity_clamped());
        let mut subscribers = self.subscribers;
        if cfg.log_to_stdout {
            subscribers.push(Arc::new(LogWriter::new()));
        }
        let stop_listener = CancellationToken::new();
        let set = SubscriberSet::new(subscribers, bus.clone());
        let listener = (!set.is_empty())
            .then(|| spawn_event_listener(&bus, set, stop_listener.clone()));

        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(AgentSink::new(cfg.agent.clone())));
        let context: Arc<str> = Arc::from(cfg.context.as_str());
        let (tx, rx) = queue::channel(cfg.queue_limit());
        let interrupt = CancellationToken::new();

        let publisher = Publisher::new(sink, cfg.ci.clone(), Arc::clone(&context), bus.clone());
        let worker = tokio::spawn(publisher.run(rx, interrupt.clone()));

        let signals = cfg
            .interrupt_on_signal
            .then(|| tokio::spawn(shutdown::interrupt_on_signal(interrupt.clone())));

        Arc::new(Annotator::running(Active {
            executor,
            tx,
            bus,
            context,
            worker,
            interrupt,
            listener,
            stop_listener,
            signals,
            grace: cfg.drain_deadline(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CiContext;
    use crate::failures::FailureEvent;
    use crate::sinks::recording::RecordingSink;

    #[cfg(unix)]
    #[tokio::test]
    async fn default_sink_targets_configured_agent() {
        // `true` accepts any arguments and exits 0.
        let cfg = AnnotatorConfig {
            enabled: true,
            log_to_stdout: false,
            agent: "true".into(),
            ..AnnotatorConfig::default()
        };
        let annotator = AnnotatorBuilder::new(cfg).build();
        annotator.on_failure(FailureEvent::new("via agent"));

        let report = annotator.shutdown().await.unwrap();
        assert_eq!(report.published, 1);
    }

    #[tokio::test]
    async fn rendered_body_uses_ci_context() {
        let sink = Arc::new(RecordingSink::new());
        let cfg = AnnotatorConfig {
            enabled: true,
            log_to_stdout: false,
            ci: CiContext::new("https://ci.example/builds/9", "job-1"),
            ..AnnotatorConfig::default()
        };
        let annotator = AnnotatorBuilder::new(cfg).with_sink(sink.clone()).build();
        annotator.on_failure(FailureEvent::new("linked"));
        annotator.shutdown().await.unwrap();

        assert!(sink.bodies()[0].contains("href=\"https://ci.example/builds/9#job-1\""));
    }
}
