//! # Pipeline configuration.
//!
//! Provides [`AnnotatorConfig`] (runtime settings) and [`CiContext`] (the
//! build URL / job id pair used to link annotations back to their job).
//!
//! Both are plain values built **once** when the pipeline starts, usually via
//! [`AnnotatorConfig::from_env`]. Tests build them directly or through
//! [`AnnotatorConfig::from_lookup`] without touching the process environment.
//!
//! ## Environment
//! | Variable              | Effect                                              |
//! |-----------------------|-----------------------------------------------------|
//! | `BUILDKITE`           | marker; enables the pipeline unless empty/`0`/`false` |
//! | `BUILDKITE_BUILD_URL` | build page URL (link target prefix)                 |
//! | `BUILDKITE_JOB_ID`    | job id (link anchor and label)                      |
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → unbounded event channel
//! - `grace = 0s` → shutdown waits for the drain without a deadline

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable marking a recognized CI run.
pub const ENV_MARKER: &str = "BUILDKITE";
/// Environment variable holding the build URL.
pub const ENV_BUILD_URL: &str = "BUILDKITE_BUILD_URL";
/// Environment variable holding the job id.
pub const ENV_JOB_ID: &str = "BUILDKITE_JOB_ID";

/// Default annotation context tag.
pub const DEFAULT_CONTEXT: &str = "test-failures";
/// Default annotation agent program.
pub const DEFAULT_AGENT: &str = "buildkite-agent";

/// Build URL and job id of the running CI job.
///
/// Missing values are empty strings; rendering degrades instead of failing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CiContext {
    build_url: String,
    job_id: String,
}

impl CiContext {
    /// Creates a context from explicit values.
    pub fn new(build_url: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            build_url: build_url.into(),
            job_id: job_id.into(),
        }
    }

    /// Build page URL.
    pub fn build_url(&self) -> &str {
        &self.build_url
    }

    /// Job identifier.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Deep link to the job: `<build url>#<job id>`.
    pub fn job_url(&self) -> String {
        format!("{}#{}", self.build_url, self.job_id)
    }
}

/// Runtime configuration for the annotation pipeline.
///
/// ## Field semantics
/// - `enabled`: whether the pipeline runs at all (`false` = fully inert)
/// - `ci`: link target for rendered annotations
/// - `context`: annotation context tag; all failures append to this one annotation
/// - `agent`: program invoked by the default [`AgentSink`](crate::AgentSink)
/// - `queue_capacity`: event channel capacity (`0` = unbounded)
/// - `grace`: drain deadline at shutdown (`0s` = none)
/// - `bus_capacity`: diagnostic event bus ring buffer size (min 1)
/// - `log_to_stdout`: install the built-in [`LogWriter`](crate::LogWriter)
/// - `interrupt_on_signal`: interrupt the publisher on SIGINT/SIGTERM/SIGQUIT
#[derive(Clone, Debug)]
pub struct AnnotatorConfig {
    /// Run the pipeline; when `false` every notification is dropped.
    pub enabled: bool,

    /// Build URL and job id used for the "in Job #N" link.
    pub ci: CiContext,

    /// Annotation context tag passed to the sink.
    pub context: String,

    /// Annotation agent program.
    pub agent: PathBuf,

    /// Capacity of the event channel.
    ///
    /// - `0` = unbounded; `on_failure` never drops
    /// - `n > 0` = at most `n` queued failures; further ones are dropped
    pub queue_capacity: usize,

    /// Maximum time `shutdown` waits for the drain.
    ///
    /// When exceeded, the publisher is interrupted and
    /// `RuntimeError::GraceExceeded` is returned.
    pub grace: Duration,

    /// Capacity of the diagnostic event bus.
    pub bus_capacity: usize,

    /// Print pipeline events (including publish failures) to stdout.
    pub log_to_stdout: bool,

    /// Install an OS signal watcher that interrupts the publisher.
    ///
    /// Off by default: registering handlers replaces the host's own
    /// Ctrl-C behavior for the rest of the process.
    pub interrupt_on_signal: bool,
}

impl AnnotatorConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Example
    /// ```
    /// use std::collections::HashMap;
    /// use ci_annotator::AnnotatorConfig;
    ///
    /// let env = HashMap::from([
    ///     ("BUILDKITE", "true"),
    ///     ("BUILDKITE_BUILD_URL", "https://ci.example/builds/42"),
    ///     ("BUILDKITE_JOB_ID", "7"),
    /// ]);
    /// let cfg = AnnotatorConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
    ///
    /// assert!(cfg.enabled);
    /// assert_eq!(cfg.ci.job_url(), "https://ci.example/builds/42#7");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            enabled: lookup(ENV_MARKER).is_some_and(|v| marker_enabled(&v)),
            ci: CiContext::new(
                lookup(ENV_BUILD_URL).unwrap_or_default(),
                lookup(ENV_JOB_ID).unwrap_or_default(),
            ),
            ..Self::default()
        }
    }

    /// Returns the channel capacity as an `Option`.
    ///
    /// - `None` → unbounded
    /// - `Some(n)` → bounded to `n`
    #[inline]
    pub fn queue_limit(&self) -> Option<usize> {
        if self.queue_capacity == 0 {
            None
        } else {
            Some(self.queue_capacity)
        }
    }

    /// Returns the drain deadline as an `Option`.
    #[inline]
    pub fn drain_deadline(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for AnnotatorConfig {
    /// Default configuration:
    ///
    /// - `enabled = false` (inert until CI is detected)
    /// - `context = "test-failures"`, `agent = "buildkite-agent"`
    /// - `queue_capacity = 0` (unbounded), `grace = 0s` (no deadline)
    /// - `bus_capacity = 1024`
    /// - `log_to_stdout = true`, `interrupt_on_signal = false`
    fn default() -> Self {
        Self {
            enabled: false,
            ci: CiContext::default(),
            context: DEFAULT_CONTEXT.to_string(),
            agent: PathBuf::from(DEFAULT_AGENT),
            queue_capacity: 0,
            grace: Duration::ZERO,
            bus_capacity: 1024,
            log_to_stdout: true,
            interrupt_on_signal: false,
        }
    }
}

fn marker_enabled(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}
