//! Runtime core: configuration, publishing and lifecycle.
//!
//! The public API from this module is [`Annotator`] (built via
//! [`AnnotatorBuilder`]) plus its configuration and drain report types.
//!
//! Internal modules:
//! - [`queue`]: FIFO event channel carrying failures and the shutdown message;
//! - [`publisher`]: the single background worker that renders and publishes;
//! - [`annotator`]: host-facing lifecycle controller and shutdown/drain protocol;
//! - [`executor`]: host runtime or dedicated publisher thread;
//! - [`shutdown`]: cross-platform interrupt signal handling.

mod annotator;
mod builder;
mod config;
mod executor;
mod publisher;
mod queue;
mod shutdown;

pub use annotator::Annotator;
pub use builder::AnnotatorBuilder;
pub use config::{
    AnnotatorConfig, CiContext, DEFAULT_AGENT, DEFAULT_CONTEXT, ENV_BUILD_URL, ENV_JOB_ID,
    ENV_MARKER,
};
pub use publisher::{DrainExit, DrainReport};
