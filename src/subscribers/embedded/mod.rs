//! Built-in subscribers.
//!
//! - [`LogWriter`] prints pipeline events to stdout

mod log;

pub use log::LogWriter;
