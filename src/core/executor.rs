//! # Where the pipeline tasks run.
//!
//! The host may call the annotator from:
//! - a multi-thread Tokio runtime: tasks are spawned onto it;
//! - a current-thread runtime, or no runtime at all (plain `#[test]`
//!   harnesses): tasks run on a dedicated `ci-annotator` thread driving its
//!   own current-thread runtime.
//!
//! Either way the publisher makes progress while the host's producers keep
//! running synchronously.

use std::io;
use std::thread;

use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tokio_util::sync::CancellationToken;

/// Runtime hosting the publisher, listener and subscriber workers.
pub(crate) enum Executor {
    /// The host's multi-thread runtime.
    Host(Handle),
    /// Dedicated thread parked in `block_on` until `stop` fires.
    Dedicated {
        handle: Handle,
        stop: CancellationToken,
    },
}

impl Executor {
    /// Picks the host runtime when it can run tasks in parallel with the
    /// caller, otherwise starts a dedicated one.
    pub(crate) fn acquire() -> io::Result<Self> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Ok(Self::Host(handle))
            }
            _ => Self::dedicated(),
        }
    }

    fn dedicated() -> io::Result<Self> {
        let rt = Builder::new_current_thread().enable_all().build()?;
        let handle = rt.handle().clone();
        let stop = CancellationToken::new();
        let parked = stop.clone();

        thread::Builder::new()
            .name(env!("CARGO_PKG_NAME").into())
            .spawn(move || rt.block_on(async move { parked.cancelled().await }))?;

        Ok(Self::Dedicated { handle, stop })
    }

    pub(crate) fn handle(&self) -> &Handle {
        match self {
            Self::Host(handle) => handle,
            Self::Dedicated { handle, .. } => handle,
        }
    }

    /// Lets a dedicated runtime wind down. Call once every task has finished.
    pub(crate) fn release(self) {
        if let Self::Dedicated { stop, .. } = self {
            stop.cancel();
        }
    }
}
