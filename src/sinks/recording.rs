//! Test double that records every annotation it receives.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::AnnotateError;
use crate::sinks::{Annotation, Sink};

/// Records bodies in call order; can fail, panic or stall on chosen calls.
#[derive(Default)]
pub(crate) struct RecordingSink {
    bodies: Mutex<Vec<String>>,
    calls: Mutex<usize>,
    fail_on: HashSet<usize>,
    panic_on: HashSet<usize>,
    stall_on: HashSet<usize>,
    delay: Duration,
    pub(crate) entered: Notify,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fails the n-th call (1-based).
    pub(crate) fn failing_on(mut self, n: usize) -> Self {
        self.fail_on.insert(n);
        self
    }

    /// Panics on the n-th call (1-based).
    pub(crate) fn panicking_on(mut self, n: usize) -> Self {
        self.panic_on.insert(n);
        self
    }

    /// Never returns from the n-th call (1-based).
    pub(crate) fn stalling_on(mut self, n: usize) -> Self {
        self.stall_on.insert(n);
        self
    }

    /// Sleeps before every call.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Bodies of successful calls, in order.
    pub(crate) fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }

    /// Number of invocations, successful or not.
    pub(crate) fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn annotate(&self, annotation: &Annotation) -> Result<(), AnnotateError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        self.entered.notify_one();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.stall_on.contains(&n) {
            std::future::pending::<()>().await;
        }
        if self.panic_on.contains(&n) {
            panic!("sink exploded on call {n}");
        }
        if self.fail_on.contains(&n) {
            return Err(AnnotateError::Rejected {
                error: format!("call {n} rejected"),
            });
        }
        self.bodies.lock().unwrap().push(annotation.body.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
