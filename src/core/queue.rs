//! # Event channel between the host and the publisher.
//!
//! A FIFO of [`Message`]s: failures followed by exactly one
//! [`Message::Shutdown`]. Unbounded by default so the host never waits;
//! optionally bounded, in which case pushes that find the queue full are
//! rejected instead of blocking.
//!
//! ## Rules
//! - Items are received in push order.
//! - [`QueueTx::close`] consumes the sender, so `Shutdown` is pushed once and
//!   nothing can follow it.
//! - `close` on a bounded queue waits for room: the shutdown message is never dropped.

use tokio::sync::mpsc;

use crate::error::QueueError;
use crate::failures::FailureEvent;

/// Item carried by the event channel.
#[derive(Debug)]
pub(crate) enum Message {
    Failure(FailureEvent),
    Shutdown,
}

/// Producer half.
pub(crate) enum QueueTx {
    Unbounded(mpsc::UnboundedSender<Message>),
    Bounded(mpsc::Sender<Message>),
}

/// Consumer half, owned by the publisher.
pub(crate) enum QueueRx {
    Unbounded(mpsc::UnboundedReceiver<Message>),
    Bounded(mpsc::Receiver<Message>),
}

/// Creates a channel; `None` means unbounded.
pub(crate) fn channel(limit: Option<usize>) -> (QueueTx, QueueRx) {
    match limit {
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (QueueTx::Unbounded(tx), QueueRx::Unbounded(rx))
        }
        Some(cap) => {
            let (tx, rx) = mpsc::channel(cap.max(1));
            (QueueTx::Bounded(tx), QueueRx::Bounded(rx))
        }
    }
}

impl QueueTx {
    /// Pushes a failure without waiting.
    ///
    /// On error the failure is handed back so the caller can report it.
    pub(crate) fn push(&self, failure: FailureEvent) -> Result<(), (QueueError, FailureEvent)> {
        let msg = Message::Failure(failure);
        let rejected = match self {
            QueueTx::Unbounded(tx) => match tx.send(msg) {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(msg)) => (QueueError::Closed, msg),
            },
            QueueTx::Bounded(tx) => match tx.try_send(msg) {
                Ok(()) => return Ok(()),
                Err(mpsc::error::TrySendError::Full(msg)) => (QueueError::Full, msg),
                Err(mpsc::error::TrySendError::Closed(msg)) => (QueueError::Closed, msg),
            },
        };
        match rejected {
            (err, Message::Failure(failure)) => Err((err, failure)),
            (_, Message::Shutdown) => unreachable!("push only sends failures"),
        }
    }

    /// Pushes the shutdown message. Returns `false` if the publisher is already gone.
    pub(crate) async fn close(self) -> bool {
        match self {
            QueueTx::Unbounded(tx) => tx.send(Message::Shutdown).is_ok(),
            QueueTx::Bounded(tx) => tx.send(Message::Shutdown).await.is_ok(),
        }
    }
}

impl QueueRx {
    /// Waits for the next message; `None` once every sender is gone.
    pub(crate) async fn recv(&mut self) -> Option<Message> {
        match self {
            QueueRx::Unbounded(rx) => rx.recv().await,
            QueueRx::Bounded(rx) => rx.recv().await,
        }
    }
}
