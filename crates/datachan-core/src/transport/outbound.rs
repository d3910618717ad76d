//! Fire-and-forget outbound queue.
//!
//! Every outbound message from a manager and its channels goes through one
//! queue drained by a single writer task, so the transport sees messages in
//! submission order. Callers get a [`SendCompletion`] they may await for the
//! transport result or simply drop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::transport::Endpoint;

struct OutboundItem {
    stream_id: u16,
    ppid: u16,
    data: Bytes,
    done: oneshot::Sender<Result<()>>,
}

#[derive(Clone)]
enum QueueTx {
    Unbounded(mpsc::UnboundedSender<OutboundItem>),
    Bounded(mpsc::Sender<OutboundItem>),
}

enum QueueRx {
    Unbounded(mpsc::UnboundedReceiver<OutboundItem>),
    Bounded(mpsc::Receiver<OutboundItem>),
}

impl QueueRx {
    async fn recv(&mut self) -> Option<OutboundItem> {
        match self {
            QueueRx::Unbounded(rx) => rx.recv().await,
            QueueRx::Bounded(rx) => rx.recv().await,
        }
    }
}

/// Handle for submitting messages to the writer task.
///
/// Cloned into every channel handle. The writer task exits once the last
/// clone is dropped and the queue is drained.
#[derive(Clone)]
pub(crate) struct Outbound {
    tx: QueueTx,
}

impl Outbound {
    /// Spawn the writer task for `endpoint`.
    ///
    /// `capacity` of `None` gives an unbounded queue.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn spawn<E: Endpoint>(endpoint: Arc<E>, capacity: Option<usize>) -> Self {
        let (tx, rx) = match capacity {
            Some(cap) => {
                let (tx, rx) = mpsc::channel(cap.max(1));
                (QueueTx::Bounded(tx), QueueRx::Bounded(rx))
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (QueueTx::Unbounded(tx), QueueRx::Unbounded(rx))
            }
        };

        tokio::spawn(write_loop(endpoint, rx));

        Self { tx }
    }

    /// Queue one message without waiting for it to be written.
    ///
    /// A rejected enqueue resolves the completion with the error.
    pub(crate) fn submit(&self, stream_id: u16, ppid: u16, data: Bytes) -> SendCompletion {
        match self.try_submit(stream_id, ppid, data) {
            Ok(completion) => completion,
            Err(err) => SendCompletion::failed(err),
        }
    }

    /// Queue one message, failing immediately if the queue is full or the
    /// writer is gone.
    pub(crate) fn try_submit(
        &self,
        stream_id: u16,
        ppid: u16,
        data: Bytes,
    ) -> Result<SendCompletion> {
        let (done, rx) = oneshot::channel();
        let item = OutboundItem {
            stream_id,
            ppid,
            data,
            done,
        };

        let rejected = match &self.tx {
            QueueTx::Unbounded(tx) => tx.send(item).err().map(|_| Error::ConnectionClosed),
            QueueTx::Bounded(tx) => tx.try_send(item).err().map(|e| match e {
                mpsc::error::TrySendError::Full(_) => Error::QueueFull,
                mpsc::error::TrySendError::Closed(_) => Error::ConnectionClosed,
            }),
        };

        match rejected {
            Some(err) => {
                debug!(stream_id, ppid, error = %err, "Outbound message rejected");
                Err(err)
            }
            None => Ok(SendCompletion { rx }),
        }
    }
}

async fn write_loop<E: Endpoint>(endpoint: Arc<E>, mut rx: QueueRx) {
    while let Some(item) = rx.recv().await {
        let len = item.data.len();
        let result = endpoint.send(item.stream_id, item.ppid, item.data).await;
        match &result {
            Ok(()) => trace!(stream_id = item.stream_id, ppid = item.ppid, len, "Sent"),
            Err(e) => warn!(
                stream_id = item.stream_id,
                ppid = item.ppid,
                error = %e,
                "Transport send failed"
            ),
        }
        // Nobody listening is the common fire-and-forget case
        let _ = item.done.send(result);
    }
    debug!("Outbound writer stopped");
}

/// Completion signal for a queued outbound message.
///
/// Resolves to the transport's result once the writer task has handed the
/// message to the endpoint. Dropping it does not cancel the send.
#[derive(Debug)]
pub struct SendCompletion {
    rx: oneshot::Receiver<Result<()>>,
}

impl SendCompletion {
    fn failed(err: Error) -> Self {
        let (done, rx) = oneshot::channel();
        let _ = done.send(Err(err));
        Self { rx }
    }
}

impl Future for SendCompletion {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(Error::ConnectionClosed)))
    }
}
