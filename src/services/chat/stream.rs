//! Chat Event Streaming
//!
//! The streaming form of a turn runs on a spawned task that writes
//! `ChatStreamEvent`s into a bounded channel. The consumer holds a
//! `ChatStream`; dropping it, or calling `cancel()`, cancels the producer at
//! its next event boundary.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tokio_util::sync::{CancellationToken, DropGuard};

use paper_desk_core::ChatStreamEvent;

use crate::utils::error::{AppError, AppResult};

/// Consumer side of a streaming turn.
///
/// After cancellation the producer stops without emitting a terminal event;
/// `recv` drains whatever was already buffered and then returns `None`.
pub struct ChatStream {
    rx: mpsc::Receiver<ChatStreamEvent>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl ChatStream {
    pub(crate) fn new(rx: mpsc::Receiver<ChatStreamEvent>, cancel: CancellationToken) -> Self {
        let guard = cancel.clone().drop_guard();
        Self {
            rx,
            cancel,
            _guard: guard,
        }
    }

    /// Receive the next event, or `None` once the producer has finished.
    pub async fn recv(&mut self) -> Option<ChatStreamEvent> {
        self.rx.recv().await
    }

    /// Stop the producer at its next event boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Convert into a `Stream` of events. Dropping the stream cancels the turn.
    pub fn into_stream(self) -> ChatEventStream {
        let ChatStream { rx, _guard, .. } = self;
        ChatEventStream {
            inner: ReceiverStream::new(rx),
            _guard,
        }
    }
}

/// `Stream` adapter returned by [`ChatStream::into_stream`].
pub struct ChatEventStream {
    inner: ReceiverStream<ChatStreamEvent>,
    _guard: DropGuard,
}

impl Stream for ChatEventStream {
    type Item = ChatStreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

/// Producer side: sends events until the consumer goes away or cancels.
pub(crate) struct EventSink {
    tx: mpsc::Sender<ChatStreamEvent>,
    cancel: CancellationToken,
}

impl EventSink {
    pub(crate) fn new(tx: mpsc::Sender<ChatStreamEvent>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Send one event, waiting for buffer space.
    pub(crate) async fn emit(&self, event: ChatStreamEvent) -> AppResult<()> {
        let kind = event.kind();
        until_cancelled(&self.cancel, self.tx.send(event))
            .await?
            .map_err(|_| {
                self.cancel.cancel();
                AppError::cancelled(format!("stream consumer dropped before '{}' event", kind))
            })
    }
}

/// Run `fut` unless `cancel` fires first.
pub(crate) async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> AppResult<F::Output> {
    if cancel.is_cancelled() {
        return Err(AppError::cancelled("turn cancelled"));
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::cancelled("turn cancelled")),
        output = fut => Ok(output),
    }
}
