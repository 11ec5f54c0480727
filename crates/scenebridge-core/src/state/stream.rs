// ── State change stream ──
//
// `Stream` adapter over the store's change broadcast, for consumers that
// prefer `StreamExt` combinators over a raw receiver.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

use super::memory::StateChange;

/// Yields every applied write. A consumer that falls behind skips the
/// missed changes (logged) instead of terminating.
pub struct StateChangeStream {
    inner: BroadcastStream<Arc<StateChange>>,
}

impl StateChangeStream {
    pub(crate) fn new(receiver: broadcast::Receiver<Arc<StateChange>>) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
        }
    }
}

impl Stream for StateChangeStream {
    type Item = Arc<StateChange>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(change))) => return Poll::Ready(Some(change)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "state change stream lagged");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
