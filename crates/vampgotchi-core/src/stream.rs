// ── Reactive state stream ──
//
// Published snapshots as a `Stream`, for consumers that push state out
// (the console's event feed) instead of polling `snapshot()`.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::SystemState;

/// A subscription to coordinator state.
///
/// Yields the state current at first poll, then every later publication.
/// Bursts coalesce: a slow reader only sees the newest state. Ends when the
/// coordinator is dropped.
pub struct StateStream {
    inner: WatchStream<Arc<SystemState>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<SystemState>>) -> Self {
        Self {
            inner: WatchStream::new(receiver),
        }
    }
}

impl Stream for StateStream {
    type Item = Arc<SystemState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
