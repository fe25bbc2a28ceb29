use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use bytes::Bytes;
use futures_util::stream::Stream;
use spin::mutex::Mutex;

/// Creates the write and read halves of a part body channel.
///
/// The parser owns the [`BodySink`] and pushes body bytes into it from its
/// chunk-processing loop; the [`Part`](crate::Part) owns the [`BodyStream`]
/// and drains it at its consumer's own pace.
pub(crate) fn channel() -> (BodySink, BodyStream) {
    let shared = Arc::new(Mutex::new(BodyChannel {
        queue: VecDeque::new(),
        error: None,
        closed: false,
        waker: None,
    }));

    let sink = BodySink {
        shared: Arc::clone(&shared),
        finished: false,
    };

    (sink, BodyStream { shared })
}

struct BodyChannel {
    queue: VecDeque<Bytes>,
    error: Option<crate::Error>,
    closed: bool,
    waker: Option<Waker>,
}

/// Write side of a part body channel, held by the parser while the part's
/// body is streaming in.
pub(crate) struct BodySink {
    shared: Arc<Mutex<BodyChannel>>,
    finished: bool,
}

impl BodySink {
    pub(crate) fn push(&mut self, bytes: Bytes) {
        let mut channel = self.shared.lock();
        channel.queue.push_back(bytes);

        if let Some(waker) = channel.waker.take() {
            waker.wake();
        }
    }

    pub(crate) fn close(mut self) {
        self.finish(None);
    }

    pub(crate) fn fail(mut self, error: crate::Error) {
        self.finish(Some(error));
    }

    fn finish(&mut self, error: Option<crate::Error>) {
        if self.finished {
            return;
        }
        self.finished = true;

        let mut channel = self.shared.lock();
        channel.error = error;
        channel.closed = true;

        if let Some(waker) = channel.waker.take() {
            waker.wake();
        }
    }
}

impl Drop for BodySink {
    fn drop(&mut self) {
        if !self.finished {
            #[cfg(feature = "log")]
            log::debug!("body channel abandoned before the part body was complete");

            self.finish(Some(crate::Error::IncompletePartData));
        }
    }
}

/// Read side of a part body channel. Yields body chunks in wire order, then
/// the stored error (if the parser failed the part), then terminates.
pub(crate) struct BodyStream {
    shared: Arc<Mutex<BodyChannel>>,
}

impl Stream for BodyStream {
    type Item = crate::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut channel = self.shared.lock();

        if let Some(bytes) = channel.queue.pop_front() {
            return Poll::Ready(Some(Ok(bytes)));
        }

        if let Some(error) = channel.error.take() {
            return Poll::Ready(Some(Err(error)));
        }

        if channel.closed {
            return Poll::Ready(None);
        }

        channel.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream::StreamExt;

    #[tokio::test]
    async fn test_channel_order_and_close() {
        let (mut sink, mut stream) = channel();

        sink.push(Bytes::from_static(b"hello"));
        sink.push(Bytes::from_static(b" world"));
        sink.close();

        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from_static(b"hello"));
        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from_static(b" world"));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_channel_error_after_pending_bytes() {
        let (mut sink, mut stream) = channel();

        sink.push(Bytes::from_static(b"partial"));
        sink.fail(crate::Error::FileSizeExceeded { limit: 7 });

        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from_static(b"partial"));
        assert_eq!(
            stream.next().await.unwrap().unwrap_err(),
            crate::Error::FileSizeExceeded { limit: 7 }
        );
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_channel_dropped_sink_fails_reader() {
        let (sink, mut stream) = channel();
        drop(sink);

        assert_eq!(
            stream.next().await.unwrap().unwrap_err(),
            crate::Error::IncompletePartData
        );
        assert!(stream.next().await.is_none());
    }
}
