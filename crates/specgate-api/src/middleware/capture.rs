//! # Response Capture
//!
//! [`TeeBody`] wraps an outgoing response body. Every frame is passed on to
//! the client as soon as the inner body yields it, unmodified; data frames
//! are also copied into a buffer. Once the body has ended, the completion
//! callback receives the whole copy exactly once.
//!
//! The callback never runs inside the poll that yields a frame. When the
//! inner body reports `is_end_stream()` right after a data frame (full
//! bodies end that way), the frame is returned first and the callback runs
//! on the next poll or when the server drops the body, whichever comes
//! first. A body that errors or is dropped before ending never invokes the
//! callback.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use http_body::{Body as HttpBody, Frame, SizeHint};

/// Callback run with the captured body.
pub type OnComplete = Box<dyn FnOnce(Bytes) + Send + 'static>;

pub struct TeeBody {
    inner: Body,
    buffer: BytesMut,
    on_complete: Option<OnComplete>,
    ended: bool,
}

impl std::fmt::Debug for TeeBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeeBody")
            .field("buffered", &self.buffer.len())
            .field("completed", &self.on_complete.is_none())
            .finish()
    }
}

impl TeeBody {
    pub fn new(inner: Body, on_complete: OnComplete) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            on_complete: Some(on_complete),
            ended: false,
        }
    }

    fn finish(&mut self) {
        if let Some(callback) = self.on_complete.take() {
            callback(std::mem::take(&mut self.buffer).freeze());
        }
    }
}

impl HttpBody for TeeBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        if this.ended {
            this.finish();
            return Poll::Ready(None);
        }
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.buffer.extend_from_slice(data);
                }
                this.ended = this.inner.is_end_stream();
            }
            Poll::Ready(None) => {
                this.ended = true;
                this.finish();
            }
            Poll::Ready(Some(Err(err))) => {
                tracing::debug!(error = %err, "response body failed, capture discarded");
                this.on_complete = None;
            }
            Poll::Pending => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.ended || self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for TeeBody {
    fn drop(&mut self) {
        if self.ended {
            self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<Bytes>>>, OnComplete) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: OnComplete = Box::new(move |bytes| sink.lock().unwrap().push(bytes));
        (seen, callback)
    }

    #[tokio::test]
    async fn full_body_passes_through_and_completes_once() {
        let (seen, callback) = recorder();
        let tee = TeeBody::new(Body::from("{\"ok\":true}"), callback);
        let out = Body::new(tee).collect().await.unwrap().to_bytes();
        assert_eq!(&out[..], b"{\"ok\":true}");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(&seen[0][..], b"{\"ok\":true}");
    }

    /// Yields its chunks one frame at a time and only reports the end of
    /// the stream after returning `None`.
    struct Chunked(VecDeque<Bytes>);

    impl HttpBody for Chunked {
        type Data = Bytes;
        type Error = std::convert::Infallible;

        fn poll_frame(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            Poll::Ready(self.0.pop_front().map(|chunk| Ok(Frame::data(chunk))))
        }
    }

    #[tokio::test]
    async fn streamed_chunks_are_concatenated() {
        let (seen, callback) = recorder();
        let chunks = ["[1,", "2,", "3]"].into_iter().map(Bytes::from).collect();
        let inner = Body::new(Chunked(chunks));
        let out = Body::new(TeeBody::new(inner, callback))
            .collect()
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(&out[..], b"[1,2,3]");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(&seen[0][..], b"[1,2,3]");
    }

    #[tokio::test]
    async fn empty_body_completes_with_empty_capture() {
        let (seen, callback) = recorder();
        let out = Body::new(TeeBody::new(Body::empty(), callback))
            .collect()
            .await
            .unwrap()
            .to_bytes();
        assert!(out.is_empty());
        assert!(seen.lock().unwrap().iter().all(|b| b.is_empty()));
    }

    #[tokio::test]
    async fn last_frame_is_yielded_before_the_callback_runs() {
        let (seen, callback) = recorder();
        let mut tee = TeeBody::new(Body::from("{\"ok\":true}"), callback);

        let frame = tee.frame().await.unwrap().unwrap();
        assert_eq!(&frame.into_data().unwrap()[..], b"{\"ok\":true}");
        assert!(tee.is_end_stream());
        assert!(seen.lock().unwrap().is_empty());

        drop(tee);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(&seen[0][..], b"{\"ok\":true}");
    }

    #[tokio::test]
    async fn ended_body_completes_on_next_poll() {
        let (seen, callback) = recorder();
        let mut tee = TeeBody::new(Body::from("done"), callback);
        assert!(tee.frame().await.is_some());
        assert!(tee.frame().await.is_none());
        assert_eq!(seen.lock().unwrap().len(), 1);

        drop(tee);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn body_dropped_midway_never_completes() {
        let (seen, callback) = recorder();
        let chunks = ["a", "b"].into_iter().map(Bytes::from).collect();
        let mut tee = TeeBody::new(Body::new(Chunked(chunks)), callback);
        assert!(tee.frame().await.is_some());
        drop(tee);
        assert!(seen.lock().unwrap().is_empty());
    }
}
