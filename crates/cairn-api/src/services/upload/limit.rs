//! Byte ceiling for incoming upload streams.

use bytes::Bytes;
use cairn_storage::ByteStream;
use futures::Stream;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Observes whether a [`SizeLimitedStream`] crossed its ceiling. Stays
/// readable after the stream itself has been consumed by a storage backend.
#[derive(Clone, Debug, Default)]
pub struct LimitProbe {
    exceeded: Arc<AtomicBool>,
}

impl LimitProbe {
    pub fn exceeded(&self) -> bool {
        self.exceeded.load(Ordering::SeqCst)
    }

    fn mark_exceeded(&self) {
        self.exceeded.store(true, Ordering::SeqCst);
    }
}

/// Passes chunks through until more than `max_bytes` have been seen, then
/// yields one error and ends. A storage writer pulling from it aborts on
/// that error, so no oversized object is completed.
pub struct SizeLimitedStream<'a> {
    inner: ByteStream<'a>,
    max_bytes: u64,
    seen: u64,
    done: bool,
    probe: LimitProbe,
}

impl<'a> SizeLimitedStream<'a> {
    pub fn new(inner: ByteStream<'a>, max_bytes: u64) -> (Self, LimitProbe) {
        let probe = LimitProbe::default();
        let stream = Self {
            inner,
            max_bytes,
            seen: 0,
            done: false,
            probe: probe.clone(),
        };
        (stream, probe)
    }

    pub fn into_byte_stream(self) -> ByteStream<'a> {
        Box::pin(self)
    }
}

impl Stream for SizeLimitedStream<'_> {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.seen += chunk.len() as u64;
                if self.seen > self.max_bytes {
                    self.done = true;
                    self.probe.mark_exceeded();
                    return Poll::Ready(Some(Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("upload exceeds {} bytes", self.max_bytes),
                    ))));
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                self.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
