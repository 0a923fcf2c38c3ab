//! Ordered stream concatenation with sink-compatibility padding

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, ReadBuf};
use tracing::warn;

use crate::stream::{BoxedByteStream, ByteStream, MemoryStream};

/// Padding sizes demanded by the downstream real-time sink.
///
/// The sink cannot transition between two independently produced streams of
/// differing internal framing without a neutral gap in between, and cannot
/// finalize a composite whose last segment came from a finite resource-backed
/// source. Both paddings are compatibility shims with no semantic audio
/// content, kept as configuration so they can go away once the sink lifts
/// those constraints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Zeroed bytes inserted between every pair of adjacent streams
    pub gap_padding_bytes: usize,
    /// Zeroed bytes appended after the final stream
    pub tail_padding_bytes: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            gap_padding_bytes: 4 * 0xff,
            tail_padding_bytes: 4 * 0x10,
        }
    }
}

/// Concatenates already-opened streams into one composite stream
#[derive(Debug, Clone, Default)]
pub struct StreamAssembler {
    config: AssemblerConfig,
}

impl StreamAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> AssemblerConfig {
        self.config
    }

    /// Concatenate `streams` in order.
    ///
    /// Output byte order is `s0, gap, s1, gap, ..., s(n-1), tail`: a gap
    /// padding segment between every adjacent pair, one tail padding segment
    /// after the last stream. Padding is inserted even between two streams of
    /// the same provider type. The assembler never inspects stream contents
    /// and cannot fail; read errors during consumption belong to the caller.
    pub fn assemble(&self, streams: Vec<BoxedByteStream>) -> BoxedByteStream {
        debug_assert!(!streams.is_empty());
        let last = streams.len().saturating_sub(1);
        let mut segments: VecDeque<BoxedByteStream> =
            VecDeque::with_capacity(streams.len() * 2);
        for (index, stream) in streams.into_iter().enumerate() {
            segments.push_back(stream);
            if index < last {
                segments.push_back(Box::new(MemoryStream::silence(
                    self.config.gap_padding_bytes,
                )));
            }
        }
        segments.push_back(Box::new(MemoryStream::silence(
            self.config.tail_padding_bytes,
        )));
        Box::new(AssembledStream { segments })
    }
}

/// Composite stream draining its segments in input order.
///
/// Each exhausted segment is released as the read position moves past it;
/// releasing the composite releases every remaining segment.
#[derive(Debug)]
pub struct AssembledStream {
    segments: VecDeque<BoxedByteStream>,
}

impl AsyncRead for AssembledStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        // a zero-capacity poll cannot fill anything; only a 0-byte read with
        // capacity available marks the end of a segment
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        loop {
            let Some(front) = this.segments.front_mut() else {
                return Poll::Ready(Ok(()));
            };
            let before = buf.filled().len();
            ready!(Pin::new(front).poll_read(cx, buf))?;
            if buf.filled().len() > before {
                return Poll::Ready(Ok(()));
            }
            // segment exhausted; release it and move on
            if let Some(mut done) = this.segments.pop_front() {
                if let Err(err) = done.release() {
                    warn!("segment release failed during playback: {err}");
                }
            }
        }
    }
}

impl ByteStream for AssembledStream {
    fn release(&mut self) -> io::Result<()> {
        while let Some(mut segment) = self.segments.pop_front() {
            if let Err(err) = segment.release() {
                warn!("segment release failed during composite release: {err}");
            }
        }
        Ok(())
    }
}
