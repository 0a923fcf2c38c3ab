//! Byte stream abstraction shared by adapters, dispatcher, and assembler

use std::fmt::Debug;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// An opened, possibly still-filling sequence of audio bytes.
///
/// Ownership follows the hand-off chain: the dispatcher owns each stream only
/// until assembly or cleanup, the assembled composite owns its segments, and
/// the caller owns whatever `submit` returns.
pub trait ByteStream: AsyncRead + Send + Unpin + Debug {
    /// Release the underlying resource.
    ///
    /// Idempotent: calls after the first are no-ops. After release the
    /// stream reads as end-of-stream.
    fn release(&mut self) -> io::Result<()>;
}

/// Owned, type-erased byte stream
pub type BoxedByteStream = Box<dyn ByteStream>;

/// In-memory stream over a fixed buffer.
///
/// Backs the no-op placeholder and the assembler's padding segments, and
/// doubles as the canned-bytes stream for tests.
#[derive(Debug)]
pub struct MemoryStream {
    data: Vec<u8>,
    pos: usize,
    released: bool,
}

impl MemoryStream {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            released: false,
        }
    }

    /// A stream of `len` zeroed bytes, the neutral padding content
    pub fn silence(len: usize) -> Self {
        Self::new(vec![0u8; len])
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl AsyncRead for MemoryStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.released || this.pos >= this.data.len() {
            return Poll::Ready(Ok(()));
        }
        let n = buf.remaining().min(this.data.len() - this.pos);
        buf.put_slice(&this.data[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

impl ByteStream for MemoryStream {
    fn release(&mut self) -> io::Result<()> {
        if !self.released {
            self.released = true;
            self.data = Vec::new();
        }
        Ok(())
    }
}
