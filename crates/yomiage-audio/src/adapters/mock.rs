//! Configurable mock adapter for exercising the dispatcher

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, ReadBuf};

use crate::adapter::{AdapterError, AudioAdapter};
use crate::request::AudioRequest;
use crate::stream::{BoxedByteStream, ByteStream, MemoryStream};

/// Configuration for mock opens
#[derive(Debug, Clone)]
pub struct MockAdapterConfig {
    /// Bytes carried by every successful stream
    pub bytes: Vec<u8>,

    /// Fail every open with this kind instead of returning a stream
    pub fail_with: Option<MockFailure>,

    /// Yield to the scheduler this many times before settling, to scramble
    /// completion order across concurrent opens
    pub settle_after_yields: usize,
}

impl Default for MockAdapterConfig {
    fn default() -> Self {
        Self {
            bytes: vec![0xAA],
            fail_with: None,
            settle_after_yields: 0,
        }
    }
}

/// Failure kinds the mock can simulate
#[derive(Debug, Clone, Copy)]
pub enum MockFailure {
    NotFound,
    Provider,
    Unknown,
}

#[derive(Debug, Default)]
struct MockState {
    opens: usize,
    release_counters: Vec<Arc<AtomicUsize>>,
}

/// Mock provider whose opens and per-stream release calls are observable
/// from the test
#[derive(Debug)]
pub struct MockAdapter {
    name: String,
    config: MockAdapterConfig,
    state: Arc<Mutex<MockState>>,
}

impl MockAdapter {
    pub fn new(name: impl Into<String>, config: MockAdapterConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Adapter that succeeds with the given canned bytes
    pub fn with_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(
            name,
            MockAdapterConfig {
                bytes,
                ..Default::default()
            },
        )
    }

    /// Adapter that fails every open with `kind`
    pub fn failing(name: impl Into<String>, kind: MockFailure) -> Self {
        Self::new(
            name,
            MockAdapterConfig {
                fail_with: Some(kind),
                ..Default::default()
            },
        )
    }

    /// Delay settling by `yields` scheduler turns
    pub fn settling_after(mut self, yields: usize) -> Self {
        self.config.settle_after_yields = yields;
        self
    }

    /// Number of opens attempted so far
    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    /// Release call counts of the streams opened so far, in open order
    pub fn release_calls(&self) -> Vec<usize> {
        self.state
            .lock()
            .unwrap()
            .release_counters
            .iter()
            .map(|counter| counter.load(Ordering::SeqCst))
            .collect()
    }
}

#[async_trait]
impl AudioAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self, _request: &AudioRequest) -> Result<BoxedByteStream, AdapterError> {
        for _ in 0..self.config.settle_after_yields {
            tokio::task::yield_now().await;
        }

        self.state.lock().unwrap().opens += 1;

        if let Some(kind) = self.config.fail_with {
            return Err(match kind {
                MockFailure::NotFound => {
                    AdapterError::NotFound(format!("{}: simulated missing resource", self.name))
                }
                MockFailure::Provider => {
                    AdapterError::Provider(format!("{}: simulated backend failure", self.name))
                }
                MockFailure::Unknown => {
                    AdapterError::Unknown(format!("{}: simulated unknown failure", self.name))
                }
            });
        }

        let counter = Arc::new(AtomicUsize::new(0));
        self.state
            .lock()
            .unwrap()
            .release_counters
            .push(counter.clone());
        Ok(Box::new(TrackedStream {
            inner: MemoryStream::new(self.config.bytes.clone()),
            release_calls: counter,
        }))
    }
}

/// Stream wrapper counting every release call
#[derive(Debug)]
struct TrackedStream {
    inner: MemoryStream,
    release_calls: Arc<AtomicUsize>,
}

impl AsyncRead for TrackedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl ByteStream for TrackedStream {
    fn release(&mut self) -> io::Result<()> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.release()
    }
}
