//! No-operation adapter returning a silent placeholder stream

use async_trait::async_trait;

use crate::adapter::{AdapterError, AudioAdapter};
use crate::request::AudioRequest;
use crate::stream::{BoxedByteStream, MemoryStream};

/// Byte length of the silent placeholder returned for no-op requests
pub const PLACEHOLDER_BYTES: usize = 4 * 0x10;

/// Adapter bound to the no-op tag.
///
/// Always succeeds; the stream carries a short run of silence so downstream
/// consumers see a well-formed, finite segment.
#[derive(Debug, Default, Clone)]
pub struct NoOpAdapter;

impl NoOpAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioAdapter for NoOpAdapter {
    fn name(&self) -> &str {
        "no-op"
    }

    async fn open(&self, _request: &AudioRequest) -> Result<BoxedByteStream, AdapterError> {
        Ok(Box::new(MemoryStream::silence(PLACEHOLDER_BYTES)))
    }
}
