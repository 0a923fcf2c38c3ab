//! Provider seam and tag registry

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::adapters::NoOpAdapter;
use crate::request::{AudioRequest, RequestTag};
use crate::stream::BoxedByteStream;

/// Errors a provider may return from [`AudioAdapter::open`]
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The request's resource or text could not be resolved. Expected and
    /// recoverable; the caller turns it into a user-visible response.
    #[error("audio source not found: {0}")]
    NotFound(String),

    /// The backend malfunctioned. Surfaced as-is, never retried here.
    #[error("provider failure: {0}")]
    Provider(String),

    #[error("unknown provider failure: {0}")]
    Unknown(String),
}

/// A backend capable of opening one byte stream per request.
///
/// Implementations include the external speech-synthesis client and
/// sound-file lookup; the built-in [`NoOpAdapter`] and the test
/// [`MockAdapter`] live in [`crate::adapters`].
///
/// [`MockAdapter`]: crate::adapters::MockAdapter
#[async_trait]
pub trait AudioAdapter: Send + Sync {
    /// Provider identifier, used in logs
    fn name(&self) -> &str;

    /// Open a byte stream for `request`.
    ///
    /// The returned stream is owned by the caller, who must release it when
    /// it is no longer needed.
    async fn open(&self, request: &AudioRequest) -> Result<BoxedByteStream, AdapterError>;
}

impl std::fmt::Debug for dyn AudioAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioAdapter")
            .field("name", &self.name())
            .finish()
    }
}

/// Registry configuration errors, fatal at startup
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no provider registered for tag {0}")]
    UnregisteredProvider(RequestTag),

    #[error("at least one real audio provider must be configured")]
    NoProvidersConfigured,
}

/// Builder for [`AdapterRegistry`]
#[derive(Default)]
pub struct AdapterRegistryBuilder {
    adapters: HashMap<RequestTag, Arc<dyn AudioAdapter>>,
}

impl AdapterRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `adapter` to `tag`, replacing any earlier binding for that tag
    pub fn register(mut self, tag: RequestTag, adapter: Arc<dyn AudioAdapter>) -> Self {
        self.adapters.insert(tag, adapter);
        self
    }

    /// Finish the registry.
    ///
    /// Fails with [`RegistryError::NoProvidersConfigured`] unless at least
    /// one real provider was registered; the implicit no-op adapter never
    /// counts toward that minimum.
    pub fn build(self) -> Result<AdapterRegistry, RegistryError> {
        if self.adapters.keys().all(|tag| *tag == RequestTag::NoOp) {
            return Err(RegistryError::NoProvidersConfigured);
        }
        let mut adapters = self.adapters;
        adapters
            .entry(RequestTag::NoOp)
            .or_insert_with(|| Arc::new(NoOpAdapter::new()));
        Ok(AdapterRegistry { adapters })
    }
}

/// Mapping from request tag to provider.
///
/// The no-op tag is always bound, either to a caller-supplied override or to
/// the built-in [`NoOpAdapter`].
#[derive(Debug)]
pub struct AdapterRegistry {
    adapters: HashMap<RequestTag, Arc<dyn AudioAdapter>>,
}

impl AdapterRegistry {
    pub fn builder() -> AdapterRegistryBuilder {
        AdapterRegistryBuilder::new()
    }

    pub fn resolve(&self, tag: RequestTag) -> Result<&Arc<dyn AudioAdapter>, RegistryError> {
        self.adapters
            .get(&tag)
            .ok_or(RegistryError::UnregisteredProvider(tag))
    }

    pub fn is_registered(&self, tag: RequestTag) -> bool {
        self.adapters.contains_key(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockAdapter;

    #[test]
    fn empty_registry_is_rejected() {
        let err = AdapterRegistry::builder().build().unwrap_err();
        assert!(matches!(err, RegistryError::NoProvidersConfigured));
    }

    #[test]
    fn noop_alone_does_not_count_as_a_provider() {
        let err = AdapterRegistry::builder()
            .register(RequestTag::NoOp, Arc::new(NoOpAdapter::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::NoProvidersConfigured));
    }

    #[test]
    fn noop_is_implicitly_registered() {
        let registry = AdapterRegistry::builder()
            .register(
                RequestTag::Synthesis,
                Arc::new(MockAdapter::with_bytes("tts", vec![1])),
            )
            .build()
            .unwrap();
        assert!(registry.is_registered(RequestTag::NoOp));
        assert!(registry.resolve(RequestTag::NoOp).is_ok());
    }

    #[test]
    fn unregistered_tag_fails_resolution() {
        let registry = AdapterRegistry::builder()
            .register(
                RequestTag::Synthesis,
                Arc::new(MockAdapter::with_bytes("tts", vec![1])),
            )
            .build()
            .unwrap();
        let err = registry.resolve(RequestTag::SoundEffect).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnregisteredProvider(RequestTag::SoundEffect)
        ));
    }

    #[test]
    fn custom_tags_can_be_registered() {
        let chime = RequestTag::Custom("chime");
        let registry = AdapterRegistry::builder()
            .register(chime, Arc::new(MockAdapter::with_bytes("chime", vec![7])))
            .build()
            .unwrap();
        assert!(registry.is_registered(chime));
    }
}
