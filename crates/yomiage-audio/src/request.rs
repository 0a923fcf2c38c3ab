//! Validated audio request model

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Tag identifying which provider a request is routed to.
///
/// `Synthesis`, `SoundEffect`, and `NoOp` are the built-in set; out-of-tree
/// providers extend it through `Custom` at registration time rather than by
/// editing this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestTag {
    /// Synthesized speech from text
    Synthesis,
    /// Prerecorded sound effect looked up by resource name
    SoundEffect,
    /// Deliberate silence placeholder
    NoOp,
    /// Registration-time extension point
    Custom(&'static str),
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestTag::Synthesis => f.write_str("synthesis"),
            RequestTag::SoundEffect => f.write_str("sound-effect"),
            RequestTag::NoOp => f.write_str("no-op"),
            RequestTag::Custom(name) => f.write_str(name),
        }
    }
}

/// Errors raised when constructing an [`AudioRequest`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("request text must not be empty")]
    EmptyText,

    #[error("request resource must not be empty")]
    EmptyResource,
}

/// Payload variants of a request; exactly one shape is meaningful per tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPayload {
    /// Text to synthesize
    Text(String),
    /// Name of a prerecorded resource
    Resource(String),
    /// No payload
    Empty,
}

/// A single sub-request of an audio batch.
///
/// Validated at construction, immutable afterwards.
#[derive(Debug, Clone)]
pub struct AudioRequest {
    tag: RequestTag,
    payload: RequestPayload,
    options: HashMap<String, String>,
}

impl AudioRequest {
    /// Speech synthesis from `text`
    pub fn synthesis(text: impl Into<String>) -> Result<Self, RequestError> {
        Self::custom(RequestTag::Synthesis, RequestPayload::Text(text.into()))
    }

    /// Prerecorded sound effect named `resource`
    pub fn sound_effect(resource: impl Into<String>) -> Result<Self, RequestError> {
        Self::custom(
            RequestTag::SoundEffect,
            RequestPayload::Resource(resource.into()),
        )
    }

    /// Silence placeholder
    pub fn no_op() -> Self {
        Self {
            tag: RequestTag::NoOp,
            payload: RequestPayload::Empty,
            options: HashMap::new(),
        }
    }

    /// Request for an arbitrary registered tag
    pub fn custom(tag: RequestTag, payload: RequestPayload) -> Result<Self, RequestError> {
        match &payload {
            RequestPayload::Text(text) if text.is_empty() => return Err(RequestError::EmptyText),
            RequestPayload::Resource(resource) if resource.is_empty() => {
                return Err(RequestError::EmptyResource)
            }
            _ => {}
        }
        Ok(Self {
            tag,
            payload,
            options: HashMap::new(),
        })
    }

    /// Attach a provider-specific option (voice, pitch, ...)
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self) -> RequestTag {
        self.tag
    }

    pub fn payload(&self) -> &RequestPayload {
        &self.payload
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            RequestPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn resource(&self) -> Option<&str> {
        match &self.payload {
            RequestPayload::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn options(&self) -> &HashMap<String, String> {
        &self.options
    }

    pub fn is_no_op(&self) -> bool {
        self.tag == RequestTag::NoOp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesis_carries_text() {
        let request = AudioRequest::synthesis("hello").unwrap();
        assert_eq!(request.tag(), RequestTag::Synthesis);
        assert_eq!(request.text(), Some("hello"));
        assert_eq!(request.resource(), None);
    }

    #[test]
    fn sound_effect_carries_resource() {
        let request = AudioRequest::sound_effect("ding.wav").unwrap();
        assert_eq!(request.tag(), RequestTag::SoundEffect);
        assert_eq!(request.resource(), Some("ding.wav"));
        assert_eq!(request.text(), None);
    }

    #[test]
    fn empty_text_is_rejected_at_construction() {
        assert_eq!(
            AudioRequest::synthesis("").unwrap_err(),
            RequestError::EmptyText
        );
    }

    #[test]
    fn empty_resource_is_rejected_at_construction() {
        assert_eq!(
            AudioRequest::sound_effect("").unwrap_err(),
            RequestError::EmptyResource
        );
    }

    #[test]
    fn no_op_has_no_payload() {
        let request = AudioRequest::no_op();
        assert!(request.is_no_op());
        assert_eq!(*request.payload(), RequestPayload::Empty);
    }

    #[test]
    fn options_are_attached() {
        let request = AudioRequest::synthesis("hello")
            .unwrap()
            .with_option("voice", "default");
        assert_eq!(request.options().get("voice").map(String::as_str), Some("default"));
    }

    #[test]
    fn custom_tag_displays_its_name() {
        assert_eq!(RequestTag::Custom("chime").to_string(), "chime");
        assert_eq!(RequestTag::Synthesis.to_string(), "synthesis");
    }
}
