//! Concurrent audio request orchestration for yomiage
//!
//! A caller submits an ordered batch of heterogeneous audio requests
//! (synthesized speech, prerecorded sound effects, no-op placeholders). The
//! dispatcher resolves each request against its provider concurrently,
//! preserves batch order regardless of completion order, and either hands the
//! opened streams to the assembler or releases every survivor when any single
//! open fails. The assembler concatenates the streams with the padding
//! segments the downstream real-time sink requires.
//!
//! Backend providers (speech-synthesis clients, sound-file lookup) live
//! outside this crate and plug in through the [`AudioAdapter`] trait.

pub mod adapter;
pub mod adapters;
pub mod assembler;
pub mod dispatcher;
pub mod request;
pub mod stream;

pub use adapter::{
    AdapterError, AdapterRegistry, AdapterRegistryBuilder, AudioAdapter, RegistryError,
};
pub use assembler::{AssemblerConfig, StreamAssembler};
pub use dispatcher::{DispatchError, RequestDispatcher};
pub use request::{AudioRequest, RequestError, RequestPayload, RequestTag};
pub use stream::{BoxedByteStream, ByteStream, MemoryStream};
