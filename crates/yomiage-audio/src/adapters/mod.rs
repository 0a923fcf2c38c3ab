//! Built-in adapter implementations

pub mod mock;
pub mod noop;

pub use mock::{MockAdapter, MockAdapterConfig, MockFailure};
pub use noop::NoOpAdapter;
