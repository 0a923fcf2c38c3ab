pub mod clock;
pub mod singleflight;

pub use clock::*;
pub use singleflight::*;
