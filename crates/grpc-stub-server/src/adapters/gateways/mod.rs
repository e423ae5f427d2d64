#[cfg(feature = "tonic")]
mod tonic;

#[cfg(feature = "tonic")]
pub use self::tonic::{Dispatcher, DynamicCodec, DynamicDecoder, DynamicEncoder, Tonic};
