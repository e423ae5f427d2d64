mod codec;
mod dispatcher;
mod handlers;
mod reflection;
mod server;

pub use codec::{DynamicCodec, DynamicDecoder, DynamicEncoder};
pub use dispatcher::Dispatcher;
pub use server::Tonic;
