pub mod message;
mod method;
mod output;
mod registry;

pub use method::{CallShape, MethodPath};
pub use output::{Output, ProtoStub, StatusCode, Stream};
pub use registry::DescriptorRegistry;
