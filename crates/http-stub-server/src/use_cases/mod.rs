mod load_stubs;
pub mod ports;

pub use load_stubs::{load_stubs, HeaderValues, JsonResponse, JsonStub};
