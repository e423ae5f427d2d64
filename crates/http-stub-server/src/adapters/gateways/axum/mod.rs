mod responder;
mod server;

pub use responder::Responder;
pub use server::Axum;
