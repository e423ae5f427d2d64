mod handler;
pub mod ports;
mod run_server;

pub use handler::Handler;
pub use run_server::run_server;
