//! Stub Server
//!
//! One port, two protocols: gRPC calls are answered from `.proto` schemas and
//! gRPC stub records, everything else from HTTP stub rules.
//!
//! # Example
//!
//! ```rust,no_run
//! use stub_server::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     let handler = Handler::new(
//!         Some("stubs/http".as_ref()),
//!         Some("protos".as_ref()),
//!         Some("stubs/grpc".as_ref()),
//!     )?;
//!
//!     Hyper::bind(([127, 0, 0, 1], 50051))
//!         .serve(
//!             handler,
//!             async {
//!                 let _ = tokio::signal::ctrl_c().await;
//!             },
//!             Some(|addr| println!("listening on {addr}")),
//!         )
//!         .await
//! }
//! ```

mod adapters;
pub mod config;
pub mod entities;
pub mod error;
pub mod use_cases;

pub use adapters::gateways::Hyper;
pub use config::Config;
pub use error::ServerError;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::entities::Protocol;
    pub use crate::error::ServerError;
    pub use crate::use_cases::ports::Server;
    pub use crate::use_cases::{run_server, Handler};
    pub use crate::Hyper;

    pub use grpc_stub_server::Dispatcher;
    pub use http_stub_server::Responder;
}
