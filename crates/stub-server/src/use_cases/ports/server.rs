use async_trait::async_trait;
use std::future::Future;
use std::net::SocketAddr;

use crate::error::ServerError;
use crate::use_cases::Handler;

/// Trait for network listeners that feed requests to a [`Handler`]
#[async_trait]
pub trait Server: Send + Sync + Clone {
    /// Accept connections until `shutdown` resolves.
    ///
    /// If `on_ready` is provided, it will be called with the actual server address
    /// once the server is ready to accept connections.
    async fn serve<S, F>(
        &self,
        handler: Handler,
        shutdown: S,
        on_ready: Option<F>,
    ) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send + 'static,
        F: FnOnce(SocketAddr) + Send + 'static;
}
