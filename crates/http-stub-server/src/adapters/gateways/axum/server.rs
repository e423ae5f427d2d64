use std::future::Future;
use std::net::SocketAddr;

use super::Responder;
use crate::error::ServeError;

/// Standalone HTTP/1.1 listener for a [`Responder`]
#[derive(Debug, Clone)]
pub struct Axum {
    addr: SocketAddr,
}

impl Axum {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn bind(addr: impl Into<SocketAddr>) -> Self {
        Self::new(addr.into())
    }

    /// Serve until `shutdown` resolves, then drain open connections.
    ///
    /// If `on_ready` is provided, it will be called with the actual server address
    /// once the server is ready to accept connections.
    pub async fn serve<S, F>(
        &self,
        responder: Responder,
        shutdown: S,
        on_ready: Option<F>,
    ) -> Result<(), ServeError>
    where
        S: Future<Output = ()> + Send + 'static,
        F: FnOnce(SocketAddr) + Send,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServeError::Bind {
                addr: self.addr,
                source,
            })?;
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "HTTP stub server listening");

        if let Some(callback) = on_ready {
            callback(addr);
        }

        axum::serve(listener, responder.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP stub server stopped");
        Ok(())
    }
}

impl Default for Axum {
    fn default() -> Self {
        Self::new(([127, 0, 0, 1], 0).into())
    }
}
