use hyper::body::Incoming;
use hyper::server::conn::http2;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use super::Dispatcher;
use crate::error::ServeError;

/// Standalone gRPC listener (HTTP/2 prior knowledge only)
#[derive(Debug, Clone)]
pub struct Tonic {
    addr: SocketAddr,
}

impl Tonic {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn bind(addr: impl Into<SocketAddr>) -> Self {
        Self::new(addr.into())
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// If `on_ready` is provided, it is called with the bound address once the
    /// listener accepts connections.
    pub async fn serve<S, F>(
        &self,
        dispatcher: Dispatcher,
        shutdown: S,
        on_ready: Option<F>,
    ) -> Result<(), ServeError>
    where
        S: Future<Output = ()> + Send,
        F: FnOnce(SocketAddr) + Send,
    {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServeError::Bind {
                addr: self.addr,
                source,
            })?;
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "gRPC stub server listening");

        if let Some(callback) = on_ready {
            callback(addr);
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to accept connection");
                            continue;
                        }
                    };
                    let dispatcher = dispatcher.clone();
                    let io = TokioIo::new(stream);

                    tokio::spawn(async move {
                        let service = service_fn(move |request: Request<Incoming>| {
                            let dispatcher = dispatcher.clone();
                            async move { Ok::<_, Infallible>(dispatcher.call(request).await) }
                        });

                        if let Err(err) = http2::Builder::new(TokioExecutor::new())
                            .serve_connection(io, service)
                            .await
                        {
                            tracing::debug!(%peer, error = %err, "connection closed");
                        }
                    });
                }
                _ = &mut shutdown => {
                    tracing::info!("gRPC stub server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

impl Default for Tonic {
    fn default() -> Self {
        Self::new(([127, 0, 0, 1], 0).into())
    }
}
