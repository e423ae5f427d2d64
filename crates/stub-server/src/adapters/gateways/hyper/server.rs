use async_trait::async_trait;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::error::ServerError;
use crate::use_cases::ports::Server;
use crate::use_cases::Handler;

/// How long open connections get to finish after shutdown is requested
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Listener serving HTTP/1.1 and cleartext HTTP/2 on one port
#[derive(Debug, Clone)]
pub struct Hyper {
    addr: SocketAddr,
}

impl Hyper {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    pub fn bind(addr: impl Into<SocketAddr>) -> Self {
        Self::new(addr.into())
    }
}

impl Default for Hyper {
    fn default() -> Self {
        Self::new(([127, 0, 0, 1], 0).into())
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    handler: Handler,
    mut stop: watch::Receiver<bool>,
) {
    let service = service_fn(move |request: Request<Incoming>| {
        let handler = handler.clone();
        async move { Ok::<_, Infallible>(handler.handle(request).await) }
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    let connection = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let mut draining = false;
    loop {
        tokio::select! {
            result = connection.as_mut() => {
                if let Err(err) = result {
                    tracing::debug!(%peer, error = %err, "connection closed");
                }
                break;
            }
            _ = stop.changed(), if !draining => {
                draining = true;
                connection.as_mut().graceful_shutdown();
            }
        }
    }
}

#[async_trait]
impl Server for Hyper {
    async fn serve<S, F>(
        &self,
        handler: Handler,
        shutdown: S,
        on_ready: Option<F>,
    ) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send + 'static,
        F: FnOnce(SocketAddr) + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr,
                source,
            })?;
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "Listening");

        if let Some(callback) = on_ready {
            callback(addr);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            tokio::spawn(serve_connection(stream, peer, handler.clone(), stop_rx.clone()));
                        }
                        Err(err) => tracing::warn!(error = %err, "failed to accept connection"),
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutting down server");
                    break;
                }
            }
        }

        drop(listener);
        drop(stop_rx);
        let _ = stop_tx.send(true);
        if tokio::time::timeout(GRACE_PERIOD, stop_tx.closed())
            .await
            .is_err()
        {
            tracing::warn!("connections still open after grace period");
        }

        Ok(())
    }
}
