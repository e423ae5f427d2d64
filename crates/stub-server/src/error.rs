use std::net::SocketAddr;
use thiserror::Error;

/// Errors that stop the stub server from starting or serving
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("create gRPC handler: {0}")]
    Grpc(#[from] grpc_stub_server::LoadError),

    #[error("create HTTP handler: {0}")]
    Http(#[from] http_stub_server::LoadError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
