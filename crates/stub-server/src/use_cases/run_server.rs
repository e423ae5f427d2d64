use std::future::Future;
use std::net::SocketAddr;

use super::ports::Server;
use super::Handler;
use crate::config::Config;
use crate::error::ServerError;

/// Load every configured stub set, then serve until `shutdown` resolves.
///
/// Loading finishes before the listener binds, so no request ever sees a
/// partially loaded table.
pub async fn run_server<S, Sh, F>(
    server: &S,
    config: &Config,
    shutdown: Sh,
    on_ready: Option<F>,
) -> Result<(), ServerError>
where
    S: Server,
    Sh: Future<Output = ()> + Send + 'static,
    F: FnOnce(SocketAddr) + Send + 'static,
{
    let handler = Handler::from_config(config)?;
    tracing::info!(
        grpc = handler.has_rpc(),
        http = handler.has_http(),
        "stub handlers ready"
    );
    if !handler.has_rpc() && !handler.has_http() {
        tracing::warn!("no stub directories configured, every request will get 501");
    }

    server.serve(handler, shutdown, on_ready).await
}
