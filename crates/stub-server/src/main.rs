use clap::Parser;
use std::net::SocketAddr;
use std::process::ExitCode;
use stub_server::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let server = Hyper::new(config.address);
    let on_ready = None::<fn(SocketAddr)>;

    match run_server(&server, &config, shutdown, on_ready).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Server stopped");
            ExitCode::FAILURE
        }
    }
}
