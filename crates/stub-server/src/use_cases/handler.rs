use axum::body::{Body, Bytes, HttpBody};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::BoxError;
use grpc_stub_server::Dispatcher;
use http_stub_server::Responder;
use std::path::Path;

use crate::config::Config;
use crate::entities::Protocol;
use crate::error::ServerError;

/// Single entry point for every request on the shared port.
///
/// Sends gRPC traffic to the dispatcher and everything else to the HTTP
/// responder. A side that was never configured answers `501 Not Implemented`.
#[derive(Clone, Debug, Default)]
pub struct Handler {
    rpc: Option<Dispatcher>,
    http: Option<Responder>,
}

impl Handler {
    /// Configure each surface whose directories are given.
    ///
    /// gRPC needs both `proto_dir` and `stub_dir`; naming only one of them is an error.
    pub fn new(
        http_dir: Option<&Path>,
        proto_dir: Option<&Path>,
        stub_dir: Option<&Path>,
    ) -> Result<Self, ServerError> {
        let mut handler = Self::default();

        if let Some(dir) = http_dir {
            handler = handler.with_http(Responder::from_dir(dir)?);
        }

        match (proto_dir, stub_dir) {
            (Some(proto_dir), Some(stub_dir)) => {
                handler = handler.with_rpc(Dispatcher::from_dirs(proto_dir, stub_dir)?);
            }
            (Some(_), None) => {
                return Err(ServerError::Configuration(
                    "a proto directory needs a gRPC stub directory".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(ServerError::Configuration(
                    "a gRPC stub directory needs a proto directory".to_string(),
                ))
            }
            (None, None) => {}
        }

        Ok(handler)
    }

    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        Self::new(config.http_dir(), config.proto_dir(), config.stub_dir())
    }

    pub fn with_rpc(mut self, dispatcher: Dispatcher) -> Self {
        self.rpc = Some(dispatcher);
        self
    }

    pub fn with_http(mut self, responder: Responder) -> Self {
        self.http = Some(responder);
        self
    }

    pub fn has_rpc(&self) -> bool {
        self.rpc.is_some()
    }

    pub fn has_http(&self) -> bool {
        self.http.is_some()
    }

    /// Route one request to the engine for its protocol
    pub async fn handle<B>(&self, request: http::Request<B>) -> Response
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError> + Send + 'static,
    {
        match Protocol::classify(&request) {
            Protocol::Grpc => match &self.rpc {
                Some(dispatcher) => dispatcher.call(request).await.map(Body::new),
                None => not_configured(Protocol::Grpc),
            },
            Protocol::Http => match &self.http {
                Some(responder) => responder.call(request).await,
                None => not_configured(Protocol::Http),
            },
        }
    }
}

fn not_configured(protocol: Protocol) -> Response {
    let message = format!("No {protocol} stub server configured");
    tracing::error!(protocol = %protocol, "{message}");
    (
        StatusCode::NOT_IMPLEMENTED,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{message}\n"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Empty};
    use std::fs;
    use tempfile::TempDir;

    async fn send(handler: &Handler, version: http::Version, content_type: &str) -> (StatusCode, String) {
        let request = http::Request::builder()
            .version(version)
            .method("POST")
            .uri("/foo.Foo/Ping")
            .header(header::CONTENT_TYPE, content_type)
            .body(Empty::<Bytes>::new())
            .unwrap();
        let response = handler.handle(request).await;
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_unconfigured_grpc() {
        let handler = Handler::default();
        assert_eq!(
            send(&handler, http::Version::HTTP_2, "application/grpc").await,
            (
                StatusCode::NOT_IMPLEMENTED,
                "No gRPC stub server configured\n".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_unconfigured_http() {
        let handler = Handler::default();
        assert_eq!(
            send(&handler, http::Version::HTTP_11, "application/json").await,
            (
                StatusCode::NOT_IMPLEMENTED,
                "No HTTP stub server configured\n".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_grpc_content_type_over_http1_goes_to_http() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("ping.json"),
            r#"{"path": "/foo.Foo/Ping", "method": "POST", "response": {"status": 200, "raw_body": "plain"}}"#,
        )
        .unwrap();

        let handler = Handler::new(Some(dir.path()), None, None).unwrap();
        assert!(handler.has_http());
        assert!(!handler.has_rpc());

        assert_eq!(
            send(&handler, http::Version::HTTP_11, "application/grpc").await,
            (StatusCode::OK, "plain".to_string())
        );
        assert_eq!(
            send(&handler, http::Version::HTTP_2, "application/grpc").await.0,
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn test_half_configured_grpc_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Handler::new(None, Some(dir.path()), None),
            Err(ServerError::Configuration(_))
        ));
        assert!(matches!(
            Handler::new(None, None, Some(dir.path())),
            Err(ServerError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_errors_surface() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{").unwrap();

        assert!(matches!(
            Handler::new(Some(dir.path()), None, None),
            Err(ServerError::Http(_))
        ));
    }
}
