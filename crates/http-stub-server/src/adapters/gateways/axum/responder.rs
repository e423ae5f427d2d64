use axum::body::{Body, Bytes, HttpBody};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{BoxError, Router};
use http_body_util::BodyExt;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

use crate::entities::Invocation;
use crate::error::LoadError;
use crate::use_cases::{load_stubs, ports::Repository};
use crate::Storage;

type Stubs = Arc<dyn Repository>;

/// Answers plain HTTP requests from a rule table
#[derive(Clone)]
pub struct Responder {
    router: Router,
}

impl Responder {
    pub fn new(stubs: Arc<dyn Repository>) -> Self {
        let router = Router::new().fallback(handle_request).with_state(stubs);
        Self { router }
    }

    /// Load every stub under `dir` into a fresh [`Storage`]
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let storage = Arc::new(Storage::new());
        load_stubs(dir, storage.as_ref())?;
        Ok(Self::new(storage))
    }

    /// The axum router behind this responder, for mounting elsewhere
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Answer a single request
    pub async fn call<B>(&self, request: http::Request<B>) -> Response
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let request = request.map(Body::new);
        match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder").finish_non_exhaustive()
    }
}

/// Plain-text error body, newline terminated
fn text_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        format!("{message}\n"),
    )
        .into_response()
}

fn into_http(response: crate::entities::Response) -> Result<Response, http::Error> {
    let mut builder = http::Response::builder().status(response.status);
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.body(Body::from(response.body))
}

async fn handle_request(State(stubs): State<Stubs>, request: Request) -> Response {
    let Some(invocation) = Invocation::from_request(&request) else {
        tracing::warn!(method = %request.method(), path = request.uri().path(), "unsupported HTTP method");
        return text_error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
    };

    let mut body = request.into_body();
    while let Some(frame) = body.frame().await {
        if let Err(err) = frame {
            tracing::error!(path = %invocation.path, error = %err, "Error reading request body");
            return text_error(StatusCode::INTERNAL_SERVER_ERROR, "Error reading request body");
        }
    }

    let Some(rule) = stubs.find(&invocation) else {
        tracing::error!(
            path = %invocation.path,
            method = %invocation.method,
            error = "unknown stub",
            "Could not get stub"
        );
        return text_error(StatusCode::NOT_FOUND, "unknown stub");
    };
    tracing::debug!(path = %invocation.path, method = %invocation.method, rule = %rule, "matched HTTP stub");

    let response = match rule.response() {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(rule = %rule, error = %err, "Failed to write response");
            return text_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to write response");
        }
    };

    match into_http(response) {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(rule = %rule, error = %err, "Failed to write response");
            text_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to write response")
        }
    }
}
