use bytes::Bytes;
use futures::future::BoxFuture;
use http_body::Body;
use prost_reflect::{MessageDescriptor, MethodDescriptor};
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::time::Instant;
use tonic::codegen::StdError;
use tonic::server::Grpc;
use tonic::Status;
use tower::ServiceExt;

use super::codec::DynamicCodec;
use super::handlers::{
    parse_timeout, BidiStub, Call, ClientStreamStub, ServerStreamStub, UnaryStub,
};
use super::reflection::{reflection_services, ReflectionService};
use crate::entities::{CallShape, DescriptorRegistry, MethodPath};
use crate::error::LoadError;
use crate::use_cases::ports::Repository;
use crate::use_cases::{Catalog, CatalogBuilder};

struct Route {
    input: MessageDescriptor,
    output: MessageDescriptor,
    shape: CallShape,
}

impl Route {
    fn resolve(registry: &DescriptorRegistry, method: &MethodDescriptor) -> Result<Self, LoadError> {
        let lookup = |message: MessageDescriptor| {
            registry
                .message(message.full_name())
                .ok_or_else(|| LoadError::UnknownType {
                    method: method.full_name().to_string(),
                    message: message.full_name().to_string(),
                })
        };
        Ok(Self {
            input: lookup(method.input())?,
            output: lookup(method.output())?,
            shape: CallShape::of(method.is_client_streaming(), method.is_server_streaming()),
        })
    }
}

struct Inner {
    /// service full name -> method name -> route
    routes: HashMap<String, HashMap<String, Route>>,
    stubs: Arc<dyn Repository>,
    registry: Arc<DescriptorRegistry>,
    reflection: HashMap<&'static str, ReflectionService>,
}

/// Generic gRPC endpoint for every method in a registry.
///
/// Requests are decoded with the method's input descriptor, answered from the
/// stub repository and encoded with its output descriptor. No generated code
/// is involved. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Register a route for every method of every service in the catalog
    pub fn new(catalog: Catalog) -> Result<Self, LoadError> {
        let mut routes: HashMap<String, HashMap<String, Route>> = HashMap::new();

        for service in catalog.registry.services() {
            let methods = routes.entry(service.full_name().to_string()).or_default();
            for method in service.methods() {
                let route = Route::resolve(&catalog.registry, &method)?;
                tracing::info!(
                    service = %service.full_name(),
                    method = %method.name(),
                    client_stream = method.is_client_streaming(),
                    server_stream = method.is_server_streaming(),
                    "registering gRPC method"
                );
                methods.insert(method.name().to_string(), route);
            }
        }

        let reflection = reflection_services(&catalog.registry)?;

        Ok(Self {
            inner: Arc::new(Inner {
                routes,
                stubs: catalog.stubs,
                registry: catalog.registry,
                reflection,
            }),
        })
    }

    /// Compile `proto_dir` and load `stub_dir` into a fresh dispatcher
    pub fn from_dirs(
        proto_dir: impl AsRef<Path>,
        stub_dir: impl AsRef<Path>,
    ) -> Result<Self, LoadError> {
        let catalog = CatalogBuilder::new()
            .proto_dir(proto_dir.as_ref())
            .stub_dir(stub_dir.as_ref())
            .build()?;
        Self::new(catalog)
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.inner.registry
    }

    pub fn stubs(&self) -> &Arc<dyn Repository> {
        &self.inner.stubs
    }

    /// Names of every service that can be called, reflection included
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .routes
            .keys()
            .cloned()
            .chain(self.inner.reflection.keys().map(|name| name.to_string()))
            .collect();
        names.sort();
        names
    }

    /// Serve one gRPC request
    pub async fn call<B>(&self, request: http::Request<B>) -> http::Response<tonic::body::Body>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        let Some(path) = MethodPath::parse(request.uri().path()) else {
            tracing::error!(method = %request.uri().path(), "Invalid method format");
            return status_response(Status::invalid_argument("Invalid method format"));
        };

        if let Some(reflection) = self.inner.reflection.get(path.service.as_str()) {
            let request = request.map(tonic::body::Body::new);
            return match reflection.clone().oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            };
        }

        tracing::info!(service = %path.service, method = %path.method, "Received gRPC call");

        let Some(methods) = self.inner.routes.get(&path.service) else {
            tracing::error!(service = %path.service, "No stub found");
            return status_response(Status::unimplemented(format!(
                "Service {} not found",
                path.service
            )));
        };
        let Some(route) = methods.get(&path.method) else {
            tracing::error!(service = %path.service, method = %path.method, "No stub found");
            return status_response(Status::unimplemented(format!(
                "Method {} not found",
                path.method
            )));
        };

        let deadline = request
            .headers()
            .get("grpc-timeout")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_timeout)
            .map(|timeout| Instant::now() + timeout);

        let call = Call::new(path, route.output.clone(), self.inner.stubs.clone(), deadline);
        let mut grpc = Grpc::new(DynamicCodec::new(route.input.clone()));

        match route.shape {
            CallShape::Unary => grpc.unary(UnaryStub(call), request).await,
            CallShape::ServerStreaming {
                client_streaming: false,
            } => grpc.server_streaming(ServerStreamStub(call), request).await,
            CallShape::ServerStreaming {
                client_streaming: true,
            } => grpc.streaming(BidiStub(call), request).await,
            CallShape::ClientStreaming => {
                grpc.client_streaming(ClientStreamStub(call), request).await
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("services", &self.service_names())
            .finish_non_exhaustive()
    }
}

/// A trailers-only gRPC response carrying `status`
pub(super) fn status_response(status: Status) -> http::Response<tonic::body::Body> {
    let mut response = http::Response::new(tonic::body::Body::empty());
    let headers = response.headers_mut();
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/grpc"),
    );
    if let Err(status) = status.add_header(headers) {
        tracing::error!(error = %status, "Failed to encode status headers");
    }
    response
}

impl<B> tower::Service<http::Request<B>> for Dispatcher
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<tonic::body::Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<B>) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { Ok(dispatcher.call(request).await) })
    }
}
