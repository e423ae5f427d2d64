use http::header::CONTENT_TYPE;
use http::{Request, Version};

const GRPC_CONTENT_TYPE: &str = "application/grpc";

/// Which stub engine a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Grpc,
    Http,
}

impl Protocol {
    /// gRPC is HTTP/2 with an `application/grpc*` content type; everything else is plain HTTP
    pub fn classify<B>(request: &Request<B>) -> Self {
        let grpc_content = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(GRPC_CONTENT_TYPE));

        if request.version() == Version::HTTP_2 && grpc_content {
            Protocol::Grpc
        } else {
            Protocol::Http
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Grpc => write!(f, "gRPC"),
            Protocol::Http => write!(f, "HTTP"),
        }
    }
}
