use super::Method;

/// The parts of an inbound request that rules match against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub method: Method,
    pub path: String,
}

impl Invocation {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Capture an HTTP request; `None` if its method cannot be matched
    pub fn from_request<B>(request: &http::Request<B>) -> Option<Self> {
        let method = Method::from_http(request.method())?;
        Some(Self::new(method, request.uri().path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request_keeps_only_method_and_path() {
        let request = http::Request::builder()
            .method("POST")
            .uri("http://localhost/api/users?page=2")
            .header("x-trace", "abc")
            .body(())
            .unwrap();

        let invocation = Invocation::from_request(&request).unwrap();
        assert_eq!(invocation.method, Method::Post);
        assert_eq!(invocation.path, "/api/users");
    }

    #[test]
    fn test_unsupported_method() {
        let request = http::Request::builder()
            .method("TRACE")
            .uri("/")
            .body(())
            .unwrap();
        assert!(Invocation::from_request(&request).is_none());
    }
}
