use std::fmt;

/// A `/package.Service/Method` request path split into its two names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPath {
    pub service: String,
    pub method: String,
}

impl MethodPath {
    /// Parse a gRPC request path. Exactly two non-empty segments after the
    /// leading slash are accepted.
    pub fn parse(path: &str) -> Option<Self> {
        let mut parts = path.split('/');
        let (Some(""), Some(service), Some(method), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };
        if service.is_empty() || method.is_empty() {
            return None;
        }
        Some(Self {
            service: service.to_string(),
            method: method.to_string(),
        })
    }
}

impl fmt::Display for MethodPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.service, self.method)
    }
}

/// How a method exchanges messages, derived from its streaming flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    Unary,
    /// One reply stream. Bidirectional methods land here too and only
    /// consume the first request message.
    ServerStreaming { client_streaming: bool },
    ClientStreaming,
}

impl CallShape {
    pub fn of(client_streaming: bool, server_streaming: bool) -> Self {
        match (client_streaming, server_streaming) {
            (false, false) => CallShape::Unary,
            (client_streaming, true) => CallShape::ServerStreaming { client_streaming },
            (true, false) => CallShape::ClientStreaming,
        }
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallShape::Unary => write!(f, "unary"),
            CallShape::ServerStreaming {
                client_streaming: false,
            } => write!(f, "server-streaming"),
            CallShape::ServerStreaming {
                client_streaming: true,
            } => write!(f, "bidi-streaming"),
            CallShape::ClientStreaming => write!(f, "client-streaming"),
        }
    }
}
