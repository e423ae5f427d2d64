use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading HTTP stub files
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read stubs from dir {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("unmarshal stub {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("stub validation {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: InvalidStub,
    },
}

/// Validation failures for a single stub
#[derive(Error, Debug)]
pub enum InvalidStub {
    #[error("either \"path\" or \"regex\" field is required")]
    PathOrRegex,

    #[error("\"method\" field is required")]
    MissingMethod,

    #[error("unknown method {0:?}")]
    UnknownMethod(String),

    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("status code {0} is not valid")]
    Status(i64),

    #[error("only one of \"body\" or \"raw_body\" may be set")]
    AmbiguousBody,

    #[error("encode body: {0}")]
    Body(#[source] serde_json::Error),

    #[error("invalid header {name:?}: {reason}")]
    Header { name: String, reason: String },

    #[error("could not determine HTTP method from file location")]
    NoMethodDir,
}

/// Failures turning a raw `.http` capture into a response
#[derive(Error, Debug)]
pub enum RawResponseError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse response: {0}")]
    Parse(#[from] httparse::Error),

    #[error("incomplete response head")]
    Incomplete,

    #[error("invalid Content-Length")]
    ContentLength,

    #[error("body shorter than Content-Length ({expected} > {actual})")]
    Truncated { expected: usize, actual: usize },
}

/// Errors from running the standalone listener
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
