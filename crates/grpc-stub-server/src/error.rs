use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading schemas and stub records at startup
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("parse proto {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: protox::Error,
    },

    #[error("well-known proto dependency {path} missing from registry: {source}")]
    WellKnown {
        path: String,
        #[source]
        source: protox::Error,
    },

    #[error("import cycle through {path}")]
    Cycle { path: String },

    #[error("{path} imports {dependency}: {source}")]
    Dependency {
        path: String,
        dependency: String,
        #[source]
        source: Box<LoadError>,
    },

    #[error("convert {path} to FileDescriptor: {source}")]
    Descriptor {
        path: String,
        #[source]
        source: prost_reflect::DescriptorError,
    },

    #[error("unmarshal stub {}: {source}", path.display())]
    Stub {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid stub: {0}")]
    Invalid(#[from] InvalidStub),

    #[error("method {method} uses message type {message} missing from registry")]
    UnknownType { method: String, message: String },

    #[cfg(feature = "tonic")]
    #[error("build reflection service: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),
}

/// Validation failures for a single stub record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidStub {
    #[error("\"service\" field is required")]
    MissingService,

    #[error("\"method\" field is required")]
    MissingMethod,

    #[error("output requires one of \"data\", \"error\" or \"stream\"")]
    EmptyOutput,

    #[error("output must set only one of \"data\", \"error\" or \"stream\"")]
    AmbiguousOutput,

    #[error("stream requires at least one \"data\" item")]
    EmptyStream,

    #[error("unknown status code {0}")]
    UnknownCode(String),
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
