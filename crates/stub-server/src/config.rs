use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;

/// Serve canned HTTP and gRPC responses from stub files on one port
#[derive(Debug, Clone, Parser)]
#[command(name = "stub-server", version, about)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "STUB_SERVER_ADDRESS", default_value = "0.0.0.0:50051")]
    pub address: SocketAddr,

    /// Directory of .proto files
    #[arg(long = "proto", env = "STUB_SERVER_PROTO", default_value = "")]
    pub proto_dir: String,

    /// Directory of gRPC stub records
    #[arg(long = "stubs", env = "STUB_SERVER_STUBS", default_value = "")]
    pub stub_dir: String,

    /// Directory of HTTP stubs (.json rules and .http captures)
    #[arg(long = "http", env = "STUB_SERVER_HTTP", default_value = "")]
    pub http_dir: String,
}

/// An empty value means the surface is not configured
fn configured(dir: &str) -> Option<&Path> {
    (!dir.is_empty()).then(|| Path::new(dir))
}

impl Config {
    pub fn proto_dir(&self) -> Option<&Path> {
        configured(&self.proto_dir)
    }

    pub fn stub_dir(&self) -> Option<&Path> {
        configured(&self.stub_dir)
    }

    pub fn http_dir(&self) -> Option<&Path> {
        configured(&self.http_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: ([0, 0, 0, 0], 50051).into(),
            proto_dir: String::new(),
            stub_dir: String::new(),
            http_dir: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["stub-server"]).unwrap();
        assert_eq!(config.address, "0.0.0.0:50051".parse().unwrap());
        assert_eq!(config.proto_dir(), None);
        assert_eq!(config.stub_dir(), None);
        assert_eq!(config.http_dir(), None);
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "stub-server",
            "--address",
            "127.0.0.1:8080",
            "--proto",
            "protos",
            "--stubs",
            "stubs",
            "--http",
            "http",
        ])
        .unwrap();

        assert_eq!(config.address, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.proto_dir(), Some(Path::new("protos")));
        assert_eq!(config.stub_dir(), Some(Path::new("stubs")));
        assert_eq!(config.http_dir(), Some(Path::new("http")));
    }

    #[test]
    fn test_invalid_address() {
        assert!(Config::try_parse_from(["stub-server", "--address", "nowhere"]).is_err());
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
