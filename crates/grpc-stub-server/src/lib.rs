//! gRPC Stub Server
//!
//! Serves canned responses for any gRPC service described by `.proto` files,
//! compiled at runtime. No generated code is needed.
//!
//! # Example
//!
//! ```rust,no_run
//! use grpc_stub_server::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Compile protos/ and load the stub records under stubs/
//!     let dispatcher = Dispatcher::from_dirs("protos", "stubs")?;
//!
//!     Tonic::bind(([127, 0, 0, 1], 50051))
//!         .serve(
//!             dispatcher,
//!             async {
//!                 let _ = tokio::signal::ctrl_c().await;
//!             },
//!             Some(|addr| println!("listening on {addr}")),
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod adapters;
pub mod entities;
pub mod error;
pub mod use_cases;

pub use error::{InvalidStub, LoadError, ServeError};

#[cfg(feature = "tonic")]
pub use adapters::gateways::{Dispatcher, DynamicCodec, DynamicDecoder, DynamicEncoder, Tonic};

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use entities::{Output, ProtoStub};

/// In-memory stub table: service -> method -> output
///
/// Later stubs for the same method replace earlier ones.
#[derive(Debug, Default)]
pub struct Storage {
    stubs: Mutex<HashMap<String, HashMap<String, Output>>>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let stubs = self.stubs.lock().unwrap_or_else(PoisonError::into_inner);
        stubs.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl use_cases::ports::Repository for Storage {
    fn add(&self, stub: ProtoStub) {
        let mut stubs = self.stubs.lock().unwrap_or_else(PoisonError::into_inner);
        stubs
            .entry(stub.service)
            .or_default()
            .insert(stub.method, stub.output);
    }

    fn lookup(&self, service: &str, method: &str, _input: Option<&str>) -> Option<Output> {
        let stubs = self.stubs.lock().unwrap_or_else(PoisonError::into_inner);
        stubs.get(service)?.get(method).cloned()
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::entities::{DescriptorRegistry, Output, ProtoStub, StatusCode, Stream};
    pub use crate::error::{LoadError, ServeError};
    pub use crate::use_cases::ports::Repository;
    pub use crate::use_cases::{load_schemas, load_stubs, Catalog, CatalogBuilder};
    pub use crate::Storage;

    #[cfg(feature = "tonic")]
    pub use crate::{Dispatcher, DynamicCodec, Tonic};
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities::StatusCode;
    use serde_json::json;
    use std::sync::Arc;
    use use_cases::ports::Repository;

    #[test]
    fn test_storage_add_and_lookup() {
        let storage = Storage::new();
        storage.add(ProtoStub::new("foo.Foo", "Ping", Output::payload(json!({"message": "ok"}))));

        assert_eq!(
            storage.lookup("foo.Foo", "Ping", Some(r#"{"message":"hi"}"#)),
            Some(Output::payload(json!({"message": "ok"})))
        );
        assert_eq!(storage.lookup("foo.Foo", "Pong", None), None);
        assert_eq!(storage.lookup("bar.Bar", "Ping", None), None);
    }

    #[test]
    fn test_storage_last_write_wins() {
        let storage = Storage::new();
        storage.add(ProtoStub::new("svc", "M", Output::payload(json!({"v": 1}))));
        storage.add(ProtoStub::new("svc", "M", Output::status(StatusCode::NOT_FOUND, "gone")));

        assert_eq!(storage.len(), 1);
        assert_eq!(
            storage.lookup("svc", "M", None),
            Some(Output::status(StatusCode::NOT_FOUND, "gone"))
        );
    }

    #[test]
    fn test_storage_concurrent_add_and_lookup() {
        let storage = Arc::new(Storage::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let storage = storage.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let method = format!("M{j}");
                        storage.add(ProtoStub::new(
                            format!("svc{i}"),
                            method.clone(),
                            Output::payload(json!({ "i": i })),
                        ));
                        assert!(storage.lookup(&format!("svc{i}"), &method, None).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(storage.len(), 400);
    }
}
