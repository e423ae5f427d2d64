use std::path::PathBuf;
use std::sync::Arc;

use crate::entities::{DescriptorRegistry, ProtoStub};
use crate::error::LoadError;
use crate::use_cases::ports::Repository;
use crate::use_cases::{load_schemas, load_stubs};
use crate::Storage;

/// Everything the dispatcher serves: compiled schemas and the stubs for them
#[derive(Clone)]
pub struct Catalog {
    pub registry: Arc<DescriptorRegistry>,
    pub stubs: Arc<dyn Repository>,
}

impl Catalog {
    pub fn new(registry: DescriptorRegistry, stubs: Arc<dyn Repository>) -> Self {
        Self {
            registry: Arc::new(registry),
            stubs,
        }
    }
}

/// Builder for assembling a [`Catalog`] with a fluent API
///
/// # Example
///
/// ```rust,no_run
/// use grpc_stub_server::prelude::*;
/// use serde_json::json;
///
/// fn main() -> Result<(), LoadError> {
///     let catalog = CatalogBuilder::new()
///         .proto_dir("protos")
///         .stub_dir("stubs")
///         .stub(ProtoStub::new(
///             "helloworld.Greeter",
///             "SayHello",
///             Output::payload(json!({"message": "Hello"})),
///         ))
///         .build()?;
///
///     assert!(catalog.registry.service("helloworld.Greeter").is_some());
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct CatalogBuilder {
    proto_dir: Option<PathBuf>,
    stub_dir: Option<PathBuf>,
    stubs: Vec<ProtoStub>,
    repository: Option<Arc<dyn Repository>>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory walked for `.proto` files
    pub fn proto_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.proto_dir = Some(dir.into());
        self
    }

    /// Directory walked for `.json` stub files
    pub fn stub_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stub_dir = Some(dir.into());
        self
    }

    /// Add a stub directly, after any loaded from the stub directory
    pub fn stub(mut self, stub: ProtoStub) -> Self {
        self.stubs.push(stub);
        self
    }

    pub fn stubs(mut self, stubs: impl IntoIterator<Item = ProtoStub>) -> Self {
        self.stubs.extend(stubs);
        self
    }

    /// Use an existing repository instead of a fresh [`Storage`]
    pub fn repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Compile the schemas and load the stubs. Schemas always load before stubs.
    pub fn build(self) -> Result<Catalog, LoadError> {
        for stub in &self.stubs {
            stub.validate()?;
        }

        let registry = match &self.proto_dir {
            Some(dir) => load_schemas(dir)?,
            None => DescriptorRegistry::new(),
        };

        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(Storage::new()));
        if let Some(dir) = &self.stub_dir {
            load_stubs(dir, repository.as_ref())?;
        }
        for stub in self.stubs {
            repository.add(stub);
        }

        Ok(Catalog::new(registry, repository))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Output;
    use crate::error::InvalidStub;
    use serde_json::json;

    #[test]
    fn test_empty_builder() {
        let catalog = CatalogBuilder::new().build().unwrap();
        assert_eq!(catalog.registry.file_count(), 0);
        assert!(catalog.stubs.lookup("svc", "Method", None).is_none());
    }

    #[test]
    fn test_builder_with_stubs() {
        let catalog = CatalogBuilder::new()
            .stub(ProtoStub::new("svc", "A", Output::payload(json!({}))))
            .stubs([ProtoStub::new("svc", "B", Output::payload(json!({"x": 1})))])
            .build()
            .unwrap();

        assert!(catalog.stubs.lookup("svc", "A", None).is_some());
        assert_eq!(
            catalog.stubs.lookup("svc", "B", None),
            Some(Output::payload(json!({"x": 1})))
        );
    }

    #[test]
    fn test_builder_rejects_invalid_stub() {
        let result = CatalogBuilder::new()
            .stub(ProtoStub::new("", "A", Output::payload(json!({}))))
            .build();
        assert!(matches!(
            result,
            Err(LoadError::Invalid(InvalidStub::MissingService))
        ));
    }

    #[test]
    fn test_builder_shares_repository() {
        let storage: Arc<dyn Repository> = Arc::new(Storage::new());
        CatalogBuilder::new()
            .repository(storage.clone())
            .stub(ProtoStub::new("svc", "A", Output::payload(json!({}))))
            .build()
            .unwrap();

        assert!(storage.lookup("svc", "A", None).is_some());
    }
}
