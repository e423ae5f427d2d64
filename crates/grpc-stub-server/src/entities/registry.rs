use prost_reflect::{
    DescriptorError, DescriptorPool, MessageDescriptor, MethodDescriptor, ServiceDescriptor,
};
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use std::collections::BTreeMap;

/// Compiled descriptors for every loaded schema file.
///
/// Files are keyed by their normalized relative path. Message types are
/// indexed by full name; indexing a name twice keeps the first entry.
#[derive(Debug, Clone)]
pub struct DescriptorRegistry {
    pool: DescriptorPool,
    messages: BTreeMap<String, MessageDescriptor>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self {
            pool: DescriptorPool::new(),
            messages: BTreeMap::new(),
        }
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.pool.get_file_by_name(path).is_some()
    }

    /// Register a parsed file. Its dependencies must already be registered.
    /// Registering a file that is already present is a no-op.
    pub fn add_file(&mut self, file: FileDescriptorProto) -> Result<(), DescriptorError> {
        let name = file.name().to_string();
        if self.contains_file(&name) {
            return Ok(());
        }
        self.pool.add_file_descriptor_proto(file)?;

        if let Some(file) = self.pool.get_file_by_name(&name) {
            for message in file.messages() {
                self.register_message(message);
            }
        }
        Ok(())
    }

    fn register_message(&mut self, message: MessageDescriptor) {
        for child in message.child_messages() {
            self.register_message(child);
        }
        self.messages
            .entry(message.full_name().to_string())
            .or_insert(message);
    }

    pub fn services(&self) -> impl Iterator<Item = ServiceDescriptor> + '_ {
        self.pool.services()
    }

    pub fn service(&self, full_name: &str) -> Option<ServiceDescriptor> {
        self.pool.get_service_by_name(full_name)
    }

    pub fn method(&self, service: &str, method: &str) -> Option<MethodDescriptor> {
        self.service(service)?
            .methods()
            .find(|candidate| candidate.name() == method)
    }

    /// The registered message type named `full_name`. Requests and replies are
    /// built against these descriptors.
    pub fn message(&self, full_name: &str) -> Option<MessageDescriptor> {
        self.messages.get(full_name).cloned()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn extension_count(&self) -> usize {
        self.pool.all_extensions().count()
    }

    pub fn file_count(&self) -> usize {
        self.pool.files().len()
    }

    /// Every registered file, dependencies first
    pub fn file_descriptor_set(&self) -> FileDescriptorSet {
        FileDescriptorSet {
            file: self.pool.file_descriptor_protos().cloned().collect(),
        }
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_reflect::{DynamicMessage, ReflectMessage};

    const FOO: &str = r#"
        syntax = "proto3";
        package foo;

        message PingRequest { string message = 1; }
        message PingResponse {
            string message = 1;
            message Detail { int32 code = 1; }
            Detail detail = 2;
        }

        service Foo {
            rpc Ping(PingRequest) returns (PingResponse);
            rpc Watch(PingRequest) returns (stream PingResponse);
        }
    "#;

    fn foo_file() -> FileDescriptorProto {
        protox::file::File::from_source("foo.proto", FOO)
            .unwrap()
            .file_descriptor_proto()
            .clone()
    }

    #[test]
    fn test_add_file_registers_types() {
        let mut registry = DescriptorRegistry::new();
        registry.add_file(foo_file()).unwrap();

        assert!(registry.contains_file("foo.proto"));
        assert!(registry.message("foo.PingRequest").is_some());
        assert!(registry.message("foo.PingResponse.Detail").is_some());
        assert_eq!(registry.message_count(), 3);
        assert_eq!(registry.services().count(), 1);
    }

    #[test]
    fn test_add_file_twice_is_a_no_op() {
        let mut registry = DescriptorRegistry::new();
        registry.add_file(foo_file()).unwrap();
        registry.add_file(foo_file()).unwrap();

        assert_eq!(registry.file_count(), 1);
        assert_eq!(registry.message_count(), 3);
    }

    #[test]
    fn test_method_lookup() {
        let mut registry = DescriptorRegistry::new();
        registry.add_file(foo_file()).unwrap();

        let watch = registry.method("foo.Foo", "Watch").unwrap();
        assert!(watch.is_server_streaming());
        assert!(!watch.is_client_streaming());
        assert_eq!(watch.input().full_name(), "foo.PingRequest");
        assert!(registry.method("foo.Foo", "Missing").is_none());
        assert!(registry.method("foo.Missing", "Ping").is_none());
    }

    #[test]
    fn test_message_lookup() {
        let mut registry = DescriptorRegistry::new();
        registry.add_file(foo_file()).unwrap();

        let message = registry.message("foo.PingRequest").unwrap();
        assert_eq!(message.full_name(), "foo.PingRequest");
        assert_eq!(
            DynamicMessage::new(message).descriptor().full_name(),
            "foo.PingRequest"
        );
        assert!(registry.message("foo.Unknown").is_none());
    }

    #[test]
    fn test_extensions_are_counted() {
        let file = protox::file::File::from_source(
            "ext.proto",
            r#"
                syntax = "proto2";
                package ext;
                message Base { extensions 100 to 199; }
                extend Base { optional string note = 100; }
            "#,
        )
        .unwrap()
        .file_descriptor_proto()
        .clone();

        let mut registry = DescriptorRegistry::new();
        registry.add_file(file).unwrap();

        assert_eq!(registry.extension_count(), 1);
        assert_eq!(registry.message_count(), 1);
    }

    #[test]
    fn test_file_descriptor_set() {
        let mut registry = DescriptorRegistry::new();
        registry.add_file(foo_file()).unwrap();

        let set = registry.file_descriptor_set();
        assert_eq!(set.file.len(), 1);
        assert_eq!(set.file[0].name(), "foo.proto");
    }

    #[test]
    fn test_unresolved_dependency_is_an_error() {
        let file = protox::file::File::from_source(
            "bar.proto",
            r#"
                syntax = "proto3";
                import "foo.proto";
                message Bar { foo.PingRequest request = 1; }
            "#,
        )
        .unwrap()
        .file_descriptor_proto()
        .clone();

        let mut registry = DescriptorRegistry::new();
        assert!(registry.add_file(file).is_err());
    }
}
