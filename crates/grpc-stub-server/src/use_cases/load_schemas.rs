use prost_types::FileDescriptorProto;
use protox::file::{File, FileResolver, GoogleFileResolver};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::entities::DescriptorRegistry;
use crate::error::LoadError;

const WELL_KNOWN_PREFIX: &str = "google/protobuf/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Compiles `.proto` files under a root directory into a [`DescriptorRegistry`].
///
/// Imports are resolved depth-first against the same root. Imports under
/// `google/protobuf/` that are not present on disk are served from the
/// built-in well-known types.
pub struct SchemaLoader<'a> {
    root: PathBuf,
    registry: &'a mut DescriptorRegistry,
    marks: HashMap<String, Mark>,
    well_known: GoogleFileResolver,
}

impl<'a> SchemaLoader<'a> {
    pub fn new(root: impl Into<PathBuf>, registry: &'a mut DescriptorRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
            marks: HashMap::new(),
            well_known: GoogleFileResolver::new(),
        }
    }

    /// Load every `.proto` file under the root, in file name order
    pub fn load_all(&mut self) -> Result<(), LoadError> {
        let entries = WalkDir::new(&self.root).sort_by_file_name();
        for entry in entries {
            let entry = entry.map_err(|source| LoadError::Walk {
                path: self.root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() || !is_proto(entry.path()) {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .into_owned();
            self.load_one(&relative)?;
        }
        Ok(())
    }

    /// Load a single file and, first, everything it imports
    pub fn load_one(&mut self, path: &str) -> Result<(), LoadError> {
        let path = normalize(path);
        if self.registry.contains_file(&path) {
            return Ok(());
        }
        match self.marks.get(&path) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => return Err(LoadError::Cycle { path }),
            None => {}
        }

        let file = self.resolve(&path)?;
        self.marks.insert(path.clone(), Mark::InProgress);

        for dependency in &file.dependency {
            self.load_one(dependency)
                .map_err(|source| LoadError::Dependency {
                    path: path.clone(),
                    dependency: dependency.clone(),
                    source: Box::new(source),
                })?;
        }

        self.registry
            .add_file(file)
            .map_err(|source| LoadError::Descriptor {
                path: path.clone(),
                source,
            })?;
        self.marks.insert(path.clone(), Mark::Done);
        tracing::debug!(path = %path, "registered proto file");
        Ok(())
    }

    fn resolve(&self, path: &str) -> Result<FileDescriptorProto, LoadError> {
        let full_path = self.root.join(path);
        let source = match std::fs::read_to_string(&full_path) {
            Ok(source) => source,
            Err(err) if err.kind() == ErrorKind::NotFound && path.starts_with(WELL_KNOWN_PREFIX) => {
                let file = self
                    .well_known
                    .open_file(path)
                    .map_err(|source| LoadError::WellKnown {
                        path: path.to_string(),
                        source,
                    })?;
                return Ok(file.file_descriptor_proto().clone());
            }
            Err(source) => {
                return Err(LoadError::Io {
                    path: full_path,
                    source,
                })
            }
        };

        let file = File::from_source(path, &source).map_err(|source| LoadError::Parse {
            path: path.to_string(),
            source,
        })?;
        Ok(file.file_descriptor_proto().clone())
    }
}

/// Compile every schema under `root` into a fresh registry
pub fn load_schemas(root: impl AsRef<Path>) -> Result<DescriptorRegistry, LoadError> {
    let mut registry = DescriptorRegistry::new();
    SchemaLoader::new(root.as_ref(), &mut registry).load_all()?;
    tracing::info!(
        files = registry.file_count(),
        messages = registry.message_count(),
        extensions = registry.extension_count(),
        "loaded proto files"
    );
    Ok(registry)
}

fn is_proto(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "proto")
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}
