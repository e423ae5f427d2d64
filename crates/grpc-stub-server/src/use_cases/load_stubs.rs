use std::path::Path;
use walkdir::WalkDir;

use crate::entities::ProtoStub;
use crate::error::LoadError;
use crate::use_cases::ports::Repository;

/// Parse one stub file: a single record or an array of records
pub fn load_file(path: &Path) -> Result<Vec<ProtoStub>, LoadError> {
    let content = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stub_error = |source| LoadError::Stub {
        path: path.to_path_buf(),
        source,
    };

    let value: serde_json::Value = serde_json::from_slice(&content).map_err(stub_error)?;
    if value.is_array() {
        serde_json::from_value(value).map_err(stub_error)
    } else {
        serde_json::from_value(value)
            .map(|stub| vec![stub])
            .map_err(stub_error)
    }
}

/// Load every `.json` stub file under `dir` into `repository`.
///
/// All files are parsed before anything is added, so a bad file leaves the
/// repository untouched. Returns the number of stubs added.
pub fn load_stubs(dir: impl AsRef<Path>, repository: &dyn Repository) -> Result<usize, LoadError> {
    let dir = dir.as_ref();
    let mut stubs = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if !entry.file_type().is_file() || !is_json {
            continue;
        }
        stubs.extend(load_file(entry.path())?);
    }

    let count = stubs.len();
    for stub in stubs {
        tracing::debug!(service = %stub.service, method = %stub.method, output = stub.output.kind(), "adding gRPC stub");
        repository.add(stub);
    }
    tracing::info!(count, dir = %dir.display(), "loaded gRPC stubs");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Output;
    use crate::Storage;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_single_and_array_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("one.json"),
            r#"{"service": "foo.Foo", "method": "Ping", "output": {"data": {"message": "ok"}}}"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(
            dir.path().join("nested/many.json"),
            r#"[
                {"service": "bar.Bar", "method": "Get", "output": {"code": 5, "error": "gone"}},
                {"service": "bar.Bar", "method": "List", "output": {"stream": {"data": [{}], "delay": 1}}}
            ]"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let storage = Storage::new();
        let count = load_stubs(dir.path(), &storage).unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            storage.lookup("foo.Foo", "Ping", None),
            Some(Output::payload(json!({"message": "ok"})))
        );
        assert!(storage.lookup("bar.Bar", "Get", None).is_some());
        assert!(storage.lookup("bar.Bar", "List", None).is_some());
    }

    #[test]
    fn test_invalid_record_fails_whole_load() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"service": "foo.Foo", "method": "Ping", "output": {"data": {}}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"[{"service": "foo.Foo", "method": "Pong", "output": {}}]"#,
        )
        .unwrap();

        let storage = Storage::new();
        let err = load_stubs(dir.path(), &storage).unwrap_err();

        assert!(matches!(err, LoadError::Stub { ref path, .. } if path.ends_with("b.json")));
        assert!(err.to_string().contains("requires one of"));
        assert!(storage.lookup("foo.Foo", "Ping", None).is_none());
    }

    #[test]
    fn test_malformed_json_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let err = load_stubs(dir.path(), &Storage::new()).unwrap_err();
        assert!(matches!(err, LoadError::Stub { .. }));
    }

    #[test]
    fn test_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let err = load_stubs(dir.path().join("missing"), &Storage::new()).unwrap_err();
        assert!(matches!(err, LoadError::Walk { .. }));
    }
}
