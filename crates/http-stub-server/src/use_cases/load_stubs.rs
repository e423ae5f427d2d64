use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path};
use walkdir::WalkDir;

use crate::entities::{MethodMatcher, Response, Rule};
use crate::error::{InvalidStub, LoadError};
use crate::use_cases::ports::Repository;

/// A structured stub record as written in a `.json` file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonStub {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    pub response: JsonResponse,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonResponse {
    pub status: i64,
    #[serde(default)]
    pub header: BTreeMap<String, HeaderValues>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    #[serde(default)]
    pub raw_body: Option<String>,
}

/// A header given as one value or a list of values
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

impl HeaderValues {
    fn into_vec(self) -> Vec<String> {
        match self {
            HeaderValues::One(value) => vec![value],
            HeaderValues::Many(values) => values,
        }
    }
}

impl JsonStub {
    /// Validate the record and compile it into a rule
    pub fn into_rule(self) -> Result<Rule, InvalidStub> {
        let path = self.path.filter(|path| !path.is_empty());
        let regex = self.regex.filter(|regex| !regex.is_empty());

        let method = self.method.ok_or(InvalidStub::MissingMethod)?;
        let method: MethodMatcher = method.parse().map_err(InvalidStub::UnknownMethod)?;
        let response = self.response.into_response()?;

        match (path, regex) {
            (Some(path), None) => Ok(Rule::exact(path, method, response)),
            (None, Some(regex)) => Ok(Rule::pattern(Regex::new(&regex)?, method, response)),
            _ => Err(InvalidStub::PathOrRegex),
        }
    }
}

impl JsonResponse {
    fn into_response(self) -> Result<Response, InvalidStub> {
        let status = u16::try_from(self.status)
            .ok()
            .filter(|status| (100..=599).contains(status))
            .ok_or(InvalidStub::Status(self.status))?;

        let mut response = Response::new(status);
        for (name, values) in self.header {
            http::HeaderName::from_bytes(name.as_bytes()).map_err(|err| InvalidStub::Header {
                name: name.clone(),
                reason: err.to_string(),
            })?;
            for value in values.into_vec() {
                http::HeaderValue::from_str(&value).map_err(|err| InvalidStub::Header {
                    name: name.clone(),
                    reason: err.to_string(),
                })?;
                response = response.with_header(name.clone(), value);
            }
        }

        match (self.body, self.raw_body) {
            (Some(_), Some(_)) => Err(InvalidStub::AmbiguousBody),
            (Some(body), None) => response.with_json(&body).map_err(InvalidStub::Body),
            (None, Some(raw)) => Ok(response.with_body(raw)),
            (None, None) => Ok(response),
        }
    }
}

fn load_json_file(path: &Path) -> Result<Vec<Rule>, LoadError> {
    let content = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let json_error = |source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    };

    let value: serde_json::Value = serde_json::from_slice(&content).map_err(json_error)?;
    let stubs: Vec<JsonStub> = if value.is_array() {
        serde_json::from_value(value).map_err(json_error)?
    } else {
        vec![serde_json::from_value(value).map_err(json_error)?]
    };

    stubs
        .into_iter()
        .map(|stub| {
            stub.into_rule().map_err(|source| LoadError::Invalid {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

/// Build the rule for a captured response at `<path...>/<METHOD>/<name>.http`
fn load_http_file(root: &Path, path: &Path) -> Result<Rule, LoadError> {
    let invalid = |source| LoadError::Invalid {
        path: path.to_path_buf(),
        source,
    };

    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut dirs: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|component| match component {
                    Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let method = dirs.pop().ok_or_else(|| invalid(InvalidStub::NoMethodDir))?;
    let method: MethodMatcher = method
        .parse()
        .map_err(|method| invalid(InvalidStub::UnknownMethod(method)))?;

    Ok(Rule::raw(format!("/{}", dirs.join("/")), method, path))
}

/// Load every stub under `dir` into `repository`.
///
/// `.json` files hold one structured rule or an array of them. `.http` files
/// are captured responses whose location names the path and method. Other
/// files are ignored. Everything is validated before the first rule is added.
/// Returns the number of rules added.
pub fn load_stubs(dir: impl AsRef<Path>, repository: &dyn Repository) -> Result<usize, LoadError> {
    let dir = dir.as_ref();
    let mut rules = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => rules.extend(load_json_file(path)?),
            Some("http") => rules.push(load_http_file(dir, path)?),
            _ => continue,
        }
    }

    let count = rules.len();
    for rule in rules {
        tracing::debug!(rule = %rule, match_type = %rule.match_type(), "adding HTTP stub");
        repository.add(rule);
    }
    tracing::info!(count, dir = %dir.display(), "loaded HTTP stubs");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Invocation, Method, ResponseSource};
    use crate::Storage;
    use std::fs;
    use tempfile::TempDir;

    fn parse(json: &str) -> Result<Rule, InvalidStub> {
        serde_json::from_str::<JsonStub>(json).unwrap().into_rule()
    }

    #[test]
    fn test_exact_rule() {
        let rule = parse(
            r#"{"path": "/users", "method": "GET",
                "response": {"status": 200, "header": {"X-One": "1", "X-Many": ["a", "b"]},
                             "body": {"users": []}}}"#,
        )
        .unwrap();

        assert!(rule.matches(&Invocation::new(Method::Get, "/users")));
        let response = rule.response().unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"{\"users\":[]}\n");
        assert_eq!(response.header("x-one"), Some("1"));
        assert_eq!(
            response
                .headers
                .iter()
                .filter(|(name, _)| name == "X-Many")
                .count(),
            2
        );
    }

    #[test]
    fn test_regex_rule_with_wildcard_method() {
        let rule = parse(
            r#"{"regex": "^/items/[0-9]+$", "method": "*",
                "response": {"status": 204}}"#,
        )
        .unwrap();

        assert!(rule.matches(&Invocation::new(Method::Put, "/items/7")));
        assert!(!rule.matches(&Invocation::new(Method::Put, "/items/x")));
        assert!(rule.response().unwrap().body.is_empty());
    }

    #[test]
    fn test_raw_body_is_verbatim() {
        let rule = parse(
            r#"{"path": "/text", "method": "GET",
                "response": {"status": 200, "raw_body": "plain text"}}"#,
        )
        .unwrap();
        let response = rule.response().unwrap();
        assert_eq!(response.body, b"plain text");
        assert_eq!(response.header("content-type"), None);
    }

    #[test]
    fn test_validation_errors() {
        let both = r#"{"path": "/a", "regex": "/a", "method": "GET", "response": {"status": 200}}"#;
        assert!(matches!(parse(both), Err(InvalidStub::PathOrRegex)));

        let neither = r#"{"method": "GET", "response": {"status": 200}}"#;
        let err = parse(neither).unwrap_err();
        assert_eq!(err.to_string(), r#"either "path" or "regex" field is required"#);

        let no_method = r#"{"path": "/a", "response": {"status": 200}}"#;
        assert!(matches!(parse(no_method), Err(InvalidStub::MissingMethod)));

        let bad_method = r#"{"path": "/a", "method": "FETCH", "response": {"status": 200}}"#;
        assert!(matches!(parse(bad_method), Err(InvalidStub::UnknownMethod(m)) if m == "FETCH"));

        let bad_regex = r#"{"regex": "([", "method": "GET", "response": {"status": 200}}"#;
        assert!(matches!(parse(bad_regex), Err(InvalidStub::Regex(_))));

        let bad_status = r#"{"path": "/a", "method": "GET", "response": {"status": 600}}"#;
        let err = parse(bad_status).unwrap_err();
        assert_eq!(err.to_string(), "status code 600 is not valid");

        let two_bodies = r#"{"path": "/a", "method": "GET",
            "response": {"status": 200, "body": {}, "raw_body": "x"}}"#;
        assert!(matches!(parse(two_bodies), Err(InvalidStub::AmbiguousBody)));

        let bad_header = r#"{"path": "/a", "method": "GET",
            "response": {"status": 200, "header": {"bad header": "x"}}}"#;
        assert!(matches!(parse(bad_header), Err(InvalidStub::Header { .. })));
    }

    #[test]
    fn test_load_json_and_http_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("users.json"),
            r#"{"path": "/users", "method": "GET", "response": {"status": 200, "body": {}}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("many.json"),
            r#"[
                {"path": "/a", "method": "POST", "response": {"status": 201}},
                {"regex": "^/b", "method": "*", "response": {"status": 202}}
            ]"#,
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("api/orders/POST")).unwrap();
        fs::write(
            dir.path().join("api/orders/POST/created.http"),
            "HTTP/1.1 201 Created\r\n\r\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("GET")).unwrap();
        fs::write(dir.path().join("GET/index.http"), "HTTP/1.1 200 OK\r\n\r\nroot").unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let storage = Storage::new();
        assert_eq!(load_stubs(dir.path(), &storage).unwrap(), 5);

        let orders = storage
            .find(&Invocation::new(Method::Post, "/api/orders"))
            .unwrap();
        assert!(matches!(orders.response, ResponseSource::Raw(_)));
        assert_eq!(orders.response().unwrap().status, 201);

        let root = storage.find(&Invocation::new(Method::Get, "/")).unwrap();
        assert_eq!(root.response().unwrap().body, b"root");

        assert!(storage.find(&Invocation::new(Method::Post, "/a")).is_some());
        assert!(storage.find(&Invocation::new(Method::Delete, "/b/c")).is_some());
        assert!(storage.find(&Invocation::new(Method::Get, "/a")).is_none());
    }

    #[test]
    fn test_http_file_without_method_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("loose.http"), "HTTP/1.1 200 OK\r\n\r\n").unwrap();

        let err = load_stubs(dir.path(), &Storage::new()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                source: InvalidStub::NoMethodDir,
                ..
            }
        ));
    }

    #[test]
    fn test_http_file_under_unknown_method() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("api/FETCH")).unwrap();
        fs::write(dir.path().join("api/FETCH/x.http"), "HTTP/1.1 200 OK\r\n\r\n").unwrap();

        let err = load_stubs(dir.path(), &Storage::new()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                source: InvalidStub::UnknownMethod(_),
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_file_leaves_repository_untouched() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"path": "/a", "method": "GET", "response": {"status": 200}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b.json"),
            r#"{"path": "/b", "method": "GET", "response": {"status": 42}}"#,
        )
        .unwrap();

        let storage = Storage::new();
        let err = load_stubs(dir.path(), &storage).unwrap_err();

        assert!(matches!(err, LoadError::Invalid { ref path, .. } if path.ends_with("b.json")));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{").unwrap();
        let err = load_stubs(dir.path(), &Storage::new()).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }

    #[test]
    fn test_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = load_stubs(dir.path().join("nope"), &Storage::new()).unwrap_err();
        assert!(matches!(err, LoadError::Walk { .. }));
    }
}
