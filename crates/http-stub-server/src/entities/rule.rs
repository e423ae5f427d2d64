use regex::Regex;
use std::path::PathBuf;

use super::{read_raw_response, Invocation, Method, MethodMatcher, Response};
use crate::error::RawResponseError;

/// How a rule selects request paths
#[derive(Debug, Clone)]
pub enum PathMatcher {
    Exact(String),
    /// Unanchored: matches when the expression finds a match anywhere in the path
    Pattern(Regex),
}

impl PathMatcher {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(expected) => expected == path,
            PathMatcher::Pattern(regex) => regex.is_match(path),
        }
    }

    pub fn match_type(&self) -> MatchType {
        match self {
            PathMatcher::Exact(_) => MatchType::Exact,
            PathMatcher::Pattern(_) => MatchType::Pattern,
        }
    }
}

impl std::fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathMatcher::Exact(path) => f.write_str(path),
            PathMatcher::Pattern(regex) => write!(f, "~{}", regex.as_str()),
        }
    }
}

/// Specificity class of a rule. Exact sorts before pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchType {
    Exact,
    Pattern,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Exact => write!(f, "exact"),
            MatchType::Pattern => write!(f, "regex"),
        }
    }
}

/// Where a rule's response comes from
#[derive(Debug, Clone)]
pub enum ResponseSource {
    Fixed(Response),
    /// A captured response file, read again on every request
    Raw(PathBuf),
}

/// A stored HTTP stub
#[derive(Debug, Clone)]
pub struct Rule {
    pub path: PathMatcher,
    pub method: MethodMatcher,
    pub response: ResponseSource,
}

impl Rule {
    pub fn exact(path: impl Into<String>, method: MethodMatcher, response: Response) -> Self {
        Self {
            path: PathMatcher::Exact(path.into()),
            method,
            response: ResponseSource::Fixed(response),
        }
    }

    pub fn pattern(regex: Regex, method: MethodMatcher, response: Response) -> Self {
        Self {
            path: PathMatcher::Pattern(regex),
            method,
            response: ResponseSource::Fixed(response),
        }
    }

    pub fn raw(path: impl Into<String>, method: MethodMatcher, file: impl Into<PathBuf>) -> Self {
        Self {
            path: PathMatcher::Exact(path.into()),
            method,
            response: ResponseSource::Raw(file.into()),
        }
    }

    pub fn match_type(&self) -> MatchType {
        self.path.match_type()
    }

    pub fn matches(&self, invocation: &Invocation) -> bool {
        self.method.matches(invocation.method) && self.path.matches(&invocation.path)
    }

    /// Produce the response to serve. Raw rules hit the filesystem each time.
    pub fn response(&self) -> Result<Response, RawResponseError> {
        match &self.response {
            ResponseSource::Fixed(response) => Ok(response.clone()),
            ResponseSource::Raw(file) => {
                // raw rules always name their method; a wildcard reads as GET
                let method = match self.method {
                    MethodMatcher::Exact(method) => method,
                    MethodMatcher::Any => Method::Get,
                };
                read_raw_response(file, method)
            }
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
