//! Route definitions and the normalized route handed to the shell.

use std::collections::BTreeMap;
use std::fmt;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};

use crate::http::handler::{self, Handler};

/// Accepted request method(s) for a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSpec {
    One(String),
    AnyOf(Vec<String>),
}

impl MethodSpec {
    /// Uppercase every verb.
    pub(crate) fn normalized(self) -> Self {
        match self {
            MethodSpec::One(method) => MethodSpec::One(method.to_uppercase()),
            MethodSpec::AnyOf(methods) => MethodSpec::AnyOf(methods.into_iter().map(|m| m.to_uppercase()).collect()),
        }
    }

    /// `method` must already be uppercase.
    pub fn matches(&self, method: &str) -> bool {
        match self {
            MethodSpec::One(expected) => expected == method,
            MethodSpec::AnyOf(expected) => expected.iter().any(|m| m == method),
        }
    }
}

impl fmt::Display for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodSpec::One(method) => f.write_str(method),
            MethodSpec::AnyOf(methods) => f.write_str(&methods.join("|")),
        }
    }
}

impl From<&str> for MethodSpec {
    fn from(method: &str) -> Self {
        MethodSpec::One(method.to_string())
    }
}

impl From<String> for MethodSpec {
    fn from(method: String) -> Self {
        MethodSpec::One(method)
    }
}

impl From<Method> for MethodSpec {
    fn from(method: Method) -> Self {
        MethodSpec::One(method.as_str().to_string())
    }
}

impl<const N: usize> From<[&str; N]> for MethodSpec {
    fn from(methods: [&str; N]) -> Self {
        MethodSpec::AnyOf(methods.iter().map(|m| m.to_string()).collect())
    }
}

impl From<Vec<String>> for MethodSpec {
    fn from(methods: Vec<String>) -> Self {
        MethodSpec::AnyOf(methods)
    }
}

/// Response options, merged field by field.
///
/// Precedence: per-call > route > router default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseOptions {
    /// Serialize bodies as JSON and default the content type.
    pub json_response: Option<bool>,
}

impl ResponseOptions {
    pub fn json() -> Self {
        Self {
            json_response: Some(true),
        }
    }

    /// `self` over `defaults`.
    pub fn merged_over(&self, defaults: &ResponseOptions) -> ResponseOptions {
        ResponseOptions {
            json_response: self.json_response.or(defaults.json_response),
        }
    }

    pub fn is_json(&self) -> bool {
        self.json_response.unwrap_or(false)
    }
}

/// `route` headers over `defaults`; a name set on the route replaces every
/// default value for that name.
pub(crate) fn merge_headers(route: &HeaderMap, defaults: &HeaderMap) -> HeaderMap {
    let mut merged = defaults.clone();
    for name in route.keys() {
        merged.remove(name);
        for value in route.get_all(name) {
            merged.append(name.clone(), value.clone());
        }
    }
    merged
}

/// One entry of the route table.
#[derive(Clone)]
pub struct RouteDefinition {
    pub method: MethodSpec,
    /// Exact host, case-insensitive. `None` matches any host.
    pub host: Option<String>,
    /// Path pattern, anchored at both ends.
    pub path: String,
    pub handler: Option<Handler>,
    pub error_handler: Option<Handler>,
    pub headers: HeaderMap,
    pub options: ResponseOptions,
    /// Contributing module, filled in by the application.
    pub module_id: Option<String>,
}

impl RouteDefinition {
    pub fn new(method: impl Into<MethodSpec>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            host: None,
            path: path.into(),
            handler: None,
            error_handler: None,
            headers: HeaderMap::new(),
            options: ResponseOptions::default(),
            module_id: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn error_handler(mut self, handler: Handler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn options(mut self, options: ResponseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn module(mut self, id: impl Into<String>) -> Self {
        self.module_id = Some(id.into());
        self
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("method", &self.method)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("has_handler", &self.handler.is_some())
            .field("has_error_handler", &self.error_handler.is_some())
            .field("module_id", &self.module_id)
            .finish()
    }
}

/// Router-level defaults applied to every normalized route.
#[derive(Clone)]
pub struct RouterDefaults {
    pub handler: Handler,
    pub error_handler: Handler,
    pub headers: HeaderMap,
    pub options: ResponseOptions,
}

impl Default for RouterDefaults {
    fn default() -> Self {
        Self {
            handler: handler::not_found(),
            error_handler: handler::internal_error(),
            headers: HeaderMap::new(),
            options: ResponseOptions::default(),
        }
    }
}

impl fmt::Debug for RouterDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterDefaults")
            .field("headers", &self.headers)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Values captured from the request path.
///
/// Named groups are keyed by name, unnamed groups by their 1-based group
/// index. A name wins over an index if both produce the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Unnamed capture by group index.
    pub fn index(&self, index: usize) -> Option<&str> {
        self.get(&index.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

/// Fully defaulted, request-bound route.
#[derive(Clone)]
pub struct ResolvedRoute {
    /// `"<METHOD>.<pattern>"`, or `"<METHOD>.<path>"` for the fallback.
    pub id: String,
    pub method: String,
    pub host: String,
    pub path: String,
    /// Matched pattern; `None` for the fallback route.
    pub pattern: Option<String>,
    pub params: RouteParams,
    pub headers: HeaderMap,
    pub options: ResponseOptions,
    pub handler: Handler,
    pub error_handler: Handler,
    pub module_id: Option<String>,
}

impl ResolvedRoute {
    pub fn is_matched(&self) -> bool {
        self.pattern.is_some()
    }
}

impl fmt::Debug for ResolvedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedRoute")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .field("headers", &self.headers)
            .field("options", &self.options)
            .field("module_id", &self.module_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_method_spec_membership() {
        let single = MethodSpec::from("get").normalized();
        assert!(single.matches("GET"));
        assert!(!single.matches("POST"));

        let set = MethodSpec::from(["get", "Post"]).normalized();
        assert!(set.matches("POST"));
        assert!(!set.matches("DELETE"));
        assert_eq!(set.to_string(), "GET|POST");
    }

    #[test]
    fn test_route_headers_replace_defaults_per_name() {
        let mut defaults = HeaderMap::new();
        defaults.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        defaults.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let mut route = HeaderMap::new();
        route.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));

        let merged = merge_headers(&route, &defaults);
        assert_eq!(merged.get(header::CONTENT_TYPE).unwrap(), "text/html");
        assert_eq!(merged.get(header::CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_options_fall_back_field_by_field() {
        let defaults = ResponseOptions::json();
        assert!(ResponseOptions::default().merged_over(&defaults).is_json());

        let route = ResponseOptions {
            json_response: Some(false),
        };
        assert!(!route.merged_over(&defaults).is_json());
    }

    #[test]
    fn test_params_lookup_by_name_and_index() {
        let mut params = RouteParams::default();
        params.insert("name", "world");
        params.insert("2", "42");
        assert_eq!(params.get("name"), Some("world"));
        assert_eq!(params.index(2), Some("42"));
        assert_eq!(params.index(1), None);
    }
}
