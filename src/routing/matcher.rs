//! Route matching logic.
//!
//! # Responsibilities
//! - Match request method against a single verb or a set
//! - Match host (exact match, case-insensitive)
//! - Match path against an anchored regular expression and extract captures
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Host and path are lowercased by the router before matching
//! - Patterns are wrapped as `^(?:...)$` so alternations stay anchored
//! - No condition = always matches (wildcard)

use regex::Regex;

use super::error::RouterError;
use super::route::{MethodSpec, RouteParams};

/// The parts of a request that routing looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestTarget<'a> {
    /// Uppercase verb.
    pub method: &'a str,
    /// Lowercase host, without port.
    pub host: &'a str,
    /// Lowercase path.
    pub path: &'a str,
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, target: &RequestTarget<'_>) -> bool;
}

/// Matches the request method.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: MethodSpec,
}

impl MethodMatcher {
    pub fn new(methods: MethodSpec) -> Self {
        Self {
            methods: methods.normalized(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        self.methods.matches(target.method)
    }
}

/// Matches the request host.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        target.host == self.expected_host
    }
}

/// Matches the whole path against a compiled pattern.
#[derive(Debug, Clone)]
pub struct PathPatternMatcher {
    pattern: String,
    regex: Regex,
}

impl PathPatternMatcher {
    /// Compile `pattern`, prefixing `/` when absent.
    pub fn new(pattern: impl Into<String>) -> Result<Self, RouterError> {
        let pattern = pattern.into();
        let normalized = if pattern.starts_with('/') {
            pattern.clone()
        } else {
            format!("/{pattern}")
        };

        let regex = Regex::new(&format!("^(?:{normalized})$")).map_err(|source| RouterError::MalformedPathPattern {
            pattern: pattern.clone(),
            source,
        })?;

        Ok(Self { pattern, regex })
    }

    /// Pattern as written in the route definition.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Captured parameters, or `None` when the path does not match.
    pub fn extract(&self, path: &str) -> Option<RouteParams> {
        let captures = self.regex.captures(path)?;
        let mut params = RouteParams::default();

        for (index, name) in self.regex.capture_names().enumerate().skip(1) {
            if name.is_none() {
                if let Some(value) = captures.get(index) {
                    params.insert(index.to_string(), value.as_str());
                }
            }
        }

        // Names go last so they win over a positional key with the same text.
        for name in self.regex.capture_names().flatten() {
            if let Some(value) = captures.name(name) {
                params.insert(name, value.as_str());
            }
        }

        Some(params)
    }
}

impl Matcher for PathPatternMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        self.regex.is_match(target.path)
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, target: &RequestTarget<'_>) -> bool {
        self.matchers.iter().all(|m| m.matches(target))
    }
}
