//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Look up the first route matching method, host and path
//! - Merge route settings over router defaults into a [`ResolvedRoute`]
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Every pattern is compiled up front; lookups never fail
//! - O(n) scan, first match wins, no specificity scoring
//! - No match yields a fallback route built from defaults

use tracing::trace;

use super::error::RouterError;
use super::matcher::{AndMatcher, HostMatcher, Matcher, MethodMatcher, PathPatternMatcher, RequestTarget};
use super::route::{merge_headers, ResolvedRoute, RouteDefinition, RouteParams, RouterDefaults};

/// A route with its conditions compiled.
#[derive(Debug)]
struct CompiledRoute {
    definition: RouteDefinition,
    conditions: AndMatcher,
    path: PathPatternMatcher,
}

impl CompiledRoute {
    fn compile(mut definition: RouteDefinition) -> Result<Self, RouterError> {
        definition.method = definition.method.normalized();

        let path = PathPatternMatcher::new(definition.path.clone())?;

        let mut conditions: Vec<Box<dyn Matcher>> = vec![Box::new(MethodMatcher::new(definition.method.clone()))];
        if let Some(host) = &definition.host {
            conditions.push(Box::new(HostMatcher::new(host.clone())));
        }

        Ok(Self {
            definition,
            conditions: AndMatcher::new(conditions),
            path,
        })
    }
}

/// Ordered route table.
#[derive(Debug)]
pub struct Router {
    routes: Vec<CompiledRoute>,
    defaults: RouterDefaults,
}

impl Router {
    pub fn new(routes: Vec<RouteDefinition>, defaults: RouterDefaults) -> Result<Self, RouterError> {
        let routes = routes
            .into_iter()
            .map(CompiledRoute::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { routes, defaults })
    }

    /// Normalized route for a request. Falls back to the defaults when
    /// nothing matches.
    pub fn get_route(&self, method: &str, host: &str, path: &str) -> ResolvedRoute {
        let method = method.to_uppercase();
        let host = host.to_lowercase();
        let mut path = path.to_lowercase();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }

        let target = RequestTarget {
            method: &method,
            host: &host,
            path: &path,
        };

        for route in &self.routes {
            if !route.conditions.matches(&target) {
                continue;
            }
            let Some(params) = route.path.extract(&path) else {
                continue;
            };

            let resolved = self.resolve(route, &target, params);
            trace!(route = %resolved.id, method = %method, host = %host, path = %path, "Route matched");
            return resolved;
        }

        trace!(method = %method, host = %host, path = %path, "No route matched, using fallback");
        self.fallback(&target)
    }

    fn resolve(&self, route: &CompiledRoute, target: &RequestTarget<'_>, params: RouteParams) -> ResolvedRoute {
        let definition = &route.definition;
        ResolvedRoute {
            id: format!("{}.{}", definition.method, route.path.pattern()),
            method: target.method.to_string(),
            host: target.host.to_string(),
            path: target.path.to_string(),
            pattern: Some(route.path.pattern().to_string()),
            params,
            headers: merge_headers(&definition.headers, &self.defaults.headers),
            options: definition.options.merged_over(&self.defaults.options),
            handler: definition.handler.clone().unwrap_or_else(|| self.defaults.handler.clone()),
            error_handler: definition
                .error_handler
                .clone()
                .unwrap_or_else(|| self.defaults.error_handler.clone()),
            module_id: definition.module_id.clone(),
        }
    }

    fn fallback(&self, target: &RequestTarget<'_>) -> ResolvedRoute {
        ResolvedRoute {
            id: format!("{}.{}", target.method, target.path),
            method: target.method.to_string(),
            host: target.host.to_string(),
            path: target.path.to_string(),
            pattern: None,
            params: RouteParams::default(),
            headers: self.defaults.headers.clone(),
            options: self.defaults.options.clone(),
            handler: self.defaults.handler.clone(),
            error_handler: self.defaults.error_handler.clone(),
            module_id: None,
        }
    }

    /// Route definitions in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.iter().map(|route| &route.definition)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn defaults(&self) -> &RouterDefaults {
        &self.defaults
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{header, HeaderMap, HeaderValue};

    use super::*;
    use crate::http::handler::{handler, Handler};
    use crate::routing::route::ResponseOptions;

    fn noop() -> Handler {
        handler(|ctx| async move { ctx.ok("ok") })
    }

    fn router(routes: Vec<RouteDefinition>) -> Router {
        Router::new(routes, RouterDefaults::default()).unwrap()
    }

    #[test]
    fn test_named_capture() {
        let router = router(vec![RouteDefinition::get(r"hello/(?<name>\w+)")]);

        let route = router.get_route("get", "localhost", "/hello/world");
        assert!(route.is_matched());
        assert_eq!(route.params.get("name"), Some("world"));
        assert_eq!(route.id, r"GET.hello/(?<name>\w+)");
        assert_eq!(route.method, "GET");
    }

    #[test]
    fn test_first_match_wins() {
        let router = router(vec![
            RouteDefinition::get(r"/items/\d+").module("first"),
            RouteDefinition::get(r"/items/(\d+)").module("second"),
        ]);

        let route = router.get_route("GET", "", "/items/5");
        assert_eq!(route.module_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_fallback_uses_defaults() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        let defaults = RouterDefaults {
            headers,
            options: ResponseOptions::json(),
            ..RouterDefaults::default()
        };
        let router = Router::new(vec![RouteDefinition::get("/")], defaults).unwrap();

        let route = router.get_route("post", "Example.com", "Missing");
        assert!(!route.is_matched());
        assert!(route.params.is_empty());
        assert_eq!(route.method, "POST");
        assert_eq!(route.host, "example.com");
        assert_eq!(route.path, "/missing");
        assert_eq!(route.id, "POST./missing");
        assert_eq!(route.headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
        assert!(route.options.is_json());
        assert!(Arc::ptr_eq(&route.handler, &router.defaults().handler));
        assert!(Arc::ptr_eq(&route.error_handler, &router.defaults().error_handler));
    }

    #[test]
    fn test_route_overrides_defaults() {
        let custom = noop();
        let router = router(vec![RouteDefinition::get("/")
            .handler(custom.clone())
            .header(header::CONTENT_TYPE, HeaderValue::from_static("text/html"))
            .options(ResponseOptions::json())]);

        let route = router.get_route("GET", "", "/");
        assert!(Arc::ptr_eq(&route.handler, &custom));
        assert!(Arc::ptr_eq(&route.error_handler, &router.defaults().error_handler));
        assert_eq!(route.headers.get(header::CONTENT_TYPE).unwrap(), "text/html");
        assert!(route.options.is_json());
    }

    #[test]
    fn test_method_set() {
        let router = router(vec![RouteDefinition::new(["GET", "POST"], "/form")]);

        assert!(router.get_route("post", "", "/form").is_matched());
        assert!(!router.get_route("DELETE", "", "/form").is_matched());
        assert_eq!(router.get_route("GET", "", "/form").id, "GET|POST./form");
    }

    #[test]
    fn test_host_constraint() {
        let router = router(vec![
            RouteDefinition::get("/").host("API.example.com").module("api"),
            RouteDefinition::get("/").module("any"),
        ]);

        let api = router.get_route("GET", "api.EXAMPLE.com", "/");
        assert_eq!(api.module_id.as_deref(), Some("api"));

        let other = router.get_route("GET", "www.example.com", "/");
        assert_eq!(other.module_id.as_deref(), Some("any"));
    }

    #[test]
    fn test_path_is_lowercased() {
        let router = router(vec![RouteDefinition::get(r"/users/(?<name>[a-z]+)")]);

        let route = router.get_route("GET", "", "/Users/ADA");
        assert_eq!(route.params.get("name"), Some("ada"));
    }

    #[test]
    fn test_positional_params() {
        let router = router(vec![RouteDefinition::get(r"/(\d+)/(\d+)")]);

        let route = router.get_route("GET", "", "/10/20");
        assert_eq!(route.params.index(1), Some("10"));
        assert_eq!(route.params.index(2), Some("20"));
    }

    #[test]
    fn test_malformed_pattern_rejected() {
        let err = Router::new(vec![RouteDefinition::get("/ok"), RouteDefinition::get("/bad[")], RouterDefaults::default())
            .unwrap_err();
        assert!(matches!(err, RouterError::MalformedPathPattern { .. }));
    }

    #[test]
    fn test_lookup_is_deterministic() {
        let router = router(vec![RouteDefinition::get(r"/a/(?<x>\w+)"), RouteDefinition::get(r"/a/b")]);

        let first = router.get_route("GET", "", "/a/b");
        let second = router.get_route("GET", "", "/a/b");
        assert_eq!(first.id, second.id);
        assert_eq!(first.params, second.params);
        assert_eq!(router.len(), 2);
        assert_eq!(router.routes().count(), 2);
    }
}
