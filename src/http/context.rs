//! Per-request context built through the container.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;

use crate::container::{Args, Constructible, Container, ContainerResult};
use crate::http::handler::HandlerResult;
use crate::http::request::RequestInfo;
use crate::http::response::build_response;
use crate::routing::{ResolvedRoute, ResponseOptions, RouteParams};

/// Everything a handler sees about the current request.
#[derive(Debug, Clone)]
pub struct RouteContext {
    container: Arc<Container>,
    request: Arc<RequestInfo>,
    route: Arc<ResolvedRoute>,
}

impl Constructible for RouteContext {
    const PARAMS: &'static [&'static str] = &["container", "request", "route"];

    fn construct(args: &Args) -> ContainerResult<Self> {
        Ok(Self {
            container: args.require::<Container>("container")?,
            request: args.require::<RequestInfo>("request")?,
            route: args.require::<ResolvedRoute>("route")?,
        })
    }
}

impl RouteContext {
    pub fn new(container: Arc<Container>, request: Arc<RequestInfo>, route: Arc<ResolvedRoute>) -> Self {
        Self {
            container,
            request,
            route,
        }
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    pub fn route(&self) -> &ResolvedRoute {
        &self.route
    }

    /// Id of the module that contributed the route, `"unknown"` otherwise.
    pub fn module_id(&self) -> &str {
        self.route.module_id.as_deref().unwrap_or("unknown")
    }

    pub fn route_params(&self) -> &RouteParams {
        &self.route.params
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        self.request.query_params()
    }

    /// Reply with the route's effective options.
    pub fn send<T: Serialize + ?Sized>(&self, status: StatusCode, body: &T) -> HandlerResult {
        build_response(status, body, &self.route.options)
    }

    /// Reply with `options` taking precedence over the route's.
    pub fn send_with<T: Serialize + ?Sized>(&self, status: StatusCode, body: &T, options: &ResponseOptions) -> HandlerResult {
        build_response(status, body, &options.merged_over(&self.route.options))
    }

    pub fn ok<T: Serialize + ?Sized>(&self, body: &T) -> HandlerResult {
        self.send(StatusCode::OK, body)
    }

    pub fn not_found<T: Serialize + ?Sized>(&self, body: &T) -> HandlerResult {
        self.send(StatusCode::NOT_FOUND, body)
    }

    pub fn error<T: Serialize + ?Sized>(&self, body: &T) -> HandlerResult {
        self.send(StatusCode::INTERNAL_SERVER_ERROR, body)
    }
}
