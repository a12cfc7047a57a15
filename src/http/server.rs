//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all dispatch handler
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener
//! - Dispatch requests: route lookup, context construction, handler call
//! - Observability (metrics, correlation IDs)

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use futures_util::FutureExt;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::ServerConfig;
use crate::container::{Container, Params};
use crate::http::context::RouteContext;
use crate::http::handler::{Handler, HandlerResult};
use crate::http::request::{MakeRequestUuid, RequestInfo, X_REQUEST_ID};
use crate::http::response::{apply_route_headers, plain};
use crate::observability::metrics;
use crate::routing::{ResolvedRoute, Router as RouteTable};

/// Container address of the per-request context.
pub const ROUTE_CONTEXT: &str = "core/RouteContext";

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub container: Arc<Container>,
    pub router: Arc<RouteTable>,
    pub origin: Arc<Url>,
    pub max_body_bytes: usize,
}

/// HTTP front end bound to a container and a route table.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(container: Arc<Container>, routes: Arc<RouteTable>, config: &ServerConfig) -> Result<Self, url::ParseError> {
        let state = AppState {
            container,
            router: routes,
            origin: Arc::new(config.origin()?),
            max_body_bytes: config.max_body_bytes,
        };

        Ok(Self {
            router: Self::build_router(config, state),
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let x_request_id = header::HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(x_request_id))
                    .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
            )
    }

    /// Run the server until the process ends.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, std::future::pending()).await
    }

    /// Run the server until `shutdown` completes, then drain in-flight requests.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Route the request, build its context and run the handler.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().as_str().to_string();

    let (parts, body) = request.into_parts();
    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Request body rejected");
            metrics::record_request(&method, 413, "none", start_time);
            return plain(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
        }
    };

    let info = match RequestInfo::from_parts(&parts, bytes, &state.origin) {
        Ok(info) => Arc::new(info),
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Malformed request target");
            metrics::record_request(&method, 400, "none", start_time);
            return plain(StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    let route = Arc::new(state.router.get_route(&method, info.host(), info.path()));
    let route_label = if route.is_matched() { route.id.as_str() } else { "fallback" };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %info.path(),
        route = %route.id,
        module = route.module_id.as_deref().unwrap_or("unknown"),
        "Dispatching request"
    );

    let overrides = Params::new()
        .shared("container", Arc::clone(&state.container))
        .shared("request", info)
        .shared("route", Arc::clone(&route));
    let context = match state.container.make_as::<RouteContext>(ROUTE_CONTEXT, overrides) {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build route context");
            metrics::record_request(&method, 500, route_label, start_time);
            return plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    let mut response = run_handlers(&route, context, &request_id, route_label).await;
    apply_route_headers(&mut response, &route.headers, &route.options);

    let status = response.status();
    metrics::record_request(&method, status.as_u16(), route_label, start_time);
    tracing::debug!(request_id = %request_id, route = %route.id, status = status.as_u16(), "Request handled");

    response
}

/// Run the route handler, falling back to its error handler on failure.
/// A panic counts as a failure.
async fn run_handlers(route: &ResolvedRoute, context: Arc<RouteContext>, request_id: &str, route_label: &str) -> Response {
    let error = match invoke(&route.handler, Arc::clone(&context)).await {
        Ok(response) => return response,
        Err(e) => e,
    };

    tracing::warn!(request_id = %request_id, route = %route.id, error = %error, "Handler failed, running error handler");
    metrics::record_handler_failure(route_label);

    match invoke(&route.error_handler, context).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(request_id = %request_id, route = %route.id, error = %e, "Error handler failed");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// Await `handler`, turning a panic into an error.
async fn invoke(handler: &Handler, context: Arc<RouteContext>) -> HandlerResult {
    match AssertUnwindSafe(async { handler(context).await }).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(panic_message(payload.as_ref()).into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}
