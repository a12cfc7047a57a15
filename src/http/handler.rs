//! Route handler contract.
//!
//! A handler receives the per-request [`RouteContext`] and produces a
//! response. Failing with `Err` sends the request to the route's error
//! handler instead.

use std::future::Future;
use std::sync::Arc;

use axum::response::Response;
use futures_util::future::{BoxFuture, FutureExt};

use crate::http::context::RouteContext;

/// Error a handler may fail with; anything `?` can lift.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of one handler invocation.
pub type HandlerResult = Result<Response, HandlerError>;

/// Shared, type-erased async handler.
pub type Handler = Arc<dyn Fn(Arc<RouteContext>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wrap an async closure as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Arc<RouteContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// Default handler: 404 with a short body.
pub fn not_found() -> Handler {
    handler(|ctx: Arc<RouteContext>| async move { ctx.not_found("Not Found") })
}

/// Default error handler: 500 with a short body.
pub fn internal_error() -> Handler {
    handler(|ctx: Arc<RouteContext>| async move { ctx.error("Internal Server Error") })
}
