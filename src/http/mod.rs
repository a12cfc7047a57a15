//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, body buffering)
//!     → request.rs (request ID, RequestInfo)
//!     → routing layer resolves the route
//!     → container builds the RouteContext (context.rs)
//!     → handler.rs (handler, error handler on failure)
//!     → response.rs (body encoding, route headers)
//!     → Send to client
//! ```

pub mod context;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use context::RouteContext;
pub use handler::{handler, Handler, HandlerError, HandlerResult};
pub use request::{MakeRequestUuid, RequestInfo, X_REQUEST_ID};
pub use server::HttpServer;
