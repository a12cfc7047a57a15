//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteDefinition[] (in module order)
//!     → matcher.rs (compile method/host conditions and anchored path regex)
//!     → Freeze as immutable Router
//!
//! Lookup (per request):
//!     (method, host, path)
//!     → normalize case, prepend "/"
//!     → router.rs (first matching route)
//!     → matcher.rs (extract captures)
//!     → ResolvedRoute (route settings over defaults, or defaults only)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always yields the same route
//! - First match wins (registration order)

pub mod error;
pub mod matcher;
pub mod route;
pub mod router;

pub use error::RouterError;
pub use route::{MethodSpec, ResolvedRoute, ResponseOptions, RouteDefinition, RouteParams, RouterDefaults};
pub use router::Router;
