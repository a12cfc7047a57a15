//! Modular request-dispatch framework: an address-keyed dependency container
//! and a pattern-based router, composed by a thin HTTP application shell.

pub mod app;
pub mod config;
pub mod container;
pub mod http;
pub mod observability;
pub mod routing;

pub use app::{Application, Module};
pub use config::AppConfig;
pub use container::{Container, Entry, Param, Params, Source};
pub use http::{handler, HttpServer, RouteContext};
pub use routing::{RouteDefinition, Router};
