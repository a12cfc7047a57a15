//! Dependency container subsystem.
//!
//! # Data Flow
//! ```text
//! DependencyMap (address → Entry)
//!     → registry.rs (set / set_batch, validated, append-only)
//!
//! make(address, overrides)
//!     → entry.rs (merge overrides over defaults)
//!     → resolver.rs (evaluate Resolved params: invoke / make / from)
//!     → entry.rs (project values onto the source's declared order)
//!     → Source builds the instance
//!
//! invoke(address)
//!     → singleton slot hit? return cached
//!     → otherwise make(address, {}) once and cache
//! ```

pub mod entry;
pub mod error;
pub mod registry;
pub mod resolver;

pub use entry::{Args, Constructible, DependencyMap, Entry, Instance, Param, Params, Source};
pub use error::{BoxError, ContainerError, ContainerResult};
pub use registry::Container;
pub use resolver::Resolver;
