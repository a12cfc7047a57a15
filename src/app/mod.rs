//! Application shell.
//!
//! # Data Flow
//! ```text
//! AppConfig + Module[]
//!     → application.rs (core entries, module entries → Container)
//!     → core/Router built from module routes (in module order)
//!     → HttpServer bound to the container and router
//! ```

pub mod application;
pub mod error;
pub mod module;

pub use application::{Application, ApplicationBuilder, CORE_CONFIG, CORE_ROUTER};
pub use error::{AppError, AppResult};
pub use module::Module;
