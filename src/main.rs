//! modkit server
//!
//! Loads the configuration, initializes logging and metrics, and serves the
//! bundled `base` module.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::Router ──▶ ResolvedRoute
//!                          │                                   │
//!                          ▼                                   ▼
//!                   container::Container ──▶ RouteContext ──▶ handler
//!                                                              │
//!     Client Response                                          │
//!     ◀────────────── route headers ◀── response ◀─────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use modkit::config::{load_config, AppConfig};
use modkit::observability::{logging, metrics};
use modkit::Application;

#[derive(Parser, Debug)]
#[command(name = "modkit", version, about = "Modular request-dispatch server")]
struct Cli {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.logger)?;

    tracing::info!("modkit v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        request_timeout_secs = config.server.request_timeout_secs,
        config_file = ?cli.config,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = Application::new(None, vec![base::module()], config)?;
    app.run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Demo module served by the binary.
mod base {
    use std::sync::Arc;

    use modkit::container::{Args, Constructible, ContainerResult};
    use modkit::http::{handler, RouteContext};
    use modkit::routing::ResponseOptions;
    use modkit::{Entry, Module, Param, RouteDefinition};
    use serde::Serialize;

    pub const USER: &str = "base/models/User";

    #[derive(Debug, Clone, Serialize)]
    pub struct User {
        pub name: String,
    }

    impl Constructible for User {
        const PARAMS: &'static [&'static str] = &["name"];

        fn construct(args: &Args) -> ContainerResult<Self> {
            let name = args.cloned::<String>("name")?.unwrap_or_else(|| "stranger".to_string());
            Ok(Self { name })
        }
    }

    pub fn module() -> Module {
        Module::new("base")
            .dependency(
                USER,
                Entry::of::<User>().param("name", Param::literal("guest".to_string())),
            )
            .route(RouteDefinition::get("/").handler(handler(|ctx: Arc<RouteContext>| async move {
                ctx.ok(&format!("modkit is running (module: {})", ctx.module_id()))
            })))
            .route(
                RouteDefinition::get(r"hello/(?<name>\w+)")
                    .options(ResponseOptions::json())
                    .handler(handler(|ctx: Arc<RouteContext>| async move {
                        let name = ctx.route_params().get("name").unwrap_or_default().to_string();
                        let user = ctx
                            .container()
                            .make_as::<User>(USER, modkit::Params::new().literal("name", name))?;
                        ctx.ok(&*user)
                    })),
            )
            .route(RouteDefinition::post("/echo").handler(handler(|ctx: Arc<RouteContext>| async move {
                ctx.send_with(
                    axum::http::StatusCode::OK,
                    &ctx.request().body_value(),
                    &ResponseOptions::json(),
                )
            })))
    }
}
