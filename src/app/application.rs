//! Application assembly.
//!
//! # Responsibilities
//! - Register the core dependencies (config, router, route context)
//! - Register every module's dependencies in module order
//! - Build the router from module routes and the `[router]` config
//! - Bind the HTTP server
//!
//! # Design Decisions
//! - Core addresses are registered first and cannot be replaced by modules
//! - The router is a container singleton, built once at assembly
//! - Module and route order are preserved; the first matching route wins

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::app::error::{AppError, AppResult};
use crate::app::module::Module;
use crate::config::AppConfig;
use crate::container::{Container, DependencyMap, Entry, Param, Source};
use crate::http::handler::{self, Handler};
use crate::http::server::ROUTE_CONTEXT;
use crate::http::{HttpServer, RouteContext};
use crate::routing::{RouteDefinition, Router, RouterDefaults};

pub const CORE_CONFIG: &str = "core/Config";
pub const CORE_ROUTER: &str = "core/Router";

/// A container, a router and the config they were built from.
#[derive(Debug)]
pub struct Application {
    config: Arc<AppConfig>,
    container: Arc<Container>,
    router: Arc<Router>,
    modules: Vec<String>,
}

impl Application {
    pub fn builder(config: AppConfig) -> ApplicationBuilder {
        ApplicationBuilder::new(config)
    }

    /// Assemble with the default handlers. An existing `container` keeps its
    /// entries; the core addresses must still be free.
    pub fn new(container: Option<Container>, modules: Vec<Module>, config: AppConfig) -> AppResult<Self> {
        let mut builder = Self::builder(config).modules(modules);
        if let Some(container) = container {
            builder = builder.container(container);
        }
        builder.build()
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Module ids in registration order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn server(&self) -> AppResult<HttpServer> {
        Ok(HttpServer::new(
            Arc::clone(&self.container),
            Arc::clone(&self.router),
            &self.config.server,
        )?)
    }

    /// Bind `server.host:server.port` and serve until the process ends.
    pub async fn run(self) -> AppResult<()> {
        let address = self.config.server.bind_address();
        let listener = TcpListener::bind(&address).await?;
        info!(address = %address, "Listening for connections");
        self.server()?.run(listener).await?;
        Ok(())
    }

    /// Serve on `listener` until `shutdown` completes.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.server()?.run_until(listener, shutdown).await?;
        Ok(())
    }
}

/// Step-by-step assembly of an [`Application`].
pub struct ApplicationBuilder {
    config: AppConfig,
    container: Option<Container>,
    modules: Vec<Module>,
    default_handler: Handler,
    default_error_handler: Handler,
}

impl ApplicationBuilder {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            container: None,
            modules: Vec::new(),
            default_handler: handler::not_found(),
            default_error_handler: handler::internal_error(),
        }
    }

    pub fn container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    pub fn module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    pub fn modules(mut self, modules: impl IntoIterator<Item = Module>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Handler for requests no route matches.
    pub fn default_handler(mut self, handler: Handler) -> Self {
        self.default_handler = handler;
        self
    }

    /// Error handler for routes that do not set their own.
    pub fn default_error_handler(mut self, handler: Handler) -> Self {
        self.default_error_handler = handler;
        self
    }

    pub fn build(self) -> AppResult<Application> {
        if self.modules.is_empty() {
            return Err(AppError::NoModules);
        }

        let mut ids: Vec<String> = Vec::with_capacity(self.modules.len());
        let mut routes = Vec::new();
        let mut dependencies = Vec::with_capacity(self.modules.len());
        for (index, module) in self.modules.into_iter().enumerate() {
            let (id, module_routes, module_dependencies) = module.into_parts();
            if id.trim().is_empty() {
                return Err(AppError::InvalidModule {
                    index,
                    reason: "module id must not be empty".to_string(),
                });
            }
            if ids.contains(&id) {
                return Err(AppError::InvalidModule {
                    index,
                    reason: format!("duplicate module id \"{id}\""),
                });
            }
            ids.push(id);
            routes.extend(module_routes);
            dependencies.push(module_dependencies);
        }

        let container = self.container.unwrap_or_default();
        container.set_batch(core_dependencies(
            self.config.clone(),
            routes,
            self.default_handler,
            self.default_error_handler,
        ))?;
        for module_dependencies in dependencies {
            container.set_batch(module_dependencies)?;
        }

        let router = container.invoke_as::<Router>(CORE_ROUTER)?;

        info!(
            modules = ?ids,
            routes = router.len(),
            dependencies = container.len(),
            "Application assembled"
        );

        Ok(Application {
            config: Arc::new(self.config),
            container: Arc::new(container),
            router,
            modules: ids,
        })
    }
}

/// Entries every application carries.
fn core_dependencies(
    config: AppConfig,
    routes: Vec<RouteDefinition>,
    default_handler: Handler,
    default_error_handler: Handler,
) -> DependencyMap {
    let router = Source::factory(["config"], move |_, args| {
        let config = args.require::<AppConfig>("config")?;
        let defaults = RouterDefaults {
            handler: Arc::clone(&default_handler),
            error_handler: Arc::clone(&default_error_handler),
            headers: config.router.header_map().map_err(|e| args.fail(e))?,
            options: config.router.default_options.clone(),
        };
        Router::new(routes.clone(), defaults).map_err(|e| args.fail(e))
    });

    DependencyMap::new()
        .with(CORE_CONFIG, Entry::new(Source::value(config)))
        .with(CORE_ROUTER, Entry::new(router).param("config", Param::invoke(CORE_CONFIG)))
        .with(ROUTE_CONTEXT, Entry::of::<RouteContext>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerError;

    fn hello_module() -> Module {
        Module::new("hello")
            .route(RouteDefinition::get(r"hello/(?<name>\w+)"))
            .dependency("hello/Greeting", Entry::new(Source::value("hi".to_string())))
    }

    #[test]
    fn test_requires_modules() {
        let err = Application::new(None, vec![], AppConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::NoModules));
    }

    #[test]
    fn test_rejects_empty_module_id() {
        let err = Application::new(None, vec![hello_module(), Module::new("")], AppConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidModule { index: 1, .. }));
    }

    #[test]
    fn test_registers_core_and_module_dependencies() {
        let app = Application::new(None, vec![hello_module()], AppConfig::default()).unwrap();

        let container = app.container();
        assert!(container.contains(CORE_CONFIG));
        assert!(container.contains(CORE_ROUTER));
        assert!(container.contains(ROUTE_CONTEXT));
        assert_eq!(*container.invoke_as::<String>("hello/Greeting").unwrap(), "hi");

        let router = container.invoke_as::<Router>(CORE_ROUTER).unwrap();
        assert!(Arc::ptr_eq(&router, app.router()));
    }

    #[test]
    fn test_routes_carry_module_id() {
        let app = Application::new(None, vec![hello_module()], AppConfig::default()).unwrap();

        let route = app.router().get_route("GET", "localhost", "/hello/ada");
        assert_eq!(route.module_id.as_deref(), Some("hello"));
        assert_eq!(route.params.get("name"), Some("ada"));
    }

    #[test]
    fn test_module_cannot_replace_core_address() {
        let module = Module::new("evil").dependency(CORE_CONFIG, Entry::new(Source::value(0u8)));
        let err = Application::new(None, vec![module], AppConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::Container(ContainerError::DuplicateAddress(ref a)) if a == CORE_CONFIG));
    }

    #[test]
    fn test_malformed_route_fails_assembly() {
        let module = Module::new("broken").route(RouteDefinition::get("/oops("));
        let err = Application::new(None, vec![module], AppConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::Container(ContainerError::Construction { .. })));
    }

    #[test]
    fn test_router_defaults_from_config() {
        let mut config = AppConfig::default();
        config.router.default_headers.insert("x-powered-by".into(), "modkit".into());
        config.router.default_options.json_response = Some(true);

        let app = Application::new(None, vec![hello_module()], config).unwrap();
        let fallback = app.router().get_route("GET", "localhost", "/nope");
        assert_eq!(fallback.headers["x-powered-by"], "modkit");
        assert!(fallback.options.is_json());
    }
}
