//! Modules: the unit of contribution to an application.

use crate::container::{DependencyMap, Entry};
use crate::routing::RouteDefinition;

/// A named bundle of routes and container entries.
#[derive(Debug, Clone)]
pub struct Module {
    id: String,
    routes: Vec<RouteDefinition>,
    dependencies: DependencyMap,
}

impl Module {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            routes: Vec::new(),
            dependencies: DependencyMap::new(),
        }
    }

    pub fn route(mut self, route: RouteDefinition) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes(mut self, routes: impl IntoIterator<Item = RouteDefinition>) -> Self {
        self.routes.extend(routes);
        self
    }

    pub fn dependency(mut self, address: impl Into<String>, entry: Entry) -> Self {
        self.dependencies.insert(address, entry);
        self
    }

    pub fn dependencies(mut self, dependencies: DependencyMap) -> Self {
        for (address, entry) in dependencies {
            self.dependencies.insert(address, entry);
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Routes tagged with this module's id, and the dependency map.
    pub(crate) fn into_parts(self) -> (String, Vec<RouteDefinition>, DependencyMap) {
        let id = self.id;
        let routes = self
            .routes
            .into_iter()
            .map(|route| route.module(id.clone()))
            .collect();
        (id, routes, self.dependencies)
    }
}
