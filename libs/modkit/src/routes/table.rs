//! Shared route table built from the resolved module order.
//!
//! Collisions are fatal and reported with the first owner as `existing`: the table never
//! resolves a (path, method) clash by letting the later module win.

use std::collections::{BTreeMap, HashMap};

use http::Method;
use serde::{Serialize, Serializer};

use super::{RouteDefinition, RoutePattern};
use crate::error::CompositionError;
use crate::registry::ModuleRegistry;

/// All routes contributed by the active modules.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
    /// (path shape, method) -> index into `routes`
    by_key: HashMap<(String, Method), usize>,
    /// endpoint name -> index of its first (canonical) route
    endpoints: BTreeMap<String, usize>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the routes of every module in `order`, dependencies first.
    ///
    /// # Errors
    /// Returns `UnknownModule` for an identifier missing from the registry,
    /// `RouteCollision` when two modules claim the same path and method (or a
    /// placeholder and a catch-all at the same position, whatever the methods), and
    /// `EndpointCollision` when two modules claim the same endpoint name.
    pub fn register<S: AsRef<str>>(
        registry: &ModuleRegistry,
        order: &[S],
    ) -> Result<Self, CompositionError> {
        let mut table = Self::new();
        for id in order {
            let descriptor = registry.describe(id.as_ref())?;
            if descriptor.is_backend() {
                tracing::debug!(module = descriptor.name(), "Backend module, no routes");
                continue;
            }
            for route in descriptor.routes() {
                table.insert(route.clone())?;
            }
            tracing::debug!(
                module = descriptor.name(),
                routes = descriptor.routes().len(),
                "Routes registered"
            );
        }
        tracing::info!(routes = table.len(), "Route table built");
        Ok(table)
    }

    /// Insert a single route; nothing is inserted when any of its methods collides.
    ///
    /// # Errors
    /// Returns `RouteCollision` or `EndpointCollision` as described on [`Self::register`].
    pub fn insert(&mut self, route: RouteDefinition) -> Result<(), CompositionError> {
        let shape = route.pattern().shape();
        for method in route.methods() {
            if let Some(&idx) = self.by_key.get(&(shape.clone(), method.clone())) {
                return Err(CompositionError::RouteCollision {
                    path: route.pattern().canonical(),
                    method: method.clone(),
                    existing: self.routes[idx].module().to_owned(),
                    new: route.module().to_owned(),
                });
            }
        }

        if let Some(existing) = self
            .routes
            .iter()
            .find(|r| r.pattern().catch_all_conflicts_with(route.pattern()))
        {
            return Err(CompositionError::RouteCollision {
                path: route.pattern().canonical(),
                method: route.methods().first().cloned().unwrap_or(Method::GET),
                existing: existing.module().to_owned(),
                new: route.module().to_owned(),
            });
        }

        if let Some(&idx) = self.endpoints.get(route.endpoint()) {
            let existing = self.routes[idx].module();
            if existing != route.module() {
                return Err(CompositionError::EndpointCollision {
                    name: route.endpoint().to_owned(),
                    existing: existing.to_owned(),
                    new: route.module().to_owned(),
                });
            }
        }

        let idx = self.routes.len();
        for method in route.methods() {
            self.by_key.insert((shape.clone(), method.clone()), idx);
        }
        self.endpoints
            .entry(route.endpoint().to_owned())
            .or_insert(idx);
        self.routes.push(route);
        Ok(())
    }

    /// Routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route owning `(path, method)`; `path` may use either placeholder syntax.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<&RouteDefinition> {
        let shape = RoutePattern::parse(path).ok()?.shape();
        self.by_key
            .get(&(shape, method.clone()))
            .map(|&idx| &self.routes[idx])
    }

    /// Canonical route of an endpoint: the first one registered under that name.
    #[must_use]
    pub fn endpoint(&self, name: &str) -> Option<&RouteDefinition> {
        self.endpoints.get(name).map(|&idx| &self.routes[idx])
    }

    /// Endpoint names with their canonical routes, sorted by name.
    pub fn endpoints(&self) -> impl Iterator<Item = (&str, &RouteDefinition)> {
        self.endpoints
            .iter()
            .map(|(name, &idx)| (name.as_str(), &self.routes[idx]))
    }

    /// Routes grouped by path shape, groups in order of first registration.
    ///
    /// An HTTP host mounts one method router per group.
    #[must_use]
    pub fn by_path(&self) -> Vec<(&RoutePattern, Vec<&RouteDefinition>)> {
        let mut groups: Vec<(&RoutePattern, Vec<&RouteDefinition>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for route in &self.routes {
            let shape = route.pattern().shape();
            if let Some(&pos) = index.get(&shape) {
                groups[pos].1.push(route);
            } else {
                index.insert(shape, groups.len());
                groups.push((route.pattern(), vec![route]));
            }
        }
        groups
    }
}

impl Serialize for RouteTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.routes)
    }
}
