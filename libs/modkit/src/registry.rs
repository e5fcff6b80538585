//! Module registry: the compiled-in catalog of modules.
//!
//! A registry is declared through [`RegistryBuilder`] and validated once in
//! [`RegistryBuilder::build`]. After that it is immutable and shared by reference
//! (usually behind an `Arc`) with every composition that uses it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::ModuleCtx;
use crate::contracts::RegistrationHook;
use crate::error::CompositionError;
use crate::routes::{Route, RouteDefinition};

/// Declaration of a module, consumed by [`RegistryBuilder::register`].
pub struct ModuleDecl {
    name: String,
    deps: Vec<String>,
    routes: Vec<Route>,
    defaults: BTreeMap<String, Value>,
    hook: Option<Arc<dyn RegistrationHook>>,
}

impl ModuleDecl {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deps: Vec::new(),
            routes: Vec::new(),
            defaults: BTreeMap::new(),
            hook: None,
        }
    }

    /// Declare direct dependencies. Repeated identifiers are kept once, in first-seen order.
    #[must_use]
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for dep in deps {
            let dep = dep.into();
            if !self.deps.contains(&dep) {
                self.deps.push(dep);
            }
        }
        self
    }

    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    #[must_use]
    pub fn routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Declare a configuration default; declaring a key is what allows this module to
    /// override the same key set by one of its dependencies.
    #[must_use]
    pub fn default(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Callback run once, in resolution order, after the application is composed.
    #[must_use]
    pub fn on_register<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ModuleCtx<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn RegistrationHook>) -> Self {
        self.hook = Some(hook);
        self
    }
}

/// Validated, immutable description of a module.
#[derive(Clone)]
pub struct ModuleDescriptor {
    name: String,
    deps: Vec<String>,
    routes: Vec<RouteDefinition>,
    defaults: BTreeMap<String, Value>,
    hook: Option<Arc<dyn RegistrationHook>>,
}

impl ModuleDescriptor {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct dependencies in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.deps
    }

    #[must_use]
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    #[must_use]
    pub fn defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }

    #[must_use]
    pub fn hook(&self) -> Option<&Arc<dyn RegistrationHook>> {
        self.hook.as_ref()
    }

    /// Backend modules contribute no routes (e.g. a database layer).
    #[must_use]
    pub fn is_backend(&self) -> bool {
        self.routes.is_empty()
    }

    fn from_decl(decl: ModuleDecl) -> Result<Self, CompositionError> {
        if decl.deps.contains(&decl.name) {
            return Err(CompositionError::CyclicDependency {
                path: vec![decl.name.clone(), decl.name],
            });
        }

        let mut routes = Vec::with_capacity(decl.routes.len());
        for route in decl.routes {
            let pattern = route.pattern.clone();
            let def = route.into_definition(&decl.name).map_err(|e| {
                CompositionError::InvalidRoutePattern {
                    module: decl.name.clone(),
                    pattern,
                    reason: e.to_string(),
                }
            })?;
            routes.push(def);
        }

        Ok(Self {
            name: decl.name,
            deps: decl.deps,
            routes,
            defaults: decl.defaults,
            hook: decl.hook,
        })
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("routes", &self.routes)
            .field("defaults", &self.defaults)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Collects module declarations; validation happens in [`Self::build`].
#[derive(Default)]
pub struct RegistryBuilder {
    decls: Vec<ModuleDecl>,
}

impl RegistryBuilder {
    pub fn register(&mut self, decl: ModuleDecl) -> &mut Self {
        self.decls.push(decl);
        self
    }

    /// Validate every declaration and freeze the catalog.
    ///
    /// # Errors
    /// Returns `DuplicateModule` when two declarations share a name,
    /// `CyclicDependency` for a module depending on itself, and
    /// `InvalidRoutePattern` for an unparsable route path.
    pub fn build(self) -> Result<ModuleRegistry, CompositionError> {
        let mut modules = BTreeMap::new();
        for decl in self.decls {
            if modules.contains_key(&decl.name) {
                return Err(CompositionError::DuplicateModule { module: decl.name });
            }
            let descriptor = ModuleDescriptor::from_decl(decl)?;
            modules.insert(descriptor.name.clone(), descriptor);
        }
        tracing::debug!(modules = modules.len(), "Module registry built");
        Ok(ModuleRegistry { modules })
    }
}

/// Immutable module catalog keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleDescriptor>,
}

impl ModuleRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// # Errors
    /// Returns `UnknownModule` when `id` is not registered.
    pub fn describe(&self, id: &str) -> Result<&ModuleDescriptor, CompositionError> {
        self.modules
            .get(id)
            .ok_or_else(|| CompositionError::unknown_module(id))
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    #[must_use]
    pub fn all_identifiers(&self) -> BTreeSet<String> {
        self.modules.keys().cloned().collect()
    }

    /// Descriptors sorted by identifier.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
