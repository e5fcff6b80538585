//! Composer - drives one composition through its phases
//!
//! Phase order:
//! - resolve (dependency closure and order)
//! - config (framework globals, module defaults, overlay)
//! - routes (shared route table, collisions are fatal)
//! - capabilities (read-only lookup snapshot)
//! - register (module hooks, in resolution order)
//!
//! Nothing is published until every phase succeeded.

use std::sync::Arc;

use serde_json::json;

use crate::capability::{CapabilitySnapshot, DEFAULT_FALLBACK_URL};
use crate::config::{
    ConfigMap, ConfigMerger, DEFAULT_SITE_NAME, EffectiveConfiguration, framework_defaults,
};
use crate::context::ModuleCtx;
use crate::error::CompositionError;
use crate::registry::ModuleRegistry;
use crate::report::ResolutionReport;
use crate::resolver::{ResolutionResult, resolve};
use crate::routes::RouteTable;

/// Inputs of one composition.
#[derive(Clone)]
pub struct Composer {
    registry: Arc<ModuleRegistry>,
    requested: Vec<String>,
    overlay: ConfigMap,
    site_name: String,
    fallback_url: String,
}

impl Composer {
    #[must_use]
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            registry,
            requested: Vec::new(),
            overlay: ConfigMap::new(),
            site_name: DEFAULT_SITE_NAME.to_owned(),
            fallback_url: DEFAULT_FALLBACK_URL.to_owned(),
        }
    }

    #[must_use]
    pub fn request<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested.extend(modules.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn overlay(mut self, overlay: ConfigMap) -> Self {
        self.overlay.extend(overlay);
        self
    }

    #[must_use]
    pub fn site_name(mut self, name: impl Into<String>) -> Self {
        self.site_name = name.into();
        self
    }

    #[must_use]
    pub fn fallback_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = url.into();
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Run every phase and return the composed application.
    ///
    /// # Errors
    /// Returns the first `CompositionError` raised by any phase.
    pub fn compose(&self) -> Result<Application, CompositionError> {
        let registry = &*self.registry;

        tracing::info!("Phase: resolve");
        let resolution = resolve(registry, self.requested.as_slice())?;

        tracing::info!("Phase: config");
        let config = ConfigMerger::new(registry)
            .with_framework_defaults(framework_defaults(resolution.order(), &self.site_name))
            .merge(resolution.order(), &self.overlay)?;

        tracing::info!("Phase: routes");
        let routes = RouteTable::register(registry, resolution.order())?;

        tracing::info!("Phase: capabilities");
        let capabilities =
            CapabilitySnapshot::build(&resolution, &routes, self.fallback_url.clone());

        tracing::info!("Phase: register");
        for id in resolution.order() {
            let descriptor = registry.describe(id)?;
            let Some(hook) = descriptor.hook() else {
                continue;
            };
            tracing::debug!(module = %id, "Running registration hook");
            let ctx = ModuleCtx::new(id, &resolution, &config, &routes, &capabilities);
            hook.register(&ctx)
                .map_err(|e| CompositionError::Register {
                    module: id.clone(),
                    source: e,
                })?;
        }

        let report = ResolutionReport::new(registry, &resolution, &config, &routes);
        report.log();

        Ok(Application {
            registry: Arc::clone(&self.registry),
            resolution: Arc::new(resolution),
            config: Arc::new(config),
            routes: Arc::new(routes),
            capabilities: Arc::new(capabilities),
            report: Arc::new(report),
        })
    }
}

/// A fully composed application. Immutable; cheap to clone.
#[derive(Debug, Clone)]
pub struct Application {
    registry: Arc<ModuleRegistry>,
    resolution: Arc<ResolutionResult>,
    config: Arc<EffectiveConfiguration>,
    routes: Arc<RouteTable>,
    capabilities: Arc<CapabilitySnapshot>,
    report: Arc<ResolutionReport>,
}

impl Application {
    #[must_use]
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    #[must_use]
    pub fn resolution(&self) -> &ResolutionResult {
        &self.resolution
    }

    /// Active modules, dependencies first.
    #[must_use]
    pub fn modules(&self) -> &[String] {
        self.resolution.order()
    }

    #[must_use]
    pub fn config(&self) -> &EffectiveConfiguration {
        &self.config
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn capabilities(&self) -> &CapabilitySnapshot {
        &self.capabilities
    }

    /// Shared handle for request handlers.
    #[must_use]
    pub fn capabilities_arc(&self) -> Arc<CapabilitySnapshot> {
        Arc::clone(&self.capabilities)
    }

    #[must_use]
    pub fn report(&self) -> &ResolutionReport {
        &self.report
    }

    /// Snapshot, configuration, routes and report as one JSON document.
    #[must_use]
    pub fn inspect(&self) -> serde_json::Value {
        json!({
            "report": &*self.report,
            "capabilities": &*self.capabilities,
            "config": &*self.config,
            "routes": &*self.routes,
        })
    }
}
