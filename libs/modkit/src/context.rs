//! Per-module view handed to registration hooks.

use serde::de::DeserializeOwned;

use crate::capability::CapabilitySnapshot;
use crate::config::{ConfigError, EffectiveConfiguration};
use crate::resolver::ResolutionResult;
use crate::routes::{RouteDefinition, RouteTable};

/// Read-only context for one module during the registration phase.
///
/// Everything reachable from here is already final; hooks observe the same state
/// that request handlers will see once the application is published.
#[derive(Clone, Copy)]
pub struct ModuleCtx<'a> {
    module: &'a str,
    resolution: &'a ResolutionResult,
    config: &'a EffectiveConfiguration,
    routes: &'a RouteTable,
    capabilities: &'a CapabilitySnapshot,
}

impl<'a> ModuleCtx<'a> {
    #[must_use]
    pub fn new(
        module: &'a str,
        resolution: &'a ResolutionResult,
        config: &'a EffectiveConfiguration,
        routes: &'a RouteTable,
        capabilities: &'a CapabilitySnapshot,
    ) -> Self {
        Self {
            module,
            resolution,
            config,
            routes,
            capabilities,
        }
    }

    #[must_use]
    pub fn module_name(&self) -> &'a str {
        self.module
    }

    #[must_use]
    pub fn config(&self) -> &'a EffectiveConfiguration {
        self.config
    }

    #[must_use]
    pub fn capabilities(&self) -> &'a CapabilitySnapshot {
        self.capabilities
    }

    #[must_use]
    pub fn resolution(&self) -> &'a ResolutionResult {
        self.resolution
    }

    /// Whether this module was pulled in as a dependency rather than requested.
    #[must_use]
    pub fn is_auto_added(&self) -> bool {
        self.resolution.is_auto_added(self.module)
    }

    /// Routes owned by this module, in registration order.
    pub fn own_routes(self) -> impl Iterator<Item = &'a RouteDefinition> {
        self.routes
            .routes()
            .iter()
            .filter(move |route| route.module() == self.module)
    }

    /// Typed lookup in the effective configuration.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` when the value cannot be deserialized into `T`.
    pub fn config_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.config.get_as(key)
    }
}
