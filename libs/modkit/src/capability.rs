//! Read-only capability lookup shared with request handlers.
//!
//! Both lookups are total: templates and pages call them unconditionally and get the
//! fallback URL when an optional module is absent.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::resolver::ResolutionResult;
use crate::routes::{RoutePattern, RouteTable};

/// Link target used when an endpoint cannot be resolved.
pub const DEFAULT_FALLBACK_URL: &str = "#";

/// Where an endpoint name points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointTarget {
    module: String,
    pattern: RoutePattern,
    /// Pre-built URL for patterns without placeholders.
    url: Option<String>,
}

impl EndpointTarget {
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Snapshot of the active modules and their endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilitySnapshot {
    active: BTreeSet<String>,
    endpoints: BTreeMap<String, EndpointTarget>,
    fallback_url: String,
}

impl Default for CapabilitySnapshot {
    fn default() -> Self {
        Self {
            active: BTreeSet::new(),
            endpoints: BTreeMap::new(),
            fallback_url: DEFAULT_FALLBACK_URL.to_owned(),
        }
    }
}

impl CapabilitySnapshot {
    /// Build the snapshot; only endpoints owned by active modules are kept.
    #[must_use]
    pub fn build(
        resolution: &ResolutionResult,
        routes: &RouteTable,
        fallback_url: impl Into<String>,
    ) -> Self {
        let active: BTreeSet<String> = resolution.order().iter().cloned().collect();

        let endpoints = routes
            .endpoints()
            .filter(|(_, route)| active.contains(route.module()))
            .map(|(name, route)| {
                let pattern = route.pattern().clone();
                let url = (!pattern.has_params()).then(|| pattern.canonical());
                let target = EndpointTarget {
                    module: route.module().to_owned(),
                    pattern,
                    url,
                };
                (name.to_owned(), target)
            })
            .collect::<BTreeMap<_, _>>();

        tracing::debug!(
            active = active.len(),
            endpoints = endpoints.len(),
            "Capability snapshot built"
        );

        Self {
            active,
            endpoints,
            fallback_url: fallback_url.into(),
        }
    }

    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(id)
    }

    /// URL of a placeholder-free endpoint, or the fallback.
    ///
    /// Endpoints whose path needs values also resolve to the fallback here;
    /// use [`Self::resolve_endpoint_with`] for those.
    #[must_use]
    pub fn resolve_endpoint(&self, name: &str) -> &str {
        self.endpoints
            .get(name)
            .and_then(EndpointTarget::url)
            .unwrap_or(&self.fallback_url)
    }

    /// URL of an endpoint with placeholder values; unused values become the query string.
    #[must_use]
    pub fn resolve_endpoint_with<I, K, V>(&self, name: &str, params: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let Some(target) = self.endpoints.get(name) else {
            return self.fallback_url.clone();
        };
        let params: BTreeMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        target.pattern.build(&params).unwrap_or_else(|| {
            tracing::debug!(endpoint = name, "Endpoint parameters rejected, using fallback");
            self.fallback_url.clone()
        })
    }

    /// Active module identifiers, sorted.
    #[must_use]
    pub fn active_modules(&self) -> &BTreeSet<String> {
        &self.active
    }

    #[must_use]
    pub fn endpoints(&self) -> &BTreeMap<String, EndpointTarget> {
        &self.endpoints
    }

    #[must_use]
    pub fn fallback_url(&self) -> &str {
        &self.fallback_url
    }
}
