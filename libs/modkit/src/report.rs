//! Structured summary of a composition, for consoles and logs.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::{DASHBOARD_TYPE, EffectiveConfiguration, SITE_NAME, THEME};
use crate::registry::{ModuleDescriptor, ModuleRegistry};
use crate::resolver::ResolutionResult;
use crate::routes::RouteTable;

/// A module pulled in by dependency, with every active module that required it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoAdded {
    pub module: String,
    pub required_by: BTreeSet<String>,
}

/// What was asked for, what got loaded and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub requested: Vec<String>,
    pub loaded: Vec<String>,
    pub auto_added: Vec<AutoAdded>,
    pub backend_modules: Vec<String>,
    pub route_count: usize,
    pub theme: Option<String>,
    pub dashboard_type: Option<String>,
    pub site_name: Option<String>,
}

impl ResolutionReport {
    #[must_use]
    pub fn new(
        registry: &ModuleRegistry,
        resolution: &ResolutionResult,
        config: &EffectiveConfiguration,
        routes: &RouteTable,
    ) -> Self {
        let auto_added = resolution
            .auto_added()
            .iter()
            .map(|module| AutoAdded {
                module: module.clone(),
                required_by: resolution.requested_by(module).cloned().unwrap_or_default(),
            })
            .collect();

        let backend_modules = resolution
            .order()
            .iter()
            .filter(|id| registry.get(id).is_some_and(ModuleDescriptor::is_backend))
            .cloned()
            .collect();

        Self {
            requested: resolution.requested().to_vec(),
            loaded: resolution.order().to_vec(),
            auto_added,
            backend_modules,
            route_count: routes.len(),
            theme: config.get_str(THEME).map(str::to_owned),
            dashboard_type: config.get_str(DASHBOARD_TYPE).map(str::to_owned),
            site_name: config.get_str(SITE_NAME).map(str::to_owned),
        }
    }

    /// Emit the report through `tracing`.
    pub fn log(&self) {
        tracing::info!(
            requested = ?self.requested,
            loaded = ?self.loaded,
            routes = self.route_count,
            theme = self.theme.as_deref().unwrap_or("-"),
            dashboard = self.dashboard_type.as_deref().unwrap_or("-"),
            "Application composed"
        );
        for entry in &self.auto_added {
            tracing::info!(
                module = %entry.module,
                required_by = ?entry.required_by,
                "Auto-added module"
            );
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::{ConfigMap, ConfigMerger, framework_defaults};
    use crate::registry::{ModuleDecl, RegistryBuilder};
    use crate::resolver::resolve;
    use crate::routes::Route;

    #[test]
    fn report_lists_auto_added_with_requirers() {
        let mut builder = RegistryBuilder::default();
        builder
            .register(ModuleDecl::new("database"))
            .register(
                ModuleDecl::new("auth")
                    .depends_on(["database"])
                    .route(Route::get("/login", "login")),
            )
            .register(
                ModuleDecl::new("blog")
                    .depends_on(["auth", "database"])
                    .route(Route::get("/blog", "blog_home"))
                    .default(DASHBOARD_TYPE, "blog"),
            );
        let registry = builder.build().unwrap();
        let resolution = resolve(&registry, &["blog"]).unwrap();
        let config = ConfigMerger::new(&registry)
            .with_framework_defaults(framework_defaults(resolution.order(), "My Blog"))
            .merge(resolution.order(), &ConfigMap::new())
            .unwrap();
        let routes = RouteTable::register(&registry, resolution.order()).unwrap();

        let report = ResolutionReport::new(&registry, &resolution, &config, &routes);
        assert_eq!(report.requested, vec!["blog"]);
        assert_eq!(report.loaded, vec!["database", "auth", "blog"]);
        assert_eq!(report.backend_modules, vec!["database"]);
        assert_eq!(report.route_count, 2);
        assert_eq!(report.dashboard_type.as_deref(), Some("blog"));
        assert_eq!(report.theme.as_deref(), Some("light-professional"));
        assert_eq!(report.site_name.as_deref(), Some("My Blog"));

        let database = report
            .auto_added
            .iter()
            .find(|a| a.module == "database")
            .unwrap();
        assert_eq!(
            database.required_by.iter().collect::<Vec<_>>(),
            vec!["auth", "blog"]
        );
        assert_eq!(report.auto_added.len(), 2);
    }
}
