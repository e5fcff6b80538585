//! Dependency resolution.
//!
//! Computes the dependency closure of a requested module list and orders it so that
//! every module comes after all of its dependencies. The walk is a depth-first
//! post-order with three visitation states; reaching a module that is still
//! in progress on the current path is a cycle.
//!
//! Ties between modules with no ordering constraint are broken by position in the
//! requested list (first appearance), then by identifier, so a given request always
//! produces the same order regardless of container iteration order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::error::CompositionError;
use crate::registry::ModuleRegistry;

/// Outcome of resolving a requested module list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    requested: Vec<String>,
    order: Vec<String>,
    auto_added: BTreeSet<String>,
    required_by: BTreeMap<String, BTreeSet<String>>,
}

impl ResolutionResult {
    /// Requested identifiers, duplicates removed, in request order.
    #[must_use]
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Every active module, dependencies first.
    #[must_use]
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Modules that are active only because something depends on them.
    #[must_use]
    pub fn auto_added(&self) -> &BTreeSet<String> {
        &self.auto_added
    }

    #[must_use]
    pub fn is_auto_added(&self, id: &str) -> bool {
        self.auto_added.contains(id)
    }

    /// Active modules that declare `id` as a direct dependency.
    ///
    /// Only tracked for auto-added modules; `None` for requested or inactive ones.
    #[must_use]
    pub fn requested_by(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.required_by.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.order.iter().any(|m| m == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

struct Walk<'r> {
    registry: &'r ModuleRegistry,
    rank: HashMap<String, usize>,
    state: HashMap<String, Visit>,
    path: Vec<String>,
    order: Vec<String>,
}

impl Walk<'_> {
    fn tie_key<'k>(&self, id: &'k str) -> (usize, &'k str) {
        (self.rank.get(id).copied().unwrap_or(usize::MAX), id)
    }

    fn visit(&mut self, id: &str, required_by: Option<&str>) -> Result<(), CompositionError> {
        match self.state.get(id) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = self.path.iter().position(|m| m == id).unwrap_or(0);
                let mut cycle = self.path[start..].to_vec();
                cycle.push(id.to_owned());
                return Err(CompositionError::CyclicDependency { path: cycle });
            }
            None => {}
        }

        let registry = self.registry;
        let descriptor = registry
            .get(id)
            .ok_or_else(|| CompositionError::UnknownModule {
                module: id.to_owned(),
                required_by: required_by.map(str::to_owned),
            })?;

        self.state.insert(id.to_owned(), Visit::InProgress);
        self.path.push(id.to_owned());

        let mut deps: Vec<&str> = descriptor
            .dependencies()
            .iter()
            .map(String::as_str)
            .collect();
        deps.sort_by(|a, b| self.tie_key(a).cmp(&self.tie_key(b)));
        for dep in deps {
            self.visit(dep, Some(id))?;
        }

        self.path.pop();
        self.state.insert(id.to_owned(), Visit::Done);
        self.order.push(id.to_owned());
        Ok(())
    }
}

/// Resolve `requested` against `registry`.
///
/// Pure function of its inputs: no I/O, no global state.
///
/// # Errors
/// Returns `UnknownModule` when a requested or depended-on identifier is not registered,
/// and `CyclicDependency` with the full cycle path when the closure contains a cycle.
pub fn resolve<S: AsRef<str>>(
    registry: &ModuleRegistry,
    requested: &[S],
) -> Result<ResolutionResult, CompositionError> {
    let mut roots: Vec<String> = Vec::with_capacity(requested.len());
    for id in requested {
        let id = id.as_ref();
        if !roots.iter().any(|r| r == id) {
            roots.push(id.to_owned());
        }
    }

    let mut walk = Walk {
        registry,
        rank: roots
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.clone(), pos))
            .collect(),
        state: HashMap::new(),
        path: Vec::new(),
        order: Vec::new(),
    };
    for root in &roots {
        walk.visit(root, None)?;
    }
    let order = walk.order;

    let auto_added: BTreeSet<String> = order
        .iter()
        .filter(|id| !roots.contains(id))
        .cloned()
        .collect();

    let mut required_by: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for id in &order {
        for dep in registry.describe(id)?.dependencies() {
            if auto_added.contains(dep) {
                required_by
                    .entry(dep.clone())
                    .or_default()
                    .insert(id.clone());
            }
        }
    }

    for (module, requirers) in &required_by {
        tracing::debug!(module = %module, required_by = ?requirers, "Auto-added dependency");
    }
    tracing::info!(requested = ?roots, order = ?order, "Module resolution complete");

    Ok(ResolutionResult {
        requested: roots,
        order,
        auto_added,
        required_by,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::registry::{ModuleDecl, RegistryBuilder};

    fn registry(edges: &[(&str, &[&str])]) -> ModuleRegistry {
        let mut builder = RegistryBuilder::default();
        for (name, deps) in edges {
            builder.register(ModuleDecl::new(*name).depends_on(deps.iter().copied()));
        }
        builder.build().unwrap()
    }

    fn site() -> ModuleRegistry {
        registry(&[
            ("database", &[]),
            ("auth", &["database"]),
            ("blog", &["auth", "database"]),
            ("chat", &["database"]),
            ("dashboard", &[]),
        ])
    }

    #[test]
    fn blog_pulls_in_auth_and_database() {
        let result = resolve(&site(), &["blog"]).unwrap();
        assert_eq!(result.order(), &["database", "auth", "blog"]);
        assert_eq!(
            result.auto_added().iter().collect::<Vec<_>>(),
            vec!["auth", "database"]
        );
        assert_eq!(
            result.requested_by("database").unwrap().iter().collect::<Vec<_>>(),
            vec!["auth", "blog"]
        );
        assert_eq!(
            result.requested_by("auth").unwrap().iter().collect::<Vec<_>>(),
            vec!["blog"]
        );
        assert!(result.requested_by("blog").is_none());
    }

    #[test]
    fn requested_dependency_is_not_auto_added() {
        let result = resolve(&site(), &["chat", "database"]).unwrap();
        assert_eq!(result.order(), &["database", "chat"]);
        assert!(result.auto_added().is_empty());
    }

    #[test]
    fn independent_modules_keep_request_order() {
        let result = resolve(&site(), &["dashboard", "chat"]).unwrap();
        assert_eq!(result.order(), &["dashboard", "database", "chat"]);

        let result = resolve(&site(), &["chat", "dashboard"]).unwrap();
        assert_eq!(result.order(), &["database", "chat", "dashboard"]);
    }

    #[test]
    fn sibling_dependencies_prefer_request_position_then_identifier() {
        let reg = registry(&[
            ("app", &["zeta", "alpha", "mid"]),
            ("zeta", &[]),
            ("alpha", &[]),
            ("mid", &[]),
        ]);
        let result = resolve(&reg, &["app"]).unwrap();
        assert_eq!(result.order(), &["alpha", "mid", "zeta", "app"]);

        let result = resolve(&reg, &["app", "zeta"]).unwrap();
        assert_eq!(result.order(), &["zeta", "alpha", "mid", "app"]);
    }

    #[test]
    fn duplicate_requests_are_ignored() {
        let result = resolve(&site(), &["chat", "chat", "dashboard", "chat"]).unwrap();
        assert_eq!(result.requested(), &["chat", "dashboard"]);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn empty_request_resolves_to_nothing() {
        let result = resolve::<&str>(&site(), &[]).unwrap();
        assert!(result.is_empty());
        assert!(result.auto_added().is_empty());
    }

    #[test]
    fn two_node_cycle_is_reported_with_full_path() {
        let reg = registry(&[("a", &["b"]), ("b", &["a"])]);
        match resolve(&reg, &["a"]) {
            Err(CompositionError::CyclicDependency { path }) => {
                assert_eq!(path, vec!["a", "b", "a"]);
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn cycle_below_an_acyclic_prefix_excludes_the_prefix() {
        let reg = registry(&[
            ("top", &["x"]),
            ("x", &["y"]),
            ("y", &["z"]),
            ("z", &["x"]),
        ]);
        match resolve(&reg, &["top"]) {
            Err(CompositionError::CyclicDependency { path }) => {
                assert_eq!(path, vec!["x", "y", "z", "x"]);
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn unknown_requested_module_fails() {
        match resolve(&site(), &["blog", "gallery"]) {
            Err(CompositionError::UnknownModule {
                module,
                required_by,
            }) => {
                assert_eq!(module, "gallery");
                assert_eq!(required_by, None);
            }
            other => panic!("expected UnknownModule, got {other:?}"),
        }
    }

    #[test]
    fn unknown_dependency_names_its_requirer() {
        let reg = registry(&[("portfolio", &["gallery"])]);
        match resolve(&reg, &["portfolio"]) {
            Err(CompositionError::UnknownModule {
                module,
                required_by,
            }) => {
                assert_eq!(module, "gallery");
                assert_eq!(required_by.as_deref(), Some("portfolio"));
            }
            other => panic!("expected UnknownModule, got {other:?}"),
        }
    }

    #[test]
    fn diamond_is_emitted_once() {
        let reg = registry(&[
            ("top", &["left", "right"]),
            ("left", &["base"]),
            ("right", &["base"]),
            ("base", &[]),
        ]);
        let result = resolve(&reg, &["top"]).unwrap();
        assert_eq!(result.order(), &["base", "left", "right", "top"]);
    }
}
