//! Startup-time composition errors.
//!
//! Every variant is fatal: a composition that fails never publishes an application.

use http::Method;

/// Errors raised while building the registry or composing an application.
#[derive(thiserror::Error, Debug)]
pub enum CompositionError {
    #[error("unknown module '{module}'{}", required_by_suffix(.required_by.as_deref()))]
    UnknownModule {
        module: String,
        required_by: Option<String>,
    },

    #[error("cyclic dependency: {}", .path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    #[error("module '{module}' is registered more than once")]
    DuplicateModule { module: String },

    #[error(
        "route collision on {method} {path}: already registered by '{existing}', claimed again by '{new}'"
    )]
    RouteCollision {
        path: String,
        method: Method,
        existing: String,
        new: String,
    },

    #[error("endpoint '{name}' already registered by '{existing}', claimed again by '{new}'")]
    EndpointCollision {
        name: String,
        existing: String,
        new: String,
    },

    #[error("module '{module}' declares invalid route pattern '{pattern}': {reason}")]
    InvalidRoutePattern {
        module: String,
        pattern: String,
        reason: String,
    },

    #[error("registration hook of module '{module}' failed")]
    Register {
        module: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CompositionError {
    #[must_use]
    pub fn unknown_module(module: impl Into<String>) -> Self {
        Self::UnknownModule {
            module: module.into(),
            required_by: None,
        }
    }

    /// Module identifiers this error is about, in the order they appear in the message.
    #[must_use]
    pub fn modules(&self) -> Vec<&str> {
        match self {
            Self::UnknownModule {
                module,
                required_by,
            } => std::iter::once(module.as_str())
                .chain(required_by.as_deref())
                .collect(),
            Self::CyclicDependency { path } => path.iter().map(String::as_str).collect(),
            Self::DuplicateModule { module }
            | Self::InvalidRoutePattern { module, .. }
            | Self::Register { module, .. } => vec![module.as_str()],
            Self::RouteCollision { existing, new, .. }
            | Self::EndpointCollision { existing, new, .. } => {
                vec![existing.as_str(), new.as_str()]
            }
        }
    }
}

fn required_by_suffix(required_by: Option<&str>) -> String {
    required_by.map_or_else(String::new, |m| format!(" (required by '{m}')"))
}
