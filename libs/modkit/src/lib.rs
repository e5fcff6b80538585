//! Module resolution and composition engine
//!
//! Given a compiled-in [`ModuleRegistry`] and a list of requested feature modules, the
//! engine computes the dependency-closed module set, a safe registration order, the
//! effective configuration and a collision-free route table, and exposes a
//! [`CapabilitySnapshot`] whose lookups never fail.
//!
//! ```ignore
//! let mut builder = ModuleRegistry::builder();
//! builder
//!     .register(ModuleDecl::new("database"))
//!     .register(ModuleDecl::new("chat").depends_on(["database"]).route(Route::get("/chat", "chat_home")));
//! let registry = Arc::new(builder.build()?);
//!
//! let app = Composer::new(registry).request(["chat"]).compose()?;
//! assert_eq!(app.capabilities().resolve_endpoint("chat_home"), "/chat");
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod capability;
pub mod config;
pub mod context;
pub mod contracts;
pub mod error;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod routes;
pub mod runtime;

pub use capability::{CapabilitySnapshot, DEFAULT_FALLBACK_URL, EndpointTarget};
pub use config::{ConfigError, ConfigMap, ConfigMerger, ConfigSource, EffectiveConfiguration};
pub use context::ModuleCtx;
pub use contracts::RegistrationHook;
pub use error::CompositionError;
pub use registry::{ModuleDecl, ModuleDescriptor, ModuleRegistry, RegistryBuilder};
pub use report::{AutoAdded, ResolutionReport};
pub use resolver::{ResolutionResult, resolve};
pub use routes::{Route, RouteDefinition, RoutePattern, RouteTable};
pub use runtime::{Application, Composer, PublishedApp};
