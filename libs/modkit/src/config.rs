//! Layered configuration merging.
//!
//! Layers, lowest first:
//!
//! 1. **Framework globals**: seeded by the composer (`SECRET_KEY`, `THEME`, `MODULES`, ...).
//! 2. **Module defaults**: applied in resolution order; a later module only overrides the
//!    keys it declares itself.
//! 3. **Overlay**: user-supplied mapping, always wins. Keys nobody declared pass through.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::CompositionError;
use crate::registry::ModuleRegistry;

/// Flat key -> value mapping used for every configuration layer.
pub type ConfigMap = BTreeMap<String, Value>;

pub const SECRET_KEY: &str = "SECRET_KEY";
pub const DEBUG: &str = "DEBUG";
pub const DATABASE_PATH: &str = "DATABASE_PATH";
pub const THEME: &str = "THEME";
pub const CACHE_BUSTER: &str = "CACHE_BUSTER";
pub const DASHBOARD_TYPE: &str = "DASHBOARD_TYPE";
pub const SITE_NAME: &str = "SITE_NAME";
pub const MODULES: &str = "MODULES";

/// Keys the framework layer recognizes.
pub const FRAMEWORK_KEYS: &[&str] = &[
    SECRET_KEY,
    DEBUG,
    DATABASE_PATH,
    THEME,
    CACHE_BUSTER,
    DASHBOARD_TYPE,
    SITE_NAME,
    MODULES,
];

pub const DEFAULT_THEME: &str = "light-professional";
pub const DEFAULT_DASHBOARD_TYPE: &str = "default";
pub const DEFAULT_SITE_NAME: &str = "Unnamed Project";

/// Framework globals for an application composed of `order`.
#[must_use]
pub fn framework_defaults<S: AsRef<str>>(order: &[S], site_name: &str) -> ConfigMap {
    let modules: Vec<Value> = order
        .iter()
        .map(|m| Value::String(m.as_ref().to_owned()))
        .collect();

    let mut map = ConfigMap::new();
    map.insert(SECRET_KEY.into(), "change-this-in-production".into());
    map.insert(DEBUG.into(), Value::Bool(true));
    map.insert(DATABASE_PATH.into(), "app.db".into());
    map.insert(THEME.into(), DEFAULT_THEME.into());
    map.insert(CACHE_BUSTER.into(), "1.3".into());
    map.insert(DASHBOARD_TYPE.into(), DEFAULT_DASHBOARD_TYPE.into());
    map.insert(SITE_NAME.into(), site_name.into());
    map.insert(MODULES.into(), Value::Array(modules));
    map
}

/// Configuration error for typed lookups.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for config key '{key}': {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The layer that last set a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layer", content = "module", rename_all = "snake_case")]
pub enum ConfigSource {
    Framework,
    Module(String),
    Overlay,
}

/// Final merged configuration, with per-key provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EffectiveConfiguration {
    values: ConfigMap,
    sources: BTreeMap<String, ConfigSource>,
}

impl EffectiveConfiguration {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    /// Deserialize the value under `key`.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if the value exists but does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let Some(raw) = self.values.get(key) else {
            return Ok(None);
        };
        serde_json::from_value(raw.clone())
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_owned(),
                source: e,
            })
    }

    #[must_use]
    pub fn source_of(&self, key: &str) -> Option<&ConfigSource> {
        self.sources.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Entries sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn values(&self) -> &ConfigMap {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn set(&mut self, key: &str, value: Value, source: ConfigSource) {
        self.values.insert(key.to_owned(), value);
        self.sources.insert(key.to_owned(), source);
    }
}

/// Merges framework globals, module defaults and an overlay into an [`EffectiveConfiguration`].
pub struct ConfigMerger<'r> {
    registry: &'r ModuleRegistry,
    framework: ConfigMap,
}

impl<'r> ConfigMerger<'r> {
    /// A merger with no framework layer; the result starts from an empty mapping.
    #[must_use]
    pub fn new(registry: &'r ModuleRegistry) -> Self {
        Self {
            registry,
            framework: ConfigMap::new(),
        }
    }

    #[must_use]
    pub fn with_framework_defaults(mut self, defaults: ConfigMap) -> Self {
        self.framework = defaults;
        self
    }

    /// # Errors
    /// Returns `UnknownModule` when `order` names a module missing from the registry.
    pub fn merge<S: AsRef<str>>(
        &self,
        order: &[S],
        overlay: &ConfigMap,
    ) -> Result<EffectiveConfiguration, CompositionError> {
        let mut effective = EffectiveConfiguration::default();

        for (key, value) in &self.framework {
            effective.set(key, value.clone(), ConfigSource::Framework);
        }

        let mut declared: Vec<&str> = Vec::new();
        for id in order {
            let descriptor = self.registry.describe(id.as_ref())?;
            for (key, value) in descriptor.defaults() {
                if let Some(ConfigSource::Module(previous)) = effective.source_of(key) {
                    tracing::debug!(
                        key = %key,
                        previous = %previous,
                        module = descriptor.name(),
                        "Module default overrides dependency"
                    );
                }
                effective.set(
                    key,
                    value.clone(),
                    ConfigSource::Module(descriptor.name().to_owned()),
                );
                declared.push(key.as_str());
            }
        }

        for (key, value) in overlay {
            let recognized = self.framework.contains_key(key)
                || FRAMEWORK_KEYS.contains(&key.as_str())
                || declared.contains(&key.as_str());
            if !recognized {
                tracing::debug!(key = %key, "Pass-through overlay key");
            }
            effective.set(key, value.clone(), ConfigSource::Overlay);
        }

        tracing::debug!(keys = effective.len(), "Effective configuration merged");
        Ok(effective)
    }
}
