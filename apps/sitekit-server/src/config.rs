//! Server configuration.
//!
//! Layered with figment: built-in defaults -> YAML file (if provided) ->
//! env (`SITEKIT__*`, nested with `__`) -> CLI overrides.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use modkit::{Composer, ConfigMap, DEFAULT_FALLBACK_URL, ModuleRegistry};
use serde::{Deserialize, Serialize};

use crate::presets::{self, DEFAULT_PRESET};

/// Environment variable that picks a preset when the configuration does not.
pub const APP_TYPE_ENV: &str = "APP_TYPE";

const ENV_PREFIX: &str = "SITEKIT__";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
            site_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `modkit=debug,info`. `RUST_LOG` wins over it.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Preset name; ignored when `modules` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Explicit requested module list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,
    /// User overlay, applied last during configuration merging.
    pub config: ConfigMap,
    pub logging: LoggingConfig,
    pub fallback_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            preset: None,
            modules: None,
            config: ConfigMap::new(),
            logging: LoggingConfig::default(),
            fallback_url: DEFAULT_FALLBACK_URL.to_owned(),
        }
    }
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub preset: Option<String>,
    pub bind_addr: Option<String>,
}

impl AppConfig {
    /// Load the layered configuration.
    ///
    /// # Errors
    /// Returns an error if the YAML file or the environment holds values that do not fit.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(env_provider());

        figment
            .extract()
            .context("failed to load configuration")
    }

    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(preset) = &cli.preset {
            self.preset = Some(preset.clone());
            self.modules = None;
        }
        if let Some(addr) = &cli.bind_addr {
            self.server.bind_addr.clone_from(addr);
        }
    }

    /// Set up a [`Composer`] for this configuration.
    ///
    /// An explicit `modules` list wins; otherwise the preset named by `preset`,
    /// then `APP_TYPE`, then the default preset is used. Preset theme and dashboard
    /// sit below the user overlay.
    ///
    /// # Errors
    /// Returns an error if the selected preset does not exist.
    pub fn composer(&self, registry: Arc<ModuleRegistry>) -> anyhow::Result<Composer> {
        let composer = Composer::new(registry).fallback_url(self.fallback_url.clone());

        let (composer, preset_site_name) = if let Some(modules) = &self.modules {
            tracing::debug!(modules = ?modules, "Using explicit module list");
            (composer.request(modules.iter().cloned()), None)
        } else {
            let name = self
                .preset
                .clone()
                .or_else(|| std::env::var(APP_TYPE_ENV).ok())
                .unwrap_or_else(|| DEFAULT_PRESET.to_owned());
            let preset = presets::find(&name).with_context(|| {
                format!(
                    "unknown preset '{name}' (available: {})",
                    presets::names().join(", ")
                )
            })?;
            tracing::info!(preset = preset.name, "Using preset");
            (
                composer
                    .request(preset.modules.iter().copied())
                    .overlay(preset.overlay()),
                Some(preset.site_name),
            )
        };

        let composer = composer.overlay(self.config.clone());
        let composer = match (&self.server.site_name, preset_site_name) {
            (Some(name), _) => composer.site_name(name.clone()),
            (None, Some(name)) => composer.site_name(name),
            (None, None) => composer,
        };
        Ok(composer)
    }
}

/// `SITEKIT__*` variables nested on `__`. Keys are lowercased except the overlay
/// entries below `config`, so `SITEKIT__CONFIG__THEME` sets `THEME`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX)
        .lowercase(false)
        .map(|key| env_key_path(key.as_str()).into())
}

fn env_key_path(key: &str) -> String {
    match key.split_once(ENV_SEPARATOR) {
        Some((section, overlay_key)) if section.eq_ignore_ascii_case("config") => {
            format!("config.{overlay_key}")
        }
        _ => key.replace(ENV_SEPARATOR, ".").to_ascii_lowercase(),
    }
}
