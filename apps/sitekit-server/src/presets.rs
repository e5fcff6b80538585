//! Ready-made site configurations selectable by name.

use modkit::ConfigMap;
use modkit::config::{DASHBOARD_TYPE, THEME};
use serde_json::Value;

/// Preset used when neither the configuration nor `APP_TYPE` picks one.
pub const DEFAULT_PRESET: &str = "blog";

/// A requested module list with the theme and dashboard it is meant to run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub modules: &'static [&'static str],
    pub theme: &'static str,
    pub dashboard_type: &'static str,
    pub site_name: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "community",
        modules: &["blog", "chat", "dashboard", "database", "auth"],
        theme: "dark-modern",
        dashboard_type: "blog",
        site_name: "Tech Community",
    },
    Preset {
        name: "portfolio",
        modules: &["blog", "gallery", "dashboard", "database", "auth"],
        theme: "light-professional",
        dashboard_type: "gallery",
        site_name: "Creative Portfolio",
    },
    Preset {
        name: "gaming",
        modules: &["chat", "blog", "dashboard", "database", "auth"],
        theme: "cyberpunk-neon",
        dashboard_type: "chat",
        site_name: "Gaming Hub",
    },
    Preset {
        name: "blog",
        modules: &["blog", "dashboard", "database", "auth"],
        theme: "light-professional",
        dashboard_type: "blog",
        site_name: "My Blog",
    },
    Preset {
        name: "full",
        modules: &["blog", "chat", "gallery", "dashboard", "database", "auth"],
        theme: "dark-modern",
        dashboard_type: "blog",
        site_name: "Full Platform",
    },
];

#[must_use]
pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

#[must_use]
pub fn names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

impl Preset {
    /// Overlay entries this preset contributes; user overlay keys still win over these.
    #[must_use]
    pub fn overlay(&self) -> ConfigMap {
        let mut overlay = ConfigMap::new();
        overlay.insert(THEME.to_owned(), Value::from(self.theme));
        overlay.insert(DASHBOARD_TYPE.to_owned(), Value::from(self.dashboard_type));
        overlay
    }
}
