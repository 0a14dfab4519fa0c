//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/charted/charted.toml`
//! 3. Environment variables: `CHARTED_*` prefix
//!
//! Command-line flags override the loaded settings per invocation.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

/// Unified configuration for charted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base directory for charted state (default: ~/.charted)
    pub base_dir: PathBuf,
    /// Default ownership threshold in percent; 0 shows every edge
    pub ownership_threshold: f64,
    /// Show persons as leaves by default
    pub include_persons: bool,
    /// Print edge percentages in text trees
    pub show_ownership: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: dirs_default_base_dir(),
            ownership_threshold: 0.0,
            include_persons: false,
            show_ownership: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` = not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub base_dir: Option<PathBuf>,
    pub ownership_threshold: Option<f64>,
    pub include_persons: Option<bool>,
    pub show_ownership: Option<bool>,
}

/// Get the default base directory (~/.charted).
fn dirs_default_base_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".charted"))
        .unwrap_or_else(|| PathBuf::from("~/.charted"))
}

/// Get the XDG config directory for charted.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "charted").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("charted.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR`, and `${VAR}`; unknown variables leave the input unchanged.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// State file holding persisted root selections.
    pub fn selection_path(&self) -> PathBuf {
        self.base_dir.join("selection.toml")
    }

    fn expand_paths(&mut self) {
        self.base_dir = expand_path(&self.base_dir);
    }

    /// Apply a file layer: specified values win, the rest is inherited.
    fn apply(&self, overlay: &RawSettings) -> Self {
        Self {
            base_dir: overlay
                .base_dir
                .clone()
                .unwrap_or_else(|| self.base_dir.clone()),
            ownership_threshold: overlay
                .ownership_threshold
                .unwrap_or(self.ownership_threshold),
            include_persons: overlay.include_persons.unwrap_or(self.include_persons),
            show_ownership: overlay.show_ownership.unwrap_or(self.show_ownership),
        }
    }

    /// Load settings with layered precedence from the global config location.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings with an explicit global config file.
    ///
    /// A missing file is skipped; a malformed one is an error.
    pub fn load_from(global_path: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = global_path {
            if path.exists() {
                debug!("loading global config {}", path.display());
                current = current.apply(&load_raw_settings(path)?);
            }
        }

        current = Self::apply_env_overrides(current, env_source())?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply CHARTED_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("base_dir") {
            settings.base_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_float("ownership_threshold") {
            settings.ownership_threshold = val;
        }
        if let Ok(val) = config.get_bool("include_persons") {
            settings.include_persons = val;
        }
        if let Ok(val) = config.get_bool("show_ownership") {
            settings.show_ownership = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# charted configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/charted/charted.toml
#   Env:    CHARTED_<FIELD> environment variables, e.g. CHARTED_OWNERSHIP_THRESHOLD=25
# Command-line flags override both.

# State directory (root selections are kept in base_dir/selection.toml)
# base_dir = "~/.charted"

# Hide ownership edges below this percentage (0 shows all)
# ownership_threshold = 0.0

# Attach persons as leaves under their entity
# include_persons = false

# Print edge percentages in text trees
# show_ownership = true
"#
        .to_string()
    }
}

/// `CHARTED_OWNERSHIP_THRESHOLD=25` sets `ownership_threshold`.
fn env_source() -> Environment {
    Environment::with_prefix("CHARTED")
        .prefix_separator("_")
        .separator("__")
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
