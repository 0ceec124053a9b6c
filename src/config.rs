//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/orgchart/orgchart.toml`
//! 3. Local config: `<project_dir>/.orgchart.toml`
//! 4. Environment variables: `ORGCHART_*` prefix (`__` separates sections)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::Dimension;

/// Output formatting options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Decimal places for efficiency values in tables
    pub efficiency_precision: usize,
    /// Dimension used by `stats` when none is given
    pub default_dimension: Dimension,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            efficiency_precision: 2,
            default_dimension: Dimension::Country,
        }
    }
}

/// Raw display config for intermediate parsing (None = not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDisplayConfig {
    pub efficiency_precision: Option<usize>,
    pub default_dimension: Option<Dimension>,
}

impl DisplayConfig {
    /// Overlay wins for every field it specifies.
    pub fn merge(&self, overlay: &RawDisplayConfig) -> Self {
        Self {
            efficiency_precision: overlay
                .efficiency_precision
                .unwrap_or(self.efficiency_precision),
            default_dimension: overlay.default_dimension.unwrap_or(self.default_dimension),
        }
    }
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub companies_file: Option<String>,
    pub relationships_file: Option<String>,
    #[serde(default)]
    pub display: RawDisplayConfig,
}

/// Unified configuration for orgchart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the CSV sources (relative paths resolve against the project dir)
    pub data_dir: PathBuf,
    /// Company attributes file name inside `data_dir`
    pub companies_file: String,
    /// Parent/child relations file name inside `data_dir`
    pub relationships_file: String,
    pub display: DisplayConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            companies_file: "companies.csv".into(),
            relationships_file: "relationships.csv".into(),
            display: DisplayConfig::default(),
        }
    }
}

/// Get the XDG config directory for orgchart.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "orgchart").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("orgchart.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".orgchart.toml")
}

/// Expand environment variables and `~` in a path string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
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

impl Settings {
    /// Full path of the companies CSV.
    pub fn companies_path(&self) -> PathBuf {
        self.data_dir.join(&self.companies_file)
    }

    /// Full path of the relationships CSV.
    pub fn relationships_path(&self) -> PathBuf {
        self.data_dir.join(&self.relationships_file)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in `data_dir`, then anchor a relative
    /// `data_dir` at `project_dir`.
    fn resolve_paths(&mut self, project_dir: Option<&Path>) {
        let expanded = PathBuf::from(expand_env_vars(self.data_dir.to_string_lossy().as_ref()));
        self.data_dir = match project_dir {
            Some(dir) if expanded.is_relative() => dir.join(expanded),
            _ => expanded,
        };
    }

    /// Overlay wins for every field it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            companies_file: overlay
                .companies_file
                .clone()
                .unwrap_or_else(|| self.companies_file.clone()),
            relationships_file: overlay
                .relationships_file
                .clone()
                .unwrap_or_else(|| self.relationships_file.clone()),
            display: self.display.merge(&overlay.display),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config and relative `data_dir`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.resolve_paths(project_dir);

        Ok(current)
    }

    /// Apply ORGCHART_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("ORGCHART").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("companies_file") {
            settings.companies_file = val;
        }
        if let Ok(val) = config.get_string("relationships_file") {
            settings.relationships_file = val;
        }
        if let Ok(val) = config.get_string("display.efficiency_precision") {
            settings.display.efficiency_precision = val.parse().map_err(|_| {
                ApplicationError::Config {
                    message: format!("invalid display.efficiency_precision: {val}"),
                }
            })?;
        }
        if let Ok(val) = config.get_string("display.default_dimension") {
            settings.display.default_dimension = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
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
        r#"# orgchart configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/orgchart/orgchart.toml
#   Local:  <project_dir>/.orgchart.toml
#   Env:    ORGCHART_* environment variables, e.g. ORGCHART_DATA_DIR,
#           ORGCHART_DISPLAY__EFFICIENCY_PRECISION

# Directory with the CSV sources (relative to the project directory)
# data_dir = "data"

# companies_file = "companies.csv"
# relationships_file = "relationships.csv"

[display]
# efficiency_precision = 2

# Dimension for `orgchart stats` without argument: level, country or city
# default_dimension = "country"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
