//! Configuration file loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns tiers 3 and 4; the binary layers tiers 1 and 2 on top.
//! A missing or malformed config file is never fatal: defaults apply and the
//! outcome is reported once logging is initialised.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "HILDEGARD_CONFIG";

/// Compiled defaults
pub mod defaults {
    pub const BIND: &str = "127.0.0.1:5780";
    pub const LOG_LEVEL: &str = "info";
    pub const CATALOG_URL: &str =
        "https://raw.githubusercontent.com/dennisangemi/hildegard/refs/heads/main/data/anagrafica_canti.csv";
    pub const CATALOG_FALLBACK_PATH: &str = "sample_canti.csv";
    pub const CACHE_TTL_SECS: u64 = 3600;
    pub const SPREADSHEET_NAME: &str = "hildegard_form_manual_suggestions";
    pub const CSV_DIR: &str = "suggestions";
    pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 4 * 3600;
}

/// Contents of `suggest.toml`; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind: Option<String>,
    pub log_level: Option<String>,
    pub catalog: CatalogSection,
    pub matcher: MatcherSection,
    pub store: StoreSection,
    pub sessions: SessionSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub url: Option<String>,
    pub fallback_path: Option<PathBuf>,
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSection {
    /// `weighted` or `substring`
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// `google_sheets` or `csv`
    pub backend: Option<String>,
    pub spreadsheet_name: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub csv_dir: Option<PathBuf>,
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub idle_timeout_secs: Option<u64>,
}

/// Per-user config file location: `<config_dir>/hildegard/suggest.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hildegard").join("suggest.toml"))
}

/// Pick the config file: explicit path, then `HILDEGARD_CONFIG`, then the per-user default
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// How the config file lookup went
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(PathBuf),
    Missing(Option<PathBuf>),
    Invalid { path: PathBuf, error: String },
}

/// Result of [`load_or_default`]: the effective file config and how it was obtained
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: TomlConfig,
    pub outcome: LoadOutcome,
}

impl ConfigLoad {
    /// Report the outcome; called once logging is up
    pub fn log(&self) {
        match &self.outcome {
            LoadOutcome::Loaded(path) => info!("Loaded config from {}", path.display()),
            LoadOutcome::Missing(Some(path)) => {
                info!("Config file {} not found, using defaults", path.display())
            }
            LoadOutcome::Missing(None) => {
                info!("No config file location available, using defaults")
            }
            LoadOutcome::Invalid { path, error } => {
                warn!("Ignoring config file {}: {}", path.display(), error)
            }
        }
    }
}

/// Load the config file if there is one, falling back to defaults
///
/// Does not log, so it can run before the tracing subscriber is installed.
pub fn load_or_default(path: Option<&Path>) -> ConfigLoad {
    let Some(path) = path else {
        return ConfigLoad {
            config: TomlConfig::default(),
            outcome: LoadOutcome::Missing(None),
        };
    };

    if !path.exists() {
        return ConfigLoad {
            config: TomlConfig::default(),
            outcome: LoadOutcome::Missing(Some(path.to_path_buf())),
        };
    }

    match load_toml_config(path) {
        Ok(config) => ConfigLoad {
            config,
            outcome: LoadOutcome::Loaded(path.to_path_buf()),
        },
        Err(e) => ConfigLoad {
            config: TomlConfig::default(),
            outcome: LoadOutcome::Invalid {
                path: path.to_path_buf(),
                error: e.to_string(),
            },
        },
    }
}
