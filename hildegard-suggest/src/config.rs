//! Command line and effective configuration
//!
//! Every command-line option also reads an environment variable (clap `env`).
//! Values neither given on the command line nor in the environment fall back
//! to the TOML file, then to the compiled defaults in
//! [`hildegard_common::config::defaults`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use hildegard_common::config::{defaults, TomlConfig};
use hildegard_common::{Error, Result};

use crate::matcher::MatcherKind;
use crate::store::{StoreBackend, StoreConfig};

/// Command-line arguments for hildegard-suggest
#[derive(Parser, Debug, Default)]
#[command(name = "hildegard-suggest")]
#[command(about = "Guided song suggestions for the Hildegard liturgical song catalog")]
#[command(version)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "HILDEGARD_BIND")]
    pub bind: Option<SocketAddr>,

    /// Default tracing filter when RUST_LOG is unset
    #[arg(long, env = "HILDEGARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Remote catalog CSV
    #[arg(long, env = "HILDEGARD_CATALOG_URL")]
    pub catalog_url: Option<String>,

    /// Skip the remote catalog and read only the local fallback file
    #[arg(long)]
    pub offline: bool,

    /// Local catalog CSV used when the remote one is unreachable
    #[arg(long, env = "HILDEGARD_CATALOG_FALLBACK")]
    pub catalog_fallback: Option<PathBuf>,

    /// Title matching strategy
    #[arg(long, value_enum, env = "HILDEGARD_MATCHER")]
    pub matcher: Option<MatcherKind>,

    /// Where suggestions are written
    #[arg(long, value_enum, env = "HILDEGARD_STORE")]
    pub store: Option<StoreBackend>,

    /// Target spreadsheet id, skipping the lookup by name
    #[arg(long, env = "HILDEGARD_SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// Service-account JSON key file
    #[arg(long, env = "HILDEGARD_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Output directory for the CSV backend
    #[arg(long, env = "HILDEGARD_CSV_DIR")]
    pub csv_dir: Option<PathBuf>,
}

/// Effective settings after all tiers are applied
#[derive(Debug, Clone)]
pub struct SuggestConfig {
    pub bind: SocketAddr,
    pub log_level: String,
    /// `None` when running offline
    pub catalog_url: Option<String>,
    pub catalog_fallback: PathBuf,
    pub catalog_ttl: Duration,
    pub matcher: MatcherKind,
    pub store: StoreConfig,
    pub session_idle_timeout: Duration,
}

impl SuggestConfig {
    pub fn resolve(cli: &Cli, file: &TomlConfig) -> Result<Self> {
        let bind = match cli.bind {
            Some(addr) => addr,
            None => {
                let raw = file.bind.as_deref().unwrap_or(defaults::BIND);
                raw.parse()
                    .map_err(|e| Error::Config(format!("invalid bind address '{}': {}", raw, e)))?
            }
        };

        let catalog_url = if cli.offline {
            None
        } else {
            Some(
                cli.catalog_url
                    .clone()
                    .or_else(|| file.catalog.url.clone())
                    .unwrap_or_else(|| defaults::CATALOG_URL.to_string()),
            )
        };

        let matcher = match cli.matcher {
            Some(kind) => kind,
            None => parse_choice(file.matcher.kind.as_deref(), "matcher.kind")?,
        };
        let backend = match cli.store {
            Some(backend) => backend,
            None => parse_choice(file.store.backend.as_deref(), "store.backend")?,
        };

        let store = StoreConfig {
            backend,
            spreadsheet_name: file
                .store
                .spreadsheet_name
                .clone()
                .unwrap_or_else(|| defaults::SPREADSHEET_NAME.to_string()),
            spreadsheet_id: cli
                .spreadsheet_id
                .clone()
                .or_else(|| file.store.spreadsheet_id.clone()),
            credentials_file: cli
                .credentials
                .clone()
                .or_else(|| file.store.credentials_file.clone()),
            csv_dir: cli
                .csv_dir
                .clone()
                .or_else(|| file.store.csv_dir.clone())
                .unwrap_or_else(|| PathBuf::from(defaults::CSV_DIR)),
            connection_ttl: Duration::from_secs(
                file.store.ttl_secs.unwrap_or(defaults::CACHE_TTL_SECS),
            ),
        };

        Ok(Self {
            bind,
            log_level: cli
                .log_level
                .clone()
                .or_else(|| file.log_level.clone())
                .unwrap_or_else(|| defaults::LOG_LEVEL.to_string()),
            catalog_url,
            catalog_fallback: cli
                .catalog_fallback
                .clone()
                .or_else(|| file.catalog.fallback_path.clone())
                .unwrap_or_else(|| PathBuf::from(defaults::CATALOG_FALLBACK_PATH)),
            catalog_ttl: Duration::from_secs(
                file.catalog.ttl_secs.unwrap_or(defaults::CACHE_TTL_SECS),
            ),
            matcher,
            store,
            session_idle_timeout: Duration::from_secs(
                file.sessions
                    .idle_timeout_secs
                    .unwrap_or(defaults::SESSION_IDLE_TIMEOUT_SECS),
            ),
        })
    }
}

/// Parse an optional enum setting from the config file, defaulting when absent
fn parse_choice<T: ValueEnum + Default>(raw: Option<&str>, key: &str) -> Result<T> {
    match raw {
        None => Ok(T::default()),
        Some(raw) => T::from_str(raw.trim(), true)
            .map_err(|e| Error::Config(format!("invalid {} '{}': {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["hildegard-suggest"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_any_input() {
        let config = SuggestConfig::resolve(&Cli::default(), &TomlConfig::default()).unwrap();

        assert_eq!(config.bind, "127.0.0.1:5780".parse().unwrap());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.catalog_url.as_deref(), Some(defaults::CATALOG_URL));
        assert_eq!(config.catalog_fallback, PathBuf::from("sample_canti.csv"));
        assert_eq!(config.catalog_ttl, Duration::from_secs(3600));
        assert_eq!(config.matcher, MatcherKind::Weighted);
        assert_eq!(config.store.backend, StoreBackend::GoogleSheets);
        assert_eq!(
            config.store.spreadsheet_name,
            "hildegard_form_manual_suggestions"
        );
        assert!(config.store.credentials_file.is_none());
        assert_eq!(config.session_idle_timeout, Duration::from_secs(4 * 3600));
    }

    #[test]
    fn test_file_values_apply() {
        let file: TomlConfig = toml::from_str(
            r#"
            bind = "0.0.0.0:9000"

            [catalog]
            fallback_path = "/srv/canti.csv"
            ttl_secs = 60

            [matcher]
            kind = "substring"

            [store]
            backend = "csv"
            csv_dir = "/srv/out"
            "#,
        )
        .unwrap();

        let config = SuggestConfig::resolve(&Cli::default(), &file).unwrap();

        assert_eq!(config.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.catalog_fallback, PathBuf::from("/srv/canti.csv"));
        assert_eq!(config.catalog_ttl, Duration::from_secs(60));
        assert_eq!(config.matcher, MatcherKind::Substring);
        assert_eq!(config.store.backend, StoreBackend::Csv);
        assert_eq!(config.store.csv_dir, PathBuf::from("/srv/out"));
    }

    #[test]
    #[serial]
    fn test_command_line_beats_file() {
        let file = TomlConfig {
            bind: Some("0.0.0.0:9000".to_string()),
            ..Default::default()
        };
        let cli = parse(&["--bind", "127.0.0.1:6000", "--store", "csv", "--offline"]);

        let config = SuggestConfig::resolve(&cli, &file).unwrap();

        assert_eq!(config.bind, "127.0.0.1:6000".parse().unwrap());
        assert_eq!(config.store.backend, StoreBackend::Csv);
        assert!(config.catalog_url.is_none());
    }

    #[test]
    #[serial]
    fn test_environment_fills_cli_fields() {
        std::env::set_var("HILDEGARD_CREDENTIALS", "/etc/hildegard/key.json");
        let cli = parse(&[]);
        std::env::remove_var("HILDEGARD_CREDENTIALS");

        let config = SuggestConfig::resolve(&cli, &TomlConfig::default()).unwrap();
        assert_eq!(
            config.store.credentials_file,
            Some(PathBuf::from("/etc/hildegard/key.json"))
        );
    }

    #[test]
    #[serial]
    fn test_store_backend_names() {
        assert_eq!(parse(&["--store", "google_sheets"]).store, Some(StoreBackend::GoogleSheets));
        assert_eq!(parse(&["--store", "google-sheets"]).store, Some(StoreBackend::GoogleSheets));
    }

    #[test]
    fn test_invalid_file_values_are_errors() {
        let file = TomlConfig {
            bind: Some("not an address".to_string()),
            ..Default::default()
        };
        assert!(SuggestConfig::resolve(&Cli::default(), &file).is_err());

        let mut file = TomlConfig::default();
        file.matcher.kind = Some("phonetic".to_string());
        assert!(SuggestConfig::resolve(&Cli::default(), &file).is_err());
    }
}
