//! Suggestion destinations
//!
//! Rows are appended through the [`SheetStore`] trait. Two backends exist:
//!
//! - **Google Sheets** ([`GoogleSheetsStore`]): the production destination,
//!   authenticated with a service-account key
//! - **CSV directory** ([`CsvDirectoryStore`]): one CSV file per table, for
//!   local runs
//!
//! Which one is used is decided once at startup ([`select_destination`]).
//! Missing or unreadable credentials put the service in a "cannot submit"
//! mode rather than failing startup.

mod csv_dir;
mod google;

pub use csv_dir::CsvDirectoryStore;
pub use google::{GoogleSheetsStore, ServiceAccountKey};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

/// User-facing message when no credentials are configured
pub const MISSING_CREDENTIALS_MESSAGE: &str =
    "Le credenziali di servizio non sono configurate.";

/// Handle to a table that is known to exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub name: String,
}

/// Destination failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credentials unavailable: {0}")]
    MissingCredentials(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("spreadsheet '{0}' not found or not shared with the service account")]
    SpreadsheetNotFound(String),

    #[error("could not create table '{table}': {cause}")]
    TableCreation { table: String, cause: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Table-oriented append-only store
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Backend description for logs and health output
    fn describe(&self) -> String;

    /// Make sure table `name` exists, creating it if needed
    async fn ensure_table(&self, name: &str) -> Result<TableHandle, StoreError>;

    /// Append one row; not retried on failure
    async fn append_row(&self, table: &TableHandle, row: &[String]) -> Result<(), StoreError>;
}

/// Where submissions go, decided at startup
#[derive(Clone)]
pub enum Destination {
    Ready(Arc<dyn SheetStore>),
    Unavailable { reason: String },
}

impl Destination {
    pub fn is_ready(&self) -> bool {
        matches!(self, Destination::Ready(_))
    }

    /// Backend description, or the reason submissions are disabled
    pub fn describe(&self) -> String {
        match self {
            Destination::Ready(store) => store.describe(),
            Destination::Unavailable { reason } => format!("unavailable: {}", reason),
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Destination").field(&self.describe()).finish()
    }
}

/// Configured destination backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StoreBackend {
    #[default]
    #[value(name = "google_sheets", alias = "google-sheets")]
    GoogleSheets,
    Csv,
}

/// Destination settings after config resolution
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub spreadsheet_name: String,
    pub spreadsheet_id: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub csv_dir: PathBuf,
    /// Lifetime of a cached spreadsheet connection
    pub connection_ttl: Duration,
}

/// Probe configuration and credentials, and pick the destination
pub fn select_destination(config: &StoreConfig) -> Destination {
    let destination = match config.backend {
        StoreBackend::Csv => {
            Destination::Ready(Arc::new(CsvDirectoryStore::new(config.csv_dir.clone())))
        }
        StoreBackend::GoogleSheets => google_destination(config),
    };

    match &destination {
        Destination::Ready(store) => info!("Suggestions will be written to {}", store.describe()),
        Destination::Unavailable { reason } => {
            warn!("Submissions disabled: {}", reason)
        }
    }
    destination
}

fn google_destination(config: &StoreConfig) -> Destination {
    let Some(path) = &config.credentials_file else {
        return Destination::Unavailable {
            reason: MISSING_CREDENTIALS_MESSAGE.to_string(),
        };
    };

    let key = match ServiceAccountKey::from_file(path) {
        Ok(key) => key,
        Err(e) => {
            return Destination::Unavailable {
                reason: format!(
                    "{} ({}: {})",
                    MISSING_CREDENTIALS_MESSAGE,
                    path.display(),
                    e
                ),
            }
        }
    };

    match GoogleSheetsStore::new(
        key,
        config.spreadsheet_name.clone(),
        config.spreadsheet_id.clone(),
        config.connection_ttl,
    ) {
        Ok(store) => Destination::Ready(Arc::new(store)),
        Err(e) => Destination::Unavailable {
            reason: format!("Errore di connessione: {}", e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config(backend: StoreBackend, credentials_file: Option<PathBuf>) -> StoreConfig {
        StoreConfig {
            backend,
            spreadsheet_name: "hildegard_form_manual_suggestions".to_string(),
            spreadsheet_id: None,
            credentials_file,
            csv_dir: std::env::temp_dir().join("hildegard-select-test"),
            connection_ttl: Duration::from_secs(3600),
        }
    }

    #[test]
    fn test_missing_credentials_disable_submission() {
        let destination = select_destination(&config(StoreBackend::GoogleSheets, None));
        match destination {
            Destination::Unavailable { reason } => {
                assert_eq!(reason, MISSING_CREDENTIALS_MESSAGE)
            }
            Destination::Ready(_) => panic!("expected unavailable destination"),
        }
    }

    #[test]
    fn test_unreadable_credentials_disable_submission() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{ not json").unwrap();

        let destination = select_destination(&config(
            StoreBackend::GoogleSheets,
            Some(file.path().to_path_buf()),
        ));
        assert!(!destination.is_ready());
        assert!(destination.describe().contains("credenziali"));
    }

    #[test]
    fn test_csv_backend_needs_no_credentials() {
        let destination = select_destination(&config(StoreBackend::Csv, None));
        assert!(destination.is_ready());
    }
}
