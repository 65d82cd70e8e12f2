//! Catalog loading
//!
//! The song list comes from the first source that answers, in order:
//! remote CSV over HTTP, then a local CSV file. When every source fails the
//! service runs on an empty catalog: no candidates are offered and only the
//! "new song" path stays usable.
//!
//! The loaded catalog is cached process-wide and reloaded lazily once stale.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hildegard_common::{time, Catalog, TimedCache};
use reqwest::Client;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Timeout for the remote catalog download
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Catalog source failures
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] hildegard_common::Error),
}

/// One place the catalog can be read from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Human-readable location for logs
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Catalog, CatalogError>;
}

/// CSV downloaded over HTTP(S)
pub struct RemoteCsvSource {
    url: String,
    client: Client,
}

impl RemoteCsvSource {
    pub fn new(url: impl Into<String>) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl CatalogSource for RemoteCsvSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let bytes = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(Catalog::from_csv_reader(bytes.as_ref())?)
    }
}

/// CSV file on local disk
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for LocalFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(Catalog::from_csv_reader(bytes.as_slice())?)
    }
}

/// Ordered fallback chain of catalog sources
pub struct CatalogLoader {
    sources: Vec<Box<dyn CatalogSource>>,
}

impl CatalogLoader {
    pub fn new(sources: Vec<Box<dyn CatalogSource>>) -> Self {
        Self { sources }
    }

    /// Standard chain: optional remote URL, then the local fallback file
    pub fn from_locations(url: Option<&str>, fallback_path: PathBuf) -> Self {
        let mut sources: Vec<Box<dyn CatalogSource>> = Vec::new();

        if let Some(url) = url {
            match RemoteCsvSource::new(url) {
                Ok(source) => sources.push(Box::new(source)),
                Err(e) => warn!("Remote catalog source disabled: {}", e),
            }
        }
        sources.push(Box::new(LocalFileSource::new(fallback_path)));

        Self::new(sources)
    }

    /// Try each source in order; never fails
    pub async fn load(&self) -> Catalog {
        for source in &self.sources {
            match source.fetch().await {
                Ok(catalog) => {
                    info!(
                        source = %source.describe(),
                        songs = catalog.len(),
                        titles = catalog.titles().len(),
                        "Song catalog loaded"
                    );
                    return catalog;
                }
                Err(e) => {
                    warn!(source = %source.describe(), "Catalog source failed: {}", e);
                }
            }
        }

        warn!("No catalog source available, continuing with an empty catalog");
        Catalog::empty()
    }
}

/// Process-wide catalog, reloaded lazily after its ttl
pub struct CatalogCache {
    loader: CatalogLoader,
    cache: Mutex<TimedCache<Arc<Catalog>>>,
}

impl CatalogCache {
    pub fn new(loader: CatalogLoader, ttl: Duration) -> Self {
        Self {
            loader,
            cache: Mutex::new(TimedCache::new(ttl)),
        }
    }

    /// Current catalog, loading it first if missing or stale
    ///
    /// Concurrent callers during a reload wait for the same load.
    pub async fn get(&self) -> Arc<Catalog> {
        let mut cache = self.cache.lock().await;
        if let Some(catalog) = cache.get_fresh(time::now()) {
            return catalog;
        }

        let catalog = Arc::new(self.loader.load().await);
        cache.store(catalog, time::now())
    }
}
