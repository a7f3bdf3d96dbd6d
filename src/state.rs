use parking_lot::RwLock;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::models::CatalogStats;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Current catalog. Readers clone the inner `Arc` and release the lock
    /// before awaiting; a reload swaps it in one write.
    pub catalog: Arc<RwLock<Arc<Catalog>>>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        // Ensure data directories exist
        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(config.uploads_dir())?;

        Ok(Self {
            config,
            catalog: Arc::new(RwLock::new(Arc::new(Catalog::empty()))),
            http_client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
        })
    }

    /// Snapshot of the current catalog.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().clone()
    }

    /// (Re)load the catalog from disk and compute embeddings, then swap it in.
    pub async fn reload_catalog(&self) -> anyhow::Result<CatalogStats> {
        let catalog = Catalog::load(
            &self.config.catalog_path,
            &self.config.data_dir,
            &self.http_client,
            &self.config.embedding,
        )
        .await?;
        let stats = catalog.stats();
        *self.catalog.write() = Arc::new(catalog);
        Ok(stats)
    }
}
