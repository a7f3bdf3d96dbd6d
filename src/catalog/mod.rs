//! Product catalog: loading, image-URL derivation and embedding annotation.

mod demo;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::config::EmbeddingConfig;
use crate::llm::embeddings::{embed_image_file, expected_dim};
use crate::models::{CatalogStats, Product};

pub use demo::demo_products;

const PLACEHOLDER_IMAGE: &str = "/static/placeholder_no_image.png";

/// A catalog product ready for ranking.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// The product, with its `embedding` field moved out into [`CatalogEntry::embedding`]
    pub product: Product,
    /// Web-accessible image URL for result cards
    pub image_url: String,
    pub embedding: Option<Vec<f32>>,
}

/// The in-memory catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    source: String,
    loaded_at: DateTime<Utc>,
}

/// Where the product list was read from.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSource {
    File(PathBuf),
    Demo,
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogSource::File(p) => write!(f, "{}", p.display()),
            CatalogSource::Demo => write!(f, "built-in demo catalog"),
        }
    }
}

/// Read the catalog JSON array at `path`. A missing file falls back to the
/// built-in demo products; unreadable or malformed JSON is an error.
pub fn load_products(path: &Path) -> Result<(Vec<Product>, CatalogSource)> {
    if !path.exists() {
        tracing::warn!(
            "Catalog file {} not found, using the built-in demo catalog",
            path.display()
        );
        return Ok((demo_products(), CatalogSource::Demo));
    }

    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let products: Vec<Product> = serde_json::from_str(&data)
        .with_context(|| format!("Failed to decode catalog JSON {}", path.display()))?;
    tracing::info!("Loaded {} raw products from {}", products.len(), path.display());
    Ok((products, CatalogSource::File(path.to_path_buf())))
}

/// Card image for a product: the first listed image, else the AI image path
/// when it lives under `static/`, else a placeholder.
pub fn derive_image_url(product: &Product) -> String {
    if let Some(first) = product.images.first() {
        if !first.starts_with("/static/") && !first.starts_with("http") {
            tracing::warn!(
                "Product '{}' image path '{first}' may not be web accessible",
                product.name
            );
        }
        return first.clone();
    }
    match product.image_path_for_ai.as_deref() {
        Some(p) if p.starts_with("static/") => format!("/{p}"),
        _ => PLACEHOLDER_IMAGE.to_string(),
    }
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            source: String::new(),
            loaded_at: Utc::now(),
        }
    }

    /// Build the catalog, embedding each product's local image.
    ///
    /// Precomputed embeddings of the expected dimension are kept as-is.
    /// Products whose image is missing or fails to embed stay in the catalog
    /// without an embedding; they can still be matched on text.
    pub async fn build(
        products: Vec<Product>,
        source: &CatalogSource,
        image_root: &Path,
        client: &reqwest::Client,
        config: &EmbeddingConfig,
    ) -> Self {
        let dim = expected_dim(config);
        let mut entries = Vec::with_capacity(products.len());

        for mut product in products {
            let image_url = derive_image_url(&product);
            let precomputed = product.embedding.take().filter(|e| e.len() == dim);

            let embedding = match precomputed {
                Some(e) => Some(e),
                None => embed_product_image(&product, image_root, client, config).await,
            };

            entries.push(CatalogEntry {
                product,
                image_url,
                embedding,
            });
        }

        let catalog = Self {
            entries,
            source: source.to_string(),
            loaded_at: Utc::now(),
        };

        tracing::info!(
            "Catalog ready: {}/{} products have image embeddings",
            catalog.embedded_count(),
            catalog.len()
        );
        if catalog.embedded_count() == 0 && !catalog.is_empty() {
            tracing::warn!(
                "No products were embedded. Check image paths and the embedding backend."
            );
        }
        catalog
    }

    /// Load from `path` (or the demo catalog) and build.
    pub async fn load(
        path: &Path,
        image_root: &Path,
        client: &reqwest::Client,
        config: &EmbeddingConfig,
    ) -> Result<Self> {
        let (products, source) = load_products(path)?;
        Ok(Self::build(products, &source, image_root, client, config).await)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.product.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn embedded_count(&self) -> usize {
        self.entries.iter().filter(|e| e.embedding.is_some()).count()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            products: self.len(),
            embedded: self.embedded_count(),
            source: self.source.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

async fn embed_product_image(
    product: &Product,
    image_root: &Path,
    client: &reqwest::Client,
    config: &EmbeddingConfig,
) -> Option<Vec<f32>> {
    let Some(rel) = product.image_path_for_ai.as_deref() else {
        tracing::warn!("Product '{}' has no image_path_for_ai", product.name);
        return None;
    };
    let path = image_root.join(rel);
    if !path.exists() {
        tracing::warn!(
            "Image for '{}' not found at {}, skipping embedding",
            product.name,
            path.display()
        );
        return None;
    }

    match embed_image_file(client, config, &path).await {
        Ok(e) => Some(e),
        Err(e) => {
            tracing::warn!(
                "Failed to embed image for '{}' ({}): {e:#}",
                product.name,
                path.display()
            );
            None
        }
    }
}
