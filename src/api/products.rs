use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::{api_error, path_param, ApiError};
use crate::models::{CatalogStats, ConfigResponse, Product};
use crate::state::AppState;

/// GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

/// GET /api/products - All catalog products (without embeddings)
pub async fn list_products(State(state): State<AppState>) -> Json<Vec<Product>> {
    let catalog = state.catalog();
    Json(
        catalog
            .entries()
            .iter()
            .map(|e| e.product.clone())
            .collect(),
    )
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Product>, ApiError> {
    let id = path_param(id)?;
    let catalog = state.catalog();
    catalog
        .get(&id)
        .map(|e| Json(e.product.clone()))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Product not found"))
}

/// GET /api/catalog - Catalog size and embedding coverage
pub async fn catalog_stats(State(state): State<AppState>) -> Json<CatalogStats> {
    Json(state.catalog().stats())
}

/// POST /api/catalog/reload - Re-read the catalog file and recompute embeddings
pub async fn reload_catalog(State(state): State<AppState>) -> Result<Json<CatalogStats>, ApiError> {
    match state.reload_catalog().await {
        Ok(stats) => {
            tracing::info!(
                "Catalog reloaded: {} products, {} embedded",
                stats.products,
                stats.embedded
            );
            Ok(Json(stats))
        }
        Err(e) => {
            tracing::error!("Catalog reload failed: {e:#}");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Catalog reload failed: {e}"),
            ))
        }
    }
}

/// GET /api/config - Effective configuration, API keys redacted
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let config = &state.config;
    Json(ConfigResponse {
        vision_model: config.vision.model.clone(),
        vision_enabled: config.vision.api_key.is_some(),
        refine_provider: config.refine.provider.clone(),
        refine_model: config.refine.model.clone(),
        refine_has_api_key: config.refine.api_key.is_some(),
        embedding_backend: config.embedding.backend.clone(),
        visual_weight: config.scoring.visual_weight,
        keyword_weight: config.scoring.keyword_weight,
        top_k: config.scoring.top_k,
    })
}
