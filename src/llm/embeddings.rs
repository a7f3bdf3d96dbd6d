use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::EmbeddingConfig;
use crate::llm::mime_for_path;

/// Side of the thumbnail the histogram backend samples from.
const SAMPLE_SIDE: u32 = 64;
/// Quantization levels per RGB channel (4 × 4 × 4 = 64 colour bins).
const LEVELS: u32 = 4;
/// Side of the grayscale layout grid (8 × 8 = 64 values).
const LAYOUT_SIDE: u32 = 8;

/// Dimension of vectors produced by the histogram backend.
pub const HISTOGRAM_DIM: usize = (LEVELS * LEVELS * LEVELS + LAYOUT_SIDE * LAYOUT_SIDE) as usize;

/// Embed an image file using the configured backend.
pub async fn embed_image_file(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    path: &Path,
) -> Result<Vec<f32>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    embed_image_bytes(client, config, bytes, mime_for_path(path)).await
}

/// Embed raw image bytes using the configured backend.
pub async fn embed_image_bytes(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    bytes: Vec<u8>,
    mime: &str,
) -> Result<Vec<f32>> {
    match config.backend.as_str() {
        "histogram" => tokio::task::spawn_blocking(move || histogram_embedding(&bytes))
            .await
            .context("Histogram embedding task panicked")?,
        "http" => embed_http(client, config, &bytes, mime).await,
        other => anyhow::bail!("Unknown embedding backend: {other}"),
    }
}

/// Expected vector length for the configured backend.
pub fn expected_dim(config: &EmbeddingConfig) -> usize {
    match config.backend.as_str() {
        "histogram" => HISTOGRAM_DIM,
        _ => config.dim,
    }
}

// ─── Histogram (local) ───────────────────────────────────

/// Colour histogram + coarse grayscale layout of an image.
///
/// The first 64 values are an L1-normalized RGB histogram; the last 64 are a
/// mean-centred, L2-normalized 8×8 luma thumbnail, so both colour and rough
/// shape contribute to cosine similarity.
pub fn histogram_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
    let img = image::load_from_memory(bytes).context("Failed to decode image")?;
    let rgb = img
        .resize_exact(SAMPLE_SIDE, SAMPLE_SIDE, FilterType::Triangle)
        .to_rgb8();

    let bins = (LEVELS * LEVELS * LEVELS) as usize;
    let mut histogram = vec![0.0f32; bins];
    for pixel in rgb.pixels() {
        let [r, g, b] = pixel.0;
        let q = |c: u8| c as u32 * LEVELS / 256;
        let bin = (q(r) * LEVELS * LEVELS + q(g) * LEVELS + q(b)) as usize;
        histogram[bin] += 1.0;
    }
    let total: f32 = histogram.iter().sum();
    if total > 0.0 {
        for v in histogram.iter_mut() {
            *v /= total;
        }
    }

    let luma = img
        .resize_exact(LAYOUT_SIDE, LAYOUT_SIDE, FilterType::Triangle)
        .to_luma8();
    let mut layout: Vec<f32> = luma.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
    let mean = layout.iter().sum::<f32>() / layout.len() as f32;
    for v in layout.iter_mut() {
        *v -= mean;
    }
    let norm = layout.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in layout.iter_mut() {
            *v /= norm;
        }
    }

    histogram.extend(layout);
    Ok(histogram)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct ImageEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct ImageEmbedResponse {
    data: Vec<ImageEmbedData>,
}

#[derive(Deserialize)]
struct ImageEmbedData {
    embedding: Vec<f32>,
}

async fn embed_http(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    bytes: &[u8],
    mime: &str,
) -> Result<Vec<f32>> {
    let url = format!("{}/v1/embeddings", config.base_url);
    let data_url = format!("data:{mime};base64,{}", BASE64.encode(bytes));

    let req = ImageEmbedRequest {
        model: config.model.clone(),
        input: vec![data_url],
    };

    let mut builder = client.post(&url).json(&req);
    if let Some(key) = config.api_key.as_deref() {
        builder = builder.header("Authorization", format!("Bearer {key}"));
    }

    let resp = builder
        .send()
        .await
        .context("Failed to call image embedding API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Image embedding API returned {status}: {body}");
    }

    let body: ImageEmbedResponse = resp
        .json()
        .await
        .context("Failed to parse image embedding response")?;

    body.data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .context("No embedding returned")
}
