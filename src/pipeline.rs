use std::path::Path;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::llm::embeddings::embed_image_file;
use crate::llm::refine::refine_search;
use crate::llm::vision::describe_image;
use crate::models::{ImageDescription, Recommendation, RefinementOutcome};
use crate::search::keywords::extract_keywords;
use crate::search::scoring::{
    fallback, finalize, score_candidates, visual_candidates, Candidate, SearchSignals,
};
use crate::search::vector::rank_by_similarity;

const NO_VISUAL_INPUT: &str = "No specific visual input provided.";

/// One recommendation request: an optional uploaded image and/or a text prompt.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationQuery<'a> {
    pub image: Option<&'a Path>,
    pub prompt: &'a str,
    pub top_k: usize,
}

#[derive(Debug, Clone)]
pub struct RecommendationOutcome {
    pub recommendations: Vec<Recommendation>,
    /// Present when the query had an image
    pub image_description: Option<ImageDescription>,
    pub refinement: RefinementOutcome,
}

/// Run the full recommendation pipeline:
///   1. Image → vision description + embedding → nearest catalog products
///   2. Keyword extraction from the prompt
///   3. Refinement model over description, prompt and top visual matches
///   4. Weighted scoring of visual candidates (or the whole catalog)
///
/// Each external signal is optional; when one is unavailable the pipeline
/// continues with the rest.
pub async fn recommend(
    client: &reqwest::Client,
    config: &Config,
    catalog: &Catalog,
    query: RecommendationQuery<'_>,
) -> RecommendationOutcome {
    let prompt = query.prompt.trim();
    let top_k = query.top_k;

    // ── Step 1: Vision description + visual similarity ──────
    let mut image_description = None;
    let mut visual = Vec::new();

    if let Some(image) = query.image {
        image_description = Some(describe_image(client, &config.vision, image).await);

        match embed_image_file(client, &config.embedding, image).await {
            Ok(query_embedding) => {
                if catalog.embedded_count() == 0 {
                    tracing::warn!("No catalog embeddings available for visual comparison");
                }
                let pool = top_k.saturating_mul(config.scoring.visual_pool_factor);
                let hits = rank_by_similarity(&query_embedding, catalog.entries(), pool);
                visual = visual_candidates(&hits);
                tracing::info!("Visual search found {} candidates", visual.len());
            }
            Err(e) => {
                tracing::warn!("Could not embed query image {}: {e:#}", image.display());
            }
        }
    }

    // ── Step 2: Keywords ────────────────────────────────────
    let extracted = if prompt.is_empty() {
        Vec::new()
    } else {
        extract_keywords(prompt)
    };

    // ── Step 3: Refinement ──────────────────────────────────
    let description_text = image_description.as_ref().and_then(|d| d.text());
    let refinement = if !prompt.is_empty() || description_text.is_some() {
        let context = visual_context(&visual);
        refine_search(
            client,
            &config.refine,
            description_text.unwrap_or(NO_VISUAL_INPUT),
            prompt,
            &context,
        )
        .await
    } else {
        RefinementOutcome::Skipped {
            message: "Insufficient input for refinement.".to_string(),
        }
    };

    // ── Step 4: Scoring ─────────────────────────────────────
    let signals = SearchSignals::collect(prompt, &extracted, refinement.refinement());
    tracing::debug!("Search keywords: {:?}", signals.keywords);

    let candidates: Vec<Candidate> = if visual.is_empty() {
        catalog.entries().iter().map(Candidate::from_entry).collect()
    } else {
        visual
    };

    if candidates.is_empty() {
        tracing::info!("No candidate products available for recommendation");
        return RecommendationOutcome {
            recommendations: Vec::new(),
            image_description,
            refinement,
        };
    }

    let mut recommendations = score_candidates(candidates, &signals, &config.scoring, top_k);
    if recommendations.is_empty() && !catalog.is_empty() {
        recommendations = fallback(catalog.entries(), top_k);
    }
    finalize(&mut recommendations);

    RecommendationOutcome {
        recommendations,
        image_description,
        refinement,
    }
}

fn visual_context(visual: &[Candidate]) -> String {
    if visual.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = visual
        .iter()
        .take(3)
        .map(|c| c.entry.product.name.as_str())
        .collect();
    format!("Initial visual ideas: {}", names.join(", "))
}
