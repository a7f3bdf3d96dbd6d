use axum::extract::State;
use axum::Json;

use crate::api::JsonBody;
use crate::models::{RecommendRequest, RecommendResponse};
use crate::pipeline::{recommend as run_pipeline, RecommendationQuery};
use crate::state::AppState;

const MAX_PROMPT_LEN: usize = 1000;
const MAX_TOP_K: usize = 50;
const INITIAL_PROMPT: &str = "trending fashion and home decor";
const INITIAL_TOP_K: usize = 8;

/// POST /api/recommendations - Text-only recommendations
pub async fn recommend(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RecommendRequest>,
) -> Json<RecommendResponse> {
    let prompt = truncate_to_char_boundary(req.prompt.trim(), MAX_PROMPT_LEN);
    let top_k = clamp_top_k(req.top_k, state.config.scoring.top_k);
    Json(run_text(&state, &prompt, top_k).await)
}

/// GET /api/recommendations/initial - Landing-page recommendations
pub async fn initial(State(state): State<AppState>) -> Json<RecommendResponse> {
    Json(run_text(&state, INITIAL_PROMPT, INITIAL_TOP_K).await)
}

async fn run_text(state: &AppState, prompt: &str, top_k: usize) -> RecommendResponse {
    let catalog = state.catalog();
    let outcome = run_pipeline(
        &state.http_client,
        &state.config,
        &catalog,
        RecommendationQuery {
            image: None,
            prompt,
            top_k,
        },
    )
    .await;

    RecommendResponse {
        recommendations: outcome.recommendations,
        refinement: outcome.refinement,
    }
}

pub(crate) fn clamp_top_k(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).clamp(1, MAX_TOP_K)
}

pub(crate) fn truncate_to_char_boundary(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_top_k() {
        assert_eq!(clamp_top_k(None, 10), 10);
        assert_eq!(clamp_top_k(Some(0), 10), 1);
        assert_eq!(clamp_top_k(Some(500), 10), MAX_TOP_K);
        assert_eq!(clamp_top_k(Some(3), 10), 3);
    }

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_to_char_boundary("red tee", 100), "red tee");
    }

    #[test]
    fn test_truncate_unicode_safe() {
        // "é" is two bytes; cutting at 1 must back off to 0
        assert_eq!(truncate_to_char_boundary("é", 1), "");
        assert_eq!(truncate_to_char_boundary("aé", 2), "a");
    }
}
