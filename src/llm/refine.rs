use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::RefineConfig;
use crate::models::{Refinement, RefinementOutcome};

/// Ask the language model to turn the image description, the user's prompt and
/// the top visual matches into a structured search intent.
///
/// Never fails: transport problems become [`RefinementOutcome::Failed`], a
/// reply that isn't the expected JSON becomes [`RefinementOutcome::Unparsed`].
pub async fn refine_search(
    client: &reqwest::Client,
    config: &RefineConfig,
    image_description: &str,
    user_prompt: &str,
    product_context: &str,
) -> RefinementOutcome {
    if config.provider != "ollama" && config.api_key.is_none() {
        tracing::warn!(
            "No API key configured for refinement provider '{}'",
            config.provider
        );
        return RefinementOutcome::Failed {
            error: format!("{} API key not configured.", config.provider),
        };
    }

    let prompt = build_prompt(image_description, user_prompt, product_context);
    tracing::info!(
        "Requesting refinement from {} ({})",
        config.provider,
        config.model
    );

    let response = match config.provider.as_str() {
        "gemini" => call_gemini(client, config, &prompt).await,
        "openai" => call_openai(client, config, &prompt).await,
        "ollama" => call_ollama(client, config, &prompt).await,
        other => Err(anyhow::anyhow!("Unknown refinement provider: {other}")),
    };

    match response {
        Ok(text) => parse_refinement(&text),
        Err(e) => {
            tracing::error!("Refinement call failed: {e:#}");
            RefinementOutcome::Failed {
                error: format!("Error interacting with refinement model: {e}"),
            }
        }
    }
}

fn build_prompt(image_description: &str, user_prompt: &str, product_context: &str) -> String {
    format!(
        "You are an AI shopping assistant helping a user find products based on an image and a text query.\n\
         Image Description (from Vision AI): \"{image_description}\"\n\
         User's Text Query: \"{user_prompt}\"\n\
         Context from visually similar items (if any): \"{product_context}\"\n\n\
         Analyze all available information and provide a structured JSON response with ONLY the following keys:\n\
         1. \"key_attributes\": A list of 3-7 specific, searchable attributes or features derived from the inputs \
         (e.g., \"red floral dress\", \"leather ankle boots\", \"minimalist silver necklace\", \"summer casual\").\n\
         2. \"refined_search_query\": A single, optimized search query string (max 10 words) that could be used \
         directly in an e-commerce search bar.\n\
         3. \"complementary_item_categories\": A list of 1-3 general categories of items that would complement \
         the main described item (e.g., \"handbags\", \"scarves\", \"belts\", \"shoes\" if main is a dress).\n\
         4. \"confidence_level\": Your confidence (Low, Medium, High) that you've understood the user's core need.\n\
         5. \"user_intent_summary\": A very brief (1 sentence) summary of what you think the user is looking for.\n\n\
         Example JSON output:\n\
         {{\n  \"key_attributes\": [\"vintage floral print\", \"midi dress\", \"long sleeve\", \"bohemian style\"],\n  \
         \"refined_search_query\": \"long sleeve vintage floral midi dress boho\",\n  \
         \"complementary_item_categories\": [\"ankle boots\", \"wide-brim hat\", \"crossbody bag\"],\n  \
         \"confidence_level\": \"High\",\n  \
         \"user_intent_summary\": \"User is looking for a bohemian-style floral midi dress with long sleeves.\"\n}}\n\n\
         If the input is very vague, make the attributes broader and the confidence lower.\n\
         Prioritize generating good \"key_attributes\" and \"refined_search_query\".\n\
         Output ONLY the JSON object."
    )
}

/// Parse the model's reply into a [`Refinement`], tolerating markdown fences
/// and prose around the JSON object.
///
/// Fields are read leniently: a string `key_attributes` is split on commas,
/// scalar values are stringified, and anything unusable is left empty. Only a
/// reply without a JSON object becomes [`RefinementOutcome::Unparsed`].
pub fn parse_refinement(content: &str) -> RefinementOutcome {
    let cleaned = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let first_err = match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => return RefinementOutcome::Refined(refinement_from_object(&map)),
        Ok(_) => "expected a JSON object".to_string(),
        Err(e) => e.to_string(),
    };

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&cleaned[start..=end]) {
                return RefinementOutcome::Refined(refinement_from_object(&map));
            }
        }
    }

    tracing::warn!("Refinement response was not valid JSON: {first_err}. Raw: {content}");
    RefinementOutcome::Unparsed {
        raw_text: content.to_string(),
        error: format!("Refinement response format issue: {first_err}"),
    }
}

fn refinement_from_object(map: &Map<String, Value>) -> Refinement {
    let text = |key: &str| map.get(key).and_then(scalar_text).unwrap_or_default();
    let list = |key: &str| map.get(key).map(string_list).unwrap_or_default();

    Refinement {
        key_attributes: list("key_attributes"),
        refined_search_query: text("refined_search_query"),
        complementary_item_categories: list("complementary_item_categories"),
        confidence_level: text("confidence_level"),
        user_intent_summary: text("user_intent_summary"),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

// ─── Gemini ──────────────────────────────────────────────

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

async fn call_gemini(client: &reqwest::Client, config: &RefineConfig, prompt: &str) -> Result<String> {
    let api_key = config.api_key.as_deref().unwrap_or_default();
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        config.base_url, config.model
    );

    let req = GeminiRequest {
        contents: vec![GeminiContent {
            parts: vec![GeminiPart {
                text: prompt.to_string(),
            }],
        }],
    };

    let resp = client
        .post(&url)
        .header("x-goog-api-key", api_key)
        .timeout(Duration::from_secs(config.timeout_secs))
        .json(&req)
        .send()
        .await
        .context("Failed to call Gemini generateContent API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Gemini API returned {status}: {body}");
    }

    let body: GeminiResponse = resp
        .json()
        .await
        .context("Failed to parse Gemini response")?;

    let text: String = body
        .candidates
        .into_iter()
        .next()
        .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    Ok(text)
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

async fn call_ollama(client: &reqwest::Client, config: &RefineConfig, prompt: &str) -> Result<String> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaChatRequest {
        model: config.model.clone(),
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        stream: false,
    };

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(config.timeout_secs))
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama chat API for refinement")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let body: OllamaChatResponse = resp.json().await?;
    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

async fn call_openai(client: &reqwest::Client, config: &RefineConfig, prompt: &str) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: config.model.clone(),
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        temperature: 0.3,
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .timeout(Duration::from_secs(config.timeout_secs))
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI chat API for refinement")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let body: OpenAiChatResponse = resp.json().await?;
    Ok(body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "key_attributes": ["vintage floral print", "midi dress"],
      "refined_search_query": "vintage floral midi dress",
      "complementary_item_categories": ["ankle boots"],
      "confidence_level": "High",
      "user_intent_summary": "User wants a floral dress."
    }"#;

    #[test]
    fn test_parse_clean_json() {
        let out = parse_refinement(SAMPLE);
        let r = out.refinement().unwrap();
        assert_eq!(r.key_attributes.len(), 2);
        assert_eq!(r.refined_search_query, "vintage floral midi dress");
        assert_eq!(r.confidence_level, "High");
    }

    #[test]
    fn test_parse_json_in_markdown_fence() {
        let input = format!("```json\n{SAMPLE}\n```");
        assert!(parse_refinement(&input).refinement().is_some());
    }

    #[test]
    fn test_parse_json_in_bare_fence() {
        let input = format!("```\n{SAMPLE}\n```");
        assert!(parse_refinement(&input).refinement().is_some());
    }

    #[test]
    fn test_parse_json_surrounded_by_prose() {
        let input = format!("Sure! Here you go:\n{SAMPLE}\nLet me know.");
        let out = parse_refinement(&input);
        assert_eq!(
            out.refinement().unwrap().user_intent_summary,
            "User wants a floral dress."
        );
    }

    #[test]
    fn test_parse_partial_object_defaults_missing_keys() {
        let out = parse_refinement(r#"{"refined_search_query": "red tee"}"#);
        let r = out.refinement().unwrap();
        assert_eq!(r.refined_search_query, "red tee");
        assert!(r.key_attributes.is_empty());
    }

    #[test]
    fn test_parse_string_key_attributes() {
        let out = parse_refinement(
            r#"{"key_attributes": "red floral dress, summer", "refined_search_query": "red floral dress"}"#,
        );
        let r = out.refinement().expect("string attributes accepted");
        assert_eq!(r.key_attributes, vec!["red floral dress", "summer"]);
        assert_eq!(r.refined_search_query, "red floral dress");
    }

    #[test]
    fn test_parse_numeric_confidence_is_stringified() {
        let out = parse_refinement(
            r#"{"key_attributes": ["denim"], "confidence_level": 0.9, "complementary_item_categories": ["belts", 3, null]}"#,
        );
        let r = out.refinement().expect("numeric confidence accepted");
        assert_eq!(r.confidence_level, "0.9");
        assert_eq!(r.key_attributes, vec!["denim"]);
        assert_eq!(r.complementary_item_categories, vec!["belts", "3"]);
    }

    #[test]
    fn test_parse_unusable_fields_are_left_empty() {
        let out = parse_refinement(
            r#"{"key_attributes": {"nested": true}, "refined_search_query": ["not", "a", "string"]}"#,
        );
        let r = out.refinement().expect("object still accepted");
        assert!(r.key_attributes.is_empty());
        assert!(r.refined_search_query.is_empty());
    }

    #[test]
    fn test_parse_non_object_json_is_unparsed() {
        assert!(matches!(
            parse_refinement(r#"["red", "dress"]"#),
            RefinementOutcome::Unparsed { .. }
        ));
    }

    #[test]
    fn test_parse_garbage_keeps_raw_text() {
        let out = parse_refinement("I cannot help with that.");
        match out {
            RefinementOutcome::Unparsed { raw_text, error } => {
                assert_eq!(raw_text, "I cannot help with that.");
                assert!(error.contains("format issue"));
            }
            other => panic!("expected unparsed, got {other:?}"),
        }
    }

    #[test]
    fn test_prompt_includes_all_inputs() {
        let p = build_prompt("a red shirt", "something casual", "Initial visual ideas: Tee");
        assert!(p.contains("\"a red shirt\""));
        assert!(p.contains("\"something casual\""));
        assert!(p.contains("Initial visual ideas: Tee"));
        assert!(p.contains("\"key_attributes\": [\"vintage floral print\""));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = reqwest::Client::new();
        let config = RefineConfig::default();
        let out = refine_search(&client, &config, "desc", "prompt", "").await;
        match out {
            RefinementOutcome::Failed { error } => assert!(error.contains("API key not configured")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_provider_fails() {
        let client = reqwest::Client::new();
        let config = RefineConfig {
            provider: "carrier-pigeon".to_string(),
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let out = refine_search(&client, &config, "desc", "prompt", "").await;
        match out {
            RefinementOutcome::Failed { error } => assert!(error.contains("Unknown refinement provider")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
