use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::VisionConfig;
use crate::llm::mime_for_path;
use crate::models::ImageDescription;

const DESCRIBE_PROMPT: &str = "Describe this image focusing on apparel, accessories, style, \
     colors, patterns, material, occasion, and any notable features useful for e-commerce \
     search. Provide a concise yet detailed summary. What kind of person might wear/use this? \
     What other items might go well with it?";

/// Ask the vision model to describe the image at `path`.
///
/// Never fails: a missing key or any API problem yields
/// [`ImageDescription::Unavailable`] so the caller can continue text-only.
pub async fn describe_image(
    client: &reqwest::Client,
    config: &VisionConfig,
    path: &Path,
) -> ImageDescription {
    let Some(api_key) = config.api_key.as_deref() else {
        tracing::warn!("Vision API key not configured. Skipping image description.");
        return ImageDescription::Unavailable {
            reason: "Vision client not available.".to_string(),
        };
    };

    match call_vision(client, config, api_key, path).await {
        Ok(text) => {
            let snippet: String = text.chars().take(100).collect();
            tracing::info!("Vision description (snippet): {snippet}...");
            ImageDescription::Described { text }
        }
        Err(e) => {
            tracing::error!("Vision API call failed: {e:#}");
            ImageDescription::Unavailable {
                reason: format!("Error getting image description: {e}"),
            }
        }
    }
}

#[derive(Serialize)]
struct VisionRequest {
    model: String,
    messages: Vec<VisionMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct VisionMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_request(config: &VisionConfig, mime: &str, image_base64: &str) -> VisionRequest {
    VisionRequest {
        model: config.model.clone(),
        messages: vec![VisionMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text {
                    text: DESCRIBE_PROMPT.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:{mime};base64,{image_base64}"),
                    },
                },
            ],
        }],
        max_tokens: config.max_tokens,
    }
}

async fn call_vision(
    client: &reqwest::Client,
    config: &VisionConfig,
    api_key: &str,
    path: &Path,
) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    let req = build_request(config, mime_for_path(path), &BASE64.encode(&bytes));

    let url = format!("{}/v1/chat/completions", config.base_url);
    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .context("Failed to call vision API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Vision API returned {status}: {body}");
    }

    let body: ChatResponse = resp
        .json()
        .await
        .context("Failed to parse vision response")?;

    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .context("Vision API returned no description")
}
