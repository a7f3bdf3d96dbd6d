use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the catalog, product images and uploads live
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Catalog JSON file. Relative image paths inside it resolve against `data_dir`.
    pub catalog_path: PathBuf,
    /// Maximum accepted request body for image uploads
    pub max_upload_bytes: usize,
    pub vision: VisionConfig,
    pub refine: RefineConfig,
    pub embedding: EmbeddingConfig,
    pub scoring: ScoringConfig,
}

/// OpenAI-compatible vision model used to describe query images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    pub base_url: String,
    pub model: String,
    /// Without a key the describer is disabled and the pipeline runs text-only.
    pub api_key: Option<String>,
    pub max_tokens: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            max_tokens: 350,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineConfig {
    /// "gemini", "openai" or "ollama"
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Request timeout in seconds (capped at 60).
    pub timeout_secs: u64,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash-latest".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "histogram" (local, offline) or "http" (OpenAI-compatible embeddings API)
    pub backend: String,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Expected vector dimension of the http backend. Precomputed catalog
    /// embeddings of a different length are recomputed.
    pub dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "histogram".to_string(),
            base_url: "http://localhost:8081".to_string(),
            model: "clip-vit-base-patch32".to_string(),
            api_key: None,
            dim: 512,
        }
    }
}

/// Weights of the recommendation scorer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Multiplier applied to the cosine similarity of visual candidates
    pub visual_weight: f32,
    /// Points per distinct matched keyword
    pub keyword_weight: f32,
    /// Default number of recommendations returned
    pub top_k: usize,
    /// Visual candidates kept = top_k × this factor
    pub visual_pool_factor: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            visual_weight: 10.0,
            keyword_weight: 2.5,
            top_k: 10,
            visual_pool_factor: 2,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from("./data");
        Self {
            catalog_path: data_dir.join("curated_product_catalog.json"),
            data_dir,
            bind_addr: "127.0.0.1:5000".to_string(),
            max_upload_bytes: 16 * 1024 * 1024,
            vision: VisionConfig::default(),
            refine: RefineConfig::default(),
            embedding: EmbeddingConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("SHOPSMARTER_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
            config.catalog_path = config.data_dir.join("curated_product_catalog.json");
        }
        if let Ok(path) = std::env::var("SHOPSMARTER_CATALOG") {
            config.catalog_path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var("SHOPSMARTER_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("SHOPSMARTER_MAX_UPLOAD_BYTES") {
            if let Ok(v) = val.parse() {
                config.max_upload_bytes = v;
            }
        }

        // Vision describer
        if let Ok(url) = std::env::var("VISION_BASE_URL") {
            config.vision.base_url = url;
        }
        if let Ok(model) = std::env::var("VISION_MODEL") {
            config.vision.model = model;
        }
        if let Some(key) = env_key("OPENAI_API_KEY") {
            config.vision.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("VISION_MAX_TOKENS") {
            if let Ok(v) = val.parse() {
                config.vision.max_tokens = v;
            }
        }

        // Refinement model
        if let Ok(provider) = std::env::var("REFINE_PROVIDER") {
            config.refine.provider = provider;
        }
        if let Ok(url) = std::env::var("REFINE_BASE_URL") {
            config.refine.base_url = url;
        }
        if let Ok(model) = std::env::var("REFINE_MODEL") {
            config.refine.model = model;
        }
        // REFINE_API_KEY wins; otherwise the provider's usual variable
        config.refine.api_key =
            env_key("REFINE_API_KEY").or_else(|| match config.refine.provider.as_str() {
                "gemini" => env_key("GOOGLE_API_KEY"),
                "openai" => env_key("OPENAI_API_KEY"),
                _ => None,
            });
        if let Ok(val) = std::env::var("REFINE_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.refine.timeout_secs = v.min(60);
            }
        }

        // Image embeddings
        if let Ok(backend) = std::env::var("EMBEDDING_BACKEND") {
            config.embedding.backend = backend;
        }
        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Some(key) = env_key("EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.embedding.dim = d;
            }
        }

        // Scorer
        if let Ok(val) = std::env::var("SCORE_VISUAL_WEIGHT") {
            if let Ok(v) = val.parse() {
                config.scoring.visual_weight = v;
            }
        }
        if let Ok(val) = std::env::var("SCORE_KEYWORD_WEIGHT") {
            if let Ok(v) = val.parse() {
                config.scoring.keyword_weight = v;
            }
        }
        if let Ok(val) = std::env::var("SCORE_TOP_K") {
            if let Ok(v) = val.parse() {
                config.scoring.top_k = v;
            }
        }
        if let Ok(val) = std::env::var("SCORE_VISUAL_POOL_FACTOR") {
            if let Ok(v) = val.parse::<usize>() {
                config.scoring.visual_pool_factor = v.max(1);
            }
        }

        config
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

/// An API key from the environment; unset and empty are both `None`.
fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scoring_weights() {
        let config = Config::default();
        assert_eq!(config.scoring.visual_weight, 10.0);
        assert_eq!(config.scoring.keyword_weight, 2.5);
        assert_eq!(config.scoring.top_k, 10);
        assert_eq!(config.scoring.visual_pool_factor, 2);
    }

    #[test]
    fn test_default_paths_live_under_data_dir() {
        let config = Config::default();
        assert!(config.catalog_path.starts_with(&config.data_dir));
        assert_eq!(config.uploads_dir(), config.data_dir.join("uploads"));
    }

    #[test]
    fn test_default_external_services_have_no_keys() {
        let config = Config::default();
        assert!(config.vision.api_key.is_none());
        assert!(config.refine.api_key.is_none());
        assert_eq!(config.embedding.backend, "histogram");
    }

    #[test]
    fn test_empty_key_env_is_ignored() {
        std::env::set_var("SHOPSMARTER_TEST_EMPTY_KEY", "");
        std::env::set_var("SHOPSMARTER_TEST_SET_KEY", "sk-123");
        assert_eq!(env_key("SHOPSMARTER_TEST_EMPTY_KEY"), None);
        assert_eq!(env_key("SHOPSMARTER_TEST_SET_KEY").as_deref(), Some("sk-123"));
        assert_eq!(env_key("SHOPSMARTER_TEST_UNSET_KEY"), None);
    }

    #[test]
    fn test_from_env_ignores_empty_embedding_key() {
        std::env::set_var("EMBEDDING_API_KEY", "");
        let config = Config::from_env();
        assert!(config.embedding.api_key.is_none());
    }
}
