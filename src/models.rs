use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog product as stored in the catalog JSON file.
///
/// Field names follow the catalog file (and the frontend), hence the
/// mixed `snake_case` / `camelCase` renames.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Display price, e.g. "$19.99"
    pub price: String,
    pub description: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub category: String,
    #[serde(rename = "subCategory", skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    pub style: String,
    pub material: String,
    pub color_tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    /// Web-accessible image URLs; the first one is used for cards
    pub images: Vec<String>,
    /// Local image path (relative to the data dir) used for embeddings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path_for_ai: Option<String>,
    #[serde(rename = "detailedReasons")]
    pub detailed_reasons: Vec<String>,
    /// Precomputed image embedding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Product {
    /// Lowercased text the keyword matcher searches in.
    pub fn search_corpus(&self) -> String {
        format!(
            "{} {} {} {} {} {} {}",
            self.name,
            self.description,
            self.product_type,
            self.category,
            self.style,
            self.material,
            self.color_tags.join(" ")
        )
        .to_lowercase()
    }
}

/// A ranked product returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub product: Product,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "recommendationReason")]
    pub recommendation_reason: String,
    pub final_score: f32,
}

/// Structured search intent produced by the refinement model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Refinement {
    pub key_attributes: Vec<String>,
    pub refined_search_query: String,
    pub complementary_item_categories: Vec<String>,
    pub confidence_level: String,
    pub user_intent_summary: String,
}

/// Result of asking the refinement model. Serialized untagged so clients see
/// either the refinement itself or an object with `error` / `message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RefinementOutcome {
    Refined(Refinement),
    Unparsed { raw_text: String, error: String },
    Failed { error: String },
    Skipped { message: String },
}

impl RefinementOutcome {
    pub fn refinement(&self) -> Option<&Refinement> {
        match self {
            RefinementOutcome::Refined(r) => Some(r),
            _ => None,
        }
    }
}

/// Result of asking the vision model about the query image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageDescription {
    Described { text: String },
    Unavailable { reason: String },
}

impl ImageDescription {
    /// The description text, if the vision model produced one.
    pub fn text(&self) -> Option<&str> {
        match self {
            ImageDescription::Described { text } if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Text-only recommendation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub prompt: String,
    pub top_k: Option<usize>,
}

/// Text-only recommendation response
#[derive(Debug, Clone, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<Recommendation>,
    pub refinement: RefinementOutcome,
}

/// Response to an image upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename_server_temp: String,
    pub image_preview_url: String,
    pub recommendations: Vec<Recommendation>,
    pub image_description: Option<ImageDescription>,
    pub refinement: RefinementOutcome,
}

/// Catalog summary
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub products: usize,
    pub embedded: usize,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
}

/// A line of the mock checkout cart
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub name: Option<String>,
    /// Price as sent by the frontend: "$19.99", "19.99" or a bare number
    #[serde(default)]
    pub price: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default, rename = "cartItems")]
    pub cart_items: Vec<CartItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub message: String,
    #[serde(rename = "totalItems")]
    pub total_items: usize,
    #[serde(rename = "totalPrice")]
    pub total_price: String,
}

/// Service configuration as exposed over the API (keys redacted)
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub vision_model: String,
    pub vision_enabled: bool,
    pub refine_provider: String,
    pub refine_model: String,
    pub refine_has_api_key: bool,
    pub embedding_backend: String,
    pub visual_weight: f32,
    pub keyword_weight: f32,
    pub top_k: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_catalog_field_names() {
        let json = r#"{
            "id": "1163",
            "name": "Nike Sahara Team India Fanwear Round Neck Jersey",
            "price": "$42.99",
            "type": "Tshirts",
            "subCategory": "Topwear",
            "color_tags": ["blue"],
            "image_path_for_ai": "static/product_images_db/1163.jpg",
            "images": ["/static/product_images_db/1163.jpg"],
            "embedding": null
        }"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.product_type, "Tshirts");
        assert_eq!(p.sub_category.as_deref(), Some("Topwear"));
        assert!(p.embedding.is_none());
        assert!(p.detailed_reasons.is_empty());
    }

    #[test]
    fn test_recommendation_flattens_product_and_uses_frontend_names() {
        let rec = Recommendation {
            product: Product {
                id: "prod1".to_string(),
                name: "Classic Red Cotton T-Shirt".to_string(),
                ..Default::default()
            },
            image_url: "/static/red.jpg".to_string(),
            recommendation_reason: "Recommended (Score: 2.5)".to_string(),
            final_score: 2.5,
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["id"], "prod1");
        assert_eq!(v["imageUrl"], "/static/red.jpg");
        assert_eq!(v["recommendationReason"], "Recommended (Score: 2.5)");
        assert!(v.get("embedding").is_none());
    }

    #[test]
    fn test_refinement_outcome_serializes_untagged() {
        let failed = RefinementOutcome::Failed {
            error: "boom".to_string(),
        };
        assert_eq!(serde_json::to_value(&failed).unwrap()["error"], "boom");

        let refined = RefinementOutcome::Refined(Refinement {
            refined_search_query: "red tee".to_string(),
            ..Default::default()
        });
        let v = serde_json::to_value(&refined).unwrap();
        assert_eq!(v["refined_search_query"], "red tee");
        assert!(v.get("error").is_none());
    }

    #[test]
    fn test_blank_description_has_no_text() {
        let d = ImageDescription::Described {
            text: "   ".to_string(),
        };
        assert!(d.text().is_none());
        let d = ImageDescription::Unavailable {
            reason: "no key".to_string(),
        };
        assert!(d.text().is_none());
    }
}
