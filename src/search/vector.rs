use crate::catalog::CatalogEntry;

/// A catalog entry ranked by visual similarity to the query image.
#[derive(Debug, Clone)]
pub struct VectorHit<'a> {
    pub entry: &'a CatalogEntry,
    pub score: f32,
}

/// Rank the embedded catalog entries by cosine similarity to `query_embedding`,
/// best first, keeping at most `limit`. Entries without an embedding are skipped.
pub fn rank_by_similarity<'a>(
    query_embedding: &[f32],
    entries: &'a [CatalogEntry],
    limit: usize,
) -> Vec<VectorHit<'a>> {
    let mut scored: Vec<VectorHit<'a>> = entries
        .iter()
        .filter_map(|entry| {
            entry.embedding.as_ref().map(|e| VectorHit {
                entry,
                score: cosine_similarity(query_embedding, e),
            })
        })
        .collect();

    // Sort descending by score; stable so catalog order breaks ties
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;

    fn entry(id: &str, embedding: Option<Vec<f32>>) -> CatalogEntry {
        CatalogEntry {
            product: Product {
                id: id.to_string(),
                name: format!("Product {id}"),
                ..Default::default()
            },
            image_url: String::new(),
            embedding,
        }
    }

    #[test]
    fn test_cosine_identical_vectors() {
        let v = [0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_rank_orders_by_similarity_and_skips_unembedded() {
        let entries = vec![
            entry("main", Some(vec![0.1, 0.2, 0.9])),
            entry("none", None),
            entry("db", Some(vec![0.9, 0.1, 0.1])),
            entry("http", Some(vec![0.2, 0.8, 0.3])),
        ];
        let hits = rank_by_similarity(&[0.95, 0.05, 0.05], &entries, 10);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].entry.product.id, "db");
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[test]
    fn test_rank_respects_limit() {
        let entries: Vec<_> = (0..20)
            .map(|i| entry(&i.to_string(), Some(vec![1.0, i as f32])))
            .collect();
        assert_eq!(rank_by_similarity(&[1.0, 0.0], &entries, 5).len(), 5);
    }
}
