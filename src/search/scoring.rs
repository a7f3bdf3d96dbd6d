use std::collections::HashSet;

use crate::catalog::CatalogEntry;
use crate::config::ScoringConfig;
use crate::models::{Recommendation, Refinement};
use crate::search::keywords::prompt_terms;
use crate::search::vector::VectorHit;

const VISUAL_REASON_PREFIX: &str = "Visually similar";
const FALLBACK_REASON: &str = "Popular item (fallback)";
const DEFAULT_REASON: &str = "Recommended";
const FALLBACK_SCORE: f32 = 0.1;

/// The merged keyword set every candidate is matched against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSignals {
    pub keywords: Vec<String>,
}

impl SearchSignals {
    /// Union of the prompt's terms, the extracted keywords, and (when the
    /// refinement model answered) its key attributes and refined query words.
    /// Lowercased, empties dropped, first occurrence wins.
    pub fn collect(prompt: &str, extracted: &[String], refinement: Option<&Refinement>) -> Self {
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();
        let mut push = |kw: String| {
            let kw = kw.trim().to_lowercase();
            if !kw.is_empty() && seen.insert(kw.clone()) {
                keywords.push(kw);
            }
        };

        for term in prompt_terms(prompt) {
            push(term);
        }
        for kw in extracted {
            push(kw.clone());
        }
        if let Some(r) = refinement {
            for attr in &r.key_attributes {
                push(attr.clone());
            }
            for term in prompt_terms(&r.refined_search_query) {
                push(term);
            }
        }

        Self { keywords }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// A product under consideration, before keyword scoring.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub entry: CatalogEntry,
    /// Cosine similarity to the query image, for visual candidates
    pub visual_score: Option<f32>,
    pub reason: String,
    pub detailed_reasons: Vec<String>,
}

impl Candidate {
    /// A catalog product considered on text signals alone. Curated
    /// `detailedReasons` from the catalog carry over.
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        let mut entry = entry.clone();
        entry.embedding = None;
        let detailed_reasons = entry.product.detailed_reasons.clone();
        Self {
            entry,
            visual_score: None,
            reason: String::new(),
            detailed_reasons,
        }
    }

    /// A product found by image similarity.
    pub fn from_visual(hit: &VectorHit<'_>) -> Self {
        let mut entry = hit.entry.clone();
        entry.embedding = None;
        Self {
            entry,
            visual_score: Some(hit.score),
            reason: format!("{VISUAL_REASON_PREFIX} (similarity: {:.2})", hit.score),
            detailed_reasons: vec![format!("Visual similarity: {:.2}", hit.score)],
        }
    }
}

/// Turn the nearest-neighbour ranking into candidates.
pub fn visual_candidates(hits: &[VectorHit<'_>]) -> Vec<Candidate> {
    hits.iter().map(Candidate::from_visual).collect()
}

/// Score candidates by weighted visual similarity plus keyword matches and
/// return the best `top_k`, best first.
///
/// score = visual × `visual_weight` + distinct matched keywords × `keyword_weight`.
/// A keyword matches when it occurs as a substring of the product's lowercase
/// text (name, description, type, category, style, material, colour tags).
/// Reasons are not yet suffixed with the score; see [`finalize`].
pub fn score_candidates(
    candidates: Vec<Candidate>,
    signals: &SearchSignals,
    weights: &ScoringConfig,
    top_k: usize,
) -> Vec<Recommendation> {
    let mut scored: Vec<Recommendation> = candidates
        .into_iter()
        .map(|c| score_one(c, signals, weights))
        .collect();

    // Stable: equal scores keep candidate order (visual rank or catalog order)
    scored.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);
    scored
}

fn score_one(candidate: Candidate, signals: &SearchSignals, weights: &ScoringConfig) -> Recommendation {
    let Candidate {
        entry,
        visual_score,
        mut reason,
        mut detailed_reasons,
    } = candidate;

    let mut score = visual_score.unwrap_or(0.0) * weights.visual_weight;

    let corpus = entry.product.search_corpus();
    let matched: Vec<&str> = signals
        .keywords
        .iter()
        .map(String::as_str)
        .filter(|kw| corpus.contains(kw))
        .collect();

    score += matched.len() as f32 * weights.keyword_weight;

    if !matched.is_empty() {
        let match_reason = format!("Matches keywords: {}", matched.join(", "));
        reason = if visual_score.is_some() {
            format!("{reason} & {}", match_reason.to_lowercase())
        } else if reason.is_empty() {
            match_reason.clone()
        } else {
            format!("{reason}, also {}", match_reason.to_lowercase())
        };
        detailed_reasons.push(match_reason);
    }

    let mut seen = HashSet::new();
    detailed_reasons.retain(|r| seen.insert(r.clone()));

    let CatalogEntry {
        mut product,
        image_url,
        ..
    } = entry;
    product.detailed_reasons = detailed_reasons;
    product.embedding = None;

    Recommendation {
        product,
        image_url,
        recommendation_reason: reason,
        final_score: score,
    }
}

/// Attach the score to each reason for display.
///
/// An empty reason becomes "Recommended". Every item gets ` (Score: x.x)`
/// except fallback items scored at or below 0.01, which keep their reason.
pub fn finalize(recommendations: &mut [Recommendation]) {
    for rec in recommendations.iter_mut() {
        let reason = rec.recommendation_reason.trim();
        let base = if reason.is_empty() { DEFAULT_REASON } else { reason };
        if rec.final_score > 0.01 || !base.to_lowercase().contains("fallback") {
            rec.recommendation_reason = format!("{base} (Score: {:.1})", rec.final_score);
        } else {
            rec.recommendation_reason = base.to_string();
        }
    }
}

/// The first `top_k` catalog products, used when nothing else could be ranked.
pub fn fallback(entries: &[CatalogEntry], top_k: usize) -> Vec<Recommendation> {
    entries
        .iter()
        .take(top_k)
        .map(|entry| {
            let mut product = entry.product.clone();
            product.embedding = None;
            Recommendation {
                product,
                image_url: entry.image_url.clone(),
                recommendation_reason: FALLBACK_REASON.to_string(),
                final_score: FALLBACK_SCORE,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;

    fn make_entry(id: &str, name: &str, description: &str, colors: &[&str]) -> CatalogEntry {
        CatalogEntry {
            product: Product {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                color_tags: colors.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            },
            image_url: format!("/static/{id}.jpg"),
            embedding: Some(vec![1.0, 0.0]),
        }
    }

    fn signals(words: &[&str]) -> SearchSignals {
        SearchSignals {
            keywords: words.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn weights() -> ScoringConfig {
        ScoringConfig::default()
    }

    #[test]
    fn test_collect_merges_all_sources() {
        let refinement = Refinement {
            key_attributes: vec!["Red Floral Dress".to_string(), "summer".to_string()],
            refined_search_query: "red floral maxi dress".to_string(),
            ..Default::default()
        };
        let s = SearchSignals::collect(
            "a RED dress",
            &["dress".to_string(), "beach".to_string()],
            Some(&refinement),
        );
        assert_eq!(
            s.keywords,
            vec!["red", "dress", "beach", "red floral dress", "summer", "floral", "maxi"]
        );
    }

    #[test]
    fn test_collect_without_refinement() {
        let s = SearchSignals::collect("", &[], None);
        assert!(s.is_empty());
    }

    #[test]
    fn test_keyword_score_counts_distinct_matches() {
        let entry = make_entry("p1", "Classic Red Cotton T-Shirt", "comfortable tee", &["red"]);
        let recs = score_candidates(
            vec![Candidate::from_entry(&entry)],
            &signals(&["red", "cotton", "denim"]),
            &weights(),
            10,
        );
        assert_eq!(recs.len(), 1);
        assert!((recs[0].final_score - 5.0).abs() < 1e-6);
        assert_eq!(recs[0].recommendation_reason, "Matches keywords: red, cotton");
        assert_eq!(
            recs[0].product.detailed_reasons,
            vec!["Matches keywords: red, cotton"]
        );
    }

    #[test]
    fn test_visual_score_weighted_and_reason_merged() {
        let entries = vec![make_entry("p1", "Blue Jeans", "denim", &["blue"])];
        let hits = vec![VectorHit {
            entry: &entries[0],
            score: 0.8,
        }];
        let recs = score_candidates(visual_candidates(&hits), &signals(&["denim"]), &weights(), 10);
        assert!((recs[0].final_score - (8.0 + 2.5)).abs() < 1e-5);
        assert_eq!(
            recs[0].recommendation_reason,
            "Visually similar (similarity: 0.80) & matches keywords: denim"
        );
        assert_eq!(
            recs[0].product.detailed_reasons,
            vec!["Visual similarity: 0.80", "Matches keywords: denim"]
        );
        assert!(recs[0].product.embedding.is_none());
    }

    #[test]
    fn test_existing_reason_gets_also_clause() {
        let entry = make_entry("p1", "Leather Belt", "brown leather", &["brown"]);
        let mut c = Candidate::from_entry(&entry);
        c.reason = "Staff pick".to_string();
        let recs = score_candidates(vec![c], &signals(&["leather"]), &weights(), 10);
        assert_eq!(
            recs[0].recommendation_reason,
            "Staff pick, also matches keywords: leather"
        );
    }

    #[test]
    fn test_catalog_detailed_reasons_carry_over_and_dedup() {
        let mut entry = make_entry("p1", "Red Tee", "", &[]);
        entry.product.detailed_reasons = vec![
            "Matches keywords: red".to_string(),
            "Matches color 'Red'".to_string(),
        ];
        let recs = score_candidates(
            vec![Candidate::from_entry(&entry)],
            &signals(&["red"]),
            &weights(),
            10,
        );
        assert_eq!(
            recs[0].product.detailed_reasons,
            vec!["Matches keywords: red", "Matches color 'Red'"]
        );
    }

    #[test]
    fn test_sorted_descending_and_truncated() {
        let entries = vec![
            make_entry("none", "Plain Mug", "ceramic", &[]),
            make_entry("two", "Red Cotton Tee", "", &["red"]),
            make_entry("one", "Red Cap", "", &[]),
        ];
        let candidates = entries.iter().map(Candidate::from_entry).collect();
        let recs = score_candidates(candidates, &signals(&["red", "cotton"]), &weights(), 2);
        let ids: Vec<&str> = recs.iter().map(|r| r.product.id.as_str()).collect();
        assert_eq!(ids, vec!["two", "one"]);
    }

    #[test]
    fn test_ties_keep_candidate_order() {
        let entries = vec![
            make_entry("a", "Mug", "", &[]),
            make_entry("b", "Cup", "", &[]),
            make_entry("c", "Bowl", "", &[]),
        ];
        let candidates = entries.iter().map(Candidate::from_entry).collect();
        let recs = score_candidates(candidates, &SearchSignals::default(), &weights(), 10);
        let ids: Vec<&str> = recs.iter().map(|r| r.product.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_keyword_matches_search_type_and_material() {
        let mut entry = make_entry("p1", "Runner", "", &[]);
        entry.product.product_type = "Sneakers".to_string();
        entry.product.material = "Mesh".to_string();
        let recs = score_candidates(
            vec![Candidate::from_entry(&entry)],
            &signals(&["sneaker", "mesh"]),
            &weights(),
            10,
        );
        assert!((recs[0].final_score - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_custom_weights() {
        let entry = make_entry("p1", "Red Tee", "", &[]);
        let w = ScoringConfig {
            keyword_weight: 1.0,
            ..ScoringConfig::default()
        };
        let recs = score_candidates(vec![Candidate::from_entry(&entry)], &signals(&["red"]), &w, 10);
        assert!((recs[0].final_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_finalize_appends_score() {
        let entry = make_entry("p1", "Red Tee", "", &[]);
        let mut recs = score_candidates(
            vec![Candidate::from_entry(&entry)],
            &signals(&["red"]),
            &weights(),
            10,
        );
        finalize(&mut recs);
        assert_eq!(recs[0].recommendation_reason, "Matches keywords: red (Score: 2.5)");
    }

    #[test]
    fn test_finalize_unmatched_defaults_to_recommended() {
        let entry = make_entry("p1", "Mug", "", &[]);
        let mut recs = score_candidates(
            vec![Candidate::from_entry(&entry)],
            &signals(&["red"]),
            &weights(),
            10,
        );
        finalize(&mut recs);
        assert_eq!(recs[0].recommendation_reason, "Recommended (Score: 0.0)");
    }

    #[test]
    fn test_finalize_zero_score_fallback_keeps_reason() {
        let entry = make_entry("p1", "Mug", "", &[]);
        let mut recs = fallback(&[entry], 1);
        recs[0].final_score = 0.0;
        finalize(&mut recs);
        assert_eq!(recs[0].recommendation_reason, "Popular item (fallback)");
    }

    #[test]
    fn test_finalize_visual_without_keywords_keeps_visual_reason() {
        let entries = vec![make_entry("p1", "Mug", "", &[])];
        let hits = vec![VectorHit {
            entry: &entries[0],
            score: 0.5,
        }];
        let mut recs = score_candidates(visual_candidates(&hits), &SearchSignals::default(), &weights(), 10);
        finalize(&mut recs);
        assert_eq!(
            recs[0].recommendation_reason,
            "Visually similar (similarity: 0.50) (Score: 5.0)"
        );
    }

    #[test]
    fn test_fallback_reason_gets_score() {
        let entries = vec![
            make_entry("a", "Mug", "", &[]),
            make_entry("b", "Cup", "", &[]),
            make_entry("c", "Bowl", "", &[]),
        ];
        let mut recs = fallback(&entries, 2);
        finalize(&mut recs);
        assert_eq!(recs.len(), 2);
        assert!(recs
            .iter()
            .all(|r| r.recommendation_reason == "Popular item (fallback) (Score: 0.1)"));
        assert!(recs.iter().all(|r| (r.final_score - 0.1).abs() < 1e-6));
        assert!(recs.iter().all(|r| r.product.embedding.is_none()));
    }
}
