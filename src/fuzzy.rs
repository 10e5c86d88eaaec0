// 🎯 Fuzzy Model Matcher - Closest known model name for a brand
// Scores with the Indel ratio (2 * LCS / total length, as a percentage) and
// accepts the single best candidate only when it reaches the threshold.

use rapidfuzz::distance::indel;
use std::cmp::Ordering;
use tracing::debug;

use crate::catalog::Catalog;
use crate::normalize::normalize;

/// Default acceptance threshold on the 0-100 scale
pub const DEFAULT_THRESHOLD: u32 = 70;

// ============================================================================
// SCORE
// ============================================================================

/// Similarity of two strings as an exact fraction `similar / total`, where
/// `total` is the combined character count and `similar` is `total` minus the
/// Indel distance. Kept as integers so threshold checks have no rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    similar: usize,
    total: usize,
}

impl Score {
    pub fn between(a: &str, b: &str) -> Self {
        let total = a.chars().count() + b.chars().count();
        let distance = indel::distance(a.chars(), b.chars());
        Score {
            similar: total.saturating_sub(distance),
            total,
        }
    }

    /// Score on the 0-100 scale.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        100.0 * self.similar as f64 / self.total as f64
    }

    /// `percent() >= threshold`, evaluated exactly.
    pub fn meets(&self, threshold: u32) -> bool {
        if self.total == 0 {
            return 100 >= threshold;
        }
        100 * self.similar as u64 >= u64::from(threshold) * self.total as u64
    }

    fn cmp_ratio(&self, other: &Score) -> Ordering {
        // Two empty strings count as a perfect match
        let (a_sim, a_tot) = if self.total == 0 { (1, 1) } else { (self.similar, self.total) };
        let (b_sim, b_tot) = if other.total == 0 { (1, 1) } else { (other.similar, other.total) };
        (a_sim as u64 * b_tot as u64).cmp(&(b_sim as u64 * a_tot as u64))
    }
}

// ============================================================================
// MODEL MATCH
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ModelMatch {
    /// Catalog model name (lower-cased)
    pub model: String,
    pub score: Score,
}

// ============================================================================
// FUZZY MATCHER
// ============================================================================

#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    /// Minimum score (0-100) for the best candidate to be accepted (default: 70)
    pub threshold: u32,
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        FuzzyMatcher {
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: u32) -> Self {
        FuzzyMatcher { threshold }
    }

    /// Best candidate among `candidates`, first one wins on equal scores.
    /// Returns it only if it meets the threshold.
    pub fn best_match<'a, I>(&self, query: &str, candidates: I) -> Option<ModelMatch>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut best: Option<(&String, Score)> = None;

        for candidate in candidates {
            let score = Score::between(query, candidate);
            let better = match &best {
                Some((_, best_score)) => score.cmp_ratio(best_score) == Ordering::Greater,
                None => true,
            };
            if better {
                best = Some((candidate, score));
            }
        }

        let (model, score) = best?;
        if !score.meets(self.threshold) {
            debug!(
                query,
                best = model.as_str(),
                score = score.percent(),
                threshold = self.threshold,
                "best model candidate below threshold"
            );
            return None;
        }

        Some(ModelMatch {
            model: model.clone(),
            score,
        })
    }

    /// Resolve a free-text model to a catalog model name for `brand`.
    ///
    /// Brand and model are normalized first. A brand with no known models
    /// returns `None` without scoring anything.
    pub fn match_model(&self, brand: &str, raw_model: &str, catalog: &Catalog) -> Option<ModelMatch> {
        let brand = normalize(brand)?;
        let model = normalize(raw_model)?;

        let candidates = catalog.models_for_brand(&brand);
        if candidates.is_empty() {
            debug!(brand = brand.as_str(), "brand has no known models");
            return None;
        }

        self.best_match(&model, candidates)
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{VehicleRecord, YearCodeTable};

    fn catalog() -> Catalog {
        Catalog::from_records(
            vec![
                VehicleRecord::new("audi", "a3", 2016),
                VehicleRecord::new("audi", "a4", 2018),
                VehicleRecord::new("audi", "q5", 2019),
                VehicleRecord::new("bmw", "x5", 2020),
            ],
            YearCodeTable::new(),
        )
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_score_values() {
        assert_eq!(Score::between("a3", "a3").percent(), 100.0);
        assert_eq!(Score::between("abc", "xyz").percent(), 0.0);
        // LCS("golf", "gold") = 3 -> 6 / 8
        assert_eq!(Score::between("golf", "gold").percent(), 75.0);
        assert_eq!(Score::between("", "").percent(), 100.0);
    }

    #[test]
    fn test_threshold_boundary_exactly_seventy_accepted() {
        // LCS = 7 over 20 characters -> 14 / 20 = 70
        let score = Score::between("abcdefgxyz", "abcdefghij");
        assert_eq!(score.percent(), 70.0);
        assert!(score.meets(70));

        let matcher = FuzzyMatcher::new();
        let found = matcher.best_match("abcdefgxyz", &names(&["abcdefghij"]));
        assert_eq!(found.unwrap().model, "abcdefghij");
    }

    #[test]
    fn test_threshold_boundary_below_seventy_rejected() {
        // LCS 6 over 17 characters = 70.59, LCS 3 over 17 = 35.29
        let matcher = FuzzyMatcher::new();
        assert!(matcher.best_match("abcdefg", &names(&["abcdefhijk"])).is_some());
        assert!(matcher.best_match("abcdefg", &names(&["abcxyzhijk"])).is_none());

        // Same pair, threshold raised past the score
        let score = Score::between("abcdefgxyz", "abcdefghij");
        assert!(!score.meets(71));
        assert!(FuzzyMatcher::with_threshold(71)
            .best_match("abcdefgxyz", &names(&["abcdefghij"]))
            .is_none());
    }

    #[test]
    fn test_score_sixty_nine_point_something_rejected() {
        // LCS 9 over 26 characters -> 18 / 26 = 69.23
        let score = Score::between("abcdefghixxxx", "abcdefghiyyyy");
        assert!(score.percent() > 69.0 && score.percent() < 70.0);
        assert!(!score.meets(70));
        assert!(FuzzyMatcher::new()
            .best_match("abcdefghixxxx", &names(&["abcdefghiyyyy"]))
            .is_none());
    }

    #[test]
    fn test_first_max_wins_on_tie() {
        let matcher = FuzzyMatcher::with_threshold(0);
        // "a4" and "a5" both score 50 against "a3"
        let found = matcher.best_match("a3", &names(&["a4", "a5"])).unwrap();
        assert_eq!(found.model, "a4");

        let found = matcher.best_match("a3", &names(&["a5", "a4"])).unwrap();
        assert_eq!(found.model, "a5");
    }

    #[test]
    fn test_match_model_normalizes_input() {
        let matcher = FuzzyMatcher::new();
        let found = matcher.match_model("  AUDI ", " A3 ", &catalog()).unwrap();

        assert_eq!(found.model, "a3");
        assert_eq!(found.score.percent(), 100.0);
    }

    #[test]
    fn test_match_model_restricted_to_brand() {
        let matcher = FuzzyMatcher::new();

        // x5 only exists for bmw
        assert!(matcher.match_model("audi", "x5", &catalog()).is_none());
        assert_eq!(matcher.match_model("bmw", "X5", &catalog()).unwrap().model, "x5");
    }

    #[test]
    fn test_unknown_brand_returns_none() {
        let matcher = FuzzyMatcher::with_threshold(0);
        assert!(matcher.match_model("tesla", "a3", &catalog()).is_none());
    }

    #[test]
    fn test_unrelated_model_rejected() {
        let matcher = FuzzyMatcher::new();
        assert!(matcher.match_model("audi", "Zzzzzz", &catalog()).is_none());
    }

    #[test]
    fn test_deterministic() {
        let matcher = FuzzyMatcher::new();
        let catalog = catalog();
        let first = matcher.match_model("Audi", "A 3", &catalog);
        for _ in 0..10 {
            assert_eq!(matcher.match_model("Audi", "A 3", &catalog), first);
        }
    }
}
