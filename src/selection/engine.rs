//! Ordering and Top-3 + 2 selection over scored candidates.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::candidates::{Candidate, ModelKey};
use crate::scoring::ScoredCandidate;
use crate::slots::BrandStance;

use super::types::*;

/// Number of primary picks.
pub const TOP_N: usize = 3;
/// Mid-price alternate targets this fraction of the budget.
pub const DEFAULT_MID_PRICE_RATIO: f64 = 0.70;

/// Orders scored candidates and picks the final recommendation set.
#[derive(Debug, Clone)]
pub struct SelectionEngine {
    preferred_year: i32,
    mid_price_ratio: f64,
}

impl SelectionEngine {
    pub fn new(preferred_year: i32) -> Self {
        Self {
            preferred_year,
            mid_price_ratio: DEFAULT_MID_PRICE_RATIO,
        }
    }

    pub fn with_mid_price_ratio(mut self, ratio: f64) -> Self {
        self.mid_price_ratio = ratio;
        self
    }

    pub fn with_preferred_year(mut self, year: i32) -> Self {
        self.preferred_year = year;
        self
    }

    pub fn preferred_year(&self) -> i32 {
        self.preferred_year
    }

    /// Hard filter applied before scoring, so excluded rows never stretch a
    /// metric's normalization range.
    ///
    /// Drops candidates with no valid price, above `budget` (when given) or
    /// rejected by the brand stance.
    pub fn eligible(
        &self,
        candidates: Vec<Candidate>,
        budget: Option<u32>,
        stance: &BrandStance,
    ) -> Vec<Candidate> {
        let before = candidates.len();
        let kept: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| admits(c, budget, stance))
            .collect();
        debug!("Hard filter kept {} of {} candidates", kept.len(), before);
        kept
    }

    /// Filter and sort without cutting to Top-3.
    ///
    /// Applies the same hard filter as [`SelectionEngine::eligible`], then
    /// sorts by the ordering key.
    pub fn order(
        &self,
        scored: Vec<ScoredCandidate>,
        budget: Option<u32>,
        stance: &BrandStance,
    ) -> Vec<ScoredCandidate> {
        let mut eligible: Vec<ScoredCandidate> = scored
            .into_iter()
            .filter(|s| admits(&s.candidate, budget, stance))
            .collect();
        eligible.sort_by(|a, b| self.compare(a, b));
        eligible
    }

    /// Pick Top-3 plus the lowest-price and mid-price alternates.
    pub fn select(
        &self,
        scored: Vec<ScoredCandidate>,
        size: u32,
        budget: u32,
        scene: &str,
        stance: &BrandStance,
    ) -> RecommendationResult {
        let filters = AppliedFilters {
            size,
            budget,
            scene: scene.to_string(),
            brand: stance.clone(),
            preferred_year: self.preferred_year,
        };

        let ordered: Vec<(u32, ScoredCandidate)> = self
            .order(scored, Some(budget), stance)
            .into_iter()
            .filter_map(|s| s.candidate.valid_price().map(|p| (p, s)))
            .collect();
        let eligible = ordered.len();

        if ordered.is_empty() {
            debug!("No candidates left after filtering for {:?}", filters);
            return RecommendationResult {
                outcome: Outcome::NoCandidates,
                filters,
                top: Vec::new(),
                lowest_price: AlternateSlot::Unavailable,
                mid_price: AlternateSlot::Unavailable,
                eligible,
            };
        }

        // Top-3: first occurrence of each model in ordering position.
        let mut top_keys: HashSet<ModelKey> = HashSet::new();
        let mut top_idx: Vec<usize> = Vec::with_capacity(TOP_N);
        for (i, (_, s)) in ordered.iter().enumerate() {
            if top_idx.len() == TOP_N {
                break;
            }
            if top_keys.insert(s.candidate.model_key()) {
                top_idx.push(i);
            }
        }

        // Alternates may come from any row, any size variant, of a model
        // outside the Top-3. Indexes keep ordering position for ties.
        let rest: Vec<usize> = (0..ordered.len())
            .filter(|i| !top_keys.contains(&ordered[*i].1.candidate.model_key()))
            .collect();

        let lowest_idx = rest.iter().copied().min_by(|ia, ib| {
            let (pa, a) = &ordered[*ia];
            let (pb, b) = &ordered[*ib];
            pa.cmp(pb)
                .then_with(|| b.candidate.launch.cmp(&a.candidate.launch))
                .then_with(|| ia.cmp(ib))
        });
        let lowest_key = lowest_idx.map(|i| ordered[i].1.candidate.model_key());

        let target = self.mid_price_ratio * budget as f64;
        let mid_idx = rest
            .iter()
            .copied()
            .filter(|i| Some(ordered[*i].1.candidate.model_key()) != lowest_key)
            .min_by(|ia, ib| {
                let (pa, a) = &ordered[*ia];
                let (pb, b) = &ordered[*ib];
                let da = (*pa as f64 - target).abs();
                let db = (*pb as f64 - target).abs();
                da.total_cmp(&db)
                    .then_with(|| b.candidate.launch.cmp(&a.candidate.launch))
                    .then_with(|| pb.cmp(pa))
                    .then_with(|| ia.cmp(ib))
            });

        let mut top = Vec::with_capacity(top_idx.len());
        let mut lowest = None;
        let mut mid = None;
        for (i, (price, s)) in ordered.into_iter().enumerate() {
            if top_idx.contains(&i) {
                top.push(Pick::new(s, price));
            } else if Some(i) == lowest_idx {
                lowest = Some(Pick::new(s, price));
            } else if Some(i) == mid_idx {
                mid = Some(Pick::new(s, price));
            }
        }

        RecommendationResult {
            outcome: Outcome::Recommended,
            filters,
            top,
            lowest_price: lowest.into(),
            mid_price: mid.into(),
            eligible,
        }
    }

    /// 0 = launched in the preferred year, 1 = other known year, 2 = unknown.
    fn bucket(&self, s: &ScoredCandidate) -> u8 {
        match s.candidate.launch_year() {
            Some(year) if year == self.preferred_year => 0,
            Some(_) => 1,
            None => 2,
        }
    }

    /// Bucket, score desc, launch desc, price desc, then brand and model.
    fn compare(&self, a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
        self.bucket(a)
            .cmp(&self.bucket(b))
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| b.candidate.launch.cmp(&a.candidate.launch))
            .then_with(|| b.candidate.valid_price().cmp(&a.candidate.valid_price()))
            .then_with(|| a.candidate.brand.cmp(&b.candidate.brand))
            .then_with(|| a.candidate.model.cmp(&b.candidate.model))
    }
}

/// Valid price within `budget` (when given) and allowed by the stance.
fn admits(candidate: &Candidate, budget: Option<u32>, stance: &BrandStance) -> bool {
    let priced = match (candidate.valid_price(), budget) {
        (None, _) => false,
        (Some(price), Some(ceiling)) => price <= ceiling,
        (Some(_), None) => true,
    };
    priced && stance.allows(&candidate.brand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scored(model: &str, price: i64, launch: &str, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate::new("TCL", model, 75)
                .with_price(price)
                .with_launch(launch),
            score,
            contributions: BTreeMap::new(),
            adjustments: Vec::new(),
        }
    }

    fn models(picks: &[Pick]) -> Vec<&str> {
        picks.iter().map(|p| p.model.as_str()).collect()
    }

    #[test]
    fn test_bucket_beats_score() {
        let engine = SelectionEngine::new(2026);
        let ordered = engine.order(
            vec![
                scored("OLD", 1000, "2025-03", 0.9),
                scored("NEW", 1000, "2026-02", 0.1),
                scored("UNKNOWN", 1000, "", 1.0),
            ],
            None,
            &BrandStance::Unrestricted,
        );
        let names: Vec<_> = ordered.iter().map(|s| s.candidate.model.as_str()).collect();
        assert_eq!(names, vec!["NEW", "OLD", "UNKNOWN"]);
    }

    #[test]
    fn test_tie_breaks_launch_then_price() {
        let engine = SelectionEngine::new(2026);
        let ordered = engine.order(
            vec![
                scored("A", 1000, "2026-01", 0.5),
                scored("B", 1000, "2026-05", 0.5),
                scored("C", 2000, "2026-01", 0.5),
            ],
            None,
            &BrandStance::Unrestricted,
        );
        let names: Vec<_> = ordered.iter().map(|s| s.candidate.model.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_invalid_price_excluded_even_without_budget() {
        let engine = SelectionEngine::new(2026);
        let ordered = engine.order(
            vec![scored("A", 0, "2026-01", 1.0), scored("B", 900, "2026-01", 0.0)],
            None,
            &BrandStance::Unrestricted,
        );
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].candidate.model, "B");
    }

    #[test]
    fn test_brand_stance_applied() {
        let engine = SelectionEngine::new(2026);
        let mut other = scored("X", 900, "2026-01", 1.0);
        other.candidate.brand = "Sony".to_string();
        let ordered = engine.order(
            vec![other, scored("A", 900, "2026-01", 0.0)],
            None,
            &BrandStance::Exclude(vec!["sony".to_string()]),
        );
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].candidate.model, "A");
    }

    #[test]
    fn test_top3_distinct_models_and_alternates() {
        let engine = SelectionEngine::new(2026);
        let mut dup = scored("A", 5000, "2026-01", 0.95);
        dup.candidate.size_inch = 77;
        let result = engine.select(
            vec![
                scored("A", 5000, "2026-01", 0.9),
                dup,
                scored("B", 6000, "2026-01", 0.8),
                scored("C", 7000, "2026-01", 0.7),
                scored("D", 9500, "2026-01", 0.6),
                scored("E", 3000, "2026-01", 0.5),
                scored("F", 7200, "2026-01", 0.4),
            ],
            75,
            10_000,
            "ps5",
            &BrandStance::Unrestricted,
        );
        assert_eq!(result.outcome, Outcome::Recommended);
        assert_eq!(models(&result.top), vec!["A", "B", "C"]);
        // the higher-scoring 77" variant stands in for model A
        assert_eq!(result.top[0].size_inch, 77);
        assert_eq!(result.lowest_price.pick().unwrap().model, "E");
        // target 7000: F (7200) beats D (9500)
        assert_eq!(result.mid_price.pick().unwrap().model, "F");
        assert_eq!(result.eligible, 7);
    }

    #[test]
    fn test_same_model_name_under_two_brands_is_two_products() {
        let engine = SelectionEngine::new(2026);
        let mut hisense = scored("U8", 5000, "2026-01", 0.9);
        hisense.candidate.brand = "Hisense".to_string();
        let mut other = scored("U8", 4000, "2026-01", 0.8);
        other.candidate.brand = "Other".to_string();
        let result = engine.select(
            vec![hisense, other, scored("Q9", 3000, "2026-01", 0.7)],
            75,
            10_000,
            "ps5",
            &BrandStance::Unrestricted,
        );
        let names: Vec<_> = result
            .top
            .iter()
            .map(|p| format!("{} {}", p.brand, p.model))
            .collect();
        assert_eq!(names, vec!["Hisense U8", "Other U8", "TCL Q9"]);
    }

    #[test]
    fn test_alternates_consider_every_size_variant() {
        let engine = SelectionEngine::new(2026);
        let mut small_d = scored("D", 2000, "2026-01", 0.1);
        small_d.candidate.size_inch = 70;
        let result = engine.select(
            vec![
                scored("A", 9000, "2026-01", 0.9),
                scored("B", 9000, "2026-01", 0.8),
                scored("C", 9000, "2026-01", 0.7),
                scored("D", 9500, "2026-01", 0.6),
                scored("E", 5000, "2026-01", 0.5),
                small_d,
            ],
            75,
            10_000,
            "ps5",
            &BrandStance::Unrestricted,
        );
        let low = result.lowest_price.pick().unwrap();
        assert_eq!((low.model.as_str(), low.size_inch, low.price), ("D", 70, 2000));
        // mid never repeats the lowest-price model, whatever the size
        assert_eq!(result.mid_price.pick().unwrap().model, "E");
    }

    #[test]
    fn test_eligible_filters_before_scoring() {
        let engine = SelectionEngine::new(2026);
        let kept = engine.eligible(
            vec![
                Candidate::new("TCL", "PRICED", 75).with_price(4000),
                Candidate::new("TCL", "UNPRICED", 75),
                Candidate::new("TCL", "ZERO", 75).with_price(0),
                Candidate::new("TCL", "OVER", 75).with_price(9000),
                Candidate::new("Sony", "EXCLUDED", 75).with_price(3000),
            ],
            Some(5000),
            &BrandStance::Exclude(vec!["sony".to_string()]),
        );
        let names: Vec<_> = kept.iter().map(|c| c.model.as_str()).collect();
        assert_eq!(names, vec!["PRICED"]);
    }

    #[test]
    fn test_lowest_price_tie_prefers_newer() {
        let engine = SelectionEngine::new(2026);
        let result = engine.select(
            vec![
                scored("A", 5000, "2026-01", 0.9),
                scored("B", 5000, "2026-01", 0.8),
                scored("C", 5000, "2026-01", 0.7),
                scored("OLDER", 2000, "2026-01", 0.6),
                scored("NEWER", 2000, "2026-04", 0.1),
            ],
            75,
            10_000,
            "ps5",
            &BrandStance::Unrestricted,
        );
        assert_eq!(result.lowest_price.pick().unwrap().model, "NEWER");
        // mid slot never repeats the lowest-price model
        assert_eq!(result.mid_price.pick().unwrap().model, "OLDER");
    }

    #[test]
    fn test_mid_price_tie_prefers_newer_then_higher_price() {
        let engine = SelectionEngine::new(2026);
        let base = vec![
            scored("A", 9000, "2026-01", 0.9),
            scored("B", 9000, "2026-01", 0.8),
            scored("C", 9000, "2026-01", 0.7),
            scored("CHEAP", 1000, "2026-01", 0.0),
        ];

        let mut pool = base.clone();
        pool.push(scored("UNDER", 6500, "2026-01", 0.5));
        pool.push(scored("OVER", 7500, "2026-01", 0.4));
        let result = engine.select(pool, 75, 10_000, "ps5", &BrandStance::Unrestricted);
        assert_eq!(result.mid_price.pick().unwrap().model, "OVER");

        let mut pool = base;
        pool.push(scored("UNDER", 6500, "2026-03", 0.5));
        pool.push(scored("OVER", 7500, "2026-01", 0.4));
        let result = engine.select(pool, 75, 10_000, "ps5", &BrandStance::Unrestricted);
        assert_eq!(result.mid_price.pick().unwrap().model, "UNDER");
    }

    #[test]
    fn test_custom_mid_price_ratio() {
        let engine = SelectionEngine::new(2026).with_mid_price_ratio(0.5);
        let result = engine.select(
            vec![
                scored("A", 9000, "2026-01", 0.9),
                scored("B", 9000, "2026-01", 0.8),
                scored("C", 9000, "2026-01", 0.7),
                scored("CHEAP", 1000, "2026-01", 0.0),
                scored("HALF", 5000, "2026-01", 0.0),
                scored("HIGH", 7000, "2026-01", 0.0),
            ],
            75,
            10_000,
            "ps5",
            &BrandStance::Unrestricted,
        );
        assert_eq!(result.mid_price.pick().unwrap().model, "HALF");
    }

    #[test]
    fn test_small_pool_leaves_alternates_unavailable() {
        let engine = SelectionEngine::new(2026);
        let result = engine.select(
            vec![scored("A", 5000, "2026-01", 0.9), scored("B", 4000, "2026-01", 0.8)],
            75,
            10_000,
            "movie",
            &BrandStance::Unrestricted,
        );
        assert_eq!(result.top.len(), 2);
        assert_eq!(result.lowest_price, AlternateSlot::Unavailable);
        assert_eq!(result.mid_price, AlternateSlot::Unavailable);
    }

    #[test]
    fn test_four_candidates_fill_only_lowest_slot() {
        let engine = SelectionEngine::new(2026);
        let result = engine.select(
            vec![
                scored("A", 5000, "2026-01", 0.9),
                scored("B", 4000, "2026-01", 0.8),
                scored("C", 4500, "2026-01", 0.7),
                scored("D", 3000, "2026-01", 0.6),
            ],
            75,
            10_000,
            "movie",
            &BrandStance::Unrestricted,
        );
        assert_eq!(result.lowest_price.pick().unwrap().model, "D");
        assert_eq!(result.mid_price, AlternateSlot::Unavailable);
    }

    #[test]
    fn test_empty_after_filter_is_no_candidates() {
        let engine = SelectionEngine::new(2026);
        let result = engine.select(
            vec![scored("A", 5000, "2026-01", 0.9)],
            75,
            1000,
            "ps5",
            &BrandStance::Unrestricted,
        );
        assert_eq!(result.outcome, Outcome::NoCandidates);
        assert!(result.top.is_empty());
        assert_eq!(result.filters.budget, 1000);
        assert_eq!(result.filters.preferred_year, 2026);
    }
}
