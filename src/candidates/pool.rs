use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TvPickError;
use crate::slots::canonical_brand;

use super::types::Candidate;

/// Default size tolerance in inches for windowed size matching.
pub const DEFAULT_SIZE_WINDOW: u32 = 5;

/// Query sent to a candidate source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolQuery {
    pub size: u32,
    /// Canonical brand key, or `None` for any brand.
    pub brand: Option<String>,
    pub budget_ceiling: Option<u32>,
}

/// The only boundary between the recommendation core and candidate data.
///
/// Implementations must restrict results to the requested size (exact or
/// windowed, their choice) and must NOT drop candidates with an unknown
/// price; price validity is enforced by the selection engine.
pub trait CandidatePool: Send + Sync {
    fn fetch(&self, query: &PoolQuery) -> Result<Vec<Candidate>, TvPickError>;
}

impl<T: CandidatePool + ?Sized> CandidatePool for Arc<T> {
    fn fetch(&self, query: &PoolQuery) -> Result<Vec<Candidate>, TvPickError> {
        (**self).fetch(query)
    }
}

impl<T: CandidatePool + ?Sized> CandidatePool for Box<T> {
    fn fetch(&self, query: &PoolQuery) -> Result<Vec<Candidate>, TvPickError> {
        (**self).fetch(query)
    }
}

/// Whether a candidate's size is within `window` inches of the target.
pub fn size_matches(candidate_size: u32, target: u32, window: u32) -> bool {
    candidate_size.abs_diff(target) <= window
}

/// Vec-backed pool, used for tests and for data already loaded in memory.
pub struct InMemoryPool {
    candidates: Vec<Candidate>,
    size_window: u32,
}

impl InMemoryPool {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            size_window: DEFAULT_SIZE_WINDOW,
        }
    }

    /// Override the size tolerance (0 = exact match).
    pub fn with_size_window(mut self, window: u32) -> Self {
        self.size_window = window;
        self
    }
}

impl CandidatePool for InMemoryPool {
    fn fetch(&self, query: &PoolQuery) -> Result<Vec<Candidate>, TvPickError> {
        let brand = query.brand.as_deref().map(canonical_brand);
        Ok(self
            .candidates
            .iter()
            .filter(|c| size_matches(c.size_inch, query.size, self.size_window))
            .filter(|c| {
                brand
                    .as_deref()
                    .map_or(true, |b| canonical_brand(&c.brand) == b)
            })
            .filter(|c| match (query.budget_ceiling, c.valid_price()) {
                (Some(budget), Some(price)) => price <= budget,
                _ => true,
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> InMemoryPool {
        InMemoryPool::new(vec![
            Candidate::new("TCL", "Q10M", 75).with_price(8999),
            Candidate::new("TCL", "Q9M", 85).with_price(12999),
            Candidate::new("Hisense", "E8S", 75),
            Candidate::new("SONY", "X90L", 65).with_price(6999),
        ])
    }

    #[test]
    fn test_windowed_size_match() {
        let found = pool()
            .fetch(&PoolQuery {
                size: 75,
                brand: None,
                budget_ceiling: None,
            })
            .unwrap();
        let models: Vec<_> = found.iter().map(|c| c.model.as_str()).collect();
        assert_eq!(models, vec!["Q10M", "E8S"]);
    }

    #[test]
    fn test_exact_size_match() {
        let found = pool()
            .with_size_window(0)
            .fetch(&PoolQuery {
                size: 85,
                brand: None,
                budget_ceiling: None,
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].model, "Q9M");
    }

    #[test]
    fn test_budget_keeps_unknown_price() {
        let found = pool()
            .fetch(&PoolQuery {
                size: 75,
                brand: None,
                budget_ceiling: Some(5000),
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].model, "E8S");
    }

    #[test]
    fn test_brand_filter_uses_canonical_names() {
        let found = pool()
            .fetch(&PoolQuery {
                size: 75,
                brand: Some("海信".to_string()),
                budget_ceiling: None,
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].brand, "Hisense");
    }
}
