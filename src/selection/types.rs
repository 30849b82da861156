use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::candidates::LaunchPeriod;
use crate::scoring::ScoredCandidate;
use crate::slots::BrandStance;

/// One selected television, frozen at selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub brand: String,
    pub model: String,
    pub size_inch: u32,
    pub price: u32,
    pub launch: Option<LaunchPeriod>,
    pub score: f64,
    /// Weighted per-metric parts of the base score
    pub contributions: BTreeMap<String, f64>,
    /// Penalties and decay that fired
    pub adjustments: Vec<String>,
}

impl Pick {
    pub(crate) fn new(scored: ScoredCandidate, price: u32) -> Self {
        let ScoredCandidate {
            candidate,
            score,
            contributions,
            adjustments,
        } = scored;
        Self {
            brand: candidate.brand,
            model: candidate.model,
            size_inch: candidate.size_inch,
            price,
            launch: candidate.launch,
            score,
            contributions,
            adjustments,
        }
    }
}

/// An alternate recommendation slot. Empty slots are explicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "pick", rename_all = "snake_case")]
pub enum AlternateSlot {
    Available(Pick),
    Unavailable,
}

impl AlternateSlot {
    pub fn pick(&self) -> Option<&Pick> {
        match self {
            AlternateSlot::Available(p) => Some(p),
            AlternateSlot::Unavailable => None,
        }
    }
}

impl From<Option<Pick>> for AlternateSlot {
    fn from(value: Option<Pick>) -> Self {
        value.map_or(AlternateSlot::Unavailable, AlternateSlot::Available)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Recommended,
    /// Nothing survived the price, budget and brand filters.
    NoCandidates,
}

/// Filters a result was computed under, echoed back to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFilters {
    pub size: u32,
    pub budget: u32,
    /// Profile key the pool was scored with
    pub scene: String,
    pub brand: BrandStance,
    pub preferred_year: i32,
}

/// Top-3 plus the two alternates for one completed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub outcome: Outcome,
    pub filters: AppliedFilters,
    pub top: Vec<Pick>,
    pub lowest_price: AlternateSlot,
    pub mid_price: AlternateSlot,
    /// Number of candidates that passed the filters
    pub eligible: usize,
}

impl RecommendationResult {
    /// Every selected pick in display order: Top-3, then alternates.
    pub fn all_picks(&self) -> impl Iterator<Item = &Pick> {
        self.top
            .iter()
            .chain(self.lowest_price.pick())
            .chain(self.mid_price.pick())
    }
}

/// Row of the direct ranking output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub brand: String,
    pub model: String,
    pub size_inch: u32,
    pub price: Option<u32>,
    pub launch: Option<LaunchPeriod>,
    pub score: f64,
}

impl RankedCandidate {
    pub(crate) fn new(rank: usize, scored: &ScoredCandidate) -> Self {
        let c = &scored.candidate;
        Self {
            rank,
            brand: c.brand.clone(),
            model: c.model.clone(),
            size_inch: c.size_inch,
            price: c.valid_price(),
            launch: c.launch,
            score: scored.score,
        }
    }
}
