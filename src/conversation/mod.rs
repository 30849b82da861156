//! Conversation service tying the collector, session store and engines
//! together.
//!
//! # Entry points
//!
//! - [`Conversation::handle`]: one user message in, one reply out; besides
//!   answers it understands reset, show more and compare
//! - [`Conversation::rank`]: direct ranking without a conversation
//! - [`Conversation::preview`]: the raw pool, newest first
//!
//! # Example
//!
//! ```ignore
//! use tvpick::candidates::InMemoryPool;
//! use tvpick::conversation::Conversation;
//! use tvpick::scoring::{default_profiles, ScoringEngine};
//! use tvpick::selection::SelectionEngine;
//! use tvpick::session::MemorySessionStore;
//!
//! let chat = Conversation::new(
//!     MemorySessionStore::default(),
//!     InMemoryPool::new(candidates),
//!     ScoringEngine::new(default_profiles()),
//!     SelectionEngine::new(2026),
//! );
//! for text in ["75", "13k", "ps5", "只要tcl"] {
//!     println!("{}", chat.handle("user-1", text)?.reply);
//! }
//! ```

pub mod collector;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::candidates::{Candidate, CandidatePool, LaunchPeriod, PoolQuery};
use crate::error::TvPickError;
use crate::render;
use crate::scoring::ScoringEngine;
use crate::selection::{RankedCandidate, RecommendationResult, SelectionEngine};
use crate::session::{SessionEntry, SessionState, SessionStore};
use crate::slots::{canonical_brand, BrandStance};

use collector::{Advance, Command, Criteria};

/// Reply to one user message.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub reply: String,
    /// Slots after this message. On the message that completes a round this
    /// is the filled state the result was computed from; the stored state
    /// has already been cleared for the next round.
    pub state: SessionState,
    /// Whether this message produced a recommendation.
    pub done: bool,
    pub result: Option<RecommendationResult>,
}

/// Arguments of the direct ranking entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankRequest {
    pub size: u32,
    /// Profile key, e.g. `ps5` or `newest`
    pub scene: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub budget: Option<u32>,
    /// Overrides the service's preferred launch year
    #[serde(default)]
    pub preferred_year: Option<i32>,
    pub top: usize,
}

/// Candidate pool snapshot for a size/brand/budget.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub total: usize,
    pub candidates: Vec<Candidate>,
}

pub struct Conversation<S, P> {
    store: S,
    pool: P,
    scoring: ScoringEngine,
    selection: SelectionEngine,
    reference_month: Option<LaunchPeriod>,
}

impl<S: SessionStore, P: CandidatePool> Conversation<S, P> {
    pub fn new(store: S, pool: P, scoring: ScoringEngine, selection: SelectionEngine) -> Self {
        Self {
            store,
            pool,
            scoring,
            selection,
            reference_month: None,
        }
    }

    /// Pin "now" for recency decay instead of reading the clock.
    pub fn with_reference_month(mut self, month: LaunchPeriod) -> Self {
        self.reference_month = Some(month);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn now(&self) -> LaunchPeriod {
        self.reference_month.unwrap_or_else(LaunchPeriod::current)
    }

    /// Process one message for a session.
    ///
    /// Unparsable answers are not errors; the same question comes back. The
    /// only error is a failing candidate source, in which case the session
    /// is left exactly as it was.
    pub fn handle(&self, session_id: &str, text: &str) -> Result<Turn, TvPickError> {
        self.store
            .with_session(session_id, |entry| self.handle_entry(session_id, entry, text))
    }

    fn handle_entry(
        &self,
        session_id: &str,
        entry: &mut SessionEntry,
        text: &str,
    ) -> Result<Turn, TvPickError> {
        match collector::command(text) {
            Some(Command::ShowMore) => {
                let reply = match &entry.last_result {
                    Some(result) => render::long(result),
                    None => render::NOTHING_TO_SHOW.to_string(),
                };
                return Ok(Turn {
                    reply,
                    state: entry.state.clone(),
                    done: false,
                    result: entry.last_result.clone(),
                });
            }
            Some(Command::Compare) => {
                let reply = match &entry.last_result {
                    Some(result) => render::compare(result),
                    None => render::NOTHING_TO_COMPARE.to_string(),
                };
                return Ok(Turn {
                    reply,
                    state: entry.state.clone(),
                    done: false,
                    result: entry.last_result.clone(),
                });
            }
            Some(Command::Reset) => {
                entry.reset();
                info!("Session {} reset", session_id);
                return Ok(Turn {
                    reply: format!("✅ 已重置。{}", collector::first_prompt()),
                    state: entry.state.clone(),
                    done: false,
                    result: None,
                });
            }
            None => {}
        }

        // Work on a copy so a failing fetch leaves the session untouched.
        let mut state = entry.state.clone();
        match collector::apply(&mut state, text) {
            Advance::Next(prompt) | Advance::Retry(prompt) => {
                entry.state = state.clone();
                Ok(Turn {
                    reply: prompt.to_string(),
                    state,
                    done: false,
                    result: None,
                })
            }
            Advance::Ready(criteria) => {
                let result = self.recommend(&criteria)?;
                info!(
                    "Session {} finished a round: {} eligible, {} picks ({:?})",
                    session_id,
                    result.eligible,
                    result.all_picks().count(),
                    result.outcome
                );
                entry.last_result = Some(result.clone());
                entry.state.clear();
                Ok(Turn {
                    reply: render::short(&result),
                    state,
                    done: true,
                    result: Some(result),
                })
            }
        }
    }

    fn recommend(&self, criteria: &Criteria) -> Result<RecommendationResult, TvPickError> {
        let scene = criteria.scene.profile_key();
        let query = PoolQuery {
            size: criteria.size,
            brand: criteria.brand.pool_brand().map(str::to_string),
            budget_ceiling: Some(criteria.budget),
        };
        let pool = self
            .selection
            .eligible(self.fetch(&query)?, Some(criteria.budget), &criteria.brand);
        let scored = self.scoring.score(pool, scene, self.now())?;
        Ok(self.selection.select(
            scored,
            criteria.size,
            criteria.budget,
            scene,
            &criteria.brand,
        ))
    }

    fn fetch(&self, query: &PoolQuery) -> Result<Vec<Candidate>, TvPickError> {
        self.pool.fetch(query).map_err(|e| {
            warn!("Candidate fetch failed for {:?}: {}", query, e);
            e
        })
    }

    /// Rank a pool directly: filter, then score and sort, then keep `top` rows.
    ///
    /// Without a budget only candidates with no valid price are dropped.
    pub fn rank(&self, request: &RankRequest) -> Result<Vec<RankedCandidate>, TvPickError> {
        self.scoring.profiles().require(&request.scene)?;

        let stance = match request.brand.as_deref() {
            Some(b) if !b.trim().is_empty() => BrandStance::RestrictTo(vec![canonical_brand(b)]),
            _ => BrandStance::Unrestricted,
        };
        let query = PoolQuery {
            size: request.size,
            brand: stance.pool_brand().map(str::to_string),
            budget_ceiling: request.budget,
        };

        let selection = match request.preferred_year {
            Some(year) => self.selection.clone().with_preferred_year(year),
            None => self.selection.clone(),
        };
        let pool = selection.eligible(self.fetch(&query)?, request.budget, &stance);
        let scored = self.scoring.score(pool, &request.scene, self.now())?;

        Ok(selection
            .order(scored, request.budget, &stance)
            .iter()
            .take(request.top)
            .enumerate()
            .map(|(i, s)| RankedCandidate::new(i + 1, s))
            .collect())
    }

    /// Show the candidate pool before any scoring.
    ///
    /// Ordered with the preferred launch year first, then newest launch,
    /// then cheapest. Candidates with unknown prices are included.
    pub fn preview(
        &self,
        size: u32,
        brand: Option<&str>,
        budget: Option<u32>,
        limit: usize,
    ) -> Result<Preview, TvPickError> {
        let query = PoolQuery {
            size,
            brand: brand
                .filter(|b| !b.trim().is_empty())
                .map(canonical_brand),
            budget_ceiling: budget,
        };
        let mut candidates = self.fetch(&query)?;
        let preferred = self.selection.preferred_year();
        candidates.sort_by(|a, b| {
            let bucket = |c: &Candidate| u8::from(c.launch_year() != Some(preferred));
            bucket(a)
                .cmp(&bucket(b))
                .then_with(|| b.launch.cmp(&a.launch))
                .then_with(|| {
                    let price = |c: &Candidate| c.valid_price().unwrap_or(u32::MAX);
                    price(a).cmp(&price(b))
                })
                .then_with(|| a.model.cmp(&b.model))
        });

        let total = candidates.len();
        candidates.truncate(limit);
        Ok(Preview { total, candidates })
    }
}
