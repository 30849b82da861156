//! Scene scoring for TV candidates.
//!
//! A TOML-driven profile per scene turns a candidate list into scored
//! candidates: per-metric min/max normalization, weighted sum, ordered
//! penalty multipliers, then recency decay.
//!
//! # Example
//!
//! ```ignore
//! use tvpick::candidates::{Candidate, LaunchPeriod};
//! use tvpick::scoring::{default_profiles, ScoringEngine};
//!
//! let engine = ScoringEngine::new(default_profiles());
//! let pool = vec![Candidate::new("TCL", "Q10M", 75).with_price(8999)];
//! let scored = engine.score(pool, "ps5", LaunchPeriod::current())?;
//! ```

mod engine;
mod profiles;
mod types;

pub use engine::{ScoringEngine, DEFAULT_RECENCY_DECAY, DEFAULT_RECENCY_MONTHS};
pub use profiles::{default_profiles, load_profiles};
pub use types::*;
