//! Final recommendation selection.
//!
//! Candidates are filtered (valid price within budget, brand stance) before
//! scoring, then sorted by a total ordering key and cut into three primary
//! picks plus two alternates:
//!
//! - **Top-3**: first three distinct models in order
//! - **Lowest price**: cheapest row of any model outside the Top-3
//! - **Mid price**: row closest to a fraction of the budget, from a model
//!   outside the Top-3 other than the lowest-price one
//!
//! A model is identified by canonical brand plus model name.

mod engine;
mod types;

pub use engine::{SelectionEngine, DEFAULT_MID_PRICE_RATIO, TOP_N};
pub use types::*;
