//! Slot parsing: free text to typed conversational slots.
//!
//! Four slots are collected per round: screen size, budget ceiling, scene
//! and brand stance. Parsers are pure and return [`Parsed::Unparsed`]
//! rather than failing, so the collector can re-ask the same question.

pub mod brand;
mod parsers;
mod types;

pub use brand::{canonical_brand, display_brand, is_known_brand};
pub use parsers::{
    parse_brand_stance, parse_budget, parse_message, parse_scene, parse_size, SIZE_RANGE,
};
pub use types::*;
