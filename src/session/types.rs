use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::selection::RecommendationResult;
use crate::slots::{BrandStance, Scene};

/// Slots collected so far in the current round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub size: Option<u32>,
    pub budget: Option<u32>,
    pub scene: Option<Scene>,
    pub brand: BrandStance,
    /// `Unrestricted` is both the default and a valid answer, so the brand
    /// question needs its own flag.
    pub brand_answered: bool,
}

impl SessionState {
    pub fn is_complete(&self) -> bool {
        self.size.is_some() && self.budget.is_some() && self.scene.is_some() && self.brand_answered
    }

    pub fn clear(&mut self) {
        *self = SessionState::default();
    }
}

/// Everything kept for one session id.
#[derive(Debug)]
pub struct SessionEntry {
    pub state: SessionState,
    /// Last completed result, replayed by "show more".
    pub last_result: Option<RecommendationResult>,
    last_seen: Instant,
    evicted: bool,
}

impl SessionEntry {
    pub fn new() -> Self {
        Self {
            state: SessionState::default(),
            last_result: None,
            last_seen: Instant::now(),
            evicted: false,
        }
    }

    /// Clear both the slots and the cached result.
    pub fn reset(&mut self) {
        self.state.clear();
        self.last_result = None;
    }

    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_seen) > ttl
    }

    pub(super) fn touch(&mut self, now: Instant) {
        self.last_seen = now;
    }

    pub(super) fn is_evicted(&self) -> bool {
        self.evicted
    }

    pub(super) fn mark_evicted(&mut self) {
        self.evicted = true;
    }
}

impl Default for SessionEntry {
    fn default() -> Self {
        Self::new()
    }
}
