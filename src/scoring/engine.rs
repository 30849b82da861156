//! Profile-driven scoring.
//!
//! Every metric a profile weights is normalized over the candidate list
//! being scored, so the same candidate can score differently against a
//! different pool. Scores are deterministic for a given list and "now".

use std::collections::BTreeMap;

use tracing::debug;

use crate::candidates::{Candidate, LaunchPeriod};
use crate::error::TvPickError;

use super::types::*;

/// Launches older than this many months are decayed.
pub const DEFAULT_RECENCY_MONTHS: i64 = 12;
/// Multiplier applied to stale launches.
pub const DEFAULT_RECENCY_DECAY: f64 = 0.92;

/// The scoring engine.
///
/// Holds the loaded profiles and the recency-decay policy. Immutable once
/// built, so one engine can be shared by every session.
pub struct ScoringEngine {
    profiles: ProfileSet,
    recency_months: i64,
    recency_decay: f64,
}

/// Observed range of one metric over a candidate list.
#[derive(Debug, Clone, Copy)]
struct Range {
    lo: f64,
    hi: f64,
}

impl ScoringEngine {
    /// Create an engine with the given profiles and the default decay policy.
    pub fn new(profiles: ProfileSet) -> Self {
        Self {
            profiles,
            recency_months: DEFAULT_RECENCY_MONTHS,
            recency_decay: DEFAULT_RECENCY_DECAY,
        }
    }

    pub fn with_recency(mut self, months: i64, decay: f64) -> Self {
        self.recency_months = months;
        self.recency_decay = decay;
        self
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    /// Score candidates against the profile for `scene`.
    ///
    /// # Arguments
    /// * `candidates` - Pool to score; nothing is dropped
    /// * `scene` - Profile key, e.g. `"ps5"` or `"newest"`
    /// * `now` - Reference month for recency decay
    pub fn score(
        &self,
        candidates: Vec<Candidate>,
        scene: &str,
        now: LaunchPeriod,
    ) -> Result<Vec<ScoredCandidate>, TvPickError> {
        let profile = self.profiles.require(scene)?;
        let scored = self.score_with(candidates, profile, now);
        debug!("Scored {} candidates for scene {}", scored.len(), scene);
        Ok(scored)
    }

    /// Score candidates against an explicit profile.
    pub fn score_with(
        &self,
        candidates: Vec<Candidate>,
        profile: &ScoreProfile,
        now: LaunchPeriod,
    ) -> Vec<ScoredCandidate> {
        let ranges = metric_ranges(&candidates, profile);

        candidates
            .into_iter()
            .map(|candidate| {
                let mut contributions = BTreeMap::new();
                let mut base = 0.0;

                for (metric, weight) in &profile.weights {
                    let n = normalized(&candidate, metric, profile, ranges.get(metric.as_str()));
                    let part = n * weight;
                    contributions.insert(metric.clone(), part);
                    base += part;
                }

                let mut score = base;
                let mut adjustments = Vec::new();

                for rule in &profile.penalties {
                    if penalty_fires(&candidate, rule) {
                        score *= rule.multiplier;
                        adjustments.push(rule.to_string());
                    }
                }

                if let Some(launch) = candidate.launch {
                    if launch.months_before(now) > self.recency_months {
                        score *= self.recency_decay;
                        adjustments.push(format!(
                            "上市超过{}个月 ×{}",
                            self.recency_months, self.recency_decay
                        ));
                    }
                }

                ScoredCandidate {
                    candidate,
                    score,
                    contributions,
                    adjustments,
                }
            })
            .collect()
    }
}

/// Min/max of every non-boolean weighted metric, ignoring absent values.
/// A metric with no values at all gets the range [0, 1].
fn metric_ranges<'a>(
    candidates: &[Candidate],
    profile: &'a ScoreProfile,
) -> BTreeMap<&'a str, Range> {
    profile
        .weights
        .keys()
        .filter(|m| !profile.boolean.contains(*m))
        .map(|metric| {
            let mut values = candidates
                .iter()
                .filter_map(|c| c.metric(metric))
                .map(|v| v.as_f64())
                .filter(|v| v.is_finite());

            let range = match values.next() {
                Some(first) => values.fold(Range { lo: first, hi: first }, |r, v| Range {
                    lo: r.lo.min(v),
                    hi: r.hi.max(v),
                }),
                None => Range { lo: 0.0, hi: 1.0 },
            };
            (metric.as_str(), range)
        })
        .collect()
}

/// Normalized value in [0, 1]. Absent metrics contribute 0.
fn normalized(
    candidate: &Candidate,
    metric: &str,
    profile: &ScoreProfile,
    range: Option<&Range>,
) -> f64 {
    let Some(value) = candidate.metric(metric) else {
        return 0.0;
    };

    if profile.boolean.contains(metric) {
        return if value.as_bool() { 1.0 } else { 0.0 };
    }

    let x = value.as_f64();
    let Some(range) = range else {
        return 0.0;
    };
    if !x.is_finite() {
        return 0.0;
    }
    if range.hi <= range.lo {
        // every present value is equal
        return 1.0;
    }

    let n = ((x - range.lo) / (range.hi - range.lo)).clamp(0.0, 1.0);
    if profile.inverted.contains(metric) {
        1.0 - n
    } else {
        n
    }
}

fn penalty_fires(candidate: &Candidate, rule: &PenaltyRule) -> bool {
    let value = candidate.metric(&rule.metric);
    match rule.condition {
        PenaltyCondition::IsAbsent => value.is_none(),
        PenaltyCondition::IsPresent => value.is_some(),
        PenaltyCondition::Compare { op, threshold } => {
            value.is_some_and(|v| op.holds(v.as_f64(), threshold))
        }
    }
}
