//! Type definitions for scene score profiles.
//!
//! Profiles deserialize from TOML (see `config/score_profiles.toml`) and
//! scored output serializes to JSON for the CLI.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::candidates::Candidate;

// =============================================================================
// CONFIGURATION TYPES (loaded from TOML)
// =============================================================================

/// Root of a profile file: scene key -> profile.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSet {
    pub profiles: BTreeMap<String, ScoreProfile>,
}

/// Weights, orientation and penalties for one scene.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreProfile {
    /// Short human-readable summary shown in long-form replies
    #[serde(default)]
    pub description: String,
    /// Metric name -> non-negative weight
    pub weights: BTreeMap<String, f64>,
    /// Metrics where lower raw values are better
    #[serde(default)]
    pub inverted: BTreeSet<String>,
    /// Metrics read as true/false rather than normalized over a range
    #[serde(default)]
    pub boolean: BTreeSet<String>,
    /// Multipliers applied in order after the weighted sum
    #[serde(default)]
    pub penalties: Vec<PenaltyRule>,
}

/// A conditional multiplier on the running score.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPenalty")]
pub struct PenaltyRule {
    pub metric: String,
    pub condition: PenaltyCondition,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PenaltyCondition {
    /// Fires when the metric is present and `value <op> threshold` holds.
    Compare { op: CompareOp, threshold: f64 },
    /// Fires when the metric has no value.
    IsAbsent,
    /// Fires when the metric has a value.
    IsPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            CompareOp::Gt => value > threshold,
            CompareOp::Ge => value >= threshold,
            CompareOp::Lt => value < threshold,
            CompareOp::Le => value <= threshold,
            CompareOp::Eq => value == threshold,
            CompareOp::Ne => value != threshold,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

/// Penalty as written in TOML: `op` is a comparison symbol or
/// `is_null` / `not_null`, and `value` is required for comparisons.
#[derive(Debug, Deserialize)]
struct RawPenalty {
    metric: String,
    op: String,
    #[serde(default)]
    value: Option<f64>,
    multiplier: f64,
}

impl TryFrom<RawPenalty> for PenaltyRule {
    type Error = String;

    fn try_from(raw: RawPenalty) -> Result<Self, Self::Error> {
        let op = match raw.op.trim() {
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            "is_null" | "not_null" => None,
            other => return Err(format!("unknown penalty operator '{}'", other)),
        };

        let condition = match (op, raw.op.trim()) {
            (Some(op), _) => {
                let threshold = raw.value.ok_or_else(|| {
                    format!(
                        "penalty on '{}' with operator '{}' needs a value",
                        raw.metric, raw.op
                    )
                })?;
                PenaltyCondition::Compare { op, threshold }
            }
            (None, "is_null") => PenaltyCondition::IsAbsent,
            (None, _) => PenaltyCondition::IsPresent,
        };

        Ok(PenaltyRule {
            metric: raw.metric,
            condition,
            multiplier: raw.multiplier,
        })
    }
}

impl fmt::Display for PenaltyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.condition {
            PenaltyCondition::Compare { op, threshold } => write!(
                f,
                "{} {} {} ×{}",
                self.metric,
                op.symbol(),
                threshold,
                self.multiplier
            ),
            PenaltyCondition::IsAbsent => write!(f, "{} 缺失 ×{}", self.metric, self.multiplier),
            PenaltyCondition::IsPresent => write!(f, "{} 存在 ×{}", self.metric, self.multiplier),
        }
    }
}

// =============================================================================
// OUTPUT TYPES
// =============================================================================

/// A candidate annotated with its final score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
    /// Weighted contribution of each profile metric to the base score
    pub contributions: BTreeMap<String, f64>,
    /// Human-readable list of multipliers that fired
    pub adjustments: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_deserialize_comparison() {
        let toml_src = r#"
            metric = "input_lag_ms_60hz"
            op = ">"
            value = 20.0
            multiplier = 0.85
        "#;
        let rule: PenaltyRule = toml::from_str(toml_src).unwrap();
        assert_eq!(rule.metric, "input_lag_ms_60hz");
        assert_eq!(
            rule.condition,
            PenaltyCondition::Compare {
                op: CompareOp::Gt,
                threshold: 20.0
            }
        );
        assert_eq!(rule.multiplier, 0.85);
    }

    #[test]
    fn test_penalty_deserialize_absence() {
        let rule: PenaltyRule =
            toml::from_str("metric = \"vrr\"\nop = \"is_null\"\nmultiplier = 0.9").unwrap();
        assert_eq!(rule.condition, PenaltyCondition::IsAbsent);

        let rule: PenaltyRule =
            toml::from_str("metric = \"vrr\"\nop = \"not_null\"\nmultiplier = 1.1").unwrap();
        assert_eq!(rule.condition, PenaltyCondition::IsPresent);
    }

    #[test]
    fn test_penalty_rejects_bad_operator_or_missing_value() {
        assert!(toml::from_str::<PenaltyRule>(
            "metric = \"x\"\nop = \"~\"\nvalue = 1.0\nmultiplier = 0.5"
        )
        .is_err());
        assert!(toml::from_str::<PenaltyRule>("metric = \"x\"\nop = \"<\"\nmultiplier = 0.5").is_err());
    }

    #[test]
    fn test_compare_op_holds() {
        assert!(CompareOp::Gt.holds(3.0, 2.0));
        assert!(!CompareOp::Gt.holds(2.0, 2.0));
        assert!(CompareOp::Ge.holds(2.0, 2.0));
        assert!(CompareOp::Lt.holds(1.0, 2.0));
        assert!(CompareOp::Le.holds(2.0, 2.0));
        assert!(CompareOp::Eq.holds(1.0, 1.0));
        assert!(CompareOp::Ne.holds(1.0, 0.0));
    }
}
