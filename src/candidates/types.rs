use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::slots::canonical_brand;

/// Reserved metric name resolved from `Candidate::price`.
pub const METRIC_PRICE: &str = "price";
/// Reserved metric name resolved from `Candidate::launch` as a month ordinal.
pub const METRIC_LAUNCH_RECENCY: &str = "launch_recency";

/// Year and month a model first went on sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LaunchPeriod {
    year: i32,
    month: u32,
}

impl LaunchPeriod {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && year > 0 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Parse `YYYY-MM`, `YYYY/MM`, `YYYY-MM-DD` or a bare `YYYY`.
    /// Anything else is treated as unknown.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }
        let mut parts = s.split(['-', '/']);
        let year: i32 = parts.next()?.trim().parse().ok()?;
        if !(1000..=9999).contains(&year) {
            return None;
        }
        let month = match parts.next() {
            Some(m) => m.trim().parse().ok()?,
            None => 1,
        };
        Self::new(year, month)
    }

    /// The current calendar month in local time.
    pub fn current() -> Self {
        let now = chrono::Local::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Months since year 0, used for range normalization and age math.
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// How many whole months `self` lies before `now` (negative if after).
    pub fn months_before(&self, now: LaunchPeriod) -> i64 {
        now.ordinal() - self.ordinal()
    }
}

impl fmt::Display for LaunchPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for LaunchPeriod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LaunchPeriod::parse(&value).ok_or_else(|| format!("invalid launch period '{}'", value))
    }
}

impl From<LaunchPeriod> for String {
    fn from(value: LaunchPeriod) -> Self {
        value.to_string()
    }
}

/// A single measured or declared metric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Number(f64),
}

impl MetricValue {
    /// Numeric view used by normalization and penalty comparisons.
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            MetricValue::Number(n) => *n,
        }
    }

    /// Boolean view; any non-zero number counts as true.
    pub fn as_bool(&self) -> bool {
        match self {
            MetricValue::Bool(b) => *b,
            MetricValue::Number(n) => *n != 0.0,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Bool(true) => write!(f, "有"),
            MetricValue::Bool(false) => write!(f, "无"),
            MetricValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// One television eligible for recommendation.
///
/// `price` keeps whatever the data source reported; only
/// [`Candidate::valid_price`] should be used for filtering and scoring so
/// that zero or negative prices behave exactly like a missing price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub brand: String,
    pub model: String,
    pub size_inch: u32,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub launch: Option<LaunchPeriod>,
    /// Open metric bag. `None` marks a metric known to be unmeasured.
    #[serde(default)]
    pub metrics: BTreeMap<String, Option<MetricValue>>,
}

impl Candidate {
    pub fn new(brand: impl Into<String>, model: impl Into<String>, size_inch: u32) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            size_inch,
            price: None,
            launch: None,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_price(mut self, price: i64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_launch(mut self, launch: &str) -> Self {
        self.launch = LaunchPeriod::parse(launch);
        self
    }

    pub fn with_metric(mut self, name: &str, value: MetricValue) -> Self {
        self.metrics.insert(name.to_string(), Some(value));
        self
    }

    /// Price usable for filtering; non-positive prices count as unknown.
    pub fn valid_price(&self) -> Option<u32> {
        self.price
            .filter(|p| *p > 0)
            .and_then(|p| u32::try_from(p).ok())
    }

    pub fn launch_year(&self) -> Option<i32> {
        self.launch.map(|l| l.year())
    }

    /// Look up a metric, resolving the reserved derived names.
    pub fn metric(&self, name: &str) -> Option<MetricValue> {
        match name {
            METRIC_PRICE => self.valid_price().map(|p| MetricValue::Number(p as f64)),
            METRIC_LAUNCH_RECENCY => self.launch.map(|l| MetricValue::Number(l.ordinal() as f64)),
            _ => self.metrics.get(name).copied().flatten(),
        }
    }

    /// Product identity for distinct-model checks: canonical brand plus
    /// normalized model name. Size variants share a key.
    pub fn model_key(&self) -> ModelKey {
        ModelKey::new(&self.brand, &self.model)
    }
}

/// Brand-scoped model identity. Two brands may reuse a model string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelKey {
    pub brand: String,
    pub model: String,
}

impl ModelKey {
    pub fn new(brand: &str, model: &str) -> Self {
        Self {
            brand: canonical_brand(brand),
            model: model.trim().to_lowercase(),
        }
    }
}
