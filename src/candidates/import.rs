//! JSON import for candidate data exported by the scraping pipeline.
//!
//! Records are flat objects. `brand`, `model` and `size_inch` are required;
//! the price may be called `price`, `street_rmb` or `price_cny` and may be a
//! string such as `"¥12,999"`; the launch period may be called `launch` or
//! `launch_date`. Every other key becomes a metric. A nested `metrics`
//! object is merged in as well.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::TvPickError;

use super::types::{Candidate, LaunchPeriod, MetricValue};

const PRICE_KEYS: &[&str] = &["price", "street_rmb", "price_cny"];
const LAUNCH_KEYS: &[&str] = &["launch", "launch_date"];
const SKIPPED_KEYS: &[&str] = &["id", "url", "source_url", "name", "updated_at"];

/// Read a JSON array of candidate records from disk.
pub fn load_json_file(path: &Path) -> Result<Vec<Candidate>, TvPickError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TvPickError::Import(format!("Failed to read {:?}: {}", path, e)))?;
    let candidates = parse_records(&content)?;
    info!("Loaded {} candidates from {:?}", candidates.len(), path);
    Ok(candidates)
}

/// Parse a JSON array of candidate records.
pub fn parse_records(json: &str) -> Result<Vec<Candidate>, TvPickError> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| TvPickError::Import(format!("Invalid JSON: {}", e)))?;
    let Value::Array(items) = value else {
        return Err(TvPickError::Import(
            "Expected a JSON array of candidate records".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => parse_record(map)
                .map_err(|e| TvPickError::Import(format!("Record {}: {}", i, e))),
            _ => Err(TvPickError::Import(format!("Record {} is not an object", i))),
        })
        .collect()
}

fn parse_record(mut map: Map<String, Value>) -> Result<Candidate, String> {
    let brand = take_string(&mut map, "brand").ok_or("missing brand")?;
    let model = take_string(&mut map, "model").ok_or("missing model")?;
    let size_inch = map
        .remove("size_inch")
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().trim_end_matches('寸').parse().ok(),
            _ => None,
        })
        .and_then(|v| u32::try_from(v).ok())
        .ok_or("missing or invalid size_inch")?;

    let mut price = None;
    for key in PRICE_KEYS {
        if let Some(v) = map.remove(*key) {
            if price.is_none() {
                price = parse_price(&v);
            }
        }
    }

    let mut launch = None;
    for key in LAUNCH_KEYS {
        if let Some(v) = map.remove(*key) {
            if launch.is_none() {
                launch = v.as_str().and_then(LaunchPeriod::parse);
            }
        }
    }

    let mut metrics = BTreeMap::new();
    if let Some(Value::Object(nested)) = map.remove("metrics") {
        for (k, v) in nested {
            insert_metric(&mut metrics, &model, k, v);
        }
    }
    for (k, v) in map {
        if SKIPPED_KEYS.contains(&k.as_str()) {
            continue;
        }
        insert_metric(&mut metrics, &model, k, v);
    }

    Ok(Candidate {
        brand,
        model,
        size_inch,
        price,
        launch,
        metrics,
    })
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts 12999, 12999.0, "12,999", "¥12999", "￥12999". Anything that
/// does not yield a number is an unknown price.
fn parse_price(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok().map(|f| f.round() as i64)
        }
        _ => None,
    }
}

fn insert_metric(
    metrics: &mut BTreeMap<String, Option<MetricValue>>,
    model: &str,
    key: String,
    value: Value,
) {
    let parsed = match &value {
        Value::Null => None,
        Value::Bool(b) => Some(MetricValue::Bool(*b)),
        Value::Number(n) => n.as_f64().map(MetricValue::Number),
        Value::String(s) => match parse_metric_text(s) {
            Some(v) => Some(v),
            None => {
                warn!("Skipping non-numeric metric '{}' = {:?} on {}", key, s, model);
                return;
            }
        },
        _ => {
            warn!("Skipping structured metric '{}' on {}", key, model);
            return;
        }
    };
    metrics.insert(key, parsed);
}

fn parse_metric_text(s: &str) -> Option<MetricValue> {
    let t = s.trim().to_lowercase();
    match t.as_str() {
        "true" | "yes" | "y" | "支持" | "有" | "是" => Some(MetricValue::Bool(true)),
        "false" | "no" | "n" | "不支持" | "无" | "否" => Some(MetricValue::Bool(false)),
        _ => t.parse::<f64>().ok().map(MetricValue::Number),
    }
}
