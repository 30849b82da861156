//! Free-text parsers, one per slot.
//!
//! Every parser is total: it returns a typed value or [`Parsed::Unparsed`]
//! and never panics on malformed input.

use std::sync::LazyLock;

use regex::Regex;

use super::brand::{canonical_brand, is_known_brand};
use super::types::{BrandStance, Parsed, Scene, SlotHints};

/// Accepted screen sizes in inches, inclusive.
pub const SIZE_RANGE: std::ops::RangeInclusive<u32> = 20..=120;

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\d+)\s*(英寸|寸|吋|inches|inch|in\b|")?"#).expect("valid size regex")
});

static BUDGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(k|千|w|万)?").expect("valid budget regex")
});

static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:只要|只选|只看|仅要|仅看|必须|就要)\s*(.*)$").expect("valid require regex")
});

static EXCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:排除|不要|不考虑|别给)\s*(.*)$").expect("valid exclude regex")
});

static BRAND_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9\p{Han}._\-]+$").expect("valid brand token regex")
});

static BRAND_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,/，、\s]+|和").expect("valid brand split regex"));

static MARKED_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\d{2,3})\s*(?:英寸|寸|吋|inches|inch|")"#).expect("valid marked size regex")
});

static MARKED_BUDGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:预算|budget)\s*[:：]?\s*(\d+(?:\.\d+)?\s*(?:k|千|w|万)?)|(\d+(?:\.\d+)?\s*(?:k|千|w|万)?)\s*(?:元|块)?\s*(?:以内|以下|之内|封顶)|(\d+(?:\.\d+)?\s*(?:w|万))|(\d+)\s*(?:元|块)",
    )
    .expect("valid marked budget regex")
});

static MARKED_BRAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(只要|只选|只看|仅要|仅看|排除|不要|不考虑|别给)\s*([a-z0-9.\p{Han}]+(?:\s*(?:[,/，、]|和)\s*[a-z0-9.\p{Han}]+)*)",
    )
    .expect("valid marked brand regex")
});

static THOUSANDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)[,，](\d{3})").expect("valid thousands regex"));

static TOKEN_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s,，;；。、!！?？]+").expect("valid token split regex")
});

const REQUIRE_VERBS: &[&str] = &["只要", "只选", "只看", "仅要", "仅看"];

const BRAND_NO_PREFERENCE: &[&str] = &["不限品牌", "品牌不限", "品牌无所谓", "品牌随便", "不挑品牌"];

const NO_PREFERENCE: &[&str] = &[
    "无所谓", "随便", "都行", "都可以", "不限", "不限品牌", "品牌不限", "不挑", "any", "none",
];

/// Closed alias table for scenes. The whole answer must match one entry.
const SCENE_ALIASES: &[(Scene, &[&str])] = &[
    (Scene::Movie, &["movie", "film", "电影", "观影", "看电影", "追剧"]),
    (Scene::Ps5, &["ps5", "gaming", "game", "xbox", "游戏", "打游戏", "主机"]),
    (Scene::Bright, &["bright", "白天", "客厅亮", "明亮", "采光好"]),
    (Scene::Sport, &["sport", "sports", "体育", "看球", "球赛"]),
];

/// Extract a screen size. A number followed by a unit token wins over a
/// bare number; the value must fall inside [`SIZE_RANGE`].
pub fn parse_size(text: &str) -> Parsed<u32> {
    let mut first_bare: Option<&str> = None;
    let mut with_unit: Option<&str> = None;

    for caps in SIZE_RE.captures_iter(text) {
        let Some(digits) = caps.get(1) else { continue };
        if caps.get(2).is_some() {
            with_unit = Some(digits.as_str());
            break;
        }
        if first_bare.is_none() {
            first_bare = Some(digits.as_str());
        }
    }

    with_unit
        .or(first_bare)
        .and_then(|d| d.parse::<u32>().ok())
        .filter(|v| SIZE_RANGE.contains(v))
        .into()
}

/// Extract a budget ceiling in currency units.
///
/// Handles `6000`, `13,000`, `13k`, `8K`, `1.2万`, `2w` and `3千`.
pub fn parse_budget(text: &str) -> Parsed<u32> {
    let cleaned: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ',' | '，' | '¥' | '￥'))
        .collect();
    let cleaned = cleaned.replace("rmb", "").replace('元', "").replace('块', "");

    let Some(caps) = BUDGET_RE.captures(&cleaned) else {
        return Parsed::Unparsed;
    };
    let Ok(mantissa) = caps[1].parse::<f64>() else {
        return Parsed::Unparsed;
    };
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("k") | Some("千") => 1_000.0,
        Some("w") | Some("万") => 10_000.0,
        _ => 1.0,
    };

    let value = (mantissa * multiplier).round();
    if !value.is_finite() || value <= 0.0 || value > u32::MAX as f64 {
        return Parsed::Unparsed;
    }
    Parsed::Value(value as u32)
}

/// Match the answer against the closed scene vocabulary.
pub fn parse_scene(text: &str) -> Parsed<Scene> {
    let s = text.trim().to_lowercase();
    SCENE_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&s.as_str()))
        .map(|(scene, _)| *scene)
        .into()
}

/// Parse a brand attitude: require-only, exclude, or no preference.
///
/// A single brand-like token with no verb counts as require-only.
pub fn parse_brand_stance(text: &str) -> Parsed<BrandStance> {
    let s = text
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if s.is_empty() {
        return Parsed::Unparsed;
    }

    if NO_PREFERENCE.contains(&s.as_str()) {
        return Parsed::Value(BrandStance::Unrestricted);
    }

    if let Some(caps) = REQUIRE_RE.captures(&s) {
        return brand_list(&caps[1]).map(BrandStance::RestrictTo).into();
    }

    if let Some(caps) = EXCLUDE_RE.captures(&s) {
        return brand_list(&caps[1]).map(BrandStance::Exclude).into();
    }

    if is_brand_token(&s) {
        return Parsed::Value(BrandStance::RestrictTo(vec![canonical_brand(&s)]));
    }

    Parsed::Unparsed
}

/// Pick up every clearly marked slot in one message, e.g.
/// `75寸 预算13000 打游戏`.
pub fn parse_message(text: &str) -> SlotHints {
    let lowered = THOUSANDS_RE
        .replace_all(&text.trim().to_lowercase(), "$1$2")
        .into_owned();
    if lowered.is_empty() {
        return SlotHints::default();
    }

    let size = MARKED_SIZE_RE
        .captures_iter(&lowered)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .find(|v| SIZE_RANGE.contains(v));

    let budget = MARKED_BUDGET_RE.captures(&lowered).and_then(|caps| {
        let amount = (1..=4).find_map(|i| caps.get(i))?;
        parse_budget(amount.as_str()).value()
    });

    SlotHints {
        size,
        budget,
        scene: scene_in(&lowered),
        brand: brand_in(&lowered),
    }
}

/// A scene word standing on its own, or a Chinese scene phrase anywhere.
fn scene_in(lowered: &str) -> Option<Scene> {
    for token in TOKEN_SPLIT_RE.split(lowered) {
        if let Parsed::Value(scene) = parse_scene(token) {
            return Some(scene);
        }
    }
    SCENE_ALIASES.iter().find_map(|(scene, aliases)| {
        aliases
            .iter()
            .filter(|a| !a.is_ascii())
            .any(|a| lowered.contains(*a))
            .then_some(*scene)
    })
}

/// A brand verb followed by known brands, or an explicit "any brand".
fn brand_in(lowered: &str) -> Option<BrandStance> {
    if BRAND_NO_PREFERENCE.iter().any(|p| lowered.contains(*p)) {
        return Some(BrandStance::Unrestricted);
    }
    let caps = MARKED_BRAND_RE.captures(lowered)?;
    let brands = brand_list(&caps[2])?;
    if !brands.iter().all(|b| is_known_brand(b)) {
        return None;
    }
    if REQUIRE_VERBS.contains(&&caps[1]) {
        Some(BrandStance::RestrictTo(brands))
    } else {
        Some(BrandStance::Exclude(brands))
    }
}

/// Split a brand list, canonicalize, and drop duplicates while keeping order.
/// Returns `None` if nothing brand-like remains.
fn brand_list(raw: &str) -> Option<Vec<String>> {
    let mut brands: Vec<String> = Vec::new();
    for token in BRAND_SPLIT_RE.split(raw) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if !is_brand_token(token) {
            return None;
        }
        let key = canonical_brand(token);
        if !brands.contains(&key) {
            brands.push(key);
        }
    }
    if brands.is_empty() {
        None
    } else {
        Some(brands)
    }
}

fn is_brand_token(token: &str) -> bool {
    BRAND_TOKEN_RE.is_match(token) && !token.chars().all(|c| c.is_ascii_digit() || c == '.')
}
