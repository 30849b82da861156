use std::fmt;

use serde::{Deserialize, Serialize};

use super::brand::{canonical_brand, display_brand};

/// Result of running a slot parser over free text.
///
/// `Unparsed` is an ordinary outcome, not an error: the collector simply asks
/// the same question again.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Value(T),
    Unparsed,
}

impl<T> Parsed<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Parsed::Value(v) => Some(v),
            Parsed::Unparsed => None,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, Parsed::Unparsed)
    }
}

impl<T> From<Option<T>> for Parsed<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Parsed::Value(v),
            None => Parsed::Unparsed,
        }
    }
}

/// Slots found in one free-form message.
///
/// Only values with an explicit marker land here (a size unit, a budget
/// keyword, a scene word, a brand verb), so a bare number is never guessed
/// into the wrong slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotHints {
    pub size: Option<u32>,
    pub budget: Option<u32>,
    pub scene: Option<Scene>,
    pub brand: Option<BrandStance>,
}

impl SlotHints {
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.budget.is_none() && self.scene.is_none() && self.brand.is_none()
    }
}

/// Usage context that selects a score profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scene {
    Movie,
    Ps5,
    Bright,
    Sport,
}

impl Scene {
    pub const ALL: [Scene; 4] = [Scene::Movie, Scene::Ps5, Scene::Bright, Scene::Sport];

    /// Key of the score profile for this scene.
    pub fn profile_key(&self) -> &'static str {
        match self {
            Scene::Movie => "movie",
            Scene::Ps5 => "ps5",
            Scene::Bright => "bright",
            Scene::Sport => "sport",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scene::Movie => "电影观影（暗场优先）：分区控光/对比 > 亮度 > 反射/均匀性 > 价格",
            Scene::Ps5 => "PS5 游戏：输入延迟（越低越好）> HDMI2.1/ALLM/VRR > 亮度/分区",
            Scene::Bright => "明亮客厅（白天观看优先）：亮度/抗反射 > 价格 > 分区控光 > 色域",
            Scene::Sport => "体育赛事：运动清晰度/刷新率 > 亮度 > 可视角度 > 价格",
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile_key())
    }
}

/// The user's attitude toward brands.
///
/// Brand lists hold canonical keys (see [`canonical_brand`]).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "brands", rename_all = "snake_case")]
pub enum BrandStance {
    #[default]
    Unrestricted,
    RestrictTo(Vec<String>),
    Exclude(Vec<String>),
}

impl BrandStance {
    /// Whether a candidate brand survives this stance.
    pub fn allows(&self, brand: &str) -> bool {
        let key = canonical_brand(brand);
        match self {
            BrandStance::Unrestricted => true,
            BrandStance::RestrictTo(brands) => brands.iter().any(|b| *b == key),
            BrandStance::Exclude(brands) => !brands.iter().any(|b| *b == key),
        }
    }

    /// Brand to push down to the candidate source. Only a single required
    /// brand can be expressed there; everything else is filtered in the core.
    pub fn pool_brand(&self) -> Option<&str> {
        match self {
            BrandStance::RestrictTo(brands) if brands.len() == 1 => Some(brands[0].as_str()),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        let join = |brands: &[String]| {
            brands
                .iter()
                .map(|b| display_brand(b))
                .collect::<Vec<_>>()
                .join(" / ")
        };
        match self {
            BrandStance::Unrestricted => "无所谓".to_string(),
            BrandStance::RestrictTo(brands) => format!("只要 {}", join(brands)),
            BrandStance::Exclude(brands) => format!("排除 {}", join(brands)),
        }
    }
}
