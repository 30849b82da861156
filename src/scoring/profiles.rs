//! TOML loading for scene score profiles.
//!
//! Provides two loading methods:
//! - `default_profiles()` - Loads the profiles compiled into the binary
//! - `load_profiles(path)` - Loads a custom profile file and validates it

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::error::TvPickError;

use super::types::{PenaltyCondition, ProfileSet, ScoreProfile};

/// Default profiles embedded in the binary at compile time.
/// These are loaded from `config/score_profiles.toml`.
const DEFAULT_PROFILES: &str = include_str!("../../config/score_profiles.toml");

/// Load and validate profiles from a TOML file at the given path.
///
/// # Example
/// ```ignore
/// let profiles = load_profiles(Path::new("/path/to/profiles.toml"))?;
/// ```
pub fn load_profiles(path: &Path) -> Result<ProfileSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile file {:?}", path))?;
    let set: ProfileSet = toml::from_str(&content)
        .with_context(|| format!("Invalid profile TOML in {:?}", path))?;
    set.validate()?;
    info!("Loaded {} score profiles from {:?}", set.profiles.len(), path);
    Ok(set)
}

/// Get the default profiles embedded in the binary.
///
/// Covers the four conversation scenes (`ps5`, `movie`, `bright`, `sport`)
/// plus `newest`, which ranks by launch period alone.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a compile-time bug).
pub fn default_profiles() -> ProfileSet {
    toml::from_str(DEFAULT_PROFILES).expect("embedded score_profiles.toml must be valid TOML")
}

impl ProfileSet {
    pub fn get(&self, scene: &str) -> Option<&ScoreProfile> {
        self.profiles.get(scene)
    }

    /// Look up a profile, failing with `UnknownScene` if it is not loaded.
    pub fn require(&self, scene: &str) -> Result<&ScoreProfile, TvPickError> {
        self.get(scene)
            .ok_or_else(|| TvPickError::UnknownScene(scene.to_string()))
    }

    /// Reject weights or multipliers that would make scores meaningless.
    pub fn validate(&self) -> Result<(), TvPickError> {
        if self.profiles.is_empty() {
            return Err(TvPickError::Profile("no profiles defined".to_string()));
        }
        for (scene, profile) in &self.profiles {
            for (metric, weight) in &profile.weights {
                if !weight.is_finite() || *weight < 0.0 {
                    return Err(TvPickError::Profile(format!(
                        "{}: weight for '{}' must be a non-negative number, got {}",
                        scene, metric, weight
                    )));
                }
            }
            for rule in &profile.penalties {
                if !rule.multiplier.is_finite() || rule.multiplier < 0.0 {
                    return Err(TvPickError::Profile(format!(
                        "{}: penalty multiplier on '{}' must be a non-negative number, got {}",
                        scene, rule.metric, rule.multiplier
                    )));
                }
                if let PenaltyCondition::Compare { threshold, .. } = rule.condition {
                    if !threshold.is_finite() {
                        return Err(TvPickError::Profile(format!(
                            "{}: penalty threshold on '{}' must be finite",
                            scene, rule.metric
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::Scene;
    use std::io::Write;

    #[test]
    fn test_default_profiles_load_and_validate() {
        let set = default_profiles();
        set.validate().unwrap();
        for scene in Scene::ALL {
            assert!(
                set.get(scene.profile_key()).is_some(),
                "Missing profile for {}",
                scene
            );
        }
        assert!(set.get("newest").is_some());
    }

    #[test]
    fn test_newest_profile_only_weights_launch() {
        let set = default_profiles();
        let newest = set.get("newest").unwrap();
        assert_eq!(newest.weights.len(), 1);
        assert!(newest.weights.contains_key("launch_recency"));
    }

    #[test]
    fn test_require_unknown_scene() {
        let err = default_profiles().require("karaoke").unwrap_err();
        assert!(matches!(err, TvPickError::UnknownScene(s) if s == "karaoke"));
    }

    #[test]
    fn test_load_profiles_rejects_negative_weight() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[profiles.custom]\n[profiles.custom.weights]\npeak_brightness_nits = -1.0"
        )
        .unwrap();
        let err = load_profiles(file.path()).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_load_profiles_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[profiles.custom]
description = "test"
inverted = ["price"]

[profiles.custom.weights]
price = 1.0

[[profiles.custom.penalties]]
metric = "price"
op = ">"
value = 10000.0
multiplier = 0.5
"#
        )
        .unwrap();
        let set = load_profiles(file.path()).unwrap();
        let custom = set.get("custom").unwrap();
        assert!(custom.inverted.contains("price"));
        assert_eq!(custom.penalties.len(), 1);
    }
}
