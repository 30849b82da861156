//! Runtime settings.
//!
//! Resolution order: built-in defaults, then the TOML file (explicit path,
//! else `<data_dir>/tvpick/settings.toml` when it exists), then environment
//! overrides (`TVPICK_DB`, `TVPICK_PREFERRED_YEAR`, `TVPICK_SESSION_TTL_SECS`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::candidates::{SqlitePool, DEFAULT_CANDIDATE_LIMIT, DEFAULT_SIZE_WINDOW};
use crate::error::TvPickError;
use crate::scoring::{
    default_profiles, load_profiles, ScoringEngine, DEFAULT_RECENCY_DECAY, DEFAULT_RECENCY_MONTHS,
};
use crate::selection::{SelectionEngine, DEFAULT_MID_PRICE_RATIO};
use crate::session::{DEFAULT_SESSION_TTL, DEFAULT_SWEEP_INTERVAL};

const APP_DIR: &str = "tvpick";
const SETTINGS_FILE: &str = "settings.toml";
const DB_FILE: &str = "tv.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Candidate database; defaults to `<data_dir>/tvpick/tv.db`
    pub db_path: Option<PathBuf>,
    /// Custom score profiles; the embedded set is used when unset
    pub profiles_path: Option<PathBuf>,
    pub preferred_year: i32,
    pub size_window: u32,
    pub candidate_limit: usize,
    pub mid_price_ratio: f64,
    pub recency_decay: f64,
    pub recency_months: i64,
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: None,
            profiles_path: None,
            preferred_year: 2026,
            size_window: DEFAULT_SIZE_WINDOW,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            mid_price_ratio: DEFAULT_MID_PRICE_RATIO,
            recency_decay: DEFAULT_RECENCY_DECAY,
            recency_months: DEFAULT_RECENCY_MONTHS,
            session_ttl_secs: DEFAULT_SESSION_TTL.as_secs(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL.as_secs(),
        }
    }
}

/// `<data_dir>/tvpick`, if the platform has a data directory.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR))
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    /// A missing default file is not an error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => match data_dir().map(|d| d.join(SETTINGS_FILE)) {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => {
                    debug!("No settings file found, using defaults");
                    Self::default()
                }
            },
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Invalid settings TOML in {:?}", path))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Apply environment overrides through `lookup` so tests need not touch
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup("TVPICK_DB").filter(|v| !v.trim().is_empty()) {
            self.db_path = Some(PathBuf::from(db));
        }
        if let Some(raw) = lookup("TVPICK_PREFERRED_YEAR") {
            match raw.trim().parse::<i32>() {
                Ok(year) => self.preferred_year = year,
                Err(_) => warn!("Ignoring invalid TVPICK_PREFERRED_YEAR={:?}", raw),
            }
        }
        if let Some(raw) = lookup("TVPICK_SESSION_TTL_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.session_ttl_secs = secs,
                _ => warn!("Ignoring invalid TVPICK_SESSION_TTL_SECS={:?}", raw),
            }
        }
    }

    pub fn validate(&self) -> Result<(), TvPickError> {
        if !(0.0..=1.0).contains(&self.mid_price_ratio) {
            return Err(TvPickError::Config(format!(
                "mid_price_ratio must be within [0, 1], got {}",
                self.mid_price_ratio
            )));
        }
        if !self.recency_decay.is_finite() || self.recency_decay < 0.0 {
            return Err(TvPickError::Config(format!(
                "recency_decay must be a non-negative number, got {}",
                self.recency_decay
            )));
        }
        if self.candidate_limit == 0 {
            return Err(TvPickError::Config(
                "candidate_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Candidate database path, falling back to the data directory.
    pub fn resolved_db_path(&self) -> Result<PathBuf, TvPickError> {
        match &self.db_path {
            Some(p) => Ok(p.clone()),
            None => data_dir().map(|d| d.join(DB_FILE)).ok_or_else(|| {
                TvPickError::Config(
                    "No data directory on this platform; set db_path or TVPICK_DB".to_string(),
                )
            }),
        }
    }

    /// Scoring engine with the configured profiles and decay policy.
    pub fn scoring_engine(&self) -> Result<ScoringEngine> {
        let profiles = match &self.profiles_path {
            Some(p) => load_profiles(p)?,
            None => default_profiles(),
        };
        Ok(ScoringEngine::new(profiles).with_recency(self.recency_months, self.recency_decay))
    }

    pub fn selection_engine(&self) -> SelectionEngine {
        SelectionEngine::new(self.preferred_year).with_mid_price_ratio(self.mid_price_ratio)
    }

    /// Open the SQLite candidate pool with the configured window and limit.
    pub fn open_pool(&self) -> Result<SqlitePool, TvPickError> {
        let path = self.resolved_db_path()?;
        Ok(SqlitePool::open(&path)?
            .with_size_window(self.size_window)
            .with_limit(self.candidate_limit))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}
