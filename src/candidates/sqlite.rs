use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{debug, info, warn};

use crate::error::TvPickError;
use crate::slots::canonical_brand;

use super::pool::{CandidatePool, PoolQuery, DEFAULT_SIZE_WINDOW};
use super::types::{Candidate, LaunchPeriod, MetricValue};

/// Default cap on rows read per query.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 800;

/// SQLite-backed candidate source.
///
/// All operations are synchronous (rusqlite is blocking). The connection
/// sits behind a mutex so the pool can be shared between sessions.
pub struct SqlitePool {
    conn: Mutex<Connection>,
    size_window: u32,
    limit: usize,
}

impl SqlitePool {
    /// Open or create the candidate database at the given path.
    /// Creates the `tv` table and its size index if they don't exist.
    pub fn open(db_path: &Path) -> Result<Self, TvPickError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TvPickError::Storage(format!("Failed to create data dir: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path).map_err(|e| {
            TvPickError::Storage(format!(
                "Failed to open candidate database at {:?}: {}",
                db_path, e
            ))
        })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tv (
                brand TEXT NOT NULL,
                model TEXT NOT NULL,
                size_inch INTEGER NOT NULL,
                price INTEGER,
                launch_date TEXT,
                metrics_json TEXT NOT NULL DEFAULT '{}',
                updated_at TEXT NOT NULL,
                PRIMARY KEY (brand, model, size_inch)
            );
            CREATE INDEX IF NOT EXISTS idx_tv_size ON tv(size_inch);",
        )
        .map_err(|e| TvPickError::Storage(format!("Failed to create tv table: {}", e)))?;

        info!("Opened candidate database at {:?}", db_path);
        Ok(Self {
            conn: Mutex::new(conn),
            size_window: DEFAULT_SIZE_WINDOW,
            limit: DEFAULT_CANDIDATE_LIMIT,
        })
    }

    pub fn with_size_window(mut self, window: u32) -> Self {
        self.size_window = window;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert or replace candidates keyed by (brand, model, size).
    /// Returns the number of rows written.
    pub fn upsert(&self, candidates: &[Candidate]) -> Result<usize, TvPickError> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .map_err(|e| TvPickError::Storage(format!("Failed to begin transaction: {}", e)))?;
        let now = Utc::now().to_rfc3339();
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO tv
                     (brand, model, size_inch, price, launch_date, metrics_json, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(|e| TvPickError::Storage(format!("Failed to prepare insert: {}", e)))?;

            for c in candidates {
                let metrics_json = serde_json::to_string(&c.metrics).map_err(|e| {
                    TvPickError::Storage(format!("Failed to serialize metrics for {}: {}", c.model, e))
                })?;
                stmt.execute(params![
                    c.brand,
                    c.model,
                    c.size_inch,
                    c.price,
                    c.launch.map(|l| l.to_string()),
                    metrics_json,
                    now,
                ])
                .map_err(|e| {
                    TvPickError::Storage(format!("Failed to store {} {}: {}", c.brand, c.model, e))
                })?;
            }
        }
        tx.commit()
            .map_err(|e| TvPickError::Storage(format!("Failed to commit candidates: {}", e)))?;

        info!("Stored {} candidates", candidates.len());
        Ok(candidates.len())
    }

    pub fn count(&self) -> Result<usize, TvPickError> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM tv", [], |row| row.get(0))
            .map_err(|e| TvPickError::Storage(format!("Failed to count candidates: {}", e)))?;
        Ok(count as usize)
    }
}

impl CandidatePool for SqlitePool {
    fn fetch(&self, query: &PoolQuery) -> Result<Vec<Candidate>, TvPickError> {
        let lo = query.size.saturating_sub(self.size_window);
        let hi = query.size.saturating_add(self.size_window);
        let brand = query.brand.as_deref().map(canonical_brand);

        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT brand, model, size_inch, price, launch_date, metrics_json
                 FROM tv
                 WHERE size_inch BETWEEN ?1 AND ?2
                   AND (?3 IS NULL OR price IS NULL OR price <= 0 OR price <= ?3)
                 ORDER BY launch_date DESC, brand, model, size_inch",
            )
            .map_err(|e| TvPickError::Adapter(format!("Failed to prepare candidate query: {}", e)))?;

        let rows = stmt
            .query_map(params![lo, hi, query.budget_ceiling], |row| {
                Ok(RawRow {
                    brand: row.get(0)?,
                    model: row.get(1)?,
                    size_inch: row.get(2)?,
                    price: row.get(3)?,
                    launch_date: row.get(4)?,
                    metrics_json: row.get(5)?,
                })
            })
            .map_err(|e| TvPickError::Adapter(format!("Candidate query failed: {}", e)))?;

        // Newest launches first, so a limit cut drops the oldest rows.
        let mut out = Vec::new();
        let mut truncated = false;
        for row in rows {
            let row = row
                .map_err(|e| TvPickError::Adapter(format!("Failed to read candidate row: {}", e)))?;
            if let Some(b) = brand.as_deref() {
                if canonical_brand(&row.brand) != b {
                    continue;
                }
            }
            if out.len() >= self.limit {
                truncated = true;
                break;
            }
            out.push(row.into_candidate());
        }

        if truncated {
            warn!(
                "Candidate limit {} reached for size {}±{}; older launches were dropped",
                self.limit, query.size, self.size_window
            );
        }

        debug!(
            "Fetched {} candidates for size {}±{} brand {:?} budget {:?}",
            out.len(),
            query.size,
            self.size_window,
            brand,
            query.budget_ceiling
        );
        Ok(out)
    }
}

struct RawRow {
    brand: String,
    model: String,
    size_inch: u32,
    price: Option<i64>,
    launch_date: Option<String>,
    metrics_json: String,
}

impl RawRow {
    fn into_candidate(self) -> Candidate {
        let metrics: BTreeMap<String, Option<MetricValue>> =
            match serde_json::from_str(&self.metrics_json) {
                Ok(m) => m,
                Err(e) => {
                    warn!(
                        "Ignoring unreadable metrics for {} {}: {}",
                        self.brand, self.model, e
                    );
                    BTreeMap::new()
                }
            };
        Candidate {
            launch: self.launch_date.as_deref().and_then(LaunchPeriod::parse),
            brand: self.brand,
            model: self.model,
            size_inch: self.size_inch,
            price: self.price,
            metrics,
        }
    }
}
