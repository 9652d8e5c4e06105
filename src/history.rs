//! Per-instrument signal history: a depth-1 last-observation cache.
//!
//! The tracker owns the only durable state in the system. Each cycle it
//! diffs the fresh measurement against the stored record, emits escalation
//! lines for unfavorable moves, then overwrites the record and persists the
//! whole mapping. Nothing else reads or writes the store.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::logging::{json_log, log, obj, v_str, Level};

pub type SignalHistory = HashMap<String, HistoryRecord>;

/// Point-in-time snapshot of one instrument's signal components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub score: f64,
    pub rsi: Option<f64>,
    pub funding_pct: f64,
    pub wall_ratio: f64,
    pub observed_at: i64,
}

/// Fresh measurement produced by one scan of one instrument.
#[derive(Debug, Clone)]
pub struct SignalMeasurement {
    pub inst_id: String,
    pub score: f64,
    pub rsi: Option<f64>,
    pub funding_pct: f64,
    pub wall_ratio: f64,
    pub observed_at: i64,
}

impl SignalMeasurement {
    fn to_record(&self) -> HistoryRecord {
        HistoryRecord {
            score: self.score,
            rsi: self.rsi,
            funding_pct: self.funding_pct,
            wall_ratio: self.wall_ratio,
            observed_at: self.observed_at,
        }
    }
}

/// Load-all / overwrite-all persistence for the history mapping.
pub trait HistoryStore: Send {
    fn load(&self) -> Result<SignalHistory>;
    fn save_all(&self, history: &SignalHistory) -> Result<()>;
}

/// The whole mapping as one JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<SignalHistory> {
        if !self.path.exists() {
            return Ok(SignalHistory::new());
        }
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save_all(&self, history: &SignalHistory) -> Result<()> {
        fs::write(&self.path, serde_json::to_vec(history)?)?;
        Ok(())
    }
}

pub struct HistoryTracker {
    store: Box<dyn HistoryStore>,
    history: SignalHistory,
    wall_weaken_factor: f64,
    funding_drop_limit: f64,
    score_drop_limit: f64,
}

impl HistoryTracker {
    /// Loads the full mapping up front. A missing or unreadable store is a
    /// first run: start from an empty mapping and say so in the log.
    pub fn open(store: Box<dyn HistoryStore>, cfg: &Config) -> Self {
        let history = match store.load() {
            Ok(history) => history,
            Err(err) => {
                log(
                    Level::Warn,
                    "history",
                    obj(&[
                        ("event", v_str("load_failed_starting_empty")),
                        ("error", v_str(&err.to_string())),
                    ]),
                );
                SignalHistory::new()
            }
        };
        json_log(
            "history",
            obj(&[
                ("event", v_str("loaded")),
                ("records", serde_json::Value::from(history.len())),
            ]),
        );
        Self {
            store,
            history,
            wall_weaken_factor: cfg.wall_weaken_factor,
            funding_drop_limit: cfg.funding_drop_limit,
            score_drop_limit: cfg.score_drop_limit,
        }
    }

    /// Diff against the prior record, replace it, persist the mapping.
    ///
    /// Checks run in a fixed order (wall, funding, score) and their lines
    /// concatenate. First observation of an instrument produces no lines.
    /// The record is replaced unconditionally so the next cycle always
    /// compares against this one.
    pub fn record_and_diff(&mut self, m: &SignalMeasurement) -> Result<Option<String>> {
        let mut lines = Vec::new();
        if let Some(old) = self.history.get(&m.inst_id) {
            if m.wall_ratio < old.wall_ratio * self.wall_weaken_factor {
                lines.push(format!(
                    "wall weakened: {:.1}x -> {:.1}x",
                    old.wall_ratio, m.wall_ratio
                ));
            }
            if m.funding_pct < old.funding_pct - self.funding_drop_limit {
                lines.push("funding turned negative / danger".to_string());
            }
            if m.score < old.score - self.score_drop_limit {
                lines.push(format!("confidence dropped: {:.1} -> {:.1}", old.score, m.score));
            }
        }
        self.history.insert(m.inst_id.clone(), m.to_record());
        self.store.save_all(&self.history)?;
        if lines.is_empty() {
            Ok(None)
        } else {
            Ok(Some(lines.join("\n")))
        }
    }

    pub fn record(&self, inst_id: &str) -> Option<&HistoryRecord> {
        self.history.get(inst_id)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
