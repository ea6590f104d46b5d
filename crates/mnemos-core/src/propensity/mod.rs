//! Propensity Ledger
//!
//! Append-only event log of served results, one JSON object per line.
//! The engine writes propensity 0 at serve time; actual inverse-propensity
//! correction runs offline by scanning the log, where a note's propensity
//! is its appearance share floored at epsilon.
//!
//! The stream is monotonic and never compacted by the engine.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::search::{FusedNote, QueryIntent};

// ============================================================================
// EVENTS
// ============================================================================

/// One served result inside an access event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServedEntry {
    pub title: String,
    /// Zero-based position in the served list
    pub rank: usize,
    /// Fused score at serve time
    pub score: f64,
    /// Written as 0 at serve time; computed post-hoc from the log
    pub propensity: f64,
    /// Whether the entry was exploration-injected
    pub exploration: bool,
}

/// One append-only access event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEvent {
    /// Event identifier
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// The raw query text
    pub query: String,
    /// Classified intent at serve time
    pub intent: QueryIntent,
    /// The served list, in rank order
    pub results: Vec<ServedEntry>,
}

impl AccessEvent {
    /// Record a served list
    pub fn from_served(query: &str, intent: QueryIntent, served: &[FusedNote]) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            query: query.to_string(),
            intent,
            results: served
                .iter()
                .enumerate()
                .map(|(rank, note)| ServedEntry {
                    title: note.title.clone(),
                    rank,
                    score: note.score,
                    propensity: 0.0,
                    exploration: note.exploration,
                })
                .collect(),
        }
    }
}

// ============================================================================
// ACCESS LOG
// ============================================================================

/// The append-only JSONL event log
#[derive(Debug, Clone)]
pub struct AccessLog {
    path: PathBuf,
}

impl AccessLog {
    /// Create a handle over a log path; nothing is touched until append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a JSON line
    pub fn append(&self, event: &AccessEvent) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read every event; malformed lines are skipped with a warning
    pub fn read_all(&self) -> std::io::Result<Vec<AccessEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut events = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AccessEvent>(&line) {
                Ok(event) => events.push(event),
                Err(error) => {
                    tracing::warn!(line = number + 1, %error, "skipping malformed access log line");
                }
            }
        }
        Ok(events)
    }
}

// ============================================================================
// PROPENSITIES
// ============================================================================

/// Appearance-share propensities computed from the log
#[derive(Debug, Clone)]
pub struct Propensities {
    shares: HashMap<String, f64>,
    epsilon: f64,
    total_events: usize,
}

impl Propensities {
    /// Scan the log: appearances divided by total events, floored at epsilon
    pub fn from_log(log: &AccessLog, epsilon: f64) -> std::io::Result<Self> {
        let events = log.read_all()?;
        Ok(Self::from_events(&events, epsilon))
    }

    /// Compute propensities from already-loaded events
    pub fn from_events(events: &[AccessEvent], epsilon: f64) -> Self {
        let mut appearances: HashMap<String, usize> = HashMap::new();
        for event in events {
            for entry in &event.results {
                *appearances.entry(entry.title.clone()).or_default() += 1;
            }
        }

        let total = events.len();
        let shares = appearances
            .into_iter()
            .map(|(title, count)| (title, count as f64 / total.max(1) as f64))
            .collect();

        Self {
            shares,
            epsilon,
            total_events: total,
        }
    }

    /// Propensity for a title, never below epsilon
    pub fn get(&self, title: &str) -> f64 {
        self.shares.get(title).copied().unwrap_or(0.0).max(self.epsilon)
    }

    /// Number of events scanned
    pub fn total_events(&self) -> usize {
        self.total_events
    }
}

// ============================================================================
// TESTS
// ============================================================================
