//! High score leaderboard system
//!
//! Keeps every record that can still appear in a top-10 view (by score, or by
//! completion time for finished runs), plus the placeholder-name and
//! origin-suffix rules the leaderboard display depends on.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::PLACEHOLDER_NAMES;
use crate::persistence::StoreError;

/// Maximum number of entries in a leaderboard view
pub const MAX_HIGH_SCORES: usize = 10;

/// How a leaderboard view is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortKey {
    /// Highest score first
    #[default]
    Score,
    /// Fastest completed run first
    Time,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Score => "score",
            SortKey::Time => "time",
        }
    }

}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "score" => Ok(SortKey::Score),
            "time" => Ok(SortKey::Time),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// A single submitted run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Insertion order, breaks ties
    pub id: u64,
    pub player_name: String,
    pub score: u64,
    /// Run length in whole seconds
    pub time_secs: u64,
    /// Sequence collected
    pub completed: bool,
    /// Unix timestamp (ms) when submitted
    pub timestamp: f64,
}

/// One row of a leaderboard view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub score: u64,
    pub time_secs: u64,
}

impl From<&ScoreRecord> for LeaderboardEntry {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            player_name: record.player_name.clone(),
            score: record.score,
            time_secs: record.time_secs,
        }
    }
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub records: Vec<ScoreRecord>,
    next_id: u64,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "gold_tiles_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 0,
        }
    }

    /// Record a run; returns its score-view rank (1-indexed) if it made the top 10
    pub fn add(
        &mut self,
        player_name: String,
        score: u64,
        time_secs: u64,
        completed: bool,
        timestamp: f64,
    ) -> Option<usize> {
        let id = self.next_id;
        self.next_id += 1;
        self.records.push(ScoreRecord {
            id,
            player_name,
            score,
            time_secs,
            completed,
            timestamp,
        });
        self.prune();

        self.top(SortKey::Score)
            .iter()
            .position(|r| r.id == id)
            .map(|i| i + 1)
    }

    /// Top records for a view, ties by insertion order
    pub fn top(&self, sort: SortKey) -> Vec<&ScoreRecord> {
        let mut view: Vec<&ScoreRecord> = match sort {
            SortKey::Score => self.records.iter().collect(),
            SortKey::Time => self.records.iter().filter(|r| r.completed).collect(),
        };
        match sort {
            SortKey::Score => view.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id))),
            SortKey::Time => view.sort_by(|a, b| a.time_secs.cmp(&b.time_secs).then(a.id.cmp(&b.id))),
        }
        view.truncate(MAX_HIGH_SCORES);
        view
    }

    /// Leaderboard view as display entries
    pub fn entries(&self, sort: SortKey) -> Vec<LeaderboardEntry> {
        self.top(sort).into_iter().map(LeaderboardEntry::from).collect()
    }

    /// Drop records that can no longer reach either view
    fn prune(&mut self) {
        let keep: Vec<u64> = self
            .top(SortKey::Score)
            .iter()
            .chain(self.top(SortKey::Time).iter())
            .map(|r| r.id)
            .collect();
        self.records.retain(|r| keep.contains(&r.id));
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the top score (0 when empty)
    pub fn best_score(&self) -> u64 {
        self.records.iter().map(|r| r.score).max().unwrap_or(0)
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(scores) = serde_json::from_str::<HighScores>(&json) {
                    log::info!("Loaded {} high scores", scores.records.len());
                    return scores;
                }
            }
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), StoreError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StoreError::Unavailable("LocalStorage".to_string()))?;

        let json = serde_json::to_string(self)?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| StoreError::Rejected(Self::STORAGE_KEY.to_string()))?;
        log::info!("High scores saved ({} records)", self.records.len());
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<(), StoreError> {
        // No-op for native
        Ok(())
    }
}

/// Last two dot-separated segments of a client address
///
/// IPv4-mapped IPv6 (`::ffff:10.0.3.7`) is reduced to its IPv4 part first;
/// plain IPv6 keeps only its last group.
pub fn origin_suffix(addr: &str) -> String {
    let tail = addr.rsplit(':').next().unwrap_or(addr);
    let parts: Vec<&str> = tail.split('.').collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2..].join(".")
    } else {
        tail.to_string()
    }
}

/// Name as stored by an origin-aware store
pub fn tag_with_origin(name: &str, suffix: &str) -> String {
    format!("{name}-{suffix}")
}

/// Placeholder a stored name starts with, and the origin suffix after it
fn split_placeholder(name: &str) -> Option<(&'static str, &str)> {
    PLACEHOLDER_NAMES.iter().find_map(|&placeholder| {
        name.strip_prefix(placeholder)
            .map(|rest| (placeholder, rest.strip_prefix('-').unwrap_or(rest)))
    })
}

/// Least-used placeholder in the current leaderboard; ties go to pool order
pub fn placeholder_name(snapshot: &[LeaderboardEntry]) -> &'static str {
    let mut best = PLACEHOLDER_NAMES[0];
    let mut best_count = usize::MAX;
    for placeholder in PLACEHOLDER_NAMES {
        let count = snapshot
            .iter()
            .filter(|e| split_placeholder(&e.player_name).map(|(p, _)| p) == Some(placeholder))
            .count();
        if count < best_count {
            best = placeholder;
            best_count = count;
        }
    }
    best
}

/// Player's own name, or a placeholder when blank
pub fn resolve_player_name(name: Option<String>, snapshot: &[LeaderboardEntry]) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => placeholder_name(snapshot).to_string(),
    }
}

/// Origin suffix shared by three consecutive placeholder names, spelled out in pool order
pub fn easter_egg(entries: &[LeaderboardEntry]) -> Option<String> {
    entries.windows(PLACEHOLDER_NAMES.len()).find_map(|window| {
        let mut suffix = None;
        for (entry, expected) in window.iter().zip(PLACEHOLDER_NAMES) {
            let (placeholder, rest) = split_placeholder(&entry.player_name)?;
            if placeholder != expected {
                return None;
            }
            match suffix {
                None => suffix = Some(rest),
                Some(s) if s == rest => {}
                Some(_) => return None,
            }
        }
        suffix.map(str::to_string)
    })
}

/// Format whole seconds as `m:ss`
pub fn format_time(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
