//! Persistence collaborators
//!
//! The session never touches storage directly; it talks to these traits:
//! - `ScoreStore`: run submissions and leaderboard views
//! - `BestScoreStore`: the local best score
//! - `NameSource`: the player's display name

pub mod local;

pub use local::{LeaderboardStore, LocalBestScore};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::highscores::{LeaderboardEntry, SortKey};

/// Storage failures; logged by the session, never fatal to play
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage rejected write: {0}")]
    Rejected(String),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A finished run, ready to submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub player_name: String,
    pub score: u64,
    pub time_secs: u64,
    pub completed: bool,
    /// Unix timestamp (ms)
    pub timestamp: f64,
}

/// Leaderboard backend
pub trait ScoreStore {
    fn submit(&mut self, submission: &Submission) -> Result<(), StoreError>;
    fn best_score(&self) -> Result<u64, StoreError>;
    /// Top 10 for a view
    fn leaderboard(&self, sort: SortKey) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

/// Best score kept across sessions
pub trait BestScoreStore {
    fn best(&self) -> u64;
    fn save(&mut self, best: u64) -> Result<(), StoreError>;
}

/// Supplies the player's display name at submission time
pub trait NameSource {
    fn player_name(&mut self) -> Option<String>;
}

/// Always the same name (or always none)
#[derive(Debug, Clone, Default)]
pub struct FixedName(pub Option<String>);

impl NameSource for FixedName {
    fn player_name(&mut self) -> Option<String> {
        self.0.clone()
    }
}
