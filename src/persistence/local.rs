//! In-process stores, backed by LocalStorage on the web

use super::{BestScoreStore, ScoreStore, StoreError, Submission};
use crate::highscores::{self, HighScores, LeaderboardEntry, SortKey};

/// Leaderboard kept in memory, saved to LocalStorage after each submission
#[derive(Debug, Clone, Default)]
pub struct LeaderboardStore {
    scores: HighScores,
    /// Suffix appended to every submitted name
    origin: Option<String>,
    persist: bool,
}

impl LeaderboardStore {
    /// Empty, never persisted
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from LocalStorage and keep it updated
    pub fn load() -> Self {
        Self {
            scores: HighScores::load(),
            origin: None,
            persist: true,
        }
    }

    /// Tag submitted names with the origin address suffix
    pub fn with_origin(mut self, addr: &str) -> Self {
        self.origin = Some(highscores::origin_suffix(addr));
        self
    }

    pub fn scores(&self) -> &HighScores {
        &self.scores
    }
}

impl ScoreStore for LeaderboardStore {
    fn submit(&mut self, submission: &Submission) -> Result<(), StoreError> {
        let name = match &self.origin {
            Some(suffix) => highscores::tag_with_origin(&submission.player_name, suffix),
            None => submission.player_name.clone(),
        };
        let rank = self.scores.add(
            name,
            submission.score,
            submission.time_secs,
            submission.completed,
            submission.timestamp,
        );
        log::info!(
            "Recorded {} points for {} (rank {:?})",
            submission.score,
            submission.player_name,
            rank
        );
        if self.persist {
            self.scores.save()?;
        }
        Ok(())
    }

    fn best_score(&self) -> Result<u64, StoreError> {
        Ok(self.scores.best_score())
    }

    fn leaderboard(&self, sort: SortKey) -> Result<Vec<LeaderboardEntry>, StoreError> {
        Ok(self.scores.entries(sort))
    }
}

/// Best score, saved to LocalStorage on the web
#[derive(Debug, Clone, Default)]
pub struct LocalBestScore {
    best: u64,
    persist: bool,
}

impl LocalBestScore {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "bestScore";

    /// Starts at zero, never persisted
    pub fn new() -> Self {
        Self::default()
    }

    /// Load best score from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let best = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .and_then(|storage| storage.get_item(Self::STORAGE_KEY).ok().flatten())
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0);
        log::info!("Best score: {best}");
        Self {
            best,
            persist: true,
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(target_arch = "wasm32")]
    fn write(&self) -> Result<(), StoreError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StoreError::Unavailable("LocalStorage".to_string()))?;
        storage
            .set_item(Self::STORAGE_KEY, &self.best.to_string())
            .map_err(|_| StoreError::Rejected(Self::STORAGE_KEY.to_string()))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn write(&self) -> Result<(), StoreError> {
        // No-op for native
        Ok(())
    }
}

impl BestScoreStore for LocalBestScore {
    fn best(&self) -> u64 {
        self.best
    }

    fn save(&mut self, best: u64) -> Result<(), StoreError> {
        self.best = best;
        if self.persist {
            self.write()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str, score: u64, time_secs: u64, completed: bool) -> Submission {
        Submission {
            player_name: name.to_string(),
            score,
            time_secs,
            completed,
            timestamp: 0.0,
        }
    }

    #[test]
    fn test_leaderboard_store_views() {
        let mut store = LeaderboardStore::new();
        store.submit(&run("a", 40, 90, true)).unwrap();
        store.submit(&run("b", 90, 30, false)).unwrap();

        assert_eq!(store.best_score().unwrap(), 90);
        let by_score = store.leaderboard(SortKey::Score).unwrap();
        assert_eq!(by_score[0].player_name, "b");
        let by_time = store.leaderboard(SortKey::Time).unwrap();
        assert_eq!(by_time.len(), 1);
        assert_eq!(by_time[0].player_name, "a");
    }

    #[test]
    fn test_origin_tagging() {
        let mut store = LeaderboardStore::new().with_origin("10.1.22.33");
        store.submit(&run("生日快乐", 10, 5, false)).unwrap();
        let board = store.leaderboard(SortKey::Score).unwrap();
        assert_eq!(board[0].player_name, "生日快乐-22.33");
    }

    #[test]
    fn test_best_score_roundtrip() {
        let mut best = LocalBestScore::new();
        assert_eq!(best.best(), 0);
        best.save(120).unwrap();
        assert_eq!(best.best(), 120);
    }
}
