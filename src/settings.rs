//! Game tuning
//!
//! Persisted separately from the leaderboard in LocalStorage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// What a wrong-order sequence click does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MismatchPolicy {
    /// Drop partial progress and keep playing
    #[default]
    ResetProgress,
    /// Treat the click as a miss
    EndSession,
}

/// What collecting the full sequence does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CompletionPolicy {
    /// The run is won
    #[default]
    EndSession,
    /// Award the bonus and start collecting again
    Repeat,
}

/// When a new row enters the play area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Cadence {
    /// Once the previous row has fallen one tile height
    #[default]
    Spacing,
    /// Every `base_ticks` at base speed, shortened as speed grows
    Interval { base_ticks: u32 },
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Spacing => "spacing",
            Cadence::Interval { .. } => "interval",
        }
    }
}

/// Rejected tuning values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("settings are not valid JSON: {0}")]
    Parse(String),
    #[error("lane count must be at least 1")]
    NoLanes,
    #[error("sequence tokens need a second lane (lane count {0})")]
    TooFewLanesForTokens(u8),
    #[error("tile height must be positive, got {0}")]
    TileHeight(f32),
    #[error("fail boundary must be positive, got {0}")]
    FailBoundary(f32),
    #[error("base speed must be positive, got {0}")]
    BaseSpeed(f32),
    #[error("speed increment must not be negative, got {0}")]
    SpeedIncrement(f32),
    #[error("score step must be at least 1")]
    ScoreStep,
    #[error("token chance {0} must be between 0.0 and 1.0")]
    TokenChance(f32),
    #[error("token point set is empty")]
    NoTokenPoints,
    #[error("sequence is empty")]
    EmptySequence,
    #[error("interval of {base_ticks} ticks at speed {base_speed} lets rows overlap (tile height {tile_height})")]
    OverlappingInterval {
        base_ticks: u32,
        base_speed: f32,
        tile_height: f32,
    },
}

/// Game tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Board ===
    pub lane_count: u8,
    pub tile_height: f32,
    pub fail_boundary: f32,

    // === Speed ===
    pub base_speed: f32,
    pub score_step: u64,
    pub speed_increment: f32,
    pub cadence: Cadence,

    // === Scoring ===
    pub gold_points: u64,
    pub token_points: Vec<u64>,
    /// Chance (0.0 - 1.0) that a row carries a sequence token
    pub token_chance: f32,
    /// Let every non-gold lane roll for a token instead of at most one
    pub multi_token_rows: bool,

    // === Sequence ===
    pub sequence: Vec<char>,
    /// Extra points on completing the sequence
    pub completion_bonus: u64,
    pub mismatch: MismatchPolicy,
    pub completion: CompletionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lane_count: LANE_COUNT,
            tile_height: TILE_HEIGHT,
            fail_boundary: FAIL_BOUNDARY,

            base_speed: BASE_SPEED,
            score_step: SCORE_STEP,
            speed_increment: SPEED_INCREMENT,
            cadence: Cadence::Spacing,

            gold_points: GOLD_POINTS,
            token_points: TOKEN_POINTS.to_vec(),
            token_chance: TOKEN_CHANCE,
            multi_token_rows: false,

            sequence: SEQUENCE.to_vec(),
            completion_bonus: 0,
            mismatch: MismatchPolicy::ResetProgress,
            completion: CompletionPolicy::EndSession,
        }
    }
}

impl Settings {
    /// Check every value the simulation relies on
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.lane_count == 0 {
            return Err(SettingsError::NoLanes);
        }
        if self.token_chance > 0.0 && self.lane_count < 2 {
            return Err(SettingsError::TooFewLanesForTokens(self.lane_count));
        }
        if !(self.tile_height > 0.0) {
            return Err(SettingsError::TileHeight(self.tile_height));
        }
        if !(self.fail_boundary > 0.0) {
            return Err(SettingsError::FailBoundary(self.fail_boundary));
        }
        if !(self.base_speed > 0.0) {
            return Err(SettingsError::BaseSpeed(self.base_speed));
        }
        if !(self.speed_increment >= 0.0) {
            return Err(SettingsError::SpeedIncrement(self.speed_increment));
        }
        if self.score_step == 0 {
            return Err(SettingsError::ScoreStep);
        }
        if !(0.0..=1.0).contains(&self.token_chance) {
            return Err(SettingsError::TokenChance(self.token_chance));
        }
        if self.token_points.is_empty() {
            return Err(SettingsError::NoTokenPoints);
        }
        if self.sequence.is_empty() {
            return Err(SettingsError::EmptySequence);
        }
        if let Cadence::Interval { base_ticks } = self.cadence {
            if (base_ticks as f32) * self.base_speed < self.tile_height {
                return Err(SettingsError::OverlappingInterval {
                    base_ticks,
                    base_speed: self.base_speed,
                    tile_height: self.tile_height,
                });
            }
        }
        Ok(())
    }

    /// Fall speed for a score
    pub fn speed_for_score(&self, score: u64) -> f32 {
        let steps = score / self.score_step;
        self.base_speed + steps as f32 * self.speed_increment
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "gold_tiles_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Stored settings rejected: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
