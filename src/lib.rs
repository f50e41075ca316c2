//! Gold Tiles - a falling-tile clicker game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile stream, fall/collision, sequence tracking)
//! - `session`: Session lifecycle, scoring, tick-driver ownership
//! - `highscores`: Leaderboard ranking, placeholder names, easter egg detection
//! - `persistence`: Score/best-score store collaborators
//! - `platform`: Clock and tick driver abstraction
//! - `settings`: Data-driven game tuning

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::HighScores;
pub use session::{Collaborators, Hud, Session, SessionError, SessionSummary};
pub use settings::{Cadence, CompletionPolicy, MismatchPolicy, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tile step per animation frame)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Number of lanes per row
    pub const LANE_COUNT: u8 = 4;
    /// Tile height; new rows start this far above the play area
    pub const TILE_HEIGHT: f32 = 100.0;
    /// Tiles whose top passes this line have left the play area
    pub const FAIL_BOUNDARY: f32 = 400.0;

    /// Speed curve: base + floor(score / step) * increment
    pub const BASE_SPEED: f32 = 1.5;
    pub const SCORE_STEP: u64 = 150;
    pub const SPEED_INCREMENT: f32 = 0.3;

    /// Points for a gold tile
    pub const GOLD_POINTS: u64 = 10;
    /// Gold tile faces
    pub const GOLD_GLYPHS: [char; 2] = ['$', '￥'];
    /// Point values a sequence token may carry
    pub const TOKEN_POINTS: [u64; 5] = [20, 40, 60, 80, 100];
    /// Chance that a row carries a sequence token
    pub const TOKEN_CHANCE: f32 = 0.3;

    /// The blessing the player collects one tile at a time
    pub const SEQUENCE: [char; 11] = ['少', '年', '得', '到', '7', '周', '年', '生', '日', '快', '乐'];

    /// Names used when the player leaves the name prompt blank
    pub const PLACEHOLDER_NAMES: [&str; 3] = ["少年得到", "7周年", "生日快乐"];
}
