//! Game state and core simulation types
//!
//! Everything a run needs to replay deterministically from its seed lives here.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::sequence::SequenceTracker;
use super::spawn::{self, Row, RowContext};
use crate::settings::Settings;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for start
    Ready,
    /// Tiles are falling
    Playing,
    /// Run ended on a miss
    GameOver,
    /// Sequence collected
    Won,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Won)
    }
}

/// Opaque tile handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u32);

/// Tile types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// Blank filler; clicking it is a miss
    Plain,
    /// Gold tile worth fixed points
    Scoring { glyph: char },
    /// One symbol of the sequence
    SequenceToken { symbol: char },
}

impl TileKind {
    /// Must be clicked before reaching the fail boundary
    pub fn is_required(&self) -> bool {
        !matches!(self, TileKind::Plain)
    }
}

/// A falling tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    /// Frozen at creation
    pub points: u64,
    pub lane: u8,
    /// Row this tile was created with
    pub row: u32,
    /// Top edge, grows downward
    pub y: f32,
}

/// Why a tile left the live set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Removal {
    Clicked,
    /// Plain tile fell out of the play area
    Expired,
    /// Fatal miss
    Missed,
    /// Run ended with the tile still falling
    Cleared,
}

/// Why a run was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissCause {
    /// A required tile crossed the fail boundary
    TileMissed { id: TileId },
    /// A blank tile was clicked
    PlainClicked { id: TileId },
    /// A sequence token was clicked out of order
    WrongOrder { expected: char, got: char },
    /// The host ended the run
    Abandoned,
}

/// Events for the display layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    TileSpawned {
        id: TileId,
        lane: u8,
        kind: TileKind,
        points: u64,
    },
    TileRemoved {
        id: TileId,
        reason: Removal,
    },
    ScoreChanged {
        score: u64,
        speed: f32,
    },
    SequenceProgress {
        progress: usize,
        len: usize,
    },
    /// Transient "wrong order" message
    WrongOrder {
        expected: char,
        got: char,
    },
    SequenceCompleted {
        cycle: u32,
    },
    GameOver {
        cause: MissCause,
    },
    Won,
    SubmitSucceeded {
        player_name: String,
    },
    SubmitFailed {
        reason: String,
    },
    /// Three placeholder names from one origin line up on the leaderboard
    EasterEgg {
        suffix: String,
    },
}

/// Complete run state (deterministic for a seed and click stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Tuning for this run
    pub settings: Settings,
    /// Current phase
    pub phase: GamePhase,
    /// Score
    pub score: u64,
    /// Fall distance per tick
    pub speed: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Live tiles in creation order
    pub tiles: Vec<Tile>,
    /// Sequence collection progress
    pub sequence: SequenceTracker,
    /// Rows created this run
    pub rows_spawned: u32,
    /// Distance fallen since the last row was created
    pub(crate) fallen_since_row: f32,
    /// Ticks since the last row was created
    pub(crate) ticks_since_row: u32,
    /// Sequence index the next token will carry
    pub(crate) issue_cursor: usize,
    rng: Pcg32,
    next_id: u32,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a run in the Ready phase
    pub fn new(seed: u64, settings: Settings) -> Self {
        let sequence = SequenceTracker::new(settings.sequence.clone());
        let speed = settings.base_speed;
        Self {
            seed,
            settings,
            phase: GamePhase::Ready,
            score: 0,
            speed,
            time_ticks: 0,
            tiles: Vec::new(),
            sequence,
            rows_spawned: 0,
            fallen_since_row: 0.0,
            ticks_since_row: 0,
            issue_cursor: 0,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
            events: Vec::new(),
        }
    }

    /// Enter Playing and seed the first row
    pub fn begin(&mut self) {
        if self.phase != GamePhase::Ready {
            return;
        }
        self.phase = GamePhase::Playing;
        self.spawn_row();
    }

    /// Add points and rescale speed
    pub fn add_score(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        self.score = self.score.saturating_add(points);
        self.speed = self.settings.speed_for_score(self.score);
        self.events.push(GameEvent::ScoreChanged {
            score: self.score,
            speed: self.speed,
        });
    }

    /// Reissue tokens from the tracker's position, after progress was reset
    pub(crate) fn rewind_tokens(&mut self) {
        self.issue_cursor = self.sequence.progress();
    }

    /// Look up a live tile
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    /// Remove a live tile, reporting why
    pub(crate) fn remove_tile(&mut self, id: TileId, reason: Removal) -> Option<Tile> {
        let index = self.tiles.iter().position(|t| t.id == id)?;
        let tile = self.tiles.remove(index);
        self.events.push(GameEvent::TileRemoved { id, reason });
        Some(tile)
    }

    /// Create the next row and add its tiles to the live set
    pub fn spawn_row(&mut self) -> Row {
        let ctx = RowContext {
            settings: &self.settings,
            sequence: &self.sequence,
            next_symbol: self.issue_cursor.max(self.sequence.progress()),
            row_id: self.rows_spawned,
            tick: self.time_ticks,
            first_tile_id: self.next_id,
        };
        let row = spawn::create_row(&ctx, &mut self.rng);

        self.next_id += row.tiles.len() as u32;
        self.issue_cursor = ctx.next_symbol + row.tokens().count();
        self.rows_spawned += 1;
        self.fallen_since_row = 0.0;
        self.ticks_since_row = 0;

        for tile in &row.tiles {
            self.events.push(GameEvent::TileSpawned {
                id: tile.id,
                lane: tile.lane,
                kind: tile.kind,
                points: tile.points,
            });
        }
        self.tiles.extend(row.tiles.iter().cloned());
        row
    }

    /// Sequence collected; remaining tiles are cleared
    pub fn win(&mut self) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.phase = GamePhase::Won;
        self.events.push(GameEvent::Won);
        self.clear_tiles();
    }

    /// Run lost; remaining tiles are cleared
    pub fn lose(&mut self, cause: MissCause) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.events.push(GameEvent::GameOver { cause });
        self.clear_tiles();
    }

    fn clear_tiles(&mut self) {
        for tile in std::mem::take(&mut self.tiles) {
            self.events.push(GameEvent::TileRemoved {
                id: tile.id,
                reason: Removal::Cleared,
            });
        }
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
