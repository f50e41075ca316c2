//! Session lifecycle
//!
//! A `Session` owns one `GameState` at a time, the tick-driver handle that
//! feeds it, and the collaborators for time, names and persistence. Score
//! submission is deferred: `end` only queues a summary, and
//! `flush_submissions` hands it to the store later so the end-of-run screen
//! never waits on storage.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::highscores::{self, LeaderboardEntry, SortKey};
use crate::persistence::{BestScoreStore, NameSource, ScoreStore, Submission};
use crate::platform::{Clock, TaskId, TickDriver};
use crate::settings::{Settings, SettingsError};
use crate::sim::{self, ClickOutcome, GameEvent, GamePhase, GameState, MissCause, TickInput, TileId};

/// Startup failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),
    #[error("required resource missing: {0}")]
    MissingResource(String),
}

/// Result of one run, handed to the score store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: u64,
    pub elapsed_secs: u64,
    pub completed: bool,
}

/// Values for the heads-up display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    pub best_score: u64,
    pub elapsed_secs: u64,
    pub progress: usize,
    pub sequence_len: usize,
    pub speed: f32,
    pub phase: GamePhase,
}

/// Everything the session depends on outside the simulation
pub struct Collaborators {
    pub scores: Box<dyn ScoreStore>,
    pub best: Box<dyn BestScoreStore>,
    pub names: Box<dyn NameSource>,
    pub clock: Box<dyn Clock>,
    pub driver: Box<dyn TickDriver>,
}

pub struct Session {
    settings: Settings,
    state: GameState,
    collab: Collaborators,
    /// Live tick handle while Playing
    handle: Option<TaskId>,
    best_score: u64,
    started_ms: f64,
    /// Frozen at end so the HUD stops counting
    ended_ms: Option<f64>,
    pending: VecDeque<SessionSummary>,
    events: Vec<GameEvent>,
    ticks_fired: u64,
}

impl Session {
    /// Validate settings and load the best score
    pub fn new(settings: Settings, collab: Collaborators) -> Result<Self, SessionError> {
        settings.validate()?;
        let local_best = collab.best.best();
        let best_score = match collab.scores.best_score() {
            Ok(stored) => local_best.max(stored),
            Err(e) => {
                log::warn!("Failed to load best score: {e}");
                local_best
            }
        };
        log::info!(
            "Session ready ({} lanes, {} cadence, best {})",
            settings.lane_count,
            settings.cadence.as_str(),
            best_score
        );
        let state = GameState::new(0, settings.clone());
        Ok(Self {
            settings,
            state,
            collab,
            handle: None,
            best_score,
            started_ms: 0.0,
            ended_ms: None,
            pending: VecDeque::new(),
            events: Vec::new(),
            ticks_fired: 0,
        })
    }

    /// Begin a fresh run; any previous run's tick handle is stopped first
    pub fn start(&mut self, seed: u64) {
        if self.is_running() {
            log::info!("Restart while playing, previous run abandoned");
            self.end(false);
        }

        self.state = GameState::new(seed, self.settings.clone());
        self.state.begin();
        self.started_ms = self.collab.clock.now_ms();
        self.ended_ms = None;
        self.ticks_fired = 0;
        self.forward_events();
        self.handle = Some(self.collab.driver.start());

        log::info!("Run started with seed: {seed}");
    }

    /// One tick-driver callback; returns whether a tick ran
    pub fn frame(&mut self, input: &TickInput) -> bool {
        let Some(handle) = self.handle else {
            return false;
        };
        if !self.collab.driver.is_live(handle) || self.state.phase != GamePhase::Playing {
            return false;
        }

        sim::tick(&mut self.state, input);
        self.ticks_fired += 1;
        self.forward_events();
        self.end_if_finished();
        true
    }

    /// Apply a click now, between ticks
    pub fn click(&mut self, id: TileId) -> ClickOutcome {
        let outcome = sim::click(&mut self.state, id);
        self.forward_events();
        self.end_if_finished();
        outcome
    }

    /// Close the run: stop ticks, settle the best score, queue the summary
    ///
    /// Returns `None` when no run is in progress.
    pub fn end(&mut self, completed: bool) -> Option<SessionSummary> {
        let handle = self.handle.take()?;
        self.collab.driver.stop(handle);

        if self.state.phase == GamePhase::Playing {
            if completed {
                self.state.win();
            } else {
                self.state.lose(MissCause::Abandoned);
            }
            self.forward_events();
        }

        let now = self.collab.clock.now_ms();
        self.ended_ms = Some(now);

        let score = self.state.score;
        if score > self.best_score {
            self.best_score = score;
            if let Err(e) = self.collab.best.save(score) {
                log::warn!("Failed to save best score: {e}");
            }
        }

        let summary = SessionSummary {
            score,
            elapsed_secs: elapsed_secs(self.started_ms, now),
            completed,
        };
        log::info!(
            "Run over: {} points in {}s ({})",
            summary.score,
            summary.elapsed_secs,
            if completed { "completed" } else { "missed" }
        );
        self.pending.push_back(summary.clone());
        Some(summary)
    }

    fn end_if_finished(&mut self) {
        match self.state.phase {
            GamePhase::GameOver => {
                self.end(false);
            }
            GamePhase::Won => {
                self.end(true);
            }
            _ => {}
        }
    }

    /// Submit queued summaries; returns how many were accepted
    pub fn flush_submissions(&mut self) -> usize {
        let mut accepted = 0;
        while let Some(summary) = self.pending.pop_front() {
            let snapshot = self.fetch_leaderboard(SortKey::Score);
            let player_name =
                highscores::resolve_player_name(self.collab.names.player_name(), &snapshot);
            let submission = Submission {
                player_name: player_name.clone(),
                score: summary.score,
                time_secs: summary.elapsed_secs,
                completed: summary.completed,
                timestamp: self.collab.clock.now_ms(),
            };
            match self.collab.scores.submit(&submission) {
                Ok(()) => {
                    accepted += 1;
                    self.events.push(GameEvent::SubmitSucceeded { player_name });
                }
                Err(e) => {
                    log::warn!("Score submission failed: {e}");
                    self.events.push(GameEvent::SubmitFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }
        if accepted > 0 {
            self.leaderboard(SortKey::Score);
        }
        accepted
    }

    /// Leaderboard view for display; checks the placeholder easter egg
    pub fn leaderboard(&mut self, sort: SortKey) -> Vec<LeaderboardEntry> {
        let entries = self.fetch_leaderboard(sort);
        if sort == SortKey::Score {
            if let Some(suffix) = highscores::easter_egg(&entries) {
                log::info!("Placeholder names lined up (origin {suffix:?})");
                self.events.push(GameEvent::EasterEgg { suffix });
            }
        }
        entries
    }

    fn fetch_leaderboard(&self, sort: SortKey) -> Vec<LeaderboardEntry> {
        self.collab.scores.leaderboard(sort).unwrap_or_else(|e| {
            log::warn!("Failed to load {} leaderboard: {e}", sort.as_str());
            Vec::new()
        })
    }

    fn forward_events(&mut self) {
        self.events.extend(self.state.drain_events());
    }

    /// Take pending display events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud(&self) -> Hud {
        let now = self.ended_ms.unwrap_or_else(|| self.collab.clock.now_ms());
        let elapsed = if self.state.phase == GamePhase::Ready {
            0
        } else {
            elapsed_secs(self.started_ms, now)
        };
        Hud {
            score: self.state.score,
            best_score: self.best_score,
            elapsed_secs: elapsed,
            progress: self.state.sequence.progress(),
            sequence_len: self.state.sequence.len(),
            speed: self.state.speed,
            phase: self.state.phase,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// A run is in progress
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    /// Ticks run since the last start
    pub fn ticks_fired(&self) -> u64 {
        self.ticks_fired
    }

    /// Summaries waiting for `flush_submissions`
    pub fn pending_submissions(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.collab.driver.stop(handle);
        }
    }
}

fn elapsed_secs(started_ms: f64, now_ms: f64) -> u64 {
    ((now_ms - started_ms).max(0.0) / 1000.0).floor() as u64
}
