//! Browser binding
//!
//! The page owns drawing and the animation-frame loop; it calls `frame` with
//! the rAF timestamp while `is_running()` holds and reads tiles, events and
//! the HUD back as JSON.

use wasm_bindgen::prelude::*;

use crate::highscores::{self, SortKey};
use crate::persistence::{LeaderboardStore, LocalBestScore, NameSource};
use crate::platform::{Clock, FixedStep, FlagDriver, SystemClock};
use crate::session::{Collaborators, Session, SessionError};
use crate::settings::Settings;
use crate::sim::{TickInput, TileId};

/// Name typed into the page, shared with the session
#[derive(Clone, Default)]
struct PromptName(std::rc::Rc<std::cell::RefCell<Option<String>>>);

impl NameSource for PromptName {
    fn player_name(&mut self) -> Option<String> {
        self.0.borrow().clone()
    }
}

#[derive(serde::Serialize)]
struct BoardRow {
    rank: usize,
    player_name: String,
    score: u64,
    time: String,
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(to_js)
}

#[wasm_bindgen]
pub struct WebGame {
    session: Session,
    driver: FlagDriver,
    step: FixedStep,
    input: TickInput,
    name: PromptName,
}

#[wasm_bindgen]
impl WebGame {
    /// Bind to the element with id `container_id`; fails if it is missing
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str) -> Result<WebGame, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| to_js(SessionError::MissingResource("document".to_string())))?;
        if document.get_element_by_id(container_id).is_none() {
            let err = SessionError::MissingResource(format!("#{container_id}"));
            log::error!("{err}");
            return Err(to_js(err));
        }

        let driver = FlagDriver::new();
        let name = PromptName::default();
        let collab = Collaborators {
            scores: Box::new(LeaderboardStore::load()),
            best: Box::new(LocalBestScore::load()),
            names: Box::new(name.clone()),
            clock: Box::new(SystemClock),
            driver: Box::new(driver.clone()),
        };
        let session = Session::new(Settings::load(), collab).map_err(to_js)?;

        Ok(WebGame {
            session,
            driver,
            step: FixedStep::new(),
            input: TickInput::default(),
            name,
        })
    }

    /// Begin a run seeded from the wall clock
    pub fn start(&mut self) {
        let seed = SystemClock.now_ms() as u64;
        self.step.reset();
        self.input = TickInput {
            autoplay: self.input.autoplay,
            ..Default::default()
        };
        self.session.start(seed);
    }

    /// Run the fixed steps due at `now_ms`; returns whether the loop should continue
    pub fn frame(&mut self, now_ms: f64) -> bool {
        for _ in 0..self.step.steps(now_ms) {
            let input = TickInput {
                clicks: std::mem::take(&mut self.input.clicks),
                autoplay: self.input.autoplay,
            };
            if !self.session.frame(&input) {
                break;
            }
        }
        self.driver.is_running()
    }

    /// Queue a click for the next tick
    pub fn click(&mut self, tile_id: u32) {
        self.input.clicks.push(TileId(tile_id));
    }

    /// End the current run early
    pub fn stop(&mut self) {
        self.session.end(false);
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    pub fn set_autoplay(&mut self, on: bool) {
        self.input.autoplay = on;
    }

    /// Name used for the next submission; blank picks a placeholder
    pub fn set_player_name(&mut self, name: &str) {
        *self.name.0.borrow_mut() = Some(name.to_string());
    }

    /// Submit finished runs; returns how many were accepted
    pub fn flush_submissions(&mut self) -> usize {
        self.session.flush_submissions()
    }

    pub fn tiles_json(&self) -> Result<String, JsValue> {
        json(&self.session.state().tiles)
    }

    pub fn events_json(&mut self) -> Result<String, JsValue> {
        json(&self.session.drain_events())
    }

    pub fn hud_json(&self) -> Result<String, JsValue> {
        json(&self.session.hud())
    }

    /// Leaderboard view, `"score"` or `"time"`
    pub fn leaderboard_json(&mut self, sort: &str) -> Result<String, JsValue> {
        let sort = sort.parse::<SortKey>().unwrap_or_default();
        let rows: Vec<BoardRow> = self
            .session
            .leaderboard(sort)
            .into_iter()
            .enumerate()
            .map(|(i, e)| BoardRow {
                rank: i + 1,
                player_name: e.player_name,
                score: e.score,
                time: highscores::format_time(e.time_secs),
            })
            .collect();
        json(&rows)
    }

    /// Persist the current settings
    pub fn save_settings(&self) {
        self.session.settings().save();
    }
}
