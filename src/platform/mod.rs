//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (wall clock for run length)
//! - Tick delivery (a cancellable handle per running session)
//! - Fixed-step frame pacing

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Wall clock in milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Real time: `Date.now()` on the web, `SystemTime` natively
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Clock moved by hand; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self(Rc::new(Cell::new(start_ms)))
    }

    pub fn advance(&self, ms: f64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

/// Handle to a running tick source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// Source of periodic ticks
pub trait TickDriver {
    /// Begin delivering ticks
    fn start(&mut self) -> TaskId;
    /// Stop the ticks started under `id`
    fn stop(&mut self, id: TaskId);
    /// Whether `id` still delivers ticks
    fn is_live(&self, id: TaskId) -> bool;
}

#[derive(Debug, Default)]
struct DriverState {
    next_id: u64,
    live: Option<TaskId>,
    starts: u32,
    stops: u32,
}

/// Tick driver whose loop lives in the host
///
/// The host keeps requesting frames only while `is_running()` holds, so a
/// stopped session leaves no frame callback behind. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FlagDriver(Rc<RefCell<DriverState>>);

impl FlagDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle is live
    pub fn is_running(&self) -> bool {
        self.0.borrow().live.is_some()
    }

    /// Handles started so far
    pub fn starts(&self) -> u32 {
        self.0.borrow().starts
    }

    /// Handles stopped so far
    pub fn stops(&self) -> u32 {
        self.0.borrow().stops
    }
}

impl TickDriver for FlagDriver {
    fn start(&mut self) -> TaskId {
        let mut state = self.0.borrow_mut();
        if let Some(old) = state.live {
            log::warn!("Tick driver {} replaced while live", old.0);
        }
        state.next_id += 1;
        let id = TaskId(state.next_id);
        state.live = Some(id);
        state.starts += 1;
        id
    }

    fn stop(&mut self, id: TaskId) {
        let mut state = self.0.borrow_mut();
        if state.live == Some(id) {
            state.live = None;
            state.stops += 1;
        }
    }

    fn is_live(&self, id: TaskId) -> bool {
        self.0.borrow().live == Some(id)
    }
}

/// Turns frame timestamps into a whole number of fixed simulation steps
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f64,
    last_ms: Option<f64>,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget timing history (new session, tab resumed)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_ms = None;
    }

    /// Steps to run for a frame at `now_ms`
    pub fn steps(&mut self, now_ms: f64) -> u32 {
        let Some(last) = self.last_ms.replace(now_ms) else {
            return 0;
        };
        let dt = ((now_ms - last) / 1000.0).clamp(0.0, 0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }
}
