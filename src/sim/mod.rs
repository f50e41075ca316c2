//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (tile creation order)
//! - No rendering or platform dependencies

pub mod sequence;
pub mod spawn;
pub mod state;
pub mod tick;

pub use sequence::{SequenceStep, SequenceTracker};
pub use spawn::{Row, RowContext, create_row, interval_ticks, row_due};
pub use state::{GameEvent, GamePhase, GameState, MissCause, Removal, Tile, TileId, TileKind};
pub use tick::{ClickOutcome, TickInput, click, tick};
