//! Tile stream generation
//!
//! Builds rows of tiles and decides when the next row is due. All randomness
//! comes from the caller's RNG so a seeded run replays exactly.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::sequence::SequenceTracker;
use super::state::{Tile, TileId, TileKind};
use crate::consts::GOLD_GLYPHS;
use crate::settings::{Cadence, Settings};

/// A set of tiles created together, one per lane
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: u32,
    pub created_tick: u64,
    /// Ordered by lane
    pub tiles: Vec<Tile>,
}

impl Row {
    pub fn gold_lanes(&self) -> impl Iterator<Item = u8> + '_ {
        self.tiles
            .iter()
            .filter(|t| matches!(t.kind, TileKind::Scoring { .. }))
            .map(|t| t.lane)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles
            .iter()
            .filter(|t| matches!(t.kind, TileKind::SequenceToken { .. }))
    }
}

/// Inputs for building one row
pub struct RowContext<'a> {
    pub settings: &'a Settings,
    pub sequence: &'a SequenceTracker,
    /// Sequence index of the first token this row may carry
    pub next_symbol: usize,
    pub row_id: u32,
    pub tick: u64,
    /// Tiles take consecutive ids from here, by lane
    pub first_tile_id: u32,
}

/// Build a row: one gold lane, maybe a sequence token, the rest blank
pub fn create_row<R: Rng + ?Sized>(ctx: &RowContext<'_>, rng: &mut R) -> Row {
    let settings = ctx.settings;
    let lanes = settings.lane_count;

    let mut kinds = vec![(TileKind::Plain, 0u64); lanes as usize];

    let gold_lane = rng.random_range(0..lanes);
    let glyph = GOLD_GLYPHS[rng.random_range(0..GOLD_GLYPHS.len())];
    kinds[gold_lane as usize] = (TileKind::Scoring { glyph }, settings.gold_points);

    // Symbols are issued in order, after the ones already in flight
    let mut next_symbol = ctx.next_symbol;
    let mut place_token = |lane: u8, rng: &mut R| {
        if let Some(symbol) = ctx.sequence.symbol_at(next_symbol) {
            let points = settings
                .token_points
                .choose(rng)
                .copied()
                .unwrap_or(settings.gold_points);
            kinds[lane as usize] = (TileKind::SequenceToken { symbol }, points);
            next_symbol += 1;
        }
    };

    if settings.multi_token_rows {
        for lane in (0..lanes).filter(|&l| l != gold_lane) {
            if rng.random_bool(settings.token_chance as f64) {
                place_token(lane, &mut *rng);
            }
        }
    } else if lanes > 1 && rng.random_bool(settings.token_chance as f64) {
        let offset = rng.random_range(1..lanes);
        let lane = (gold_lane as u16 + offset as u16) % lanes as u16;
        place_token(lane as u8, &mut *rng);
    }

    let start_y = -settings.tile_height;
    let tiles = kinds
        .into_iter()
        .enumerate()
        .map(|(lane, (kind, points))| Tile {
            id: TileId(ctx.first_tile_id + lane as u32),
            kind,
            points,
            lane: lane as u8,
            row: ctx.row_id,
            y: start_y,
        })
        .collect();

    log::debug!("Row {} created at tick {}", ctx.row_id, ctx.tick);

    Row {
        id: ctx.row_id,
        created_tick: ctx.tick,
        tiles,
    }
}

/// Ticks between rows under `Cadence::Interval` at the given speed
///
/// The interval covers at least `base_ticks * base_speed` of fall distance at
/// any speed, so rows keep the same spacing as the game speeds up.
pub fn interval_ticks(base_ticks: u32, base_speed: f32, speed: f32) -> u32 {
    let distance = base_ticks as f32 * base_speed;
    ((distance / speed).ceil() as u32).max(1)
}

/// Whether the next row should be created now
pub fn row_due(settings: &Settings, speed: f32, fallen_since_row: f32, ticks_since_row: u32) -> bool {
    match settings.cadence {
        Cadence::Spacing => fallen_since_row >= settings.tile_height,
        Cadence::Interval { base_ticks } => {
            ticks_since_row >= interval_ticks(base_ticks, settings.base_speed, speed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn build(settings: &Settings, sequence: &SequenceTracker, next_symbol: usize, rng: &mut Pcg32) -> Row {
        let ctx = RowContext {
            settings,
            sequence,
            next_symbol,
            row_id: 0,
            tick: 0,
            first_tile_id: 1,
        };
        create_row(&ctx, rng)
    }

    #[test]
    fn test_same_seed_same_rows() {
        let settings = Settings::default();
        let sequence = SequenceTracker::new(settings.sequence.clone());
        let mut a = Pcg32::seed_from_u64(42);
        let mut b = Pcg32::seed_from_u64(42);
        for _ in 0..50 {
            assert_eq!(
                build(&settings, &sequence, 0, &mut a),
                build(&settings, &sequence, 0, &mut b)
            );
        }
    }

    #[test]
    fn test_row_layout() {
        let settings = Settings::default();
        let sequence = SequenceTracker::new(settings.sequence.clone());
        let mut rng = Pcg32::seed_from_u64(9);
        let mut saw_token = false;

        for _ in 0..200 {
            let row = build(&settings, &sequence, 0, &mut rng);
            assert_eq!(row.tiles.len(), 4);
            assert_eq!(row.gold_lanes().count(), 1);
            assert!(row.tokens().count() <= 1);
            for (lane, tile) in row.tiles.iter().enumerate() {
                assert_eq!(tile.lane as usize, lane);
                assert_eq!(tile.y, -settings.tile_height);
                match tile.kind {
                    TileKind::Plain => assert_eq!(tile.points, 0),
                    TileKind::Scoring { glyph } => {
                        assert_eq!(tile.points, 10);
                        assert!(GOLD_GLYPHS.contains(&glyph));
                    }
                    TileKind::SequenceToken { symbol } => {
                        saw_token = true;
                        assert_eq!(symbol, '少');
                        assert!(settings.token_points.contains(&tile.points));
                    }
                }
            }
        }
        assert!(saw_token);
    }

    #[test]
    fn test_token_carries_requested_symbol() {
        let settings = Settings {
            token_chance: 1.0,
            ..Default::default()
        };
        let sequence = SequenceTracker::new(settings.sequence.clone());
        let mut rng = Pcg32::seed_from_u64(1);

        let row = build(&settings, &sequence, 3, &mut rng);
        let token = row.tokens().next().expect("token");
        assert_eq!(token.kind, TileKind::SequenceToken { symbol: '到' });
    }

    #[test]
    fn test_no_token_past_sequence_end() {
        let settings = Settings {
            token_chance: 1.0,
            ..Default::default()
        };
        let sequence = SequenceTracker::new(settings.sequence.clone());
        let mut rng = Pcg32::seed_from_u64(5);
        let row = build(&settings, &sequence, settings.sequence.len(), &mut rng);
        assert_eq!(row.tokens().count(), 0);
        assert_eq!(row.gold_lanes().count(), 1);
    }

    #[test]
    fn test_multi_token_rows_issue_consecutive_symbols() {
        let settings = Settings {
            token_chance: 1.0,
            multi_token_rows: true,
            ..Default::default()
        };
        let sequence = SequenceTracker::new(settings.sequence.clone());
        let mut rng = Pcg32::seed_from_u64(3);
        let row = build(&settings, &sequence, 0, &mut rng);
        let symbols: Vec<char> = row
            .tokens()
            .map(|t| match t.kind {
                TileKind::SequenceToken { symbol } => symbol,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(symbols, vec!['少', '年', '得']);
    }

    #[test]
    fn test_no_tokens_when_disabled() {
        let settings = Settings {
            token_chance: 0.0,
            ..Default::default()
        };
        let sequence = SequenceTracker::new(settings.sequence.clone());
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..100 {
            assert_eq!(build(&settings, &sequence, 0, &mut rng).tokens().count(), 0);
        }
    }

    #[test]
    fn test_interval_keeps_spacing() {
        let base_ticks = 80;
        let base_speed = 1.5;
        let mut last = u32::MAX;
        for step in 0..20 {
            let speed = base_speed + step as f32 * 0.3;
            let ticks = interval_ticks(base_ticks, base_speed, speed);
            assert!(ticks <= last);
            assert!(ticks as f32 * speed >= base_ticks as f32 * base_speed - 1e-3);
            last = ticks;
        }
    }

    #[test]
    fn test_spacing_due_after_one_tile() {
        let settings = Settings::default();
        assert!(!row_due(&settings, 1.5, 99.0, 66));
        assert!(row_due(&settings, 1.5, 100.0, 67));
    }
}
