//! Fixed timestep simulation tick
//!
//! Core game loop: apply clicks, move tiles, resolve the fail boundary, then
//! spawn rows on cadence.

use super::sequence::SequenceStep;
use super::spawn;
use super::state::{GameEvent, GamePhase, GameState, MissCause, Removal, TileId, TileKind};
use crate::settings::{CompletionPolicy, MismatchPolicy};

/// Autoplay clicks required tiles once they pass this fraction of the play area
const AUTOPLAY_REACH: f32 = 0.5;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tiles clicked since the last tick, in click order
    pub clicks: Vec<TileId>,
    /// Demo mode - click every required tile halfway down
    pub autoplay: bool,
}

/// What a click did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not playing, or the tile is already gone
    Ignored,
    /// Gold tile collected
    Scored { points: u64 },
    /// Sequence token fed to the tracker
    Sequence(SequenceStep),
    /// The click ended the run
    Fatal,
}

/// Apply a click between ticks
pub fn click(state: &mut GameState, id: TileId) -> ClickOutcome {
    if state.phase != GamePhase::Playing {
        return ClickOutcome::Ignored;
    }
    let Some(tile) = state.remove_tile(id, Removal::Clicked) else {
        return ClickOutcome::Ignored;
    };

    match tile.kind {
        TileKind::Plain => {
            state.lose(MissCause::PlainClicked { id });
            ClickOutcome::Fatal
        }
        TileKind::Scoring { .. } => {
            state.add_score(tile.points);
            ClickOutcome::Scored {
                points: tile.points,
            }
        }
        TileKind::SequenceToken { symbol } => {
            let step = state.sequence.feed(symbol);
            let len = state.sequence.len();
            match step {
                SequenceStep::Advanced { progress } => {
                    state.add_score(tile.points);
                    state.push_event(GameEvent::SequenceProgress { progress, len });
                }
                SequenceStep::Completed { cycle } => {
                    state.add_score(tile.points + state.settings.completion_bonus);
                    state.push_event(GameEvent::SequenceProgress { progress: len, len });
                    state.push_event(GameEvent::SequenceCompleted { cycle });
                    log::info!("Sequence completed (cycle {cycle}), score {}", state.score);
                    if state.settings.completion == CompletionPolicy::EndSession {
                        state.win();
                        return ClickOutcome::Sequence(step);
                    }
                    state.rewind_tokens();
                    state.push_event(GameEvent::SequenceProgress { progress: 0, len });
                }
                SequenceStep::Mismatch { expected, got } => {
                    state.push_event(GameEvent::WrongOrder { expected, got });
                    match state.settings.mismatch {
                        MismatchPolicy::EndSession => {
                            state.lose(MissCause::WrongOrder { expected, got });
                            return ClickOutcome::Fatal;
                        }
                        MismatchPolicy::ResetProgress => {
                            state.rewind_tokens();
                            state.push_event(GameEvent::SequenceProgress { progress: 0, len });
                        }
                    }
                }
            }
            ClickOutcome::Sequence(step)
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if state.phase != GamePhase::Playing {
        return;
    }

    // Clicks land before anything moves
    for &id in &input.clicks {
        click(state, id);
        if state.phase != GamePhase::Playing {
            return;
        }
    }

    if input.autoplay {
        let reach = state.settings.fail_boundary * AUTOPLAY_REACH;
        let targets: Vec<TileId> = state
            .tiles
            .iter()
            .filter(|t| t.kind.is_required() && t.y >= reach)
            .map(|t| t.id)
            .collect();
        for id in targets {
            click(state, id);
            if state.phase != GamePhase::Playing {
                return;
            }
        }
    }

    state.time_ticks += 1;

    let speed = state.speed;
    for tile in &mut state.tiles {
        tile.y += speed;
    }

    // Resolve crossings in creation order; the first required tile ends the run
    let boundary = state.settings.fail_boundary;
    let mut expired = Vec::new();
    let mut missed = None;
    for tile in &state.tiles {
        if tile.y <= boundary {
            continue;
        }
        if tile.kind.is_required() {
            missed = Some(tile.id);
            break;
        }
        expired.push(tile.id);
    }
    for id in expired {
        state.remove_tile(id, Removal::Expired);
    }
    if let Some(id) = missed {
        state.remove_tile(id, Removal::Missed);
        log::info!("Tile {} missed at tick {}", id.0, state.time_ticks);
        state.lose(MissCause::TileMissed { id });
        return;
    }

    state.fallen_since_row += speed;
    state.ticks_since_row += 1;
    if spawn::row_due(
        &state.settings,
        speed,
        state.fallen_since_row,
        state.ticks_since_row,
    ) {
        state.spawn_row();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Cadence, Settings};
    use crate::sim::state::Tile;
    use proptest::prelude::*;

    fn playing(settings: Settings) -> GameState {
        let mut state = GameState::new(12345, settings);
        state.begin();
        state
    }

    /// Replace the live set with hand-placed tiles
    fn place(state: &mut GameState, tiles: &[(u32, TileKind, u64, f32)]) {
        state.tiles = tiles
            .iter()
            .map(|&(id, kind, points, y)| Tile {
                id: TileId(id),
                kind,
                points,
                lane: 0,
                row: 0,
                y,
            })
            .collect();
    }

    fn token(symbol: char) -> TileKind {
        TileKind::SequenceToken { symbol }
    }

    fn abc() -> Settings {
        Settings {
            sequence: vec!['A', 'B', 'C'],
            token_chance: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_idle_run_ends_in_game_over() {
        let mut state = playing(Settings::default());
        let input = TickInput::default();
        for _ in 0..10_000 {
            tick(&mut state, &input);
            if state.phase != GamePhase::Playing {
                break;
            }
        }
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 0);
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::GameOver {
                cause: MissCause::TileMissed { .. }
            }
        )));
    }

    #[test]
    fn test_tiles_fall_by_speed() {
        let mut state = playing(abc());
        place(&mut state, &[(100, TileKind::Plain, 0, 0.0)]);
        tick(&mut state, &TickInput::default());
        assert!((state.tiles[0].y - 1.5).abs() < 1e-5);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_plain_tile_expires_silently() {
        let mut state = playing(abc());
        place(&mut state, &[(100, TileKind::Plain, 0, 399.0)]);
        state.drain_events();

        tick(&mut state, &TickInput::default());
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.tile(TileId(100)).is_none());
        assert!(state.drain_events().contains(&GameEvent::TileRemoved {
            id: TileId(100),
            reason: Removal::Expired,
        }));
    }

    #[test]
    fn test_first_fatal_crossing_wins() {
        let mut state = playing(abc());
        place(
            &mut state,
            &[
                (100, TileKind::Plain, 0, 399.5),
                (101, TileKind::Scoring { glyph: '$' }, 10, 399.5),
                (102, token('A'), 20, 399.5),
            ],
        );
        tick(&mut state, &TickInput::default());
        assert_eq!(state.phase, GamePhase::GameOver);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::GameOver {
            cause: MissCause::TileMissed { id: TileId(101) }
        }));
        assert!(state.tiles.is_empty());
    }

    #[test]
    fn test_missed_token_is_fatal() {
        let mut state = playing(abc());
        place(&mut state, &[(100, token('A'), 20, 400.0)]);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_click_gold_scores() {
        let mut state = playing(abc());
        place(&mut state, &[(100, TileKind::Scoring { glyph: '￥' }, 10, 50.0)]);
        assert_eq!(
            click(&mut state, TileId(100)),
            ClickOutcome::Scored { points: 10 }
        );
        assert_eq!(state.score, 10);
        assert!(state.tiles.is_empty());
    }

    #[test]
    fn test_click_twice_is_noop() {
        let mut state = playing(abc());
        place(&mut state, &[(100, TileKind::Scoring { glyph: '$' }, 10, 50.0)]);
        click(&mut state, TileId(100));
        assert_eq!(click(&mut state, TileId(100)), ClickOutcome::Ignored);
        assert_eq!(click(&mut state, TileId(999)), ClickOutcome::Ignored);
        assert_eq!(state.score, 10);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_click_plain_is_fatal() {
        let mut state = playing(abc());
        place(&mut state, &[(100, TileKind::Plain, 0, 50.0)]);
        assert_eq!(click(&mut state, TileId(100)), ClickOutcome::Fatal);
        assert_eq!(state.phase, GamePhase::GameOver);
        // Clicks after the run ended are ignored
        assert_eq!(click(&mut state, TileId(100)), ClickOutcome::Ignored);
    }

    #[test]
    fn test_sequence_completion_wins() {
        let mut state = playing(abc());
        place(
            &mut state,
            &[
                (100, token('A'), 20, 0.0),
                (101, token('B'), 40, 0.0),
                (102, token('C'), 60, 0.0),
            ],
        );
        click(&mut state, TileId(100));
        assert_eq!(state.sequence.progress(), 1);
        click(&mut state, TileId(101));
        assert_eq!(state.sequence.progress(), 2);
        assert_eq!(
            click(&mut state, TileId(102)),
            ClickOutcome::Sequence(SequenceStep::Completed { cycle: 1 })
        );
        assert_eq!(state.sequence.progress(), 0);
        assert_eq!(state.phase, GamePhase::Won);
        assert_eq!(state.score, 120);

        let completions = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::SequenceCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_repeat_completion_keeps_playing() {
        let mut state = playing(Settings {
            completion: CompletionPolicy::Repeat,
            completion_bonus: 500,
            ..abc()
        });
        place(
            &mut state,
            &[
                (100, token('A'), 20, 0.0),
                (101, token('B'), 20, 0.0),
                (102, token('C'), 20, 0.0),
            ],
        );
        for id in 100..103 {
            click(&mut state, TileId(id));
        }
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 560);
        assert_eq!(state.sequence.completions(), 1);
    }

    #[test]
    fn test_mismatch_resets_progress() {
        let mut state = playing(abc());
        place(
            &mut state,
            &[(100, token('A'), 20, 0.0), (101, token('C'), 60, 0.0)],
        );
        click(&mut state, TileId(100));
        assert_eq!(state.sequence.progress(), 1);
        state.drain_events();

        click(&mut state, TileId(101));
        assert_eq!(state.sequence.progress(), 0);
        assert_eq!(state.phase, GamePhase::Playing);
        // No credit for the wrong symbol
        assert_eq!(state.score, 20);
        assert!(state.drain_events().contains(&GameEvent::WrongOrder {
            expected: 'B',
            got: 'C'
        }));
    }

    fn token_id(state: &GameState, symbol: char) -> TileId {
        state
            .tiles
            .iter()
            .find(|t| t.kind == token(symbol))
            .map(|t| t.id)
            .expect("token is live")
    }

    fn live_symbols(state: &GameState) -> Vec<char> {
        state
            .tiles
            .iter()
            .filter_map(|t| match t.kind {
                TileKind::SequenceToken { symbol } => Some(symbol),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_tokens_reissued_after_mismatch() {
        let mut state = playing(Settings {
            sequence: vec!['A', 'B', 'C', 'D'],
            token_chance: 1.0,
            ..Default::default()
        });
        state.spawn_row();
        state.spawn_row();
        assert_eq!(live_symbols(&state), vec!['A', 'B', 'C']);

        let first = token_id(&state, 'A');
        click(&mut state, first);
        let wrong = token_id(&state, 'C');
        click(&mut state, wrong);
        assert_eq!(state.sequence.expected(), Some('A'));

        // Stale 'B' still falling; the next row starts the sequence over
        let row = state.spawn_row();
        let issued: Vec<_> = row.tokens().map(|t| t.kind).collect();
        assert_eq!(issued, vec![token('A')]);
        let row = state.spawn_row();
        let issued: Vec<_> = row.tokens().map(|t| t.kind).collect();
        assert_eq!(issued, vec![token('B')]);
        assert_eq!(live_symbols(&state), vec!['B', 'A', 'B']);

        // The fresh tokens complete the sequence in creation order
        let fresh_a = token_id(&state, 'A');
        assert_eq!(
            click(&mut state, fresh_a),
            ClickOutcome::Sequence(SequenceStep::Advanced { progress: 1 })
        );
    }

    #[test]
    fn test_mismatch_can_end_session() {
        let mut state = playing(Settings {
            mismatch: MismatchPolicy::EndSession,
            ..abc()
        });
        place(
            &mut state,
            &[(100, token('A'), 20, 0.0), (101, token('C'), 60, 0.0)],
        );
        click(&mut state, TileId(100));
        assert_eq!(click(&mut state, TileId(101)), ClickOutcome::Fatal);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_clicks_apply_before_movement() {
        let mut state = playing(abc());
        place(&mut state, &[(100, TileKind::Scoring { glyph: '$' }, 10, 399.9)]);
        let input = TickInput {
            clicks: vec![TileId(100)],
            ..Default::default()
        };
        tick(&mut state, &input);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 10);
    }

    #[test]
    fn test_spacing_cadence_never_overlaps() {
        let mut state = playing(Settings::default());
        let input = TickInput {
            autoplay: true,
            ..Default::default()
        };
        for _ in 0..3_000 {
            tick(&mut state, &input);
            if state.phase != GamePhase::Playing {
                break;
            }
            let mut rows: Vec<(u32, f32)> = state.tiles.iter().map(|t| (t.row, t.y)).collect();
            rows.sort_by_key(|r| r.0);
            rows.dedup_by_key(|r| r.0);
            for pair in rows.windows(2) {
                assert!(pair[0].1 - pair[1].1 >= state.settings.tile_height - 1e-3);
            }
        }
    }

    #[test]
    fn test_interval_cadence_spawns() {
        let mut state = playing(Settings {
            cadence: Cadence::Interval { base_ticks: 80 },
            ..abc()
        });
        let input = TickInput {
            autoplay: true,
            ..Default::default()
        };
        for _ in 0..80 {
            tick(&mut state, &input);
        }
        assert_eq!(state.rows_spawned, 2);
    }

    #[test]
    fn test_autoplay_collects_sequence() {
        let mut state = playing(Settings::default());
        let input = TickInput {
            autoplay: true,
            ..Default::default()
        };
        for _ in 0..200_000 {
            tick(&mut state, &input);
            if state.phase != GamePhase::Playing {
                break;
            }
        }
        assert_eq!(state.phase, GamePhase::Won);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = playing(Settings::default());
        let mut state2 = playing(Settings::default());
        let input = TickInput {
            autoplay: true,
            ..Default::default()
        };

        for _ in 0..2_000 {
            tick(&mut state1, &input);
            tick(&mut state2, &input);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.tiles, state2.tiles);
    }

    proptest! {
        #[test]
        fn prop_score_and_speed_never_drop(seed in any::<u64>(), picks in proptest::collection::vec(0usize..8, 1..400)) {
            let mut state = GameState::new(seed, Settings::default());
            state.begin();
            let mut last_score = 0;
            let mut last_speed = state.speed;
            for pick in picks {
                let clicks = state.tiles.get(pick).map(|t| vec![t.id]).unwrap_or_default();
                tick(&mut state, &TickInput { clicks, autoplay: false });
                prop_assert!(state.score >= last_score);
                prop_assert!(state.speed >= last_speed);
                prop_assert!(state.sequence.progress() < state.sequence.len());
                last_score = state.score;
                last_speed = state.speed;
                if state.phase != GamePhase::Playing {
                    break;
                }
            }
        }
    }
}
