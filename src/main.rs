//! Gold Tiles entry point
//!
//! On the web this only sets up logging; the page drives `WebGame`. Natively
//! it plays one headless autoplay run and prints the leaderboard.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
    }
    log::info!("Gold Tiles starting...");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use gold_tiles::consts::SIM_DT;
    use gold_tiles::highscores::{SortKey, format_time};
    use gold_tiles::persistence::{FixedName, LeaderboardStore, LocalBestScore};
    use gold_tiles::platform::{FlagDriver, ManualClock};
    use gold_tiles::sim::{GameEvent, TickInput};
    use gold_tiles::{Collaborators, Session, Settings};

    /// Give up on a run that never ends
    const MAX_TICKS: u32 = 100_000;

    env_logger::init();
    log::info!("Gold Tiles (native) starting...");
    log::info!("Headless autoplay demo; build for wasm32 to play in a browser");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(7);

    let driver = FlagDriver::new();
    let clock = ManualClock::new(0.0);
    let collab = Collaborators {
        scores: Box::new(LeaderboardStore::new().with_origin("127.0.0.1")),
        best: Box::new(LocalBestScore::new()),
        names: Box::new(FixedName(None)),
        clock: Box::new(clock.clone()),
        driver: Box::new(driver.clone()),
    };
    let mut session = match Session::new(Settings::default(), collab) {
        Ok(session) => session,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let input = TickInput {
        autoplay: true,
        ..Default::default()
    };
    session.start(seed);
    let mut ticks = 0;
    while driver.is_running() && ticks < MAX_TICKS {
        clock.advance(SIM_DT * 1000.0);
        session.frame(&input);
        ticks += 1;

        for event in session.drain_events() {
            match event {
                GameEvent::SequenceProgress { progress, len } => {
                    log::debug!("Sequence {progress}/{len}");
                }
                GameEvent::SequenceCompleted { cycle } => {
                    log::info!("Sequence completed (cycle {cycle})");
                }
                GameEvent::GameOver { cause } => log::info!("Game over: {cause:?}"),
                GameEvent::Won => log::info!("Won!"),
                _ => {}
            }
        }
    }
    if session.is_running() {
        log::warn!("Run still going after {MAX_TICKS} ticks, ending it");
        session.end(false);
    }

    session.flush_submissions();
    let hud = session.hud();
    println!(
        "Seed {seed}: {} points, sequence {}/{}, {}",
        hud.score,
        hud.progress,
        hud.sequence_len,
        format_time(hud.elapsed_secs)
    );
    for (i, entry) in session.leaderboard(SortKey::Score).iter().enumerate() {
        println!(
            "{:>2}. {:<16} {:>6} {:>6}",
            i + 1,
            entry.player_name,
            entry.score,
            format_time(entry.time_secs)
        );
    }
}
