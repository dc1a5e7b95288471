//! Game engine entry point.

mod app;
pub mod config;
mod cutscene;
pub mod entity;
pub mod input;
mod interact;
mod level;
pub mod leaderboard;
mod session;

use bracket_lib::prelude::{main_loop, BError, BTermBuilder};

pub use app::AfterhoursApp;
pub use config::{GameConfig, MoveCountPolicy};
pub use leaderboard::Leaderboard;
pub use session::{Command, GameSession, Handler, MoveOutcome};

const CONFIG_PATH: &str = "afterhours.toml";

/// Opens the terminal and runs the title/play/leaderboard loop.
pub fn run() -> BError {
    let config = GameConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        tracing::warn!("ignoring {}: {}", CONFIG_PATH, e);
        GameConfig::default()
    });
    tracing::info!("starting with move counting {:?}", config.move_count);
    let context = BTermBuilder::simple(80, 25)?
        .with_title("Afterhours")
        .build()?;
    main_loop(context, AfterhoursApp::new(config))
}
