use bracket_lib::prelude::{BTerm, GameState, VirtualKeyCode};
use common::{GameResult, ViewMode};
use ui::{ColorPalette, Renderer};

use crate::config::GameConfig;
use crate::input::InputConfig;
use crate::leaderboard::Leaderboard;
use crate::session::{Command, GameSession};

pub enum AppState {
    Title,
    Running(Box<GameSession>),
    Leaderboard,
}

pub struct AfterhoursApp {
    state: AppState,
    config: GameConfig,
    input: InputConfig,
    renderer: Renderer,
    leaderboard: Leaderboard,
}

impl AfterhoursApp {
    pub fn new(config: GameConfig) -> Self {
        let palette = if config.colorblind {
            ColorPalette::colorblind()
        } else {
            ColorPalette::default()
        };
        Self {
            state: AppState::Title,
            input: InputConfig::from_bindings(&config.input),
            config,
            renderer: Renderer::new(palette),
            leaderboard: Leaderboard::default(),
        }
    }

    /// Loads the configured level (or the bundled one) into a new session.
    fn start(&mut self) -> GameResult<GameSession> {
        let (level, scripts) = match &self.config.level {
            Some(paths) => data::load_files(&paths.image, &paths.manifest, &paths.scripts)?,
            None => data::load_embedded()?,
        };
        let mut session = GameSession::from_level(level, scripts, &self.config)?;
        session.set_leaderboard(std::mem::take(&mut self.leaderboard));
        self.renderer.reset();
        self.renderer.present(&session.drain_notifications());
        Ok(session)
    }

    /// Applies one frame of input. Returns `true` when the player quits.
    fn update_state(&mut self, key: Option<VirtualKeyCode>, click: bool) -> bool {
        use VirtualKeyCode::*;
        match &mut self.state {
            AppState::Title => match key {
                Some(Return) | Some(Space) => match self.start() {
                    Ok(session) => self.state = AppState::Running(Box::new(session)),
                    Err(e) => tracing::error!("failed to start level: {}", e),
                },
                Some(k) if k == self.input.quit => return true,
                _ => {}
            },
            AppState::Running(session) => {
                match key {
                    Some(k) if k == self.input.quit => return true,
                    Some(k) if k == self.input.scroll_up => self.renderer.scroll_up(),
                    Some(k) if k == self.input.scroll_down => self.renderer.scroll_down(),
                    Some(k) => {
                        if let Some(cmd) = self.input.command(k) {
                            session.handle(cmd);
                        }
                    }
                    None if click => {
                        session.handle(Command::Continue);
                    }
                    None => {}
                }
                self.renderer.present(&session.drain_notifications());
                if session.view() == ViewMode::Leaderboard {
                    self.leaderboard = session.take_leaderboard();
                    self.state = AppState::Leaderboard;
                }
            }
            AppState::Leaderboard => match key {
                Some(Return) => self.state = AppState::Title,
                Some(k) if k == self.input.quit => return true,
                _ => {}
            },
        }
        false
    }
}

impl Default for AfterhoursApp {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl GameState for AfterhoursApp {
    fn tick(&mut self, ctx: &mut BTerm) {
        let quit = self.update_state(ctx.key, ctx.left_click);
        if quit {
            ctx.quit();
            return;
        }
        match &self.state {
            AppState::Title => {
                ctx.cls();
                ctx.print_centered(8, "AFTERHOURS");
                ctx.print_centered(10, "The office is dark. Back up the data and get out.");
                ctx.print_centered(13, "Press Enter to start, Q to Quit");
            }
            AppState::Running(session) => self.renderer.draw(ctx, session.grid()),
            AppState::Leaderboard => self
                .renderer
                .draw_leaderboard(ctx, self.leaderboard.runs(), self.leaderboard.best()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Notification;

    fn running() -> AfterhoursApp {
        let mut app = AfterhoursApp::default();
        app.update_state(Some(VirtualKeyCode::Return), false);
        app
    }

    #[test]
    fn enter_from_title_starts_game() {
        let app = running();
        match &app.state {
            AppState::Running(session) => {
                assert_eq!(session.player_pos(), app.renderer.player().unwrap());
            }
            _ => panic!("did not start game"),
        }
        // intro dialog is showing
        assert!(app.renderer.dialog().is_some());
    }

    #[test]
    fn quit_key_quits() {
        let mut app = AfterhoursApp::default();
        assert!(app.update_state(Some(VirtualKeyCode::Q), false));
        let mut app = running();
        assert!(app.update_state(Some(VirtualKeyCode::Q), false));
    }

    #[test]
    fn click_advances_dialog() {
        let mut app = running();
        let before = app.renderer.dialog().cloned();
        app.update_state(None, true);
        assert_ne!(app.renderer.dialog().cloned(), before);
    }

    #[test]
    fn escape_then_move_walks() {
        let mut app = running();
        app.update_state(Some(VirtualKeyCode::Escape), false);
        assert!(app.renderer.dialog().is_none());
        app.update_state(Some(VirtualKeyCode::Down), false);
        match &app.state {
            AppState::Running(session) => {
                assert_eq!(session.moves(), 1);
                assert!(session.audio().is_unlocked());
            }
            _ => panic!("left running state"),
        }
    }

    #[test]
    fn page_keys_scroll_the_log() {
        let mut app = running();
        let notes: Vec<Notification> = (0..8)
            .map(|i| Notification::Prompt(format!("{}", i)))
            .collect();
        app.renderer.present(&notes);
        app.update_state(Some(VirtualKeyCode::PageUp), false);
        assert_eq!(app.renderer.visible_logs().last().map(String::as_str), Some("6"));
        app.update_state(Some(VirtualKeyCode::PageDown), false);
        assert_eq!(app.renderer.visible_logs().last().map(String::as_str), Some("7"));
        // scrolling is not a dialog command
        assert!(app.renderer.dialog().is_some());
    }

    #[test]
    fn leaderboard_return_goes_to_title() {
        let mut app = AfterhoursApp {
            state: AppState::Leaderboard,
            ..AfterhoursApp::default()
        };
        app.update_state(Some(VirtualKeyCode::Return), false);
        assert!(matches!(app.state, AppState::Title));
    }
}
