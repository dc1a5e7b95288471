//! Presentation adapter.
//!
//! [`Renderer`] is the only thing that touches the terminal. It keeps its own
//! view model, updated from engine [`Notification`]s, and reads the grid only
//! for static walls.
use std::collections::BTreeMap;

use bracket_lib::prelude::{
    to_cp437, BTerm, BLACK, CYAN, GRAY, GREEN, MAGENTA, NAVY, ORANGE, RED, RGB, WHITE, YELLOW,
};
use common::{Coord, EntityId, Feedback, Notification, Presenter, Side, ViewMode};
use grid::{Grid, Walls};

/// Color palette for map and entity rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorPalette {
    pub floor: RGB,
    pub wall: RGB,
    pub player: RGB,
    pub item: RGB,
    pub door: RGB,
    pub system: RGB,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            floor: RGB::named(GRAY),
            wall: RGB::named(NAVY),
            player: RGB::named(YELLOW),
            item: RGB::named(CYAN),
            door: RGB::named(RED),
            system: RGB::named(GREEN),
        }
    }
}

impl ColorPalette {
    /// Returns a high contrast palette suitable for colorblind players.
    pub fn colorblind() -> Self {
        Self {
            floor: RGB::named(WHITE),
            wall: RGB::named(GRAY),
            player: RGB::named(YELLOW),
            item: RGB::named(WHITE),
            door: RGB::named(ORANGE),
            system: RGB::named(MAGENTA),
        }
    }
}

const MAP_X: i32 = 1;
const MAP_Y: i32 = 1;
const LOG_Y: i32 = 17;
const LOG_WINDOW: i32 = 5;
const DIALOG_Y: i32 = 23;
const SCREEN_WIDTH: i32 = 80;

/// Message log and current view.
pub struct UIContext {
    logs: Vec<String>,
    scroll: usize,
    view: ViewMode,
}

impl Default for UIContext {
    fn default() -> Self {
        Self {
            logs: Vec::new(),
            scroll: 0,
            view: ViewMode::Gameplay,
        }
    }
}

impl UIContext {
    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Adds a message to the log queue.
    pub fn add_log(&mut self, msg: &str) {
        tracing::debug!("log: {}", msg);
        self.logs.push(msg.to_string());
    }

    /// Scrolls log view one line up.
    pub fn scroll_up(&mut self) {
        if self.scroll + (LOG_WINDOW as usize) < self.logs.len() {
            self.scroll += 1;
        }
    }

    /// Scrolls log view one line down.
    pub fn scroll_down(&mut self) {
        if self.scroll > 0 {
            self.scroll -= 1;
        }
    }

    /// Lines currently inside the log window.
    pub fn visible_logs(&self) -> &[String] {
        let start = self
            .logs
            .len()
            .saturating_sub(LOG_WINDOW as usize + self.scroll);
        let end = std::cmp::min(start + LOG_WINDOW as usize, self.logs.len());
        &self.logs[start..end]
    }

    fn draw_logs(&self, ctx: &mut BTerm) {
        for (i, line) in self.visible_logs().iter().enumerate() {
            ctx.print(MAP_X, LOG_Y + i as i32, line);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Sprite {
    name: String,
    at: Coord,
    /// Unlocked door or booted system.
    active: bool,
}

/// The line currently shown in the dialog box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShownLine {
    pub side: Side,
    pub speaker: String,
    pub text: String,
}

/// Notification-driven terminal renderer.
pub struct Renderer {
    ui: UIContext,
    palette: ColorPalette,
    width: u32,
    height: u32,
    sprites: BTreeMap<EntityId, Sprite>,
    player: Option<Coord>,
    inventory: Vec<(EntityId, String)>,
    light: Vec<u8>,
    /// Set once any light level arrives; until then the map is drawn fully lit.
    dark: bool,
    dialog: Option<ShownLine>,
    won: Option<u32>,
}

impl Renderer {
    pub fn new(palette: ColorPalette) -> Self {
        Self {
            ui: UIContext::default(),
            palette,
            width: 0,
            height: 0,
            sprites: BTreeMap::new(),
            player: None,
            inventory: Vec::new(),
            light: Vec::new(),
            dark: false,
            dialog: None,
            won: None,
        }
    }

    /// Clears everything but the palette, ready for a new level.
    pub fn reset(&mut self) {
        *self = Self::new(self.palette);
    }

    /// Forwards a batch of notifications in order.
    pub fn present(&mut self, notes: &[Notification]) {
        for note in notes {
            self.notify(note);
        }
    }

    pub fn scroll_up(&mut self) {
        self.ui.scroll_up();
    }

    pub fn scroll_down(&mut self) {
        self.ui.scroll_down();
    }

    pub fn visible_logs(&self) -> &[String] {
        self.ui.visible_logs()
    }

    pub fn view(&self) -> ViewMode {
        self.ui.view()
    }

    pub fn player(&self) -> Option<Coord> {
        self.player
    }

    pub fn dialog(&self) -> Option<&ShownLine> {
        self.dialog.as_ref()
    }

    pub fn won(&self) -> Option<u32> {
        self.won
    }

    pub fn inventory_strings(&self) -> Vec<String> {
        inventory_strings(&self.inventory)
    }

    /// Names of the sprites in a cell, in arrival order of notifications.
    pub fn sprites_at(&self, at: Coord) -> Vec<&str> {
        self.sprites
            .values()
            .filter(|s| s.at == at)
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn light(&self, at: Coord) -> u8 {
        self.light_idx(at).map_or(0, |i| self.light[i])
    }

    fn light_idx(&self, at: Coord) -> Option<usize> {
        let inside = at.row >= 0
            && at.col >= 0
            && at.row < self.height as i32
            && at.col < self.width as i32;
        inside.then(|| at.row as usize * self.width as usize + at.col as usize)
    }

    /// Draws the gameplay view.
    pub fn draw(&self, ctx: &mut BTerm, grid: &Grid) {
        ctx.cls();
        if self.ui.view() == ViewMode::Leaderboard {
            return;
        }
        for cell in grid.cells() {
            let at = cell.coord();
            let glyph = if cell.walls() == Walls::all() { '#' } else { '.' };
            let color = if glyph == '#' {
                self.palette.wall
            } else {
                self.palette.floor
            };
            self.put(ctx, at, glyph, color);
        }
        for sprite in self.sprites.values() {
            let color = match sprite.name.as_str() {
                "exit" | "door" => self.palette.door,
                "system" => self.palette.system,
                _ => self.palette.item,
            };
            self.put(ctx, sprite.at, glyph(&sprite.name, sprite.active), color);
        }
        if let Some(at) = self.player {
            self.put(ctx, at, '@', self.palette.player);
        }
        let panel_x = MAP_X + self.width as i32 + 2;
        ctx.print(panel_x, MAP_Y, "Inventory");
        for (i, line) in self.inventory_strings().iter().enumerate() {
            ctx.print(panel_x, MAP_Y + 1 + i as i32, line);
        }
        self.ui.draw_logs(ctx);
        if let Some(line) = &self.dialog {
            let text = format!("{}: {}", line.speaker, line.text);
            let x = match line.side {
                Side::Left => MAP_X,
                Side::Right => (SCREEN_WIDTH - 1 - text.len() as i32).max(0),
            };
            ctx.print_color(x, DIALOG_Y, RGB::named(WHITE), RGB::named(NAVY), text);
            ctx.print(MAP_X, DIALOG_Y + 1, "[space] continue  [esc] skip");
        }
    }

    /// Draws the end-of-level leaderboard.
    pub fn draw_leaderboard(&self, ctx: &mut BTerm, runs: &[u32], best: Option<u32>) {
        ctx.cls();
        ctx.print_centered(4, "Lights out. You made it home.");
        for (i, line) in summary_strings(self.won, best).iter().enumerate() {
            ctx.print_centered(6 + i as i32, line);
        }
        ctx.print_centered(9, "Best runs");
        for (i, line) in leaderboard_strings(runs).iter().enumerate() {
            ctx.print_centered(10 + i as i32, line);
        }
        ctx.print_centered(22, "Press Enter for Title, Q to Quit");
    }

    fn put(&self, ctx: &mut BTerm, at: Coord, glyph: char, color: RGB) {
        let color = if self.dark {
            shade(color, self.light(at))
        } else {
            color
        };
        ctx.set(
            MAP_X + at.col,
            MAP_Y + at.row,
            color,
            RGB::named(BLACK),
            to_cp437(glyph),
        );
    }
}

impl Presenter for Renderer {
    fn notify(&mut self, note: &Notification) {
        match note {
            Notification::LevelLoaded { width, height } => {
                self.width = *width;
                self.height = *height;
                self.light = vec![0; (*width * *height) as usize];
                self.ui.set_view(ViewMode::Gameplay);
            }
            Notification::ItemPlaced { id, name, at } => {
                self.sprites.insert(
                    *id,
                    Sprite {
                        name: name.clone(),
                        at: *at,
                        active: false,
                    },
                );
            }
            Notification::PlayerMoved { to, .. } => self.player = Some(*to),
            Notification::ItemRemoved { id, .. } => {
                self.sprites.remove(id);
            }
            Notification::ItemCollected { id, name } => {
                self.inventory.push((*id, name.clone()));
                self.ui.add_log(&format!("Picked up {}.", name));
            }
            Notification::ItemConsumed { id, name } => {
                self.inventory.retain(|(i, _)| i != id);
                self.ui.add_log(&format!("Used {}.", name));
            }
            Notification::DoorUnlocked { id, .. } => {
                if let Some(s) = self.sprites.get_mut(id) {
                    s.active = true;
                }
                self.ui.add_log("The lock clicks open.");
            }
            Notification::SystemBooted { id, .. } => {
                if let Some(s) = self.sprites.get_mut(id) {
                    s.active = true;
                }
                self.ui.add_log("The system hums to life. Backup running.");
            }
            Notification::Furnished { name, .. } => {
                self.ui.add_log(&format!("You look at the {}.", name));
            }
            Notification::LightChanged { at, level } => {
                if let Some(i) = self.light_idx(*at) {
                    self.light[i] = *level;
                    self.dark = true;
                }
            }
            Notification::Feedback(Feedback::Locked) => self.ui.add_log("It's locked."),
            Notification::Feedback(Feedback::Bump) => {}
            Notification::Prompt(text) => self.ui.add_log(text),
            Notification::DialogLine {
                side,
                speaker,
                text,
            } => {
                self.dialog = Some(ShownLine {
                    side: *side,
                    speaker: speaker.clone(),
                    text: text.clone(),
                });
            }
            Notification::DialogClosed => self.dialog = None,
            Notification::ViewChanged(view) => self.ui.set_view(*view),
            Notification::Won { moves } => {
                self.won = Some(*moves);
                self.ui.add_log(&format!("Finished in {} moves.", moves));
            }
        }
    }
}

/// Dims a color by light level; unlit cells keep a faint outline.
fn shade(color: RGB, level: u8) -> RGB {
    let factor = (level as f32 / 75.0).clamp(0.15, 1.0);
    color * factor
}

fn glyph(name: &str, active: bool) -> char {
    match name {
        "keys" => 'k',
        "flashlight" => 'f',
        "data" => 'd',
        "exit" | "door" if active => '/',
        "exit" | "door" => '+',
        "system" if active => 'S',
        "system" => 's',
        "filing-cabinet" => 'C',
        "desk" => 'T',
        "couch" => 'h',
        "window" => 'W',
        _ => '*',
    }
}

fn inventory_strings(items: &[(EntityId, String)]) -> Vec<String> {
    if items.is_empty() {
        vec!["(empty)".to_string()]
    } else {
        items.iter().map(|(_, name)| name.clone()).collect()
    }
}

fn summary_strings(won: Option<u32>, best: Option<u32>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(moves) = won {
        lines.push(format!("This run: {} moves", moves));
    }
    match (won, best) {
        (Some(moves), Some(best)) if moves <= best => lines.push("New best!".to_string()),
        (_, Some(best)) => lines.push(format!("Best: {} moves", best)),
        _ => {}
    }
    lines
}

fn leaderboard_strings(runs: &[u32]) -> Vec<String> {
    if runs.is_empty() {
        return vec!["(no runs yet)".to_string()];
    }
    runs.iter()
        .enumerate()
        .map(|(i, moves)| format!("{:>2}. {} moves", i + 1, moves))
        .collect()
}
