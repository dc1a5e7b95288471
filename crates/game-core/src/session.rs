//! Per-level game session and the move state machine.

use audio::AudioManager;
use common::{Coord, Direction, EntityId, Feedback, GameError, GameResult, Notification, ViewMode};
use data::DialogScripts;
use dialog::{Dialog, HandlerStack};
use grid::Grid;
use lighting::LightMap;

use crate::config::{GameConfig, MoveCountPolicy};
use crate::entity::{Entities, Item, ItemKind, Player, PLAYER};
use crate::interact::Source;
use crate::leaderboard::Leaderboard;

/// Input surface of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    /// Advance the active dialog.
    Continue,
    /// Abandon the active dialog.
    Dismiss,
}

/// Entry kinds on the input handler stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handler {
    Movement,
    Dialog,
}

/// Phases of a single move attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MovePhase {
    Idle,
    LeavingCell,
    CheckingEntry,
    Resolved,
}

/// Result of a move attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing was attempted.
    Idle,
    /// The current cell has a wall on that side.
    Walled,
    /// The candidate cell is outside the grid.
    OffGrid,
    /// An item in the candidate cell refused entry.
    Blocked,
    Moved { from: Coord, to: Coord },
}

/// Owns everything one level of play needs.
pub struct GameSession {
    pub(crate) grid: Grid,
    pub(crate) entities: Entities,
    pub(crate) moves: u32,
    pub(crate) policy: MoveCountPolicy,
    pub(crate) light: LightMap,
    pub(crate) handlers: HandlerStack<Handler>,
    pub(crate) dialog: Option<Dialog>,
    pub(crate) scripts: DialogScripts,
    pub(crate) audio: AudioManager,
    pub(crate) leaderboard: Leaderboard,
    pub(crate) view: ViewMode,
    pub(crate) won: bool,
    /// Script queued by furniture, started once the move resolves.
    pub(crate) pending_script: Option<String>,
    pub(crate) outbox: Vec<Notification>,
    /// Drained after `outbox`.
    pub(crate) deferred: Vec<Notification>,
}

impl GameSession {
    /// Creates a session on an already built grid with the player at `start`.
    pub fn new(mut grid: Grid, start: Coord, config: &GameConfig) -> GameResult<Self> {
        grid.push_item(start, PLAYER)?;
        let mut handlers = HandlerStack::new();
        handlers.push(Handler::Movement);
        let light = LightMap::new(grid.width(), grid.height());
        let outbox = vec![
            Notification::LevelLoaded {
                width: grid.width(),
                height: grid.height(),
            },
            Notification::PlayerMoved {
                from: start,
                to: start,
            },
        ];
        Ok(Self {
            grid,
            entities: Entities::new(start),
            moves: 0,
            policy: config.move_count,
            light,
            handlers,
            dialog: None,
            scripts: DialogScripts::default(),
            audio: AudioManager::new(config.volume),
            leaderboard: Leaderboard::default(),
            view: ViewMode::Gameplay,
            won: false,
            pending_script: None,
            outbox,
            deferred: Vec::new(),
        })
    }

    /// Routes a command to the handler on top of the stack.
    pub fn handle(&mut self, cmd: Command) -> MoveOutcome {
        self.audio.unlock();
        match (self.handlers.top().copied(), cmd) {
            (Some(Handler::Dialog), Command::Continue) => {
                self.advance_dialog();
                MoveOutcome::Idle
            }
            (Some(Handler::Dialog), Command::Dismiss) => {
                self.dismiss_dialog();
                MoveOutcome::Idle
            }
            (Some(Handler::Dialog), Command::Move(dir)) => {
                tracing::trace!("dialog swallowed move {:?}", dir);
                MoveOutcome::Idle
            }
            (Some(Handler::Movement), Command::Move(dir)) => self.try_move(Some(dir)),
            _ => MoveOutcome::Idle,
        }
    }

    /// Runs one move attempt through the phase machine.
    pub fn try_move(&mut self, dir: Option<Direction>) -> MoveOutcome {
        let Some(dir) = dir else {
            return MoveOutcome::Idle;
        };
        if self.won {
            tracing::debug!("ignoring move after win");
            return MoveOutcome::Idle;
        }
        trace_phase(MovePhase::Idle, dir);
        let from = self.entities.player().pos;

        trace_phase(MovePhase::LeavingCell, dir);
        let walls = match self.grid.walls(from) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!("player stands outside the grid: {}", e);
                return MoveOutcome::Idle;
            }
        };
        if walls.blocks(dir) {
            self.outbox.push(Notification::Feedback(Feedback::Bump));
            return MoveOutcome::Walled;
        }

        trace_phase(MovePhase::CheckingEntry, dir);
        let to = from.step(dir);
        let snapshot: Vec<EntityId> = match self.grid.cell_at(to.row, to.col) {
            Ok(cell) => cell.items().iter().copied().filter(|id| *id != PLAYER).collect(),
            Err(GameError::OutOfBounds { row, col }) => {
                tracing::debug!("move to ({}, {}) is off the grid", row, col);
                self.outbox.push(Notification::Feedback(Feedback::Bump));
                return MoveOutcome::OffGrid;
            }
            Err(e) => {
                tracing::warn!("cannot resolve candidate cell: {}", e);
                return MoveOutcome::Idle;
            }
        };
        let had_flashlight = self.has_item("flashlight");
        let blocked = self.dispatch(to, Source::Cell(to), &snapshot);
        if self.policy == MoveCountPolicy::Attempts {
            self.moves += 1;
        }

        trace_phase(MovePhase::Resolved, dir);
        let outcome = if blocked {
            if !had_flashlight && self.has_item("flashlight") {
                self.relight(None, from);
            }
            MoveOutcome::Blocked
        } else {
            match self.commit(from, to) {
                Ok(()) => {
                    if self.policy == MoveCountPolicy::Commits {
                        self.moves += 1;
                    }
                    self.relight(Some(from), to);
                    MoveOutcome::Moved { from, to }
                }
                Err(e) => {
                    tracing::warn!("could not commit move: {}", e);
                    MoveOutcome::Blocked
                }
            }
        };
        self.check_terminal();
        if let Some(script) = self.pending_script.take() {
            if !self.won {
                self.start_dialog(&script);
            }
        }
        outcome
    }

    fn commit(&mut self, from: Coord, to: Coord) -> GameResult<()> {
        self.grid.remove_item(from, PLAYER)?;
        self.grid.push_item(to, PLAYER)?;
        self.entities.player_mut().pos = to;
        self.outbox.push(Notification::PlayerMoved { from, to });
        Ok(())
    }

    fn relight(&mut self, left: Option<Coord>, entered: Coord) {
        let writes = lighting::reveal(&self.grid, left, entered, self.has_item("flashlight"));
        self.light.apply(&writes);
        self.outbox.extend(writes.iter().map(|w| Notification::LightChanged {
            at: w.at,
            level: w.level,
        }));
    }

    /// Fires the win once the player stands on an open exit with every
    /// system booted. Returns `true` only on the firing call.
    pub fn check_terminal(&mut self) -> bool {
        if self.won {
            return false;
        }
        let pos = self.entities.player().pos;
        let on_exit = self.grid.items(pos).is_ok_and(|ids| {
            ids.iter()
                .filter_map(|id| self.entities.item(*id))
                .any(Item::is_open_exit)
        });
        let systems_booted = self
            .entities
            .items()
            .all(|(_, item)| !matches!(item.kind, ItemKind::System { booted: false }));
        if !(on_exit && systems_booted) {
            return false;
        }
        self.won = true;
        tracing::info!("level finished in {} moves", self.moves);
        self.audio.play_effect("win");
        self.view = ViewMode::Leaderboard;
        self.leaderboard.record(self.moves);
        self.outbox.push(Notification::ViewChanged(ViewMode::Leaderboard));
        self.deferred.push(Notification::Won { moves: self.moves });
        true
    }

    /// Takes every pending notification, deferred ones last.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut notes = std::mem::take(&mut self.outbox);
        notes.append(&mut self.deferred);
        notes
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> &Player {
        self.entities.player()
    }

    pub fn player_pos(&self) -> Coord {
        self.entities.player().pos
    }

    pub fn item(&self, id: EntityId) -> Option<&Item> {
        self.entities.item(id)
    }

    /// Inventory item names in pickup order.
    pub fn inventory_names(&self) -> Vec<&str> {
        self.entities
            .player()
            .inventory
            .iter()
            .filter_map(|id| self.entities.item(*id))
            .map(|item| item.name.as_str())
            .collect()
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.entities
            .player()
            .inventory
            .iter()
            .filter_map(|id| self.entities.item(*id))
            .any(|item| item.name == name)
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn light(&self, at: Coord) -> u8 {
        self.light.level(at)
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }

    pub fn active_handler(&self) -> Option<Handler> {
        self.handlers.top().copied()
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Hands an existing leaderboard to this session.
    pub fn set_leaderboard(&mut self, leaderboard: Leaderboard) {
        self.leaderboard = leaderboard;
    }

    pub fn take_leaderboard(&mut self) -> Leaderboard {
        std::mem::take(&mut self.leaderboard)
    }
}

fn trace_phase(phase: MovePhase, dir: Direction) {
    let name: &'static str = dir.into();
    tracing::trace!("move {}: {:?}", name, phase);
}
