//! Common types shared across Afterhours crates.

use serde::Deserialize;
use strum::{EnumIter, IntoStaticStr};

/// Grid coordinate. Signed so that off-grid probes stay representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    /// Creates a new [`Coord`].
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns the coordinate one step away in `dir`.
    pub fn step(self, dir: Direction) -> Self {
        let (dr, dc) = dir.offset();
        Self::new(self.row + dr, self.col + dc)
    }
}

/// One of the four cardinal move directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// Unit offset as `(row, col)`.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Left => (0, -1),
            Direction::Down => (1, 0),
            Direction::Right => (0, 1),
        }
    }

    /// Direction pointing the other way.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
        }
    }
}

/// Handle into the session's entity arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Which side of the dialog box a line is drawn on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Top-level view the presentation layer should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    Gameplay,
    Leaderboard,
}

/// Short user-facing feedback signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    /// Walked into a locked door without a key.
    Locked,
    /// Walked into a wall or off the grid.
    Bump,
}

/// State change emitted by the engine for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    LevelLoaded { width: u32, height: u32 },
    /// An item now sits in `at`; emitted on level load and when items are revealed.
    ItemPlaced { id: EntityId, name: String, at: Coord },
    PlayerMoved { from: Coord, to: Coord },
    ItemCollected { id: EntityId, name: String },
    /// An inventory item was used up (key turned, disk inserted).
    ItemConsumed { id: EntityId, name: String },
    /// An item left a cell's item list.
    ItemRemoved { id: EntityId, at: Coord },
    DoorUnlocked { id: EntityId, at: Coord },
    SystemBooted { id: EntityId, at: Coord },
    /// A furniture piece fired its one-shot effect.
    Furnished { id: EntityId, name: String },
    LightChanged { at: Coord, level: u8 },
    Feedback(Feedback),
    Prompt(String),
    DialogLine { side: Side, speaker: String, text: String },
    DialogClosed,
    ViewChanged(ViewMode),
    Won { moves: u32 },
}

/// Receiver of engine notifications. Only presenters touch a display surface.
pub trait Presenter {
    fn notify(&mut self, note: &Notification);
}

/// Unified error type for game logic.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("cell ({row}, {col}) is out of bounds")]
    OutOfBounds { row: i32, col: i32 },
    #[error("level data overrides reserved field `{field}` at ({row}, {col})")]
    InvalidAttributeOverride { field: String, row: i32, col: i32 },
    #[error("need the {0}")]
    MissingPrerequisite(&'static str),
    #[error("grid dimensions must be positive")]
    InvalidDimensions,
    #[error("malformed level: {0}")]
    MalformedLevel(String),
    #[error("unknown level color {rgb:?} at ({row}, {col})")]
    UnknownColor { rgb: [u8; 3], row: i32, col: i32 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("world invariant violated: {0}")]
    Invariant(String),
}

impl GameError {
    /// Returns `true` for errors that must abort loading or the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            GameError::OutOfBounds { .. } | GameError::MissingPrerequisite(_)
        )
    }
}

pub type GameResult<T> = Result<T, GameError>;
