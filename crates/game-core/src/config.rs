use std::collections::BTreeMap;

use common::{GameError, GameResult};
use serde::Deserialize;

/// Which move attempts advance the move counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCountPolicy {
    /// Every attempt that clears the wall and bounds checks, blocked or not.
    #[default]
    Attempts,
    /// Only attempts that actually change cell.
    Commits,
}

/// Optional on-disk level replacing the bundled one.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LevelPaths {
    pub image: String,
    pub manifest: String,
    pub scripts: String,
}

/// Settings read from `afterhours.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub move_count: MoveCountPolicy,
    /// Effect volume, 0-10.
    pub volume: u8,
    pub colorblind: bool,
    /// Action name to key name, e.g. `up = "w"`.
    pub input: BTreeMap<String, String>,
    pub level: Option<LevelPaths>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            move_count: MoveCountPolicy::default(),
            volume: 7,
            colorblind: false,
            input: BTreeMap::new(),
            level: None,
        }
    }
}

impl GameConfig {
    /// Loads configuration from a file if it exists.
    pub fn load(path: &str) -> GameResult<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> GameResult<Self> {
        toml::from_str(data).map_err(|e| GameError::Parse(e.to_string()))
    }
}
