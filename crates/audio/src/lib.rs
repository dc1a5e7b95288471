//! Sound effect playback collaborator.

use std::collections::HashSet;
use std::str::FromStr;

use strum::{EnumIter, EnumString, IntoStaticStr};

/// Supported sound effect kinds, named the way the engine requests them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Sound {
    Keys,
    Flashlight,
    Data,
    Win,
    DoorLocked,
}

/// Effects decoded when the audio context unlocks.
pub const DEFAULT_EFFECTS: [Sound; 4] = [Sound::Keys, Sound::Flashlight, Sound::Data, Sound::Win];

/// Basic audio manager storing volume level and loaded effects.
///
/// The context starts locked and unlocks on the first key press; requests made
/// before that, or for effects that never loaded, are silent no-ops.
#[derive(Debug)]
pub struct AudioManager {
    volume: u8,
    unlocked: bool,
    loaded: HashSet<Sound>,
    played: Vec<Sound>,
}

impl AudioManager {
    /// Creates a new manager with the given volume (0-10).
    pub fn new(volume: u8) -> Self {
        Self {
            volume: volume.min(10),
            unlocked: false,
            loaded: HashSet::new(),
            played: Vec::new(),
        }
    }

    /// Returns current volume.
    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Unlocks the context and loads [`DEFAULT_EFFECTS`]. Idempotent.
    pub fn unlock(&mut self) {
        if self.unlocked {
            return;
        }
        tracing::info!("initializing audio");
        self.unlocked = true;
        for sound in DEFAULT_EFFECTS {
            self.load(sound);
        }
    }

    /// Marks an effect as decoded and playable.
    pub fn load(&mut self, sound: Sound) {
        self.loaded.insert(sound);
    }

    /// Plays an effect by symbolic name. Returns `true` if it actually played.
    pub fn play_effect(&mut self, name: &str) -> bool {
        let Ok(sound) = Sound::from_str(name) else {
            tracing::debug!("trying to play unknown sfx: {}", name);
            return false;
        };
        if !self.unlocked || !self.loaded.contains(&sound) {
            tracing::debug!("trying to play unloaded sfx: {}", name);
            return false;
        }
        tracing::debug!("play sfx {} at volume {}", name, self.volume);
        self.played.push(sound);
        true
    }

    /// Effects played so far, oldest first.
    pub fn played(&self) -> &[Sound] {
        &self.played
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(7)
    }
}
