use std::collections::BTreeMap;

use bracket_lib::prelude::VirtualKeyCode;
use common::Direction;

use crate::Command;

/// Configuration for keyboard controls.
#[derive(Clone, Debug)]
pub struct InputConfig {
    pub up: VirtualKeyCode,
    pub left: VirtualKeyCode,
    pub down: VirtualKeyCode,
    pub right: VirtualKeyCode,
    pub advance: VirtualKeyCode,
    pub dismiss: VirtualKeyCode,
    pub quit: VirtualKeyCode,
    pub scroll_up: VirtualKeyCode,
    pub scroll_down: VirtualKeyCode,
}

impl Default for InputConfig {
    fn default() -> Self {
        use VirtualKeyCode::*;
        Self {
            up: W,
            left: A,
            down: S,
            right: D,
            advance: Space,
            dismiss: Escape,
            quit: Q,
            scroll_up: PageUp,
            scroll_down: PageDown,
        }
    }
}

impl InputConfig {
    /// Applies `action = "key"` bindings over the defaults.
    pub fn from_bindings(bindings: &BTreeMap<String, String>) -> Self {
        let mut cfg = Self::default();
        for (action, name) in bindings {
            let Some(kc) = parse_key(name) else {
                tracing::warn!("unknown key `{}` for `{}`, keeping default", name, action);
                continue;
            };
            match action.as_str() {
                "up" => cfg.up = kc,
                "left" => cfg.left = kc,
                "down" => cfg.down = kc,
                "right" => cfg.right = kc,
                "continue" => cfg.advance = kc,
                "dismiss" => cfg.dismiss = kc,
                "quit" => cfg.quit = kc,
                "scroll_up" => cfg.scroll_up = kc,
                "scroll_down" => cfg.scroll_down = kc,
                other => tracing::warn!("unknown input action `{}`", other),
            }
        }
        cfg
    }

    /// Maps a key press to an engine command. Arrow keys always move.
    pub fn command(&self, key: VirtualKeyCode) -> Option<Command> {
        use VirtualKeyCode::*;
        let dir = match key {
            k if k == Up || k == self.up => Direction::Up,
            k if k == Left || k == self.left => Direction::Left,
            k if k == Down || k == self.down => Direction::Down,
            k if k == Right || k == self.right => Direction::Right,
            k if k == Return || k == self.advance => return Some(Command::Continue),
            k if k == self.dismiss => return Some(Command::Dismiss),
            _ => return None,
        };
        Some(Command::Move(dir))
    }
}

fn parse_key(name: &str) -> Option<VirtualKeyCode> {
    use VirtualKeyCode::*;
    match name.to_ascii_lowercase().as_str() {
        "left" => Some(Left),
        "right" => Some(Right),
        "up" => Some(Up),
        "down" => Some(Down),
        "w" => Some(W),
        "a" => Some(A),
        "s" => Some(S),
        "d" => Some(D),
        "h" => Some(H),
        "j" => Some(J),
        "k" => Some(K),
        "l" => Some(L),
        "e" => Some(E),
        "f" => Some(F),
        "q" => Some(Q),
        "x" => Some(X),
        "space" => Some(Space),
        "return" | "enter" => Some(Return),
        "escape" | "esc" => Some(Escape),
        "pageup" => Some(PageUp),
        "pagedown" => Some(PageDown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_wasd() {
        let cfg = InputConfig::default();
        assert_eq!(
            cfg.command(VirtualKeyCode::W),
            Some(Command::Move(Direction::Up))
        );
        assert_eq!(
            cfg.command(VirtualKeyCode::D),
            Some(Command::Move(Direction::Right))
        );
        assert_eq!(
            cfg.command(VirtualKeyCode::Left),
            Some(Command::Move(Direction::Left))
        );
        assert_eq!(cfg.command(VirtualKeyCode::Space), Some(Command::Continue));
        assert_eq!(cfg.command(VirtualKeyCode::Return), Some(Command::Continue));
        assert_eq!(cfg.command(VirtualKeyCode::Escape), Some(Command::Dismiss));
        assert_eq!(cfg.command(VirtualKeyCode::Z), None);
    }

    #[test]
    fn bindings_override_fields() {
        let mut bindings = BTreeMap::new();
        bindings.insert("up".to_string(), "k".to_string());
        bindings.insert("continue".to_string(), "e".to_string());
        bindings.insert("scroll_up".to_string(), "x".to_string());
        let cfg = InputConfig::from_bindings(&bindings);
        assert_eq!(cfg.scroll_up, VirtualKeyCode::X);
        assert_eq!(cfg.scroll_down, VirtualKeyCode::PageDown);
        assert_eq!(cfg.up, VirtualKeyCode::K);
        assert_eq!(cfg.advance, VirtualKeyCode::E);
        assert_eq!(cfg.left, VirtualKeyCode::A);
    }

    #[test]
    fn unknown_keys_keep_defaults() {
        let mut bindings = BTreeMap::new();
        bindings.insert("up".to_string(), "F13".to_string());
        bindings.insert("jump".to_string(), "x".to_string());
        let cfg = InputConfig::from_bindings(&bindings);
        assert_eq!(cfg.up, VirtualKeyCode::W);
    }
}
