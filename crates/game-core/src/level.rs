//! Building a session from decoded level data.

use common::{Coord, EntityId, GameError, GameResult, Notification};
use data::{Attribute, DialogScripts, Level};

use crate::config::GameConfig;
use crate::entity::{Entity, Item, ItemKind, Location, PLAYER};
use crate::session::GameSession;

impl GameSession {
    /// Creates a session from a decoded level, spawns its items, applies the
    /// manifest overrides and starts the intro script if there is one.
    pub fn from_level(
        level: Level,
        scripts: DialogScripts,
        config: &GameConfig,
    ) -> GameResult<Self> {
        let Level {
            grid,
            player,
            seeds,
            manifest,
        } = level;
        let mut session = GameSession::new(grid, player, config)?;
        session.scripts = scripts;
        for seed in &seeds {
            if let Some(name) = seed.thing.item_name() {
                session.spawn_item(seed.at, name)?;
            }
        }
        for o in &manifest.overrides {
            let id = session
                .grid
                .items(o.at)
                .ok()
                .and_then(|ids| ids.iter().copied().find(|id| *id != PLAYER))
                .ok_or_else(|| {
                    GameError::MalformedLevel(format!("override at {:?} has no item", o.at))
                })?;
            for attr in &o.attributes {
                session.apply_attribute(id, attr)?;
            }
        }
        session.check_invariants()?;
        tracing::info!(
            "level loaded: {}x{}, {} items",
            session.grid.width(),
            session.grid.height(),
            session.entities.items().count()
        );
        if let Some(intro) = &manifest.intro {
            session.start_dialog(intro);
        }
        Ok(session)
    }

    /// Places a new item named `name` into the cell at `at`.
    pub fn spawn_item(&mut self, at: Coord, name: &str) -> GameResult<EntityId> {
        if !self.grid.contains(at) {
            return Err(GameError::OutOfBounds {
                row: at.row,
                col: at.col,
            });
        }
        let id = self.entities.spawn(Item {
            name: name.to_string(),
            location: Location::Cell(at),
            kind: ItemKind::for_name(name),
        });
        self.grid.push_item(at, id)?;
        self.outbox.push(Notification::ItemPlaced {
            id,
            name: name.to_string(),
            at,
        });
        Ok(id)
    }

    /// Places a new item at the end of a container's contents.
    pub fn spawn_into(&mut self, container: EntityId, name: &str) -> GameResult<EntityId> {
        let slot = match self.entities.item(container).map(|c| &c.kind) {
            Some(ItemKind::Container { contents }) => contents.len(),
            _ => return Err(self.bad_override(container, "contents")),
        };
        let id = self.entities.spawn(Item {
            name: name.to_string(),
            location: Location::Contained { container, slot },
            kind: ItemKind::for_name(name),
        });
        if let Some(ItemKind::Container { contents }) =
            self.entities.item_mut(container).map(|c| &mut c.kind)
        {
            contents.push(id);
        }
        Ok(id)
    }

    /// Writes one manifest attribute onto an item.
    pub fn apply_attribute(&mut self, id: EntityId, attr: &Attribute) -> GameResult<()> {
        if let Attribute::Contents(names) = attr {
            for name in names {
                self.spawn_into(id, name)?;
            }
            return Ok(());
        }
        let Some(item) = self.entities.item_mut(id) else {
            return Err(GameError::Invariant(format!("no item {:?}", id)));
        };
        let applied = match (attr, &mut item.kind) {
            (Attribute::Locked(v), ItemKind::Door { locked }) => {
                *locked = *v;
                true
            }
            (Attribute::Booted(v), ItemKind::System { booted }) => {
                *booted = *v;
                true
            }
            (Attribute::Script(s), ItemKind::Furniture { script, .. }) => {
                *script = Some(s.clone());
                true
            }
            _ => false,
        };
        if !applied {
            return Err(self.bad_override(id, attr.field()));
        }
        Ok(())
    }

    fn bad_override(&self, id: EntityId, field: &str) -> GameError {
        let at = self.world_pos(id).unwrap_or(Coord::new(-1, -1));
        GameError::InvalidAttributeOverride {
            field: field.to_string(),
            row: at.row,
            col: at.col,
        }
    }

    /// Cell an entity is in, following inventories and containers.
    pub fn world_pos(&self, id: EntityId) -> Option<Coord> {
        let item = match self.entities.get(id)? {
            Entity::Player(player) => return Some(player.pos),
            Entity::Item(item) => item,
        };
        match item.location {
            Location::Cell(at) => Some(at),
            Location::Inventory { .. } => Some(self.entities.player().pos),
            Location::Contained { container, .. } => self.world_pos(container),
            Location::Consumed => None,
        }
    }

    /// Checks that every entity's recorded location matches the one list
    /// holding it.
    pub fn check_invariants(&self) -> GameResult<()> {
        let pos = self.entities.player().pos;
        if self.grid.locate(PLAYER) != vec![pos] {
            return Err(GameError::Invariant(format!(
                "player recorded at {:?} but found in {:?}",
                pos,
                self.grid.locate(PLAYER)
            )));
        }
        let inventory = &self.entities.player().inventory;
        for (id, item) in self.entities.items() {
            let cells = self.grid.locate(id);
            let held = inventory.iter().filter(|i| **i == id).count();
            let contained: usize = self
                .entities
                .items()
                .filter_map(|(_, other)| match &other.kind {
                    ItemKind::Container { contents } => {
                        Some(contents.iter().filter(|i| **i == id).count())
                    }
                    _ => None,
                })
                .sum();
            let ok = match item.location {
                Location::Cell(at) => cells == vec![at] && held == 0 && contained == 0,
                Location::Inventory { slot } => {
                    cells.is_empty() && held == 1 && contained == 0 && inventory.get(slot) == Some(&id)
                }
                Location::Contained { container, slot } => {
                    let listed = matches!(
                        self.entities.item(container).map(|c| &c.kind),
                        Some(ItemKind::Container { contents }) if contents.get(slot) == Some(&id)
                    );
                    cells.is_empty() && held == 0 && contained == 1 && listed
                }
                Location::Consumed => cells.is_empty() && held == 0 && contained == 0,
            };
            if !ok {
                return Err(GameError::Invariant(format!(
                    "{} {:?} at {:?} is listed in {} cells, {} inventory slots, {} containers",
                    item.name,
                    id,
                    item.location,
                    cells.len(),
                    held,
                    contained
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ViewMode;
    use data::{load_level, LevelManifest};

    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];
    const BROWN: [u8; 4] = [128, 64, 0, 255];
    const GREY: [u8; 4] = [128, 128, 128, 255];

    fn level(manifest: &str) -> Level {
        let pixels: Vec<u8> = [BLACK, BLUE, BROWN, GREY, WHITE, RED]
            .iter()
            .flatten()
            .copied()
            .collect();
        load_level(&pixels, 6, 1, LevelManifest::from_json(manifest).unwrap()).unwrap()
    }

    #[test]
    fn builds_session_from_level() {
        let s = GameSession::from_level(
            level(r#"{"overrides": [{"at": [0, 2], "set": {"contents": ["keys"]}}]}"#),
            DialogScripts::default(),
            &GameConfig::default(),
        )
        .unwrap();
        assert_eq!(s.player_pos(), Coord::new(0, 1));
        assert_eq!(s.entities.items().count(), 4);
        let cab = s.grid.items(Coord::new(0, 2)).unwrap()[0];
        assert!(matches!(
            s.item(cab).map(|i| &i.kind),
            Some(ItemKind::Container { contents }) if contents.len() == 1
        ));
        assert_eq!(s.view(), ViewMode::Gameplay);
    }

    #[test]
    fn override_on_wrong_kind_is_rejected() {
        let err = GameSession::from_level(
            level(r#"{"overrides": [{"at": [0, 3], "set": {"locked": false}}]}"#),
            DialogScripts::default(),
            &GameConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            GameError::InvalidAttributeOverride { ref field, row: 0, col: 3 } if field == "locked"
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn override_on_empty_cell_is_malformed() {
        let err = GameSession::from_level(
            level(r#"{"overrides": [{"at": [0, 4], "set": {"locked": false}}]}"#),
            DialogScripts::default(),
            &GameConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, GameError::MalformedLevel(_)));
    }

    #[test]
    fn intro_script_starts_on_load() {
        let scripts = DialogScripts::from_json(
            r#"{"intro": [{"side": "left", "speaker": "you", "text": "Late again."}]}"#,
        )
        .unwrap();
        let s = GameSession::from_level(
            level(r#"{"intro": "intro"}"#),
            scripts,
            &GameConfig::default(),
        )
        .unwrap();
        assert_eq!(s.active_handler(), Some(crate::session::Handler::Dialog));
    }

    #[test]
    fn spawn_outside_grid_is_out_of_bounds() {
        let mut s = GameSession::from_level(
            level("{}"),
            DialogScripts::default(),
            &GameConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            s.spawn_item(Coord::new(3, 0), "keys"),
            Err(GameError::OutOfBounds { row: 3, col: 0 })
        ));
    }

    #[test]
    fn world_pos_follows_containers() {
        let mut s = GameSession::from_level(
            level("{}"),
            DialogScripts::default(),
            &GameConfig::default(),
        )
        .unwrap();
        let cab = s.grid.items(Coord::new(0, 2)).unwrap()[0];
        let inner = s.spawn_into(cab, "data").unwrap();
        assert_eq!(s.world_pos(inner), Some(Coord::new(0, 2)));
        assert_eq!(s.world_pos(PLAYER), Some(Coord::new(0, 1)));
        s.check_invariants().unwrap();
    }

    #[test]
    fn embedded_level_is_consistent() {
        let (level, scripts) = data::load_embedded().unwrap();
        let s = GameSession::from_level(level, scripts, &GameConfig::default()).unwrap();
        s.check_invariants().unwrap();
        assert_eq!(s.active_handler(), Some(crate::session::Handler::Dialog));
    }
}
