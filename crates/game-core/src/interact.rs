//! Item interaction dispatch run when the player tries to enter a cell.

use common::{Coord, EntityId, Feedback, GameError, Notification};

use crate::entity::{ItemKind, Location};
use crate::session::GameSession;

/// Which list an interacted item currently sits in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Source {
    Cell(Coord),
    Container(EntityId),
}

impl GameSession {
    /// Interacts with every item in `ids`, in order. Returns `true` if any of
    /// them blocks entry into `entered`.
    pub(crate) fn dispatch(&mut self, entered: Coord, source: Source, ids: &[EntityId]) -> bool {
        let mut blocked = false;
        for &id in ids {
            blocked |= self.interact(entered, source, id);
        }
        blocked
    }

    fn interact(&mut self, entered: Coord, source: Source, id: EntityId) -> bool {
        let Some(item) = self.entities.item(id) else {
            tracing::warn!("cell lists unknown entity {:?}", id);
            return false;
        };
        let name = item.name.clone();
        tracing::debug!("interacting with {} {:?}", name, id);
        match item.kind.clone() {
            ItemKind::Collectible => {
                self.pick_up(source, id, &name);
                false
            }
            ItemKind::Door { locked: false } => false,
            ItemKind::Door { locked: true } => {
                if self.consume("keys") {
                    self.set_kind(id, ItemKind::Door { locked: false });
                    self.outbox
                        .push(Notification::DoorUnlocked { id, at: entered });
                    false
                } else {
                    self.outbox.push(Notification::Feedback(Feedback::Locked));
                    self.audio.play_effect("door-locked");
                    true
                }
            }
            ItemKind::System { booted: true } => false,
            ItemKind::System { booted: false } => {
                if self.consume("data") {
                    self.set_kind(id, ItemKind::System { booted: true });
                    self.outbox
                        .push(Notification::SystemBooted { id, at: entered });
                } else {
                    let err = GameError::MissingPrerequisite("data disk");
                    tracing::debug!("cannot boot {:?}: {}", id, err);
                    self.outbox.push(Notification::Prompt(err.to_string()));
                }
                false
            }
            ItemKind::Container { contents } => {
                self.dispatch(entered, Source::Container(id), &contents)
            }
            ItemKind::Furniture { visited: true, .. } => false,
            ItemKind::Furniture {
                script,
                visited: false,
            } => {
                self.set_kind(
                    id,
                    ItemKind::Furniture {
                        script: script.clone(),
                        visited: true,
                    },
                );
                self.outbox.push(Notification::Furnished { id, name });
                if let Some(script) = script {
                    self.pending_script = Some(script);
                }
                false
            }
            ItemKind::Scenery => false,
        }
    }

    fn set_kind(&mut self, id: EntityId, kind: ItemKind) {
        if let Some(item) = self.entities.item_mut(id) {
            item.kind = kind;
        }
    }

    /// Moves an item from its list into the player's inventory.
    fn pick_up(&mut self, source: Source, id: EntityId, name: &str) {
        match source {
            Source::Cell(at) => match self.grid.remove_item(at, id) {
                Ok(true) => self.outbox.push(Notification::ItemRemoved { id, at }),
                Ok(false) => tracing::warn!("{:?} missing from cell {:?}", id, at),
                Err(e) => tracing::warn!("cannot pick up {:?}: {}", id, e),
            },
            Source::Container(container) => self.remove_from_container(container, id),
        }
        let player = self.entities.player_mut();
        let slot = player.inventory.len();
        player.inventory.push(id);
        if let Some(item) = self.entities.item_mut(id) {
            item.location = Location::Inventory { slot };
        }
        self.outbox.push(Notification::ItemCollected {
            id,
            name: name.to_string(),
        });
        self.audio.play_effect(name);
    }

    fn remove_from_container(&mut self, container: EntityId, id: EntityId) {
        let contents = match self.entities.item_mut(container).map(|c| &mut c.kind) {
            Some(ItemKind::Container { contents }) => {
                contents.retain(|c| *c != id);
                contents.clone()
            }
            _ => {
                tracing::warn!("{:?} is not a container", container);
                return;
            }
        };
        for (slot, child) in contents.into_iter().enumerate() {
            if let Some(item) = self.entities.item_mut(child) {
                item.location = Location::Contained { container, slot };
            }
        }
    }

    /// Uses up the first inventory item called `name`. Returns `false` if
    /// the player holds none.
    pub(crate) fn consume(&mut self, name: &str) -> bool {
        let found = self
            .entities
            .player()
            .inventory
            .iter()
            .position(|id| self.entities.item(*id).is_some_and(|i| i.name == name));
        let Some(slot) = found else {
            return false;
        };
        let id = self.entities.player_mut().inventory.remove(slot);
        if let Some(item) = self.entities.item_mut(id) {
            item.location = Location::Consumed;
        }
        self.reindex_inventory();
        self.outbox.push(Notification::ItemConsumed {
            id,
            name: name.to_string(),
        });
        true
    }

    fn reindex_inventory(&mut self) {
        let inventory = self.entities.player().inventory.clone();
        for (slot, id) in inventory.into_iter().enumerate() {
            if let Some(item) = self.entities.item_mut(id) {
                item.location = Location::Inventory { slot };
            }
        }
    }
}
