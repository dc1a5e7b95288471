use common::{Coord, EntityId};

/// Where an item currently lives. Exactly one list holds it at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Cell(Coord),
    Inventory { slot: usize },
    Contained { container: EntityId, slot: usize },
    /// Used up; no list holds it any more.
    Consumed,
}

/// Item behaviour, decided by name at spawn time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
    /// Picked up automatically on entry.
    Collectible,
    /// Blocks entry while locked and no key is held.
    Door { locked: bool },
    /// Boots when entered while holding a data disk.
    System { booted: bool },
    /// Opened on entry; its contents are interacted with in turn.
    Container { contents: Vec<EntityId> },
    /// Fires a one-shot effect on first entry.
    Furniture {
        script: Option<String>,
        visited: bool,
    },
    /// Inert decoration.
    Scenery,
}

impl ItemKind {
    /// Default kind for an item name.
    pub fn for_name(name: &str) -> Self {
        match name {
            "exit" | "door" => ItemKind::Door { locked: true },
            "system" => ItemKind::System { booted: false },
            "filing-cabinet" => ItemKind::Container {
                contents: Vec::new(),
            },
            "desk" | "couch" | "window" => ItemKind::Furniture {
                script: None,
                visited: false,
            },
            "plant" | "poster" => ItemKind::Scenery,
            _ => ItemKind::Collectible,
        }
    }
}

/// Item entity occupying a cell, the inventory or a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub location: Location,
    pub kind: ItemKind,
}

impl Item {
    /// Returns `true` for an exit door the player can stand in.
    pub fn is_open_exit(&self) -> bool {
        matches!(self.name.as_str(), "exit" | "door")
            && matches!(self.kind, ItemKind::Door { locked: false })
    }
}

/// Player entity with position and inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub pos: Coord,
    /// Collected items in pickup order.
    pub inventory: Vec<EntityId>,
}

/// Borrowed view of one entity in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity<'a> {
    Player(&'a Player),
    Item(&'a Item),
}

/// Id reserved for the player.
pub const PLAYER: EntityId = EntityId(0);

/// Arena owning every entity. Item ids start after [`PLAYER`] and stay valid
/// for the arena's lifetime.
#[derive(Clone, Debug)]
pub struct Entities {
    player: Player,
    items: Vec<Item>,
}

impl Entities {
    pub fn new(start: Coord) -> Self {
        Self {
            player: Player {
                pos: start,
                inventory: Vec::new(),
            },
            items: Vec::new(),
        }
    }

    pub fn spawn(&mut self, item: Item) -> EntityId {
        self.items.push(item);
        EntityId(self.items.len() as u32)
    }

    pub fn get(&self, id: EntityId) -> Option<Entity<'_>> {
        if id == PLAYER {
            return Some(Entity::Player(&self.player));
        }
        self.item(id).map(Entity::Item)
    }

    pub fn item(&self, id: EntityId) -> Option<&Item> {
        let idx = (id.0 as usize).checked_sub(1)?;
        self.items.get(idx)
    }

    pub fn item_mut(&mut self, id: EntityId) -> Option<&mut Item> {
        let idx = (id.0 as usize).checked_sub(1)?;
        self.items.get_mut(idx)
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Every item with its id, in spawn order.
    pub fn items(&self) -> impl Iterator<Item = (EntityId, &Item)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (EntityId(i as u32 + 1), item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_names() {
        assert_eq!(ItemKind::for_name("exit"), ItemKind::Door { locked: true });
        assert_eq!(ItemKind::for_name("keys"), ItemKind::Collectible);
        assert_eq!(ItemKind::for_name("widget"), ItemKind::Collectible);
        assert!(matches!(
            ItemKind::for_name("filing-cabinet"),
            ItemKind::Container { .. }
        ));
        assert!(matches!(
            ItemKind::for_name("couch"),
            ItemKind::Furniture { visited: false, .. }
        ));
    }

    #[test]
    fn arena_separates_player_and_items() {
        let mut arena = Entities::new(Coord::new(0, 0));
        let i = arena.spawn(Item {
            name: "keys".into(),
            location: Location::Cell(Coord::new(1, 1)),
            kind: ItemKind::Collectible,
        });
        assert_ne!(i, PLAYER);
        assert!(matches!(arena.get(PLAYER), Some(Entity::Player(_))));
        assert!(arena.item(PLAYER).is_none());
        assert!(matches!(arena.get(i), Some(Entity::Item(item)) if item.name == "keys"));
        assert!(arena.get(EntityId(9)).is_none());
        assert_eq!(arena.items().map(|(id, _)| id).collect::<Vec<_>>(), vec![i]);
    }

    #[test]
    fn only_unlocked_exits_are_open() {
        let mut exit = Item {
            name: "exit".into(),
            location: Location::Cell(Coord::new(0, 0)),
            kind: ItemKind::Door { locked: true },
        };
        assert!(!exit.is_open_exit());
        exit.kind = ItemKind::Door { locked: false };
        assert!(exit.is_open_exit());
    }
}
