//! Floor items as seen by monsters
//!
//! The engine only needs enough of an item to decide whether a monster
//! picks it up, crushes it, or leaves it alone.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::monster::{Elements, RaceFlags};

/// Broad item category
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum ItemKind {
    Gold,
    Corpse,
    Statue,
    Weapon,
    Armor,
    Potion,
    Scroll,
    Food,
    #[default]
    Misc,
}

/// A single item stack lying on the floor or carried by a monster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub name: String,
    pub artifact: bool,
    /// Races this item is especially dangerous to
    pub slays: RaceFlags,
    /// Elemental brands carried by the item
    pub brands: Elements,
}

impl Item {
    pub fn new(kind: ItemKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            artifact: false,
            slays: RaceFlags::empty(),
            brands: Elements::empty(),
        }
    }

    pub fn with_slays(mut self, slays: RaceFlags) -> Self {
        self.slays = slays;
        self
    }

    pub fn with_brands(mut self, brands: Elements) -> Self {
        self.brands = brands;
        self
    }

    pub fn artifact(mut self) -> Self {
        self.artifact = true;
        self
    }

    /// Monsters that collect items leave these on the floor
    pub const fn is_ignored_by_collectors(&self) -> bool {
        matches!(self.kind, ItemKind::Gold | ItemKind::Corpse | ItemKind::Statue)
    }
}
