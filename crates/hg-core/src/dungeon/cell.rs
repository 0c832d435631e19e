//! Map cells

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::FeatureId;
use crate::monster::MonsterId;
use crate::object::Item;

bitflags! {
    /// Per-cell markers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellInfo: u16 {
        /// Part of a room (as opposed to a corridor)
        const ROOM = 0x0001;
        /// Remembered by the player
        const MARK = 0x0002;
        /// Currently in the player's view
        const VIEW = 0x0004;
        /// Glyph of warding
        const GLYPH = 0x0008;
        /// Explosive rune
        const EXPLOSIVE_RUNE = 0x0010;
    }
}

// Manual serde for CellInfo
impl Serialize for CellInfo {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellInfo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(CellInfo::from_bits_truncate(bits))
    }
}

/// A single map cell
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub feat: FeatureId,

    /// Monster standing here (the player is tracked on `Player`)
    pub monster: Option<MonsterId>,

    /// Item pile, top of the pile first
    pub items: Vec<Item>,

    /// Sound cost toward the player; 0 = not reached
    pub cost: u16,

    /// Flow distance toward the player counting doors; 0 = not reached
    pub dist: u16,

    /// Game tick the player last stood here; 0 = never
    pub when: u32,

    pub info: CellInfo,
}

impl Cell {
    pub fn new(feat: FeatureId) -> Self {
        Self {
            feat,
            ..Self::default()
        }
    }

    pub const fn is_warded(&self) -> bool {
        self.info.intersects(CellInfo::GLYPH.union(CellInfo::EXPLOSIVE_RUNE))
    }

    /// Forget a broken ward
    pub fn clear_ward(&mut self) {
        self.info
            .remove(CellInfo::GLYPH | CellInfo::EXPLOSIVE_RUNE | CellInfo::MARK);
    }
}
