//! Terrain features
//!
//! A feature is a kind of terrain (floor, granite, a closed door...). Cells
//! hold a `FeatureId`; everything the engine wants to know about the terrain
//! is read from the `FeatureTable`.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

bitflags! {
    /// Terrain capability flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FeatureFlags: u32 {
        /// Does not block line of sight
        const LOS = 0x0001;
        /// Does not block projections
        const PROJECT = 0x0002;
        /// Walkable by ordinary creatures
        const MOVE = 0x0004;
        /// Wall-walkers may pass through
        const CAN_PASS = 0x0008;
        /// Destroyed by disintegration and wall-eaters
        const HURT_DISI = 0x0010;
        /// Never altered
        const PERMANENT = 0x0020;
        /// Shatters; guarded against fragile wall-eaters
        const GLASS = 0x0040;
        const DOOR = 0x0080;
        /// Can be opened
        const OPEN = 0x0100;
        /// Can be bashed
        const BASH = 0x0200;
        const TREE = 0x0400;
        const WATER = 0x0800;
        const DEEP = 0x1000;
        const LAVA = 0x2000;
        const WALL = 0x4000;
        const FLOOR = 0x8000;
    }
}

// Manual serde for FeatureFlags
impl Serialize for FeatureFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FeatureFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(FeatureFlags::from_bits_truncate(bits))
    }
}

/// Index into a `FeatureTable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FeatureId(pub u16);

impl FeatureId {
    pub const FLOOR: FeatureId = FeatureId(0);
    pub const GRANITE: FeatureId = FeatureId(1);
    pub const PERMANENT_WALL: FeatureId = FeatureId(2);
    pub const RUBBLE: FeatureId = FeatureId(3);
    pub const CLOSED_DOOR: FeatureId = FeatureId(4);
    pub const LOCKED_DOOR: FeatureId = FeatureId(5);
    pub const JAMMED_DOOR: FeatureId = FeatureId(6);
    pub const OPEN_DOOR: FeatureId = FeatureId(7);
    pub const BROKEN_DOOR: FeatureId = FeatureId(8);
    pub const GLASS_WALL: FeatureId = FeatureId(9);
    pub const TREE: FeatureId = FeatureId(10);
    pub const SHALLOW_WATER: FeatureId = FeatureId(11);
    pub const DEEP_WATER: FeatureId = FeatureId(12);
    pub const LAVA: FeatureId = FeatureId(13);
}

/// Ways a monster (or a hook acting for it) can alter terrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum FeatAction {
    Open,
    Bash,
    Disarm,
    Destroy,
}

/// Static description of one terrain kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub symbol: char,
    pub flags: FeatureFlags,
    /// Lock or jam strength; 0 means an ordinary closed door
    pub power: i32,
    pub open_to: Option<FeatureId>,
    pub bash_to: Option<FeatureId>,
    pub disarm_to: Option<FeatureId>,
    pub destroy_to: Option<FeatureId>,
}

impl Feature {
    fn new(name: &str, symbol: char, flags: FeatureFlags) -> Self {
        Self {
            name: name.to_string(),
            symbol,
            flags,
            power: 0,
            open_to: None,
            bash_to: None,
            disarm_to: None,
            destroy_to: None,
        }
    }

    pub const fn has(&self, flag: FeatureFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Door that blocks movement and can be opened or bashed
    pub const fn is_closed_door(&self) -> bool {
        self.has(FeatureFlags::DOOR)
            && !self.has(FeatureFlags::MOVE)
            && (self.has(FeatureFlags::OPEN) || self.has(FeatureFlags::BASH))
    }

    /// Resulting feature after `action`, if the action applies
    pub const fn transition(&self, action: FeatAction) -> Option<FeatureId> {
        match action {
            FeatAction::Open => self.open_to,
            FeatAction::Bash => self.bash_to,
            FeatAction::Disarm => self.disarm_to,
            FeatAction::Destroy => self.destroy_to,
        }
    }
}

/// All terrain kinds known to a world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTable {
    features: Vec<Feature>,
}

impl FeatureTable {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// The default terrain set; ids match the `FeatureId` constants
    pub fn standard() -> Self {
        use FeatureFlags as F;

        let floor = Feature::new("floor", '.', F::LOS | F::PROJECT | F::MOVE | F::FLOOR);

        let mut granite = Feature::new("granite wall", '#', F::WALL | F::CAN_PASS | F::HURT_DISI);
        granite.destroy_to = Some(FeatureId::FLOOR);

        let permanent = Feature::new("permanent wall", 'X', F::WALL | F::PERMANENT);

        let mut rubble = Feature::new("rubble", ':', F::CAN_PASS | F::HURT_DISI);
        rubble.destroy_to = Some(FeatureId::FLOOR);

        let door_flags = F::DOOR | F::CAN_PASS | F::HURT_DISI;

        let mut closed = Feature::new("closed door", '+', door_flags | F::OPEN | F::BASH);
        closed.open_to = Some(FeatureId::OPEN_DOOR);
        closed.bash_to = Some(FeatureId::BROKEN_DOOR);
        closed.destroy_to = Some(FeatureId::FLOOR);

        let mut locked = Feature::new("locked door", 'L', door_flags | F::OPEN | F::BASH);
        locked.power = 3;
        locked.open_to = Some(FeatureId::OPEN_DOOR);
        locked.bash_to = Some(FeatureId::BROKEN_DOOR);
        locked.disarm_to = Some(FeatureId::CLOSED_DOOR);
        locked.destroy_to = Some(FeatureId::FLOOR);

        let mut jammed = Feature::new("jammed door", 'J', door_flags | F::BASH);
        jammed.power = 5;
        jammed.bash_to = Some(FeatureId::BROKEN_DOOR);
        jammed.destroy_to = Some(FeatureId::FLOOR);

        let mut open = Feature::new(
            "open door",
            '\'',
            F::DOOR | F::LOS | F::PROJECT | F::MOVE | F::CAN_PASS | F::HURT_DISI,
        );
        open.bash_to = Some(FeatureId::BROKEN_DOOR);
        open.destroy_to = Some(FeatureId::FLOOR);

        let mut broken = Feature::new(
            "broken door",
            '/',
            F::DOOR | F::LOS | F::PROJECT | F::MOVE | F::HURT_DISI,
        );
        broken.destroy_to = Some(FeatureId::FLOOR);

        let mut glass = Feature::new(
            "glass wall",
            'G',
            F::WALL | F::GLASS | F::LOS | F::CAN_PASS | F::HURT_DISI,
        );
        glass.destroy_to = Some(FeatureId::FLOOR);

        let mut tree = Feature::new("tree", 'T', F::PROJECT | F::MOVE | F::TREE | F::HURT_DISI);
        tree.destroy_to = Some(FeatureId::FLOOR);

        let shallow = Feature::new("shallow water", '~', F::LOS | F::PROJECT | F::MOVE | F::WATER);
        let deep = Feature::new(
            "deep water",
            'W',
            F::LOS | F::PROJECT | F::MOVE | F::WATER | F::DEEP,
        );
        let lava = Feature::new("lava", '=', F::LOS | F::PROJECT | F::MOVE | F::LAVA);

        Self::new(vec![
            floor, granite, permanent, rubble, closed, locked, jammed, open, broken, glass, tree,
            shallow, deep, lava,
        ])
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id.0 as usize)
    }

    /// Feature id for a map symbol
    pub fn by_symbol(&self, symbol: char) -> Option<FeatureId> {
        self.features
            .iter()
            .position(|f| f.symbol == symbol)
            .map(|i| FeatureId(i as u16))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_ids_match_constants() {
        let table = FeatureTable::standard();
        assert_eq!(table.by_symbol('.'), Some(FeatureId::FLOOR));
        assert_eq!(table.by_symbol('#'), Some(FeatureId::GRANITE));
        assert_eq!(table.by_symbol('+'), Some(FeatureId::CLOSED_DOOR));
        assert_eq!(table.by_symbol('L'), Some(FeatureId::LOCKED_DOOR));
        assert_eq!(table.by_symbol('\''), Some(FeatureId::OPEN_DOOR));
        assert_eq!(table.by_symbol('='), Some(FeatureId::LAVA));
        assert_eq!(table.len(), 14);
    }

    #[test]
    fn test_closed_door_detection() {
        let table = FeatureTable::standard();
        let closed = table.get(FeatureId::CLOSED_DOOR).unwrap();
        let open = table.get(FeatureId::OPEN_DOOR).unwrap();
        let jammed = table.get(FeatureId::JAMMED_DOOR).unwrap();
        assert!(closed.is_closed_door());
        assert!(jammed.is_closed_door());
        assert!(!open.is_closed_door());
        assert_eq!(closed.transition(FeatAction::Open), Some(FeatureId::OPEN_DOOR));
        assert_eq!(jammed.transition(FeatAction::Open), None);
    }

    #[test]
    fn test_flags_serde() {
        let flags = FeatureFlags::LOS | FeatureFlags::DOOR;
        let json = serde_json::to_string(&flags).unwrap();
        let back: FeatureFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }
}
