//! Monster races (species descriptors)
//!
//! Races are shared and read-only to the engine, apart from the lore the
//! player accumulates about them.

use bitflags::bitflags;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::consts::NORMAL_SPEED;
use crate::world::EngineError;

bitflags! {
    /// Race capability and behaviour flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RaceFlags: u64 {
        // Identity
        const UNIQUE = 1 << 0;
        const QUESTOR = 1 << 1;
        /// Ringwraith; treated like a unique for loyalty purposes
        const NAZGUL = 1 << 2;

        // Movement habits
        const NEVER_MOVE = 1 << 3;
        const NEVER_BLOW = 1 << 4;
        const RAND_25 = 1 << 5;
        const RAND_50 = 1 << 6;
        const FRIENDS = 1 << 7;
        const ANIMAL = 1 << 8;
        const MULTIPLY = 1 << 9;
        const QUANTUM = 1 << 10;
        const STUPID = 1 << 11;

        // Interaction with terrain and other creatures
        const OPEN_DOOR = 1 << 12;
        const BASH_DOOR = 1 << 13;
        const PASS_WALL = 1 << 14;
        const KILL_WALL = 1 << 15;
        const MOVE_BODY = 1 << 16;
        const KILL_BODY = 1 << 17;
        const TAKE_ITEM = 1 << 18;
        const KILL_ITEM = 1 << 19;

        // Locomotion
        const CAN_FLY = 1 << 20;
        const CAN_SWIM = 1 << 21;
        const AQUATIC = 1 << 22;
        const WILD_WOOD = 1 << 23;
        const RIDING = 1 << 24;

        const CAN_SPEAK = 1 << 25;

        // Light sources carried by the monster
        const HAS_LIGHT = 1 << 26;
        const SELF_LIGHT = 1 << 27;
        const HAS_DARK = 1 << 28;
        const SELF_DARK = 1 << 29;

        // Kinds, used by slaying items and alignment checks
        const EVIL = 1 << 32;
        const GOOD = 1 << 33;
        const DRAGON = 1 << 34;
        const TROLL = 1 << 35;
        const GIANT = 1 << 36;
        const ORC = 1 << 37;
        const DEMON = 1 << 38;
        const UNDEAD = 1 << 39;
        const HUMAN = 1 << 40;
        const ANIMAL_KIND = 1 << 41;

        /// Resists everything; such races are never loyal pets
        const RES_ALL = 1 << 48;

        const LIGHT_MASK = Self::HAS_LIGHT.bits() | Self::SELF_LIGHT.bits()
            | Self::HAS_DARK.bits() | Self::SELF_DARK.bits();
    }
}

bitflags! {
    /// Elemental immunities (on races) and brands (on items)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Elements: u8 {
        const ACID = 0x01;
        const ELEC = 0x02;
        const FIRE = 0x04;
        const COLD = 0x08;
        const POIS = 0x10;
    }
}

bitflags! {
    /// Spells a race knows
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpellSet: u32 {
        const ARROW = 0x0001;
        const BOLT = 0x0002;
        const BALL = 0x0004;
        const BREATH = 0x0008;
        const CAUSE_WOUNDS = 0x0010;
        const CONFUSE = 0x0020;
        const SCARE = 0x0040;
        const SUMMON = 0x0080;
        const HEAL = 0x0100;
        const BLINK = 0x0200;
        const TELEPORT = 0x0400;
        const HASTE = 0x0800;

        /// Spells that need a clear shot at the target
        const ATTACK = Self::ARROW.bits() | Self::BOLT.bits() | Self::BALL.bits()
            | Self::BREATH.bits() | Self::CAUSE_WOUNDS.bits() | Self::CONFUSE.bits()
            | Self::SCARE.bits();
    }
}

// Manual serde for RaceFlags
impl Serialize for RaceFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RaceFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(RaceFlags::from_bits_truncate(bits))
    }
}

// Manual serde for Elements
impl Serialize for Elements {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Elements {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(Elements::from_bits_truncate(bits))
    }
}

// Manual serde for SpellSet
impl Serialize for SpellSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SpellSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(SpellSet::from_bits_truncate(bits))
    }
}

/// Index into the bestiary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RaceId(pub u16);

/// Static data for one kind of monster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterRace {
    pub name: String,

    /// Display symbol
    pub symbol: char,

    /// Native depth
    pub level: i32,

    /// Base speed (110 = normal)
    pub speed: i16,

    /// Hit points a fresh monster starts with
    pub max_hp: i32,

    /// Sensing radius ("area affect")
    pub aaf: i32,

    /// Experience value at level 1
    pub mexp: i32,

    /// Chance in 100 to try a spell each turn
    pub spell_freq: i32,

    pub spells: SpellSet,

    pub flags: RaceFlags,

    pub immunities: Elements,
}

impl Default for MonsterRace {
    fn default() -> Self {
        Self {
            name: "creature".to_string(),
            symbol: 'm',
            level: 1,
            speed: NORMAL_SPEED,
            max_hp: 10,
            aaf: 20,
            mexp: 1,
            spell_freq: 0,
            spells: SpellSet::empty(),
            flags: RaceFlags::empty(),
            immunities: Elements::empty(),
        }
    }
}

impl MonsterRace {
    pub fn new(name: &str, symbol: char, level: i32) -> Self {
        Self {
            name: name.to_string(),
            symbol,
            level,
            ..Self::default()
        }
    }

    pub const fn has(&self, flag: RaceFlags) -> bool {
        self.flags.contains(flag)
    }

    pub const fn is_unique(&self) -> bool {
        self.has(RaceFlags::UNIQUE)
    }

    /// Unique or ringwraith
    pub const fn is_named(&self) -> bool {
        self.flags.intersects(RaceFlags::UNIQUE.union(RaceFlags::NAZGUL))
    }

    pub const fn is_questor(&self) -> bool {
        self.has(RaceFlags::QUESTOR)
    }

    pub const fn never_moves(&self) -> bool {
        self.has(RaceFlags::NEVER_MOVE)
    }

    pub const fn never_blows(&self) -> bool {
        self.has(RaceFlags::NEVER_BLOW)
    }

    pub const fn has_friends(&self) -> bool {
        self.has(RaceFlags::FRIENDS)
    }

    pub const fn is_animal(&self) -> bool {
        self.has(RaceFlags::ANIMAL)
    }

    pub const fn multiplies(&self) -> bool {
        self.has(RaceFlags::MULTIPLY)
    }

    pub const fn is_quantum(&self) -> bool {
        self.has(RaceFlags::QUANTUM)
    }

    pub const fn is_stupid(&self) -> bool {
        self.has(RaceFlags::STUPID)
    }

    pub const fn opens_doors(&self) -> bool {
        self.has(RaceFlags::OPEN_DOOR)
    }

    pub const fn bashes_doors(&self) -> bool {
        self.has(RaceFlags::BASH_DOOR)
    }

    /// Opens or bashes doors
    pub const fn handles_doors(&self) -> bool {
        self.opens_doors() || self.bashes_doors()
    }

    pub const fn passes_walls(&self) -> bool {
        self.has(RaceFlags::PASS_WALL)
    }

    pub const fn kills_walls(&self) -> bool {
        self.has(RaceFlags::KILL_WALL)
    }

    pub const fn moves_bodies(&self) -> bool {
        self.has(RaceFlags::MOVE_BODY)
    }

    pub const fn kills_bodies(&self) -> bool {
        self.has(RaceFlags::KILL_BODY)
    }

    pub const fn takes_items(&self) -> bool {
        self.has(RaceFlags::TAKE_ITEM)
    }

    pub const fn kills_items(&self) -> bool {
        self.has(RaceFlags::KILL_ITEM)
    }

    pub const fn flies(&self) -> bool {
        self.has(RaceFlags::CAN_FLY)
    }

    pub const fn swims(&self) -> bool {
        self.has(RaceFlags::CAN_SWIM)
    }

    pub const fn is_aquatic(&self) -> bool {
        self.has(RaceFlags::AQUATIC)
    }

    pub const fn wood_dweller(&self) -> bool {
        self.has(RaceFlags::WILD_WOOD)
    }

    pub const fn can_be_ridden(&self) -> bool {
        self.has(RaceFlags::RIDING)
    }

    pub const fn resists_all(&self) -> bool {
        self.has(RaceFlags::RES_ALL)
    }

    pub const fn resists_fire(&self) -> bool {
        self.immunities.contains(Elements::FIRE)
    }

    pub const fn carries_light(&self) -> bool {
        self.flags.intersects(RaceFlags::LIGHT_MASK)
    }

    /// Knows any spell that needs a clear shot
    pub const fn has_attack_spells(&self) -> bool {
        self.spells.intersects(SpellSet::ATTACK)
    }

    /// Experience times level; decides who may trample whom
    pub const fn threat_value(&self) -> i64 {
        self.mexp as i64 * self.level as i64
    }
}

/// What the player has learned about a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RaceLore {
    pub flags: RaceFlags,
    pub wakes: u8,
}

/// All races known to a world, plus the player's lore about them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bestiary {
    races: Vec<MonsterRace>,
    lore: HashMap<RaceId, RaceLore>,
}

impl Bestiary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, race: MonsterRace) -> RaceId {
        self.races.push(race);
        RaceId((self.races.len() - 1) as u16)
    }

    pub fn get(&self, id: RaceId) -> Option<&MonsterRace> {
        self.races.get(id.0 as usize)
    }

    pub fn get_or_err(&self, id: RaceId) -> Result<&MonsterRace, EngineError> {
        self.get(id).ok_or(EngineError::UnknownRace(id))
    }

    pub fn len(&self) -> usize {
        self.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }

    pub fn lore(&self, id: RaceId) -> RaceLore {
        self.lore.get(&id).copied().unwrap_or_default()
    }

    /// Record observed flags; returns true if anything new was learned
    pub fn learn(&mut self, id: RaceId, flags: RaceFlags) -> bool {
        if flags.is_empty() {
            return false;
        }
        let entry = self.lore.entry(id).or_default();
        let before = entry.flags;
        entry.flags |= flags;
        entry.flags != before
    }

    pub fn note_wake(&mut self, id: RaceId) {
        let entry = self.lore.entry(id).or_default();
        entry.wakes = entry.wakes.saturating_add(1);
    }
}
