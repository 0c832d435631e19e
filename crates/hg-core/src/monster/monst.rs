//! Monster instances

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::RaceId;
use crate::consts::NORMAL_SPEED;
use crate::dungeon::Pos;
use crate::object::Item;

/// Unique identifier for monster instances (its slot on the floor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonsterId(pub u32);

impl MonsterId {
    pub const NONE: MonsterId = MonsterId(0);
}

/// Who the monster sides with
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Allegiance {
    #[default]
    Hostile,
    /// Peaceful toward the player but not under command
    Friendly,
    Pet,
}

bitflags! {
    /// Transient per-monster flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MonsterFlags: u16 {
        /// Created this game turn; skips its first scan
        const BORN = 0x0001;
        /// Suppress sound/scent pursuit this turn
        const NOFLOW = 0x0002;
        /// Shape-changer
        const CHAMELEON = 0x0004;
        /// Currently visible to the player
        const VISIBLE = 0x0008;
        /// In the player's line of sight
        const IN_VIEW = 0x0010;
    }
}

// Manual serde for MonsterFlags
impl Serialize for MonsterFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MonsterFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(MonsterFlags::from_bits_truncate(bits))
    }
}

/// Status timers; a non-zero value means the status is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MonsterTimers {
    pub sleep: i16,
    pub confused: i16,
    pub stunned: i16,
    pub afraid: i16,
    pub fast: i16,
    pub slow: i16,
}

/// A monster on the current floor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub id: MonsterId,

    /// Actual race
    pub race: RaceId,

    /// Race the player sees (differs under illusions and mimicry)
    pub appearance: RaceId,

    pub pos: Pos,

    pub hp: i32,
    pub max_hp: i32,

    pub timers: MonsterTimers,

    pub allegiance: Allegiance,

    /// Last known position of an enemy this monster is fighting
    pub target: Option<Pos>,

    /// Energy still needed before the next action; acts at 0 or below
    pub energy_need: i32,

    /// Current base speed (110 = normal)
    pub speed: i16,

    pub flags: MonsterFlags,

    /// Summoner; if it disappears so does this monster
    pub parent: Option<MonsterId>,

    pub inventory: Vec<Item>,
}

impl Monster {
    pub fn new(race: RaceId, pos: Pos, hp: i32) -> Self {
        Self {
            id: MonsterId::NONE,
            race,
            appearance: race,
            pos,
            hp,
            max_hp: hp,
            timers: MonsterTimers::default(),
            allegiance: Allegiance::Hostile,
            target: None,
            energy_need: 0,
            speed: NORMAL_SPEED,
            flags: MonsterFlags::empty(),
            parent: None,
            inventory: Vec::new(),
        }
    }

    pub const fn is_pet(&self) -> bool {
        matches!(self.allegiance, Allegiance::Pet)
    }

    pub const fn is_friendly(&self) -> bool {
        matches!(self.allegiance, Allegiance::Friendly)
    }

    pub const fn is_hostile(&self) -> bool {
        matches!(self.allegiance, Allegiance::Hostile)
    }

    pub const fn is_asleep(&self) -> bool {
        self.timers.sleep > 0
    }

    pub const fn is_confused(&self) -> bool {
        self.timers.confused > 0
    }

    pub const fn is_stunned(&self) -> bool {
        self.timers.stunned > 0
    }

    pub const fn is_afraid(&self) -> bool {
        self.timers.afraid > 0
    }

    pub const fn is_fast(&self) -> bool {
        self.timers.fast > 0
    }

    pub const fn is_slow(&self) -> bool {
        self.timers.slow > 0
    }

    pub const fn is_visible(&self) -> bool {
        self.flags.contains(MonsterFlags::VISIBLE)
    }

    pub const fn is_alive(&self) -> bool {
        self.hp >= 0
    }

    /// Shown as its true race
    pub fn shows_true_form(&self) -> bool {
        self.appearance == self.race
    }

    pub fn wake(&mut self) {
        self.timers.sleep = 0;
    }

    pub fn set_hostile(&mut self) {
        self.allegiance = Allegiance::Hostile;
    }
}

/// Hostility differs, or everyone fights everyone (arena)
pub fn are_enemies(a: &Monster, b: &Monster, arena: bool) -> bool {
    if arena {
        return a.id != b.id;
    }
    a.is_hostile() != b.is_hostile()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monster() -> Monster {
        Monster::new(RaceId(1), Pos::new(3, 4), 12)
    }

    #[test]
    fn test_new_monster_defaults() {
        let m = monster();
        assert!(m.is_hostile());
        assert_eq!(m.max_hp, 12);
        assert_eq!(m.appearance, m.race);
        assert!(m.shows_true_form());
        assert!(!m.is_asleep());
        assert_eq!(m.speed, NORMAL_SPEED);
    }

    #[test]
    fn test_status_timers() {
        let mut m = monster();
        m.timers.sleep = 5;
        m.timers.afraid = 2;
        assert!(m.is_asleep());
        assert!(m.is_afraid());
        m.wake();
        assert!(!m.is_asleep());
    }

    #[test]
    fn test_are_enemies() {
        let mut a = monster();
        a.id = MonsterId(1);
        let mut b = monster();
        b.id = MonsterId(2);
        assert!(!are_enemies(&a, &b, false));
        b.allegiance = Allegiance::Pet;
        assert!(are_enemies(&a, &b, false));
        a.allegiance = Allegiance::Friendly;
        assert!(!are_enemies(&a, &b, false));
        assert!(are_enemies(&a, &b, true));
        assert!(!are_enemies(&a, &a, true));
    }
}
