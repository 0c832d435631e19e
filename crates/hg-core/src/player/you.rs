//! The player as seen by monsters

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::consts::NORMAL_SPEED;
use crate::dungeon::Pos;
use crate::monster::{MonsterId, MonsterRace, RaceFlags, RaceId};

bitflags! {
    /// Standing orders the player has given to pets
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PetOptions: u8 {
        /// Pets may open and bash doors
        const OPEN_DOORS = 0x01;
        /// Pets may pick up items
        const PICKUP_ITEMS = 0x02;
    }
}

// Manual serde for PetOptions
impl Serialize for PetOptions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PetOptions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(PetOptions::from_bits_truncate(bits))
    }
}

/// Alignment at or above which evil pets rebel
pub const GOOD_ALIGNMENT: i32 = 10;

/// Alignment at or below which good pets rebel
pub const EVIL_ALIGNMENT: i32 = -10;

/// Player state read (and occasionally written) by the monster engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Pos,
    pub level: i32,

    pub hp: i32,
    pub max_hp: i32,
    pub sp: i32,
    pub max_sp: i32,

    pub speed: i16,

    /// Positive is good, negative is evil
    pub alignment: i32,

    /// Stealth skill
    pub stealth: i32,

    /// Hiding in shadows; monsters must roll to notice the player
    pub shadow_stealth: bool,

    /// Standing in light while hiding
    pub lit: bool,

    /// Carries an aggravation curse
    pub aggravate: bool,

    /// The player's own wall-walking, needed for a mount to walk walls
    pub pass_wall: bool,

    pub hallucinating: bool,

    /// Mount the player sits on; it shares the player's cell
    pub riding: Option<MonsterId>,

    /// Fighting two-handed, so the mount picks its own way
    pub riding_two_handed: bool,

    /// Warnings a wounded mount has given before bolting
    pub riding_pinch: u8,

    /// Enemy the mount has been told to attack
    pub riding_target: Option<MonsterId>,

    /// Enemy pets have been told to attack
    pub pet_target: Option<MonsterId>,

    /// Pet leash; negative means "keep at least this far away"
    pub pet_follow_distance: i32,

    pub pet_options: PetOptions,

    /// Sound flow is not being propagated (the player is out of reach)
    pub no_flowed: bool,

    /// Race shown in the monster recall window
    pub tracked_race: Option<RaceId>,

    pub dead: bool,
    pub playing: bool,
    /// Changing level; stops the monster scan
    pub leaving: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Pos::default(),
            level: 1,
            hp: 10,
            max_hp: 10,
            sp: 0,
            max_sp: 0,
            speed: NORMAL_SPEED,
            alignment: 0,
            stealth: 1,
            shadow_stealth: false,
            lit: false,
            aggravate: false,
            pass_wall: false,
            hallucinating: false,
            riding: None,
            riding_two_handed: false,
            riding_pinch: 0,
            riding_target: None,
            pet_target: None,
            pet_follow_distance: 6,
            pet_options: PetOptions::empty(),
            no_flowed: false,
            tracked_race: None,
            dead: false,
            playing: true,
            leaving: false,
        }
    }
}

impl Player {
    pub fn new(pos: Pos, level: i32, max_hp: i32) -> Self {
        Self {
            pos,
            level,
            hp: max_hp,
            max_hp,
            ..Self::default()
        }
    }

    pub const fn is_riding(&self) -> bool {
        self.riding.is_some()
    }

    /// True if `id` is the player's mount
    pub fn rides(&self, id: MonsterId) -> bool {
        self.riding == Some(id)
    }

    pub const fn pets_may_open_doors(&self) -> bool {
        self.pet_options.contains(PetOptions::OPEN_DOORS)
    }

    pub const fn pets_may_pick_up(&self) -> bool {
        self.pet_options.contains(PetOptions::PICKUP_ITEMS)
    }

    /// Race whose alignment clashes with the player's
    pub const fn clashes_with(&self, race: &MonsterRace) -> bool {
        (self.alignment >= GOOD_ALIGNMENT && race.has(RaceFlags::EVIL))
            || (self.alignment <= EVIL_ALIGNMENT && race.has(RaceFlags::GOOD))
    }

    /// Health and mana combined, scaled to 0..=8
    pub fn vigour_eighths(&self) -> i32 {
        let max = self.max_hp + self.max_sp;
        if max <= 0 {
            return 0;
        }
        (8 * (self.hp + self.sp)) / max
    }
}
