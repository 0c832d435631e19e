//! The world the monster engine runs against

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::{AiConfig, EngineError};
use crate::dungeon::{can_cross, distance, los, CrossMode, FeatureFlags, Floor, Pos};
use crate::monster::{Bestiary, Direction, Monster, MonsterFlags, MonsterId, MonsterRace, RingTable};
use crate::player::Player;
use crate::rng::GameRng;

bitflags! {
    /// Derived state that must be recomputed by the outer game loop
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u8 {
        /// Sound and scent fields
        const FLOW = 0x01;
        /// Player's field of view
        const VIEW = 0x02;
        /// Light cast by monsters
        const MON_LITE = 0x04;
        /// Player bonuses (mount changed state)
        const BONUS = 0x08;
        /// Monster recall window
        const MONSTER_RECALL = 0x10;
    }
}

// Manual serde for DirtyFlags
impl Serialize for DirtyFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DirtyFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(DirtyFlags::from_bits_truncate(bits))
    }
}

/// Everything one monster turn can read or change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub floor: Floor,
    pub player: Player,
    pub bestiary: Bestiary,
    pub rng: GameRng,
    pub config: AiConfig,

    /// Offset rings, built once
    #[serde(skip)]
    pub rings: RingTable,

    /// Game turn counter
    pub turn: u32,

    /// Arena battle: everyone fights everyone, the player only watches
    pub arena: bool,

    /// The current dungeon forbids melee
    pub no_melee: bool,

    pub dirty: DirtyFlags,

    /// Cells whose display must be refreshed
    pub redraw: Vec<Pos>,
}

impl World {
    pub fn new(floor: Floor, player: Player, bestiary: Bestiary, seed: u64) -> Self {
        Self {
            floor,
            player,
            bestiary,
            rng: GameRng::new(seed),
            config: AiConfig::default(),
            rings: RingTable::new(),
            turn: 0,
            arena: false,
            no_melee: false,
            dirty: DirtyFlags::empty(),
            redraw: Vec::new(),
        }
    }

    pub fn race_of(&self, id: MonsterId) -> Result<&MonsterRace, EngineError> {
        let monster = self.floor.monster_or_err(id)?;
        self.bestiary.get_or_err(monster.race)
    }

    /// Place a monster and keep the breeder count current
    pub fn spawn_monster(&mut self, monster: Monster) -> Result<MonsterId, EngineError> {
        let breeds = self.bestiary.get_or_err(monster.race)?.multiplies();
        let id = self.floor.place_monster(monster)?;
        if breeds {
            self.floor.num_repro += 1;
        }
        Ok(id)
    }

    /// Take a monster off the floor, forgetting every reference to it
    pub fn remove_monster(&mut self, id: MonsterId) -> Result<Monster, EngineError> {
        let monster = self.floor.remove_monster(id)?;
        if self
            .bestiary
            .get(monster.race)
            .is_some_and(MonsterRace::multiplies)
        {
            self.floor.num_repro -= 1;
        }
        if self.player.riding == Some(id) {
            self.player.riding = None;
            self.player.riding_pinch = 0;
            self.dirty |= DirtyFlags::BONUS;
        }
        if self.player.riding_target == Some(id) {
            self.player.riding_target = None;
        }
        if self.player.pet_target == Some(id) {
            self.player.pet_target = None;
        }
        self.redraw.push(monster.pos);
        Ok(monster)
    }

    /// Grid distance from the monster to the player
    pub fn player_distance(&self, id: MonsterId) -> Result<i32, EngineError> {
        Ok(distance(self.floor.monster_or_err(id)?.pos, self.player.pos))
    }

    /// The player has line of sight to `pos` within sight range
    pub fn player_can_see(&self, pos: Pos) -> bool {
        distance(self.player.pos, pos) <= self.config.max_sight && los(&self.floor, self.player.pos, pos)
    }

    /// Refresh whether the player can see this monster
    pub fn update_monster_visibility(&mut self, id: MonsterId) {
        let Some(pos) = self.floor.monster(id).map(|m| m.pos) else {
            return;
        };
        let in_view = self.player.riding == Some(id) || self.player_can_see(pos);
        if let Some(monster) = self.floor.monster_mut(id) {
            monster.flags.set(MonsterFlags::IN_VIEW, in_view);
            monster.flags.set(MonsterFlags::VISIBLE, in_view);
        }
    }

    pub fn update_all_visibility(&mut self) {
        for id in self.floor.monster_ids() {
            self.update_monster_visibility(id);
        }
    }

    /// The player falls or is thrown off the mount
    ///
    /// The player lands on the first free neighbouring cell; with none, the
    /// player stays mounted and this returns false.
    pub fn dismount(&mut self) -> bool {
        let Some(mount) = self.player.riding else {
            return false;
        };
        let from = self.player.pos;
        let landing = Direction::SCAN_ORDER.iter().rev().map(|d| d.step(from)).find(|&pos| {
            self.floor.monster_at(pos).is_none()
                && self
                    .floor
                    .feature(pos)
                    .is_some_and(|f| f.has(FeatureFlags::MOVE))
        });
        let Some(landing) = landing else {
            return false;
        };

        self.player.pos = landing;
        self.player.riding = None;
        self.player.riding_pinch = 0;
        self.dirty |= DirtyFlags::BONUS | DirtyFlags::VIEW | DirtyFlags::FLOW;
        self.redraw.push(from);
        self.redraw.push(landing);
        self.update_monster_visibility(mount);
        true
    }

    /// Default offspring placement: a random free neighbour the parent's
    /// race can stand on
    pub fn place_offspring(&mut self, parent: MonsterId) -> Option<MonsterId> {
        let (race_id, pos, allegiance) = {
            let m = self.floor.monster(parent)?;
            (m.race, m.pos, m.allegiance)
        };
        let race = self.bestiary.get(race_id)?.clone();

        let free: Vec<Pos> = Direction::SCAN_ORDER
            .iter()
            .map(|d| d.step(pos))
            .filter(|&cell| {
                cell != self.player.pos
                    && self.floor.monster_at(cell).is_none()
                    && self
                        .floor
                        .feature(cell)
                        .is_some_and(|f| can_cross(f, &race, CrossMode::Free))
            })
            .collect();
        if free.is_empty() {
            return None;
        }
        let cell = free[self.rng.rand_int0(free.len() as i32) as usize];

        let mut child = Monster::new(race_id, cell, race.max_hp);
        child.allegiance = allegiance;
        child.speed = race.speed;
        child.flags |= MonsterFlags::BORN;
        child.parent = None;
        let id = self.spawn_monster(child).ok()?;
        self.update_monster_visibility(id);
        self.redraw.push(cell);
        Some(id)
    }

    /// Snapshot as JSON, for determinism checks and debugging
    ///
    /// Includes the generator position. Map keys are sorted, so equal worlds
    /// give equal strings.
    pub fn snapshot(&self) -> Result<String, EngineError> {
        let value = serde_json::to_value(self).map_err(|e| EngineError::Snapshot(e.to_string()))?;
        serde_json::to_string(&value).map_err(|e| EngineError::Snapshot(e.to_string()))
    }

    /// Rebuild a world from [`World::snapshot`] output
    pub fn from_snapshot(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::Snapshot(e.to_string()))
    }
}
