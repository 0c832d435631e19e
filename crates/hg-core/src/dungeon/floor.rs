//! The current dungeon floor: terrain grid plus the live monster list
//!
//! Monster occupancy is recorded twice, once on the monster (`Monster::pos`)
//! and once on the cell (`Cell::monster`). Every mutation here updates both
//! sides or neither.

use serde::{Deserialize, Serialize};

use super::{Cell, FeatAction, Feature, FeatureId, FeatureTable, Pos};
use crate::monster::{Monster, MonsterId};
use crate::world::EngineError;

/// Terrain grid and monster list for one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    features: FeatureTable,
    height: i32,
    width: i32,
    /// Row-major: `cells[y][x]`
    cells: Vec<Vec<Cell>>,
    /// Slot 0 is never used so that `MonsterId(0)` stays invalid
    monsters: Vec<Option<Monster>>,
    /// Number of breeders currently on the floor
    pub num_repro: i32,
}

impl Floor {
    /// Create a floor filled with one feature, using the standard terrain set
    pub fn new(height: i32, width: i32, fill: FeatureId) -> Self {
        Self::with_features(FeatureTable::standard(), height, width, fill)
    }

    pub fn with_features(features: FeatureTable, height: i32, width: i32, fill: FeatureId) -> Self {
        let height = height.max(1);
        let width = width.max(1);
        Self {
            features,
            height,
            width,
            cells: vec![vec![Cell::new(fill); width as usize]; height as usize],
            monsters: vec![None],
            num_repro: 0,
        }
    }

    pub const fn height(&self) -> i32 {
        self.height
    }

    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Inside the grid, border included
    pub const fn contains(&self, pos: Pos) -> bool {
        pos.y >= 0 && pos.x >= 0 && pos.y < self.height && pos.x < self.width
    }

    /// Inside the grid, border excluded
    pub const fn in_interior(&self, pos: Pos) -> bool {
        pos.y > 0 && pos.x > 0 && pos.y < self.height - 1 && pos.x < self.width - 1
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        if !self.contains(pos) {
            return None;
        }
        Some(&self.cells[pos.y as usize][pos.x as usize])
    }

    pub fn cell_mut(&mut self, pos: Pos) -> Option<&mut Cell> {
        if !self.contains(pos) {
            return None;
        }
        Some(&mut self.cells[pos.y as usize][pos.x as usize])
    }

    fn cell_or_err(&self, pos: Pos) -> Result<&Cell, EngineError> {
        self.cell(pos).ok_or(EngineError::OutOfBounds(pos))
    }

    fn cell_mut_or_err(&mut self, pos: Pos) -> Result<&mut Cell, EngineError> {
        self.cell_mut(pos).ok_or(EngineError::OutOfBounds(pos))
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    /// Feature id at a position
    pub fn feature_id(&self, pos: Pos) -> Option<FeatureId> {
        self.cell(pos).map(|c| c.feat)
    }

    /// Terrain description at a position
    pub fn feature(&self, pos: Pos) -> Option<&Feature> {
        self.feature_id(pos).and_then(|id| self.features.get(id))
    }

    pub fn feature_or_err(&self, pos: Pos) -> Result<&Feature, EngineError> {
        let id = self.cell_or_err(pos)?.feat;
        self.features.get(id).ok_or(EngineError::UnknownFeature(id.0))
    }

    pub fn set_feature(&mut self, pos: Pos, feat: FeatureId) -> Result<(), EngineError> {
        if self.features.get(feat).is_none() {
            return Err(EngineError::UnknownFeature(feat.0));
        }
        self.cell_mut_or_err(pos)?.feat = feat;
        Ok(())
    }

    /// Apply a terrain transition; returns false when the action does not
    /// apply to the feature there
    pub fn alter_feature(&mut self, pos: Pos, action: FeatAction) -> Result<bool, EngineError> {
        match self.feature_or_err(pos)?.transition(action) {
            Some(next) => {
                self.set_feature(pos, next)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Monster standing at a position
    pub fn monster_at(&self, pos: Pos) -> Option<MonsterId> {
        self.cell(pos).and_then(|c| c.monster)
    }

    /// Get monster by ID
    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Get mutable monster by ID
    pub fn monster_mut(&mut self, id: MonsterId) -> Option<&mut Monster> {
        self.monsters.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn monster_or_err(&self, id: MonsterId) -> Result<&Monster, EngineError> {
        self.monster(id).ok_or(EngineError::UnknownMonster(id))
    }

    pub fn monster_mut_or_err(&mut self, id: MonsterId) -> Result<&mut Monster, EngineError> {
        self.monster_mut(id).ok_or(EngineError::UnknownMonster(id))
    }

    /// Number of monster slots, including the unused slot 0 and free slots
    pub fn monster_slots(&self) -> usize {
        self.monsters.len()
    }

    /// Ids of all live monsters in ascending slot order
    pub fn monster_ids(&self) -> Vec<MonsterId> {
        self.monsters
            .iter()
            .filter_map(|slot| slot.as_ref().map(|m| m.id))
            .collect()
    }

    pub fn monsters(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.iter().filter_map(Option::as_ref)
    }

    pub fn monster_count(&self) -> usize {
        self.monsters().count()
    }

    /// Add a monster at its recorded position, reusing a free slot if any
    pub fn place_monster(&mut self, mut monster: Monster) -> Result<MonsterId, EngineError> {
        let pos = monster.pos;
        if self.cell_or_err(pos)?.monster.is_some() {
            return Err(EngineError::Occupied(pos));
        }

        let slot = match self.monsters.iter().skip(1).position(Option::is_none) {
            Some(free) => free + 1,
            None => {
                self.monsters.push(None);
                self.monsters.len() - 1
            }
        };

        let id = MonsterId(slot as u32);
        monster.id = id;
        self.cell_mut_or_err(pos)?.monster = Some(id);
        self.monsters[slot] = Some(monster);
        Ok(id)
    }

    /// Move a monster into an empty cell
    pub fn relocate_monster(&mut self, id: MonsterId, to: Pos) -> Result<(), EngineError> {
        let from = self.monster_or_err(id)?.pos;
        if self.cell_or_err(to)?.monster.is_some() {
            return Err(EngineError::Occupied(to));
        }
        if self.cell_or_err(from)?.monster != Some(id) {
            return Err(EngineError::OccupancyDesync { id, pos: from });
        }

        self.cell_mut_or_err(from)?.monster = None;
        self.cell_mut_or_err(to)?.monster = Some(id);
        self.monster_mut_or_err(id)?.pos = to;
        Ok(())
    }

    /// Exchange the cells of two monsters
    pub fn swap_monsters(&mut self, a: MonsterId, b: MonsterId) -> Result<(), EngineError> {
        let pos_a = self.monster_or_err(a)?.pos;
        let pos_b = self.monster_or_err(b)?.pos;
        if self.cell_or_err(pos_a)?.monster != Some(a) {
            return Err(EngineError::OccupancyDesync { id: a, pos: pos_a });
        }
        if self.cell_or_err(pos_b)?.monster != Some(b) {
            return Err(EngineError::OccupancyDesync { id: b, pos: pos_b });
        }

        self.cell_mut_or_err(pos_a)?.monster = Some(b);
        self.cell_mut_or_err(pos_b)?.monster = Some(a);
        self.monster_mut_or_err(a)?.pos = pos_b;
        self.monster_mut_or_err(b)?.pos = pos_a;
        Ok(())
    }

    /// Remove a monster from the floor and free its slot
    pub fn remove_monster(&mut self, id: MonsterId) -> Result<Monster, EngineError> {
        let pos = self.monster_or_err(id)?.pos;
        let cell = self.cell_mut_or_err(pos)?;
        if cell.monster != Some(id) {
            return Err(EngineError::OccupancyDesync { id, pos });
        }
        cell.monster = None;
        self.monsters[id.0 as usize]
            .take()
            .ok_or(EngineError::UnknownMonster(id))
    }

    /// Occupied cells in the 3x3 block centred on `pos`, centre included
    pub fn count_monsters_around(&self, pos: Pos) -> usize {
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if self.monster_at(pos.offset(dy, dx)).is_some() {
                    count += 1;
                }
            }
        }
        count
    }

    /// Verify that the monster list and the grid agree
    pub fn check_occupancy(&self) -> Result<(), EngineError> {
        for monster in self.monsters() {
            let cell = self.cell_or_err(monster.pos)?;
            if cell.monster != Some(monster.id) {
                return Err(EngineError::OccupancyDesync {
                    id: monster.id,
                    pos: monster.pos,
                });
            }
        }
        for (y, row) in self.cells.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Some(id) = cell.monster {
                    let pos = Pos::new(y as i32, x as i32);
                    match self.monster(id) {
                        Some(m) if m.pos == pos => {}
                        _ => return Err(EngineError::OccupancyDesync { id, pos }),
                    }
                }
            }
        }
        Ok(())
    }
}
