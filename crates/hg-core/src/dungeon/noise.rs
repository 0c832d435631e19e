//! Sound and scent fields
//!
//! Two scalar fields laid over the grid, both pointing back at the player:
//! the sound cost (a propagated walking cost, lower is closer) and the scent
//! timestamp (when the player last stood on the cell). An external pass
//! writes them once per player action; the monster engine only reads them.
//!
//! The scent field is a fallback for when the sound cost has not reached a
//! monster's cell yet.

use super::{Floor, Pos};

/// Read-only view of the noise fields
#[derive(Debug, Clone, Copy)]
pub struct NoiseField<'a> {
    floor: &'a Floor,
}

impl<'a> NoiseField<'a> {
    pub fn new(floor: &'a Floor) -> Self {
        Self { floor }
    }

    /// Sound cost at a cell, `None` if the sound has not reached it
    pub fn sound_cost(&self, pos: Pos) -> Option<u16> {
        self.floor.cell(pos).map(|c| c.cost).filter(|&c| c != 0)
    }

    /// Flow distance counting passage through doors, `None` if unset
    pub fn flow_distance(&self, pos: Pos) -> Option<u16> {
        self.floor.cell(pos).map(|c| c.dist).filter(|&d| d != 0)
    }

    /// Scent timestamp at a cell, `None` if the player was never there
    pub fn scent(&self, pos: Pos) -> Option<u32> {
        self.floor.cell(pos).map(|c| c.when).filter(|&w| w != 0)
    }

    /// Raw sound cost, 0 when unset
    pub fn raw_cost(&self, pos: Pos) -> i32 {
        self.floor.cell(pos).map_or(0, |c| i32::from(c.cost))
    }

    /// Raw flow distance, 0 when unset
    pub fn raw_distance(&self, pos: Pos) -> i32 {
        self.floor.cell(pos).map_or(0, |c| i32::from(c.dist))
    }

    /// Raw scent timestamp, 0 when unset
    pub fn raw_scent(&self, pos: Pos) -> i64 {
        self.floor.cell(pos).map_or(0, |c| i64::from(c.when))
    }

    /// A scent at `pos` is usable unless it is `stale_after` ticks or more
    /// older than the scent under the player
    pub fn scent_is_fresh(&self, pos: Pos, player: Pos, stale_after: u32) -> bool {
        match self.scent(pos) {
            Some(_) => self.raw_scent(player) - self.raw_scent(pos) < i64::from(stale_after),
            None => false,
        }
    }
}

impl Floor {
    pub fn noise(&self) -> NoiseField<'_> {
        NoiseField::new(self)
    }

    /// Write sound cost and flow distance; used by the propagation pass
    pub fn set_flow(&mut self, pos: Pos, cost: u16, dist: u16) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.cost = cost;
            cell.dist = dist;
        }
    }

    /// Stamp a scent; used by the propagation pass
    pub fn set_scent(&mut self, pos: Pos, when: u32) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.when = when;
        }
    }

    /// Forget all sound costs and flow distances
    pub fn clear_flow(&mut self) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.set_flow(Pos::new(y, x), 0, 0);
            }
        }
    }
}
