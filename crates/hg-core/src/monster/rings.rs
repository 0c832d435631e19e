//! Precomputed rings of offsets for the safety and hiding searches
//!
//! Ring `d` holds every offset whose grid distance from the origin is
//! exactly `d`. Offsets are ordered from the origin outward on each axis:
//! rows above the origin nearest first, then the origin row, then rows
//! below; within a row the same rule applies to columns. Searches keep the
//! first of several equally good cells, so this order decides ties.

use crate::consts::MAX_RING_RADIUS;
use crate::dungeon::{distance, Pos};

/// Offset rings for radius 1 through `MAX_RING_RADIUS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingTable {
    /// `rings[d - 1]` is ring `d`
    rings: Vec<Vec<(i32, i32)>>,
}

/// Negative side nearest first, then zero, then positive side nearest first
const fn outward(v: i32) -> (i32, i32) {
    (v.signum(), v.abs())
}

impl RingTable {
    pub fn new() -> Self {
        let origin = Pos::new(0, 0);
        let rings = (1..=MAX_RING_RADIUS)
            .map(|d| {
                let mut ring = Vec::new();
                for dy in -d..=d {
                    for dx in -d..=d {
                        if distance(origin, Pos::new(dy, dx)) == d {
                            ring.push((dy, dx));
                        }
                    }
                }
                ring.sort_by_key(|&(dy, dx)| (outward(dy), outward(dx)));
                ring
            })
            .collect();
        Self { rings }
    }

    /// Offsets at distance `d`; empty outside `1..=MAX_RING_RADIUS`
    pub fn ring(&self, d: i32) -> &[(i32, i32)] {
        if d < 1 {
            return &[];
        }
        self.rings
            .get((d - 1) as usize)
            .map_or(&[], |ring| ring.as_slice())
    }

    /// Iterate rings from the innermost out, with their radius
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[(i32, i32)])> {
        self.rings
            .iter()
            .enumerate()
            .map(|(i, ring)| (i as i32 + 1, ring.as_slice()))
    }

    pub const fn max_radius(&self) -> i32 {
        MAX_RING_RADIUS
    }
}

impl Default for RingTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_ring_is_the_neighbourhood() {
        let table = RingTable::new();
        let ring = table.ring(1);
        assert_eq!(ring.len(), 8);
        assert_eq!(ring[0], (-1, -1));
        assert!(!ring.contains(&(0, 0)));
    }

    #[test]
    fn test_rings_run_outward_from_the_origin() {
        let table = RingTable::new();
        assert_eq!(
            table.ring(1),
            &[(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)]
        );
        assert_eq!(
            table.ring(4),
            &[
                (-1, -4), (-1, 4), (-2, -3), (-2, 3), (-3, -2), (-3, -3), (-3, 2), (-3, 3),
                (-4, -1), (-4, 0), (-4, 1), (0, -4), (0, 4), (1, -4), (1, 4), (2, -3),
                (2, 3), (3, -2), (3, -3), (3, 2), (3, 3), (4, -1), (4, 0), (4, 1),
            ]
        );
    }

    #[test]
    fn test_second_ring_excludes_far_corners() {
        let table = RingTable::new();
        let ring = table.ring(2);
        assert_eq!(ring.len(), 12);
        assert!(ring.contains(&(-1, -2)));
        assert!(!ring.contains(&(-2, -2)));
    }

    #[test]
    fn test_every_offset_matches_its_radius() {
        let table = RingTable::new();
        let origin = Pos::new(0, 0);
        for (d, ring) in table.iter() {
            assert!(!ring.is_empty());
            for &(dy, dx) in ring {
                assert_eq!(distance(origin, Pos::new(dy, dx)), d);
            }
        }
        assert_eq!(table.iter().count(), MAX_RING_RADIUS as usize);
    }

    #[test]
    fn test_out_of_range_rings_are_empty() {
        let table = RingTable::new();
        assert!(table.ring(0).is_empty());
        assert!(table.ring(MAX_RING_RADIUS + 1).is_empty());
    }
}
