//! Grid coordinates

use core::fmt;

use serde::{Deserialize, Serialize};

/// A cell coordinate, row first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub const fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }

    /// Position shifted by an offset
    pub const fn offset(self, dy: i32, dx: i32) -> Self {
        Self {
            y: self.y + dy,
            x: self.x + dx,
        }
    }

    /// Offset from `self` to `other`
    pub const fn delta_to(self, other: Pos) -> (i32, i32) {
        (other.y - self.y, other.x - self.x)
    }

    /// True if `other` is one of the eight neighbours (or the same cell)
    pub const fn is_adjacent(self, other: Pos) -> bool {
        (self.y - other.y).abs() <= 1 && (self.x - other.x).abs() <= 1
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.y, self.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_delta() {
        let p = Pos::new(5, 5);
        let q = p.offset(-2, 3);
        assert_eq!(q, Pos::new(3, 8));
        assert_eq!(p.delta_to(q), (-2, 3));
        assert!(p.is_adjacent(p.offset(1, -1)));
        assert!(!p.is_adjacent(q));
    }
}
