//! Compass directions and move plans
//!
//! Directions are numbered like a keypad (7 8 9 / 4 . 6 / 1 2 3).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::dungeon::Pos;
use crate::rng::GameRng;

/// One of the eight compass directions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum Direction {
    SouthWest = 1,
    South = 2,
    SouthEast = 3,
    West = 4,
    East = 6,
    NorthWest = 7,
    North = 8,
    NorthEast = 9,
}

impl Direction {
    /// Scan order used by the neighbour searches: orthogonals first, then
    /// diagonals. Searches walk it backwards so diagonals are tried first.
    pub const SCAN_ORDER: [Direction; 8] = [
        Direction::South,
        Direction::North,
        Direction::East,
        Direction::West,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthEast,
        Direction::NorthWest,
    ];

    pub const fn keypad(self) -> u8 {
        self as u8
    }

    pub const fn from_keypad(key: u8) -> Option<Direction> {
        match key {
            1 => Some(Direction::SouthWest),
            2 => Some(Direction::South),
            3 => Some(Direction::SouthEast),
            4 => Some(Direction::West),
            6 => Some(Direction::East),
            7 => Some(Direction::NorthWest),
            8 => Some(Direction::North),
            9 => Some(Direction::NorthEast),
            _ => None,
        }
    }

    pub const fn dy(self) -> i32 {
        match self {
            Direction::SouthWest | Direction::South | Direction::SouthEast => 1,
            Direction::West | Direction::East => 0,
            Direction::NorthWest | Direction::North | Direction::NorthEast => -1,
        }
    }

    pub const fn dx(self) -> i32 {
        match self {
            Direction::SouthWest | Direction::West | Direction::NorthWest => -1,
            Direction::South | Direction::North => 0,
            Direction::SouthEast | Direction::East | Direction::NorthEast => 1,
        }
    }

    pub const fn is_diagonal(self) -> bool {
        self.dy() != 0 && self.dx() != 0
    }

    /// Neighbouring cell in this direction
    pub const fn step(self, from: Pos) -> Pos {
        from.offset(self.dy(), self.dx())
    }

    /// Uniformly random direction
    pub fn random(rng: &mut GameRng) -> Direction {
        Self::SCAN_ORDER[rng.rand_int0(8) as usize]
    }

    /// Primary direction toward an offset plus the two neighbouring
    /// fallbacks, judged by the signs of the offset alone
    pub const fn toward(dy: i32, dx: i32) -> Option<[Direction; 3]> {
        use Direction::*;
        let list = match (dy.signum(), dx.signum()) {
            (-1, 0) => [North, NorthWest, NorthEast],
            (1, 0) => [South, SouthWest, SouthEast],
            (0, 1) => [East, NorthEast, SouthEast],
            (0, -1) => [West, NorthWest, SouthWest],
            (-1, -1) => [NorthWest, West, North],
            (-1, 1) => [NorthEast, East, North],
            (1, -1) => [SouthWest, West, South],
            (1, 1) => [SouthEast, East, South],
            _ => return None,
        };
        Some(list)
    }

    /// Five directions to try, best first, for a monster that wants to
    /// travel by `(dy, dx)`
    ///
    /// The dominant axis wins outright when it is more than twice the
    /// other; otherwise the diagonal is preferred. This keeps monsters from
    /// zig-zagging around the target.
    pub const fn preference_list(dy: i32, dx: i32) -> Option<[Direction; 5]> {
        use Direction::*;

        // Work in "monster minus goal" terms, as the flee code does
        let y = -dy;
        let x = -dx;
        if y == 0 && x == 0 {
            return None;
        }
        let ay = y.abs();
        let ax = x.abs();

        let mut move_val = 0;
        if y < 0 {
            move_val += 8;
        }
        if x > 0 {
            move_val += 4;
        }
        if ay > ax * 2 {
            move_val += 2;
        } else if ax > ay * 2 {
            move_val += 1;
        }

        let list = match move_val {
            0 => {
                if ay > ax {
                    [NorthEast, North, East, NorthWest, SouthEast]
                } else {
                    [NorthEast, East, North, SouthEast, NorthWest]
                }
            }
            1 | 9 => {
                if y < 0 {
                    [East, SouthEast, NorthEast, South, North]
                } else {
                    [East, NorthEast, SouthEast, North, South]
                }
            }
            2 | 6 => {
                if x < 0 {
                    [North, NorthEast, NorthWest, East, West]
                } else {
                    [North, NorthWest, NorthEast, West, East]
                }
            }
            4 => {
                if ay > ax {
                    [NorthWest, North, West, NorthEast, SouthWest]
                } else {
                    [NorthWest, West, North, SouthWest, NorthEast]
                }
            }
            5 | 13 => {
                if y < 0 {
                    [West, SouthWest, NorthWest, South, North]
                } else {
                    [West, NorthWest, SouthWest, North, South]
                }
            }
            8 => {
                if ay > ax {
                    [SouthEast, South, East, SouthWest, NorthEast]
                } else {
                    [SouthEast, East, South, NorthEast, SouthWest]
                }
            }
            10 | 14 => {
                if x < 0 {
                    [South, SouthEast, SouthWest, East, West]
                } else {
                    [South, SouthWest, SouthEast, West, East]
                }
            }
            _ => {
                if ay > ax {
                    [SouthWest, South, West, SouthEast, NorthWest]
                } else {
                    [SouthWest, West, South, NorthWest, SouthEast]
                }
            }
        };
        Some(list)
    }
}

/// One entry of a move plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveChoice {
    Dir(Direction),
    /// Pick a fresh random direction each time this entry is reached
    Random,
}

/// Ordered directions handed to the movement resolver
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MovePlan {
    choices: Vec<MoveChoice>,
}

impl MovePlan {
    pub const MAX_CHOICES: usize = 8;

    pub fn new() -> Self {
        Self::default()
    }

    /// Four random attempts
    pub fn random() -> Self {
        Self {
            choices: vec![MoveChoice::Random; 4],
        }
    }

    pub fn from_directions(dirs: &[Direction]) -> Self {
        Self {
            choices: dirs
                .iter()
                .take(Self::MAX_CHOICES)
                .map(|&d| MoveChoice::Dir(d))
                .collect(),
        }
    }

    pub fn push(&mut self, choice: MoveChoice) {
        if self.choices.len() < Self::MAX_CHOICES {
            self.choices.push(choice);
        }
    }

    pub fn choices(&self) -> &[MoveChoice] {
        &self.choices
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_keypad_roundtrip() {
        for dir in Direction::iter() {
            assert_eq!(Direction::from_keypad(dir.keypad()), Some(dir));
        }
        assert_eq!(Direction::from_keypad(5), None);
    }

    #[test]
    fn test_deltas() {
        assert_eq!((Direction::North.dy(), Direction::North.dx()), (-1, 0));
        assert_eq!((Direction::SouthWest.dy(), Direction::SouthWest.dx()), (1, -1));
        assert_eq!(Direction::East.step(Pos::new(4, 4)), Pos::new(4, 5));
        assert!(Direction::NorthEast.is_diagonal());
        assert!(!Direction::West.is_diagonal());
    }

    #[test]
    fn test_toward() {
        assert_eq!(
            Direction::toward(-3, 0),
            Some([Direction::North, Direction::NorthWest, Direction::NorthEast])
        );
        assert_eq!(
            Direction::toward(2, 5),
            Some([Direction::SouthEast, Direction::East, Direction::South])
        );
        assert_eq!(Direction::toward(0, 0), None);
    }

    #[test]
    fn test_preference_list_axes() {
        assert_eq!(Direction::preference_list(-4, 0).unwrap()[0], Direction::North);
        assert_eq!(Direction::preference_list(4, 0).unwrap()[0], Direction::South);
        assert_eq!(Direction::preference_list(0, 4).unwrap()[0], Direction::East);
        assert_eq!(Direction::preference_list(0, -4).unwrap()[0], Direction::West);
        assert_eq!(Direction::preference_list(0, 0), None);
    }

    #[test]
    fn test_preference_list_diagonals() {
        assert_eq!(
            Direction::preference_list(-2, 3),
            Some([
                Direction::NorthEast,
                Direction::East,
                Direction::North,
                Direction::SouthEast,
                Direction::NorthWest
            ])
        );
        assert_eq!(Direction::preference_list(1, -1).unwrap()[0], Direction::SouthWest);
        assert_eq!(Direction::preference_list(5, 3).unwrap()[0], Direction::SouthEast);
    }

    #[test]
    fn test_preference_list_entries_distinct() {
        for dy in -6..=6 {
            for dx in -6..=6 {
                if let Some(list) = Direction::preference_list(dy, dx) {
                    for (i, a) in list.iter().enumerate() {
                        for b in &list[i + 1..] {
                            assert_ne!(a, b, "duplicate in list for ({dy}, {dx})");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_move_plan_caps_length() {
        let mut plan = MovePlan::random();
        assert_eq!(plan.len(), 4);
        for _ in 0..10 {
            plan.push(MoveChoice::Random);
        }
        assert_eq!(plan.len(), MovePlan::MAX_CHOICES);
    }
}
