//! Spatial queries: terrain crossability, projection paths, distance
//!
//! Everything here is a pure function of the floor. These are called in
//! tight loops (eight neighbours per candidate, rings out to radius 9) so
//! they allocate nothing.

use super::{Feature, FeatureFlags, Floor, Pos};
use crate::consts::MAX_RANGE;
use crate::monster::MonsterRace;

/// Whether the creature crossing terrain is carrying the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossMode {
    #[default]
    Free,
    /// A mount; wall-passing only works if the rider can pass walls too
    Ridden { rider_passes_walls: bool },
}

/// Grid distance: the longer axis plus half the shorter one
///
/// One orthogonal or diagonal step costs 1.
pub const fn distance(a: Pos, b: Pos) -> i32 {
    let dy = (a.y - b.y).abs();
    let dx = (a.x - b.x).abs();
    if dy > dx { dy + dx / 2 } else { dx + dy / 2 }
}

/// Can a creature of `race` stand on `feature`?
pub fn can_cross(feature: &Feature, race: &MonsterRace, mode: CrossMode) -> bool {
    let rider_allows_walls = match mode {
        CrossMode::Free => true,
        CrossMode::Ridden { rider_passes_walls } => rider_passes_walls,
    };

    if feature.has(FeatureFlags::CAN_PASS) && race.passes_walls() && rider_allows_walls {
        return true;
    }

    if !feature.has(FeatureFlags::MOVE) {
        return false;
    }

    if race.is_aquatic() && !feature.has(FeatureFlags::WATER) {
        return false;
    }

    if feature.has(FeatureFlags::DEEP) {
        if matches!(mode, CrossMode::Ridden { .. }) && !race.flies() {
            return false;
        }
        if !race.flies() && !race.swims() && !race.is_aquatic() {
            return false;
        }
    }

    if feature.has(FeatureFlags::LAVA) && !race.flies() && !race.resists_fire() {
        return false;
    }

    true
}

/// Cells on the straight line from `from` to `to`, `from` excluded
struct Line {
    cur: Pos,
    end: Pos,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    done: bool,
}

impl Line {
    fn new(from: Pos, to: Pos) -> Self {
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        Self {
            cur: from,
            end: to,
            dx,
            dy,
            sx: if from.x < to.x { 1 } else { -1 },
            sy: if from.y < to.y { 1 } else { -1 },
            err: dx + dy,
            done: from == to,
        }
    }
}

impl Iterator for Line {
    type Item = Pos;

    fn next(&mut self) -> Option<Pos> {
        if self.done {
            return None;
        }
        let e2 = 2 * self.err;
        if e2 >= self.dy {
            self.err += self.dy;
            self.cur.x += self.sx;
        }
        if e2 <= self.dx {
            self.err += self.dx;
            self.cur.y += self.sy;
        }
        if self.cur == self.end {
            self.done = true;
        }
        Some(self.cur)
    }
}

/// Walk the line toward `to`; intermediate cells must satisfy `clear`
fn trace(floor: &Floor, from: Pos, to: Pos, clear: impl Fn(&Feature, Pos) -> bool) -> bool {
    for pos in Line::new(from, to) {
        if pos == to {
            return true;
        }
        match floor.feature(pos) {
            Some(feature) if clear(feature, pos) => {}
            _ => return false,
        }
    }
    true
}

/// Can a bolt travel from `from` to `to`?
///
/// The path stops at the first cell that blocks projections; that cell may
/// be the target itself.
pub fn projectable(floor: &Floor, from: Pos, to: Pos) -> bool {
    if !floor.contains(from) || !floor.contains(to) {
        return false;
    }
    if distance(from, to) > MAX_RANGE {
        return false;
    }
    trace(floor, from, to, |f, _| f.has(FeatureFlags::PROJECT))
}

/// Line of sight between two cells
pub fn los(floor: &Floor, from: Pos, to: Pos) -> bool {
    if !floor.contains(from) || !floor.contains(to) {
        return false;
    }
    trace(floor, from, to, |f, _| f.has(FeatureFlags::LOS))
}

/// Path for a disintegration beam: only permanent terrain stops it
pub fn in_disintegration_range(floor: &Floor, from: Pos, to: Pos) -> bool {
    if !floor.contains(from) || !floor.contains(to) {
        return false;
    }
    if distance(from, to) > MAX_RANGE {
        return false;
    }
    trace(floor, from, to, |f, _| !f.has(FeatureFlags::PERMANENT))
}

/// Projectable with no non-pet monster in the way
pub fn clean_shot(floor: &Floor, from: Pos, to: Pos) -> bool {
    if from == to || !projectable(floor, from, to) {
        return false;
    }
    trace(floor, from, to, |_, pos| {
        floor
            .monster_at(pos)
            .and_then(|id| floor.monster(id))
            .is_none_or(|m| m.is_pet())
    })
}

/// Crossable, empty, and not the player's cell
pub fn can_enter(floor: &Floor, pos: Pos, race: &MonsterRace, player_pos: Pos) -> bool {
    if pos == player_pos || floor.monster_at(pos).is_some() {
        return false;
    }
    floor
        .feature(pos)
        .is_some_and(|f| can_cross(f, race, CrossMode::Free))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::FeatureId;
    use crate::monster::{Monster, RaceFlags, RaceId};

    fn open_floor() -> Floor {
        Floor::new(30, 30, FeatureId::FLOOR)
    }

    #[test]
    fn test_distance() {
        let o = Pos::new(10, 10);
        assert_eq!(distance(o, o), 0);
        assert_eq!(distance(o, Pos::new(11, 11)), 1);
        assert_eq!(distance(o, Pos::new(10, 13)), 3);
        assert_eq!(distance(o, Pos::new(14, 12)), 5);
        assert_eq!(distance(o, Pos::new(12, 14)), distance(Pos::new(12, 14), o));
    }

    #[test]
    fn test_line_reaches_end() {
        let cells: Vec<Pos> = Line::new(Pos::new(0, 0), Pos::new(3, 5)).collect();
        assert_eq!(cells.last(), Some(&Pos::new(3, 5)));
        assert!(!cells.contains(&Pos::new(0, 0)));
        assert_eq!(Line::new(Pos::new(2, 2), Pos::new(2, 2)).count(), 0);
    }

    #[test]
    fn test_projectable_blocked_by_wall() {
        let mut floor = open_floor();
        let a = Pos::new(5, 5);
        let b = Pos::new(5, 10);
        assert!(projectable(&floor, a, b));

        floor.set_feature(Pos::new(5, 7), FeatureId::GRANITE).unwrap();
        assert!(!projectable(&floor, a, b));

        // The blocking cell itself is a valid target
        assert!(projectable(&floor, a, Pos::new(5, 7)));
    }

    #[test]
    fn test_projectable_range_limit() {
        let floor = Floor::new(5, 40, FeatureId::FLOOR);
        assert!(projectable(&floor, Pos::new(2, 0), Pos::new(2, 20)));
        assert!(!projectable(&floor, Pos::new(2, 0), Pos::new(2, 21)));
    }

    #[test]
    fn test_glass_blocks_projection_not_sight() {
        let mut floor = open_floor();
        floor.set_feature(Pos::new(5, 7), FeatureId::GLASS_WALL).unwrap();
        assert!(los(&floor, Pos::new(5, 5), Pos::new(5, 10)));
        assert!(!projectable(&floor, Pos::new(5, 5), Pos::new(5, 10)));
    }

    #[test]
    fn test_disintegration_ignores_granite() {
        let mut floor = open_floor();
        floor.set_feature(Pos::new(5, 7), FeatureId::GRANITE).unwrap();
        assert!(in_disintegration_range(&floor, Pos::new(5, 5), Pos::new(5, 10)));
        floor.set_feature(Pos::new(5, 8), FeatureId::PERMANENT_WALL).unwrap();
        assert!(!in_disintegration_range(&floor, Pos::new(5, 5), Pos::new(5, 10)));
    }

    #[test]
    fn test_clean_shot_blocked_by_monster() {
        let mut floor = open_floor();
        let a = Pos::new(5, 5);
        let b = Pos::new(5, 10);
        assert!(clean_shot(&floor, a, b));
        floor.place_monster(Monster::new(RaceId(0), Pos::new(5, 7), 5)).unwrap();
        assert!(!clean_shot(&floor, a, b));
        assert!(!clean_shot(&floor, a, a));
    }

    #[test]
    fn test_can_cross_rules() {
        let floor = open_floor();
        let features = floor.features();
        let granite = features.get(FeatureId::GRANITE).unwrap();
        let deep = features.get(FeatureId::DEEP_WATER).unwrap();
        let lava = features.get(FeatureId::LAVA).unwrap();
        let ground = features.get(FeatureId::FLOOR).unwrap();

        let walker = MonsterRace::default();
        let ghost = MonsterRace {
            flags: RaceFlags::PASS_WALL,
            ..MonsterRace::default()
        };
        let fish = MonsterRace {
            flags: RaceFlags::AQUATIC,
            ..MonsterRace::default()
        };

        assert!(can_cross(ground, &walker, CrossMode::Free));
        assert!(!can_cross(granite, &walker, CrossMode::Free));
        assert!(can_cross(granite, &ghost, CrossMode::Free));
        assert!(!can_cross(
            granite,
            &ghost,
            CrossMode::Ridden { rider_passes_walls: false }
        ));
        assert!(!can_cross(deep, &walker, CrossMode::Free));
        assert!(can_cross(deep, &fish, CrossMode::Free));
        assert!(!can_cross(ground, &fish, CrossMode::Free));
        assert!(!can_cross(lava, &walker, CrossMode::Free));
    }

    #[test]
    fn test_can_enter() {
        let mut floor = open_floor();
        let race = MonsterRace::default();
        let player = Pos::new(1, 1);
        assert!(!can_enter(&floor, player, &race, player));
        assert!(can_enter(&floor, Pos::new(2, 2), &race, player));
        floor.place_monster(Monster::new(RaceId(0), Pos::new(2, 2), 5)).unwrap();
        assert!(!can_enter(&floor, Pos::new(2, 2), &race, player));
    }
}
