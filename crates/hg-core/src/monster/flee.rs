//! Fear and retreat heuristics

use tracing::debug;

use super::{Direction, MonsterFlags, MonsterId};
use crate::dungeon::{can_cross, can_enter, clean_shot, distance, projectable, CrossMode, Pos};
use crate::world::World;

/// Decide whether a monster wants to run from the player
///
/// Frightened monsters always run. Pets only keep away when the leash says
/// so. Everyone else compares its level-weighted health against the
/// player's, with quick answers for large level gaps.
pub fn will_flee(world: &World, id: MonsterId) -> bool {
    let Some(monster) = world.floor.monster(id) else {
        return false;
    };
    if monster.is_afraid() {
        return true;
    }

    let player = &world.player;
    let cdis = distance(monster.pos, player.pos);

    if monster.is_pet() {
        let follow = player.pet_follow_distance;
        return follow < 0 && cdis <= -follow;
    }

    if cdis > world.config.max_sight + 5 {
        return false;
    }
    if cdis <= 5 {
        return false;
    }

    let Some(race) = world.bestiary.get(monster.race) else {
        return false;
    };

    // The id term spreads courage a little between members of one race
    let m_lev = i64::from(race.level) + i64::from(id.0 & 0x08) + 25;
    let p_lev = i64::from(player.level);
    if m_lev > p_lev + 4 {
        return false;
    }
    if m_lev + 4 <= p_lev {
        debug!(monster = id.0, "outclassed, fleeing");
        return true;
    }

    let p_mhp = i64::from(player.max_hp.max(1));
    let m_mhp = i64::from(monster.max_hp.max(1));
    let p_val = p_lev * p_mhp + 4 * i64::from(player.hp);
    let m_val = m_lev * m_mhp + 4 * i64::from(monster.hp);

    p_val * m_mhp > m_val * p_mhp
}

/// Nearest ring of cells holding somewhere out of the player's line of
/// fire; the furthest such cell from the player in that ring wins
pub fn find_safe_cell(world: &World, id: MonsterId) -> Option<Pos> {
    let monster = world.floor.monster(id)?;
    let race = world.bestiary.get(monster.race)?;
    let floor = &world.floor;
    let player = &world.player;
    let noise = floor.noise();

    let mode = if player.rides(id) {
        CrossMode::Ridden { rider_passes_walls: player.pass_wall }
    } else {
        CrossMode::Free
    };
    let flows = !monster.flags.contains(MonsterFlags::NOFLOW);
    let here_dist = noise.raw_distance(monster.pos);

    for (d, ring) in world.rings.iter() {
        let mut best = None;
        let mut best_dis = 0;
        for &(dy, dx) in ring {
            let pos = monster.pos.offset(dy, dx);
            if !floor.in_interior(pos) {
                continue;
            }
            if !floor.feature(pos).is_some_and(|f| can_cross(f, race, mode)) {
                continue;
            }
            if flows {
                let dist = noise.raw_distance(pos);
                if dist == 0 || dist > here_dist + 2 * d {
                    continue;
                }
            }
            if projectable(floor, player.pos, pos) {
                continue;
            }

            let dis = distance(pos, player.pos);
            if dis <= best_dis {
                continue;
            }
            best = Some(pos);
            best_dis = dis;
        }
        if best.is_some() {
            return best;
        }
    }
    None
}

/// Nearest ring of cells holding an ambush spot: a cell the player cannot
/// cleanly shoot into, as close to the player as possible but not adjacent
pub fn find_hiding_cell(world: &World, id: MonsterId) -> Option<Pos> {
    let monster = world.floor.monster(id)?;
    let race = world.bestiary.get(monster.race)?;
    let floor = &world.floor;
    let player = &world.player;

    for (_, ring) in world.rings.iter() {
        let mut best = None;
        let mut best_dis = i32::MAX;
        for &(dy, dx) in ring {
            let pos = monster.pos.offset(dy, dx);
            if !floor.in_interior(pos) {
                continue;
            }
            if !can_enter(floor, pos, race, player.pos) {
                continue;
            }
            if projectable(floor, player.pos, pos) && clean_shot(floor, monster.pos, pos) {
                continue;
            }

            let dis = distance(pos, player.pos);
            if dis < best_dis && dis >= 2 {
                best = Some(pos);
                best_dis = dis;
            }
        }
        if best.is_some() {
            return best;
        }
    }
    None
}

/// Pick the neighbour that best bends a retreat toward `goal`
///
/// Each neighbour scores `5000 / (distance to goal + 3)` minus
/// `500 / (flow distance + 1)`, so cells nearer the goal and further from
/// the player along the flow field score higher. Later scan entries win
/// ties.
pub fn swerve_away_from_player(world: &World, id: MonsterId, goal: Pos) -> Option<Pos> {
    let monster = world.floor.monster(id)?;
    let floor = &world.floor;
    let noise = floor.noise();

    let mut score = -1;
    let mut best = None;
    for dir in Direction::SCAN_ORDER.iter().rev() {
        let pos = dir.step(monster.pos);
        if !floor.contains(pos) {
            continue;
        }
        let dis = distance(pos, goal);
        let s = (5000 / (dis + 3) - 500 / (noise.raw_distance(pos) + 1)).max(0);
        if s < score {
            continue;
        }
        score = s;
        best = Some(pos);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monster::{Allegiance, Monster, MonsterRace};
    use crate::world::WorldBuilder;

    fn arena_floor() -> World {
        WorldBuilder::new()
            .map(&[
                "###############",
                "#.............#",
                "#.............#",
                "#......@......#",
                "#.............#",
                "#.............#",
                "###############",
            ])
            .seed(5)
            .build()
            .unwrap()
    }

    #[test]
    fn test_afraid_always_flees() {
        let mut world = arena_floor();
        let race = world.bestiary.insert(MonsterRace::new("dragon", 'D', 60));
        let mut m = Monster::new(race, Pos::new(3, 8), 500);
        m.timers.afraid = 3;
        m.allegiance = Allegiance::Pet;
        let id = world.spawn_monster(m).unwrap();
        assert!(will_flee(&world, id));
    }

    #[test]
    fn test_close_monsters_stand_their_ground() {
        let mut world = arena_floor();
        world.player.level = 50;
        let race = world.bestiary.insert(MonsterRace::new("rat", 'r', 1));
        let id = world.spawn_monster(Monster::new(race, Pos::new(3, 9), 2)).unwrap();
        assert!(!will_flee(&world, id));
    }

    #[test]
    fn test_outclassed_monster_flees() {
        let mut world = WorldBuilder::new()
            .map(&["@.........r"])
            .race('r', MonsterRace::new("rat", 'r', 1))
            .build()
            .unwrap();
        world.player.level = 50;
        let id = world.floor.monster_at(Pos::new(0, 10)).unwrap();
        assert!(will_flee(&world, id));

        world.player.level = 1;
        assert!(!will_flee(&world, id));
    }

    #[test]
    fn test_pet_flees_only_on_leash() {
        let mut world = arena_floor();
        let race = world.bestiary.insert(MonsterRace::new("dog", 'C', 1));
        let mut m = Monster::new(race, Pos::new(3, 9), 10);
        m.allegiance = Allegiance::Pet;
        let id = world.spawn_monster(m).unwrap();
        assert!(!will_flee(&world, id));
        world.player.pet_follow_distance = -5;
        assert!(will_flee(&world, id));
    }

    #[test]
    fn test_safe_cell_is_out_of_sight() {
        let mut world = WorldBuilder::new()
            .map(&[
                "#########",
                "#.......#",
                "#.......#",
                "#.@.....#",
                "#####.###",
                "#.......#",
                "#########",
            ])
            .build()
            .unwrap();
        let race = world.bestiary.insert(MonsterRace::new("kobold", 'k', 1));
        let mut m = Monster::new(race, Pos::new(3, 5), 5);
        m.flags |= MonsterFlags::NOFLOW;
        let id = world.spawn_monster(m).unwrap();

        let safe = find_safe_cell(&world, id).unwrap();
        assert!(!projectable(&world.floor, world.player.pos, safe));
    }

    #[test]
    fn test_safe_cell_none_in_open_room() {
        let mut world = arena_floor();
        let race = world.bestiary.insert(MonsterRace::new("kobold", 'k', 1));
        let mut m = Monster::new(race, Pos::new(3, 10), 5);
        m.flags |= MonsterFlags::NOFLOW;
        let id = world.spawn_monster(m).unwrap();
        assert!(find_safe_cell(&world, id).is_none());
        assert!(find_hiding_cell(&world, id).is_none());
    }

    #[test]
    fn test_hiding_cell_keeps_distance() {
        let mut world = WorldBuilder::new()
            .map(&[
                "###########",
                "#.........#",
                "#.#######.#",
                "#.#.....#.#",
                "#...@.....#",
                "###########",
            ])
            .build()
            .unwrap();
        let race = world.bestiary.insert(MonsterRace::new("wolf", 'C', 5));
        let id = world.spawn_monster(Monster::new(race, Pos::new(1, 5), 8)).unwrap();
        let hide = find_hiding_cell(&world, id).unwrap();
        assert!(distance(hide, world.player.pos) >= 2);
    }

    #[test]
    fn test_swerve_prefers_cells_near_goal() {
        let mut world = arena_floor();
        let race = world.bestiary.insert(MonsterRace::new("kobold", 'k', 1));
        let id = world.spawn_monster(Monster::new(race, Pos::new(3, 10), 5)).unwrap();
        let step = swerve_away_from_player(&world, id, Pos::new(3, 13)).unwrap();
        assert_eq!(step, Pos::new(3, 11));
    }
}
