//! Pursuit heuristics: hunting other monsters and tracking the player
//!
//! All of these are read-only with respect to the world (apart from the
//! random number generator) and report failure as `None`.

use tracing::trace;

use super::{are_enemies, Direction, MonsterId};
use crate::consts::{FLOW_TWIDDLE, UNREACHED_COST, WALL_COST};
use crate::dungeon::{distance, in_disintegration_range, projectable, Pos};
use crate::world::World;

/// Pick a hostile monster to go after
///
/// A mount follows the rider's chosen target and pets follow the pet
/// target; otherwise the monster list is scanned from a random starting
/// point and the first qualifying enemy wins. Returns the primary direction
/// toward it plus two fallbacks.
pub fn find_enemy_direction(world: &mut World, id: MonsterId) -> Option<[Direction; 3]> {
    let ids = world.floor.monster_ids();
    let count = ids.len() as i32;
    let start = world.rng.rand_int0(count);
    let step = if world.arena && world.rng.rand_int0(2) == 1 { -1 } else { 1 };

    let monster = world.floor.monster(id)?;
    let race = world.bestiary.get(monster.race)?;
    let player = &world.player;
    let riding = player.rides(id);

    let target_pos = |target: Option<MonsterId>| {
        target
            .and_then(|t| world.floor.monster(t))
            .map(|t| t.pos)
    };

    let goal = if let Some(pos) = target_pos(player.riding_target).filter(|_| monster.pos == player.pos)
    {
        pos
    } else if let Some(pos) = target_pos(player.pet_target).filter(|_| monster.is_pet()) {
        pos
    } else {
        let own_dist = distance(monster.pos, player.pos);
        let follow = player.pet_follow_distance;
        let through_walls =
            (race.passes_walls() && (!riding || player.pass_wall)) || (race.kills_walls() && !riding);

        let mut found = None;
        for k in 0..count {
            let other_id = ids[(start + step * k).rem_euclid(count) as usize];
            if other_id == id {
                continue;
            }
            let Some(other) = world.floor.monster(other_id) else {
                continue;
            };
            if !other.is_alive() {
                continue;
            }

            if monster.is_pet() {
                let other_dist = distance(other.pos, player.pos);
                if follow < 0 {
                    // Only fight away from the player
                    if other_dist <= -follow {
                        continue;
                    }
                } else if own_dist < other_dist && other_dist > follow {
                    continue;
                }
                if race.aaf < other_dist {
                    continue;
                }
            }

            if !are_enemies(monster, other, world.arena) {
                continue;
            }

            let reachable = if through_walls {
                in_disintegration_range(&world.floor, monster.pos, other.pos)
            } else {
                projectable(&world.floor, monster.pos, other.pos)
            };
            if !reachable {
                continue;
            }

            found = Some(other.pos);
            break;
        }
        found?
    };

    let (dy, dx) = monster.pos.delta_to(goal);
    trace!(monster = id.0, goal = %goal, "enemy in sight");
    Direction::toward(dy, dx)
}

/// Find a neighbouring cell from which a spell could reach the player
///
/// Only used when the player is not already in the line of fire. The
/// neighbour must be no further along the sound field than the current
/// cell; among those the one with the lowest cost wins, later scan entries
/// winning ties.
pub fn find_spell_position(world: &World, id: MonsterId) -> Option<Pos> {
    let monster = world.floor.monster(id)?;
    let race = world.bestiary.get(monster.race)?;
    let player = &world.player;
    let floor = &world.floor;
    let noise = floor.noise();

    if projectable(floor, monster.pos, player.pos) {
        return None;
    }

    let mut now_cost = noise.raw_cost(monster.pos);
    if now_cost == 0 {
        now_cost = UNREACHED_COST;
    }
    let riding = player.rides(id);
    let through_walls =
        (race.passes_walls() && (!riding || player.pass_wall)) || (race.kills_walls() && !riding);

    let mut best = UNREACHED_COST;
    let mut found = None;
    for dir in Direction::SCAN_ORDER.iter().rev() {
        let pos = dir.step(monster.pos);
        if !floor.contains(pos) {
            continue;
        }
        if pos == player.pos {
            return None;
        }

        let raw = noise.raw_cost(pos);
        if !through_walls {
            if raw == 0 {
                continue;
            }
            if !race.handles_doors() && floor.feature(pos).is_some_and(|f| f.is_closed_door()) {
                continue;
            }
        }

        let cost = if raw == 0 { WALL_COST } else { raw };
        if now_cost < cost {
            continue;
        }
        if !projectable(floor, pos, player.pos) {
            continue;
        }
        if best < cost {
            continue;
        }
        best = cost;
        found = Some(pos);
    }

    if best == UNREACHED_COST {
        return None;
    }
    found
}

/// Follow the sound field, or failing that the scent trail, toward the
/// player
///
/// Returns a goal cell far beyond the player in the direction of the chosen
/// neighbour so the usual preference ordering leans that way.
pub fn flow_toward_player(world: &World, id: MonsterId, no_flow: bool) -> Option<Pos> {
    let monster = world.floor.monster(id)?;
    let race = world.bestiary.get(monster.race)?;

    if race.has_attack_spells() {
        if let Some(pos) = find_spell_position(world, id) {
            return Some(pos);
        }
    }

    if no_flow {
        return None;
    }

    let player = &world.player;
    let riding = player.rides(id);
    if race.passes_walls() && (!riding || player.pass_wall) {
        return None;
    }
    if race.kills_walls() && !riding {
        return None;
    }

    let floor = &world.floor;
    if world.player_can_see(monster.pos) && projectable(floor, player.pos, monster.pos) {
        return None;
    }

    let noise = floor.noise();
    let use_scent = if noise.sound_cost(monster.pos).is_some() {
        false
    } else if noise.scent(monster.pos).is_some() {
        if !noise.scent_is_fresh(monster.pos, player.pos, world.config.scent_stale_ticks) {
            return None;
        }
        true
    } else {
        return None;
    };

    let mut best: i64 = if use_scent { 0 } else { i64::from(UNREACHED_COST) };
    let mut goal = None;
    for dir in Direction::SCAN_ORDER.iter().rev() {
        let pos = dir.step(monster.pos);
        if !floor.contains(pos) {
            continue;
        }

        if use_scent {
            let when = noise.raw_scent(pos);
            if best > when {
                continue;
            }
            best = when;
        } else {
            let cost = if race.handles_doors() {
                i64::from(noise.raw_distance(pos))
            } else {
                i64::from(noise.raw_cost(pos))
            };
            if cost == 0 || best < cost {
                continue;
            }
            best = cost;
        }

        goal = Some(player.pos.offset(FLOW_TWIDDLE * dir.dy(), FLOW_TWIDDLE * dir.dx()));
    }

    if best == i64::from(UNREACHED_COST) || best == 0 {
        return None;
    }
    goal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::FeatureFlags;
    use crate::monster::{Allegiance, Monster, MonsterRace, RaceFlags, SpellSet};
    use crate::world::WorldBuilder;

    fn open_room() -> World {
        WorldBuilder::new()
            .map(&[
                "###########",
                "#.........#",
                "#.........#",
                "#....@....#",
                "#.........#",
                "#.........#",
                "###########",
            ])
            .seed(11)
            .build()
            .unwrap()
    }

    #[test]
    fn test_enemy_direction_toward_hostile() {
        let mut world = open_room();
        let race = world.bestiary.insert(MonsterRace::new("dog", 'C', 3));
        let mut pet = Monster::new(race, Pos::new(3, 2), 10);
        pet.allegiance = Allegiance::Pet;
        let pet = world.spawn_monster(pet).unwrap();
        world.spawn_monster(Monster::new(race, Pos::new(1, 2), 10)).unwrap();

        let dirs = find_enemy_direction(&mut world, pet).unwrap();
        assert_eq!(dirs[0], Direction::North);
    }

    #[test]
    fn test_enemy_direction_none_without_enemies() {
        let mut world = open_room();
        let race = world.bestiary.insert(MonsterRace::new("orc", 'o', 3));
        let a = world.spawn_monster(Monster::new(race, Pos::new(1, 1), 10)).unwrap();
        world.spawn_monster(Monster::new(race, Pos::new(1, 3), 10)).unwrap();
        assert!(find_enemy_direction(&mut world, a).is_none());
    }

    #[test]
    fn test_enemy_direction_follows_pet_target() {
        let mut world = open_room();
        let race = world.bestiary.insert(MonsterRace::new("dog", 'C', 3));
        let mut pet = Monster::new(race, Pos::new(3, 2), 10);
        pet.allegiance = Allegiance::Pet;
        let pet = world.spawn_monster(pet).unwrap();
        world.spawn_monster(Monster::new(race, Pos::new(1, 2), 10)).unwrap();
        let ordered = world.spawn_monster(Monster::new(race, Pos::new(5, 4), 10)).unwrap();
        world.player.pet_target = Some(ordered);

        let dirs = find_enemy_direction(&mut world, pet).unwrap();
        assert_eq!(dirs[0], Direction::SouthEast);
    }

    #[test]
    fn test_spell_position_requires_blocked_shot() {
        let mut world = open_room();
        let mut race = MonsterRace::new("mage", 'p', 10);
        race.spells = SpellSet::BOLT;
        let race = world.bestiary.insert(race);
        let id = world.spawn_monster(Monster::new(race, Pos::new(1, 1), 10)).unwrap();
        assert!(find_spell_position(&world, id).is_none());
    }

    #[test]
    fn test_spell_position_steps_out_from_behind_a_pillar() {
        let mut world = WorldBuilder::new()
            .map(&[
                "#######",
                "#.....#",
                "#..#..#",
                "#.....#",
                "#..@..#",
                "#######",
            ])
            .build()
            .unwrap();
        let mut race = MonsterRace::new("mage", 'p', 10);
        race.spells = SpellSet::BOLT;
        let race = world.bestiary.insert(race);
        let id = world.spawn_monster(Monster::new(race, Pos::new(1, 3), 10)).unwrap();
        for y in 1..5 {
            for x in 1..6 {
                let p = Pos::new(y, x);
                if world.floor.feature(p).is_some_and(|f| f.has(FeatureFlags::MOVE)) {
                    world.floor.set_flow(p, (distance(p, Pos::new(4, 3)) + 1) as u16, 1);
                }
            }
        }
        let pos = find_spell_position(&world, id).unwrap();
        assert!(projectable(&world.floor, pos, world.player.pos));
        assert!(pos.is_adjacent(Pos::new(1, 3)));
        assert_ne!(pos, Pos::new(2, 3));
    }

    #[test]
    fn test_flow_follows_sound_gradient() {
        let mut world = WorldBuilder::new()
            .map(&[
                "#######",
                "#o....#",
                "#####.#",
                "#@....#",
                "#######",
            ])
            .race('o', MonsterRace::new("orc", 'o', 3))
            .build()
            .unwrap();
        let id = world.floor.monster_at(Pos::new(1, 1)).unwrap();
        let path = [(1, 1, 9), (1, 2, 8), (1, 3, 7), (1, 4, 6), (1, 5, 5), (2, 5, 4), (3, 5, 4), (3, 4, 3), (3, 3, 2), (3, 2, 1)];
        for (y, x, cost) in path {
            world.floor.set_flow(Pos::new(y, x), cost, cost);
        }
        let goal = flow_toward_player(&world, id, false).unwrap();
        let (dy, dx) = Pos::new(1, 1).delta_to(goal);
        assert_eq!(Direction::preference_list(dy, dx).unwrap()[0], Direction::East);
    }

    #[test]
    fn test_flow_falls_back_to_fresh_scent() {
        let mut world = WorldBuilder::new()
            .map(&[
                "#######",
                "#o....#",
                "#####.#",
                "#@....#",
                "#######",
            ])
            .race('o', MonsterRace::new("orc", 'o', 3))
            .build()
            .unwrap();
        let id = world.floor.monster_at(Pos::new(1, 1)).unwrap();
        world.floor.set_scent(Pos::new(3, 1), 500);
        world.floor.set_scent(Pos::new(1, 1), 450);
        world.floor.set_scent(Pos::new(1, 2), 460);
        assert!(flow_toward_player(&world, id, false).is_some());
        assert!(flow_toward_player(&world, id, true).is_none());

        world.floor.set_scent(Pos::new(1, 1), 300);
        assert!(flow_toward_player(&world, id, false).is_none());
    }

    #[test]
    fn test_wall_walkers_do_not_flow() {
        let mut world = open_room();
        let mut race = MonsterRace::new("ghost", 'G', 10);
        race.flags = RaceFlags::PASS_WALL;
        let race = world.bestiary.insert(race);
        let id = world.spawn_monster(Monster::new(race, Pos::new(1, 1), 10)).unwrap();
        world.floor.set_flow(Pos::new(1, 1), 5, 5);
        assert!(flow_toward_player(&world, id, false).is_none());
    }
}
