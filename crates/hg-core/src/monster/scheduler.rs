//! Per game turn monster scan
//!
//! Monsters are visited from the highest id down, so anything spawned during
//! the scan is never visited before its birth flag is cleared. Each monster
//! close enough to care about the player gains energy by speed and acts once
//! it has enough.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::process::{resolve_monster_action, TurnAction};
use super::{MonsterFlags, MonsterId};
use crate::consts::speed_to_energy;
use crate::dungeon::{distance, los};
use crate::world::{DirtyFlags, MonsterHooks, World};

/// What happened during one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Monsters that had the energy to act
    pub acted: u32,
    /// Monsters removed or killed during their own turn
    pub removed: u32,
    /// Monsters skipped because their turn hit an engine error
    pub failed: u32,
    /// The scan stopped early (player died, left, or stopped playing)
    pub interrupted: bool,
}

/// Can the monster sense the player well enough to bother acting?
fn senses_player(world: &World, id: MonsterId, cdis: i32) -> bool {
    let Some(monster) = world.floor.monster(id) else {
        return false;
    };
    let Some(race) = world.bestiary.get(monster.race) else {
        return false;
    };
    let max_sight = world.config.max_sight;
    let aaf = if monster.is_pet() {
        race.aaf.min(max_sight)
    } else {
        race.aaf
    };

    if cdis <= aaf {
        return true;
    }
    if (cdis <= max_sight || world.arena)
        && (los(&world.floor, world.player.pos, monster.pos) || world.player.aggravate)
    {
        return true;
    }
    monster.target.is_some()
}

/// Give every monster on the floor its chance to act this game turn
pub fn run_monster_turn_scan<H: MonsterHooks + ?Sized>(world: &mut World, hooks: &mut H) -> ScanSummary {
    let mut summary = ScanSummary::default();
    let tracked = world.player.tracked_race;
    let lore_before = tracked.map(|race| world.bestiary.lore(race));

    for id in world.floor.monster_ids().into_iter().rev() {
        if world.player.leaving {
            summary.interrupted = true;
            break;
        }

        // Removed earlier in this scan
        let Some(monster) = world.floor.monster_mut(id) else {
            continue;
        };
        if monster.flags.contains(MonsterFlags::BORN) {
            monster.flags.remove(MonsterFlags::BORN);
            continue;
        }

        let pos = monster.pos;
        let cdis = distance(pos, world.player.pos);
        if cdis >= world.config.aaf_limit {
            continue;
        }

        if !world.player.no_flowed {
            if let Some(monster) = world.floor.monster_mut(id) {
                monster.flags.remove(MonsterFlags::NOFLOW);
            }
        }

        if !senses_player(world, id, cdis) {
            continue;
        }

        let speed = if world.player.rides(id) {
            world.player.speed
        } else {
            let Some(monster) = world.floor.monster(id) else {
                continue;
            };
            let mut speed = monster.speed;
            if world.config.nightmare {
                speed += world.config.nightmare_speed_bonus;
            }
            if monster.is_fast() {
                speed += 10;
            }
            if monster.is_slow() {
                speed -= 10;
            }
            speed
        };

        let energy_per_action = world.config.energy_per_action;
        let Some(monster) = world.floor.monster_mut(id) else {
            continue;
        };
        monster.energy_need -= speed_to_energy(speed);
        if monster.energy_need > 0 {
            continue;
        }
        monster.energy_need += energy_per_action;

        summary.acted += 1;
        match resolve_monster_action(world, hooks, id) {
            Ok(report) => {
                if matches!(report.action, TurnAction::Removed | TurnAction::Died) {
                    summary.removed += 1;
                }
            }
            Err(err) => {
                debug_assert!(false, "monster {} turn failed: {err}", id.0);
                warn!(monster = id.0, %err, "skipping monster after engine error");
                summary.failed += 1;
            }
        }

        if world.floor.monster(id).is_some() {
            let give_up_scent = world.player.no_flowed && world.rng.one_in(3);
            if let Some(monster) = world.floor.monster_mut(id) {
                monster.target = None;
                if give_up_scent {
                    monster.flags.insert(MonsterFlags::NOFLOW);
                }
            }
        }

        if !world.player.playing || world.player.dead || world.player.leaving {
            summary.interrupted = true;
            break;
        }
    }

    if let (Some(race), Some(before)) = (tracked, lore_before) {
        if world.player.tracked_race == Some(race) && world.bestiary.lore(race) != before {
            world.dirty |= DirtyFlags::MONSTER_RECALL;
        }
    }

    debug!(
        acted = summary.acted,
        removed = summary.removed,
        failed = summary.failed,
        "monster scan done"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::Pos;
    use crate::monster::{Monster, MonsterRace, RaceFlags};
    use crate::world::{NullHooks, WorldBuilder};

    fn corridor() -> World {
        WorldBuilder::new()
            .map(&["#############", "#@..........#", "#############"])
            .seed(1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_newborns_wait_a_turn() {
        let mut world = corridor();
        let race = world.bestiary.insert(MonsterRace::new("worm", 'w', 1));
        let mut m = Monster::new(race, Pos::new(1, 5), 5);
        m.flags |= MonsterFlags::BORN;
        let id = world.spawn_monster(m).unwrap();

        let summary = run_monster_turn_scan(&mut world, &mut NullHooks);
        assert_eq!(summary.acted, 0);
        assert!(!world.floor.monster(id).unwrap().flags.contains(MonsterFlags::BORN));
    }

    #[test]
    fn test_normal_speed_acts_every_turn() {
        let mut world = corridor();
        let race = world.bestiary.insert(MonsterRace::new("orc", 'o', 3));
        let mut m = Monster::new(race, Pos::new(1, 10), 10);
        m.energy_need = 100;
        let id = world.spawn_monster(m).unwrap();

        let mut acted = 0;
        for _ in 0..10 {
            acted += run_monster_turn_scan(&mut world, &mut NullHooks).acted;
        }
        // Normal speed gains one action's worth of energy every ten game turns
        assert_eq!(acted, 1);
        assert!(world.floor.monster(id).unwrap().pos.x < 10);
    }

    #[test]
    fn test_far_monsters_are_ignored() {
        let mut world = corridor();
        world.config.aaf_limit = 5;
        let race = world.bestiary.insert(MonsterRace::new("orc", 'o', 3));
        let id = world.spawn_monster(Monster::new(race, Pos::new(1, 10), 10)).unwrap();

        for _ in 0..30 {
            run_monster_turn_scan(&mut world, &mut NullHooks);
        }
        let monster = world.floor.monster(id).unwrap();
        assert_eq!(monster.pos, Pos::new(1, 10));
        assert_eq!(monster.energy_need, 0);
    }

    #[test]
    fn test_target_cleared_after_acting() {
        let mut world = corridor();
        let race = world.bestiary.insert(MonsterRace::new("orc", 'o', 3));
        let mut m = Monster::new(race, Pos::new(1, 10), 10);
        m.target = Some(Pos::new(1, 11));
        m.energy_need = -1000;
        let id = world.spawn_monster(m).unwrap();

        run_monster_turn_scan(&mut world, &mut NullHooks);
        assert!(world.floor.monster(id).unwrap().target.is_none());
    }

    #[test]
    fn test_recall_dirty_when_tracked_lore_changes() {
        let mut world = WorldBuilder::new()
            .map(&["#######", "#@..+o#", "#######"])
            .race('o', MonsterRace {
                flags: RaceFlags::OPEN_DOOR,
                ..MonsterRace::new("orc", 'o', 3)
            })
            .build()
            .unwrap();
        let id = world.floor.monster_at(Pos::new(1, 5)).unwrap();
        let race = world.floor.monster(id).unwrap().race;
        world.player.tracked_race = Some(race);
        let monster = world.floor.monster_mut(id).unwrap();
        monster.flags |= MonsterFlags::VISIBLE;
        monster.energy_need = -1000;

        run_monster_turn_scan(&mut world, &mut NullHooks);
        assert!(world.dirty.contains(DirtyFlags::MONSTER_RECALL));
    }

    #[test]
    fn test_dead_player_stops_the_scan() {
        let mut world = corridor();
        world.player.dead = true;
        let race = world.bestiary.insert(MonsterRace::new("orc", 'o', 3));
        for x in [5, 7, 9] {
            let mut m = Monster::new(race, Pos::new(1, x), 10);
            m.energy_need = -1000;
            world.spawn_monster(m).unwrap();
        }
        let summary = run_monster_turn_scan(&mut world, &mut NullHooks);
        assert_eq!(summary.acted, 1);
        assert!(summary.interrupted);
    }
}
