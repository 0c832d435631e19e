//! Monster AI: choosing where to go
//!
//! `choose_moves` layers the heuristics in a fixed order, each one stopping
//! the search when it produces a goal:
//!
//! 1. counter-attack the remembered enemy, if it is still in line
//! 2. pack tactics for hostile group monsters near the player
//! 3. follow sound or scent toward the player
//! 4. when scared, look for a safe cell and swerve toward it
//!
//! The resulting offset becomes a five-entry preference list.

use tracing::debug;

use super::flee::{find_hiding_cell, find_safe_cell, swerve_away_from_player, will_flee};
use super::pursuit::flow_toward_player;
use super::{are_enemies, Direction, MonsterFlags, MonsterId};
use crate::dungeon::{can_cross, can_enter, los, projectable, CellInfo, CrossMode, Pos};
use crate::world::World;

/// Preference list for a monster pursuing (or fleeing) the player
///
/// `None` means the monster has nowhere it wants to go this turn.
pub fn choose_moves(world: &World, id: MonsterId) -> Option<[Direction; 5]> {
    let monster = world.floor.monster(id)?;
    let race = world.bestiary.get(monster.race)?;
    let floor = &world.floor;
    let player = &world.player;
    let here = monster.pos;

    let scared = will_flee(world, id);
    let no_flow =
        monster.flags.contains(MonsterFlags::NOFLOW) && floor.noise().raw_cost(here) > 2;
    let riding = player.rides(id);
    let passes_walls = race.passes_walls() && (!riding || player.pass_wall);

    let mut goal = None;

    if !scared {
        if let Some(target) = monster.target {
            let enemy = floor
                .monster_at(target)
                .and_then(|t| floor.monster(t))
                .is_some_and(|t| are_enemies(monster, t, world.arena));
            if enemy && los(floor, here, target) && projectable(floor, here, target) {
                goal = Some(target);
            }
        }
    }

    let sees_player = los(floor, here, player.pos) && projectable(floor, here, player.pos);
    let pack_hunting = goal.is_none()
        && !scared
        && monster.is_hostile()
        && race.has_friends()
        && (sees_player || floor.noise().raw_distance(here) < world.config.max_sight / 2);

    if pack_hunting {
        // Animal packs lure the player out of corridors into the open
        if race.is_animal() && !passes_walls && !race.kills_walls() {
            let mut room = Direction::SCAN_ORDER
                .iter()
                .filter_map(|d| floor.feature(d.step(player.pos)))
                .filter(|f| can_cross(f, race, CrossMode::Free))
                .count() as i32;
            if floor
                .cell(player.pos)
                .is_some_and(|c| c.info.contains(CellInfo::ROOM))
            {
                room -= 2;
            }
            if race.spells.is_empty() {
                room -= 2;
            }

            if room < player.vigour_eighths() {
                goal = find_hiding_cell(world, id);
            }
        }

        // Fill a gap around the player
        if goal.is_none() && floor.noise().raw_distance(here) < 3 {
            let mut spot = player.pos;
            for i in 0..8 {
                let dir = Direction::SCAN_ORDER[(id.0 as usize + i) & 7];
                spot = dir.step(player.pos);
                if spot == here {
                    spot = player.pos;
                    break;
                }
                if !floor.contains(spot) {
                    continue;
                }
                if !can_enter(floor, spot, race, player.pos) {
                    continue;
                }
                break;
            }
            goal = Some(spot);
        }
    }

    let planned = goal.is_some();
    let goal = goal
        .or_else(|| flow_toward_player(world, id, no_flow))
        .unwrap_or(player.pos);
    let (mut dy, mut dx) = here.delta_to(goal);

    if monster.is_pet() && scared {
        dy = -dy;
        dx = -dx;
    } else if !planned && scared {
        let swerve = if no_flow {
            None
        } else {
            find_safe_cell(world, id).and_then(|safe| swerve_away_from_player(world, id, safe))
        };
        (dy, dx) = match swerve {
            Some(step) => here.delta_to(step),
            None => (-dy, -dx),
        };
    }

    let list = Direction::preference_list(dy, dx);
    debug!(monster = id.0, scared, ?list, "move preferences");
    list
}

/// Cell a monster would step into first, for callers that only need a goal
pub fn first_step(world: &World, id: MonsterId) -> Option<Pos> {
    let here = world.floor.monster(id)?.pos;
    choose_moves(world, id).map(|list| list[0].step(here))
}
