//! Sound and scent propagation
//!
//! The monster engine only reads these fields; a game writes them after
//! every player action. This is the pass the simulator uses.

use std::collections::VecDeque;

use hg_core::dungeon::{los, FeatureFlags, Floor, Pos};
use hg_core::monster::Direction;

/// Sound travels at most this many steps
pub const FLOW_DEPTH: u16 = 32;

/// Extra cost of passing a closed door
const DOOR_COST: u16 = 3;

/// Scent spread around the player; `None` cells are never stamped
const SCENT_ADJUST: [[Option<u32>; 5]; 5] = [
    [None, Some(0), Some(0), Some(0), None],
    [Some(0), Some(1), Some(1), Some(1), Some(0)],
    [Some(0), Some(1), Some(2), Some(1), Some(0)],
    [Some(0), Some(1), Some(1), Some(1), Some(0)],
    [None, Some(0), Some(0), Some(0), None],
];

fn carries_sound(floor: &Floor, pos: Pos) -> bool {
    floor
        .feature(pos)
        .is_some_and(|f| f.has(FeatureFlags::MOVE) || f.is_closed_door())
}

/// Recompute sound cost and flow distance outward from the player
///
/// Cost charges extra for closed doors; distance counts plain steps.
pub fn update_flow(floor: &mut Floor, player: Pos) {
    floor.clear_flow();
    floor.set_flow(player, 1, 1);

    let mut queue = VecDeque::from([player]);
    while let Some(from) = queue.pop_front() {
        let noise = floor.noise();
        let base_cost = noise.raw_cost(from) as u16;
        let base_dist = noise.raw_distance(from) as u16;

        for dir in Direction::SCAN_ORDER {
            let to = dir.step(from);
            if !floor.in_interior(to) || !carries_sound(floor, to) {
                continue;
            }
            let mut cost = base_cost + 1;
            let dist = base_dist + 1;
            if floor.feature(to).is_some_and(|f| f.is_closed_door()) {
                cost += DOOR_COST;
            }

            let noise = floor.noise();
            let (old_cost, old_dist) = (noise.raw_cost(to) as u16, noise.raw_distance(to) as u16);
            if old_dist != 0 && old_dist <= dist && old_cost <= cost {
                continue;
            }
            let new_cost = if old_cost == 0 { cost } else { old_cost.min(cost) };
            let new_dist = if old_dist == 0 { dist } else { old_dist.min(dist) };
            floor.set_flow(to, new_cost, new_dist);

            if dist < FLOW_DEPTH {
                queue.push_back(to);
            }
        }
    }
}

/// Lay fresh scent around the player at time `when`
pub fn update_scent(floor: &mut Floor, player: Pos, when: u32) {
    for (i, row) in SCENT_ADJUST.iter().enumerate() {
        for (j, adjust) in row.iter().enumerate() {
            let Some(adjust) = adjust else {
                continue;
            };
            let pos = player.offset(i as i32 - 2, j as i32 - 2);
            if !floor.contains(pos) || !carries_sound(floor, pos) {
                continue;
            }
            if !los(floor, player, pos) {
                continue;
            }
            floor.set_scent(pos, when + adjust);
        }
    }
}
