#![allow(dead_code)]

use hg_core::dungeon::{Pos, distance};
use hg_core::monster::{Monster, MonsterId, MonsterRace, RaceFlags, RaceId};
use hg_core::world::{World, WorldBuilder};

/// A walled room with the player in the middle
pub const ROOM: &[&str] = &[
    "###############",
    "#.............#",
    "#.............#",
    "#.............#",
    "#......@......#",
    "#.............#",
    "#.............#",
    "#.............#",
    "###############",
];

pub fn room(seed: u64) -> World {
    WorldBuilder::new().map(ROOM).seed(seed).build().unwrap()
}

pub fn race(name: &str, level: i32, flags: RaceFlags) -> MonsterRace {
    MonsterRace {
        flags,
        mexp: level * 10,
        ..MonsterRace::new(name, name.chars().next().unwrap_or('m'), level)
    }
}

/// Spawn a monster ready to act on the next scan
pub fn spawn_ready(world: &mut World, race: RaceId, pos: Pos) -> MonsterId {
    let max_hp = world.bestiary.get(race).unwrap().max_hp;
    let mut monster = Monster::new(race, pos, max_hp);
    monster.energy_need = -1000;
    world.spawn_monster(monster).unwrap()
}

/// Interior floor cells of a map, excluding the player's cell
pub fn open_cells(world: &World) -> Vec<Pos> {
    let mut cells = Vec::new();
    for y in 0..world.floor.height() {
        for x in 0..world.floor.width() {
            let pos = Pos::new(y, x);
            if pos != world.player.pos
                && world.floor.feature_id(pos) == Some(hg_core::dungeon::FeatureId::FLOOR)
            {
                cells.push(pos);
            }
        }
    }
    cells
}

pub fn player_distance(world: &World, id: MonsterId) -> i32 {
    distance(world.floor.monster(id).unwrap().pos, world.player.pos)
}
