//! Headless monster simulator
//!
//! Builds a small fixed floor, then runs the monster scan for a number of
//! game turns with the player standing still, printing the map at the end.

mod flow;

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info, warn};

use hg_core::dungeon::Pos;
use hg_core::monster::{run_monster_turn_scan, Allegiance, MonsterId, MonsterRace, RaceFlags, SpellSet};
use hg_core::world::{AiConfig, DirtyFlags, MonsterEvent, MonsterHooks, World, WorldBuilder};

/// Run the monster engine on a demo floor
#[derive(Parser, Debug)]
#[command(name = "hg-sim")]
#[command(author, version, about = "Watch monsters hunt a motionless player", long_about = None)]
struct Args {
    /// Random seed
    #[arg(short = 's', long = "seed", default_value_t = 0)]
    seed: u64,

    /// Game turns to simulate
    #[arg(short = 't', long = "turns", default_value_t = 200)]
    turns: u32,

    /// JSON file with engine tunables
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Print the tunables in use and exit
    #[arg(long = "dump-config")]
    dump_config: bool,

    /// Print the map every N turns (0 = only at the end)
    #[arg(long = "every", default_value_t = 0)]
    every: u32,

    /// More logging (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

const DEMO_MAP: &[&str] = &[
    "##################################",
    "#........#...........#...........#",
    "#..oo....+...........#....$......#",
    "#..o.....#.....@.....#...........#",
    "#........#...........+.......r...#",
    "######+###.....C.....#...........#",
    "#........#...........#####'#######",
    "#...w....#...........#...........#",
    "#........#....TT.....#.....!.....#",
    "#........+....TT.....+.....p.....#",
    "##################################",
];

fn demo_races() -> Vec<(char, MonsterRace)> {
    vec![
        (
            'o',
            MonsterRace {
                flags: RaceFlags::FRIENDS | RaceFlags::OPEN_DOOR | RaceFlags::BASH_DOOR | RaceFlags::ORC,
                mexp: 30,
                max_hp: 12,
                ..MonsterRace::new("cave orc", 'o', 7)
            },
        ),
        (
            'w',
            MonsterRace {
                flags: RaceFlags::MULTIPLY | RaceFlags::RAND_50 | RaceFlags::ANIMAL | RaceFlags::STUPID,
                mexp: 3,
                max_hp: 5,
                ..MonsterRace::new("giant white louse", 'w', 3)
            },
        ),
        (
            'r',
            MonsterRace {
                flags: RaceFlags::KILL_WALL | RaceFlags::ANIMAL,
                mexp: 40,
                max_hp: 30,
                ..MonsterRace::new("rock mole", 'r', 9)
            },
        ),
        (
            'p',
            MonsterRace {
                flags: RaceFlags::TAKE_ITEM | RaceFlags::OPEN_DOOR | RaceFlags::EVIL | RaceFlags::HUMAN,
                mexp: 25,
                max_hp: 20,
                spell_freq: 20,
                spells: SpellSet::ATTACK,
                ..MonsterRace::new("cutpurse", 'p', 8)
            },
        ),
        (
            'C',
            MonsterRace {
                flags: RaceFlags::ANIMAL | RaceFlags::RIDING,
                mexp: 30,
                max_hp: 25,
                ..MonsterRace::new("jackal", 'C', 4)
            },
        ),
    ]
}

/// Collaborators for the simulation: simple melee and event logging
#[derive(Debug, Default)]
struct SimHooks {
    blows_taken: u32,
}

impl MonsterHooks for SimHooks {
    fn attack_player(&mut self, world: &mut World, attacker: MonsterId) {
        self.blows_taken += 1;
        let damage = world.rng.damroll(1, 4);
        world.player.hp -= damage;
        info!(monster = attacker.0, damage, hp = world.player.hp, "player hit");
        if world.player.hp < 0 {
            world.player.dead = true;
        }
    }

    fn attack_monster(&mut self, world: &mut World, attacker: MonsterId, defender: MonsterId) -> bool {
        let damage = world.rng.damroll(2, 4);
        let killed = match world.floor.monster_mut(defender) {
            Some(m) => {
                m.hp -= damage;
                m.wake();
                !m.is_alive()
            }
            None => return false,
        };
        info!(attacker = attacker.0, defender = defender.0, damage, "monster fight");
        if killed {
            info!(monster = defender.0, "slain");
            if let Err(err) = world.remove_monster(defender) {
                warn!(monster = defender.0, %err, "could not remove slain monster");
            }
        }
        true
    }

    fn observe(&mut self, _world: &World, event: MonsterEvent) {
        debug!(?event, "event");
    }
}

fn render(world: &World) -> String {
    let mut out = String::new();
    for y in 0..world.floor.height() {
        for x in 0..world.floor.width() {
            let pos = Pos::new(y, x);
            let symbol = if pos == world.player.pos {
                '@'
            } else if let Some(m) = world.floor.monster_at(pos).and_then(|id| world.floor.monster(id)) {
                world.bestiary.get(m.race).map_or('?', |r| r.symbol)
            } else if world.floor.cell(pos).is_some_and(|c| !c.items.is_empty()) {
                '&'
            } else {
                world.floor.feature(pos).map_or(' ', |f| f.symbol)
            };
            out.push(symbol);
        }
        out.push('\n');
    }
    out
}

fn build_world(seed: u64, config: AiConfig) -> Result<World, Box<dyn Error>> {
    let mut builder = WorldBuilder::new().map(DEMO_MAP).seed(seed).config(config);
    for (symbol, race) in demo_races() {
        builder = builder.race(symbol, race);
    }
    let mut world = builder.build()?;
    world.player.max_hp = 60;
    world.player.hp = 60;
    world.player.level = 10;

    if let Some(jackal) = world.floor.monster_at(Pos::new(5, 15)) {
        if let Some(m) = world.floor.monster_mut(jackal) {
            m.allegiance = Allegiance::Pet;
        }
    }
    Ok(world)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => AiConfig::load(path)?,
        None => AiConfig::default(),
    };
    if args.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let mut world = build_world(args.seed, config)?;
    let mut hooks = SimHooks::default();
    info!(seed = args.seed, monsters = world.floor.monster_count(), "simulation start");

    for turn in 1..=args.turns {
        world.turn = turn;
        flow::update_flow(&mut world.floor, world.player.pos);
        flow::update_scent(&mut world.floor, world.player.pos, turn);
        world.dirty.remove(DirtyFlags::FLOW);

        let summary = run_monster_turn_scan(&mut world, &mut hooks);
        debug!(turn, acted = summary.acted, removed = summary.removed, "turn");
        world.redraw.clear();

        if args.every > 0 && turn % args.every == 0 {
            println!("turn {turn}\n{}", render(&world));
        }
        if world.player.dead {
            info!(turn, "the player has died");
            break;
        }
    }

    println!("{}", render(&world));
    let summary = serde_json::json!({
        "turn": world.turn,
        "monsters": world.floor.monster_count(),
        "player_hp": world.player.hp,
        "player_max_hp": world.player.max_hp,
        "blows_taken": hooks.blows_taken,
        "breeders": world.floor.num_repro,
        "dirty": world.dirty,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slain_defender_is_removed() {
        let mut world = build_world(3, AiConfig::default()).unwrap();
        let attacker = world.floor.monster_at(Pos::new(2, 3)).unwrap();
        let defender = world.floor.monster_at(Pos::new(2, 4)).unwrap();
        world.floor.monster_mut(defender).unwrap().hp = 0;

        let mut hooks = SimHooks::default();
        assert!(hooks.attack_monster(&mut world, attacker, defender));
        assert!(world.floor.monster(defender).is_none());
        assert!(world.floor.check_occupancy().is_ok());
    }

    #[test]
    fn test_attack_on_missing_monster_does_nothing() {
        let mut world = build_world(3, AiConfig::default()).unwrap();
        let attacker = world.floor.monster_at(Pos::new(2, 3)).unwrap();
        let defender = world.floor.monster_at(Pos::new(2, 4)).unwrap();
        world.remove_monster(defender).unwrap();

        let mut hooks = SimHooks::default();
        assert!(!hooks.attack_monster(&mut world, attacker, defender));
    }
}
