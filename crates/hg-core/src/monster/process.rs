//! One monster's turn
//!
//! Everything a monster does once it has the energy to act: housekeeping
//! that may end the turn early (sleep, stun, breeding, spells), choosing a
//! move plan and handing it to movement resolution, then learning and
//! morale updates afterwards.

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;

use super::ai::choose_moves;
use super::movement::{resolve_movement, MoveOutcome};
use super::pursuit::find_enemy_direction;
use super::{are_enemies, MonsterFlags, MonsterId, MoveChoice, MovePlan, RaceFlags};
use crate::dungeon::{distance, projectable};
use crate::world::{DirtyFlags, EngineError, MonsterEvent, MonsterHooks, World};

/// How a monster's turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum TurnAction {
    /// Left the floor (summoner gone, quantum blink, escape)
    Removed,
    /// Still asleep
    Slept,
    /// Too stunned to act
    Stunned,
    /// Quantum monster skipped its turn
    QuantumSkip,
    /// Bred instead of moving
    Multiplied,
    CastSpell,
    /// Nowhere it wanted to go
    NoDirection,
    /// Died while moving
    Died,
    /// Spent the turn fighting another monster
    Fought,
    /// Went through movement resolution
    Resolved,
}

/// Summary of one monster turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub action: TurnAction,
    /// Present whenever movement resolution ran
    pub outcome: Option<MoveOutcome>,
}

impl TurnReport {
    const fn early(action: TurnAction) -> Self {
        Self {
            action,
            outcome: None,
        }
    }
}

/// Stealthy players may go unnoticed by low level monsters
fn notices_player(world: &mut World, race_level: i32) -> bool {
    let player = &world.player;
    if !player.shadow_stealth {
        return true;
    }
    let mut tmp = player.level * 6 + (player.stealth + 10) * 4;
    if player.lit {
        tmp /= 3;
    }
    if player.aggravate {
        tmp /= 2;
    }
    if race_level > player.level * player.level / 20 + 10 {
        tmp /= 3;
    }
    world.rng.rand_int0(tmp) <= race_level + 20
}

/// Erratic movers roll for a random walk; returns the flags that showed
fn erratic_roll(world: &mut World, flags: RaceFlags) -> Option<RaceFlags> {
    let both = RaceFlags::RAND_25 | RaceFlags::RAND_50;
    if flags.contains(both) {
        (world.rng.rand_int0(100) < 75).then_some(both)
    } else if flags.contains(RaceFlags::RAND_50) {
        (world.rng.rand_int0(100) < 50).then_some(RaceFlags::RAND_50)
    } else if flags.contains(RaceFlags::RAND_25) {
        (world.rng.rand_int0(100) < 25).then_some(RaceFlags::RAND_25)
    } else {
        None
    }
}

/// Lore is only learned from a monster seen as itself by a lucid player
fn observed_truly(world: &World, id: MonsterId) -> bool {
    !world.player.hallucinating
        && world
            .floor
            .monster(id)
            .is_some_and(|m| m.is_visible() && m.shows_true_form())
}

fn rolls_spell(world: &mut World, freq: i32) -> bool {
    freq > 0 && world.rng.rand_int1(100) <= freq
}

/// Resolve everything monster `id` does with one turn's worth of energy
pub fn resolve_monster_action<H: MonsterHooks + ?Sized>(
    world: &mut World,
    hooks: &mut H,
    id: MonsterId,
) -> Result<TurnReport, EngineError> {
    let riding = world.player.rides(id);

    if riding && !world.race_of(id)?.can_be_ridden() && world.dismount() {
        hooks.observe(world, MonsterEvent::ThrewRider { mount: id });
    }

    {
        let monster = world.floor.monster_or_err(id)?;
        let shifts = monster.flags.contains(MonsterFlags::CHAMELEON) && !monster.is_asleep();
        if shifts && world.rng.one_in(world.config.chameleon_chance) {
            hooks.change_form(world, id);
        }
    }

    let race_level = world.race_of(id)?.level;
    let aware = notices_player(world, race_level);

    let monster = world.floor.monster_or_err(id)?;
    if let Some(parent) = monster.parent {
        if world.floor.monster(parent).is_none() {
            debug!(monster = id.0, parent = parent.0, "summoner gone");
            hooks.observe(world, MonsterEvent::LostParent { id });
            world.remove_monster(id)?;
            return Ok(TurnReport::early(TurnAction::Removed));
        }
    }

    let race = world.race_of(id)?.clone();
    let race_id = world.floor.monster_or_err(id)?.race;

    if race.is_quantum() {
        if world.rng.rand_int0(2) == 0 {
            return Ok(TurnReport::early(TurnAction::QuantumSkip));
        }
        let odds = (id.0 % 100) as i32 + 10;
        if world.rng.rand_int0(odds) == 0 && !race.is_questor() {
            debug!(monster = id.0, "quantum blink");
            hooks.observe(world, MonsterEvent::Vanished { id });
            hooks.monster_died(world, id);
            if world.floor.monster(id).is_some() {
                world.remove_monster(id)?;
            }
            return Ok(TurnReport::early(TurnAction::Removed));
        }
    }

    // Named companions bail out when badly hurt; a mount struggles first
    let monster = world.floor.monster_or_err(id)?;
    if !monster.is_hostile() && race.is_named() && !world.arena {
        if monster.hp < monster.max_hp / 3 {
            if riding && world.player.riding_pinch < 2 {
                world.player.riding_pinch += 1;
                hooks.observe(world, MonsterEvent::PinchWarning { id });
            } else {
                if riding {
                    world.dismount();
                }
                debug!(monster = id.0, "escaped");
                hooks.observe(world, MonsterEvent::Escaped { id });
                world.remove_monster(id)?;
                return Ok(TurnReport::early(TurnAction::Removed));
            }
        } else if riding {
            world.player.riding_pinch = 0;
        }
    }

    let monster = world.floor.monster_or_err(id)?;
    if monster.is_asleep() {
        if !world.player.aggravate {
            return Ok(TurnReport::early(TurnAction::Slept));
        }
        let seen = monster.is_visible();
        world.floor.monster_mut_or_err(id)?.wake();
        if seen {
            hooks.observe(world, MonsterEvent::Woke { id });
        }
        if observed_truly(world, id) {
            world.bestiary.note_wake(race_id);
        }
    }

    if world.floor.monster_or_err(id)?.is_stunned() && world.rng.one_in(2) {
        return Ok(TurnReport::early(TurnAction::Stunned));
    }

    if riding {
        world.dirty |= DirtyFlags::BONUS;
    }

    let monster = world.floor.monster_or_err(id)?;
    let mut gets_angry = monster.is_friendly() && world.player.aggravate;
    if monster.is_pet()
        && ((race.is_named() && world.player.clashes_with(&race)) || race.resists_all())
    {
        gets_angry = true;
    }
    if gets_angry && !world.arena {
        world.floor.monster_mut_or_err(id)?.set_hostile();
        hooks.observe(world, MonsterEvent::TurnedHostile { id });
    }

    if race.multiplies() && world.floor.num_repro < world.config.max_repro {
        let here = world.floor.monster_or_err(id)?.pos;
        let k = world.floor.count_monsters_around(here) as i32;
        if k < 4 && (k == 0 || world.rng.rand_int0(k * world.config.mult_adjust) == 0) {
            if let Some(child) = hooks.spawn_offspring(world, id) {
                debug!(monster = id.0, child = child.0, "multiplied");
                let child_seen = world.floor.monster(child).is_some_and(|m| m.is_visible());
                if child_seen && observed_truly(world, id) {
                    world.bestiary.learn(race_id, RaceFlags::MULTIPLY);
                }
                hooks.observe(world, MonsterEvent::Multiplied { parent: id, child });
                return Ok(TurnReport::early(TurnAction::Multiplied));
            }
        }
    }

    if rolls_spell(world, race.spell_freq) {
        let monster = world.floor.monster_or_err(id)?;
        let counter = monster.target.is_some_and(|target| {
            world
                .floor
                .monster_at(target)
                .and_then(|t| world.floor.monster(t))
                .is_some_and(|t| are_enemies(monster, t, world.arena))
                && projectable(&world.floor, monster.pos, target)
        });
        debug!(monster = id.0, counter, "spell attempt");

        let cast = if counter {
            hooks.cast_at_monster(world, id) || (aware && hooks.cast_at_player(world, id))
        } else {
            (aware && hooks.cast_at_player(world, id)) || hooks.cast_at_monster(world, id)
        };
        if cast {
            return Ok(TurnReport::early(TurnAction::CastSpell));
        }
        if world.floor.monster(id).is_none() {
            return Ok(TurnReport::early(TurnAction::Died));
        }
    }

    let Some(plan) = select_plan(world, id, aware)? else {
        return Ok(TurnReport::early(TurnAction::NoDirection));
    };

    let outcome = resolve_movement(world, hooks, id, &plan)?;
    if outcome.died {
        return Ok(TurnReport {
            action: TurnAction::Died,
            outcome: Some(outcome),
        });
    }
    // A fight ends the turn outright; nothing is learned from it here
    if outcome.fought {
        return Ok(TurnReport {
            action: TurnAction::Fought,
            outcome: Some(outcome),
        });
    }

    let monster = world.floor.monster_or_err(id)?;
    if world.player.no_flowed && outcome.stopped_at > 2 && monster.target.is_some() {
        world.floor.monster_mut_or_err(id)?.flags.remove(MonsterFlags::NOFLOW);
    }

    let monster = world.floor.monster_or_err(id)?;
    let idle = !outcome.turn_taken && !outcome.moved;
    if idle && !monster.is_afraid() && !riding && aware && rolls_spell(world, race.spell_freq) {
        if hooks.cast_at_player(world, id) {
            return Ok(TurnReport {
                action: TurnAction::CastSpell,
                outcome: Some(outcome),
            });
        }
        if world.floor.monster(id).is_none() {
            return Ok(TurnReport {
                action: TurnAction::Died,
                outcome: Some(outcome),
            });
        }
    }

    if outcome.view_changed {
        world.dirty |= DirtyFlags::FLOW;
    }
    if outcome.moved && race.carries_light() {
        world.dirty |= DirtyFlags::MON_LITE;
    }

    if observed_truly(world, id) {
        let learned = outcome.behaviors.race_flags() | outcome.noticed;
        world.bestiary.learn(race_id, learned);
    }

    let monster = world.floor.monster_or_err(id)?;
    if idle && monster.is_afraid() && aware {
        world.floor.monster_mut_or_err(id)?.timers.afraid = 0;
        hooks.observe(world, MonsterEvent::TurnedToFight { id });
    }

    Ok(TurnReport {
        action: TurnAction::Resolved,
        outcome: Some(outcome),
    })
}

/// Build the move plan; `None` ends the turn without moving
fn select_plan(world: &mut World, id: MonsterId, aware: bool) -> Result<Option<MovePlan>, EngineError> {
    let monster = world.floor.monster_or_err(id)?;
    let race_id = monster.race;
    let race = world.bestiary.get_or_err(race_id)?;
    let flags = race.flags;
    let never_moves = race.never_moves();
    let confused = monster.is_confused();
    let pet = monster.is_pet();
    let hostile = monster.is_hostile();
    let cdis = distance(monster.pos, world.player.pos);

    if confused || !aware {
        return Ok(Some(MovePlan::random()));
    }

    if let Some(shown) = erratic_roll(world, flags) {
        if observed_truly(world, id) {
            world.bestiary.learn(race_id, shown);
        }
        return Ok(Some(MovePlan::random()));
    }

    // Stuck in place and out of reach: flail at whatever is adjacent
    if never_moves && cdis > 1 {
        return Ok(Some(MovePlan::random()));
    }

    if pet {
        if let Some(dirs) = find_enemy_direction(world, id) {
            let mut plan = MovePlan::from_directions(&dirs);
            plan.push(MoveChoice::Random);
            return Ok(Some(plan));
        }

        let follow = world.player.pet_follow_distance;
        let avoid = follow < 0 && cdis <= -follow;
        let lonely = !avoid && cdis > follow;
        let distant = cdis > world.config.pet_seek_dist;
        if avoid || lonely || distant {
            if let Some(list) = choose_moves(world, id) {
                return Ok(Some(MovePlan::from_directions(&list)));
            }
        }
        return Ok(Some(MovePlan::random()));
    }

    if !hostile {
        if let Some(dirs) = find_enemy_direction(world, id) {
            let mut plan = MovePlan::from_directions(&dirs);
            plan.push(MoveChoice::Random);
            return Ok(Some(plan));
        }
        // Rooted friendlies with nothing to hit have nothing to do
        if never_moves {
            return Ok(None);
        }
        return Ok(Some(MovePlan::random()));
    }

    Ok(choose_moves(world, id).map(|list| MovePlan::from_directions(&list)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::Pos;
    use crate::monster::{Allegiance, Monster, MonsterRace};
    use crate::world::{EventLog, NullHooks, WorldBuilder};

    fn room() -> World {
        WorldBuilder::new()
            .map(&[
                "###########",
                "#.........#",
                "#.........#",
                "#....@....#",
                "#.........#",
                "###########",
            ])
            .seed(17)
            .build()
            .unwrap()
    }

    #[test]
    fn test_sleeping_monster_stays_put() {
        let mut world = room();
        let race = world.bestiary.insert(MonsterRace::new("orc", 'o', 3));
        let mut m = Monster::new(race, Pos::new(1, 1), 10);
        m.timers.sleep = 20;
        let id = world.spawn_monster(m).unwrap();

        let report = resolve_monster_action(&mut world, &mut NullHooks, id).unwrap();
        assert_eq!(report.action, TurnAction::Slept);
        assert_eq!(world.floor.monster(id).unwrap().pos, Pos::new(1, 1));
    }

    #[test]
    fn test_aggravation_wakes_sleepers() {
        let mut world = room();
        world.player.aggravate = true;
        let race = world.bestiary.insert(MonsterRace::new("orc", 'o', 3));
        let mut m = Monster::new(race, Pos::new(1, 1), 10);
        m.timers.sleep = 20;
        let id = world.spawn_monster(m).unwrap();
        world.update_monster_visibility(id);
        let mut log = EventLog::default();

        let report = resolve_monster_action(&mut world, &mut log, id).unwrap();
        assert_ne!(report.action, TurnAction::Slept);
        assert!(!world.floor.monster(id).unwrap().is_asleep());
        assert!(log.events.contains(&MonsterEvent::Woke { id }));
        assert_eq!(world.bestiary.lore(race).wakes, 1);
    }

    #[test]
    fn test_hostile_steps_toward_player() {
        let mut world = room();
        let race = world.bestiary.insert(MonsterRace::new("orc", 'o', 3));
        let id = world.spawn_monster(Monster::new(race, Pos::new(3, 1), 10)).unwrap();

        let report = resolve_monster_action(&mut world, &mut NullHooks, id).unwrap();
        assert_eq!(report.action, TurnAction::Resolved);
        assert_eq!(world.floor.monster(id).unwrap().pos, Pos::new(3, 2));
    }

    #[test]
    fn test_orphaned_summon_disappears() {
        let mut world = room();
        let race = world.bestiary.insert(MonsterRace::new("imp", 'u', 3));
        let summoner = world.spawn_monster(Monster::new(race, Pos::new(1, 1), 10)).unwrap();
        let mut m = Monster::new(race, Pos::new(1, 2), 10);
        m.parent = Some(summoner);
        let id = world.spawn_monster(m).unwrap();
        world.remove_monster(summoner).unwrap();

        let report = resolve_monster_action(&mut world, &mut NullHooks, id).unwrap();
        assert_eq!(report.action, TurnAction::Removed);
        assert!(world.floor.monster(id).is_none());
    }

    #[test]
    fn test_rooted_friendly_without_enemy_does_nothing() {
        let mut world = room();
        let mut race = MonsterRace::new("shrieker", ',', 1);
        race.flags = RaceFlags::NEVER_MOVE;
        let race = world.bestiary.insert(race);
        let mut m = Monster::new(race, Pos::new(3, 4), 10);
        m.allegiance = Allegiance::Friendly;
        let id = world.spawn_monster(m).unwrap();

        let report = resolve_monster_action(&mut world, &mut NullHooks, id).unwrap();
        assert_eq!(report.action, TurnAction::NoDirection);
    }

    #[test]
    fn test_aggravation_turns_friendlies() {
        let mut world = room();
        world.player.aggravate = true;
        let race = world.bestiary.insert(MonsterRace::new("merchant", 'p', 3));
        let mut m = Monster::new(race, Pos::new(1, 1), 10);
        m.allegiance = Allegiance::Friendly;
        let id = world.spawn_monster(m).unwrap();
        let mut log = EventLog::default();

        resolve_monster_action(&mut world, &mut log, id).unwrap();
        assert!(world.floor.monster(id).unwrap().is_hostile());
        assert!(log.events.contains(&MonsterEvent::TurnedHostile { id }));
    }

    struct Caster {
        casts: u32,
    }

    impl MonsterHooks for Caster {
        fn cast_at_player(&mut self, _world: &mut World, _caster: MonsterId) -> bool {
            self.casts += 1;
            true
        }
    }

    #[test]
    fn test_spellcaster_casts_instead_of_moving() {
        let mut world = room();
        let mut race = MonsterRace::new("mage", 'p', 10);
        race.spell_freq = 100;
        let race = world.bestiary.insert(race);
        let id = world.spawn_monster(Monster::new(race, Pos::new(3, 1), 10)).unwrap();
        let mut hooks = Caster { casts: 0 };

        let report = resolve_monster_action(&mut world, &mut hooks, id).unwrap();
        assert_eq!(report.action, TurnAction::CastSpell);
        assert_eq!(hooks.casts, 1);
        assert_eq!(world.floor.monster(id).unwrap().pos, Pos::new(3, 1));
    }

    #[derive(Default)]
    struct Brawler {
        fights: Vec<(MonsterId, MonsterId)>,
    }

    impl MonsterHooks for Brawler {
        fn attack_monster(&mut self, _world: &mut World, attacker: MonsterId, defender: MonsterId) -> bool {
            self.fights.push((attacker, defender));
            true
        }
    }

    #[test]
    fn test_fight_with_a_pet_ends_the_turn() {
        let mut world = WorldBuilder::new()
            .map(&["#######", "#@....#", "#######"])
            .build()
            .unwrap();
        let race = world.bestiary.insert(MonsterRace {
            flags: RaceFlags::KILL_BODY,
            ..MonsterRace::new("troll", 'T', 12)
        });
        let dog = world.bestiary.insert(MonsterRace::new("jackal", 'C', 1));
        let mut pet = Monster::new(dog, Pos::new(1, 3), 5);
        pet.allegiance = Allegiance::Pet;
        let pet = world.spawn_monster(pet).unwrap();
        let id = world.spawn_monster(Monster::new(race, Pos::new(1, 4), 40)).unwrap();
        world.floor.monster_mut(id).unwrap().flags |= MonsterFlags::VISIBLE;
        let mut hooks = Brawler::default();

        let report = resolve_monster_action(&mut world, &mut hooks, id).unwrap();
        assert_eq!(report.action, TurnAction::Fought);
        assert_eq!(hooks.fights, vec![(id, pet)]);
        let outcome = report.outcome.unwrap();
        assert!(outcome.turn_taken && !outcome.moved);
        assert!(outcome.noticed.contains(RaceFlags::KILL_BODY));
        assert!(!world.bestiary.lore(race).flags.contains(RaceFlags::KILL_BODY));
        assert_eq!(world.floor.monster(id).unwrap().pos, Pos::new(1, 4));
    }

    #[test]
    fn test_cornered_coward_turns_to_fight() {
        let mut world = WorldBuilder::new()
            .map(&["XXXXX", "X@.kX", "XXXXX"])
            .race('k', MonsterRace::new("kobold", 'k', 1))
            .build()
            .unwrap();
        let id = world.floor.monster_at(Pos::new(1, 3)).unwrap();
        world.floor.monster_mut(id).unwrap().timers.afraid = 10;
        let mut log = EventLog::default();

        let report = resolve_monster_action(&mut world, &mut log, id).unwrap();
        let outcome = report.outcome.unwrap();
        assert!(!outcome.moved);
        assert!(!world.floor.monster(id).unwrap().is_afraid());
        assert!(log.events.contains(&MonsterEvent::TurnedToFight { id }));
    }

    #[test]
    fn test_lore_learned_from_seen_door_opener() {
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
        world.floor.monster_mut(id).unwrap().flags |= MonsterFlags::VISIBLE;

        let report = resolve_monster_action(&mut world, &mut NullHooks, id).unwrap();
        assert!(report.outcome.unwrap().turn_taken);
        assert!(world.bestiary.lore(race).flags.contains(RaceFlags::OPEN_DOOR));
    }
}
