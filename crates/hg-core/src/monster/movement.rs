//! Movement resolution
//!
//! Walks a move plan one direction at a time and settles what happens when
//! the monster tries to step that way: doors, wards, walls, the player,
//! other monsters and finally any items on the new cell. The first entry
//! that uses up the turn ends the walk.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{are_enemies, Direction, MonsterId, MoveChoice, MovePlan, RaceFlags};
use crate::dungeon::{can_cross, los, CellInfo, CrossMode, FeatAction, FeatureFlags, Pos};
use crate::world::{DirtyFlags, EngineError, MonsterEvent, MonsterHooks, World};

bitflags! {
    /// Things a monster did while moving that the player could learn from
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Behaviors: u8 {
        const OPENED_DOOR = 0x01;
        const BASHED_DOOR = 0x02;
        const TOOK_ITEM = 0x04;
        const KILLED_ITEM = 0x08;
        const MOVED_BODY = 0x10;
        const PASSED_WALL = 0x20;
        const KILLED_WALL = 0x40;
    }
}

// Manual serde for Behaviors
impl Serialize for Behaviors {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Behaviors {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(Behaviors::from_bits_truncate(bits))
    }
}

impl Behaviors {
    /// Race flags these behaviours reveal
    pub fn race_flags(self) -> RaceFlags {
        let mut flags = RaceFlags::empty();
        if self.contains(Behaviors::OPENED_DOOR) {
            flags |= RaceFlags::OPEN_DOOR;
        }
        if self.contains(Behaviors::BASHED_DOOR) {
            flags |= RaceFlags::BASH_DOOR;
        }
        if self.contains(Behaviors::TOOK_ITEM) {
            flags |= RaceFlags::TAKE_ITEM;
        }
        if self.contains(Behaviors::KILLED_ITEM) {
            flags |= RaceFlags::KILL_ITEM;
        }
        if self.contains(Behaviors::MOVED_BODY) {
            flags |= RaceFlags::MOVE_BODY;
        }
        if self.contains(Behaviors::PASSED_WALL) {
            flags |= RaceFlags::PASS_WALL;
        }
        if self.contains(Behaviors::KILLED_WALL) {
            flags |= RaceFlags::KILL_WALL;
        }
        flags
    }
}

/// Result of walking a move plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// The monster spent its turn (moved, attacked, opened a door...)
    pub turn_taken: bool,
    /// The monster ended up on a new cell
    pub moved: bool,
    /// Terrain changed in a way that affects sight and flow
    pub view_changed: bool,
    pub behaviors: Behaviors,
    /// Other race traits shown along the way (never attacks, stupid...)
    pub noticed: RaceFlags,
    /// The monster died while moving and has been removed
    pub died: bool,
    /// The turn went into melee against another monster
    pub fought: bool,
    /// Index of the plan entry that ended the turn, or the plan length when
    /// every entry failed
    pub stopped_at: usize,
}

/// Everything the candidate loop needs to know about the mover, copied out
/// so the world can be mutated freely
struct Mover {
    id: MonsterId,
    origin: Pos,
    race: super::MonsterRace,
    pet: bool,
    riding: bool,
    mode: CrossMode,
}

/// How one plan entry played out
enum Step {
    /// Try the next entry
    Next,
    /// The turn is over
    Done,
    /// The mover died
    Died,
}

/// Resolve one monster's movement along `plan`
///
/// At most one move or attack happens. Returns an error only when the
/// floor bookkeeping refuses a mutation.
pub fn resolve_movement<H: MonsterHooks + ?Sized>(
    world: &mut World,
    hooks: &mut H,
    id: MonsterId,
    plan: &MovePlan,
) -> Result<MoveOutcome, EngineError> {
    let monster = world.floor.monster_or_err(id)?;
    let race = world.bestiary.get_or_err(monster.race)?.clone();
    let riding = world.player.rides(id);
    let mover = Mover {
        id,
        origin: monster.pos,
        pet: monster.is_pet(),
        riding,
        mode: if riding {
            CrossMode::Ridden {
                rider_passes_walls: world.player.pass_wall,
            }
        } else {
            CrossMode::Free
        },
        race,
    };

    let mut outcome = MoveOutcome::default();
    for (i, choice) in plan.choices().iter().enumerate() {
        outcome.stopped_at = i;
        let dir = match *choice {
            MoveChoice::Dir(dir) => dir,
            MoveChoice::Random => Direction::random(&mut world.rng),
        };

        match try_direction(world, hooks, &mover, dir, &mut outcome)? {
            Step::Next => {}
            Step::Done => return Ok(outcome),
            Step::Died => {
                outcome.died = true;
                outcome.turn_taken = true;
                outcome.moved = false;
                world.dirty |= DirtyFlags::FLOW;
                return Ok(outcome);
            }
        }
    }
    outcome.stopped_at = plan.len();
    Ok(outcome)
}

/// Remove the mover if something it did killed it
fn check_died<H: MonsterHooks + ?Sized>(
    world: &mut World,
    hooks: &mut H,
    id: MonsterId,
) -> Result<bool, EngineError> {
    match world.floor.monster(id).map(|m| m.is_alive()) {
        None => Ok(true),
        Some(true) => Ok(false),
        Some(false) => {
            hooks.monster_died(world, id);
            if world.floor.monster(id).is_some() {
                world.remove_monster(id)?;
            }
            Ok(true)
        }
    }
}

/// Destruction is refused for glass while the monster is too frail, unless
/// it is too stupid to care
fn sturdy_enough(glass: bool, mover: &Mover, world: &World) -> bool {
    if !glass || mover.race.is_stupid() {
        return true;
    }
    world
        .floor
        .monster(mover.id)
        .is_some_and(|m| m.hp >= (m.max_hp / 3).max(200))
}

fn try_direction<H: MonsterHooks + ?Sized>(
    world: &mut World,
    hooks: &mut H,
    mover: &Mover,
    dir: Direction,
    outcome: &mut MoveOutcome,
) -> Result<Step, EngineError> {
    let id = mover.id;
    let race = &mover.race;
    let to = dir.step(mover.origin);
    if !world.floor.contains(to) {
        trace!(monster = id.0, %dir, "off the map");
        return Ok(Step::Next);
    }

    let feature = world.floor.feature_or_err(to)?.clone();
    let crossable = can_cross(&feature, race, mover.mode);
    let occupant = world.floor.monster_at(to);
    let player_there = to == world.player.pos;
    let hp = world.floor.monster_or_err(id)?.hp;

    let mut do_move = false;
    let mut must_alter = false;
    let mut kill_wall = false;
    let mut bashed = false;
    let mut opened = false;
    let mut passed_wall = false;

    if player_there || occupant.is_some() {
        do_move = true;
    } else if race.kills_walls()
        && (if crossable { !feature.has(FeatureFlags::LOS) } else { !mover.riding })
        && feature.has(FeatureFlags::HURT_DISI)
        && !feature.has(FeatureFlags::PERMANENT)
        && sturdy_enough(feature.has(FeatureFlags::GLASS), mover, world)
    {
        do_move = true;
        must_alter = !crossable;
        kill_wall = true;
    } else if crossable {
        do_move = true;
        passed_wall = race.passes_walls()
            && (!mover.riding || world.player.pass_wall)
            && feature.has(FeatureFlags::CAN_PASS);
    } else if feature.is_closed_door() {
        let allowed = !mover.pet || world.player.pets_may_open_doors();
        let mut may_bash = true;

        if race.opens_doors() && feature.has(FeatureFlags::OPEN) && allowed {
            if feature.power == 0 {
                // An unlocked door swings open and the monster walks through
                opened = true;
                may_bash = false;
                do_move = true;
                must_alter = true;
                outcome.turn_taken = true;
            } else if world.rng.rand_int0(hp / 10) > feature.power {
                hooks.alter_feature(world, to, FeatAction::Disarm)?;
                hooks.observe(world, MonsterEvent::UnlockedDoor { id, pos: to });
                may_bash = false;
                outcome.turn_taken = true;
            }
        }

        if may_bash
            && race.bashes_doors()
            && feature.has(FeatureFlags::BASH)
            && allowed
            && sturdy_enough(feature.has(FeatureFlags::GLASS), mover, world)
            && world.rng.rand_int0(hp / 10) > feature.power
        {
            hooks.observe(
                world,
                MonsterEvent::BashedDoor {
                    id,
                    pos: to,
                    glass: feature.has(FeatureFlags::GLASS),
                },
            );
            bashed = true;
            do_move = true;
            must_alter = true;
        }

        if opened || bashed {
            let breaks = bashed
                && (world.rng.rand_int0(100) < 50
                    || feature.transition(FeatAction::Open).is_none()
                    || feature.has(FeatureFlags::GLASS));
            if breaks {
                hooks.alter_feature(world, to, FeatAction::Bash)?;
                outcome.behaviors |= Behaviors::BASHED_DOOR;
                if check_died(world, hooks, id)? {
                    return Ok(Step::Died);
                }
            } else {
                hooks.alter_feature(world, to, FeatAction::Open)?;
                if opened {
                    outcome.behaviors |= Behaviors::OPENED_DOOR;
                    hooks.observe(world, MonsterEvent::OpenedDoor { id, pos: to });
                } else {
                    outcome.behaviors |= Behaviors::BASHED_DOOR;
                }
            }
            outcome.view_changed = true;
            world.redraw.push(to);
        }
    }

    // Wards stop everything except a harmless creature stepping at the player
    let ward = world.floor.cell(to).map_or(CellInfo::empty(), |c| c.info);
    let ward_applies = !(race.never_blows() && player_there);
    if do_move && ward.contains(CellInfo::GLYPH) && ward_applies {
        do_move = false;
        if !mover.pet && world.rng.rand_int1(world.config.glyph_break) < race.level {
            let seen = ward.contains(CellInfo::MARK);
            clear_ward(world, to);
            hooks.observe(world, MonsterEvent::GlyphBroken { id, pos: to, seen });
            do_move = true;
        }
    } else if do_move && ward.contains(CellInfo::EXPLOSIVE_RUNE) && ward_applies {
        do_move = false;
        if !mover.pet {
            if world.rng.rand_int1(world.config.rune_break) > race.level {
                if ward.contains(CellInfo::MARK) {
                    hooks.observe(world, MonsterEvent::RuneExploded { id, pos: to });
                    let damage = 2 * (world.player.level + world.rng.damroll(7, 7));
                    hooks.rune_explosion(world, id, to, damage);
                }
            } else {
                hooks.observe(world, MonsterEvent::RuneDisarmed { id, pos: to });
            }
            clear_ward(world, to);
            if check_died(world, hooks, id)? {
                return Ok(Step::Died);
            }
            do_move = true;
        }
    }

    if do_move && player_there {
        if race.never_blows() {
            outcome.noticed |= RaceFlags::NEVER_BLOW;
            do_move = false;
        }

        let confused = world.floor.monster_or_err(id)?.is_confused();
        if do_move && world.no_melee && !confused {
            if race.is_stupid() {
                outcome.noticed |= RaceFlags::STUPID;
            } else {
                do_move = false;
            }
        }

        if do_move && (!world.player.is_riding() || world.rng.one_in(2)) {
            if world.floor.monster_or_err(id)?.is_hostile() {
                trace!(monster = id.0, "attacks the player");
                hooks.attack_player(world, id);
            }
            outcome.turn_taken = true;
            do_move = false;
            if check_died(world, hooks, id)? {
                return Ok(Step::Died);
            }
        }
    }

    // After the player branch the occupant may be the player's mount
    let occupant = if do_move { world.floor.monster_at(to) } else { None };
    let mut pushed = None;
    if let Some(other_id) = occupant {
        do_move = false;
        let (me, other) = match (world.floor.monster(id), world.floor.monster(other_id)) {
            (Some(me), Some(other)) => (me, other),
            _ => return Err(EngineError::UnknownMonster(other_id)),
        };
        let other_race = world.bestiary.get_or_err(other.race)?;
        let not_mount = world.player.riding != Some(other_id);

        let tramples = race.kills_bodies()
            && !race.never_blows()
            && race.threat_value() > other_race.threat_value()
            && crossable
            && not_mount;

        if tramples || are_enemies(me, other, world.arena) || me.is_confused() {
            if !race.never_blows() {
                if race.kills_bodies() {
                    outcome.noticed |= RaceFlags::KILL_BODY;
                }
                if other.is_alive() {
                    let confused = me.is_confused();
                    trace!(monster = id.0, other = other_id.0, "attacks a monster");
                    if hooks.attack_monster(world, id, other_id) {
                        outcome.turn_taken = true;
                        outcome.fought = true;
                        if check_died(world, hooks, id)? {
                            return Ok(Step::Died);
                        }
                        return Ok(Step::Done);
                    }
                    if world.no_melee {
                        if confused {
                            outcome.turn_taken = true;
                            return Ok(Step::Done);
                        }
                        if race.is_stupid() {
                            outcome.noticed |= RaceFlags::STUPID;
                            outcome.turn_taken = true;
                            return Ok(Step::Done);
                        }
                    }
                }
            }
        } else {
            // Pushing requires the weaker monster to be able to stand where
            // the mover was
            let swap_ok = world
                .floor
                .feature(mover.origin)
                .is_some_and(|f| can_cross(f, other_race, CrossMode::Free));
            if race.moves_bodies()
                && !race.never_moves()
                && race.mexp > other_race.mexp
                && crossable
                && not_mount
                && swap_ok
            {
                do_move = true;
                pushed = Some(other_id);
                if let Some(other) = world.floor.monster_mut(other_id) {
                    other.wake();
                }
            }
        }
    }

    if mover.riding {
        let afraid = world.floor.monster_or_err(id)?.is_afraid();
        if !world.player.riding_two_handed && !afraid {
            do_move = false;
        }
    }

    let mut feature = feature;
    if kill_wall && do_move {
        let glass = feature.has(FeatureFlags::GLASS);
        if world.rng.one_in(world.config.grind_noise) {
            hooks.observe(world, MonsterEvent::Grinding { id, pos: to, glass });
        }
        hooks.alter_feature(world, to, FeatAction::Destroy)?;
        outcome.behaviors |= Behaviors::KILLED_WALL;
        if check_died(world, hooks, id)? {
            return Ok(Step::Died);
        }
        feature = world.floor.feature_or_err(to)?.clone();
        outcome.view_changed = true;
        outcome.turn_taken = true;
    }

    let door_altered = opened || bashed;
    if door_altered && !kill_wall {
        feature = world.floor.feature_or_err(to)?.clone();
    }

    if must_alter && !can_cross(&feature, race, mover.mode) {
        do_move = false;
    }

    if do_move && !crossable && !kill_wall && !door_altered {
        do_move = false;
    }

    if do_move && race.never_moves() {
        outcome.noticed |= RaceFlags::NEVER_MOVE;
        do_move = false;
    }

    trace!(monster = id.0, %dir, do_move, turn = outcome.turn_taken, "candidate");
    if !do_move {
        return Ok(if outcome.turn_taken { Step::Done } else { Step::Next });
    }
    outcome.turn_taken = true;

    if feature.has(FeatureFlags::TREE) && !race.flies() && !race.wood_dweller() {
        world.floor.monster_mut_or_err(id)?.energy_need += world.config.energy_per_action;
    }

    match pushed {
        Some(other) => {
            world.floor.swap_monsters(id, other)?;
            world.update_monster_visibility(other);
            hooks.observe(world, MonsterEvent::PushedPast { id, other });
            outcome.behaviors |= Behaviors::MOVED_BODY;
        }
        None => world.floor.relocate_monster(id, to)?,
    }
    if mover.riding {
        world.player.pos = to;
        world.dirty |= DirtyFlags::VIEW | DirtyFlags::FLOW;
    }
    world.update_monster_visibility(id);
    world.redraw.push(mover.origin);
    world.redraw.push(to);
    outcome.moved = true;
    if passed_wall {
        outcome.behaviors |= Behaviors::PASSED_WALL;
    }

    interact_with_items(world, hooks, mover, to, outcome);
    Ok(Step::Done)
}

fn clear_ward(world: &mut World, pos: Pos) {
    if let Some(cell) = world.floor.cell_mut(pos) {
        cell.clear_ward();
    }
    world.redraw.push(pos);
}

/// Pick up or crush what lies on the cell just entered
fn interact_with_items<H: MonsterHooks + ?Sized>(
    world: &mut World,
    hooks: &mut H,
    mover: &Mover,
    pos: Pos,
    outcome: &mut MoveOutcome,
) {
    let race = &mover.race;
    let handles = race.takes_items() || race.kills_items();
    let pet_allowed = !mover.pet || (world.player.pets_may_pick_up() && race.takes_items());
    let Some(cell) = world.floor.cell_mut(pos) else {
        return;
    };
    if cell.items.is_empty() || !handles || !pet_allowed {
        return;
    }

    let pile = std::mem::take(&mut cell.items);
    let takes = race.takes_items();
    let visible = world.floor.monster(mover.id).is_some_and(|m| m.is_visible());
    let player_sees = world.player_can_see(pos);
    // Destruction is noticed anywhere in line of sight, however far
    let in_los = los(&world.floor, world.player.pos, pos);

    let mut left = Vec::new();
    let mut carried = Vec::new();
    for item in pile {
        if takes && item.is_ignored_by_collectors() {
            left.push(item);
            continue;
        }

        let hurts = item.artifact
            || race.flags.intersects(item.slays)
            || (!item.brands.difference(race.immunities).is_empty() && !race.resists_all());

        if hurts {
            if takes && race.is_stupid() {
                outcome.behaviors |= Behaviors::TOOK_ITEM;
                hooks.observe(
                    world,
                    MonsterEvent::PickupFailed {
                        id: mover.id,
                        item: item.name.clone(),
                        seen: visible && player_sees,
                    },
                );
            }
            left.push(item);
        } else if takes {
            outcome.behaviors |= Behaviors::TOOK_ITEM;
            hooks.observe(
                world,
                MonsterEvent::PickedUp {
                    id: mover.id,
                    item: item.name.clone(),
                    seen: player_sees,
                },
            );
            carried.push(item);
        } else if !mover.pet {
            outcome.behaviors |= Behaviors::KILLED_ITEM;
            hooks.observe(
                world,
                MonsterEvent::DestroyedItem {
                    id: mover.id,
                    item: item.name.clone(),
                    seen: in_los,
                },
            );
        } else {
            left.push(item);
        }
    }

    if let Some(cell) = world.floor.cell_mut(pos) {
        cell.items = left;
    }
    if let Some(monster) = world.floor.monster_mut(mover.id) {
        monster.inventory.extend(carried);
    }
}
