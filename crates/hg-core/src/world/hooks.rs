//! Collaborator hooks
//!
//! Combat, spellcasting, spawning and messaging live outside the engine.
//! The engine calls them through `MonsterHooks`; every method has a default
//! so a caller only overrides what it cares about.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{EngineError, World};
use crate::dungeon::{distance, FeatAction, Pos};
use crate::monster::MonsterId;

/// Something the player might notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterEvent {
    /// A mount that cannot be ridden threw its rider
    ThrewRider { mount: MonsterId },
    /// Woken by aggravation
    Woke { id: MonsterId },
    /// Summoner gone, so the summoned left too
    LostParent { id: MonsterId },
    /// Quantum monster blinked out of existence
    Vanished { id: MonsterId },
    /// A badly hurt mount strains against the reins
    PinchWarning { id: MonsterId },
    /// A badly hurt companion ran away for good
    Escaped { id: MonsterId },
    TurnedHostile { id: MonsterId },
    Multiplied { parent: MonsterId, child: MonsterId },
    OpenedDoor { id: MonsterId, pos: Pos },
    UnlockedDoor { id: MonsterId, pos: Pos },
    BashedDoor { id: MonsterId, pos: Pos, glass: bool },
    GlyphBroken { id: MonsterId, pos: Pos, seen: bool },
    RuneExploded { id: MonsterId, pos: Pos },
    RuneDisarmed { id: MonsterId, pos: Pos },
    /// Audible wall destruction
    Grinding { id: MonsterId, pos: Pos, glass: bool },
    PushedPast { id: MonsterId, other: MonsterId },
    PickedUp { id: MonsterId, item: String, seen: bool },
    PickupFailed { id: MonsterId, item: String, seen: bool },
    DestroyedItem { id: MonsterId, item: String, seen: bool },
    /// Cornered and no longer afraid
    TurnedToFight { id: MonsterId },
}

/// External collaborators consumed by the monster engine
pub trait MonsterHooks {
    /// Melee against the player
    fn attack_player(&mut self, _world: &mut World, _attacker: MonsterId) {}

    /// Melee against another monster; false if no blow was struck
    fn attack_monster(&mut self, _world: &mut World, _attacker: MonsterId, _defender: MonsterId) -> bool {
        true
    }

    /// Try a spell at the player; true if one was cast
    fn cast_at_player(&mut self, _world: &mut World, _caster: MonsterId) -> bool {
        false
    }

    /// Try a spell at another monster; true if one was cast
    fn cast_at_monster(&mut self, _world: &mut World, _caster: MonsterId) -> bool {
        false
    }

    /// Create a copy of a breeder next to it
    fn spawn_offspring(&mut self, world: &mut World, parent: MonsterId) -> Option<MonsterId> {
        world.place_offspring(parent)
    }

    /// Turn a shape-changer into something else
    fn change_form(&mut self, _world: &mut World, _id: MonsterId) {}

    /// Terrain mutation primitive (open, bash, disarm, destroy)
    fn alter_feature(&mut self, world: &mut World, pos: Pos, action: FeatAction) -> Result<bool, EngineError> {
        world.floor.alter_feature(pos, action)
    }

    /// An explosive rune went off at `pos`
    ///
    /// By default every monster within two cells takes the damage. Monsters
    /// other than `trigger` that drop below zero hit points are removed; the
    /// engine checks `trigger` itself.
    fn rune_explosion(&mut self, world: &mut World, trigger: MonsterId, pos: Pos, damage: i32) {
        let hit: Vec<MonsterId> = world
            .floor
            .monsters()
            .filter(|m| distance(m.pos, pos) <= 2)
            .map(|m| m.id)
            .collect();
        for id in hit {
            let dead = match world.floor.monster_mut(id) {
                Some(m) => {
                    m.hp -= damage;
                    !m.is_alive()
                }
                None => false,
            };
            if dead && id != trigger {
                self.monster_died(world, id);
                // monster_died may already have taken the body away
                if world.floor.monster(id).is_none() {
                    continue;
                }
                if let Err(err) = world.remove_monster(id) {
                    warn!(monster = id.0, %err, "could not remove monster killed by a rune");
                }
            }
        }
    }

    /// A monster died while resolving its own turn; called before removal
    fn monster_died(&mut self, _world: &mut World, _id: MonsterId) {}

    /// Observable events, for messages and lore
    fn observe(&mut self, _world: &World, _event: MonsterEvent) {}
}

/// Hooks that do nothing beyond the defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHooks;

impl MonsterHooks for NullHooks {}

/// Records every observed event; handy in tests and the simulator
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<MonsterEvent>,
}

impl MonsterHooks for EventLog {
    fn observe(&mut self, _world: &World, event: MonsterEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monster::{Monster, MonsterRace};
    use crate::world::WorldBuilder;

    #[test]
    fn test_rune_explosion_default_damages_area() {
        let mut world = WorldBuilder::new()
            .map(&[
                "#######",
                "#@....#",
                "#.....#",
                "#######",
            ])
            .build()
            .unwrap();
        let race = world.bestiary.insert(MonsterRace::new("kobold", 'k', 2));
        let near = world.spawn_monster(Monster::new(race, Pos::new(1, 4), 5)).unwrap();
        let far = world.spawn_monster(Monster::new(race, Pos::new(2, 5), 50)).unwrap();
        let trigger = world.spawn_monster(Monster::new(race, Pos::new(2, 3), 5)).unwrap();

        let mut hooks = NullHooks;
        hooks.rune_explosion(&mut world, trigger, Pos::new(1, 3), 10);

        assert!(world.floor.monster(near).is_none());
        assert_eq!(world.floor.monster(far).map(|m| m.hp), Some(40));
        assert_eq!(world.floor.monster(trigger).map(|m| m.hp), Some(-5));
    }

    /// Removes the body as soon as it is told about the death
    struct Undertaker {
        buried: Vec<MonsterId>,
    }

    impl MonsterHooks for Undertaker {
        fn monster_died(&mut self, world: &mut World, id: MonsterId) {
            if world.remove_monster(id).is_ok() {
                self.buried.push(id);
            }
        }
    }

    #[test]
    fn test_rune_explosion_tolerates_bodies_removed_by_the_hook() {
        let mut world = WorldBuilder::new()
            .map(&["#######", "#@....#", "#.....#", "#######"])
            .build()
            .unwrap();
        let race = world.bestiary.insert(MonsterRace::new("kobold", 'k', 2));
        let a = world.spawn_monster(Monster::new(race, Pos::new(1, 4), 5)).unwrap();
        let b = world.spawn_monster(Monster::new(race, Pos::new(2, 4), 5)).unwrap();
        let trigger = world.spawn_monster(Monster::new(race, Pos::new(2, 3), 50)).unwrap();

        let mut hooks = Undertaker { buried: Vec::new() };
        hooks.rune_explosion(&mut world, trigger, Pos::new(1, 3), 10);

        assert_eq!(hooks.buried.len(), 2);
        assert!(hooks.buried.contains(&a) && hooks.buried.contains(&b));
        assert_eq!(world.floor.monster_count(), 1);
        assert!(world.floor.check_occupancy().is_ok());
    }

    #[test]
    fn test_event_log_records() {
        let world = WorldBuilder::new().map(&["@."]).build().unwrap();
        let mut log = EventLog::default();
        log.observe(&world, MonsterEvent::Woke { id: MonsterId(1) });
        assert_eq!(log.events.len(), 1);
    }
}
