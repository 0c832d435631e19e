//! Monster system
//!
//! Races and instances, the direction heuristics that steer them, and the
//! per-turn machinery that moves them.

pub mod ai;
mod direction;
pub mod flee;
mod monst;
pub mod movement;
pub mod process;
pub mod pursuit;
mod race;
mod rings;
pub mod scheduler;

pub use ai::{choose_moves, first_step};
pub use direction::{Direction, MoveChoice, MovePlan};
pub use monst::{are_enemies, Allegiance, Monster, MonsterFlags, MonsterId, MonsterTimers};
pub use movement::{resolve_movement, Behaviors, MoveOutcome};
pub use process::{resolve_monster_action, TurnAction, TurnReport};
pub use race::{Bestiary, Elements, MonsterRace, RaceFlags, RaceId, RaceLore, SpellSet};
pub use rings::RingTable;
pub use scheduler::{run_monster_turn_scan, ScanSummary};
