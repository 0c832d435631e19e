//! hg-core: per-turn monster decision and movement engine
//!
//! Each game turn the scheduler gives every nearby monster energy by speed;
//! a monster with enough energy picks where it wants to go (toward the
//! player, away from it, after another monster) and the movement resolver
//! settles what actually happens on the grid. Combat, spells and messages
//! are left to the caller through [`world::MonsterHooks`].
//!
//! Nothing here performs I/O apart from [`world::AiConfig::load`].

mod consts;
pub mod dungeon;
pub mod monster;
pub mod object;
pub mod player;
mod rng;
pub mod world;

pub use consts::*;
pub use rng::GameRng;
