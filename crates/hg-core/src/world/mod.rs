//! World state
//!
//! The floor, player, bestiary and randomness a monster turn runs against,
//! plus configuration, errors and the hooks to outside collaborators.

mod builder;
mod config;
pub mod errors;
mod hooks;
mod state;

pub use builder::WorldBuilder;
pub use config::AiConfig;
pub use errors::EngineError;
pub use hooks::{EventLog, MonsterEvent, MonsterHooks, NullHooks};
pub use state::{DirtyFlags, World};
