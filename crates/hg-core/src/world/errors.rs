//! Engine error type
//!
//! Decision code reports "nothing found" through `Option`/`bool`. The
//! variants here are bookkeeping violations and configuration problems.

use thiserror::Error;

use crate::dungeon::Pos;
use crate::monster::{MonsterId, RaceId};

/// Errors raised when the world's bookkeeping is asked to do something
/// inconsistent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("no live monster with id {0:?}")]
    UnknownMonster(MonsterId),

    #[error("unknown monster race {0:?}")]
    UnknownRace(RaceId),

    #[error("unknown terrain feature {0}")]
    UnknownFeature(u16),

    #[error("position ({}, {}) is outside the floor", .0.y, .0.x)]
    OutOfBounds(Pos),

    #[error("cell ({}, {}) is already occupied", .0.y, .0.x)]
    Occupied(Pos),

    #[error("monster {id:?} records position ({}, {}) but the cell disagrees", .pos.y, .pos.x)]
    OccupancyDesync { id: MonsterId, pos: Pos },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not read configuration '{path}': {reason}")]
    ConfigIo { path: String, reason: String },

    #[error("world snapshot could not be written or read: {0}")]
    Snapshot(String),
}
