//! Dungeon system
//!
//! Contains the floor grid, terrain features, spatial queries and the
//! sound/scent fields monsters use to track the player.

mod cell;
mod feature;
mod floor;
mod noise;
mod pos;
pub mod spatial;

pub use cell::{Cell, CellInfo};
pub use feature::{FeatAction, Feature, FeatureFlags, FeatureId, FeatureTable};
pub use floor::Floor;
pub use noise::NoiseField;
pub use pos::Pos;
pub use spatial::{
    can_cross, can_enter, clean_shot, distance, in_disintegration_range, los, projectable,
    CrossMode,
};
