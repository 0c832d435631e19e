//! Object system
//!
//! Items lying on the floor and carried by monsters.

mod item;

pub use item::{Item, ItemKind};
