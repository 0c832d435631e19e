//! Player system
//!
//! Only the parts of the player that monsters react to.

mod you;

pub use you::{EVIL_ALIGNMENT, GOOD_ALIGNMENT, PetOptions, Player};
