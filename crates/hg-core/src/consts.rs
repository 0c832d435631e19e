//! Core engine constants
//!
//! Defaults for the tunables live in `world::AiConfig`; the values here are
//! structural and never change at runtime.

/// Maximum projection / sight range
pub const MAX_RANGE: i32 = 20;

/// Radius of the outermost ring scanned by the safety and hiding searches
pub const MAX_RING_RADIUS: i32 = 9;

/// Normal speed (speed 110 grants 10 energy per game turn)
pub const NORMAL_SPEED: i16 = 110;

/// Haste and slow adjust speed by this much
pub const SPEED_STEP: i16 = 10;

/// Sound cost treated as "unreached" by the spell-position search
pub const UNREACHED_COST: i32 = 999;

/// Sound cost assumed for wall cells by wall-walkers
pub const WALL_COST: i32 = 998;

/// Scale applied to flow targets so ties lean toward the player
pub const FLOW_TWIDDLE: i32 = 16;

/// Energy granted per game turn, indexed by speed (110 = normal)
const EXTRACT_ENERGY: [u8; 200] = [
    /* Slow */ 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    /* Slow */ 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    /* Slow */ 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    /* Slow */ 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    /* Slow */ 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    /* Slow */ 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    /* S-50 */ 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    /* S-40 */ 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    /* S-30 */ 2, 2, 2, 2, 2, 2, 2, 3, 3, 3,
    /* S-20 */ 3, 3, 3, 3, 3, 4, 4, 4, 4, 4,
    /* S-10 */ 5, 5, 5, 5, 6, 6, 7, 7, 8, 9,
    /* Norm */ 10, 11, 12, 13, 14, 15, 16, 17, 18, 19,
    /* F+10 */ 20, 21, 22, 23, 24, 25, 26, 27, 28, 29,
    /* F+20 */ 30, 31, 32, 33, 34, 35, 36, 36, 37, 37,
    /* F+30 */ 38, 38, 39, 39, 40, 40, 40, 41, 41, 41,
    /* F+40 */ 42, 42, 42, 43, 43, 43, 44, 44, 44, 44,
    /* F+50 */ 45, 45, 45, 45, 45, 46, 46, 46, 46, 46,
    /* F+60 */ 47, 47, 47, 47, 47, 48, 48, 48, 48, 48,
    /* F+70 */ 49, 49, 49, 49, 49, 49, 49, 49, 49, 49,
    /* Fast */ 49, 49, 49, 49, 49, 49, 49, 49, 49, 49,
];

/// Energy gained per game turn at the given speed
pub const fn speed_to_energy(speed: i16) -> i32 {
    if speed < 0 {
        return EXTRACT_ENERGY[0] as i32;
    }
    if speed as usize >= EXTRACT_ENERGY.len() {
        return EXTRACT_ENERGY[EXTRACT_ENERGY.len() - 1] as i32;
    }
    EXTRACT_ENERGY[speed as usize] as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_speed_energy() {
        assert_eq!(speed_to_energy(NORMAL_SPEED), 10);
        assert_eq!(speed_to_energy(NORMAL_SPEED + SPEED_STEP), 20);
        assert_eq!(speed_to_energy(NORMAL_SPEED - SPEED_STEP), 5);
    }

    #[test]
    fn test_speed_clamped() {
        assert_eq!(speed_to_energy(-5), 1);
        assert_eq!(speed_to_energy(250), 49);
    }
}
