//! Random number generation
//!
//! Uses a seeded ChaCha RNG so that a monster turn replayed from the same
//! world snapshot makes the same decisions.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Game random number generator
///
/// Wraps ChaCha8Rng for reproducible random number generation. Serializing
/// records the seed, stream and word position, so a restored generator
/// continues exactly where the saved one stopped.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

/// Serialized form of a `GameRng`
#[derive(Serialize, Deserialize)]
struct RngState {
    seed: u64,
    stream: u64,
    word_pos: u128,
}

impl Serialize for GameRng {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        RngState {
            seed: self.seed,
            stream: self.rng.get_stream(),
            word_pos: self.rng.get_word_pos(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameRng {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let state = RngState::deserialize(deserializer)?;
        let mut rng = ChaCha8Rng::seed_from_u64(state.seed);
        rng.set_stream(state.stream);
        rng.set_word_pos(state.word_pos);
        Ok(Self {
            rng,
            seed: state.seed,
        })
    }
}

impl GameRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Get the seed used to create this RNG
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns 0..n-1
    ///
    /// Returns 0 if n is 0 or negative.
    pub fn rand_int0(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Returns 1..=n
    ///
    /// Returns 0 if n is 0 or negative.
    pub fn rand_int1(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        self.rng.gen_range(1..=n)
    }

    /// Returns true with probability 1/n
    pub fn one_in(&mut self, n: i32) -> bool {
        self.rand_int0(n) == 0
    }

    /// Roll `n` dice with `sides` sides
    pub fn damroll(&mut self, n: i32, sides: i32) -> i32 {
        (0..n.max(0)).map(|_| self.rand_int1(sides)).sum()
    }
}
