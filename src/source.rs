// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Sources of uniformly distributed random bits.
//! The samplers only ever consume full 64-bit blocks, so the interface
//! is a single draw method plus reseeding for reproducible runs.

use rand::{RngCore, SeedableRng};

/// A supplier of independent unbiased 64-bit random blocks.
pub trait RandomSource {
    /// Draw the next 64-bit block.
    fn next(&mut self) -> u64;
    /// Reset to a reproducible state derived from `seed`.
    fn reseed(&mut self, seed: u64);
}

/// Production source: StdRng seeded from operating system entropy.
pub struct EntropySource {
    rng: rand::rngs::StdRng,
}

impl EntropySource {
    pub fn new() -> Self {
        EntropySource {
            rng: rand::rngs::StdRng::from_os_rng(),
        }
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropySource {
    fn next(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = rand::rngs::StdRng::seed_from_u64(seed);
    }
}

/// Deterministic source for repeatable verification runs.
pub struct SeededSource {
    rng: rand::rngs::StdRng,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        SeededSource {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededSource {
    fn next(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = rand::rngs::StdRng::seed_from_u64(seed);
    }
}

/// Replays a fixed list of blocks, for bit-exact tests.
/// Panics when the script runs out.
pub struct ScriptedSource {
    words: Vec<u64>,
    pos: usize,
}

impl ScriptedSource {
    pub fn new(words: &[u64]) -> Self {
        ScriptedSource {
            words: words.to_vec(),
            pos: 0,
        }
    }

    /// Number of blocks consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl RandomSource for ScriptedSource {
    fn next(&mut self) -> u64 {
        let word = self.words[self.pos];
        self.pos += 1;
        word
    }

    fn reseed(&mut self, _seed: u64) {
        self.pos = 0;
    }
}

/// Degenerate sources for exercising edge paths.
pub mod testgens {
    use super::RandomSource;

    pub struct AllOnes {}
    impl RandomSource for AllOnes {
        fn next(&mut self) -> u64 {
            u64::MAX
        }

        fn reseed(&mut self, _seed: u64) {}
    }

    pub struct AllZeros {}
    impl RandomSource for AllZeros {
        fn next(&mut self) -> u64 {
            0
        }

        fn reseed(&mut self, _seed: u64) {}
    }
}
