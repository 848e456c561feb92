//! Random number sources for the sensor simulator
//!
//! System entropy for normal runs, a seeded generator for reproducible
//! sample streams.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Abstraction over the simulator's randomness
pub trait RandomSource: Send {
    /// Uniform `f32` in `[low, high)`
    fn gen_range_f32(&mut self, low: f32, high: f32) -> f32;
}

/// Entropy-seeded randomness
pub struct SystemRandom {
    rng: StdRng,
}

impl SystemRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        self.rng.gen_range(low..high)
    }
}

/// Deterministic randomness from a fixed seed
pub struct SeededRandom {
    rng: StdRng,
    seed: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        self.rng.gen_range(low..high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_random_reproducible() {
        let mut rng1 = SeededRandom::new(42);
        let mut rng2 = SeededRandom::new(42);

        for _ in 0..100 {
            assert_eq!(
                rng1.gen_range_f32(0.0, 1.0).to_bits(),
                rng2.gen_range_f32(0.0, 1.0).to_bits()
            );
        }
    }

    #[test]
    fn test_ranges_respected() {
        let mut rng = SystemRandom::new();
        for _ in 0..1000 {
            let val = rng.gen_range_f32(9.5, 9.8);
            assert!((9.5..9.8).contains(&val));
        }
        assert_eq!(SeededRandom::new(99999).seed(), 99999);
    }
}
