//! Injectable randomness
//!
//! Spawners never touch a global RNG. Games get a [`SeededRandom`]; tests can
//! script exact draws with [`ScriptedRandom`].

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Uniform draws in `[0, 1)`
pub trait RandomSource {
    fn uniform(&mut self) -> f32;

    /// Uniform draw in `[lo, hi)`
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.uniform() * (hi - lo)
    }

    /// Uniform index in `0..n` (0 when `n` is 0)
    fn index(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        ((self.uniform() * n as f32) as usize).min(n - 1)
    }

    /// `true` with probability `p`
    fn chance(&mut self, p: f32) -> bool {
        self.uniform() < p
    }
}

/// PCG-backed source, reproducible from a seed
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: Pcg32,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

/// Replays a fixed list of values, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// Always returns `value`
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v.clamp(0.0, 0.999_999)
    }
}
