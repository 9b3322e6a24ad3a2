use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Pluggable random source: one uniform draw in `[0, 1)`.
///
/// All randomness in the engine flows through this trait so tests can
/// substitute deterministic sequences.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;

    fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_unit() * (max - min)
    }

    /// Uniform index in `[0, n)`. `n` must be > 0.
    fn next_index(&mut self, n: usize) -> usize {
        ((self.next_unit() * n as f64) as usize).min(n - 1)
    }
}

/// Production source: ChaCha8 seeded per session.
pub struct ChaChaSource {
    rng: ChaCha8Rng,
}

impl ChaChaSource {
    pub fn seeded(seed: u64) -> Self {
        ChaChaSource {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::seeded(rand::random::<u64>())
    }
}

impl RandomSource for ChaChaSource {
    fn next_unit(&mut self) -> f64 {
        // 53 high bits give a uniform double in [0, 1)
        (self.rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted. Test double.
pub struct ScriptedSource {
    values: Vec<f64>,
    index: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "scripted source needs at least one value");
        ScriptedSource { values, index: 0 }
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        let v = self.values[self.index % self.values.len()];
        self.index += 1;
        v
    }
}

/// Simple xorshift64 PRNG step for deterministic sub-seed mixing.
pub fn xorshift64(mut state: u64) -> u64 {
    if state == 0 {
        state = 1;
    }
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

/// Derive a deterministic sub-seed from a base seed, a tick, and a salt.
pub fn mix_seed(seed: u64, tick: u64, salt: u64) -> u64 {
    xorshift64(
        seed.wrapping_mul(6364136223846793005)
            .wrapping_add(tick)
            .wrapping_mul(1442695040888963407)
            .wrapping_add(salt),
    )
}
