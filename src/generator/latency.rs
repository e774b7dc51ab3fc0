//! Latency sources for the generator.
//!
//! The generator draws one latency per iteration through [`LatencySource`],
//! so tests can script exact values while the binary uses a random draw.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Exclusive upper bound of simulated latencies, in milliseconds.
pub const LATENCY_UPPER_BOUND: u64 = 10_000;

/// Produces the latency for the next simulated request.
pub trait LatencySource {
    /// Return a latency in milliseconds.
    fn next_latency(&mut self) -> u64;
}

/// Uniform random latencies in `[0, LATENCY_UPPER_BOUND)`.
#[derive(Debug, Clone)]
pub struct RandomLatency<R = StdRng> {
    rng: R,
}

impl RandomLatency<StdRng> {
    /// Create a source seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Create a reproducible source from a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomLatency<R> {
    /// Wrap an existing random number generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> LatencySource for RandomLatency<R> {
    fn next_latency(&mut self) -> u64 {
        self.rng.gen_range(0..LATENCY_UPPER_BOUND)
    }
}
