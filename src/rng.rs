//! Seeded pseudorandom stream shared by every stochastic decision in the simulator.
//!
//! A single [`Rng`] instance is threaded as explicit `&mut` state through PHY
//! initialization/stepping, traffic arrivals, and HARQ ACK/NACK sampling. Using
//! one seeded stream (rather than a thread-local or process-global RNG) is what
//! makes a run fully reproducible from its seed: the same seed and config walk
//! the exact same sequence of draws, in the exact same phase order, every time.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::f64::consts::PI;

/// Seeded uniform/normal sampler used throughout the simulation core.
pub struct Rng {
    inner: StdRng,
}

impl Rng {
    /// Construct a stream seeded from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw a value in the open interval `(0, 1)`.
    ///
    /// Avoids returning exactly `0.0` or `1.0` so downstream log/logit
    /// transforms (shadowing, fading innovation) never see a degenerate input.
    pub fn uniform01(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits as f64 + 1.0) / (u64::MAX as f64 + 2.0)
    }

    /// Draw a uniform integer in `[lo, hi]` inclusive. Returns `lo` if `hi <= lo`.
    pub fn int_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo + 1) as f64;
        lo + (self.uniform01() * span).floor() as i64
    }

    /// Draw a standard-normal sample via Box-Muller, consuming two `uniform01` draws.
    pub fn normal(&mut self) -> f64 {
        let u1 = self.uniform01();
        let u2 = self.uniform01();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;
        r * theta.cos()
    }
}
