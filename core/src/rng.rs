//! Deterministic random number generation for synthetic fleets.
//!
//! RULE: scenario generation never calls a platform RNG. Every draw flows
//! through a `ScenarioRng` seeded from the caller's seed, so the same seed
//! always yields the same fleet.
//!
//! Each aspect of a scenario (customers, devices, telemetry, pricing) gets
//! its own stream derived from (seed XOR stream index). Adding a stream
//! never shifts the draws of existing ones.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct ScenarioRng {
    inner: Pcg64Mcg,
}

impl ScenarioRng {
    pub fn new(seed: u64, stream: Stream) -> Self {
        let derived = seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self { inner: Pcg64Mcg::seed_from_u64(derived) }
    }

    /// Float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        (self.inner.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Integer in [0, n). Returns 0 when n is 0.
    pub fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.inner.next_u64() % n
    }

    /// Float in [lo, hi).
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len() as u64) as usize]
    }
}

/// Stable stream assignments. Append only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Stream {
    Customers = 0,
    Devices   = 1,
    Telemetry = 2,
    Pricing   = 3,
}
