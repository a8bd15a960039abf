//! Randomly configured rings for trials and tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tumbler_types::{PolicyFamily, RotationPolicy, is_uniform};

use crate::ring::{BitRing, RingError};

/// Upper bound (exclusive) for randomly chosen polynomial multipliers.
const MAX_RANDOM_MULTIPLIER: u64 = 10;

/// Random policy of the given family: steps fall in `[0, size]` and
/// multipliers in `[1, 10)`.
fn random_policy<R: Rng + ?Sized>(
    family: PolicyFamily,
    size: usize,
    rng: &mut R,
) -> RotationPolicy {
    let step = rng.random_range(0..=size as u64);
    match family {
        PolicyFamily::Fixed => RotationPolicy::Fixed { step },
        PolicyFamily::Polynomial => RotationPolicy::Polynomial {
            step,
            multiplier: rng.random_range(1..MAX_RANDOM_MULTIPLIER),
        },
        PolicyFamily::Random => RotationPolicy::Random,
    }
}

impl BitRing {
    /// Ring with random bits and a random policy of `family`.
    pub fn random_with_family<R: Rng + ?Sized>(
        size: usize,
        budget: usize,
        family: PolicyFamily,
        rng: &mut R,
    ) -> Result<Self, RingError> {
        let policy = random_policy(family, size, rng);
        Self::random_with_policy(size, budget, policy, rng)
    }

    /// Ring with random bits and the given policy.
    ///
    /// With two or more bits the ring never starts uniform: when every drawn
    /// bit agrees, the last one is flipped.
    pub fn random_with_policy<R: Rng + ?Sized>(
        size: usize,
        budget: usize,
        policy: RotationPolicy,
        rng: &mut R,
    ) -> Result<Self, RingError> {
        let mut bits: Vec<bool> = (0..size).map(|_| rng.random_bool(0.5)).collect();
        if size > 1 && is_uniform(&bits[..size - 1]) && bits[size - 1] == bits[0] {
            bits[size - 1] = !bits[0];
        }
        Self::with_rng(bits, budget, policy, StdRng::seed_from_u64(rng.random()))
    }
}
