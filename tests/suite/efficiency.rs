//! Success rate over many randomly configured rings.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tumbler_core::{UnlockSettings, Unlocker};
use tumbler_device::BitRing;
use tumbler_types::{PolicyFamily, RotationPolicy};

const RINGS: usize = 1000;

#[test]
fn unlocks_at_least_ninety_nine_percent_of_random_rings() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut unlocked = [0usize; 3];

    for index in 0..RINGS {
        let family = PolicyFamily::ALL[index % 3];
        let mut ring = BitRing::random_with_family(4, 2, family, &mut rng).unwrap();
        let settings = UnlockSettings::default().with_seed(rng.random());
        if Unlocker::with_settings(Some(&mut ring), settings).unlock() {
            unlocked[index % 3] += 1;
        }
    }

    let total: usize = unlocked.iter().sum();
    assert!(
        total * 100 >= RINGS * 99,
        "unlocked {total}/{RINGS} (fixed {}, polynomial {}, random {})",
        unlocked[0],
        unlocked[1],
        unlocked[2]
    );
    assert_eq!(unlocked[0], RINGS.div_ceil(3));
}

#[test]
fn larger_rings_still_unlock() {
    let mut rng = StdRng::seed_from_u64(77);
    let mut failures = 0;
    for index in 0..60 {
        let policy = match index % 2 {
            0 => RotationPolicy::Fixed {
                step: rng.random_range(0..8),
            },
            _ => RotationPolicy::Random,
        };
        let mut ring = BitRing::random_with_policy(8, 3, policy, &mut rng).unwrap();
        let settings = UnlockSettings::default().with_seed(rng.random());
        if !Unlocker::with_settings(Some(&mut ring), settings).unlock() {
            failures += 1;
        }
    }
    assert!(failures <= 1, "{failures} of 60 larger rings stayed locked");
}
