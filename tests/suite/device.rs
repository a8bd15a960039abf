//! Observable behavior of the bit ring through the device protocol.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tumbler_device::{BitRing, Device};
use tumbler_types::{PatternError, PolicyFamily, RotationPolicy, is_uniform, parse_bits};

use crate::common::ring;

fn random_request(rng: &mut StdRng, size: usize, budget: usize) -> String {
    let mut positions: Vec<usize> = (0..size).collect();
    for i in (1..size).rev() {
        positions.swap(i, rng.random_range(0..=i));
    }
    positions.truncate(budget);
    (0..size)
        .map(|i| if positions.contains(&i) { '?' } else { '-' })
        .collect()
}

fn random_pattern(rng: &mut StdRng, size: usize) -> String {
    (0..size)
        .map(|_| if rng.random_bool(0.5) { 'T' } else { 'F' })
        .collect()
}

#[test]
fn zero_step_ring_never_moves() {
    let mut ring = ring("TTFT", 2, RotationPolicy::Fixed { step: 0 });
    for _ in 0..4 {
        assert!(!ring.spin());
    }
    assert_eq!(ring.bits(), parse_bits("TTFT").unwrap());
    assert_eq!(ring.render_bits(), "[T, T, F, T]");
}

#[test]
fn peek_after_spin_discloses_requested_positions() {
    let mut ring = ring("TFFT", 2, RotationPolicy::Fixed { step: 1 });
    ring.spin();
    let reply = ring.peek("??--").unwrap().unwrap();
    let glyphs: Vec<char> = reply.chars().collect();
    assert_eq!(glyphs.len(), 4);
    assert!(matches!(glyphs[0], 'T' | 'F'));
    assert!(matches!(glyphs[1], 'T' | 'F'));
    assert_eq!(&glyphs[2..], &['-', '-']);

    let bits = ring.bits();
    assert_eq!(glyphs[0] == 'T', bits[0]);
    assert_eq!(glyphs[1] == 'T', bits[1]);
}

#[test]
fn poke_writes_only_disclosed_positions() {
    let mut ring = ring("FFTF", 2, RotationPolicy::Fixed { step: 3 });
    ring.spin();
    let before = ring.bits();
    ring.peek("?--?").unwrap();
    ring.poke("TFFT").unwrap();

    let after = ring.bits();
    assert!(after[0]);
    assert!(after[3]);
    assert_eq!(after[1], before[1]);
    assert_eq!(after[2], before[2]);
}

#[test]
fn spin_reports_uniformity_before_rotating() {
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..200 {
        let size = rng.random_range(1..=6);
        let policy = RotationPolicy::Polynomial {
            step: rng.random_range(0..=6),
            multiplier: rng.random_range(1..5),
        };
        let mut ring = BitRing::random_with_policy(size, 1, policy, &mut rng).unwrap();
        for _ in 0..10 {
            let before = ring.bits();
            let uniform = ring.spin();
            assert_eq!(uniform, is_uniform(&before));
            assert_eq!(ring.size(), size);
            assert_eq!(ring.bits().len(), size);
            if uniform {
                assert_eq!(ring.bits(), before);
            }

            let request = random_request(&mut rng, size, 1);
            ring.peek(&request).unwrap();
            ring.poke(&random_pattern(&mut rng, size)).unwrap();
        }
    }
}

#[test]
fn peek_then_poke_changes_at_most_budget_disclosed_bits() {
    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..500 {
        let size = rng.random_range(2..=7);
        let budget = rng.random_range(1..=size);
        let family = PolicyFamily::ALL[rng.random_range(0..PolicyFamily::ALL.len())];
        let mut ring = BitRing::random_with_family(size, budget, family, &mut rng).unwrap();
        ring.spin();

        let request = random_request(&mut rng, size, budget);
        ring.peek(&request).unwrap();
        let before = ring.bits();
        ring.poke(&random_pattern(&mut rng, size)).unwrap();
        let after = ring.bits();

        let changed: Vec<usize> = (0..size).filter(|&i| before[i] != after[i]).collect();
        assert!(changed.len() <= budget);
        for index in changed {
            assert_eq!(request.as_bytes()[index], b'?', "{request} changed {index}");
        }
    }
}

#[test]
fn illegal_calls_do_not_mutate_and_repeat_identically() {
    let mut ring = ring("TFTF", 2, RotationPolicy::Random);
    let before = ring.bits();

    let first = ring.peek("??--");
    let second = ring.peek("??--");
    assert_eq!(first, Ok(None));
    assert_eq!(first, second);

    for _ in 0..2 {
        assert_eq!(ring.poke("TTTT"), Ok(()));
    }
    assert_eq!(ring.bits(), before);

    ring.spin();
    ring.peek("?-?-").unwrap();
    ring.poke("T-T-").unwrap();
    let settled = ring.bits();
    assert_eq!(ring.poke("FFFF"), Ok(()));
    assert_eq!(ring.peek("??--"), Ok(None));
    assert_eq!(ring.bits(), settled);
}

#[test]
fn wrong_length_patterns_fail_without_side_effects() {
    let mut ring = ring("TFTF", 2, RotationPolicy::Fixed { step: 1 });
    ring.spin();
    let before = ring.bits();

    let expected = Err(PatternError::LengthMismatch {
        expected: 4,
        actual: 3,
    });
    assert_eq!(ring.peek("??-"), expected.clone().map(|()| None));
    assert_eq!(ring.poke("TTT"), expected);
    assert_eq!(ring.bits(), before);

    assert!(ring.peek("??--").unwrap().is_some());
}

#[test]
fn device_trait_objects_drive_the_ring() {
    let mut ring = ring("TTTF", 1, RotationPolicy::Fixed { step: 0 });
    let device: &mut dyn Device = &mut ring;
    assert_eq!((device.size(), device.budget()), (4, 1));
    assert!(!device.spin());
    assert_eq!(device.peek("---?").unwrap().as_deref(), Some("---F"));
    device.poke("---T").unwrap();
    assert!(device.spin());
}
