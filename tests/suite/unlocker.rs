//! Unlocker protocol enforcement and search behavior against real rings.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tumbler_core::{Operation, SearchBudget, TraceLog, UnlockSettings, Unlocker, unlock};
use tumbler_device::BitRing;
use tumbler_types::{ProtocolState, RotationPolicy, parse_bits};

use crate::common::{CountingDevice, ring};

fn run_counted(
    device: &mut CountingDevice<BitRing>,
    settings: UnlockSettings,
) -> (bool, TraceLog) {
    let mut unlocker = Unlocker::with_settings(Some(device), settings);
    let unlocked = unlocker.unlock();
    (unlocked, unlocker.trace().clone())
}

#[test]
fn unlock_without_device_returns_false() {
    assert!(!unlock::<BitRing>(None));

    let mut unlocker = Unlocker::<BitRing>::new(None);
    assert!(!unlocker.unlock());
    assert_eq!(unlocker.show_trace(), "");
    assert_eq!(unlocker.search_budget(), None);
}

#[test]
fn manual_protocol_walk_records_rejections() {
    let mut device = CountingDevice::new(ring("TFFT", 2, RotationPolicy::Fixed { step: 1 }));
    let mut unlocker = Unlocker::new(Some(&mut device));
    unlocker.reset();

    unlocker.poke('T');
    assert_eq!(unlocker.peek("??--"), "??--");
    assert!(!unlocker.spin(0));
    assert_eq!(unlocker.state(), ProtocolState::Created);

    assert!(!unlocker.spin(1));
    assert_eq!(unlocker.peek("???-"), "???-");
    assert_eq!(unlocker.state(), ProtocolState::Spun);
    assert_eq!(unlocker.peek("?-?-"), "F-T-");
    unlocker.poke('T');
    assert_eq!(unlocker.state(), ProtocolState::Poked);

    assert_eq!(
        unlocker.show_trace(),
        "rejected poke T in CREATED: poke is not allowed in state CREATED\n\
         rejected peek ??-- in CREATED: peek is not allowed in state CREATED\n\
         rejected spin in CREATED: spin count must be at least 1\n\
         spin -> false\n\
         rejected peek ???- in SPUN: pattern must disclose exactly 2 positions, got 3\n\
         peek ?-?- -> F-T-\n\
         poke T-T-\n"
    );
    assert_eq!(unlocker.trace().device_calls(), 3);
    drop(unlocker);

    assert_eq!((device.spins, device.peeks, device.pokes), (1, 1, 1));
    assert_eq!(device.inner.bits(), parse_bits("TFTT").unwrap());
}

#[test]
fn trace_matches_device_calls_one_to_one() {
    let mut rng = StdRng::seed_from_u64(4);
    let policies = [
        RotationPolicy::Fixed { step: 3 },
        RotationPolicy::Polynomial {
            step: 1,
            multiplier: 2,
        },
        RotationPolicy::Random,
    ];
    let bound = SearchBudget::new(4, 2, UnlockSettings::default().phase_b_rounds).max_calls();

    for seed in 0..90 {
        let policy = policies[seed as usize % policies.len()];
        let ring = BitRing::random_with_policy(4, 2, policy, &mut rng).unwrap();
        let mut device = CountingDevice::new(ring);
        let (unlocked, trace) = run_counted(&mut device, UnlockSettings::default().with_seed(seed));

        assert_eq!(trace.device_calls(), device.calls());
        assert_eq!(trace.count(Operation::Spin), device.spins);
        assert_eq!(trace.count(Operation::Peek), device.peeks);
        assert_eq!(trace.count(Operation::Poke), device.pokes);
        assert!(trace.records().iter().all(|record| !record.is_rejected()));
        assert!(device.calls() <= bound);
        assert_eq!(unlocked, device.inner.is_uniform());
        if unlocked {
            assert_eq!(trace.render().lines().last(), Some("spin -> true"));
        }
    }
}

#[test]
fn fixed_rings_always_unlock() {
    let mut rng = StdRng::seed_from_u64(31);
    for size in 2..=6 {
        for budget in 1..=size.min(3) {
            for step in 0..=size as u64 {
                for _ in 0..4 {
                    let policy = RotationPolicy::Fixed { step };
                    let mut ring =
                        BitRing::random_with_policy(size, budget, policy, &mut rng).unwrap();
                    let settings = UnlockSettings::default().with_seed(rng.random());
                    let mut unlocker = Unlocker::with_settings(Some(&mut ring), settings);
                    assert!(unlocker.unlock(), "size {size} budget {budget} step {step}");
                }
            }
        }
    }
}

#[test]
fn uniform_ring_unlocks_on_first_spin() {
    let mut device = CountingDevice::new(ring("FFFF", 2, RotationPolicy::Random));
    let (unlocked, trace) = run_counted(&mut device, UnlockSettings::default());
    assert!(unlocked);
    assert_eq!(trace.render(), "spin -> true\n");
    assert_eq!(device.calls(), 1);
}

#[test]
fn false_target_drives_ring_to_all_false() {
    let mut device = CountingDevice::new(ring("TFTT", 2, RotationPolicy::Fixed { step: 1 }));
    let settings = UnlockSettings {
        target: false,
        ..UnlockSettings::default()
    };
    let (unlocked, trace) = run_counted(&mut device, settings);
    assert!(unlocked);
    assert_eq!(device.inner.bits(), vec![false; 4]);
    assert!(
        trace
            .records()
            .iter()
            .filter(|record| record.operation() == Operation::Poke)
            .all(|record| !record.to_string().contains('T'))
    );
}

#[test]
fn unlocker_can_be_reused_across_sessions() {
    let mut device = CountingDevice::new(ring("TFFF", 1, RotationPolicy::Fixed { step: 2 }));
    let mut unlocker = Unlocker::new(Some(&mut device));
    assert!(unlocker.unlock());
    let first = unlocker.trace().len();
    assert!(first > 1);

    assert!(unlocker.unlock());
    assert_eq!(unlocker.show_trace(), "spin -> true\n");
}

#[test]
fn wide_rings_are_searched_lazily() {
    let bits: Vec<bool> = (0..64).map(|index| index == 0).collect();
    let ring = BitRing::new(bits, 32, RotationPolicy::Fixed { step: 0 }).unwrap();
    let mut device = CountingDevice::new(ring);
    let (unlocked, trace) = run_counted(&mut device, UnlockSettings::default().with_seed(1));
    assert!(unlocked);
    assert_eq!((device.spins, device.peeks, device.pokes), (34, 33, 33));
    assert_eq!(trace.device_calls(), device.calls());
    assert!(device.inner.bits().iter().all(|&bit| bit));
}
