//! Batch unlock attempts over randomly generated rings.

use std::fmt;

use rand::Rng;
use rand::rngs::StdRng;
use serde::Serialize;

use tumbler_core::{UnlockSettings, Unlocker};
use tumbler_device::{BitRing, RingError};
use tumbler_types::PolicyFamily;

#[derive(Debug, Clone, Copy)]
pub struct TrialPlan {
    pub count: usize,
    pub size: usize,
    pub budget: usize,
    pub settings: UnlockSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FamilyTally {
    pub attempts: usize,
    pub unlocked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialReport {
    pub families: Vec<(PolicyFamily, FamilyTally)>,
    /// Device calls across all attempts.
    pub calls: usize,
}

impl TrialReport {
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.families.iter().map(|(_, tally)| tally.attempts).sum()
    }

    #[must_use]
    pub fn unlocked(&self) -> usize {
        self.families.iter().map(|(_, tally)| tally.unlocked).sum()
    }

    #[must_use]
    pub fn rate(&self) -> f64 {
        match self.attempts() {
            0 => 1.0,
            attempts => self.unlocked() as f64 / attempts as f64,
        }
    }
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (family, tally) in &self.families {
            writeln!(f, "{family:<10} {}/{}", tally.unlocked, tally.attempts)?;
        }
        write!(
            f,
            "total      {}/{} ({:.1}%)",
            self.unlocked(),
            self.attempts(),
            self.rate() * 100.0
        )
    }
}

/// Run `plan.count` attempts, cycling through [`PolicyFamily::ALL`].
///
/// Each ring and each unlocker gets its own seed drawn from `rng`, so a
/// seeded `rng` reproduces the whole batch.
pub fn run(plan: TrialPlan, rng: &mut StdRng) -> Result<TrialReport, RingError> {
    let mut tallies = [FamilyTally::default(); PolicyFamily::ALL.len()];
    let mut calls = 0;

    for index in 0..plan.count {
        let slot = index % PolicyFamily::ALL.len();
        let family = PolicyFamily::ALL[slot];
        let mut ring = BitRing::random_with_family(plan.size, plan.budget, family, rng)?;
        let policy = ring.policy();
        let settings = plan.settings.with_seed(rng.random());

        let mut unlocker = Unlocker::with_settings(Some(&mut ring), settings);
        let unlocked = unlocker.unlock();
        calls += unlocker.trace().device_calls();

        tallies[slot].attempts += 1;
        if unlocked {
            tallies[slot].unlocked += 1;
        } else {
            tracing::debug!(trial = index, %policy, "trial failed");
        }
    }

    Ok(TrialReport {
        families: PolicyFamily::ALL.into_iter().zip(tallies).collect(),
        calls,
    })
}
