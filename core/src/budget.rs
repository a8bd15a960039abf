//! Closed-form bound on the device calls an unlock attempt may make.

use tumbler_types::DisclosureMask;

/// Upper bound on device calls for one `unlock`, a function of ring size,
/// disclosure budget and the number of randomized rounds only.
///
/// Every probe is one peek, one poke and up to `count` spins:
///
/// ```text
/// phase A = patterns * sum(2 + n for n in 1..=size)
/// phase B = rounds * patterns * (2 + size)
/// total   = 1 + phase A + phase B
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    size: usize,
    patterns: usize,
    phase_b_rounds: u32,
}

impl SearchBudget {
    #[must_use]
    pub fn new(size: usize, budget: usize, phase_b_rounds: u32) -> Self {
        Self {
            size,
            patterns: DisclosureMask::count(size, budget),
            phase_b_rounds,
        }
    }

    #[must_use]
    pub const fn patterns(self) -> usize {
        self.patterns
    }

    #[must_use]
    pub const fn phase_b_rounds(self) -> u32 {
        self.phase_b_rounds
    }

    #[must_use]
    pub fn phase_a_calls(self) -> usize {
        let spins = self.size.saturating_mul(self.size.saturating_add(1)) / 2;
        let per_pattern = self.size.saturating_mul(2).saturating_add(spins);
        self.patterns.saturating_mul(per_pattern)
    }

    #[must_use]
    pub fn phase_b_calls(self) -> usize {
        let rounds = usize::try_from(self.phase_b_rounds).unwrap_or(usize::MAX);
        rounds
            .saturating_mul(self.patterns)
            .saturating_mul(self.size.saturating_add(2))
    }

    #[must_use]
    pub fn max_calls(self) -> usize {
        1usize
            .saturating_add(self.phase_a_calls())
            .saturating_add(self.phase_b_calls())
    }
}
