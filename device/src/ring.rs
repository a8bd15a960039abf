//! Circular bit storage with spin/peek/poke.
//!
//! Bits live in a fixed vector; rotation only moves `head`. Logical position
//! `i` (the index callers see in patterns) maps to `bits[(head + i) % size]`.

use std::fmt;
use std::mem;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use tumbler_types::{
    HIDDEN_GLYPH, PatternError, QUERY_GLYPH, RotationPolicy, bit_from_glyph, check_length,
    glyph_for, is_uniform,
};

use crate::Device;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    #[error("a ring needs at least one bit")]
    Empty,
    #[error("disclosure budget {budget} exceeds ring size {size}")]
    BudgetExceedsSize { budget: usize, size: usize },
}

/// The ring's own view of the protocol, independent of any caller.
///
/// Every spin re-arms peek; a peek arms poke; a poke disarms both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Spun,
    Peeked,
    Poked,
}

#[derive(Debug, Clone)]
pub struct BitRing {
    bits: Vec<bool>,
    head: usize,
    budget: usize,
    policy: RotationPolicy,
    /// Non-short-circuited spins so far; the `k` fed to the policy.
    spins: u64,
    phase: Phase,
    /// Logical positions disclosed by the last peek, consumed by the next poke.
    disclosed: Vec<usize>,
    rng: StdRng,
}

impl BitRing {
    /// Ring whose random policy (if any) draws from OS entropy.
    pub fn new(
        initial_bits: impl Into<Vec<bool>>,
        budget: usize,
        policy: RotationPolicy,
    ) -> Result<Self, RingError> {
        Self::with_rng(initial_bits.into(), budget, policy, StdRng::from_os_rng())
    }

    /// Ring with a reproducible generator for the random policy.
    pub fn with_seed(
        initial_bits: impl Into<Vec<bool>>,
        budget: usize,
        policy: RotationPolicy,
        seed: u64,
    ) -> Result<Self, RingError> {
        Self::with_rng(
            initial_bits.into(),
            budget,
            policy,
            StdRng::seed_from_u64(seed),
        )
    }

    pub(crate) fn with_rng(
        bits: Vec<bool>,
        budget: usize,
        policy: RotationPolicy,
        rng: StdRng,
    ) -> Result<Self, RingError> {
        if bits.is_empty() {
            return Err(RingError::Empty);
        }
        if budget > bits.len() {
            return Err(RingError::BudgetExceedsSize {
                budget,
                size: bits.len(),
            });
        }
        Ok(Self {
            bits,
            head: 0,
            budget,
            policy,
            spins: 0,
            phase: Phase::Idle,
            disclosed: Vec::with_capacity(budget),
            rng,
        })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn budget(&self) -> usize {
        self.budget
    }

    #[must_use]
    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    #[must_use]
    pub fn spins(&self) -> u64 {
        self.spins
    }

    #[must_use]
    pub fn head(&self) -> usize {
        self.head
    }

    /// All bits in logical order, starting at the head.
    ///
    /// Bypasses the disclosure budget; meant for harnesses and tests.
    #[must_use]
    pub fn bits(&self) -> Vec<bool> {
        (0..self.size()).map(|index| self.bit_at(index)).collect()
    }

    /// `bits()` formatted as `[T, T, F, T]`.
    #[must_use]
    pub fn render_bits(&self) -> String {
        let glyphs: Vec<String> = self
            .bits()
            .into_iter()
            .map(|bit| glyph_for(bit).to_string())
            .collect();
        format!("[{}]", glyphs.join(", "))
    }

    #[must_use]
    pub fn is_uniform(&self) -> bool {
        is_uniform(&self.bits)
    }

    pub fn spin(&mut self) -> bool {
        self.phase = Phase::Spun;
        self.disclosed.clear();

        if self.is_uniform() {
            tracing::debug!(spins = self.spins, "spin found uniform ring");
            return true;
        }

        self.spins += 1;
        let size = self.size();
        let offset = match self.policy.offset(self.spins, size) {
            Some(offset) => offset,
            None => self.rng.random_range(0..size),
        };
        self.head = (self.head + offset) % size;
        tracing::debug!(spins = self.spins, offset, head = self.head, "spin");
        false
    }

    pub fn peek(&mut self, pattern: &str) -> Result<Option<String>, PatternError> {
        check_length(pattern, self.size())?;
        if self.phase != Phase::Spun {
            tracing::debug!(phase = ?self.phase, "peek ignored outside spun phase");
            return Ok(None);
        }

        let mut disclosed = Vec::with_capacity(self.budget);
        let reply = pattern
            .chars()
            .enumerate()
            .map(|(index, glyph)| {
                if glyph == QUERY_GLYPH && disclosed.len() < self.budget {
                    disclosed.push(index);
                    glyph_for(self.bit_at(index))
                } else {
                    HIDDEN_GLYPH
                }
            })
            .collect();

        self.disclosed = disclosed;
        self.phase = Phase::Peeked;
        Ok(Some(reply))
    }

    pub fn poke(&mut self, pattern: &str) -> Result<(), PatternError> {
        check_length(pattern, self.size())?;
        if self.phase != Phase::Peeked {
            tracing::debug!(phase = ?self.phase, "poke ignored outside peeked phase");
            return Ok(());
        }

        let disclosed = mem::take(&mut self.disclosed);
        let mut written = 0;
        for (index, glyph) in pattern.chars().enumerate() {
            if written == self.budget {
                break;
            }
            if !disclosed.contains(&index) {
                continue;
            }
            if let Some(bit) = bit_from_glyph(glyph) {
                self.set_bit(index, bit);
                written += 1;
            }
        }

        self.phase = Phase::Poked;
        tracing::debug!(written, "poke");
        Ok(())
    }

    fn slot(&self, index: usize) -> usize {
        (self.head + index) % self.size()
    }

    fn bit_at(&self, index: usize) -> bool {
        self.bits[self.slot(index)]
    }

    fn set_bit(&mut self, index: usize, bit: bool) {
        let slot = self.slot(index);
        self.bits[slot] = bit;
    }
}

impl Device for BitRing {
    fn size(&self) -> usize {
        BitRing::size(self)
    }

    fn budget(&self) -> usize {
        BitRing::budget(self)
    }

    fn spin(&mut self) -> bool {
        BitRing::spin(self)
    }

    fn peek(&mut self, pattern: &str) -> Result<Option<String>, PatternError> {
        BitRing::peek(self, pattern)
    }

    fn poke(&mut self, pattern: &str) -> Result<(), PatternError> {
        BitRing::poke(self, pattern)
    }
}

/// Reveals the shape of the ring, never its bits.
impl fmt::Display for BitRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitRing[size: {}, budget: {}]", self.size(), self.budget)
    }
}
