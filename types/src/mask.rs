//! Disclosure masks: validated peek requests.
//!
//! A `DisclosureMask` is a request pattern whose length equals the ring size
//! and which discloses exactly the ring's budget of positions. Invalid masks
//! are unrepresentable; the only way in is `parse` or `iter`.

use std::fmt;
use std::iter::FusedIterator;

use thiserror::Error;

use crate::glyph::{HIDDEN_GLYPH, QUERY_GLYPH, glyph_for};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern must be exactly {expected} characters long, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("pattern must disclose exactly {expected} positions, got {actual}")]
    WrongDisclosureCount { expected: usize, actual: usize },
    #[error("pattern has invalid character {glyph:?} at position {index}")]
    InvalidGlyph { index: usize, glyph: char },
}

/// Length in characters, the unit every pattern is measured in.
#[must_use]
fn pattern_len(pattern: &str) -> usize {
    pattern.chars().count()
}

pub fn check_length(pattern: &str, expected: usize) -> Result<(), PatternError> {
    let actual = pattern_len(pattern);
    if actual == expected {
        Ok(())
    } else {
        Err(PatternError::LengthMismatch { expected, actual })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisclosureMask {
    size: usize,
    /// Disclosed indices, strictly increasing.
    positions: Vec<usize>,
}

impl DisclosureMask {
    /// Validate a request pattern against a ring of `size` bits and `budget`
    /// disclosures.
    pub fn parse(pattern: &str, size: usize, budget: usize) -> Result<Self, PatternError> {
        check_length(pattern, size)?;

        let mut positions = Vec::with_capacity(budget);
        for (index, glyph) in pattern.chars().enumerate() {
            match glyph {
                QUERY_GLYPH => positions.push(index),
                HIDDEN_GLYPH => {}
                _ => return Err(PatternError::InvalidGlyph { index, glyph }),
            }
        }

        if positions.len() != budget {
            return Err(PatternError::WrongDisclosureCount {
                expected: budget,
                actual: positions.len(),
            });
        }
        Ok(Self { size, positions })
    }

    /// Every mask of `size` positions with exactly `budget` disclosures,
    /// generated lazily.
    ///
    /// Ordered lexicographically by disclosed index set, so for four bits and
    /// two disclosures: `??--`, `?-?-`, `?--?`, `-??-`, `-?-?`, `--??`.
    #[must_use]
    pub fn iter(size: usize, budget: usize) -> DisclosureMasks {
        DisclosureMasks {
            size,
            positions: (budget <= size).then(|| (0..budget).collect()),
        }
    }

    /// Number of masks `iter` yields (the binomial coefficient), saturating.
    #[must_use]
    pub fn count(size: usize, budget: usize) -> usize {
        if budget > size {
            return 0;
        }
        let k = budget.min(size - budget);
        let mut acc: usize = 1;
        for i in 0..k {
            acc = acc.saturating_mul(size - i) / (i + 1);
        }
        acc
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.positions.binary_search(&index).is_ok()
    }

    /// The poke pattern that writes `bit` at every disclosed position.
    #[must_use]
    pub fn fill(&self, bit: bool) -> String {
        self.render_with(glyph_for(bit))
    }

    fn render_with(&self, disclosed: char) -> String {
        (0..self.size)
            .map(|index| {
                if self.contains(index) {
                    disclosed
                } else {
                    HIDDEN_GLYPH
                }
            })
            .collect()
    }
}

/// Iterator returned by [`DisclosureMask::iter`].
///
/// Holds only the next index set, so arbitrarily large rings cost
/// `O(budget)` memory.
#[derive(Debug, Clone)]
pub struct DisclosureMasks {
    size: usize,
    /// `None` once every combination has been yielded.
    positions: Option<Vec<usize>>,
}

impl Iterator for DisclosureMasks {
    type Item = DisclosureMask;

    fn next(&mut self) -> Option<DisclosureMask> {
        let size = self.size;
        let positions = self.positions.as_mut()?;
        let mask = DisclosureMask {
            size,
            positions: positions.clone(),
        };

        // Advance the rightmost slot that still has room, then pack the
        // slots after it directly behind it.
        let budget = positions.len();
        match (0..budget)
            .rev()
            .find(|&slot| positions[slot] < size - budget + slot)
        {
            Some(slot) => {
                positions[slot] += 1;
                for next in slot + 1..budget {
                    positions[next] = positions[next - 1] + 1;
                }
            }
            None => self.positions = None,
        }
        Some(mask)
    }
}

impl FusedIterator for DisclosureMasks {}

impl fmt::Display for DisclosureMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_with(QUERY_GLYPH))
    }
}
