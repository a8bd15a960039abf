//! Rotation policies: how far a ring turns on each spin.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rule that maps the 1-based spin index `k` to a head offset in `[0, size)`.
///
/// ```toml
/// policy = { kind = "polynomial", step = 1, multiplier = 3 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RotationPolicy {
    /// `step mod size` on every spin.
    Fixed { step: u64 },
    /// `(step + multiplier * k) mod size`.
    Polynomial { step: u64, multiplier: u64 },
    /// Uniform draw from `[0, size)`, independent of `k` and of history.
    Random,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::Fixed { step: 1 }
    }
}

impl RotationPolicy {
    /// Offset for spin `k` on a ring of `size` bits.
    ///
    /// `None` for `Random`, whose offset comes from the ring's generator.
    /// Also `None` for an empty ring.
    #[must_use]
    pub fn offset(self, spin: u64, size: usize) -> Option<usize> {
        if size == 0 {
            return None;
        }
        let modulus = size as u128;
        let raw = match self {
            Self::Fixed { step } => u128::from(step) % modulus,
            Self::Polynomial { step, multiplier } => {
                (u128::from(step) + u128::from(multiplier) * u128::from(spin)) % modulus
            }
            Self::Random => return None,
        };
        Some(raw as usize)
    }

    #[must_use]
    pub const fn family(self) -> PolicyFamily {
        match self {
            Self::Fixed { .. } => PolicyFamily::Fixed,
            Self::Polynomial { .. } => PolicyFamily::Polynomial,
            Self::Random => PolicyFamily::Random,
        }
    }
}

/// The kind of a [`RotationPolicy`], without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyFamily {
    Fixed,
    Polynomial,
    Random,
}

impl PolicyFamily {
    pub const ALL: [Self; 3] = [Self::Fixed, Self::Polynomial, Self::Random];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Polynomial => "polynomial",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for PolicyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { step } => write!(f, "{}(step={step})", self.family()),
            Self::Polynomial { step, multiplier } => {
                write!(f, "{}(step={step}, multiplier={multiplier})", self.family())
            }
            Self::Random => write!(f, "{}", self.family()),
        }
    }
}
