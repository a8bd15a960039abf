//! Unlocker protocol state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the unlocker stands in the spin/peek/poke protocol.
///
/// ```text
/// NotCreated -> Created -> Spun -> Peeked -> Poked -> Spun -> ...
/// ```
///
/// Spin is legal from every state except `NotCreated`; peek only from
/// `Spun`; poke only from `Peeked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolState {
    #[default]
    NotCreated,
    Created,
    Spun,
    Peeked,
    Poked,
}

impl ProtocolState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotCreated => "NOT CREATED",
            Self::Created => "CREATED",
            Self::Spun => "SPUN",
            Self::Peeked => "PEEKED",
            Self::Poked => "POKED",
        }
    }

    #[must_use]
    pub const fn can_spin(self) -> bool {
        !matches!(self, Self::NotCreated)
    }

    #[must_use]
    pub const fn can_peek(self) -> bool {
        matches!(self, Self::Spun)
    }

    #[must_use]
    pub const fn can_poke(self) -> bool {
        matches!(self, Self::Peeked)
    }
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
