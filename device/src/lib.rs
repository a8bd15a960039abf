//! Simulated locking device.
//!
//! A [`BitRing`] is a circular register of bits that can be rotated
//! ([`Device::spin`]), partially read ([`Device::peek`]) and partially
//! overwritten at the positions the last peek disclosed ([`Device::poke`]).
//! Solvers talk to it through the [`Device`] trait so that harnesses can wrap
//! or replace the ring.

mod random;
mod ring;

pub use ring::{BitRing, RingError};

use tumbler_types::PatternError;

/// The spin/peek/poke protocol a solver may use.
///
/// Every pattern argument and reply has exactly `size()` characters; any other
/// length fails with [`PatternError::LengthMismatch`].
pub trait Device {
    /// Number of bits in the device. Never changes.
    fn size(&self) -> usize;

    /// Maximum number of positions a single peek discloses or a poke writes.
    fn budget(&self) -> usize;

    /// Rotate the device. Returns true if every bit held the same value
    /// before the rotation, in which case nothing moves.
    fn spin(&mut self) -> bool;

    /// Disclose the bits at the `?` positions of `pattern`.
    ///
    /// `Ok(None)` when the device was not freshly spun.
    fn peek(&mut self, pattern: &str) -> Result<Option<String>, PatternError>;

    /// Write `T`/`F` glyphs at positions disclosed by the preceding peek.
    fn poke(&mut self, pattern: &str) -> Result<(), PatternError>;
}

impl<D: Device + ?Sized> Device for &mut D {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn budget(&self) -> usize {
        (**self).budget()
    }

    fn spin(&mut self) -> bool {
        (**self).spin()
    }

    fn peek(&mut self, pattern: &str) -> Result<Option<String>, PatternError> {
        (**self).peek(pattern)
    }

    fn poke(&mut self, pattern: &str) -> Result<(), PatternError> {
        (**self).poke(pattern)
    }
}
