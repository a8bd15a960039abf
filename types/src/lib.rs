//! Core domain types for Tumbler.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies:
//! the pattern alphabet, validated disclosure masks, rotation policies and the
//! unlocker's protocol state. Everything here can be used from any layer.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod glyph;
mod mask;
mod protocol;
mod rotation;

pub use glyph::{
    FALSE_GLYPH, HIDDEN_GLYPH, QUERY_GLYPH, TRUE_GLYPH, bit_from_glyph, glyph_for, is_uniform,
    parse_bits,
};
pub use mask::{DisclosureMask, DisclosureMasks, PatternError, check_length};
pub use protocol::ProtocolState;
pub use rotation::{PolicyFamily, RotationPolicy};

/// Ring size used when nothing else is configured.
pub const DEFAULT_SIZE: usize = 4;

/// Disclosure budget used when nothing else is configured.
pub const DEFAULT_BUDGET: usize = 2;
