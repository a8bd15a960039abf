//! Core solver logic for Tumbler.
//!
//! This crate drives a [`tumbler_device::Device`] through the spin/peek/poke
//! protocol: the [`Unlocker`] state machine and its bounded search, the
//! [`TraceLog`] it writes, and the [`SearchBudget`] that bounds it.

mod budget;
mod settings;
pub mod trace;
mod unlocker;

pub use budget::SearchBudget;
pub use settings::{DEFAULT_PHASE_B_ROUNDS, UnlockSettings};
pub use trace::{Operation, TraceLog, TraceRecord};
pub use unlocker::{Rejection, Unlocker, unlock};
