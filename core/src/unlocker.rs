//! Protocol-checked solver for a [`Device`].
//!
//! The unlocker owns its protocol state and validates every step before it
//! touches the device. Illegal steps are logged, recorded in the trace and
//! answered with a neutral value; they never reach the device and never
//! change state.
//!
//! ```text
//! unlock()
//!   spin(1)
//!   phase A: for n in 1..=size, for each mask: peek -> poke(target) -> spin(n)
//!   phase B: for each round, for each mask: peek -> poke(target) -> spin(rand 1..=size)
//! ```
//!
//! Forcing every disclosed bit to one target value only ever moves the ring
//! towards uniformity, so the search can revisit positions freely. Phase A
//! realigns with any fixed schedule (after `size` spins a fixed offset is
//! back where it started); phase B covers schedules the periodic search
//! cannot track.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use tumbler_device::Device;
use tumbler_types::{DisclosureMask, PatternError, ProtocolState, bit_from_glyph};

use crate::budget::SearchBudget;
use crate::settings::UnlockSettings;
use crate::trace::{Operation, TraceLog, TraceRecord};

/// Why a step was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no device to drive")]
    NoDevice,
    #[error("spin count must be at least 1")]
    ZeroSpinCount,
    #[error("{operation} is not allowed in state {state}")]
    OutOfOrder {
        operation: Operation,
        state: ProtocolState,
    },
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("poke needs a preceding peek")]
    NothingPeeked,
    #[error("fill value {0:?} is not a bit glyph")]
    InvalidFill(char),
}

pub struct Unlocker<'d, D: Device + ?Sized> {
    device: Option<&'d mut D>,
    state: ProtocolState,
    /// Mask of the last accepted peek; taken by the next poke.
    peeked: Option<DisclosureMask>,
    trace: TraceLog,
    settings: UnlockSettings,
    rng: StdRng,
}

impl<'d, D: Device + ?Sized> Unlocker<'d, D> {
    #[must_use]
    pub fn new(device: Option<&'d mut D>) -> Self {
        Self::with_settings(device, UnlockSettings::default())
    }

    #[must_use]
    pub fn with_settings(device: Option<&'d mut D>, settings: UnlockSettings) -> Self {
        let rng = settings
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            device,
            state: ProtocolState::NotCreated,
            peeked: None,
            trace: TraceLog::new(),
            settings,
            rng,
        }
    }

    #[must_use]
    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Mask stored by the last accepted peek, until a poke or spin consumes it.
    #[must_use]
    pub fn peeked_pattern(&self) -> Option<&DisclosureMask> {
        self.peeked.as_ref()
    }

    #[must_use]
    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    #[must_use]
    pub fn show_trace(&self) -> String {
        self.trace.render()
    }

    /// Bound on device calls for the attached device; `None` without one.
    #[must_use]
    pub fn search_budget(&self) -> Option<SearchBudget> {
        self.device.as_deref().map(|device| {
            SearchBudget::new(device.size(), device.budget(), self.settings.phase_b_rounds)
        })
    }

    /// Start a fresh session: empty trace, state `Created`.
    pub fn reset(&mut self) {
        self.trace.clear();
        self.state = ProtocolState::Created;
        self.peeked = None;
    }

    /// Drive the device towards a uniform state.
    ///
    /// Always halts after at most [`SearchBudget::max_calls`] device calls.
    /// Returns true if a spin reported the device uniform.
    pub fn unlock(&mut self) -> bool {
        let Some((size, budget)) = self
            .device
            .as_deref()
            .map(|device| (device.size(), device.budget()))
        else {
            tracing::info!("unlock called without a device");
            return false;
        };

        self.reset();
        if self.spin(1) {
            tracing::info!(calls = self.trace.device_calls(), "device unlocked by initial spin");
            return true;
        }

        let max_count = u32::try_from(size).unwrap_or(u32::MAX).max(1);

        for count in 1..=max_count {
            for mask in DisclosureMask::iter(size, budget) {
                if self.probe(&mask, count) {
                    tracing::info!(
                        calls = self.trace.device_calls(),
                        count,
                        "device unlocked in periodic search"
                    );
                    return true;
                }
            }
        }

        for round in 0..self.settings.phase_b_rounds {
            for mask in DisclosureMask::iter(size, budget) {
                let count = self.rng.random_range(1..=max_count);
                if self.probe(&mask, count) {
                    tracing::info!(
                        calls = self.trace.device_calls(),
                        round,
                        "device unlocked in randomized search"
                    );
                    return true;
                }
            }
        }

        tracing::info!(
            calls = self.trace.device_calls(),
            size,
            budget,
            "search exhausted without unlocking"
        );
        false
    }

    /// Peek at `mask`, force the disclosed bits to the target, spin `count` times.
    fn probe(&mut self, mask: &DisclosureMask, count: u32) -> bool {
        self.peek(&mask.to_string());
        self.poke(self.settings.target_glyph());
        self.spin(count)
    }

    /// Spin the device up to `count` times, stopping at the first uniform
    /// report. Returns false if the spin was rejected.
    pub fn spin(&mut self, count: u32) -> bool {
        if let Err(rejection) = self.check_spin(count) {
            self.reject(Operation::Spin, None, &rejection);
            return false;
        }
        let Some(device) = self.device.as_deref_mut() else {
            return false;
        };

        let mut uniform = false;
        for _ in 0..count {
            uniform = device.spin();
            self.trace.append(TraceRecord::Spin { uniform });
            if uniform {
                break;
            }
        }

        self.state = ProtocolState::Spun;
        self.peeked = None;
        uniform
    }

    /// Peek with a request that discloses exactly the device's budget.
    ///
    /// Returns the device's reply, or `pattern` unchanged if the peek was
    /// rejected or ignored.
    pub fn peek(&mut self, pattern: &str) -> String {
        let mask = match self.check_peek(pattern) {
            Ok(mask) => mask,
            Err(rejection) => {
                self.reject(Operation::Peek, Some(pattern), &rejection);
                return pattern.to_string();
            }
        };
        let Some(device) = self.device.as_deref_mut() else {
            return pattern.to_string();
        };

        let request = mask.to_string();
        match device.peek(&request) {
            Ok(Some(reply)) => {
                self.trace.append(TraceRecord::Peek {
                    request,
                    reply: Some(reply.clone()),
                });
                self.peeked = Some(mask);
                self.state = ProtocolState::Peeked;
                reply
            }
            Ok(None) => {
                tracing::warn!(%request, state = %self.state, "device ignored peek");
                self.trace.append(TraceRecord::Peek {
                    request,
                    reply: None,
                });
                pattern.to_string()
            }
            Err(err) => {
                tracing::warn!(%request, %err, "device refused peek");
                self.trace.append(TraceRecord::Peek {
                    request,
                    reply: None,
                });
                pattern.to_string()
            }
        }
    }

    /// Write `fill` (`T` or `F`) at every position the last peek disclosed.
    pub fn poke(&mut self, fill: char) {
        let bit = match self.check_poke(fill) {
            Ok(bit) => bit,
            Err(rejection) => {
                self.reject(Operation::Poke, Some(&fill.to_string()), &rejection);
                return;
            }
        };
        let (Some(device), Some(mask)) = (self.device.as_deref_mut(), self.peeked.take()) else {
            return;
        };

        let pattern = mask.fill(bit);
        let result = device.poke(&pattern);
        self.trace.append(TraceRecord::Poke {
            pattern: pattern.clone(),
        });
        match result {
            Ok(()) => self.state = ProtocolState::Poked,
            Err(err) => {
                tracing::warn!(%pattern, %err, "device refused poke");
                self.peeked = Some(mask);
            }
        }
    }

    fn check_spin(&self, count: u32) -> Result<(), Rejection> {
        if self.device.is_none() {
            return Err(Rejection::NoDevice);
        }
        if count == 0 {
            return Err(Rejection::ZeroSpinCount);
        }
        self.check_order(Operation::Spin, self.state.can_spin())
    }

    fn check_peek(&self, pattern: &str) -> Result<DisclosureMask, Rejection> {
        let Some(device) = self.device.as_deref() else {
            return Err(Rejection::NoDevice);
        };
        self.check_order(Operation::Peek, self.state.can_peek())?;
        Ok(DisclosureMask::parse(
            pattern,
            device.size(),
            device.budget(),
        )?)
    }

    fn check_poke(&self, fill: char) -> Result<bool, Rejection> {
        if self.device.is_none() {
            return Err(Rejection::NoDevice);
        }
        self.check_order(Operation::Poke, self.state.can_poke())?;
        if self.peeked.is_none() {
            return Err(Rejection::NothingPeeked);
        }
        bit_from_glyph(fill).ok_or(Rejection::InvalidFill(fill))
    }

    fn check_order(&self, operation: Operation, allowed: bool) -> Result<(), Rejection> {
        if allowed {
            Ok(())
        } else {
            Err(Rejection::OutOfOrder {
                operation,
                state: self.state,
            })
        }
    }

    fn reject(&mut self, operation: Operation, pattern: Option<&str>, rejection: &Rejection) {
        tracing::warn!(
            %operation,
            state = %self.state,
            pattern,
            %rejection,
            "protocol violation"
        );
        self.trace.append(TraceRecord::Rejected {
            operation,
            pattern: pattern.map(str::to_string),
            state: self.state,
            reason: rejection.to_string(),
        });
    }
}

/// One-shot unlock with default settings. `None` returns false immediately.
pub fn unlock<D: Device + ?Sized>(device: Option<&mut D>) -> bool {
    Unlocker::new(device).unlock()
}
