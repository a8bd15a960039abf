use tumbler_types::glyph_for;

/// Phase B rounds when nothing else is configured.
pub const DEFAULT_PHASE_B_ROUNDS: u32 = 4;

/// Tuning for an [`Unlocker`](crate::Unlocker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockSettings {
    /// Value every disclosed bit is forced to.
    pub target: bool,
    /// Rounds of the randomized fallback after the periodic search.
    pub phase_b_rounds: u32,
    /// Seed for the fallback's spin counts; OS entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for UnlockSettings {
    fn default() -> Self {
        Self {
            target: true,
            phase_b_rounds: DEFAULT_PHASE_B_ROUNDS,
            seed: None,
        }
    }
}

impl UnlockSettings {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn target_glyph(&self) -> char {
        glyph_for(self.target)
    }
}
