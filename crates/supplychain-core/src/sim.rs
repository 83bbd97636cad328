//! Simulation state, run status and the determinism hash.

use crate::fixed::Ticks;
use crate::query::TickStats;

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable clock tracked by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Current tick. Incremented by 1 at the end of each step.
    pub tick: Ticks,
}

impl SimState {
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

/// The engine has exactly two states; `Finished` is terminal until reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SimStatus {
    Running,
    Finished,
}

// ---------------------------------------------------------------------------
// Step outcome
// ---------------------------------------------------------------------------

/// Result of `Engine::step`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The tick ran; carries the observation recorded for it.
    Stepped(TickStats),
    /// The horizon was already reached. Nothing changed.
    Finished { tick: Ticks },
}

impl StepOutcome {
    pub fn stats(&self) -> Option<&TickStats> {
        match self {
            StepOutcome::Stepped(stats) => Some(stats),
            StepOutcome::Finished { .. } => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, StepOutcome::Finished { .. })
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of simulation state for replay checks.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
