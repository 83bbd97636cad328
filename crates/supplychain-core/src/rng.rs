//! Deterministic PRNG for customer demand sampling.
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, and trivially
//! rewindable by re-seeding. The engine owns its generator; there is no
//! process-wide random state.

/// SplitMix64 pseudo-random number generator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the wall clock. Returns the generator and the seed used, so
    /// the caller can log it and replay the run later.
    pub fn from_entropy() -> (Self, u64) {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        // Mix once so consecutive clock readings don't yield adjacent seeds.
        let seed = Self::new(nanos).next_u64();
        (Self::new(seed), seed)
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform integer in `0..=max`.
    ///
    /// Rejection sampling keeps the distribution unbiased for any `max`.
    pub fn below_inclusive(&mut self, max: u32) -> u32 {
        let span = max as u64 + 1;
        // Largest multiple of `span` that fits in u64; draws at or above it
        // would skew the low residues.
        let zone = u64::MAX - (u64::MAX % span);
        loop {
            let r = self.next_u64();
            if r < zone {
                return (r % span) as u32;
            }
        }
    }

    /// Get the internal state (for hashing).
    pub fn state(&self) -> u64 {
        self.state
    }
}
