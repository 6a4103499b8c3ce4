//! V8 `Math.random()` before 4.9: two 16-bit multiply-with-carry generators
//!
//! Each half updates as `s' = a·(s & 0xFFFF) + (s >> 16)`. The map is not
//! injective on arbitrary 32-bit words, so reversal picks one canonical
//! predecessor: the one with the largest low half.

use super::{ensure_seed_in_range, Capabilities, EventHandler, Limit, Prng, PrngError};
use crate::recovery::{self, RecoverySearch};
use serde::{Deserialize, Serialize};

pub(crate) const FIRST_MULTIPLIER: u32 = 18273;
pub(crate) const SECOND_MULTIPLIER: u32 = 36969;

/// One multiply-with-carry step
pub(crate) fn mwc_step(state: u32, multiplier: u32) -> u32 {
    multiplier * (state & 0xFFFF) + (state >> 16)
}

/// Largest state a step can produce
pub(crate) fn mwc_max(multiplier: u32) -> u32 {
    multiplier * 0xFFFF + 0xFFFF
}

/// Output word for post-step sub-states
pub(crate) fn combine(first: u32, second: u32) -> u32 {
    (first << 14).wrapping_add(second & 0x3FFFF)
}

fn canonical_predecessor(state: u32, multiplier: u32) -> Option<u32> {
    let low = (state / multiplier).min(0xFFFF);
    let high = state - multiplier * low;
    (high <= 0xFFFF).then_some((high << 16) | low)
}

/// V8 dual MWC generator
///
/// # Example
/// ```
/// use seedsleuth_core::prng::{Prng, V8Random};
///
/// let mut rng = V8Random::new();
/// rng.seed(0x1234_5678_9ABC_DEF0).unwrap();
/// let value = rng.next();
/// rng.previous().unwrap();
/// assert_eq!(rng.next(), value);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct V8Random {
    first: u32,
    second: u32,
}

impl V8Random {
    pub fn new() -> Self {
        Self {
            first: 1,
            second: 1,
        }
    }

    pub fn states(&self) -> (u32, u32) {
        (self.first, self.second)
    }
}

impl Default for V8Random {
    fn default() -> Self {
        Self::new()
    }
}

impl Prng for V8Random {
    fn name(&self) -> &'static str {
        "v8"
    }

    fn minimum_seed(&self) -> u64 {
        0x1_0000_0001
    }

    fn maximum_seed(&self) -> u64 {
        u64::MAX
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_reverse: true,
            can_seek: false,
            can_seek_seed: false,
        }
    }

    fn seed(&mut self, seed: u64) -> Result<(), PrngError> {
        ensure_seed_in_range(seed, self.minimum_seed(), self.maximum_seed())?;
        self.first = (seed >> 32) as u32;
        self.second = seed as u32;
        Ok(())
    }

    fn next(&mut self) -> u64 {
        self.first = mwc_step(self.first, FIRST_MULTIPLIER);
        self.second = mwc_step(self.second, SECOND_MULTIPLIER);
        combine(self.first, self.second) as u64
    }

    fn next_bounded(&mut self, limit: Limit) -> u64 {
        ((self.next() as u128 * limit.get() as u128) >> 32) as u64
    }

    /// Best-effort: `next()` after `previous()` restores the state, but a
    /// state with several predecessors is walked back to the canonical one
    fn previous(&mut self) -> Result<u64, PrngError> {
        let value = combine(self.first, self.second) as u64;
        let first = canonical_predecessor(self.first, FIRST_MULTIPLIER);
        let second = canonical_predecessor(self.second, SECOND_MULTIPLIER);
        match (first, second) {
            (Some(first), Some(second)) => {
                self.first = first;
                self.second = second;
                Ok(value)
            }
            _ => Err(PrngError::InvalidArgument(format!(
                "state ({:#x}, {:#x}) has no predecessor",
                self.first, self.second
            ))),
        }
    }

    fn previous_bounded(&mut self, limit: Limit) -> Result<u64, PrngError> {
        Ok(((self.previous()? as u128 * limit.get() as u128) >> 32) as u64)
    }

    fn recover_seed(&mut self, search: &RecoverySearch, handler: &mut EventHandler<'_>) -> bool {
        recovery::mwc::recover(self, search, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_predecessor_steps_forward_to_state() {
        for state in [0u32, 1, 18272, 18273, 0xFFFF, 1_000_000, mwc_max(FIRST_MULTIPLIER)] {
            let prev = canonical_predecessor(state, FIRST_MULTIPLIER).unwrap();
            assert_eq!(mwc_step(prev, FIRST_MULTIPLIER), state);
        }
    }

    #[test]
    fn test_unreachable_state_has_no_predecessor() {
        assert_eq!(
            canonical_predecessor(mwc_max(FIRST_MULTIPLIER) + 1, FIRST_MULTIPLIER),
            None
        );
        let mut rng = V8Random::new();
        rng.seed(u64::MAX).unwrap();
        assert!(matches!(rng.previous(), Err(PrngError::InvalidArgument(_))));
    }
}
