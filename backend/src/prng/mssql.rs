//! SQL Server `RAND()`: two Lehmer generators combined by subtraction
//! (L'Ecuyer's 1988 combined generator)

use super::lcg::{Bounding, LcgGenerator, LcgParams, LcgSpec, RecoveryStrategy};
use super::{ensure_seed_in_range, Capabilities, EventHandler, Limit, Prng, PrngError};
use crate::recovery::{self, RecoverySearch};

pub(crate) const FIRST_MULTIPLIER: u64 = 40014;
pub(crate) const FIRST_MODULUS: u64 = 2147483563;
pub(crate) const SECOND_MULTIPLIER: u64 = 40692;
pub(crate) const SECOND_MODULUS: u64 = 2147483399;

/// Divisor the engine uses to scale a combined value into `[0, 1)`
pub(crate) const SCALE_DIVISOR: f64 = 2147483589.46728;

const FIRST_FALLBACK: u64 = 12345;
const SECOND_FALLBACK: u64 = 67890;

const fn lehmer(name: &'static str, multiplier: u64, modulus: u64) -> LcgSpec {
    LcgSpec {
        name,
        params: LcgParams {
            multiplier,
            increment: 0,
            modulus,
            discard_divisor: 1,
            output_divisor: 0,
        },
        bounding: Bounding::Modulo,
        seed_scramble: 0,
        minimum_seed: 1,
        maximum_seed: modulus - 1,
        recovery: RecoveryStrategy::Exhaustive,
    }
}

const FIRST: LcgSpec = lehmer("mssql-first", FIRST_MULTIPLIER, FIRST_MODULUS);
const SECOND: LcgSpec = lehmer("mssql-second", SECOND_MULTIPLIER, SECOND_MODULUS);

/// Combine two sub-states into one output
pub(crate) fn combine(first: u64, second: u64) -> u64 {
    let diff = first as i64 - second as i64;
    if diff <= 0 {
        (diff + FIRST_MODULUS as i64 - 1) as u64
    } else {
        diff as u64
    }
}

pub(crate) fn scale(value: u64, limit: u64) -> u64 {
    ((value as u128 * limit as u128) as f64 / SCALE_DIVISOR) as u64
}

/// Sub-states for a seed, without the engine's clamping
fn split(seed: u64) -> (u64, u64) {
    (seed / SECOND_MODULUS, seed % SECOND_MODULUS)
}

/// SQL Server `RAND()`
///
/// A seed packs both sub-states as `first · 2147483399 + second`.
#[derive(Debug, Clone)]
pub struct MssqlRand {
    first: LcgGenerator,
    second: LcgGenerator,
}

impl MssqlRand {
    pub fn new() -> Self {
        let mut generator = Self {
            first: LcgGenerator::from_catalog(FIRST),
            second: LcgGenerator::from_catalog(SECOND),
        };
        generator.set_states(FIRST_FALLBACK, SECOND_FALLBACK);
        generator
    }

    fn set_states(&mut self, first: u64, second: u64) {
        self.first.set_state(first);
        self.second.set_state(second);
    }

    /// Current `(first, second)` sub-states
    pub fn states(&self) -> (u64, u64) {
        (self.first.state(), self.second.state())
    }

    /// Seed the way `RAND(seed)` does for a 32-bit integer argument
    pub fn seed_from_u32(&mut self, seed: u32) {
        let first = match seed as u64 {
            0 => FIRST_FALLBACK,
            s if s >= FIRST_MODULUS => FIRST_FALLBACK,
            s => s,
        };
        self.set_states(first, SECOND_FALLBACK);
    }
}

impl Default for MssqlRand {
    fn default() -> Self {
        Self::new()
    }
}

impl Prng for MssqlRand {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn minimum_seed(&self) -> u64 {
        SECOND_MODULUS + 1
    }

    fn maximum_seed(&self) -> u64 {
        FIRST_MODULUS * SECOND_MODULUS - 1
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_reverse: true,
            can_seek: true,
            can_seek_seed: true,
        }
    }

    /// Out-of-range sub-states fall back to 12345 / 67890 like the engine
    fn seed(&mut self, seed: u64) -> Result<(), PrngError> {
        ensure_seed_in_range(seed, self.minimum_seed(), self.maximum_seed())?;
        let (mut first, mut second) = split(seed);
        if first < 1 || first >= FIRST_MODULUS {
            first = FIRST_FALLBACK;
        }
        if second < 1 {
            second = SECOND_FALLBACK;
        }
        self.set_states(first, second);
        Ok(())
    }

    fn next(&mut self) -> u64 {
        let first = self.first.next();
        let second = self.second.next();
        combine(first, second)
    }

    fn next_bounded(&mut self, limit: Limit) -> u64 {
        scale(self.next(), limit.get())
    }

    fn previous(&mut self) -> Result<u64, PrngError> {
        let first = self.first.previous()?;
        let second = self.second.previous()?;
        Ok(combine(first, second))
    }

    fn previous_bounded(&mut self, limit: Limit) -> Result<u64, PrngError> {
        Ok(scale(self.previous()?, limit.get()))
    }

    fn seek_ahead(&mut self, offset: u64) -> Result<(), PrngError> {
        self.first.seek_ahead(offset)?;
        self.second.seek_ahead(offset)
    }

    fn seek_back(&mut self, offset: u64) -> Result<(), PrngError> {
        self.first.seek_back(offset)?;
        self.second.seek_back(offset)
    }

    fn seek_seed_ahead(&self, seed: u64, offset: u64) -> Result<u64, PrngError> {
        ensure_seed_in_range(seed, self.minimum_seed(), self.maximum_seed())?;
        let (first, second) = split(seed);
        let first = self.first.seek_state(first, offset)?;
        let second = self.second.seek_state(second, offset)?;
        Ok(first * SECOND_MODULUS + second)
    }

    fn seek_seed_back(&self, seed: u64, offset: u64) -> Result<u64, PrngError> {
        ensure_seed_in_range(seed, self.minimum_seed(), self.maximum_seed())?;
        let (first, second) = split(seed);
        let first = self.first.seek_state_back(first, offset)?;
        let second = self.second.seek_state_back(second, offset)?;
        Ok(first * SECOND_MODULUS + second)
    }

    fn recover_seed(&mut self, search: &RecoverySearch, handler: &mut EventHandler<'_>) -> bool {
        recovery::dual_lcg::recover(self, search, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_clamps_zero_second_state() {
        let mut rng = MssqlRand::new();
        rng.seed(5 * SECOND_MODULUS).unwrap();
        assert_eq!(rng.states(), (5, SECOND_FALLBACK));
    }

    #[test]
    fn test_combine_wraps_non_positive() {
        assert_eq!(combine(10, 4), 6);
        assert_eq!(combine(4, 4), FIRST_MODULUS - 1);
        assert_eq!(combine(1, 3), FIRST_MODULUS - 3);
    }

    #[test]
    fn test_seed_from_u32_fallbacks() {
        let mut rng = MssqlRand::new();
        rng.seed_from_u32(0);
        assert_eq!(rng.states(), (FIRST_FALLBACK, SECOND_FALLBACK));
        rng.seed_from_u32(u32::MAX);
        assert_eq!(rng.states(), (FIRST_FALLBACK, SECOND_FALLBACK));
        rng.seed_from_u32(77);
        assert_eq!(rng.states(), (77, SECOND_FALLBACK));
    }
}
