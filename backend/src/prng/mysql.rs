//! MySQL `RAND()`: a two-word recurrence that cannot be run backwards
//! (the update matrix has determinant 3, which shares a factor with the
//! modulus)

use super::{ensure_seed_in_range, Capabilities, Limit, Prng, PrngError};
use serde::{Deserialize, Serialize};

const MAX_VALUE: u64 = 0x3FFF_FFFF;

/// MySQL `RAND()`
///
/// A seed packs both words as `seed1 · 0x3FFFFFFF + seed2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MysqlRand {
    seed1: u64,
    seed2: u64,
}

impl MysqlRand {
    pub fn new() -> Self {
        Self { seed1: 0, seed2: 0 }
    }

    /// Seed the way `RAND(N)` does for an integer argument
    pub fn seed_from_u32(&mut self, seed: u32) {
        let seed = seed as u64;
        self.seed1 = (seed * 0x10001 + 55555555) as u32 as u64 % MAX_VALUE;
        self.seed2 = (seed * 0x10000001) as u32 as u64 % MAX_VALUE;
    }

    pub fn states(&self) -> (u64, u64) {
        (self.seed1, self.seed2)
    }
}

impl Default for MysqlRand {
    fn default() -> Self {
        Self::new()
    }
}

impl Prng for MysqlRand {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn minimum_seed(&self) -> u64 {
        0
    }

    fn maximum_seed(&self) -> u64 {
        MAX_VALUE / 3 * MAX_VALUE - 1
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FORWARD_ONLY
    }

    fn seed(&mut self, seed: u64) -> Result<(), PrngError> {
        ensure_seed_in_range(seed, self.minimum_seed(), self.maximum_seed())?;
        self.seed1 = seed / MAX_VALUE;
        self.seed2 = seed % MAX_VALUE;
        Ok(())
    }

    fn next(&mut self) -> u64 {
        self.seed1 = (self.seed1 * 3 + self.seed2) % MAX_VALUE;
        self.seed2 = (self.seed1 + self.seed2 + 33) % MAX_VALUE;
        self.seed1
    }

    fn next_bounded(&mut self, limit: Limit) -> u64 {
        (self.next() as u128 * limit.get() as u128 / MAX_VALUE as u128) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prng::Operation;

    #[test]
    fn test_recurrence() {
        let mut rng = MysqlRand::new();
        rng.seed(MAX_VALUE * 2 + 5).unwrap();
        assert_eq!(rng.next(), 11);
        assert_eq!(rng.states(), (11, 49));
    }

    #[test]
    fn test_cannot_reverse() {
        let mut rng = MysqlRand::new();
        assert_eq!(
            rng.previous(),
            Err(PrngError::UnsupportedOperation {
                generator: "mysql",
                operation: Operation::Previous,
            })
        );
        assert!(rng.seek_ahead(10).is_err());
    }
}
