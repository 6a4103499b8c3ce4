//! PureBasic `Random()`: RANROT type B over two 17-word buffers

use super::{ensure_seed_in_range, Capabilities, Limit, Prng, PrngError};

const KK: usize = 17;
const JJ: usize = 10;
const ROTATE_FIRST: u32 = 13;
const ROTATE_SECOND: u32 = 5;
const FILL_MULTIPLIER: u32 = 2891336453;
const DISCARDED_OUTPUTS: usize = 31;

/// RANROT-B generator as shipped with PureBasic
#[derive(Debug, Clone)]
pub struct PureBasicRandom {
    first: [u32; KK],
    second: [u32; KK],
    p1: usize,
    p2: usize,
}

impl PureBasicRandom {
    pub fn new() -> Self {
        let mut generator = Self {
            first: [0; KK],
            second: [0; KK],
            p1: 0,
            p2: JJ,
        };
        generator.reseed(0);
        generator
    }

    fn reseed(&mut self, seed: u32) {
        let mut s = seed;
        for i in 0..KK {
            s = s.wrapping_mul(FILL_MULTIPLIER).wrapping_add(1);
            self.first[i] = s;
            s = s.wrapping_mul(FILL_MULTIPLIER).wrapping_add(1);
            self.second[i] = s;
        }
        self.p1 = 0;
        self.p2 = JJ;
        for _ in 0..DISCARDED_OUTPUTS {
            self.step();
        }
    }

    fn step(&mut self) -> u32 {
        let x1 = self.first[self.p1]
            .rotate_right(ROTATE_FIRST)
            .wrapping_add(self.first[self.p2]);
        let x2 = self.second[self.p1]
            .rotate_right(ROTATE_SECOND)
            .wrapping_add(self.second[self.p2]);
        self.first[self.p1] = x2;
        self.second[self.p1] = x1;
        self.p1 = (self.p1 + KK - 1) % KK;
        self.p2 = (self.p2 + KK - 1) % KK;
        x1
    }

    fn unstep(&mut self) -> u32 {
        self.p1 = (self.p1 + 1) % KK;
        self.p2 = (self.p2 + 1) % KK;
        let x1 = self.second[self.p1];
        let x2 = self.first[self.p1];
        self.first[self.p1] = x1
            .wrapping_sub(self.first[self.p2])
            .rotate_left(ROTATE_FIRST);
        self.second[self.p1] = x2
            .wrapping_sub(self.second[self.p2])
            .rotate_left(ROTATE_SECOND);
        x1
    }
}

impl Default for PureBasicRandom {
    fn default() -> Self {
        Self::new()
    }
}

fn scale(value: u32, limit: u64) -> u64 {
    ((value as u128 * limit as u128) >> 32) as u64
}

impl Prng for PureBasicRandom {
    fn name(&self) -> &'static str {
        "purebasic"
    }

    fn minimum_seed(&self) -> u64 {
        0
    }

    fn maximum_seed(&self) -> u64 {
        u32::MAX as u64
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
        self.reseed(seed as u32);
        Ok(())
    }

    fn next(&mut self) -> u64 {
        self.step() as u64
    }

    fn next_bounded(&mut self, limit: Limit) -> u64 {
        scale(self.step(), limit.get())
    }

    fn previous(&mut self) -> Result<u64, PrngError> {
        Ok(self.unstep() as u64)
    }

    fn previous_bounded(&mut self, limit: Limit) -> Result<u64, PrngError> {
        Ok(scale(self.unstep(), limit.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unstep_restores_buffers() {
        let mut rng = PureBasicRandom::new();
        rng.seed(99).unwrap();
        let before = rng.clone();
        let value = rng.step();
        assert_eq!(rng.unstep(), value);
        assert_eq!(rng.first, before.first);
        assert_eq!(rng.second, before.second);
        assert_eq!((rng.p1, rng.p2), (before.p1, before.p2));
    }
}
