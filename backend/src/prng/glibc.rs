//! glibc `random()` with the default TYPE_3 state (lag 31, taps 3 apart)

use super::lagged::{self, LaggedFeedback, SeekMatrix};
use super::{ensure_seed_in_range, Capabilities, Limit, Prng, PrngError};
use std::sync::OnceLock;

const LAG: usize = 31;
const SEPARATION: usize = 3;
const DISCARDED_OUTPUTS: usize = 310;
const LANE_MODULUS: u64 = 1 << 32;

/// glibc TYPE_3 additive feedback generator
///
/// # Example
/// ```
/// use seedsleuth_core::prng::{GlibcRandom, Prng};
///
/// let mut rng = GlibcRandom::new();
/// rng.seed(1).unwrap();
/// assert_eq!(rng.next(), 1804289383);
/// ```
#[derive(Debug, Clone)]
pub struct GlibcRandom {
    lanes: [u32; LAG],
    front: usize,
    rear: usize,
}

impl GlibcRandom {
    pub fn new() -> Self {
        let mut generator = Self {
            lanes: [0; LAG],
            front: SEPARATION,
            rear: 0,
        };
        generator.reseed(1);
        generator
    }

    fn reseed(&mut self, seed: u32) {
        // srandom_r: the Park-Miller recurrence in signed 32-bit Schrage form
        let mut word = seed as i32;
        self.lanes[0] = word as u32;
        for i in 1..LAG {
            let hi = word / 127773;
            let lo = word % 127773;
            word = 16807 * lo - 2836 * hi;
            if word < 0 {
                word += 2147483647;
            }
            self.lanes[i] = word as u32;
        }
        self.front = SEPARATION;
        self.rear = 0;
        for _ in 0..DISCARDED_OUTPUTS {
            self.step_forward();
        }
    }

    /// Current lane ring (for inspection and tests)
    pub fn lane_values(&self) -> [u32; LAG] {
        self.lanes
    }
}

impl Default for GlibcRandom {
    fn default() -> Self {
        Self::new()
    }
}

fn forward_block() -> SeekMatrix {
    let mut m = SeekMatrix::zero(LAG, LANE_MODULUS);
    for i in 0..LAG {
        let mut j = i as i64;
        while j >= 0 {
            m.set(i, j as usize, 1);
            j -= SEPARATION as i64;
        }
    }
    // the last three steps of a block wrap around onto lanes 0..3
    for k in 0..SEPARATION {
        m.add_row(k, LAG - SEPARATION + k);
    }
    m
}

fn backward_block() -> SeekMatrix {
    let mut m = SeekMatrix::zero(LAG, LANE_MODULUS);
    for j in 0..LAG - SEPARATION {
        m.set(j, j, 1);
        m.set(j + SEPARATION, j, -1);
    }
    for j in LAG - SEPARATION..LAG {
        m.set(j - (LAG - SEPARATION), j, -1);
        m.set(j - (LAG - 2 * SEPARATION), j, 1);
        m.set(j, j, 1);
    }
    m
}

impl LaggedFeedback for GlibcRandom {
    const LAG: usize = LAG;

    fn phase(&self) -> usize {
        self.rear
    }

    fn step_forward(&mut self) {
        self.lanes[self.front] = self.lanes[self.front].wrapping_add(self.lanes[self.rear]);
        self.front = (self.front + 1) % LAG;
        self.rear = (self.rear + 1) % LAG;
    }

    fn step_back(&mut self) {
        self.front = (self.front + LAG - 1) % LAG;
        self.rear = (self.rear + LAG - 1) % LAG;
        self.lanes[self.front] = self.lanes[self.front].wrapping_sub(self.lanes[self.rear]);
    }

    fn lanes(&self) -> Vec<u64> {
        self.lanes.iter().map(|&lane| lane as u64).collect()
    }

    fn set_lanes(&mut self, lanes: &[u64]) {
        for (slot, &lane) in self.lanes.iter_mut().zip(lanes) {
            *slot = lane as u32;
        }
    }

    fn forward_matrix() -> &'static SeekMatrix {
        static MATRIX: OnceLock<SeekMatrix> = OnceLock::new();
        MATRIX.get_or_init(forward_block)
    }

    fn backward_matrix() -> &'static SeekMatrix {
        static MATRIX: OnceLock<SeekMatrix> = OnceLock::new();
        MATRIX.get_or_init(backward_block)
    }
}

impl Prng for GlibcRandom {
    fn name(&self) -> &'static str {
        "glibc-type3"
    }

    fn minimum_seed(&self) -> u64 {
        1
    }

    fn maximum_seed(&self) -> u64 {
        u32::MAX as u64
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_reverse: true,
            can_seek: true,
            can_seek_seed: false,
        }
    }

    fn seed(&mut self, seed: u64) -> Result<(), PrngError> {
        ensure_seed_in_range(seed, self.minimum_seed(), self.maximum_seed())?;
        self.reseed(seed as u32);
        Ok(())
    }

    fn next(&mut self) -> u64 {
        let written = self.front;
        self.step_forward();
        (self.lanes[written] >> 1) as u64
    }

    fn next_bounded(&mut self, limit: Limit) -> u64 {
        self.next() % limit.get()
    }

    fn previous(&mut self) -> Result<u64, PrngError> {
        let written = (self.front + LAG - 1) % LAG;
        let value = (self.lanes[written] >> 1) as u64;
        self.step_back();
        Ok(value)
    }

    fn previous_bounded(&mut self, limit: Limit) -> Result<u64, PrngError> {
        Ok(self.previous()? % limit.get())
    }

    fn seek_ahead(&mut self, offset: u64) -> Result<(), PrngError> {
        lagged::seek_forward(self, offset);
        Ok(())
    }

    fn seek_back(&mut self, offset: u64) -> Result<(), PrngError> {
        lagged::seek_backward(self, offset);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_matrices_are_inverse() {
        let product = forward_block().multiply(&backward_block());
        assert_eq!(product, SeekMatrix::identity(LAG, LANE_MODULUS));
    }

    #[test]
    fn test_forward_block_matches_walk() {
        let mut walked = GlibcRandom::new();
        walked.seed(12345).unwrap();
        // realign: 310 discards leave the cursor 310 % 31 == 0 steps in
        assert_eq!(walked.phase(), 0);
        let expected = forward_block().apply(&walked.lanes());
        for _ in 0..LAG {
            walked.step_forward();
        }
        assert_eq!(walked.lanes(), expected);
    }
}
