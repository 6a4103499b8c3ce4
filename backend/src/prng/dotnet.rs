//! .NET Framework `System.Random` (Knuth's subtractive generator, lag 55)

use super::lagged::{self, LaggedFeedback, SeekMatrix};
use super::{ensure_seed_in_range, Capabilities, Limit, Prng, PrngError};
use std::sync::OnceLock;

const LAG: usize = 55;
const TAP: usize = 21;
const MBIG: i32 = i32::MAX;
const MSEED: i32 = 161803398;

/// How `Next(limit)` reduces an internal sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotNetBounding {
    /// `sample % limit`
    Modulo,
    /// `(int)(sample * (1.0 / MBIG) * limit)`, as `Random.Next(int)` does
    Scale,
}

/// `System.Random`
///
/// Lanes live in `SeedArray[1..=55]`; index 0 is unused, matching the
/// runtime's layout so cursor arithmetic reads the same.
#[derive(Debug, Clone)]
pub struct DotNetRandom {
    seed_array: [i32; LAG + 1],
    inext: usize,
    inextp: usize,
    bounding: DotNetBounding,
}

impl DotNetRandom {
    pub fn new(bounding: DotNetBounding) -> Self {
        let mut generator = Self {
            seed_array: [0; LAG + 1],
            inext: 0,
            inextp: TAP,
            bounding,
        };
        generator.reseed(0);
        generator
    }

    /// `sample % limit` bounding
    pub fn modulo() -> Self {
        Self::new(DotNetBounding::Modulo)
    }

    /// `Random.Next(int)` bounding
    pub fn scaled() -> Self {
        Self::new(DotNetBounding::Scale)
    }

    fn reseed(&mut self, seed: i32) {
        let sa = &mut self.seed_array;
        let mut mj = MSEED.wrapping_sub(seed.wrapping_abs());
        sa[LAG] = mj;
        let mut mk: i32 = 1;
        for i in 1..LAG {
            let ii = (21 * i) % LAG;
            sa[ii] = mk;
            mk = mj.wrapping_sub(mk);
            if mk < 0 {
                mk = mk.wrapping_add(MBIG);
            }
            mj = sa[ii];
        }
        for _ in 0..4 {
            for i in 1..=LAG {
                sa[i] = sa[i].wrapping_sub(sa[1 + (i + 30) % LAG]);
                if sa[i] < 0 {
                    sa[i] = sa[i].wrapping_add(MBIG);
                }
            }
        }
        self.inext = 0;
        self.inextp = TAP;
    }

    fn internal_sample(&mut self) -> i32 {
        self.advance_cursors();
        let mut value = self.seed_array[self.inext].wrapping_sub(self.seed_array[self.inextp]);
        if value < 0 {
            value = value.wrapping_add(MBIG);
        }
        self.seed_array[self.inext] = value;
        value
    }

    fn advance_cursors(&mut self) {
        self.inext += 1;
        if self.inext > LAG {
            self.inext = 1;
        }
        self.inextp += 1;
        if self.inextp > LAG {
            self.inextp = 1;
        }
    }

    fn retreat_cursors(&mut self) {
        self.inext -= 1;
        if self.inext == 0 {
            self.inext = LAG;
        }
        self.inextp -= 1;
        if self.inextp == 0 {
            self.inextp = LAG;
        }
    }

    fn undo_sample(&mut self) -> i32 {
        if self.inext == 0 {
            self.inext = LAG;
        }
        let current = self.seed_array[self.inext];
        let mut restored = current as i64 + self.seed_array[self.inextp] as i64;
        if restored >= MBIG as i64 {
            restored -= MBIG as i64;
        }
        self.seed_array[self.inext] = restored as i32;
        self.retreat_cursors();
        current
    }

    fn bound(&self, sample: i32, limit: u64) -> u64 {
        match self.bounding {
            DotNetBounding::Modulo => sample as u64 % limit,
            DotNetBounding::Scale => (sample as f64 * (1.0 / MBIG as f64) * limit as f64) as u64,
        }
    }
}

fn forward_block() -> SeekMatrix {
    let modulus = MBIG as u64;
    let mut m = SeekMatrix::zero(LAG, modulus);
    let rewritten_first = LAG - TAP;
    for i in 0..rewritten_first {
        m.set(i, i, 1);
        m.set(i, TAP + i, -1);
    }
    // the last 21 lanes subtract lanes already rewritten in this block
    for i in 0..TAP {
        m.set(rewritten_first + i, i, -1);
        m.set(rewritten_first + i, TAP + i, 1);
        m.set(rewritten_first + i, rewritten_first + i, 1);
    }
    m
}

fn backward_block() -> SeekMatrix {
    let modulus = MBIG as u64;
    let mut m = SeekMatrix::zero(LAG, modulus);
    let rewritten_first = LAG - TAP; // 34
    let short = rewritten_first - TAP; // 13
    for i in 0..short {
        m.set(i, i, 1);
        m.set(i, i + (rewritten_first - 2 * short), 1);
        m.set(i, i + TAP, 1);
        m.set(i, i + 2 * TAP, 1);
    }
    for i in 0..TAP {
        m.set(short + i, i, 1);
        m.set(short + i, short + i, 1);
        m.set(short + i, rewritten_first + i, 1);
        m.set(rewritten_first + i, i, 1);
        m.set(rewritten_first + i, rewritten_first + i, 1);
    }
    m
}

impl LaggedFeedback for DotNetRandom {
    const LAG: usize = LAG;

    fn phase(&self) -> usize {
        self.inext % LAG
    }

    fn step_forward(&mut self) {
        self.internal_sample();
    }

    fn step_back(&mut self) {
        self.undo_sample();
    }

    fn lanes(&self) -> Vec<u64> {
        self.seed_array[1..]
            .iter()
            .map(|&lane| (lane as i64).rem_euclid(MBIG as i64) as u64)
            .collect()
    }

    fn set_lanes(&mut self, lanes: &[u64]) {
        for (slot, &lane) in self.seed_array[1..].iter_mut().zip(lanes) {
            *slot = lane as i32;
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

impl Prng for DotNetRandom {
    fn name(&self) -> &'static str {
        match self.bounding {
            DotNetBounding::Modulo => "dotnet-mod",
            DotNetBounding::Scale => "dotnet",
        }
    }

    fn minimum_seed(&self) -> u64 {
        0
    }

    fn maximum_seed(&self) -> u64 {
        MBIG as u64
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
        self.reseed(seed as i32);
        Ok(())
    }

    fn next(&mut self) -> u64 {
        self.internal_sample() as u64
    }

    fn next_bounded(&mut self, limit: Limit) -> u64 {
        let sample = self.internal_sample();
        self.bound(sample, limit.get())
    }

    fn previous(&mut self) -> Result<u64, PrngError> {
        Ok(self.undo_sample() as u64)
    }

    fn previous_bounded(&mut self, limit: Limit) -> Result<u64, PrngError> {
        let sample = self.undo_sample();
        Ok(self.bound(sample, limit.get()))
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
        assert_eq!(product, SeekMatrix::identity(LAG, MBIG as u64));
    }

    #[test]
    fn test_forward_block_matches_walk() {
        let mut walked = DotNetRandom::modulo();
        walked.seed(42).unwrap();
        for _ in 0..LAG {
            walked.step_forward();
        }
        assert_eq!(walked.phase(), 0);
        let expected = forward_block().apply(&walked.lanes());
        for _ in 0..LAG {
            walked.step_forward();
        }
        assert_eq!(walked.lanes(), expected);
    }

    #[test]
    fn test_bounded_rules() {
        let mut modulo = DotNetRandom::modulo();
        let mut scaled = DotNetRandom::scaled();
        modulo.seed(7).unwrap();
        scaled.seed(7).unwrap();
        let sample = modulo.clone().next();
        assert_eq!(modulo.next_bounded(Limit::new(1000).unwrap()), sample % 1000);
        let expected = (sample as f64 * (1.0 / MBIG as f64) * 1000.0) as u64;
        assert_eq!(scaled.next_bounded(Limit::new(1000).unwrap()), expected);
    }
}
