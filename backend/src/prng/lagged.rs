//! Lagged additive/subtractive feedback generators and matrix seeking
//!
//! A lagged generator of lag `K` rewrites one lane of a `K`-lane ring per
//! output. Starting from an aligned cursor, `K` outputs rewrite every lane
//! exactly once, and that whole block is a linear map of the lane vector.
//! Seeking a long distance therefore becomes:
//!
//! 1. a short walk to the next aligned cursor,
//! 2. raising the block matrix to the number of whole blocks,
//! 3. one matrix-vector product,
//! 4. a residual walk of at most `K/2` steps in either direction.

use tracing::debug;

/// Square matrix over the integers modulo a lane modulus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekMatrix {
    order: usize,
    modulus: u64,
    cells: Vec<u64>,
}

impl SeekMatrix {
    /// The zero matrix
    pub fn zero(order: usize, modulus: u64) -> Self {
        Self {
            order,
            modulus,
            cells: vec![0; order * order],
        }
    }

    pub fn identity(order: usize, modulus: u64) -> Self {
        let mut matrix = Self::zero(order, modulus);
        for i in 0..order {
            matrix.set(i, i, 1);
        }
        matrix
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.cells[row * self.order + col]
    }

    /// Store `value` reduced into `[0, modulus)`; negative values wrap
    pub fn set(&mut self, row: usize, col: usize, value: i64) {
        let reduced = (value as i128).rem_euclid(self.modulus as i128) as u64;
        self.cells[row * self.order + col] = reduced;
    }

    /// Add `other_row` into `row`
    pub fn add_row(&mut self, row: usize, other_row: usize) {
        for col in 0..self.order {
            let sum = (self.get(row, col) as u128 + self.get(other_row, col) as u128)
                % self.modulus as u128;
            self.cells[row * self.order + col] = sum as u64;
        }
    }

    pub fn multiply(&self, other: &SeekMatrix) -> SeekMatrix {
        debug_assert_eq!(self.order, other.order);
        let n = self.order;
        let modulus = self.modulus as u128;
        let mut product = SeekMatrix::zero(n, self.modulus);
        for row in 0..n {
            for col in 0..n {
                let mut acc: u128 = 0;
                for k in 0..n {
                    acc += self.get(row, k) as u128 * other.get(k, col) as u128;
                }
                product.cells[row * n + col] = (acc % modulus) as u64;
            }
        }
        product
    }

    /// `self^exp` by square-and-multiply
    pub fn pow(&self, exp: u64) -> SeekMatrix {
        let mut result = SeekMatrix::identity(self.order, self.modulus);
        let mut base = self.clone();
        let mut exp = exp;
        while exp > 0 {
            if exp & 1 == 1 {
                result = result.multiply(&base);
            }
            exp >>= 1;
            if exp > 0 {
                base = base.multiply(&base);
            }
        }
        result
    }

    /// Matrix-vector product (lanes as a column vector)
    pub fn apply(&self, lanes: &[u64]) -> Vec<u64> {
        debug_assert_eq!(lanes.len(), self.order);
        let modulus = self.modulus as u128;
        (0..self.order)
            .map(|row| {
                let acc: u128 = lanes
                    .iter()
                    .enumerate()
                    .map(|(col, &lane)| self.get(row, col) as u128 * lane as u128)
                    .sum();
                (acc % modulus) as u64
            })
            .collect()
    }
}

/// Access a lagged generator needs to expose for block seeking
pub(crate) trait LaggedFeedback {
    const LAG: usize;

    /// Outputs produced since the cursor was last aligned, in `[0, LAG)`
    fn phase(&self) -> usize;

    fn step_forward(&mut self);

    fn step_back(&mut self);

    /// Lane vector at an aligned cursor
    fn lanes(&self) -> Vec<u64>;

    fn set_lanes(&mut self, lanes: &[u64]);

    fn forward_matrix() -> &'static SeekMatrix;

    fn backward_matrix() -> &'static SeekMatrix;
}

fn walk<G: LaggedFeedback>(generator: &mut G, steps: i64) {
    if steps >= 0 {
        for _ in 0..steps {
            generator.step_forward();
        }
    } else {
        for _ in 0..steps.unsigned_abs() {
            generator.step_back();
        }
    }
}

/// Split an aligned distance into whole blocks and a residual walk of at
/// most `LAG / 2` steps
fn decompose(distance: u64, lag: usize) -> (u64, i64) {
    let lag_u = lag as u64;
    let mut blocks = distance / lag_u;
    let mut residue = (distance % lag_u) as i64;
    if residue > (lag / 2) as i64 {
        blocks += 1;
        residue -= lag as i64;
    }
    (blocks, residue)
}

pub(crate) fn seek_forward<G: LaggedFeedback>(generator: &mut G, offset: u64) {
    if offset < G::LAG as u64 {
        walk(generator, offset as i64);
        return;
    }
    let phase = generator.phase();
    let align = if phase == 0 { 0 } else { G::LAG - phase };
    walk(generator, align as i64);

    let (blocks, residue) = decompose(offset - align as u64, G::LAG);
    debug!(offset, align, blocks, residue, "lagged seek ahead");
    let lanes = G::forward_matrix().pow(blocks).apply(&generator.lanes());
    generator.set_lanes(&lanes);
    walk(generator, residue);
}

pub(crate) fn seek_backward<G: LaggedFeedback>(generator: &mut G, offset: u64) {
    if offset < G::LAG as u64 {
        walk(generator, -(offset as i64));
        return;
    }
    let phase = generator.phase();
    walk(generator, -(phase as i64));

    let (blocks, residue) = decompose(offset - phase as u64, G::LAG);
    debug!(offset, phase, blocks, residue, "lagged seek back");
    let lanes = G::backward_matrix().pow(blocks).apply(&generator.lanes());
    generator.set_lanes(&lanes);
    walk(generator, -residue);
}
