//! Lap enumeration for affine maps
//!
//! For `y(x) = (a·x + c) mod m`, the unreduced value `a·x + c` grows
//! monotonically with `x`, so each multiple `k·m` it passes starts a new
//! "lap". Within lap `k` the `x` whose image lands in a target window form
//! one contiguous interval:
//!
//! ```text
//! ceil((lo + k·m − c) / a)  ≤  x  ≤  floor((hi + k·m − c) / a)
//! ```
//!
//! Walking laps instead of candidates skips every state whose successor
//! misses the window, which is what makes a second observation cheap to use.

use std::ops::{ControlFlow, RangeInclusive};

/// Visit every `x` in `domain` whose image `(multiplier·x + increment) mod
/// modulus` falls inside `target`, in increasing order
///
/// `modulus` of `0` denotes 2^64.
pub(crate) fn for_each_affine_hit<F>(
    domain: RangeInclusive<u64>,
    multiplier: u64,
    increment: u64,
    modulus: u64,
    target: RangeInclusive<u64>,
    mut visit: F,
) -> ControlFlow<()>
where
    F: FnMut(u64) -> ControlFlow<()>,
{
    let (lo, hi) = (*domain.start(), *domain.end());
    let (t_lo, t_hi) = (*target.start() as u128, *target.end() as u128);
    if lo > hi || t_lo > t_hi {
        return ControlFlow::Continue(());
    }
    let n: u128 = if modulus == 0 { 1 << 64 } else { modulus as u128 };
    let a = multiplier as u128;
    let c = increment as u128;

    if a == 0 {
        // constant successor: all or nothing
        if (t_lo..=t_hi).contains(&(c % n)) {
            for x in lo..=hi {
                visit(x)?;
            }
        }
        return ControlFlow::Continue(());
    }

    let first_lap = (a * lo as u128 + c) / n;
    let last_lap = (a * hi as u128 + c) / n;
    for lap in first_lap..=last_lap {
        let base = lap * n;
        let low_target = base + t_lo;
        let high_target = base + t_hi;
        if high_target < c {
            continue;
        }
        let x_min = if low_target <= c {
            0
        } else {
            (low_target - c).div_ceil(a)
        };
        let x_max = (high_target - c) / a;
        let from = x_min.max(lo as u128);
        let to = x_max.min(hi as u128);
        if from > to {
            continue;
        }
        for x in from as u64..=to as u64 {
            visit(x)?;
        }
    }
    ControlFlow::Continue(())
}
