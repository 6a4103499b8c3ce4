//! Pruned recovery for SQL Server `RAND()`
//!
//! A seed's high part is the first sub-generator's state, so seeds are
//! walked block by block. Within a block the first output confines the
//! second sub-generator's post-state to two short intervals, and a second
//! output prunes those lap by lap. Every candidate is re-verified.

use super::blocks::for_each_affine_hit;
use super::{exhaustive_scan, reproduces, run_pruned, RecoverySearch, SearchPlan};
use crate::arith::multiplicative_inverse;
use crate::prng::mssql::{FIRST_MODULUS, FIRST_MULTIPLIER, SECOND_MODULUS, SECOND_MULTIPLIER};
use crate::prng::{EventHandler, MssqlRand, Prng};
use std::ops::{ControlFlow, RangeInclusive};
use tracing::debug;

/// Integer bounds around the float scale divisor
const SCALE_FLOOR: u128 = 2147483589;
const SCALE_CEIL: u128 = 2147483590;

/// Above this the float product loses integer precision
const MAX_LIMIT: u64 = 1 << 31;

struct Prepared {
    first_window: Option<(u64, u64)>,
    /// `None` when the second observation is missing or a wildcard
    second_window: Option<Option<(u64, u64)>>,
    inverse: u64,
    blocks: RangeInclusive<u64>,
    estimate: u64,
}

fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    ((a as u128 * b as u128) % modulus as u128) as u64
}

/// Combined values that can scale to `output`, padded for float rounding
fn combined_window(output: u64, limit: u64) -> Option<(u64, u64)> {
    if output >= limit {
        return None;
    }
    let (o, l) = (output as u128, limit as u128);
    let lo = (o * SCALE_FLOOR / l).saturating_sub(1).max(1);
    let hi = (((o + 1) * SCALE_CEIL).div_ceil(l) + 1).min(FIRST_MODULUS as u128 - 1);
    (lo <= hi).then_some((lo as u64, hi as u64))
}

/// Second post-states that combine with `first` into `window`
///
/// The combined value is `first - second` when positive and
/// `first - second + N0 - 1` otherwise, giving one interval per branch.
fn second_states(first: u64, (lo, hi): (u64, u64)) -> impl Iterator<Item = RangeInclusive<u64>> {
    let first = first as i128;
    let wrap = FIRST_MODULUS as i128 - 1;
    let (lo, hi) = (lo as i128, hi as i128);
    [(first - hi, first - lo), (first + wrap - hi, first + wrap - lo)]
        .into_iter()
        .filter_map(|(from, to)| {
            let from = from.max(1);
            let to = to.min(SECOND_MODULUS as i128 - 1);
            (from <= to).then(|| from as u64..=to as u64)
        })
}

fn prepare(search: &RecoverySearch, plan: &SearchPlan) -> Result<Prepared, &'static str> {
    let first_output = search.known(0).ok_or("first output is a wildcard")?;
    let limit = plan.limit.get();
    if limit > MAX_LIMIT {
        return Err("limit exceeds float precision");
    }
    let inverse = multiplicative_inverse(SECOND_MULTIPLIER, SECOND_MODULUS)
        .ok_or("second multiplier has no inverse")?;
    let first_block = (plan.start / SECOND_MODULUS).max(1);
    let last_block = (plan.end / SECOND_MODULUS).min(FIRST_MODULUS - 1);
    if first_block > last_block {
        return Err("range covers no block");
    }
    let per_block = 2 * (FIRST_MODULUS / limit + 4) + 1;
    let estimate = (last_block - first_block + 1).saturating_mul(per_block);
    if estimate >= plan.candidates {
        return Err("range is smaller than the pruned search");
    }
    Ok(Prepared {
        first_window: combined_window(first_output, limit),
        second_window: search.known(1).map(|output| combined_window(output, limit)),
        inverse,
        blocks: first_block..=last_block,
        estimate,
    })
}

pub(crate) fn recover(
    generator: &mut MssqlRand,
    search: &RecoverySearch,
    handler: &mut EventHandler<'_>,
) -> bool {
    let Some(plan) = search.plan(generator.minimum_seed(), generator.maximum_seed()) else {
        return false;
    };
    let prepared = match prepare(search, &plan) {
        Ok(prepared) => prepared,
        Err(reason) => {
            debug!(
                generator = generator.name(),
                reason, "falling back to exhaustive scan"
            );
            return exhaustive_scan(generator, search, handler);
        }
    };
    debug!(
        blocks = ?prepared.blocks,
        first_window = ?prepared.first_window,
        "dual-lcg block search"
    );

    run_pruned("dual-lcg", search, prepared.estimate, handler, |monitor| {
        let Some(first_window) = prepared.first_window else {
            return ControlFlow::Continue(());
        };
        if let Some(None) = prepared.second_window {
            return ControlFlow::Continue(());
        }
        for high in prepared.blocks.clone() {
            let block_start = high * SECOND_MODULUS;
            let resume_from = plan.first_at_or_after(block_start);

            // a zero second sub-state seeds as the fallback constant
            if plan.contains(block_start) {
                if reproduces(generator, block_start, search, plan.limit) {
                    monitor.discovered(block_start)?;
                }
                monitor.attempt(resume_from)?;
            }

            let first_post = mul_mod(high, FIRST_MULTIPLIER, FIRST_MODULUS);
            let mut visit = |second_post: u64| -> ControlFlow<()> {
                let second = mul_mod(second_post, prepared.inverse, SECOND_MODULUS);
                let seed = block_start + second;
                if plan.contains(seed) && reproduces(generator, seed, search, plan.limit) {
                    monitor.discovered(seed)?;
                }
                monitor.attempt(resume_from)
            };

            match prepared.second_window {
                Some(Some(second_window)) => {
                    let first_next = mul_mod(first_post, FIRST_MULTIPLIER, FIRST_MODULUS);
                    for domain in second_states(first_post, first_window) {
                        for target in second_states(first_next, second_window) {
                            for_each_affine_hit(
                                domain.clone(),
                                SECOND_MULTIPLIER,
                                0,
                                SECOND_MODULUS,
                                target,
                                &mut visit,
                            )?;
                        }
                    }
                }
                _ => {
                    for domain in second_states(first_post, first_window) {
                        for second_post in domain {
                            visit(second_post)?;
                        }
                    }
                }
            }
        }
        ControlFlow::Continue(())
    })
}
