//! Pruned recovery for LCG-family variants
//!
//! Both strategies enumerate post-states (the state right after the first
//! observed output) that agree with the first output, map each one back to
//! its seed through the multiplier inverse, and verify the seed by running
//! the generator. The search therefore reports exactly what an exhaustive
//! scan of the same range would.
//!
//! - `LowBits`: output is `(state / D) % limit`. The low `log2(g·D)` bits of
//!   the state evolve on their own (`g` being the largest power of two
//!   dividing both `limit` and `N / D`), so that small sub-generator is
//!   checked against every later output first. When the bounding can
//!   reject draws (Java `nextInt` at a limit that is not a power of two),
//!   each accepted post-state is also walked back through any run of
//!   rejected predecessors, and the sub-generator filter is skipped since
//!   later outputs no longer sit at fixed steps.
//! - `TopRange`: output is monotone in the state, so the first output pins
//!   the post-state to a window, and a second output prunes it lap by lap.

use super::blocks::for_each_affine_hit;
use super::{exhaustive_scan, reproduces, run_pruned, Monitor, RecoverySearch, SearchPlan};
use crate::arith::U256;
use crate::prng::{Bounding, EventHandler, LcgGenerator, Prng, RecoveryStrategy};
use std::ops::{ControlFlow, RangeInclusive};
use tracing::debug;

const JAVA_DISCARD: u64 = 1 << 17;
const JAVA_RANGE: u64 = 1 << 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shortcut {
    LowBits {
        discard: u64,
    },
    TopRange {
        discard: u64,
        /// Size of the scaled value space; `0` denotes 2^64
        range: u64,
        /// Extra states on each side of the window for float rounding
        margin: u64,
    },
}

pub(crate) fn recover(
    generator: &mut LcgGenerator,
    search: &RecoverySearch,
    handler: &mut EventHandler<'_>,
) -> bool {
    let Some(plan) = search.plan(generator.minimum_seed(), generator.maximum_seed()) else {
        return false;
    };
    match select(generator, search, &plan) {
        Ok(Shortcut::LowBits { discard }) => low_bits(generator, search, &plan, discard, handler),
        Ok(Shortcut::TopRange {
            discard,
            range,
            margin,
        }) => top_range(generator, search, &plan, discard, range, margin, handler),
        Err(reason) => {
            debug!(
                generator = generator.name(),
                reason, "falling back to exhaustive scan"
            );
            exhaustive_scan(generator, search, handler)
        }
    }
}

fn select(
    generator: &LcgGenerator,
    search: &RecoverySearch,
    plan: &SearchPlan,
) -> Result<Shortcut, &'static str> {
    let spec = generator.spec();
    let params = generator.params();
    if params.modulus == 0 {
        return Err("modulus 2^64 is not pruned");
    }
    if generator.inverse_multiplier().is_none() {
        return Err("multiplier has no inverse");
    }
    if search.known(0).is_none() {
        return Err("first output is a wildcard");
    }
    let limit = plan.limit.get();
    let no_output_wrap = params.output_divisor == 0
        || params.output_divisor as u128 * params.discard_divisor.max(1) as u128
            >= params.modulus as u128;

    let shortcut = match (spec.recovery, spec.bounding) {
        (RecoveryStrategy::LowBits { discard }, Bounding::Modulo) if no_output_wrap => {
            Shortcut::LowBits { discard }
        }
        (RecoveryStrategy::TopRange, Bounding::Scale) if no_output_wrap => Shortcut::TopRange {
            discard: params.discard_divisor.max(1),
            range: generator.output_range(),
            margin: 0,
        },
        (RecoveryStrategy::TopRange, Bounding::SinglePrecision) => Shortcut::TopRange {
            discard: 1,
            range: params.modulus,
            margin: 4,
        },
        (RecoveryStrategy::Java, Bounding::JavaNextInt) => {
            if limit.is_power_of_two() && limit <= JAVA_RANGE {
                Shortcut::TopRange {
                    discard: JAVA_DISCARD,
                    range: JAVA_RANGE,
                    margin: 0,
                }
            } else {
                Shortcut::LowBits {
                    discard: JAVA_DISCARD,
                }
            }
        }
        _ => return Err("variant has no pruning strategy"),
    };

    if let Shortcut::LowBits { discard } = shortcut {
        if !discard.is_power_of_two() || params.modulus % discard != 0 {
            return Err("discard divisor does not split the modulus");
        }
    }

    if estimated_work(generator, search, plan, shortcut) >= plan.candidates as u128 {
        return Err("range is smaller than the pruned search");
    }
    Ok(shortcut)
}

/// Rough number of candidates the shortcut will verify
fn estimated_work(
    generator: &LcgGenerator,
    search: &RecoverySearch,
    plan: &SearchPlan,
    shortcut: Shortcut,
) -> u128 {
    let n = generator.params().modulus as u128;
    let limit = plan.limit.get() as u128;
    match shortcut {
        Shortcut::LowBits { discard } => {
            let values = n / discard as u128;
            let g = sub_generator_factor(limit as u64, values as u64);
            if generator.bounding_rejects(limit as u64) {
                // runs of rejected predecessors average under one extra state
                return discard as u128 + 2 * discard as u128 * (values / limit + 1);
            }
            let later_known = (1..search.outputs.len())
                .filter(|&i| search.known(i).is_some())
                .count() as u32;
            let filter_bits = g.trailing_zeros().saturating_mul(later_known).min(63);
            let surviving = (discard >> filter_bits).max(1) as u128;
            discard as u128 + surviving * (values / limit + 1)
        }
        Shortcut::TopRange { .. } => n / limit + 1,
    }
}

/// Largest power of two dividing both `limit` and `values`
fn sub_generator_factor(limit: u64, values: u64) -> u64 {
    let limit_part = 1u64 << limit.trailing_zeros();
    let values_part = 1u64 << values.trailing_zeros().min(63);
    limit_part.min(values_part)
}

/// Map a post-state back to its seed and verify it
fn try_post_state(
    generator: &mut LcgGenerator,
    post_state: u64,
    search: &RecoverySearch,
    plan: &SearchPlan,
    monitor: &mut Monitor<'_, '_>,
) -> ControlFlow<()> {
    if let Ok(seed) = generator.seed_for_post_state(post_state) {
        if plan.contains(seed) && reproduces(generator, seed, search, plan.limit) {
            monitor.discovered(seed)?;
        }
    }
    monitor.attempt(None)
}

/// Try an accepted post-state and every post-state of a rejected draw
/// leading up to it
fn try_rejection_run(
    generator: &mut LcgGenerator,
    mut post_state: u64,
    search: &RecoverySearch,
    plan: &SearchPlan,
    monitor: &mut Monitor<'_, '_>,
) -> ControlFlow<()> {
    let limit = plan.limit.get();
    if generator.rejects_state(post_state, limit) {
        return monitor.attempt(None);
    }
    loop {
        try_post_state(generator, post_state, search, plan, monitor)?;
        match generator.seek_state_back(post_state, 1) {
            Ok(previous) if generator.rejects_state(previous, limit) => post_state = previous,
            _ => return ControlFlow::Continue(()),
        }
    }
}

fn low_bits(
    generator: &mut LcgGenerator,
    search: &RecoverySearch,
    plan: &SearchPlan,
    discard: u64,
    handler: &mut EventHandler<'_>,
) -> bool {
    let params = *generator.params();
    let limit = plan.limit.get();
    let modulus = params.modulus;
    let values = modulus / discard;
    let Some(first) = search.known(0) else {
        return false;
    };
    let rejecting = generator.bounding_rejects(limit);
    let g = sub_generator_factor(limit, values);
    let sub_modulus = g as u128 * discard as u128;
    let later: Vec<(usize, u64)> = if rejecting {
        Vec::new()
    } else {
        (1..search.outputs.len())
            .filter_map(|i| search.known(i).map(|value| (i, value % g)))
            .collect()
    };

    let total = estimated_work(generator, search, plan, Shortcut::LowBits { discard }) as u64;
    debug!(g, discard, values, rejecting, "low-bits sub-generator search");
    run_pruned("low-bits", search, total, handler, |monitor| {
        if first >= limit || first >= values {
            return ControlFlow::Continue(());
        }
        let fixed = (first % g) as u128 * discard as u128;
        for low in 0..discard {
            let sub_state = fixed + low as u128;
            if !later.is_empty()
                && g > 1
                && !sub_generator_agrees(sub_state, &params, sub_modulus, discard, g, &later)
            {
                continue;
            }
            let mut value = first;
            while value < values {
                let post_state = value * discard + low;
                if rejecting {
                    try_rejection_run(generator, post_state, search, plan, monitor)?;
                } else {
                    try_post_state(generator, post_state, search, plan, monitor)?;
                }
                value = match value.checked_add(limit) {
                    Some(next) => next,
                    None => break,
                };
            }
        }
        ControlFlow::Continue(())
    })
}

/// Run the low-bits sub-generator and compare against the low bits of every
/// later known output
fn sub_generator_agrees(
    start: u128,
    params: &crate::prng::LcgParams,
    sub_modulus: u128,
    discard: u64,
    g: u64,
    later: &[(usize, u64)],
) -> bool {
    let mut state = start;
    let mut position = 0;
    for &(index, expected) in later {
        while position < index {
            state = (state * params.multiplier as u128 + params.increment as u128) % sub_modulus;
            position += 1;
        }
        if ((state / discard as u128) % g as u128) as u64 != expected {
            return false;
        }
    }
    true
}

/// Post-states whose bounded output can be `output`
fn scaled_window(
    output: u64,
    limit: u64,
    discard: u64,
    range: u64,
    margin: u64,
    modulus: u64,
) -> Option<RangeInclusive<u64>> {
    if output >= limit {
        return None;
    }
    let range = U256::from_modulus(range);
    let limit_wide = U256::from_u64(limit);
    let lowest = (U256::from_u64(output) * range + limit_wide - U256::ONE)
        .checked_div(limit_wide)
        .ok()?;
    let highest = (U256::from_u64(output + 1) * range + limit_wide - U256::ONE)
        .checked_div(limit_wide)
        .ok()?;
    if lowest >= highest {
        return None;
    }
    let highest = highest - U256::ONE;

    let max_state = U256::from_u64(modulus - 1);
    let start = lowest.wrapping_mul_u64(discard);
    if start > max_state {
        return None;
    }
    let end = (highest.wrapping_mul_u64(discard) + U256::from_u64(discard - 1)).min(max_state);
    let start = start.low_u64().saturating_sub(margin);
    let end = end.low_u64().saturating_add(margin).min(modulus - 1);
    Some(start..=end)
}

fn top_range(
    generator: &mut LcgGenerator,
    search: &RecoverySearch,
    plan: &SearchPlan,
    discard: u64,
    range: u64,
    margin: u64,
    handler: &mut EventHandler<'_>,
) -> bool {
    let params = *generator.params();
    let limit = plan.limit.get();
    let window_for =
        |output: u64| scaled_window(output, limit, discard, range, margin, params.modulus);
    let Some(first) = search.known(0) else {
        return false;
    };
    let first_window = window_for(first);
    let second_window = search.known(1).map(window_for);
    let total = first_window
        .as_ref()
        .map_or(0, |w| w.end() - w.start() + 1);
    debug!(?first_window, ?second_window, "top-range window search");

    run_pruned("top-range", search, total, handler, |monitor| {
        let Some(window) = first_window else {
            return ControlFlow::Continue(());
        };
        match second_window {
            Some(None) => ControlFlow::Continue(()),
            Some(Some(next_window)) => for_each_affine_hit(
                window,
                params.multiplier,
                params.increment,
                params.modulus,
                next_window,
                |post_state| try_post_state(generator, post_state, search, plan, monitor),
            ),
            None => {
                for post_state in window {
                    try_post_state(generator, post_state, search, plan, monitor)?;
                }
                ControlFlow::Continue(())
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_generator_factor() {
        assert_eq!(sub_generator_factor(10, 1 << 15), 2);
        assert_eq!(sub_generator_factor(12, 1 << 15), 4);
        assert_eq!(sub_generator_factor(1 << 20, 1 << 15), 1 << 15);
        assert_eq!(sub_generator_factor(8, 0x7FFF_FFFF), 1);
    }

    #[test]
    fn test_scaled_window_is_exact_for_integer_scaling() {
        // msvcrt-mul: output = (state >> 16) * limit / 32768
        let limit = 10;
        for output in 0..limit {
            let window = scaled_window(output, limit, 1 << 16, 1 << 15, 0, 1 << 31).unwrap();
            let scale = |state: u64| (state >> 16) * limit / 32768;
            assert_eq!(scale(*window.start()), output);
            assert_eq!(scale(*window.end()), output);
            if *window.start() > 0 {
                assert_ne!(scale(window.start() - 1), output);
            }
            if *window.end() < (1 << 31) - 1 {
                assert_ne!(scale(window.end() + 1), output);
            }
        }
    }

    #[test]
    fn test_scaled_window_rejects_out_of_range_output() {
        assert!(scaled_window(10, 10, 1, 1 << 24, 0, 1 << 24).is_none());
    }
}
