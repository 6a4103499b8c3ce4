//! Pruned recovery for the V8 multiply-with-carry pair
//!
//! An output word is `(first << 14) + (second & 0x3FFFF)`, so its top bits
//! fix the low 18 bits of the first post-state up to a small carry, and
//! its low bits then fix the low 18 bits of the second. The remaining high
//! bits are enumerated up to each step's maximum, filtered by the second
//! observation, and every post-state pair is mapped to all of its MWC
//! preimages before the resulting seed is verified.

use super::{exhaustive_scan, reproduces, run_pruned, RecoverySearch, SearchPlan};
use crate::prng::v8::{combine, mwc_max, mwc_step, FIRST_MULTIPLIER, SECOND_MULTIPLIER};
use crate::prng::{EventHandler, Prng, V8Random};
use std::ops::{ControlFlow, RangeInclusive};
use tracing::debug;

const LOW_BITS: u32 = 18;
const LOW_MASK: u32 = (1 << LOW_BITS) - 1;
const WORD: u128 = 1 << 32;

/// Output words that scale to `output`
fn word_window(output: u64, limit: u64) -> Option<(u64, u64)> {
    if output >= limit {
        return None;
    }
    let (o, l) = (output as u128, limit as u128);
    let lo = (o * WORD).div_ceil(l);
    let hi = (((o + 1) * WORD).div_ceil(l) - 1).min(WORD - 1);
    (lo <= hi).then_some((lo as u64, hi as u64))
}

/// Set of low-18-bit first post-states compatible with an output window
struct LowSet {
    bits: Vec<u64>,
    len: u64,
}

impl LowSet {
    fn for_window((lo, hi): (u64, u64)) -> Self {
        let mut set = Self {
            bits: vec![0; 1 << (LOW_BITS - 6)],
            len: 0,
        };
        // word = (low << 14) + (second & 0x3FFFF) mod 2^32
        let from = (lo as i64 - LOW_MASK as i64).div_euclid(1 << 14);
        let to = (hi as i64).div_euclid(1 << 14);
        let span = (to - from + 1).min(1 << LOW_BITS);
        for step in 0..span {
            set.insert((from + step).rem_euclid(1 << LOW_BITS) as u32);
        }
        set
    }

    fn insert(&mut self, value: u32) {
        let (word, bit) = ((value >> 6) as usize, value & 63);
        if self.bits[word] & (1 << bit) == 0 {
            self.bits[word] |= 1 << bit;
            self.len += 1;
        }
    }

    fn contains(&self, value: u32) -> bool {
        let value = value & LOW_MASK;
        self.bits[(value >> 6) as usize] & (1 << (value & 63)) != 0
    }

    fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..=LOW_MASK).filter(|&value| self.contains(value))
    }
}

/// Low 18 bits of the second post-state given the first post-state's
/// contribution `base` to the output word
fn second_lows((lo, hi): (u64, u64), base: u32) -> impl Iterator<Item = RangeInclusive<u32>> {
    let base = base as i64;
    [base, base - WORD as i64].into_iter().filter_map(move |start| {
        let from = (lo as i64).max(start);
        let to = (hi as i64).min(start + LOW_MASK as i64);
        (from <= to).then(|| (from - start) as u32..=(to - start) as u32)
    })
}

/// Every state that steps to `post`
fn preimages(post: u32, multiplier: u32) -> impl Iterator<Item = u32> {
    let (a, s) = (multiplier as u64, post as u64);
    let low_min = s.saturating_sub(0xFFFF).div_ceil(a);
    let low_max = (s / a).min(0xFFFF);
    (low_min..=low_max).map(move |low| (((s - a * low) as u32) << 16) | low as u32)
}

fn estimate(first: (u64, u64), second: Option<&LowSet>) -> u64 {
    let first_set = LowSet::for_window(first).len as f64;
    let first_tops = (mwc_max(FIRST_MULTIPLIER) >> LOW_BITS) as f64 + 1.0;
    let second_tops = (mwc_max(SECOND_MULTIPLIER) >> LOW_BITS) as f64 + 1.0;
    let lows = ((first.1 - first.0 + 1) as f64).min((1u64 << LOW_BITS) as f64);
    let candidates = first_set * first_tops;
    let surviving = match second {
        Some(set) => candidates * set.len as f64 / (1u64 << LOW_BITS) as f64,
        None => candidates,
    };
    let total = candidates + surviving * lows * second_tops;
    if total >= u64::MAX as f64 {
        u64::MAX
    } else {
        total as u64
    }
}

fn prepare(
    search: &RecoverySearch,
    plan: &SearchPlan,
) -> Result<(Option<(u64, u64)>, Option<Option<(u64, u64)>>, u64), &'static str> {
    let first_output = search.known(0).ok_or("first output is a wildcard")?;
    let limit = plan.limit.get();
    if limit > 1 << 32 {
        return Err("limit wider than the output word");
    }
    let first = word_window(first_output, limit);
    let second = search.known(1).map(|output| word_window(output, limit));
    let total = match (first, second) {
        (None, _) | (_, Some(None)) => 0,
        (Some(first), Some(Some(window))) => {
            estimate(first, Some(&LowSet::for_window(window)))
        }
        (Some(first), None) => estimate(first, None),
    };
    if total >= plan.candidates {
        return Err("range is smaller than the pruned search");
    }
    Ok((first, second, total))
}

pub(crate) fn recover(
    generator: &mut V8Random,
    search: &RecoverySearch,
    handler: &mut EventHandler<'_>,
) -> bool {
    let Some(plan) = search.plan(generator.minimum_seed(), generator.maximum_seed()) else {
        return false;
    };
    let (first_window, second_window, total) = match prepare(search, &plan) {
        Ok(prepared) => prepared,
        Err(reason) => {
            debug!(
                generator = generator.name(),
                reason, "falling back to exhaustive scan"
            );
            return exhaustive_scan(generator, search, handler);
        }
    };
    let limit = plan.limit;

    run_pruned("mwc", search, total, handler, |monitor| {
        let Some(first_window) = first_window else {
            return ControlFlow::Continue(());
        };
        if matches!(second_window, Some(None)) {
            return ControlFlow::Continue(());
        }
        let first_lows = LowSet::for_window(first_window);
        let second_filter = second_window.flatten().map(LowSet::for_window);
        let second_output = search.known(1);
        debug!(
            first_lows = first_lows.len,
            filtered = second_filter.is_some(),
            "mwc post-state search"
        );

        for first_low in first_lows.iter() {
            let mut top = 0u32;
            while let Some(first_post) = (top << LOW_BITS)
                .checked_add(first_low)
                .filter(|&post| post <= mwc_max(FIRST_MULTIPLIER))
            {
                top += 1;
                let first_next = mwc_step(first_post, FIRST_MULTIPLIER);
                if let Some(filter) = &second_filter {
                    if !filter.contains(first_next) {
                        continue;
                    }
                }
                let base = first_post << 14;
                for lows in second_lows(first_window, base) {
                    for second_low in lows {
                        let mut second_top = 0u32;
                        while let Some(second_post) = (second_top << LOW_BITS)
                            .checked_add(second_low)
                            .filter(|&post| post <= mwc_max(SECOND_MULTIPLIER))
                        {
                            second_top += 1;
                            if let Some(expected) = second_output {
                                let word =
                                    combine(first_next, mwc_step(second_post, SECOND_MULTIPLIER));
                                if (word as u128 * limit.get() as u128) >> 32 != expected as u128 {
                                    continue;
                                }
                            }
                            for first in preimages(first_post, FIRST_MULTIPLIER) {
                                for second in preimages(second_post, SECOND_MULTIPLIER) {
                                    let seed = (first as u64) << 32 | second as u64;
                                    if plan.contains(seed)
                                        && reproduces(generator, seed, search, limit)
                                    {
                                        monitor.discovered(seed)?;
                                    }
                                    monitor.attempt(None)?;
                                }
                            }
                        }
                    }
                }
            }
        }
        ControlFlow::Continue(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preimages_step_to_post_state() {
        for post in [0u32, 5, 18273, 1_000_000, mwc_max(FIRST_MULTIPLIER)] {
            let states: Vec<_> = preimages(post, FIRST_MULTIPLIER).collect();
            assert!(!states.is_empty());
            for state in states {
                assert_eq!(mwc_step(state, FIRST_MULTIPLIER), post);
            }
        }
        assert_eq!(preimages(mwc_max(FIRST_MULTIPLIER) + 1, FIRST_MULTIPLIER).count(), 0);
    }

    #[test]
    fn test_low_set_contains_actual_post_state() {
        let (first, second) = (0x0123_4567u32, 0x89AB_CDEFu32);
        let word = combine(first, second) as u64;
        let set = LowSet::for_window((word, word));
        assert!(set.contains(first));
        assert!(set.len <= 17);
    }

    #[test]
    fn test_second_lows_recover_second_bits() {
        let (first, second) = (0x0FED_CBA9u32, 0x0765_4321u32);
        let word = combine(first, second) as u64;
        let lows: Vec<_> = second_lows((word, word), first << 14).collect();
        assert_eq!(lows, vec![second & LOW_MASK..=second & LOW_MASK]);
    }

    #[test]
    fn test_word_window_bounds() {
        assert_eq!(word_window(0, 1), Some((0, u32::MAX as u64)));
        assert_eq!(word_window(1, 2), Some((1 << 31, u32::MAX as u64)));
        assert_eq!(word_window(5, 5), None);
    }
}
