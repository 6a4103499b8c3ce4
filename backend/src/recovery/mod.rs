//! Seed recovery
//!
//! Given a run of observed bounded outputs, find every seed in a range that
//! reproduces them. The generic strategy is an exhaustive scan; variants
//! whose structure leaks state bits override it with pruned searches that
//! report exactly the same seeds.
//!
//! # Critical Invariants
//!
//! 1. The handler sees every discovery and progress tick, synchronously.
//! 2. A `Break` from the handler stops the search before another candidate
//!    is evaluated, and the search returns `false`.
//! 3. Overrides never report a seed outside the requested range, and
//!    every reported seed is re-verified by running the generator.

mod blocks;
pub mod checkpoint;
pub(crate) mod dual_lcg;
pub(crate) mod lcg;
pub(crate) mod mwc;

pub use checkpoint::{CheckpointError, RecoveryCheckpoint};

use crate::prng::{EventHandler, Limit, Prng};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::{debug, info, trace};

/// Progress is reported after this many candidates unless configured
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Notification delivered to the recovery handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecoveryEvent {
    SeedDiscovered {
        seed: u64,
        attempts: u64,
        total: u64,
    },
    Progress {
        attempts: u64,
        total: u64,
        /// Next untested seed when the search walks seeds in order
        resume_from: Option<u64>,
    },
}

/// A seed recovery request
///
/// # Example
/// ```
/// use seedsleuth_core::recovery::RecoverySearch;
///
/// let search = RecoverySearch::new(vec![1, 7, 4, 0], 10)
///     .with_range(0, 1000)
///     .with_wildcard(Some(0));
/// assert!(search.matches(3, 5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverySearch {
    pub seed_start: u64,
    pub seed_end: u64,
    pub seed_increment: u64,
    pub outputs: Vec<u64>,
    pub limit: u64,
    /// Observed value that matches any generated value
    pub wildcard: Option<u64>,
    /// Candidates between progress events; `0` disables progress
    pub progress_interval: u64,
}

impl RecoverySearch {
    /// Search the whole seed domain with unit stride
    pub fn new(outputs: Vec<u64>, limit: u64) -> Self {
        Self {
            seed_start: 0,
            seed_end: u64::MAX,
            seed_increment: 1,
            outputs,
            limit,
            wildcard: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_range(mut self, start: u64, end: u64) -> Self {
        self.seed_start = start;
        self.seed_end = end;
        self
    }

    pub fn with_increment(mut self, increment: u64) -> Self {
        self.seed_increment = increment;
        self
    }

    pub fn with_wildcard(mut self, wildcard: Option<u64>) -> Self {
        self.wildcard = wildcard;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Whether `generated` satisfies the observation at `index`
    pub fn matches(&self, index: usize, generated: u64) -> bool {
        match self.outputs.get(index) {
            Some(&expected) => self.is_wildcard(expected) || expected == generated,
            None => false,
        }
    }

    pub fn is_wildcard(&self, observed: u64) -> bool {
        self.wildcard == Some(observed)
    }

    /// Observation at `index` unless it is missing or a wildcard
    pub(crate) fn known(&self, index: usize) -> Option<u64> {
        self.outputs
            .get(index)
            .copied()
            .filter(|&value| !self.is_wildcard(value))
    }

    /// Validate and clamp to a generator's seed domain
    pub(crate) fn plan(&self, minimum: u64, maximum: u64) -> Option<SearchPlan> {
        let limit = Limit::new(self.limit).ok()?;
        if self.outputs.is_empty() || self.seed_increment == 0 {
            return None;
        }
        let start = self.seed_start.max(minimum);
        let end = self.seed_end.min(maximum);
        if start > end {
            return None;
        }
        // align a clamped start onto the requested stride
        let offset = (start - self.seed_start) % self.seed_increment;
        let start = if offset == 0 {
            start
        } else {
            start.checked_add(self.seed_increment - offset)?
        };
        if start > end {
            return None;
        }
        let candidates = ((end - start) / self.seed_increment).saturating_add(1);
        Some(SearchPlan {
            start,
            end,
            increment: self.seed_increment,
            limit,
            candidates,
        })
    }
}

/// A validated search range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SearchPlan {
    pub start: u64,
    pub end: u64,
    pub increment: u64,
    pub limit: Limit,
    pub candidates: u64,
}

impl SearchPlan {
    pub fn contains(&self, seed: u64) -> bool {
        seed >= self.start && seed <= self.end && (seed - self.start) % self.increment == 0
    }

    /// First planned seed not below `seed`
    pub fn first_at_or_after(&self, seed: u64) -> Option<u64> {
        if seed <= self.start {
            return Some(self.start);
        }
        let steps = (seed - self.start).div_ceil(self.increment);
        let candidate = self.start.checked_add(steps.checked_mul(self.increment)?)?;
        (candidate <= self.end).then_some(candidate)
    }
}

/// Counts candidates and forwards events to the handler
pub(crate) struct Monitor<'h, 'a> {
    handler: &'h mut EventHandler<'a>,
    interval: u64,
    attempts: u64,
    total: u64,
    discoveries: u64,
}

impl<'h, 'a> Monitor<'h, 'a> {
    pub fn new(handler: &'h mut EventHandler<'a>, interval: u64, total: u64) -> Self {
        Self {
            handler,
            interval,
            attempts: 0,
            total,
            discoveries: 0,
        }
    }

    /// Count one evaluated candidate, reporting progress when due
    pub fn attempt(&mut self, resume_from: Option<u64>) -> ControlFlow<()> {
        self.attempts += 1;
        if self.interval != 0 && self.attempts % self.interval == 0 {
            return (self.handler)(&RecoveryEvent::Progress {
                attempts: self.attempts,
                total: self.total,
                resume_from,
            });
        }
        ControlFlow::Continue(())
    }

    pub fn discovered(&mut self, seed: u64) -> ControlFlow<()> {
        trace!(seed, attempts = self.attempts, "seed discovered");
        self.discoveries += 1;
        (self.handler)(&RecoveryEvent::SeedDiscovered {
            seed,
            attempts: self.attempts,
            total: self.total,
        })
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn discoveries(&self) -> u64 {
        self.discoveries
    }
}

/// Seed `prng` and compare its bounded outputs against the observations
pub(crate) fn reproduces<P: Prng + ?Sized>(
    prng: &mut P,
    seed: u64,
    search: &RecoverySearch,
    limit: Limit,
) -> bool {
    if prng.seed(seed).is_err() {
        return false;
    }
    (0..search.outputs.len()).all(|index| {
        let generated = prng.next_bounded(limit);
        search.matches(index, generated)
    })
}

/// Try every seed of the range in order
///
/// Returns `true` once the range is exhausted, `false` if the request is
/// malformed or the handler cancels.
pub fn exhaustive_scan<P: Prng + ?Sized>(
    prng: &mut P,
    search: &RecoverySearch,
    handler: &mut EventHandler<'_>,
) -> bool {
    let Some(plan) = search.plan(prng.minimum_seed(), prng.maximum_seed()) else {
        debug!(generator = prng.name(), "malformed recovery request");
        return false;
    };
    info!(
        generator = prng.name(),
        start = plan.start,
        end = plan.end,
        increment = plan.increment,
        candidates = plan.candidates,
        "exhaustive seed scan"
    );

    let mut monitor = Monitor::new(handler, search.progress_interval, plan.candidates);
    let mut seed = plan.start;
    loop {
        if reproduces(prng, seed, search, plan.limit) && monitor.discovered(seed).is_break() {
            return false;
        }
        let next = seed
            .checked_add(plan.increment)
            .filter(|&next| next <= plan.end);
        if monitor.attempt(next).is_break() {
            return false;
        }
        match next {
            Some(next) => seed = next,
            None => break,
        }
    }

    info!(
        attempts = monitor.attempts(),
        discoveries = monitor.discoveries(),
        "seed scan finished"
    );
    true
}

/// Run a pruned search body, translating cancellation into the contract's
/// boolean
pub(crate) fn run_pruned<F>(
    strategy: &'static str,
    search: &RecoverySearch,
    total: u64,
    handler: &mut EventHandler<'_>,
    body: F,
) -> bool
where
    F: FnOnce(&mut Monitor<'_, '_>) -> ControlFlow<()>,
{
    info!(strategy, estimated = total, "pruned seed search");
    let mut monitor = Monitor::new(handler, search.progress_interval, total);
    let completed = body(&mut monitor).is_continue();
    info!(
        strategy,
        attempts = monitor.attempts(),
        discoveries = monitor.discoveries(),
        completed,
        "pruned seed search finished"
    );
    completed
}
