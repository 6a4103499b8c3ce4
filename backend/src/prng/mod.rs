//! Generator contract and the catalog of weak PRNG reproductions
//!
//! Every generator exposes the same capability surface through [`Prng`]:
//! seeding, forward output (raw and bounded), and, where the recurrence
//! allows, reversal, arbitrary-distance seeking and seed recovery.
//!
//! # Critical Invariants
//!
//! 1. Same variant + same seed → same output sequence, bit for bit.
//! 2. `previous()` immediately after `next()` returns the same value and
//!    restores the state (except where a variant documents best-effort
//!    reversal).
//! 3. Seeds outside `[minimum_seed, maximum_seed]` are rejected, never
//!    silently wrapped (documented clamps excepted).

mod dotnet;
mod error;
mod glibc;
mod lagged;
mod lcg;
pub(crate) mod mssql;
mod mysql;
mod purebasic;
pub(crate) mod v8;

pub use dotnet::{DotNetBounding, DotNetRandom};
pub use error::{Operation, PrngError};
pub use glibc::GlibcRandom;
pub use lagged::SeekMatrix;
pub use lcg::{Bounding, LcgGenerator, LcgParams, LcgSpec, RecoveryStrategy};
pub use mssql::MssqlRand;
pub use mysql::MysqlRand;
pub use purebasic::PureBasicRandom;
pub use v8::V8Random;

use crate::recovery::{self, RecoveryEvent, RecoverySearch};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::ops::ControlFlow;

/// Exclusive upper bound for bounded output, validated non-zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Limit(NonZeroU64);

impl Limit {
    /// # Errors
    /// [`PrngError::InvalidArgument`] for a zero limit.
    pub fn new(limit: u64) -> Result<Self, PrngError> {
        NonZeroU64::new(limit)
            .map(Limit)
            .ok_or_else(|| PrngError::InvalidArgument("non-positive limit".to_string()))
    }

    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for Limit {
    type Error = PrngError;

    fn try_from(limit: u64) -> Result<Self, Self::Error> {
        Limit::new(limit)
    }
}

/// Which optional operations a variant supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_reverse: bool,
    pub can_seek: bool,
    pub can_seek_seed: bool,
}

impl Capabilities {
    pub const FORWARD_ONLY: Capabilities = Capabilities {
        can_reverse: false,
        can_seek: false,
        can_seek_seed: false,
    };
}

/// Handler consulted for every recovery event; `Break` cancels the search
pub type EventHandler<'a> = dyn FnMut(&RecoveryEvent) -> ControlFlow<()> + 'a;

/// Common contract of every generator variant
pub trait Prng {
    /// Registry name of the variant
    fn name(&self) -> &'static str;

    fn minimum_seed(&self) -> u64;

    fn maximum_seed(&self) -> u64;

    fn capabilities(&self) -> Capabilities;

    /// Reset state from a seed
    ///
    /// # Errors
    /// [`PrngError::InvalidArgument`] if `seed` is outside
    /// `[minimum_seed, maximum_seed]`.
    fn seed(&mut self, seed: u64) -> Result<(), PrngError>;

    /// Advance one output and return its natural-width value
    fn next(&mut self) -> u64;

    /// Advance one output and return it reduced to `[0, limit)` the way the
    /// emulated platform does
    fn next_bounded(&mut self, limit: Limit) -> u64;

    /// Return the current output and step the state back by one
    fn previous(&mut self) -> Result<u64, PrngError> {
        Err(PrngError::unsupported(self.name(), Operation::Previous))
    }

    fn previous_bounded(&mut self, _limit: Limit) -> Result<u64, PrngError> {
        Err(PrngError::unsupported(self.name(), Operation::Previous))
    }

    /// Jump `offset` states forward without iterating
    fn seek_ahead(&mut self, _offset: u64) -> Result<(), PrngError> {
        Err(PrngError::unsupported(self.name(), Operation::SeekAhead))
    }

    fn seek_back(&mut self, _offset: u64) -> Result<(), PrngError> {
        Err(PrngError::unsupported(self.name(), Operation::SeekBack))
    }

    /// The seed whose state equals `seed`'s state advanced by `offset`
    fn seek_seed_ahead(&self, _seed: u64, _offset: u64) -> Result<u64, PrngError> {
        Err(PrngError::unsupported(self.name(), Operation::SeekSeed))
    }

    fn seek_seed_back(&self, _seed: u64, _offset: u64) -> Result<u64, PrngError> {
        Err(PrngError::unsupported(self.name(), Operation::SeekSeed))
    }

    /// Search for seeds reproducing `search.outputs`
    ///
    /// Returns `true` when the range was exhausted, `false` when the handler
    /// cancelled or the request was malformed.
    fn recover_seed(&mut self, search: &RecoverySearch, handler: &mut EventHandler<'_>) -> bool {
        recovery::exhaustive_scan(self, search, handler)
    }
}

pub(crate) fn ensure_seed_in_range(seed: u64, minimum: u64, maximum: u64) -> Result<(), PrngError> {
    if seed < minimum || seed > maximum {
        return Err(PrngError::seed_out_of_range(seed, minimum, maximum));
    }
    Ok(())
}
