//! Checkpoint - Save/Resume Seed Searches
//!
//! A checkpoint records where an interrupted search can pick up again. It is
//! bound to the generator and the observations it was captured for, so a
//! checkpoint is never replayed against a different request.
//!
//! # Critical Invariants
//!
//! - **Request Matching**: resumption requires the same generator and the
//!   same outputs, limit, wildcard, end and increment
//! - **Stride Alignment**: the resume point lies on the original seed stride

use super::RecoverySearch;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("Checkpoint mismatch: {0}")]
    Mismatch(String),
}

/// Resumable position of a seed search
///
/// # Example
/// ```
/// use seedsleuth_core::recovery::{RecoveryCheckpoint, RecoverySearch};
///
/// let search = RecoverySearch::new(vec![4, 1, 8], 10).with_range(0, 5000);
/// let checkpoint = RecoveryCheckpoint::capture("msvcrt", &search, 1200);
/// let resumed = checkpoint.resume("msvcrt").unwrap();
/// assert_eq!(resumed.seed_start, 1200);
/// assert_eq!(resumed.seed_end, 5000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryCheckpoint {
    pub generator: String,
    pub search: RecoverySearch,
    /// Next seed the search had not yet tested
    pub resume_from: u64,
    /// SHA256 of the generator name and the request's fixed parameters
    pub fingerprint: String,
}

impl RecoveryCheckpoint {
    pub fn capture(generator: &str, search: &RecoverySearch, resume_from: u64) -> Self {
        Self {
            generator: generator.to_string(),
            search: search.clone(),
            resume_from,
            fingerprint: fingerprint(generator, search),
        }
    }

    /// The search to run for the remainder of the range
    ///
    /// # Errors
    /// [`CheckpointError::Mismatch`] when `generator` differs from the one
    /// captured, the fingerprint no longer matches the stored request, or
    /// the resume point lies outside the original range or stride.
    pub fn resume(&self, generator: &str) -> Result<RecoverySearch, CheckpointError> {
        if !self.generator.eq_ignore_ascii_case(generator) {
            return Err(CheckpointError::Mismatch(format!(
                "captured for generator '{}', not '{}'",
                self.generator, generator
            )));
        }
        if fingerprint(&self.generator, &self.search) != self.fingerprint {
            return Err(CheckpointError::Mismatch(
                "fingerprint does not match the stored search".to_string(),
            ));
        }

        let search = &self.search;
        if self.resume_from < search.seed_start || self.resume_from > search.seed_end {
            return Err(CheckpointError::Mismatch(format!(
                "resume point {} outside [{}, {}]",
                self.resume_from, search.seed_start, search.seed_end
            )));
        }
        if search.seed_increment == 0
            || (self.resume_from - search.seed_start) % search.seed_increment != 0
        {
            return Err(CheckpointError::Mismatch(format!(
                "resume point {} is off the seed stride",
                self.resume_from
            )));
        }

        Ok(RecoverySearch {
            seed_start: self.resume_from,
            ..search.clone()
        })
    }
}

/// Hex SHA256 over everything a resumed search must keep unchanged
fn fingerprint(generator: &str, search: &RecoverySearch) -> String {
    let mut hasher = Sha256::new();
    hasher.update(generator.to_ascii_lowercase().as_bytes());
    hasher.update([0u8]);
    hasher.update((search.outputs.len() as u64).to_le_bytes());
    for output in &search.outputs {
        hasher.update(output.to_le_bytes());
    }
    hasher.update(search.limit.to_le_bytes());
    match search.wildcard {
        Some(wildcard) => {
            hasher.update([1u8]);
            hasher.update(wildcard.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.update(search.seed_end.to_le_bytes());
    hasher.update(search.seed_increment.to_le_bytes());
    format!("{:x}", hasher.finalize())
}
