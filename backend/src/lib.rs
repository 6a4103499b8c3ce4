//! Seedsleuth Core - Weak PRNG Reproduction and Seed Recovery
//!
//! Bit-exact reproductions of the random number generators shipped with
//! common runtimes, with reversal, fast seeking and seed recovery.
//!
//! # Architecture
//!
//! - **arith**: 256-bit unsigned arithmetic and modular inverses
//! - **prng**: The `Prng` contract and every generator variant
//! - **recovery**: Seed search (exhaustive scan, pruned overrides, checkpoints)
//! - **registry**: Name → generator lookup
//!
//! # Critical Invariants
//!
//! 1. Same variant + same seed → same outputs, bit for bit, on every platform
//! 2. Seeking is closed-form or matrix-based, never proportional to the offset
//! 3. Every seed a recovery reports reproduces the observed outputs

pub mod arith;
pub mod prng;
pub mod recovery;
pub mod registry;

pub use arith::{ArithmeticError, U256};
pub use prng::{Capabilities, EventHandler, Limit, Prng, PrngError};
pub use recovery::{
    exhaustive_scan, CheckpointError, RecoveryCheckpoint, RecoveryEvent, RecoverySearch,
};
pub use registry::GeneratorEntry;
