use crate::arith::ArithmeticError;
use std::fmt;
use thiserror::Error;

/// Generator operations that a variant may not support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Previous,
    SeekAhead,
    SeekBack,
    SeekSeed,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Previous => "previous",
            Operation::SeekAhead => "seek ahead",
            Operation::SeekBack => "seek back",
            Operation::SeekSeed => "seek seed",
        };
        f.write_str(name)
    }
}

/// Errors raised by generator operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrngError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{generator} does not support {operation}")]
    UnsupportedOperation {
        generator: &'static str,
        operation: Operation,
    },

    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

impl PrngError {
    pub fn unsupported(generator: &'static str, operation: Operation) -> Self {
        PrngError::UnsupportedOperation {
            generator,
            operation,
        }
    }

    pub(crate) fn seed_out_of_range(seed: u64, minimum: u64, maximum: u64) -> Self {
        PrngError::InvalidArgument(format!(
            "seed {} outside [{}, {}]",
            seed, minimum, maximum
        ))
    }
}
