//! Exact integer arithmetic for generator state math
//!
//! Generator recurrences reduce modulo values up to 2^64, and closed-form
//! seeking multiplies two such values before reducing modulo `N·(M−1)`.
//! Everything here is exact: no floating point, no silent overflow.

mod modular;
mod uint256;

pub use modular::{
    extended_euclid, extended_euclid_wide, multiplicative_inverse, multiplicative_inverse_wide,
    EuclidResult,
};
pub use uint256::U256;

use thiserror::Error;

/// Errors from the arithmetic layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Operand out of range: {0}")]
    OperandOutOfRange(String),
}
