//! Extended Euclid and modular inverses
//!
//! Only the Bézout coefficient of `a` is tracked: for `0 < a < b` the loop
//! keeps `r_i ≡ x_i·a (mod b)`, so when the remainder sequence ends the last
//! non-zero remainder is the gcd and its coefficient is the inverse of `a`
//! (when the gcd is 1).

use super::{ArithmeticError, U256};

/// Result of the extended Euclidean algorithm
///
/// `inverse` is present iff `gcd == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EuclidResult<T> {
    pub gcd: T,
    pub inverse: Option<T>,
}

/// Extended Euclid on native 64-bit operands
///
/// # Arguments
/// * `a` - value to invert, `0 < a < b`
/// * `b` - modulus
///
/// # Errors
/// [`ArithmeticError::OperandOutOfRange`] unless `0 < a < b`.
///
/// # Example
/// ```
/// use seedsleuth_core::arith::extended_euclid;
///
/// let result = extended_euclid(214013, 1 << 31).unwrap();
/// assert_eq!(result.gcd, 1);
/// assert_eq!(result.inverse, Some(968044885));
/// ```
pub fn extended_euclid(a: u64, b: u64) -> Result<EuclidResult<u64>, ArithmeticError> {
    if a == 0 || a >= b {
        return Err(ArithmeticError::OperandOutOfRange(format!(
            "extended_euclid requires 0 < a < b, got a={}, b={}",
            a, b
        )));
    }

    let (mut r0, mut r1) = (b, a);
    let (mut x0, mut x1): (i128, i128) = (0, 1);
    while r1 != 0 {
        let q = r0 / r1;
        (r0, r1) = (r1, r0 - q * r1);
        (x0, x1) = (x1, x0 - q as i128 * x1);
    }

    let inverse = (r0 == 1).then(|| x0.rem_euclid(b as i128) as u64);
    Ok(EuclidResult { gcd: r0, inverse })
}

/// Extended Euclid on 256-bit operands
///
/// Negative coefficients live modulo 2^256 and are recognised by their top
/// bit; coefficient magnitudes never exceed `b`, so `b` must stay below 2^255.
pub fn extended_euclid_wide(a: U256, b: U256) -> Result<EuclidResult<U256>, ArithmeticError> {
    if a.is_zero() || a >= b || b.is_msb_set() {
        return Err(ArithmeticError::OperandOutOfRange(format!(
            "extended_euclid_wide requires 0 < a < b < 2^255, got a={}, b={}",
            a, b
        )));
    }

    let (mut r0, mut r1) = (b, a);
    let (mut x0, mut x1) = (U256::ZERO, U256::ONE);
    while !r1.is_zero() {
        let (q, r) = r0.checked_div_rem(r1)?;
        (r0, r1) = (r1, r);
        (x0, x1) = (x1, x0.wrapping_sub(q.wrapping_mul(x1)));
    }

    let inverse = (r0 == U256::ONE).then(|| {
        if x0.is_msb_set() {
            x0.wrapping_add(b)
        } else {
            x0
        }
    });
    Ok(EuclidResult { gcd: r0, inverse })
}

/// Inverse of `a` modulo `modulus`, where a zero modulus denotes 2^64
///
/// Returns `None` when `a ≡ 0` or `gcd(a, modulus) != 1`.
///
/// # Example
/// ```
/// use seedsleuth_core::arith::multiplicative_inverse;
///
/// assert_eq!(multiplicative_inverse(16807, 2147483647), Some(1407677000));
/// assert_eq!(multiplicative_inverse(2, 1 << 31), None);
/// ```
pub fn multiplicative_inverse(a: u64, modulus: u64) -> Option<u64> {
    if modulus == 0 {
        return multiplicative_inverse_wide(U256::from_u64(a), U256::two_pow_64())
            .map(|inverse| inverse.low_u64());
    }
    let a = a % modulus;
    if a == 0 {
        return None;
    }
    extended_euclid(a, modulus).ok()?.inverse
}

/// Inverse of `a` modulo a 256-bit `modulus`
pub fn multiplicative_inverse_wide(a: U256, modulus: U256) -> Option<U256> {
    let a = a.checked_rem(modulus).ok()?;
    if a.is_zero() {
        return None;
    }
    extended_euclid_wide(a, modulus).ok()?.inverse
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_operands() {
        assert!(extended_euclid(0, 10).is_err());
        assert!(extended_euclid(10, 10).is_err());
        assert!(extended_euclid(11, 10).is_err());
    }

    #[test]
    fn test_non_coprime_has_no_inverse() {
        let result = extended_euclid(6, 16).unwrap();
        assert_eq!(result.gcd, 2);
        assert_eq!(result.inverse, None);
    }

    #[test]
    fn test_inverse_mod_two_pow_64() {
        let a = 0x5851F42D4C957F2D_u64;
        let inverse = multiplicative_inverse(a, 0).unwrap();
        assert_eq!(a.wrapping_mul(inverse), 1);
        assert_eq!(multiplicative_inverse(4, 0), None);
    }

    #[test]
    fn test_wide_matches_native() {
        let native = extended_euclid(40014, 2147483563).unwrap();
        let wide =
            extended_euclid_wide(U256::from_u64(40014), U256::from_u64(2147483563)).unwrap();
        assert_eq!(wide.gcd, U256::from_u64(native.gcd));
        assert_eq!(wide.inverse, native.inverse.map(U256::from_u64));
    }

    #[test]
    fn test_large_native_modulus() {
        let m = u64::MAX - 58; // prime
        let inverse = multiplicative_inverse(3, m).unwrap();
        assert_eq!((3u128 * inverse as u128) % m as u128, 1);
    }
}
