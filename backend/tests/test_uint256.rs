//! Tests for U256
//!
//! Division identities and modular exponentiation against u128 references.

use proptest::prelude::*;
use seedsleuth_core::arith::{ArithmeticError, U256};

fn wide(limbs: [u64; 4]) -> U256 {
    U256::from_limbs(limbs)
}

proptest! {
    #[test]
    fn prop_div_rem_identity(x in any::<[u64; 4]>(), y in any::<[u64; 4]>()) {
        let (x, y) = (wide(x), wide(y));
        prop_assume!(!y.is_zero());
        let (quotient, remainder) = x.checked_div_rem(y).unwrap();
        prop_assert!(remainder < y);
        prop_assert_eq!(quotient.wrapping_mul(y).wrapping_add(remainder), x);
    }

    #[test]
    fn prop_div_rem_small_divisor(x in any::<[u64; 4]>(), y in 1u64..) {
        let x = wide(x);
        let (quotient, remainder) = x.checked_div_rem(U256::from_u64(y)).unwrap();
        prop_assert_eq!(quotient, x.div_u64(y));
        prop_assert_eq!(remainder.low_u64(), x.rem_u64(y));
        prop_assert_eq!(quotient.wrapping_mul_u64(y) + remainder, x);
    }

    #[test]
    fn prop_multiply_then_divide(x in any::<u128>(), y in 1u128..) {
        let product = U256::from_u128(x) * U256::from_u128(y);
        prop_assert_eq!(product.checked_div(U256::from_u128(y)).unwrap(), U256::from_u128(x));
        prop_assert!(product.checked_rem(U256::from_u128(y)).unwrap().is_zero());
    }

    #[test]
    fn prop_pow_mod_matches_repeated_multiplication(
        base in any::<u64>(),
        exp in 0u64..64,
        modulus in 1u64..,
    ) {
        let mut expected = 1u128 % modulus as u128;
        for _ in 0..exp {
            expected = expected * base as u128 % modulus as u128;
        }
        let result = U256::from_u64(base).pow_mod(exp, U256::from_u64(modulus)).unwrap();
        prop_assert_eq!(result.to_u128(), Some(expected));
    }

    #[test]
    fn prop_add_sub_roundtrip(x in any::<[u64; 4]>(), y in any::<[u64; 4]>()) {
        let (x, y) = (wide(x), wide(y));
        prop_assert_eq!(x.wrapping_add(y).wrapping_sub(y), x);
    }

    #[test]
    fn prop_shift_matches_u128(x in any::<u128>(), bits in 0u32..128) {
        let value = U256::from_u128(x);
        prop_assert_eq!(value.shr_bits(bits).to_u128(), Some(x >> bits));
        prop_assert_eq!(value.shl_bits(bits).shr_bits(bits), value);
    }
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_division_by_zero() {
    assert_eq!(
        U256::from_u64(7).checked_div(U256::ZERO),
        Err(ArithmeticError::DivisionByZero)
    );
    assert_eq!(
        U256::from_u64(7).pow_mod(3, U256::ZERO),
        Err(ArithmeticError::DivisionByZero)
    );
}

#[test]
fn test_u64_division_by_zero_means_two_pow_64() {
    let x = U256::from_words(0x1234, 0x5678);
    assert_eq!(x.div_u64(0), U256::from_u64(0x5678));
    assert_eq!(x.rem_u64(0), 0x1234);
}

#[test]
fn test_msb_and_extremes() {
    assert_eq!(U256::ZERO.msb(), None);
    assert_eq!(U256::ONE.msb(), Some(0));
    assert_eq!(U256::MAX.msb(), Some(255));
    assert!(U256::MAX.is_msb_set());
    assert_eq!(U256::MAX.wrapping_add(U256::ONE), U256::ZERO);
    assert_eq!(U256::two_pow_64().msb(), Some(64));
}

#[test]
fn test_pow_mod_with_modulus_two_pow_64() {
    // 3^40 mod 2^64 computed with wrapping u64 arithmetic
    let expected = (0..40).fold(1u64, |acc, _| acc.wrapping_mul(3));
    let result = U256::from_u64(3).pow_mod(40, U256::from_modulus(0)).unwrap();
    assert_eq!(result.to_u64(), Some(expected));
}

#[test]
fn test_display_decimal() {
    assert_eq!(U256::ZERO.to_string(), "0");
    assert_eq!(
        U256::from_u128(u128::MAX).to_string(),
        "340282366920938463463374607431768211455"
    );
    assert_eq!(
        U256::MAX.to_string(),
        "115792089237316195423570985008687907853269984665640564039457584007913129639935"
    );
}
