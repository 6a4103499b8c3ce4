//! Fixed-width 256-bit unsigned integer
//!
//! Four 64-bit limbs, least significant first. Addition, subtraction and
//! multiplication wrap modulo 2^256; division is exact.
//!
//! # Critical Invariants
//!
//! 1. Values are always non-negative. Callers that need signed intermediates
//!    work modulo 2^256 and inspect [`U256::is_msb_set`].
//! 2. `div_u64(0)` / `rem_u64(0)` treat the zero divisor as 2^64, the same
//!    convention generator moduli use.
//! 3. Division by a zero `U256` is an error, never a panic.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Shl, Shr, Sub};

use super::ArithmeticError;

const LIMBS: usize = 4;

/// 256-bit unsigned integer
///
/// # Example
/// ```
/// use seedsleuth_core::arith::U256;
///
/// let n = U256::from_u64(1 << 31);
/// let product = n * U256::from_u64(214013 - 1);
/// assert_eq!(product.div_u64(214013 - 1), n);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct U256 {
    limbs: [u64; LIMBS],
}

impl U256 {
    pub const ZERO: U256 = U256 { limbs: [0; LIMBS] };
    pub const ONE: U256 = U256 {
        limbs: [1, 0, 0, 0],
    };
    pub const MAX: U256 = U256 {
        limbs: [u64::MAX; LIMBS],
    };

    pub const fn from_u64(value: u64) -> Self {
        Self {
            limbs: [value, 0, 0, 0],
        }
    }

    /// Build from a low and a high 64-bit word (`high·2^64 + low`)
    pub const fn from_words(low: u64, high: u64) -> Self {
        Self {
            limbs: [low, high, 0, 0],
        }
    }

    pub const fn from_u128(value: u128) -> Self {
        Self::from_words(value as u64, (value >> 64) as u64)
    }

    pub const fn from_limbs(limbs: [u64; LIMBS]) -> Self {
        Self { limbs }
    }

    pub const fn limbs(&self) -> [u64; LIMBS] {
        self.limbs
    }

    /// 2^64, the modulus denoted by `0` in generator constants
    pub const fn two_pow_64() -> Self {
        Self::from_words(0, 1)
    }

    /// Turn a generator modulus (0 meaning 2^64) into a `U256`
    pub const fn from_modulus(modulus: u64) -> Self {
        if modulus == 0 {
            Self::two_pow_64()
        } else {
            Self::from_u64(modulus)
        }
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&limb| limb == 0)
    }

    pub fn is_msb_set(&self) -> bool {
        self.limbs[LIMBS - 1] >> 63 == 1
    }

    /// Index of the most significant set bit, `None` for zero
    pub fn msb(&self) -> Option<u32> {
        self.limbs
            .iter()
            .enumerate()
            .rev()
            .find(|(_, &limb)| limb != 0)
            .map(|(i, &limb)| i as u32 * 64 + 63 - limb.leading_zeros())
    }

    /// Test bit `index` (bits past 255 read as zero)
    pub fn bit(&self, index: u32) -> bool {
        if index >= 256 {
            return false;
        }
        (self.limbs[(index / 64) as usize] >> (index % 64)) & 1 == 1
    }

    fn with_bit(mut self, index: u32) -> Self {
        self.limbs[(index / 64) as usize] |= 1 << (index % 64);
        self
    }

    /// Truncate to the low 64 bits
    pub fn low_u64(&self) -> u64 {
        self.limbs[0]
    }

    pub fn to_u64(&self) -> Option<u64> {
        if self.limbs[1..].iter().all(|&limb| limb == 0) {
            Some(self.limbs[0])
        } else {
            None
        }
    }

    pub fn to_u128(&self) -> Option<u128> {
        if self.limbs[2..].iter().all(|&limb| limb == 0) {
            Some(((self.limbs[1] as u128) << 64) | self.limbs[0] as u128)
        } else {
            None
        }
    }

    pub fn cmp_u64(&self, other: u64) -> Ordering {
        self.cmp(&U256::from_u64(other))
    }

    pub fn wrapping_add(self, rhs: U256) -> U256 {
        let mut out = [0u64; LIMBS];
        let mut carry = false;
        for (i, slot) in out.iter_mut().enumerate() {
            let (sum, c1) = self.limbs[i].overflowing_add(rhs.limbs[i]);
            let (sum, c2) = sum.overflowing_add(carry as u64);
            *slot = sum;
            carry = c1 || c2;
        }
        U256 { limbs: out }
    }

    pub fn wrapping_sub(self, rhs: U256) -> U256 {
        let mut out = [0u64; LIMBS];
        let mut borrow = false;
        for (i, slot) in out.iter_mut().enumerate() {
            let (diff, b1) = self.limbs[i].overflowing_sub(rhs.limbs[i]);
            let (diff, b2) = diff.overflowing_sub(borrow as u64);
            *slot = diff;
            borrow = b1 || b2;
        }
        U256 { limbs: out }
    }

    /// Schoolbook multiplication truncated to 256 bits
    pub fn wrapping_mul(self, rhs: U256) -> U256 {
        let mut out = [0u64; LIMBS];
        for i in 0..LIMBS {
            if self.limbs[i] == 0 {
                continue;
            }
            let mut carry: u128 = 0;
            for j in 0..(LIMBS - i) {
                let cur = out[i + j] as u128
                    + (self.limbs[i] as u128) * (rhs.limbs[j] as u128)
                    + carry;
                out[i + j] = cur as u64;
                carry = cur >> 64;
            }
        }
        U256 { limbs: out }
    }

    pub fn wrapping_mul_u64(self, rhs: u64) -> U256 {
        self.wrapping_mul(U256::from_u64(rhs))
    }

    pub fn square(self) -> U256 {
        self.wrapping_mul(self)
    }

    pub fn shl_bits(self, bits: u32) -> U256 {
        if bits >= 256 {
            return U256::ZERO;
        }
        let words = (bits / 64) as usize;
        let shift = bits % 64;
        let mut out = [0u64; LIMBS];
        for i in words..LIMBS {
            let src = i - words;
            out[i] = self.limbs[src] << shift;
            if shift > 0 && src > 0 {
                out[i] |= self.limbs[src - 1] >> (64 - shift);
            }
        }
        U256 { limbs: out }
    }

    pub fn shr_bits(self, bits: u32) -> U256 {
        if bits >= 256 {
            return U256::ZERO;
        }
        let words = (bits / 64) as usize;
        let shift = bits % 64;
        let mut out = [0u64; LIMBS];
        for (i, slot) in out.iter_mut().enumerate().take(LIMBS - words) {
            let src = i + words;
            *slot = self.limbs[src] >> shift;
            if shift > 0 && src + 1 < LIMBS {
                *slot |= self.limbs[src + 1] << (64 - shift);
            }
        }
        U256 { limbs: out }
    }

    /// Quotient and remainder by a non-zero 64-bit divisor, limb by limb
    fn div_rem_small(self, divisor: u64) -> (U256, u64) {
        debug_assert!(divisor != 0);
        let divisor = divisor as u128;
        let mut quotient = [0u64; LIMBS];
        let mut rem: u128 = 0;
        for i in (0..LIMBS).rev() {
            let cur = (rem << 64) | self.limbs[i] as u128;
            quotient[i] = (cur / divisor) as u64;
            rem = cur % divisor;
        }
        (U256 { limbs: quotient }, rem as u64)
    }

    /// Divide by a 64-bit value; `0` divides by 2^64
    pub fn div_u64(self, divisor: u64) -> U256 {
        if divisor == 0 {
            return self.shr_bits(64);
        }
        if divisor.is_power_of_two() {
            return self.shr_bits(divisor.trailing_zeros());
        }
        self.div_rem_small(divisor).0
    }

    /// Remainder by a 64-bit value; `0` reduces modulo 2^64
    pub fn rem_u64(self, divisor: u64) -> u64 {
        if divisor == 0 {
            return self.low_u64();
        }
        self.div_rem_small(divisor).1
    }

    /// Shift-subtract long division
    ///
    /// # Errors
    /// [`ArithmeticError::DivisionByZero`] when `divisor` is zero.
    pub fn checked_div_rem(self, divisor: U256) -> Result<(U256, U256), ArithmeticError> {
        let divisor_msb = divisor.msb().ok_or(ArithmeticError::DivisionByZero)?;
        if self < divisor {
            return Ok((U256::ZERO, self));
        }
        if let Some(small) = divisor.to_u64() {
            let (q, r) = self.div_rem_small(small);
            return Ok((q, U256::from_u64(r)));
        }

        // self >= divisor > 0, so self has a top bit
        let shift = self.msb().unwrap_or(0) - divisor_msb;
        let mut shifted = divisor.shl_bits(shift);
        let mut rem = self;
        let mut quotient = U256::ZERO;
        for bit in (0..=shift).rev() {
            if rem >= shifted {
                rem = rem.wrapping_sub(shifted);
                quotient = quotient.with_bit(bit);
            }
            shifted = shifted.shr_bits(1);
        }
        Ok((quotient, rem))
    }

    pub fn checked_div(self, divisor: U256) -> Result<U256, ArithmeticError> {
        Ok(self.checked_div_rem(divisor)?.0)
    }

    pub fn checked_rem(self, divisor: U256) -> Result<U256, ArithmeticError> {
        Ok(self.checked_div_rem(divisor)?.1)
    }

    /// `self^exp` modulo 2^256
    pub fn wrapping_pow(self, exp: u64) -> U256 {
        let mut result = U256::ONE;
        let mut base = self;
        let mut exp = exp;
        while exp > 0 {
            if exp & 1 == 1 {
                result = result.wrapping_mul(base);
            }
            base = base.square();
            exp >>= 1;
        }
        result
    }

    /// `self^exp mod modulus`, scanning the exponent from its top bit down
    ///
    /// Exact as long as `modulus < 2^128` (every square fits in 256 bits).
    ///
    /// # Example
    /// ```
    /// use seedsleuth_core::arith::U256;
    ///
    /// let m = U256::from_u64(1_000_000_007);
    /// let r = U256::from_u64(2).pow_mod(10, m).unwrap();
    /// assert_eq!(r, U256::from_u64(1024));
    /// ```
    pub fn pow_mod(self, exp: u64, modulus: U256) -> Result<U256, ArithmeticError> {
        let base = self.checked_rem(modulus)?;
        let mut acc = U256::ONE.checked_rem(modulus)?;
        if exp == 0 {
            return Ok(acc);
        }
        let top = 63 - exp.leading_zeros();
        for bit in (0..=top).rev() {
            acc = acc.square().checked_rem(modulus)?;
            if (exp >> bit) & 1 == 1 {
                acc = acc.wrapping_mul(base).checked_rem(modulus)?;
            }
        }
        Ok(acc)
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        for i in (0..LIMBS).rev() {
            match self.limbs[i].cmp(&other.limbs[i]) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        U256::from_u64(value)
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        U256::from_u128(value)
    }
}

impl Add for U256 {
    type Output = U256;
    fn add(self, rhs: U256) -> U256 {
        self.wrapping_add(rhs)
    }
}

impl Sub for U256 {
    type Output = U256;
    fn sub(self, rhs: U256) -> U256 {
        self.wrapping_sub(rhs)
    }
}

impl Mul for U256 {
    type Output = U256;
    fn mul(self, rhs: U256) -> U256 {
        self.wrapping_mul(rhs)
    }
}

impl Shl<u32> for U256 {
    type Output = U256;
    fn shl(self, bits: u32) -> U256 {
        self.shl_bits(bits)
    }
}

impl Shr<u32> for U256 {
    type Output = U256;
    fn shr(self, bits: u32) -> U256 {
        self.shr_bits(bits)
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const CHUNK: u64 = 10_000_000_000_000_000_000; // 10^19
        if self.is_zero() {
            return f.pad("0");
        }
        let mut chunks = Vec::new();
        let mut rest = *self;
        while !rest.is_zero() {
            let (q, r) = rest.div_rem_small(CHUNK);
            chunks.push(r);
            rest = q;
        }
        let mut text = String::new();
        for (i, chunk) in chunks.iter().rev().enumerate() {
            if i == 0 {
                text.push_str(&chunk.to_string());
            } else {
                text.push_str(&format!("{:019}", chunk));
            }
        }
        f.pad(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_carries_across_limbs() {
        let a = U256::from_u64(u64::MAX);
        assert_eq!(a + U256::ONE, U256::from_words(0, 1));
        assert_eq!(U256::MAX + U256::ONE, U256::ZERO);
    }

    #[test]
    fn test_sub_borrows_across_limbs() {
        assert_eq!(U256::from_words(0, 1) - U256::ONE, U256::from_u64(u64::MAX));
        assert_eq!(U256::ZERO - U256::ONE, U256::MAX);
        assert!((U256::ZERO - U256::ONE).is_msb_set());
    }

    #[test]
    fn test_mul_full_width() {
        let a = U256::from_u64(u64::MAX);
        let product = a * a;
        assert_eq!(product.to_u128(), Some((u64::MAX as u128) * (u64::MAX as u128)));
    }

    #[test]
    fn test_shifts() {
        let one = U256::ONE;
        assert_eq!((one << 200) >> 200, one);
        assert_eq!(one << 256, U256::ZERO);
        assert_eq!((one << 64).limbs(), [0, 1, 0, 0]);
        assert_eq!(U256::from_u64(0b1011) >> 1, U256::from_u64(0b101));
    }

    #[test]
    fn test_msb() {
        assert_eq!(U256::ZERO.msb(), None);
        assert_eq!(U256::ONE.msb(), Some(0));
        assert_eq!((U256::ONE << 130).msb(), Some(130));
        assert_eq!(U256::MAX.msb(), Some(255));
    }

    #[test]
    fn test_div_u64_zero_means_two_pow_64() {
        let value = U256::from_words(5, 7);
        assert_eq!(value.div_u64(0), U256::from_u64(7));
        assert_eq!(value.rem_u64(0), 5);
    }

    #[test]
    fn test_div_by_zero_u256_is_error() {
        let value = U256::from_u64(10);
        assert_eq!(
            value.checked_div(U256::ZERO),
            Err(ArithmeticError::DivisionByZero)
        );
        assert_eq!(
            value.checked_rem(U256::ZERO),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn test_long_division() {
        let divisor = U256::from_words(3, 1); // 2^64 + 3
        let dividend = divisor * U256::from_words(12345, 678) + U256::from_u64(17);
        let (q, r) = dividend.checked_div_rem(divisor).unwrap();
        assert_eq!(q, U256::from_words(12345, 678));
        assert_eq!(r, U256::from_u64(17));
    }

    #[test]
    fn test_pow_mod_small() {
        let m = U256::from_u64(1 << 31);
        let r = U256::from_u64(214013).pow_mod(3, m).unwrap();
        let expected = (214013u128.pow(3) % (1u128 << 31)) as u64;
        assert_eq!(r, U256::from_u64(expected));
        assert_eq!(U256::from_u64(7).pow_mod(0, U256::ONE).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_display_decimal() {
        assert_eq!(U256::ZERO.to_string(), "0");
        assert_eq!(U256::from_u64(12345).to_string(), "12345");
        assert_eq!(
            U256::two_pow_64().to_string(),
            "18446744073709551616"
        );
        assert_eq!(
            (U256::ONE << 128).to_string(),
            "340282366920938463463374607431768211456"
        );
    }
}
