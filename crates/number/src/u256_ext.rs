//! Extension trait for U256 arithmetic operations.

use {
    crate::{Error, Result},
    alloy::primitives::U256,
    num::{BigUint, Zero},
};

/// Extension trait for U256 to add utility methods.
pub trait U256Ext: Sized {
    /// Ceiling division: (self + other - 1) / other
    fn checked_ceil_div(&self, other: &Self) -> Option<Self>;

    /// Computes `self * mul / div` with a 512 bit intermediate, rounding
    /// down.
    fn mul_div(&self, mul: &Self, div: &Self) -> Result<Self>;

    /// Computes `self * mul / div` with a 512 bit intermediate, rounding
    /// up.
    fn mul_div_ceil(&self, mul: &Self, div: &Self) -> Result<Self>;

    /// Convert to BigUint.
    fn to_big_uint(&self) -> BigUint;

    /// Create from BigUint.
    fn from_big_uint(input: &BigUint) -> Result<Self>;
}

impl U256Ext for U256 {
    fn checked_ceil_div(&self, other: &Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        let quotient = self / other;
        if (self % other).is_zero() {
            Some(quotient)
        } else {
            quotient.checked_add(U256::from(1u64))
        }
    }

    fn mul_div(&self, mul: &Self, div: &Self) -> Result<Self> {
        if div.is_zero() {
            return Err(Error::DivisionByZero);
        }
        // Most calls stay within 256 bits, skip the big integer detour then.
        if let Some(product) = self.checked_mul(*mul) {
            return Ok(product / div);
        }
        let quotient = self.to_big_uint() * mul.to_big_uint() / div.to_big_uint();
        Self::from_big_uint(&quotient)
    }

    fn mul_div_ceil(&self, mul: &Self, div: &Self) -> Result<Self> {
        if div.is_zero() {
            return Err(Error::DivisionByZero);
        }
        if let Some(product) = self.checked_mul(*mul) {
            return product.checked_ceil_div(div).ok_or(Error::Overflow);
        }
        let product = self.to_big_uint() * mul.to_big_uint();
        let div = div.to_big_uint();
        let mut quotient = &product / &div;
        if !(product % div).is_zero() {
            quotient += 1u32;
        }
        Self::from_big_uint(&quotient)
    }

    fn to_big_uint(&self) -> BigUint {
        BigUint::from_bytes_be(self.to_be_bytes::<32>().as_slice())
    }

    fn from_big_uint(input: &BigUint) -> Result<Self> {
        let bytes = input.to_bytes_be();
        if bytes.len() > 32 {
            return Err(Error::Overflow);
        }
        Ok(U256::from_be_slice(&bytes))
    }
}
