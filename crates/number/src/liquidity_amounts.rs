//! Liquidity needed to hold a token amount across a price range, and the
//! inverse.

use {
    crate::{Error, Q96, Result, sqrt_price_math, u256_ext::U256Ext},
    alloy::primitives::U256,
};

fn sorted(a: U256, b: U256) -> Result<(U256, U256)> {
    let (lower, upper) = if a > b { (b, a) } else { (a, b) };
    if lower == upper {
        return Err(Error::DivisionByZero);
    }
    Ok((lower, upper))
}

fn to_liquidity(value: U256) -> Result<u128> {
    u128::try_from(value).map_err(|_| Error::Overflow)
}

/// Largest liquidity whose token0 amount over the range does not exceed
/// `amount0`.
pub fn liquidity_for_amount0(sqrt_price_a: U256, sqrt_price_b: U256, amount0: U256) -> Result<u128> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b)?;
    let intermediate = lower.mul_div(&upper, &Q96)?;
    to_liquidity(amount0.mul_div(&intermediate, &(upper - lower))?)
}

/// Largest liquidity whose token1 amount over the range does not exceed
/// `amount1`.
pub fn liquidity_for_amount1(sqrt_price_a: U256, sqrt_price_b: U256, amount1: U256) -> Result<u128> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b)?;
    to_liquidity(amount1.mul_div(&Q96, &(upper - lower))?)
}

/// Token amounts represented by `liquidity` over `[sqrt_price_a,
/// sqrt_price_b]` at the current `sqrt_price`, rounded down.
pub fn amounts_for_liquidity(
    sqrt_price: U256,
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
) -> Result<(U256, U256)> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b)?;
    if sqrt_price <= lower {
        Ok((
            sqrt_price_math::amount0_delta(lower, upper, liquidity, false)?,
            U256::ZERO,
        ))
    } else if sqrt_price < upper {
        Ok((
            sqrt_price_math::amount0_delta(sqrt_price, upper, liquidity, false)?,
            sqrt_price_math::amount1_delta(lower, sqrt_price, liquidity, false)?,
        ))
    } else {
        Ok((
            U256::ZERO,
            sqrt_price_math::amount1_delta(lower, upper, liquidity, false)?,
        ))
    }
}
