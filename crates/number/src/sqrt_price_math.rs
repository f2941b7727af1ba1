//! Token amounts covered by a liquidity position between two sqrt prices and
//! the price reached after adding or removing an amount.

use {
    crate::{Error, Q96, Result, u256_ext::U256Ext},
    alloy::primitives::U256,
};

fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b { (b, a) } else { (a, b) }
}

/// Amount of token0 between two sqrt prices for the given liquidity:
/// `L * (sqrt_b - sqrt_a) / (sqrt_a * sqrt_b)`.
pub fn amount0_delta(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if lower.is_zero() {
        return Err(Error::DivisionByZero);
    }
    let numerator1 = U256::from(liquidity) << 96usize;
    let numerator2 = upper - lower;
    if round_up {
        numerator1
            .mul_div_ceil(&numerator2, &upper)?
            .checked_ceil_div(&lower)
            .ok_or(Error::Overflow)
    } else {
        Ok(numerator1.mul_div(&numerator2, &upper)? / lower)
    }
}

/// Amount of token1 between two sqrt prices for the given liquidity:
/// `L * (sqrt_b - sqrt_a)`.
pub fn amount1_delta(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    let liquidity = U256::from(liquidity);
    if round_up {
        liquidity.mul_div_ceil(&(upper - lower), &Q96)
    } else {
        liquidity.mul_div(&(upper - lower), &Q96)
    }
}

/// Price after moving `amount` of token0 into (`add`) or out of the pool.
/// Rounds up so the price moves less than the exact result would.
fn next_sqrt_price_from_amount0(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256> {
    if amount.is_zero() {
        return Ok(sqrt_price);
    }
    let numerator1 = U256::from(liquidity) << 96usize;
    let product = amount.checked_mul(sqrt_price);
    if add {
        if let Some(denominator) = product.and_then(|product| numerator1.checked_add(product)) {
            return numerator1.mul_div_ceil(&sqrt_price, &denominator);
        }
        let denominator = (numerator1 / sqrt_price)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        numerator1
            .checked_ceil_div(&denominator)
            .ok_or(Error::DivisionByZero)
    } else {
        let product = product.ok_or(Error::InsufficientLiquidity)?;
        if numerator1 <= product {
            return Err(Error::InsufficientLiquidity);
        }
        numerator1.mul_div_ceil(&sqrt_price, &(numerator1 - product))
    }
}

/// Price after moving `amount` of token1 into (`add`) or out of the pool.
/// Rounds down so the price moves less than the exact result would.
fn next_sqrt_price_from_amount1(
    sqrt_price: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256> {
    let liquidity = U256::from(liquidity);
    if add {
        let quotient = amount.mul_div(&Q96, &liquidity)?;
        sqrt_price.checked_add(quotient).ok_or(Error::Overflow)
    } else {
        let quotient = amount.mul_div_ceil(&Q96, &liquidity)?;
        if sqrt_price <= quotient {
            return Err(Error::InsufficientLiquidity);
        }
        Ok(sqrt_price - quotient)
    }
}

/// Price reached after swapping `amount_in` into the pool.
pub fn next_sqrt_price_from_input(
    sqrt_price: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256> {
    if sqrt_price.is_zero() || liquidity == 0 {
        return Err(Error::InsufficientLiquidity);
    }
    if zero_for_one {
        next_sqrt_price_from_amount0(sqrt_price, liquidity, amount_in, true)
    } else {
        next_sqrt_price_from_amount1(sqrt_price, liquidity, amount_in, true)
    }
}

/// Price reached after taking `amount_out` out of the pool.
pub fn next_sqrt_price_from_output(
    sqrt_price: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256> {
    if sqrt_price.is_zero() || liquidity == 0 {
        return Err(Error::InsufficientLiquidity);
    }
    if zero_for_one {
        next_sqrt_price_from_amount1(sqrt_price, liquidity, amount_out, false)
    } else {
        next_sqrt_price_from_amount0(sqrt_price, liquidity, amount_out, false)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::tick_math::sqrt_price_at_tick};

    fn e18(value: u64) -> U256 {
        U256::from(value) * U256::from(10u64).pow(U256::from(18u64))
    }

    #[test]
    fn amounts_for_unit_range() {
        // Between price 1 and price 1.21 (sqrt 1 to 1.1) with L = 1e18.
        let lower = Q96;
        let upper = Q96 * U256::from(11u64) / U256::from(10u64);
        let liquidity = 10u128.pow(18);

        let amount0 = amount0_delta(lower, upper, liquidity, true).unwrap();
        let amount0_down = amount0_delta(lower, upper, liquidity, false).unwrap();
        // 1e18 * 0.1 / 1.1
        assert_eq!(amount0, U256::from(90_909_090_909_090_910u64));
        assert_eq!(amount0_down, amount0 - U256::from(1u64));

        let amount1 = amount1_delta(lower, upper, liquidity, true).unwrap();
        assert_eq!(amount1, U256::from(100_000_000_000_000_000u64));
        // Argument order does not matter.
        assert_eq!(
            amount1_delta(upper, lower, liquidity, true).unwrap(),
            amount1
        );
    }

    #[test]
    fn zero_liquidity_covers_nothing() {
        let a = sqrt_price_at_tick(-600).unwrap();
        let b = sqrt_price_at_tick(600).unwrap();
        assert_eq!(amount0_delta(a, b, 0, true).unwrap(), U256::ZERO);
        assert_eq!(amount1_delta(a, b, 0, true).unwrap(), U256::ZERO);
    }

    #[test]
    fn input_moves_price_in_the_right_direction() {
        let price = Q96;
        let liquidity = 10u128.pow(18);
        let down = next_sqrt_price_from_input(price, liquidity, e18(1) / U256::from(10u64), true)
            .unwrap();
        let up = next_sqrt_price_from_input(price, liquidity, e18(1) / U256::from(10u64), false)
            .unwrap();
        assert!(down < price);
        assert!(up > price);
        // Adding 0.1 token1 at L = 1 moves the sqrt price by exactly 0.1.
        assert_eq!(up, Q96 + Q96 / U256::from(10u64));
    }

    #[test]
    fn input_and_amount_deltas_agree() {
        let price = sqrt_price_at_tick(1_000).unwrap();
        let liquidity = 5 * 10u128.pow(20);
        let amount_in = e18(3);
        let next = next_sqrt_price_from_input(price, liquidity, amount_in, true).unwrap();
        // The amount needed to reach the rounded price never exceeds the input.
        assert!(amount0_delta(next, price, liquidity, true).unwrap() <= amount_in);
    }

    #[test]
    fn output_larger_than_reserves_fails() {
        let price = Q96;
        let liquidity = 10u128.pow(18);
        assert_eq!(
            next_sqrt_price_from_output(price, liquidity, e18(2), false),
            Err(Error::InsufficientLiquidity)
        );
        assert_eq!(
            next_sqrt_price_from_output(price, liquidity, e18(2), true),
            Err(Error::InsufficientLiquidity)
        );
        assert_eq!(
            next_sqrt_price_from_input(price, 0, e18(2), true),
            Err(Error::InsufficientLiquidity)
        );
    }
}
