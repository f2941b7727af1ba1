//! A single step of a swap within one constant-liquidity price interval.

use {
    crate::{FEE_DENOMINATOR, Result, sqrt_price_math, u256_ext::U256Ext},
    alloy::primitives::U256,
};

/// Outcome of swapping within a single liquidity interval.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SwapStep {
    /// Sqrt price after the step. Equals the target price if the interval
    /// was exhausted.
    pub sqrt_price_next: U256,
    /// Input consumed, excluding the fee.
    pub amount_in: U256,
    pub amount_out: U256,
    /// Fee charged on top of `amount_in`.
    pub fee_amount: U256,
}

/// Computes how far a swap gets between `sqrt_price_current` and
/// `sqrt_price_target` given the `amount_remaining`, which is an input
/// amount when `exact_in` is set and an output amount otherwise. The swap
/// direction follows from the order of the two prices. `fee_pips` is
/// charged on the input and expressed over [`FEE_DENOMINATOR`].
pub fn compute_swap_step(
    sqrt_price_current: U256,
    sqrt_price_target: U256,
    liquidity: u128,
    amount_remaining: U256,
    exact_in: bool,
    fee_pips: u32,
) -> Result<SwapStep> {
    let zero_for_one = sqrt_price_current >= sqrt_price_target;
    let denominator = U256::from(FEE_DENOMINATOR);
    let fee = U256::from(fee_pips);

    let amount_in_to_target = || {
        if zero_for_one {
            sqrt_price_math::amount0_delta(sqrt_price_target, sqrt_price_current, liquidity, true)
        } else {
            sqrt_price_math::amount1_delta(sqrt_price_current, sqrt_price_target, liquidity, true)
        }
    };
    let amount_out_to_target = || {
        if zero_for_one {
            sqrt_price_math::amount1_delta(sqrt_price_target, sqrt_price_current, liquidity, false)
        } else {
            sqrt_price_math::amount0_delta(sqrt_price_current, sqrt_price_target, liquidity, false)
        }
    };

    let mut amount_in = U256::ZERO;
    let mut amount_out = U256::ZERO;
    let sqrt_price_next = if exact_in {
        let remaining_less_fee = amount_remaining.mul_div(&(denominator - fee), &denominator)?;
        amount_in = amount_in_to_target()?;
        if remaining_less_fee >= amount_in {
            sqrt_price_target
        } else {
            sqrt_price_math::next_sqrt_price_from_input(
                sqrt_price_current,
                liquidity,
                remaining_less_fee,
                zero_for_one,
            )?
        }
    } else {
        amount_out = amount_out_to_target()?;
        if amount_remaining >= amount_out {
            sqrt_price_target
        } else {
            sqrt_price_math::next_sqrt_price_from_output(
                sqrt_price_current,
                liquidity,
                amount_remaining,
                zero_for_one,
            )?
        }
    };

    let reached_target = sqrt_price_next == sqrt_price_target;
    if zero_for_one {
        if !(reached_target && exact_in) {
            amount_in = sqrt_price_math::amount0_delta(
                sqrt_price_next,
                sqrt_price_current,
                liquidity,
                true,
            )?;
        }
        if !(reached_target && !exact_in) {
            amount_out = sqrt_price_math::amount1_delta(
                sqrt_price_next,
                sqrt_price_current,
                liquidity,
                false,
            )?;
        }
    } else {
        if !(reached_target && exact_in) {
            amount_in = sqrt_price_math::amount1_delta(
                sqrt_price_current,
                sqrt_price_next,
                liquidity,
                true,
            )?;
        }
        if !(reached_target && !exact_in) {
            amount_out = sqrt_price_math::amount0_delta(
                sqrt_price_current,
                sqrt_price_next,
                liquidity,
                false,
            )?;
        }
    }

    if !exact_in && amount_out > amount_remaining {
        amount_out = amount_remaining;
    }

    let fee_amount = if exact_in && !reached_target {
        // The whole remainder is taken, whatever is not swapped is the fee.
        amount_remaining - amount_in
    } else {
        amount_in.mul_div_ceil(&fee, &(denominator - fee))?
    };

    Ok(SwapStep {
        sqrt_price_next,
        amount_in,
        amount_out,
        fee_amount,
    })
}
