//! Checks and bookkeeping around every trade.

use {
    crate::{Auction, Error, Phase, rebalance},
    alloy::primitives::U256,
    amm::{Pool, Slot0, SwapParams, SwapResult},
    number::{
        FEE_DENOMINATOR,
        tick_math::{self, MAX_SQRT_PRICE, MIN_SQRT_PRICE},
        u256_ext::U256Ext,
    },
};

/// Input and output amounts of a swap from the trader's point of view.
fn swap_amounts(params: &SwapParams, result: &SwapResult) -> (U256, U256) {
    let (input, output) = if params.zero_for_one {
        (result.delta.amount0, result.delta.amount1)
    } else {
        (result.delta.amount1, result.delta.amount0)
    };
    (
        U256::from(input.max(0).unsigned_abs()),
        U256::from(output.min(0).unsigned_abs()),
    )
}

impl Auction {
    /// Amount of `amount_in` that counts as proceeds, the rest is fee.
    pub fn net_of_fee(&self, amount_in: U256) -> Result<U256, Error> {
        let denominator = U256::from(FEE_DENOMINATOR);
        Ok(amount_in.mul_div(
            &(denominator - U256::from(self.config.swap_fee)),
            &denominator,
        )?)
    }

    /// Largest gross numeraire input whose net amount still fits below the
    /// maximum proceeds. `None` if no purchase can reach the ceiling.
    fn purchase_cap(&self) -> Option<U256> {
        let remaining = self
            .config
            .maximum_proceeds
            .checked_sub(self.state.total_proceeds)?;
        let denominator = U256::from(FEE_DENOMINATOR);
        let net = denominator - U256::from(self.config.swap_fee);
        let bound = remaining
            .checked_add(U256::from(1u64))?
            .checked_mul(denominator)?;
        Some((bound - U256::from(1u64)) / net)
    }

    fn validate_price_limit(&self, pool: &Pool, params: &SwapParams) -> Result<(), Error> {
        let current = pool.slot0()?.sqrt_price;
        let limit = params.sqrt_price_limit;
        let valid = if params.zero_for_one {
            limit < current && limit >= MIN_SQRT_PRICE
        } else {
            limit > current && limit <= MAX_SQRT_PRICE
        };
        if !valid {
            return Err(Error::InvalidSqrtPriceLimit);
        }
        Ok(())
    }

    /// Runs the rebalances owed for the epochs that closed since the last
    /// trade.
    fn sync_epoch(&mut self, pool: &mut Pool, now: u64) -> Result<(), Error> {
        let epoch = self.config.epoch_at(now);
        if rebalance::catch_up(&self.config, &mut self.state, epoch)? {
            self.reposition(pool)?;
        }
        Ok(())
    }

    /// Shrinks a purchase so that its proceeds stop at the maximum.
    fn clamp_purchase(&self, pool: &Pool, params: &mut SwapParams) -> Result<(), Error> {
        let Some(cap) = self.purchase_cap() else {
            return Ok(());
        };
        let gross = if params.exact_in() {
            U256::from(params.amount_specified.unsigned_abs())
        } else {
            let simulated = pool.clone().swap(params)?;
            swap_amounts(params, &simulated).0
        };
        if gross > cap {
            let amount_specified = i128::try_from(cap).map_err(|_| number::Error::Overflow)?;
            tracing::debug!(
                requested = params.amount_specified,
                amount_specified,
                "clamped purchase to the maximum proceeds"
            );
            params.amount_specified = amount_specified;
        }
        Ok(())
    }

    pub(crate) fn before_swap(
        &mut self,
        pool: &mut Pool,
        now: u64,
        params: &mut SwapParams,
    ) -> Result<(), Error> {
        match self.phase {
            Phase::Uninitialized => return Err(Error::NotInitialized),
            Phase::Exited => return Err(Error::PoolAlreadyExited),
            Phase::Active | Phase::Matured | Phase::EarlyExited => (),
        }
        if self.in_flight {
            return Err(Error::Reentrant);
        }
        if !self.config.has_started(now) {
            return Err(Error::BeforeStartTime);
        }

        let purchase = self.config.is_purchase(params.zero_for_one);
        if self.config.has_ended(now) {
            if self.phase == Phase::Active {
                self.phase = Phase::Matured;
                tracing::info!(address = ?self.address, now, "auction matured");
            }
            if !self.state.early_exit_triggered && !self.state.minimum_proceeds_met(&self.config) {
                if purchase {
                    return Err(Error::InvalidSwapAfterMaturityInsufficientProceeds);
                }
                if !self.state.insufficient_proceeds {
                    self.place_refund_slug(pool)?;
                }
            }
        } else if !self.state.early_exit_triggered {
            self.sync_epoch(pool, now)?;
        }

        self.validate_price_limit(pool, params)?;
        if purchase {
            if self.state.early_exit_triggered {
                return Err(Error::MaximumProceedsReached);
            }
            self.clamp_purchase(pool, params)?;
        }
        self.in_flight = true;
        Ok(())
    }

    /// Whether the price moved past the cheap edge of the lower slug.
    fn below_floor(&self, slot0: &Slot0) -> Result<bool, Error> {
        let Some(lower) = self.slugs.lower() else {
            return Ok(false);
        };
        Ok(if self.config.is_token0 {
            slot0.sqrt_price < tick_math::sqrt_price_at_tick(lower.range.lower)?
        } else {
            slot0.sqrt_price > tick_math::sqrt_price_at_tick(lower.range.upper)?
        })
    }

    pub(crate) fn after_swap(
        &mut self,
        now: u64,
        params: &SwapParams,
        result: &SwapResult,
    ) -> Result<(), Error> {
        self.in_flight = false;
        let (amount_in, amount_out) = swap_amounts(params, result);
        let net = self.net_of_fee(amount_in)?;
        let input = usize::from(!params.zero_for_one);
        self.state.fees_accrued[input] += amount_in - net;

        if self.config.is_purchase(params.zero_for_one) {
            self.state.total_proceeds += net;
            self.state.total_tokens_sold += amount_out;
            if self.state.total_tokens_sold > self.config.num_tokens_to_sell {
                return Err(Error::SupplyExceeded);
            }
        } else {
            self.state.total_tokens_sold = self
                .state
                .total_tokens_sold
                .checked_sub(net)
                .ok_or(Error::SellBackExceedsSold)?;
            self.state.total_proceeds = self
                .state
                .total_proceeds
                .checked_sub(amount_out)
                .ok_or(Error::SellBackExceedsProceeds)?;
        }

        if self.below_floor(&result.slot0)? {
            return Err(Error::SwapBelowRange);
        }

        if !self.state.early_exit_triggered
            && self.state.total_proceeds >= self.config.maximum_proceeds
        {
            self.state.early_exit_triggered = true;
            if self.phase == Phase::Active {
                self.phase = Phase::EarlyExited;
            }
            tracing::info!(
                address = ?self.address,
                now,
                proceeds = %self.state.total_proceeds,
                "maximum proceeds reached"
            );
        }
        tracing::trace!(
            amount_in = %amount_in,
            amount_out = %amount_out,
            sold = %self.state.total_tokens_sold,
            proceeds = %self.state.total_proceeds,
            "settled swap"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::config::tests::example,
        alloy::primitives::Address,
        amm::{PoolKey, TokenPair},
    };

    fn active(is_token0: bool) -> (Auction, Pool) {
        let config = example(is_token0);
        let low = Address::repeat_byte(0x01);
        let high = Address::repeat_byte(0x02);
        let (asset, numeraire) = if is_token0 { (low, high) } else { (high, low) };
        let mut pool = Pool::new(PoolKey {
            tokens: TokenPair::new(asset, numeraire).unwrap(),
            fee: config.swap_fee,
            tick_spacing: config.tick_spacing,
        })
        .unwrap();
        pool.initialize(tick_math::sqrt_price_at_tick(0).unwrap())
            .unwrap();
        let mut auction = Auction::new(config, asset, numeraire, Address::repeat_byte(0xaa)).unwrap();
        auction.initialize(&mut pool, 0).unwrap();
        (auction, pool)
    }

    fn buy(auction: &Auction, amount: i128) -> SwapParams {
        let zero_for_one = !auction.config.is_token0;
        SwapParams {
            zero_for_one,
            amount_specified: amount,
            sqrt_price_limit: if zero_for_one {
                MIN_SQRT_PRICE
            } else {
                MAX_SQRT_PRICE
            },
        }
    }

    #[test]
    fn fee_split() {
        let (auction, _) = active(true);
        assert_eq!(
            auction.net_of_fee(U256::from(1_000_000u64)).unwrap(),
            U256::from(997_000u64)
        );
        assert_eq!(auction.net_of_fee(U256::from(1u64)).unwrap(), U256::ZERO);
    }

    #[test]
    fn purchase_cap_leaves_net_exactly_at_the_ceiling() {
        let (mut auction, _) = active(true);
        auction.state.total_proceeds = auction.config.maximum_proceeds - U256::from(1_000u64);
        let cap = auction.purchase_cap().unwrap();
        assert_eq!(auction.net_of_fee(cap).unwrap(), U256::from(1_000u64));
        assert_eq!(
            auction.net_of_fee(cap + U256::from(1u64)).unwrap(),
            U256::from(1_001u64)
        );
    }

    #[test]
    fn trading_before_start_is_rejected() {
        let (mut auction, mut pool) = active(true);
        let mut params = buy(&auction, 1_000);
        assert_eq!(
            auction.before_swap(&mut pool, 999, &mut params),
            Err(Error::BeforeStartTime)
        );
    }

    #[test]
    fn nested_swaps_are_rejected() {
        let (mut auction, mut pool) = active(true);
        let mut params = buy(&auction, 1_000);
        auction.before_swap(&mut pool, 1_000, &mut params).unwrap();
        assert_eq!(
            auction.before_swap(&mut pool, 1_000, &mut params),
            Err(Error::Reentrant)
        );
    }

    #[test]
    fn price_limit_on_the_wrong_side_is_rejected() {
        let (mut auction, mut pool) = active(false);
        let mut params = buy(&auction, 1_000);
        params.sqrt_price_limit = MAX_SQRT_PRICE;
        assert_eq!(
            auction.before_swap(&mut pool, 1_000, &mut params),
            Err(Error::InvalidSqrtPriceLimit)
        );
    }

    #[test]
    fn exact_in_purchase_is_clamped_at_the_ceiling() {
        let (mut auction, mut pool) = active(true);
        auction.state.total_proceeds = auction.config.maximum_proceeds - U256::from(997u64);
        let mut params = buy(&auction, 10i128.pow(18));
        auction.before_swap(&mut pool, 1_000, &mut params).unwrap();
        assert_eq!(params.amount_specified, 1_000);
    }

    #[test]
    fn exact_out_purchase_becomes_exact_in_at_the_ceiling() {
        let (mut auction, mut pool) = active(true);
        auction.state.total_proceeds = auction.config.maximum_proceeds - U256::from(997u64);
        let mut params = buy(&auction, -(10i128.pow(18)));
        auction.before_swap(&mut pool, 1_000, &mut params).unwrap();
        assert_eq!(params.amount_specified, 1_000);
        assert!(params.exact_in());
    }

    #[test]
    fn sell_back_accounting() {
        let (mut auction, _) = active(true);
        auction.state.total_tokens_sold = U256::from(10_000u64);
        auction.state.total_proceeds = U256::from(5_000u64);
        auction.in_flight = true;
        // Sell 1000 asset (token0) for 400 numeraire.
        let params = SwapParams {
            zero_for_one: true,
            amount_specified: 1_000,
            sqrt_price_limit: MIN_SQRT_PRICE,
        };
        let result = SwapResult {
            delta: amm::BalanceDelta {
                amount0: 1_000,
                amount1: -400,
            },
            fee_amount: U256::from(3u64),
            slot0: Slot0 {
                sqrt_price: tick_math::sqrt_price_at_tick(1_600).unwrap(),
                tick: 1_600,
            },
        };
        auction.after_swap(1_000, &params, &result).unwrap();
        assert!(!auction.in_flight);
        assert_eq!(auction.state.total_tokens_sold, U256::from(9_003u64));
        assert_eq!(auction.state.total_proceeds, U256::from(4_600u64));
        assert_eq!(auction.state.fees_accrued, [U256::from(3u64), U256::ZERO]);
    }

    #[test]
    fn sell_back_without_purchases_cannot_underflow() {
        let (mut auction, _) = active(false);
        let params = SwapParams {
            zero_for_one: false,
            amount_specified: 1_000,
            sqrt_price_limit: MAX_SQRT_PRICE,
        };
        let result = SwapResult {
            delta: amm::BalanceDelta {
                amount0: -10,
                amount1: 1_000,
            },
            fee_amount: U256::from(3u64),
            slot0: Slot0 {
                sqrt_price: tick_math::sqrt_price_at_tick(-1_600).unwrap(),
                tick: -1_600,
            },
        };
        assert_eq!(
            auction.after_swap(1_000, &params, &result),
            Err(Error::SellBackExceedsSold)
        );
    }

    #[test]
    fn crossing_the_floor_is_rejected() {
        let (mut auction, _) = active(true);
        let params = SwapParams {
            zero_for_one: true,
            amount_specified: 1,
            sqrt_price_limit: MIN_SQRT_PRICE,
        };
        let result = SwapResult {
            delta: Default::default(),
            fee_amount: U256::ZERO,
            slot0: Slot0 {
                sqrt_price: tick_math::sqrt_price_at_tick(1_000).unwrap(),
                tick: 1_000,
            },
        };
        assert_eq!(
            auction.after_swap(1_000, &params, &result),
            Err(Error::SwapBelowRange)
        );
    }

    #[test]
    fn reaching_the_ceiling_triggers_early_exit() {
        let (mut auction, _) = active(true);
        auction.state.total_proceeds = auction.config.maximum_proceeds - U256::from(997u64);
        let params = buy(&auction, 1_000);
        let result = SwapResult {
            delta: amm::BalanceDelta {
                amount0: -900,
                amount1: 1_000,
            },
            fee_amount: U256::from(3u64),
            slot0: Slot0 {
                sqrt_price: tick_math::sqrt_price_at_tick(1_601).unwrap(),
                tick: 1_601,
            },
        };
        auction.after_swap(1_000, &params, &result).unwrap();
        assert!(auction.state.early_exit_triggered);
        assert_eq!(auction.phase, Phase::EarlyExited);
    }
}
