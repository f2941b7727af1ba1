use {
    crate::{Auction, Error},
    alloy::primitives::Address,
    amm::{Hook, Pool, SwapParams, SwapResult, TickRange},
};

impl Hook for Auction {
    type Error = Error;

    fn after_initialize(&mut self, pool: &mut Pool, now: u64) -> Result<(), Error> {
        self.initialize(pool, now)
    }

    /// Only the auction itself provides liquidity to its pool.
    fn before_add_liquidity(
        &mut self,
        sender: Address,
        _: TickRange,
        _: &Pool,
    ) -> Result<(), Error> {
        if sender != self.address {
            return Err(Error::Unauthorized(sender));
        }
        Ok(())
    }

    fn before_swap(
        &mut self,
        pool: &mut Pool,
        now: u64,
        params: &mut SwapParams,
    ) -> Result<(), Error> {
        Auction::before_swap(self, pool, now, params)
    }

    fn after_swap(
        &mut self,
        _: &mut Pool,
        now: u64,
        params: &SwapParams,
        result: &SwapResult,
    ) -> Result<(), Error> {
        Auction::after_swap(self, now, params, result)
    }
}
