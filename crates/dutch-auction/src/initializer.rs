//! Creation and hand-off of auction pools on behalf of a token factory.

use {
    crate::{Auction, AuctionConfig, Error, ExitReport},
    alloy::{
        primitives::{Address, B256, U256, keccak256},
        sol_types::SolValue,
    },
    amm::{HookedPool, PoolKey, SwapParams, SwapResult, TokenPair},
    number::tick_math,
    std::collections::HashMap,
};

/// What a token factory needs from a liquidity module: seed a pool with a
/// fresh supply and later release whatever the pool holds.
pub trait PoolInitializer {
    /// Creates and seeds a pool selling `supply` of `asset` for `numeraire`.
    /// `data` carries the ABI encoded parameters of the sale.
    fn initialize(
        &mut self,
        asset: Address,
        numeraire: Address,
        supply: U256,
        salt: B256,
        data: &[u8],
        now: u64,
    ) -> Result<Address, Error>;

    /// Withdraws all liquidity of the pool and reports what was released.
    fn exit_liquidity(&mut self, pool: Address, now: u64) -> Result<ExitReport, Error>;
}

/// Deterministic handle of the pool for a token pair and salt.
pub fn pool_handle(asset: Address, numeraire: Address, salt: B256) -> Address {
    Address::from_word(keccak256((asset, numeraire, salt).abi_encode()))
}

/// Runs Dutch auction pools, one per handle.
#[derive(Debug, Default)]
pub struct DutchAuctionInitializer {
    pools: HashMap<Address, HookedPool<Auction>>,
}

impl DutchAuctionInitializer {
    pub fn pool(&self, handle: &Address) -> Option<&HookedPool<Auction>> {
        self.pools.get(handle)
    }

    fn pool_mut(&mut self, handle: &Address) -> Result<&mut HookedPool<Auction>, Error> {
        self.pools
            .get_mut(handle)
            .ok_or(Error::UnknownPool(*handle))
    }

    /// Trades against the pool behind `handle`.
    pub fn swap(
        &mut self,
        handle: &Address,
        now: u64,
        params: SwapParams,
    ) -> Result<SwapResult, Error> {
        self.pool_mut(handle)?.swap(now, params)
    }
}

impl PoolInitializer for DutchAuctionInitializer {
    fn initialize(
        &mut self,
        asset: Address,
        numeraire: Address,
        supply: U256,
        salt: B256,
        data: &[u8],
        now: u64,
    ) -> Result<Address, Error> {
        let config = AuctionConfig::from_init_data(supply, data)?;
        let tokens = TokenPair::new(asset, numeraire).ok_or(Error::InvalidTokenOrder)?;
        if (tokens.get().0 == asset) != config.is_token0 {
            return Err(Error::InvalidTokenOrder);
        }
        let handle = pool_handle(asset, numeraire, salt);
        if self.pools.contains_key(&handle) {
            return Err(Error::AlreadyInitialized);
        }

        let key = PoolKey {
            tokens,
            fee: config.swap_fee,
            tick_spacing: config.tick_spacing,
        };
        let sqrt_price = tick_math::sqrt_price_at_tick(config.starting_tick)?;
        let auction = Auction::new(config, asset, numeraire, handle)?;
        let mut pool = HookedPool::new(key, auction)?;
        pool.initialize(sqrt_price, now)?;
        self.pools.insert(handle, pool);
        tracing::info!(?handle, ?asset, ?numeraire, %supply, "created auction pool");
        Ok(handle)
    }

    fn exit_liquidity(&mut self, handle: Address, now: u64) -> Result<ExitReport, Error> {
        self.pool_mut(&handle)?
            .with_hook(|auction, pool| auction.exit(pool, now))
    }
}
