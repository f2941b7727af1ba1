use {
    crate::{
        AuctionConfig,
        AuctionState,
        Error,
        Phase,
        exit::ExitReport,
        slug::{self, Funds, Slug, SlugSet},
    },
    alloy::primitives::{Address, U256},
    amm::{BalanceDelta, Pool, SwapParams},
    number::tick_math,
};

/// A sale: its parameters, running totals, the slugs it currently holds in
/// the pool and the tokens it holds outside of the pool.
///
/// The auction acts as the hook of its pool and owns every position in it.
#[derive(Clone, Debug)]
pub struct Auction {
    pub(crate) config: AuctionConfig,
    pub(crate) state: AuctionState,
    pub(crate) phase: Phase,
    pub(crate) slugs: SlugSet,
    /// Tokens held by the auction itself, indexed like the pool tokens.
    pub(crate) balances: [U256; 2],
    pub(crate) asset: Address,
    pub(crate) numeraire: Address,
    /// Owner of the auction's pool positions.
    pub(crate) address: Address,
    pub(crate) in_flight: bool,
    pub(crate) exit_report: Option<ExitReport>,
}

impl Auction {
    /// Creates an auction funded with the whole supply. It becomes active
    /// once its pool is initialized.
    pub fn new(
        config: AuctionConfig,
        asset: Address,
        numeraire: Address,
        address: Address,
    ) -> Result<Self, Error> {
        config.validate()?;
        if asset == numeraire || (asset < numeraire) != config.is_token0 {
            return Err(Error::InvalidTokenOrder);
        }
        let mut balances = [U256::ZERO; 2];
        balances[config.asset_index()] = config.num_tokens_to_sell;
        Ok(Self {
            config,
            state: AuctionState::default(),
            phase: Phase::Uninitialized,
            slugs: SlugSet::default(),
            balances,
            asset,
            numeraire,
            address,
            in_flight: false,
            exit_report: None,
        })
    }

    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    pub fn state(&self) -> &AuctionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn slugs(&self) -> &[Slug] {
        self.slugs.as_slice()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Tokens held outside of the pool, indexed like the pool tokens.
    pub fn balances(&self) -> [U256; 2] {
        self.balances
    }

    /// The report of the exit, once it happened.
    pub fn exit_report(&self) -> Option<&ExitReport> {
        self.exit_report.as_ref()
    }

    /// Epoch the auction has rebalanced up to. Only trades advance it, see
    /// [`AuctionConfig::epoch_at`] for the epoch at a given time.
    pub fn last_synced_epoch(&self) -> u64 {
        self.state.last_synced_epoch
    }

    /// Asset held by the slugs at the pool's current price.
    pub fn asset_inventory(&self, pool: &Pool) -> Result<U256, Error> {
        self.slugs
            .asset_inventory(&self.config, pool.slot0()?.sqrt_price)
    }

    /// Books token movements between the auction and the pool.
    fn settle(&mut self, delta: BalanceDelta) -> Result<(), Error> {
        for (index, amount) in [delta.amount0, delta.amount1].into_iter().enumerate() {
            let amount_abs = U256::from(amount.unsigned_abs());
            let balance = &mut self.balances[index];
            if amount > 0 {
                *balance = balance
                    .checked_sub(amount_abs)
                    .ok_or(Error::InsufficientBalance(index))?;
            } else {
                *balance += amount_abs;
            }
        }
        Ok(())
    }

    /// Pulls every slug out of the pool and collects the swap fees.
    pub(crate) fn withdraw_slugs(&mut self, pool: &mut Pool) -> Result<(), Error> {
        let slugs = self.slugs;
        for slug in slugs.iter() {
            if slug.liquidity == 0 {
                continue;
            }
            let liquidity = i128::try_from(slug.liquidity).map_err(|_| number::Error::Overflow)?;
            let delta = pool.modify_liquidity(self.address, slug.range, -liquidity)?;
            self.settle(delta)?;
        }
        let (fees0, fees1) = pool.collect_fees();
        self.balances[0] += fees0;
        self.balances[1] += fees1;
        self.slugs.clear();
        Ok(())
    }

    /// Funds and places `slugs`. The pool must not hold any other slug.
    pub(crate) fn place_slugs(&mut self, pool: &mut Pool, slugs: SlugSet) -> Result<(), Error> {
        for slug in slugs.iter().filter(|slug| slug.liquidity > 0) {
            let liquidity = i128::try_from(slug.liquidity).map_err(|_| number::Error::Overflow)?;
            let delta = pool.modify_liquidity(self.address, slug.range, liquidity)?;
            self.settle(delta)?;
        }
        self.slugs = slugs;
        Ok(())
    }

    /// Moves the price of an empty pool to `tick` without trading anything.
    pub(crate) fn move_price(&self, pool: &mut Pool, tick: i32) -> Result<(), Error> {
        let target = tick_math::sqrt_price_at_tick(tick)?;
        let current = pool.slot0()?.sqrt_price;
        if target == current {
            return Ok(());
        }
        let result = pool.swap(&SwapParams {
            zero_for_one: target < current,
            amount_specified: 1,
            sqrt_price_limit: target,
        })?;
        debug_assert_eq!(result.delta, BalanceDelta::default());
        Ok(())
    }

    /// Funds available for slugs.
    fn funds(&self) -> Funds {
        Funds {
            asset: self.balances[self.config.asset_index()],
            numeraire: self.balances[self.config.numeraire_index()],
        }
    }

    /// Replaces all slugs with the layout for the current accumulator.
    pub(crate) fn reposition(&mut self, pool: &mut Pool) -> Result<(), Error> {
        self.withdraw_slugs(pool)?;
        let anchor = self.state.anchor(&self.config);
        self.move_price(pool, anchor)?;
        let slugs = slug::plan(
            &self.config,
            &self.state,
            self.state.last_synced_epoch,
            self.funds(),
        )?;
        self.place_slugs(pool, slugs)?;
        tracing::debug!(
            epoch = self.state.last_synced_epoch,
            anchor,
            accumulator = self.state.tick_accumulator,
            "repositioned slugs"
        );
        Ok(())
    }

    /// Replaces all slugs with a single slug holding every collected
    /// proceed just below the average sale price, so buyers of a failed sale
    /// can sell back.
    pub(crate) fn place_refund_slug(&mut self, pool: &mut Pool) -> Result<(), Error> {
        self.withdraw_slugs(pool)?;
        let config = &self.config;
        let average = slug::average_price_tick(
            config,
            self.state.total_proceeds,
            self.state.total_tokens_sold,
        )?;
        let edge = match average {
            Some(tick) => slug::clamp_usable(config, config.align_cheaper(tick), config.tick_spacing),
            None => self.state.anchor(config),
        };
        let range = slug::range_between(edge, config.pricier(edge, -config.tick_spacing));
        let proceeds = self
            .state
            .total_proceeds
            .min(self.balances[config.numeraire_index()]);
        let liquidity = if average.is_some() {
            slug::liquidity_for_numeraire(config, range, proceeds)?
        } else {
            0
        };

        self.move_price(pool, edge)?;
        let mut slugs = SlugSet::default();
        slugs.push(Slug {
            id: slug::SlugId::Lower,
            range,
            liquidity,
        })?;
        self.place_slugs(pool, slugs)?;
        self.state.insufficient_proceeds = true;
        tracing::info!(?range, liquidity, "placed refund slug");
        Ok(())
    }

    /// Seeds the initial slugs. Called once the pool has a price.
    pub(crate) fn initialize(&mut self, pool: &mut Pool, now: u64) -> Result<(), Error> {
        if self.phase != Phase::Uninitialized {
            return Err(Error::AlreadyInitialized);
        }
        let key = pool.key();
        let (token0, token1) = key.tokens.get();
        let (asset, numeraire) = if self.config.is_token0 {
            (token0, token1)
        } else {
            (token1, token0)
        };
        if key.fee != self.config.swap_fee
            || key.tick_spacing != self.config.tick_spacing
            || asset != self.asset
            || numeraire != self.numeraire
        {
            return Err(Error::PoolMismatch);
        }
        self.reposition(pool)?;
        self.phase = Phase::Active;
        tracing::info!(
            address = ?self.address,
            now,
            starting_time = self.config.starting_time,
            ending_time = self.config.ending_time,
            "auction initialized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::config::tests::example,
        amm::{PoolKey, TokenPair},
    };

    fn tokens(is_token0: bool) -> (Address, Address) {
        let low = Address::repeat_byte(0x01);
        let high = Address::repeat_byte(0x02);
        if is_token0 { (low, high) } else { (high, low) }
    }

    fn setup(is_token0: bool) -> (Auction, Pool) {
        let config = example(is_token0);
        let (asset, numeraire) = tokens(is_token0);
        let pool = Pool::new(PoolKey {
            tokens: TokenPair::new(asset, numeraire).unwrap(),
            fee: config.swap_fee,
            tick_spacing: config.tick_spacing,
        })
        .unwrap();
        let auction = Auction::new(config, asset, numeraire, Address::repeat_byte(0xaa)).unwrap();
        (auction, pool)
    }

    #[test]
    fn token_order_must_match_the_asset_side() {
        let (asset, numeraire) = tokens(true);
        assert_eq!(
            Auction::new(example(false), asset, numeraire, Address::ZERO).unwrap_err(),
            Error::InvalidTokenOrder
        );
        assert_eq!(
            Auction::new(example(true), asset, asset, Address::ZERO).unwrap_err(),
            Error::InvalidTokenOrder
        );
    }

    #[test]
    fn initialization_funds_the_slugs_from_the_supply() {
        for is_token0 in [true, false] {
            let (mut auction, mut pool) = setup(is_token0);
            pool.initialize(tick_math::sqrt_price_at_tick(0).unwrap())
                .unwrap();
            auction.initialize(&mut pool, 0).unwrap();

            let config = auction.config().clone();
            assert_eq!(auction.phase(), Phase::Active);
            assert_eq!(pool.slot0().unwrap().tick, config.starting_tick);

            let asset = config.asset_index();
            let in_pool = config.num_tokens_to_sell - auction.balances()[asset];
            let inventory = auction.asset_inventory(&pool).unwrap();
            // Placing rounds in favor of the pool.
            assert!(in_pool >= inventory);
            assert!(in_pool - inventory < U256::from(10u64));
            assert_eq!(auction.balances()[1 - asset], U256::ZERO);

            assert_eq!(
                auction.initialize(&mut pool, 0),
                Err(Error::AlreadyInitialized)
            );
        }
    }

    #[test]
    fn withdrawing_returns_the_tokens() {
        let (mut auction, mut pool) = setup(true);
        pool.initialize(tick_math::sqrt_price_at_tick(0).unwrap())
            .unwrap();
        auction.initialize(&mut pool, 0).unwrap();
        auction.withdraw_slugs(&mut pool).unwrap();
        assert!(auction.slugs().is_empty());
        assert_eq!(pool.liquidity(), 0);
        let supply = auction.config().num_tokens_to_sell;
        // Rounding leaves at most a few wei per slug in the pool.
        assert!(supply - auction.balances()[0] < U256::from(10u64));
    }

    #[test]
    fn mismatched_pool_is_rejected() {
        let (mut auction, _) = setup(true);
        let (asset, numeraire) = tokens(true);
        let mut pool = Pool::new(PoolKey {
            tokens: TokenPair::new(asset, numeraire).unwrap(),
            fee: 500,
            tick_spacing: 8,
        })
        .unwrap();
        pool.initialize(tick_math::sqrt_price_at_tick(0).unwrap())
            .unwrap();
        assert_eq!(auction.initialize(&mut pool, 0), Err(Error::PoolMismatch));
    }
}
