//! Immutable auction parameters and their ABI encoded form.

use {
    crate::{Error, slug::MAX_PRICE_DISCOVERY_SLUGS},
    alloy::{
        primitives::{
            U256,
            aliases::{I24, U24},
        },
        sol_types::SolValue,
    },
    number::{
        FEE_DENOMINATOR,
        serialization::HexOrDecimalU256,
        tick_math::{self, MAX_TICK, MIN_TICK},
    },
    serde::Serialize,
    serde_with::serde_as,
};

/// Largest tick spacing an auction pool may use.
pub const MAX_TICK_SPACING: i32 = 30;

alloy::sol! {
    /// Auction parameters as passed by the orchestrator when the pool is
    /// created. The supply is passed separately.
    struct InitData {
        uint256 minimumProceeds;
        uint256 maximumProceeds;
        uint256 startingTime;
        uint256 endingTime;
        int24 startingTick;
        int24 endingTick;
        uint256 epochLength;
        int24 gamma;
        bool isToken0;
        uint256 numPDSlugs;
        uint24 fee;
        int24 tickSpacing;
    }
}

/// Parameters of a sale, fixed when the pool is created.
///
/// The tick range runs from `starting_tick` (the most expensive price the
/// asset is offered at) to `ending_tick` (the cheapest). When the asset is
/// token0 a higher tick means a higher asset price, so `starting_tick >
/// ending_tick`. When the asset is token1 the relationship flips.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionConfig {
    pub starting_time: u64,
    pub ending_time: u64,
    pub epoch_length: u64,
    pub starting_tick: i32,
    pub ending_tick: i32,
    /// Largest tick movement of a single rebalance, also the width of the
    /// upper and price discovery slugs.
    pub gamma: i32,
    #[serde_as(as = "HexOrDecimalU256")]
    pub num_tokens_to_sell: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub minimum_proceeds: U256,
    #[serde_as(as = "HexOrDecimalU256")]
    pub maximum_proceeds: U256,
    pub num_price_discovery_slugs: usize,
    pub is_token0: bool,
    /// Swap fee in hundredths of a basis point.
    pub swap_fee: u32,
    pub tick_spacing: i32,
}

fn malformed(field: &str) -> Error {
    Error::InvalidInitData(format!("{field} out of range"))
}

impl AuctionConfig {
    /// Decodes and validates the ABI encoded [`InitData`].
    pub fn from_init_data(num_tokens_to_sell: U256, data: &[u8]) -> Result<Self, Error> {
        let data =
            InitData::abi_decode(data).map_err(|err| Error::InvalidInitData(err.to_string()))?;
        let config = Self {
            starting_time: u64::try_from(data.startingTime).map_err(|_| malformed("startingTime"))?,
            ending_time: u64::try_from(data.endingTime).map_err(|_| malformed("endingTime"))?,
            epoch_length: u64::try_from(data.epochLength).map_err(|_| malformed("epochLength"))?,
            starting_tick: i32::try_from(data.startingTick)
                .map_err(|_| malformed("startingTick"))?,
            ending_tick: i32::try_from(data.endingTick).map_err(|_| malformed("endingTick"))?,
            gamma: i32::try_from(data.gamma).map_err(|_| malformed("gamma"))?,
            num_tokens_to_sell,
            minimum_proceeds: data.minimumProceeds,
            maximum_proceeds: data.maximumProceeds,
            num_price_discovery_slugs: usize::try_from(data.numPDSlugs)
                .map_err(|_| Error::InvalidNumPriceDiscoverySlugs)?,
            is_token0: data.isToken0,
            swap_fee: u32::try_from(data.fee).map_err(|_| malformed("fee"))?,
            tick_spacing: i32::try_from(data.tickSpacing).map_err(|_| malformed("tickSpacing"))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// ABI encodes everything but the supply.
    pub fn to_init_data(&self) -> Result<Vec<u8>, Error> {
        let tick = |value: i32, field: &str| I24::try_from(value).map_err(|_| malformed(field));
        let data = InitData {
            minimumProceeds: self.minimum_proceeds,
            maximumProceeds: self.maximum_proceeds,
            startingTime: U256::from(self.starting_time),
            endingTime: U256::from(self.ending_time),
            startingTick: tick(self.starting_tick, "startingTick")?,
            endingTick: tick(self.ending_tick, "endingTick")?,
            epochLength: U256::from(self.epoch_length),
            gamma: tick(self.gamma, "gamma")?,
            isToken0: self.is_token0,
            numPDSlugs: U256::from(self.num_price_discovery_slugs),
            fee: U24::try_from(self.swap_fee).map_err(|_| malformed("fee"))?,
            tickSpacing: tick(self.tick_spacing, "tickSpacing")?,
        };
        Ok(data.abi_encode())
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.num_tokens_to_sell.is_zero()
            || self.num_tokens_to_sell > U256::from(i128::MAX.unsigned_abs())
        {
            return Err(Error::InvalidNumTokensToSell);
        }
        if self.starting_time >= self.ending_time {
            return Err(Error::InvalidTimeRange);
        }
        if self.epoch_length == 0 || (self.ending_time - self.starting_time) % self.epoch_length != 0
        {
            return Err(Error::InvalidEpochLength);
        }
        if !(1..=MAX_TICK_SPACING).contains(&self.tick_spacing) {
            return Err(Error::InvalidTickSpacing);
        }
        if self.gamma <= 0 || self.gamma % self.tick_spacing != 0 {
            return Err(Error::InvalidGamma);
        }
        self.validate_ticks()?;
        if self.num_price_discovery_slugs > MAX_PRICE_DISCOVERY_SLUGS {
            return Err(Error::InvalidNumPriceDiscoverySlugs);
        }
        if self.minimum_proceeds > self.maximum_proceeds {
            return Err(Error::InvalidProceedsLimits);
        }
        if self.swap_fee >= FEE_DENOMINATOR {
            return Err(Error::InvalidSwapFee);
        }
        Ok(())
    }

    /// Both ticks need room for a full `gamma` wide slug on either side.
    fn validate_ticks(&self) -> Result<(), Error> {
        let ordered = if self.is_token0 {
            self.starting_tick > self.ending_tick
        } else {
            self.starting_tick < self.ending_tick
        };
        let lowest = tick_math::min_usable_tick(self.tick_spacing) + self.gamma;
        let highest = tick_math::max_usable_tick(self.tick_spacing) - self.gamma;
        let in_bounds = [self.starting_tick, self.ending_tick]
            .iter()
            .all(|tick| (lowest..=highest).contains(tick) && (MIN_TICK..=MAX_TICK).contains(tick));
        if !ordered || !in_bounds {
            return Err(Error::InvalidTickRange);
        }
        Ok(())
    }

    /// Pool index of the asset token.
    pub fn asset_index(&self) -> usize {
        if self.is_token0 { 0 } else { 1 }
    }

    /// Pool index of the numeraire token.
    pub fn numeraire_index(&self) -> usize {
        1 - self.asset_index()
    }

    /// Whether a swap in the given direction buys the asset.
    pub fn is_purchase(&self, zero_for_one: bool) -> bool {
        zero_for_one != self.is_token0
    }

    /// Moves `tick` by `ticks` towards a higher asset price (negative values
    /// move towards a lower one).
    pub fn pricier(&self, tick: i32, ticks: i32) -> i32 {
        if self.is_token0 { tick + ticks } else { tick - ticks }
    }

    /// Rounds `tick` to the tick spacing, towards the cheaper side.
    pub fn align_cheaper(&self, tick: i32) -> i32 {
        if self.is_token0 {
            tick_math::floor_to_spacing(tick, self.tick_spacing)
        } else {
            tick_math::ceil_to_spacing(tick, self.tick_spacing)
        }
    }

    /// The cheaper of two ticks.
    pub fn cheaper(&self, a: i32, b: i32) -> i32 {
        if self.is_token0 { a.min(b) } else { a.max(b) }
    }

    /// Number of ticks between the starting and the ending tick.
    pub fn tick_span(&self) -> i32 {
        (self.starting_tick - self.ending_tick).abs()
    }
}
