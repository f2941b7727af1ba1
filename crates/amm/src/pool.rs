use {
    crate::Error,
    alloy::primitives::{Address, U256},
    number::{
        swap_math,
        tick_math::{self, MAX_SQRT_PRICE, MAX_TICK, MIN_SQRT_PRICE, MIN_TICK},
        sqrt_price_math,
    },
    serde::Serialize,
    std::{
        cmp::Ordering,
        collections::{BTreeMap, HashMap},
    },
};

/// Upper bound on the number of price intervals a single swap may cross.
pub const MAX_SWAP_STEPS: u32 = 1024;

/// Largest tick spacing the pool accepts.
pub const MAX_TICK_SPACING: i32 = 16_383;

/// An ordered token pair.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct TokenPair(Address, Address);

impl TokenPair {
    /// Returns a token pair for the given tokens, or `None` if `a` and `b` are
    /// equal.
    pub fn new(a: Address, b: Address) -> Option<Self> {
        match a.cmp(&b) {
            Ordering::Less => Some(Self(a, b)),
            Ordering::Equal => None,
            Ordering::Greater => Some(Self(b, a)),
        }
    }

    /// Returns the wrapped token pair as a tuple.
    pub fn get(&self) -> (Address, Address) {
        (self.0, self.1)
    }
}

/// Identifies a pool: its tokens, its swap fee and its tick spacing.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct PoolKey {
    pub tokens: TokenPair,
    /// Swap fee in hundredths of a basis point.
    pub fee: u32,
    pub tick_spacing: i32,
}

/// The current price of the pool.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Slot0 {
    pub sqrt_price: U256,
    pub tick: i32,
}

/// A half-open range of ticks `[lower, upper)`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    pub fn is_degenerate(&self) -> bool {
        self.lower >= self.upper
    }
}

/// Token amounts exchanged with the pool. Positive amounts are paid into the
/// pool, negative amounts out of it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BalanceDelta {
    pub amount0: i128,
    pub amount1: i128,
}

/// Parameters of a swap.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SwapParams {
    /// Whether token0 is paid in for token1 (price moves down) or the other
    /// way around.
    pub zero_for_one: bool,
    /// Exact input amount when positive, exact output amount when negative.
    pub amount_specified: i128,
    /// The swap stops once the price reaches this limit.
    pub sqrt_price_limit: U256,
}

impl SwapParams {
    pub fn exact_in(&self) -> bool {
        self.amount_specified > 0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SwapResult {
    pub delta: BalanceDelta,
    /// Fee charged on the input token, included in the input amount of
    /// `delta`.
    pub fee_amount: U256,
    pub slot0: Slot0,
}

#[derive(Clone, Copy, Debug, Default)]
struct TickInfo {
    liquidity_gross: u128,
    /// Liquidity added when the tick is crossed left to right.
    liquidity_net: i128,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
struct PositionKey {
    owner: Address,
    range: TickRange,
}

/// A concentrated liquidity pool.
///
/// Swap fees are not tracked per position. They accumulate in the pool and
/// are handed out with [`Pool::collect_fees`], which assumes a single
/// liquidity owner.
#[derive(Clone, Debug)]
pub struct Pool {
    key: PoolKey,
    slot0: Option<Slot0>,
    /// Liquidity active at the current price.
    liquidity: u128,
    ticks: BTreeMap<i32, TickInfo>,
    positions: HashMap<PositionKey, u128>,
    /// Tokens held by the pool, fees included.
    reserves: [U256; 2],
    fees: [U256; 2],
}

impl Pool {
    pub fn new(key: PoolKey) -> Result<Self, Error> {
        if !(1..=MAX_TICK_SPACING).contains(&key.tick_spacing) {
            return Err(Error::InvalidTickSpacing(key.tick_spacing));
        }
        Ok(Self {
            key,
            slot0: None,
            liquidity: 0,
            ticks: Default::default(),
            positions: Default::default(),
            reserves: Default::default(),
            fees: Default::default(),
        })
    }

    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    /// Sets the initial price of the pool.
    pub fn initialize(&mut self, sqrt_price: U256) -> Result<Slot0, Error> {
        if self.slot0.is_some() {
            return Err(Error::AlreadyInitialized);
        }
        let slot0 = Slot0 {
            sqrt_price,
            tick: tick_math::tick_at_sqrt_price(sqrt_price)?,
        };
        self.slot0 = Some(slot0);
        Ok(slot0)
    }

    pub fn slot0(&self) -> Result<Slot0, Error> {
        self.slot0.ok_or(Error::NotInitialized)
    }

    /// Liquidity active at the current price.
    pub fn liquidity(&self) -> u128 {
        self.liquidity
    }

    pub fn reserves(&self) -> (U256, U256) {
        (self.reserves[0], self.reserves[1])
    }

    /// Uncollected swap fees per token.
    pub fn fees(&self) -> (U256, U256) {
        (self.fees[0], self.fees[1])
    }

    /// Liquidity held by `owner` in `range`.
    pub fn position(&self, owner: Address, range: TickRange) -> u128 {
        self.positions
            .get(&PositionKey { owner, range })
            .copied()
            .unwrap_or_default()
    }

    fn validate_range(&self, range: TickRange) -> Result<(), Error> {
        if range.is_degenerate() || range.lower < MIN_TICK || range.upper > MAX_TICK {
            return Err(Error::InvalidTickRange {
                lower: range.lower,
                upper: range.upper,
            });
        }
        let spacing = self.key.tick_spacing;
        for tick in [range.lower, range.upper] {
            if tick % spacing != 0 {
                return Err(Error::TickMisaligned { tick, spacing });
            }
        }
        Ok(())
    }

    fn update_tick(&mut self, tick: i32, delta: i128, upper: bool) -> Result<(), Error> {
        let info = self.ticks.entry(tick).or_default();
        info.liquidity_gross = info
            .liquidity_gross
            .checked_add_signed(delta)
            .ok_or(Error::InsufficientPositionLiquidity)?;
        let net = if upper { -delta } else { delta };
        info.liquidity_net = info
            .liquidity_net
            .checked_add(net)
            .ok_or(Error::AmountOverflow)?;
        if info.liquidity_gross == 0 {
            self.ticks.remove(&tick);
        }
        Ok(())
    }

    /// Adds (`liquidity_delta > 0`) or removes liquidity from `owner`'s
    /// position in `range`. Returns the token amounts paid into the pool
    /// (positive) or out of it (negative). Amounts owed to the pool round up,
    /// amounts paid out round down.
    pub fn modify_liquidity(
        &mut self,
        owner: Address,
        range: TickRange,
        liquidity_delta: i128,
    ) -> Result<BalanceDelta, Error> {
        let slot0 = self.slot0()?;
        self.validate_range(range)?;
        if liquidity_delta == 0 {
            return Ok(BalanceDelta::default());
        }

        let key = PositionKey { owner, range };
        let current = self.positions.get(&key).copied().unwrap_or_default();
        let updated = current
            .checked_add_signed(liquidity_delta)
            .ok_or(Error::InsufficientPositionLiquidity)?;

        let adding = liquidity_delta > 0;
        let amount = liquidity_delta.unsigned_abs();
        let sqrt_lower = tick_math::sqrt_price_at_tick(range.lower)?;
        let sqrt_upper = tick_math::sqrt_price_at_tick(range.upper)?;

        let (amount0, amount1) = if slot0.tick < range.lower {
            (
                sqrt_price_math::amount0_delta(sqrt_lower, sqrt_upper, amount, adding)?,
                U256::ZERO,
            )
        } else if slot0.tick < range.upper {
            (
                sqrt_price_math::amount0_delta(slot0.sqrt_price, sqrt_upper, amount, adding)?,
                sqrt_price_math::amount1_delta(sqrt_lower, slot0.sqrt_price, amount, adding)?,
            )
        } else {
            (
                U256::ZERO,
                sqrt_price_math::amount1_delta(sqrt_lower, sqrt_upper, amount, adding)?,
            )
        };

        self.update_tick(range.lower, liquidity_delta, false)?;
        self.update_tick(range.upper, liquidity_delta, true)?;
        if (range.lower..range.upper).contains(&slot0.tick) {
            self.liquidity = self
                .liquidity
                .checked_add_signed(liquidity_delta)
                .ok_or(Error::InsufficientPositionLiquidity)?;
        }
        if updated == 0 {
            self.positions.remove(&key);
        } else {
            self.positions.insert(key, updated);
        }

        let delta = if adding {
            self.reserves[0] += amount0;
            self.reserves[1] += amount1;
            BalanceDelta {
                amount0: to_delta(amount0)?,
                amount1: to_delta(amount1)?,
            }
        } else {
            self.reserves[0] -= amount0;
            self.reserves[1] -= amount1;
            BalanceDelta {
                amount0: -to_delta(amount0)?,
                amount1: -to_delta(amount1)?,
            }
        };
        tracing::trace!(?owner, ?range, liquidity_delta, ?delta, "modified liquidity");
        Ok(delta)
    }

    /// Pays out all accumulated swap fees.
    pub fn collect_fees(&mut self) -> (U256, U256) {
        let fees = std::mem::take(&mut self.fees);
        self.reserves[0] -= fees[0];
        self.reserves[1] -= fees[1];
        (fees[0], fees[1])
    }

    fn next_initialized_tick(&self, tick: i32, zero_for_one: bool) -> (i32, bool) {
        if zero_for_one {
            self.ticks
                .range(..=tick)
                .next_back()
                .map(|(tick, _)| (*tick, true))
                .unwrap_or((MIN_TICK, false))
        } else {
            self.ticks
                .range(tick.saturating_add(1)..)
                .next()
                .map(|(tick, _)| (*tick, true))
                .unwrap_or((MAX_TICK, false))
        }
    }

    /// Swaps against the pool's liquidity until either the specified amount
    /// is exhausted or the price limit is reached.
    pub fn swap(&mut self, params: &SwapParams) -> Result<SwapResult, Error> {
        let mut slot0 = self.slot0()?;
        if params.amount_specified == 0 {
            return Err(Error::ZeroAmount);
        }
        let limit = params.sqrt_price_limit;
        let limit_valid = if params.zero_for_one {
            limit < slot0.sqrt_price && limit >= MIN_SQRT_PRICE
        } else {
            limit > slot0.sqrt_price && limit <= MAX_SQRT_PRICE
        };
        if !limit_valid {
            return Err(Error::InvalidSqrtPriceLimit);
        }

        let exact_in = params.exact_in();
        let mut remaining = U256::from(params.amount_specified.unsigned_abs());
        let mut amount_in = U256::ZERO;
        let mut amount_out = U256::ZERO;
        let mut fee_amount = U256::ZERO;
        let mut liquidity = self.liquidity;
        let mut steps = 0;

        while !remaining.is_zero() && slot0.sqrt_price != limit {
            steps += 1;
            if steps > MAX_SWAP_STEPS {
                return Err(Error::TooManySteps(MAX_SWAP_STEPS));
            }

            let (tick_next, initialized) =
                self.next_initialized_tick(slot0.tick, params.zero_for_one);
            let sqrt_price_next = tick_math::sqrt_price_at_tick(tick_next)?;
            let target = if params.zero_for_one {
                sqrt_price_next.max(limit)
            } else {
                sqrt_price_next.min(limit)
            };

            let start = slot0.sqrt_price;
            let step = swap_math::compute_swap_step(
                start,
                target,
                liquidity,
                remaining,
                exact_in,
                self.key.fee,
            )?;
            slot0.sqrt_price = step.sqrt_price_next;

            if exact_in {
                remaining -= step.amount_in + step.fee_amount;
            } else {
                remaining -= step.amount_out;
            }
            amount_in += step.amount_in + step.fee_amount;
            amount_out += step.amount_out;
            fee_amount += step.fee_amount;

            if slot0.sqrt_price == sqrt_price_next {
                if initialized {
                    let net = self
                        .ticks
                        .get(&tick_next)
                        .map(|info| info.liquidity_net)
                        .unwrap_or_default();
                    let net = if params.zero_for_one { -net } else { net };
                    liquidity = liquidity
                        .checked_add_signed(net)
                        .ok_or(Error::AmountOverflow)?;
                }
                slot0.tick = if params.zero_for_one { tick_next - 1 } else { tick_next };
            } else if slot0.sqrt_price != start {
                slot0.tick = tick_math::tick_at_sqrt_price(slot0.sqrt_price)?;
            }
        }

        let (input, output) = if params.zero_for_one { (0, 1) } else { (1, 0) };
        self.reserves[input] += amount_in;
        self.reserves[output] = self.reserves[output]
            .checked_sub(amount_out)
            .ok_or(Error::Math(number::Error::InsufficientLiquidity))?;
        self.fees[input] += fee_amount;
        self.slot0 = Some(slot0);
        self.liquidity = liquidity;

        let (amount_in, amount_out) = (to_delta(amount_in)?, to_delta(amount_out)?);
        let delta = if params.zero_for_one {
            BalanceDelta {
                amount0: amount_in,
                amount1: -amount_out,
            }
        } else {
            BalanceDelta {
                amount0: -amount_out,
                amount1: amount_in,
            }
        };
        tracing::trace!(?params, ?delta, ?slot0, "swapped");
        Ok(SwapResult {
            delta,
            fee_amount,
            slot0,
        })
    }
}

fn to_delta(amount: U256) -> Result<i128, Error> {
    i128::try_from(amount).map_err(|_| Error::AmountOverflow)
}

#[cfg(test)]
mod tests {
    use {super::*, number::tick_math::sqrt_price_at_tick};

    const SPACING: i32 = 60;
    const FEE: u32 = 3_000;

    fn owner() -> Address {
        Address::repeat_byte(0x11)
    }

    fn pool_at(tick: i32) -> Pool {
        let tokens = TokenPair::new(Address::repeat_byte(1), Address::repeat_byte(2)).unwrap();
        let mut pool = Pool::new(PoolKey {
            tokens,
            fee: FEE,
            tick_spacing: SPACING,
        })
        .unwrap();
        pool.initialize(sqrt_price_at_tick(tick).unwrap()).unwrap();
        pool
    }

    fn e18(value: i128) -> i128 {
        value * 10i128.pow(18)
    }

    #[test]
    fn token_pair_is_ordered() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        assert_eq!(TokenPair::new(b, a).unwrap().get(), (a, b));
        assert!(TokenPair::new(a, a).is_none());
    }

    #[test]
    fn cannot_initialize_twice() {
        let mut pool = pool_at(0);
        assert_eq!(pool.initialize(number::Q96), Err(Error::AlreadyInitialized));
    }

    #[test]
    fn position_above_price_holds_token0_only() {
        let mut pool = pool_at(0);
        let delta = pool
            .modify_liquidity(owner(), TickRange::new(60, 600), e18(1))
            .unwrap();
        assert!(delta.amount0 > 0);
        assert_eq!(delta.amount1, 0);
        assert_eq!(pool.liquidity(), 0);

        let delta = pool
            .modify_liquidity(owner(), TickRange::new(-600, -60), e18(1))
            .unwrap();
        assert_eq!(delta.amount0, 0);
        assert!(delta.amount1 > 0);

        let delta = pool
            .modify_liquidity(owner(), TickRange::new(-60, 60), e18(1))
            .unwrap();
        assert!(delta.amount0 > 0 && delta.amount1 > 0);
        assert_eq!(pool.liquidity(), e18(1) as u128);
    }

    #[test]
    fn removing_returns_at_most_what_was_added() {
        let mut pool = pool_at(0);
        let range = TickRange::new(-120, 180);
        let added = pool.modify_liquidity(owner(), range, e18(3)).unwrap();
        let removed = pool.modify_liquidity(owner(), range, -e18(3)).unwrap();
        assert!(-removed.amount0 <= added.amount0);
        assert!(-removed.amount1 <= added.amount1);
        assert!(added.amount0 + removed.amount0 <= 1);
        assert_eq!(pool.position(owner(), range), 0);
        assert_eq!(pool.liquidity(), 0);
        assert_eq!(
            pool.modify_liquidity(owner(), range, -1),
            Err(Error::InsufficientPositionLiquidity)
        );
    }

    #[test]
    fn rejects_bad_ranges() {
        let mut pool = pool_at(0);
        assert_eq!(
            pool.modify_liquidity(owner(), TickRange::new(60, 60), 1),
            Err(Error::InvalidTickRange {
                lower: 60,
                upper: 60
            })
        );
        assert_eq!(
            pool.modify_liquidity(owner(), TickRange::new(0, 61), 1),
            Err(Error::TickMisaligned {
                tick: 61,
                spacing: SPACING
            })
        );
    }

    #[test]
    fn swap_crosses_into_position_above() {
        let mut pool = pool_at(0);
        let range = TickRange::new(0, 600);
        pool.modify_liquidity(owner(), range, e18(100)).unwrap();

        // Buy token0 with token1, the price moves up through the position.
        let result = pool
            .swap(&SwapParams {
                zero_for_one: false,
                amount_specified: e18(1),
                sqrt_price_limit: sqrt_price_at_tick(600).unwrap(),
            })
            .unwrap();
        assert_eq!(result.delta.amount1, e18(1));
        assert!(result.delta.amount0 < 0);
        assert!(result.slot0.tick > 0 && result.slot0.tick < 600);
        assert_eq!(pool.fees().1, result.fee_amount);
        assert!(result.fee_amount > U256::ZERO);
    }

    #[test]
    fn swap_stops_at_limit_without_liquidity() {
        let mut pool = pool_at(0);
        pool.modify_liquidity(owner(), TickRange::new(0, 60), e18(1))
            .unwrap();
        let limit = sqrt_price_at_tick(6_000).unwrap();
        let result = pool
            .swap(&SwapParams {
                zero_for_one: false,
                amount_specified: e18(1_000),
                sqrt_price_limit: limit,
            })
            .unwrap();
        assert_eq!(result.slot0.sqrt_price, limit);
        assert_eq!(result.slot0.tick, 6_000);
        // Only the small position was consumed.
        let (reserve0, _) = pool.reserves();
        assert!(reserve0 <= U256::from(1u64));
    }

    #[test]
    fn swap_down_across_a_boundary_tick() {
        let mut pool = pool_at(0);
        let below = TickRange::new(-600, 0);
        let above = TickRange::new(0, 600);
        pool.modify_liquidity(owner(), below, e18(50)).unwrap();
        pool.modify_liquidity(owner(), above, e18(100)).unwrap();
        assert_eq!(pool.liquidity(), e18(100) as u128);

        let result = pool
            .swap(&SwapParams {
                zero_for_one: true,
                amount_specified: e18(1),
                sqrt_price_limit: sqrt_price_at_tick(-600).unwrap(),
            })
            .unwrap();
        assert!(result.slot0.tick < 0);
        assert_eq!(pool.liquidity(), e18(50) as u128);
    }

    #[test]
    fn exact_output_swap() {
        let mut pool = pool_at(0);
        pool.modify_liquidity(owner(), TickRange::new(-600, 600), e18(100))
            .unwrap();
        let result = pool
            .swap(&SwapParams {
                zero_for_one: true,
                amount_specified: -e18(1),
                sqrt_price_limit: sqrt_price_at_tick(-600).unwrap(),
            })
            .unwrap();
        assert_eq!(result.delta.amount1, -e18(1));
        assert!(result.delta.amount0 > e18(1));
    }

    #[test]
    fn rejects_invalid_limits() {
        let mut pool = pool_at(0);
        let params = SwapParams {
            zero_for_one: true,
            amount_specified: 1,
            sqrt_price_limit: sqrt_price_at_tick(10).unwrap(),
        };
        assert_eq!(pool.swap(&params), Err(Error::InvalidSqrtPriceLimit));
        assert_eq!(
            pool.swap(&SwapParams {
                amount_specified: 0,
                ..params
            }),
            Err(Error::ZeroAmount)
        );
    }

    #[test]
    fn collecting_fees_empties_the_bucket() {
        let mut pool = pool_at(0);
        pool.modify_liquidity(owner(), TickRange::new(-600, 600), e18(100))
            .unwrap();
        pool.swap(&SwapParams {
            zero_for_one: true,
            amount_specified: e18(1),
            sqrt_price_limit: sqrt_price_at_tick(-600).unwrap(),
        })
        .unwrap();
        let (fee0, fee1) = pool.collect_fees();
        assert!(fee0 > U256::ZERO);
        assert_eq!(fee1, U256::ZERO);
        assert_eq!(pool.fees(), (U256::ZERO, U256::ZERO));
    }
}
