//! Where the asset is offered: the lower slug below the curve buys the asset
//! back with the proceeds, the upper slug sells the current epoch's share of
//! the schedule and the price discovery slugs above it pre-sell future
//! epochs at higher prices.

use {
    crate::{AuctionConfig, AuctionState, Error},
    alloy::primitives::U256,
    amm::TickRange,
    itertools::Itertools,
    number::{
        liquidity_amounts,
        tick_math::{self, MAX_SQRT_PRICE, MIN_SQRT_PRICE},
        u256_ext::U256Ext,
    },
    serde::Serialize,
};

pub const MAX_PRICE_DISCOVERY_SLUGS: usize = 15;

/// Lower and upper slug plus the price discovery ladder.
pub const MAX_SLUGS: usize = 2 + MAX_PRICE_DISCOVERY_SLUGS;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum SlugId {
    #[default]
    Lower,
    Upper,
    /// Price discovery slugs are numbered from 1.
    PriceDiscovery(u8),
}

impl SlugId {
    pub fn name(&self) -> String {
        match self {
            Self::Lower => "lowerSlug".to_string(),
            Self::Upper => "upperSlug".to_string(),
            Self::PriceDiscovery(i) => format!("pdSlug{i}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Slug {
    pub id: SlugId,
    pub range: TickRange,
    pub liquidity: u128,
}

/// The slugs of an auction in a fixed-capacity array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlugSet {
    slugs: [Slug; MAX_SLUGS],
    len: usize,
}

impl SlugSet {
    pub fn push(&mut self, slug: Slug) -> Result<(), Error> {
        let entry = self
            .slugs
            .get_mut(self.len)
            .ok_or(Error::InvalidNumPriceDiscoverySlugs)?;
        *entry = slug;
        self.len += 1;
        Ok(())
    }

    pub fn as_slice(&self) -> &[Slug] {
        &self.slugs[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slug> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn find(&self, id: SlugId) -> Option<&Slug> {
        self.iter().find(|slug| slug.id == id)
    }

    /// The slug whose cheap edge is the price floor.
    pub fn lower(&self) -> Option<&Slug> {
        self.find(SlugId::Lower)
    }

    pub fn upper(&self) -> Option<&Slug> {
        self.find(SlugId::Upper)
    }

    pub fn price_discovery(&self) -> impl Iterator<Item = &Slug> {
        self.iter()
            .filter(|slug| matches!(slug.id, SlugId::PriceDiscovery(_)))
    }

    /// Rejects degenerate ranges and ranges used by more than one slug.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(slug) = self.iter().find(|slug| slug.range.is_degenerate()) {
            return Err(Error::Pool(amm::Error::InvalidTickRange {
                lower: slug.range.lower,
                upper: slug.range.upper,
            }));
        }
        if !self.iter().map(|slug| slug.range).all_unique() {
            let duplicate = self
                .iter()
                .map(|slug| slug.range)
                .duplicates()
                .next()
                .unwrap_or_default();
            return Err(Error::DuplicateSlugRange {
                lower: duplicate.lower,
                upper: duplicate.upper,
            });
        }
        Ok(())
    }

    /// Asset held by all slugs at the given price, rounded down.
    pub fn asset_inventory(&self, config: &AuctionConfig, sqrt_price: U256) -> Result<U256, Error> {
        self.iter().try_fold(U256::ZERO, |total, slug| {
            let (amount0, amount1) = liquidity_amounts::amounts_for_liquidity(
                sqrt_price,
                tick_math::sqrt_price_at_tick(slug.range.lower)?,
                tick_math::sqrt_price_at_tick(slug.range.upper)?,
                slug.liquidity,
            )?;
            let asset = if config.is_token0 { amount0 } else { amount1 };
            Ok(total + asset)
        })
    }
}

/// Range between two ticks in either order.
pub(crate) fn range_between(a: i32, b: i32) -> TickRange {
    TickRange::new(a.min(b), a.max(b))
}

/// Range of `width` ticks starting at `edge` and extending towards higher
/// asset prices.
fn band(config: &AuctionConfig, edge: i32, width: i32) -> TickRange {
    range_between(edge, config.pricier(edge, width))
}

fn sqrt_prices(range: TickRange) -> Result<(U256, U256), Error> {
    Ok((
        tick_math::sqrt_price_at_tick(range.lower)?,
        tick_math::sqrt_price_at_tick(range.upper)?,
    ))
}

/// Liquidity holding at most `amount` asset across the whole range.
pub(crate) fn liquidity_for_asset(
    config: &AuctionConfig,
    range: TickRange,
    amount: U256,
) -> Result<u128, Error> {
    let (lower, upper) = sqrt_prices(range)?;
    Ok(if config.is_token0 {
        liquidity_amounts::liquidity_for_amount0(lower, upper, amount)?
    } else {
        liquidity_amounts::liquidity_for_amount1(lower, upper, amount)?
    })
}

/// Liquidity holding at most `amount` numeraire across the whole range.
pub(crate) fn liquidity_for_numeraire(
    config: &AuctionConfig,
    range: TickRange,
    amount: U256,
) -> Result<u128, Error> {
    let (lower, upper) = sqrt_prices(range)?;
    Ok(if config.is_token0 {
        liquidity_amounts::liquidity_for_amount1(lower, upper, amount)?
    } else {
        liquidity_amounts::liquidity_for_amount0(lower, upper, amount)?
    })
}

/// Tick of the average price paid per asset token, `None` while nothing is
/// sold.
pub(crate) fn average_price_tick(
    config: &AuctionConfig,
    proceeds: U256,
    sold: U256,
) -> Result<Option<i32>, Error> {
    if sold.is_zero() || proceeds.is_zero() {
        return Ok(None);
    }
    // The pool price is token1 per token0.
    let (numerator, denominator) = if config.is_token0 {
        (proceeds, sold)
    } else {
        (sold, proceeds)
    };
    let ratio = (numerator.to_big_uint() << 192usize) / denominator.to_big_uint();
    let sqrt_price = U256::from_big_uint(&ratio.sqrt())
        .unwrap_or(MAX_SQRT_PRICE)
        .clamp(MIN_SQRT_PRICE, MAX_SQRT_PRICE - U256::from(1u64));
    Ok(Some(tick_math::tick_at_sqrt_price(sqrt_price)?))
}

/// Keeps `tick` inside the usable range with `room` ticks to spare on both
/// sides.
pub(crate) fn clamp_usable(config: &AuctionConfig, tick: i32, room: i32) -> i32 {
    tick.clamp(
        tick_math::min_usable_tick(config.tick_spacing) + room,
        tick_math::max_usable_tick(config.tick_spacing) - room,
    )
}

/// Tokens the slugs may be funded with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Funds {
    pub asset: U256,
    pub numeraire: U256,
}

/// Derives the slugs for `epoch` with the price sitting at the anchor.
pub fn plan(
    config: &AuctionConfig,
    state: &AuctionState,
    epoch: u64,
    funds: Funds,
) -> Result<SlugSet, Error> {
    let anchor = state.anchor(config);
    let mut slugs = SlugSet::default();
    slugs.push(lower_slug(config, state, anchor, funds.numeraire)?)?;

    let mut available = state.remaining(config).min(funds.asset);

    let upper_range = band(config, anchor, config.gamma);
    let upper_amount = config
        .expected_sold_at_epoch_end(epoch)?
        .saturating_sub(state.total_tokens_sold)
        .min(available);
    let upper_liquidity = liquidity_for_asset(config, upper_range, upper_amount)?;
    available -= upper_amount;
    slugs.push(Slug {
        id: SlugId::Upper,
        range: upper_range,
        liquidity: upper_liquidity,
    })?;

    let usable = tick_math::min_usable_tick(config.tick_spacing)
        ..=tick_math::max_usable_tick(config.tick_spacing);
    for i in 0..config.num_price_discovery_slugs {
        let future_epoch = epoch + 1 + u64::try_from(i).map_err(|_| number::Error::Overflow)?;
        if future_epoch >= config.total_epochs() || available.is_zero() {
            break;
        }
        let offset = config
            .gamma
            .checked_mul(i32::try_from(i + 1).map_err(|_| number::Error::Overflow)?)
            .ok_or(number::Error::Overflow)?;
        let range = band(config, config.pricier(anchor, offset), config.gamma);
        if !usable.contains(&range.lower) || !usable.contains(&range.upper) {
            break;
        }
        let slice = config.expected_sold_at_epoch_end(future_epoch)?
            - config.expected_sold_at_epoch_end(future_epoch - 1)?;
        let amount = slice.min(available);
        available -= amount;
        slugs.push(Slug {
            id: SlugId::PriceDiscovery(u8::try_from(i + 1).map_err(|_| number::Error::Overflow)?),
            range,
            liquidity: liquidity_for_asset(config, range, amount)?,
        })?;
    }

    slugs.validate()?;
    tracing::debug!(epoch, anchor, slugs = ?slugs.as_slice(), "planned slugs");
    Ok(slugs)
}

/// The lower slug spans from the average sale price (or one tick spacing,
/// whichever is further) to the anchor on the cheap side. It holds as much
/// of the proceeds as is needed to buy back every sold token over that
/// range.
fn lower_slug(
    config: &AuctionConfig,
    state: &AuctionState,
    anchor: i32,
    numeraire: U256,
) -> Result<Slug, Error> {
    let one_spacing = config.pricier(anchor, -config.tick_spacing);
    let proceeds = state.total_proceeds.min(numeraire);
    let average = average_price_tick(config, state.total_proceeds, state.total_tokens_sold)?;
    let (Some(average), false) = (average, proceeds.is_zero()) else {
        return Ok(Slug {
            id: SlugId::Lower,
            range: range_between(anchor, one_spacing),
            liquidity: 0,
        });
    };

    let outer = clamp_usable(
        config,
        config.cheaper(config.align_cheaper(average), one_spacing),
        0,
    );
    let range = range_between(outer, anchor);
    let liquidity = liquidity_for_numeraire(config, range, proceeds)?
        .min(liquidity_for_asset(config, range, state.total_tokens_sold)?);
    Ok(Slug {
        id: SlugId::Lower,
        range,
        liquidity,
    })
}
