//! The Dutch auction: at every epoch boundary the price curve moves
//! according to how actual sales compare to the linear schedule.

use {
    crate::{AuctionConfig, AuctionState, Error},
    alloy::primitives::U256,
    number::u256_ext::U256Ext,
    std::cmp::Ordering,
};

/// How the curve moves after an epoch closes. Steps are in ticks and
/// positive towards a higher asset price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Adjustment {
    /// Nothing was sold during the epoch. The curve drops by a full `gamma`.
    NoSales { step: i32 },
    Undersold { step: i32 },
    Oversold { step: i32 },
    OnTarget,
}

impl Adjustment {
    pub fn step(&self) -> i32 {
        match self {
            Self::NoSales { step } | Self::Undersold { step } | Self::Oversold { step } => *step,
            Self::OnTarget => 0,
        }
    }
}

/// `gamma * imbalance / expected`, capped at `gamma`.
fn proportional_step(config: &AuctionConfig, imbalance: U256, expected: U256) -> Result<i32, Error> {
    let gamma = U256::from(config.gamma.unsigned_abs());
    if expected.is_zero() {
        return Ok(config.gamma);
    }
    let step = gamma.mul_div(&imbalance, &expected)?.min(gamma);
    let step = u32::try_from(step).map_err(|_| number::Error::Overflow)?;
    Ok(i32::try_from(step).map_err(|_| number::Error::Overflow)?)
}

/// Decides the move for `epoch` given the cumulative sales at its close and
/// at the previous boundary.
pub fn adjustment(
    config: &AuctionConfig,
    epoch: u64,
    sold: U256,
    sold_at_previous_boundary: U256,
) -> Result<Adjustment, Error> {
    if sold <= sold_at_previous_boundary {
        return Ok(Adjustment::NoSales {
            step: -config.gamma,
        });
    }
    let expected = config.expected_sold_at_epoch_end(epoch)?;
    Ok(match sold.cmp(&expected) {
        Ordering::Less => Adjustment::Undersold {
            step: -proportional_step(config, expected - sold, expected)?,
        },
        Ordering::Greater => Adjustment::Oversold {
            step: proportional_step(config, sold - expected, expected)?,
        },
        Ordering::Equal => Adjustment::OnTarget,
    })
}

/// Applies the adjustment of every epoch closed since the last sync, oldest
/// first. Returns whether any epoch was processed.
pub fn catch_up(
    config: &AuctionConfig,
    state: &mut AuctionState,
    current_epoch: u64,
) -> Result<bool, Error> {
    if current_epoch <= state.last_synced_epoch {
        return Ok(false);
    }
    for epoch in state.last_synced_epoch..current_epoch {
        let adjustment = adjustment(
            config,
            epoch,
            state.total_tokens_sold,
            state.total_tokens_sold_last_epoch,
        )?;
        state.tick_accumulator =
            (state.tick_accumulator + adjustment.step()).clamp(-config.tick_span(), 0);
        state.total_tokens_sold_last_epoch = state.total_tokens_sold;
        tracing::debug!(
            epoch,
            ?adjustment,
            accumulator = state.tick_accumulator,
            "closed epoch"
        );
    }
    state.last_synced_epoch = current_epoch;
    Ok(true)
}
